/*
 * Copyright © 2024, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! `ObjectStore` implementation for AWS S3 buckets

use std::time::Duration;
use async_trait::async_trait;
use aws_sdk_s3::{Client, presigning::PresigningConfig};
use aws_config::{Region, meta::region::RegionProviderChain};
use aws_smithy_types_convert::date_time::DateTimeExt;
use bytes::BytesMut;
use chrono::Utc;
use tracing::debug;

use crate::store::{ObjectBytes, ObjectStore, ReadUrl, RemoteObject, Result, StoreError, content_type_for_name, op_failed};

pub type S3Client = Client;

/// create S3 Client for given region. If `anonymous` is set we do not look for credentials, which
/// only works for public buckets (and does not support presigned URLs)
pub async fn create_s3_client (region: String, anonymous: bool) -> Client {
    let region_provider = RegionProviderChain::first_try( Region::new( region));
    let loader = aws_config::from_env().region(region_provider);
    let loader = if anonymous { loader.no_credentials() } else { loader };
    Client::new( &loader.load().await)
}

#[derive(Debug,Clone)]
pub struct S3Store {
    client: Client,
    bucket: String
}

impl S3Store {
    pub fn new (client: Client, bucket: impl ToString)->Self {
        S3Store { client, bucket: bucket.to_string() }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn container (&self)->&str { &self.bucket }

    async fn list_objects (&self, prefix: &str)->Result<Vec<RemoteObject>> {
        let mut objects: Vec<RemoteObject> = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut builder = self.client.list_objects_v2().bucket(&self.bucket).prefix(prefix);
            if let Some(token) = &continuation {
                builder = builder.continuation_token(token);
            }
            let result = builder.send().await.map_err( |e| op_failed(format!("listing s3://{}/{prefix} failed: {e}", self.bucket)))?;

            for o in result.contents() {
                if let Some(name) = o.key() {
                    objects.push( RemoteObject {
                        name: name.to_string(),
                        size_bytes: o.size().unwrap_or(0).max(0) as u64,
                        updated_at: o.last_modified().and_then( |d| d.to_chrono_utc().ok()),
                        content_type: content_type_for_name(name).to_string()
                    });
                }
            }

            if result.is_truncated() == Some(true) {
                continuation = result.next_continuation_token().map( |s| s.to_string());
                if continuation.is_none() { break }
            } else {
                break
            }
        }

        debug!("listed {} objects in s3://{}/{}", objects.len(), self.bucket, prefix);
        objects.sort_by( |a,b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn read_object (&self, name: &str, max_bytes: u64)->Result<ObjectBytes> {
        if max_bytes == 0 { return Ok( ObjectBytes { data: bytes::Bytes::new(), truncated: true }) }

        let object = self.client.get_object()
            .bucket(&self.bucket)
            .key(name)
            .range( format!("bytes=0-{}", max_bytes - 1))
            .send()
            .await
            .map_err( |e| {
                let is_missing = e.as_service_error().is_some_and( |se| se.is_no_such_key());
                if is_missing { StoreError::NotFound(name.to_string()) } else { op_failed(format!("get {name} failed: {e}")) }
            })?;

        let total = object.content_range()
            .and_then( |cr| cr.rsplit_once('/'))
            .and_then( |(_,t)| t.trim().parse::<u64>().ok());
        let mut truncated = total.is_some_and( |t| t > max_bytes);

        let mut body = object.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.try_next().await.map_err( |e| op_failed(format!("reading {name} failed: {e}")))? {
            let remaining = max_bytes as usize - buf.len();
            if chunk.len() > remaining {
                buf.extend_from_slice( &chunk[..remaining]);
                truncated = true;
                break;
            }
            buf.extend_from_slice( &chunk);
        }

        Ok( ObjectBytes { data: buf.freeze(), truncated } )
    }

    async fn read_url (&self, name: &str, ttl: Duration)->Result<ReadUrl> {
        let config = PresigningConfig::expires_in(ttl).map_err( |e| op_failed(format!("invalid presigning ttl: {e}")))?;
        let request = self.client.get_object()
            .bucket(&self.bucket)
            .key(name)
            .presigned(config)
            .await
            .map_err( |e| op_failed(format!("presigning {name} failed: {e}")))?;

        let expires = chrono::TimeDelta::from_std(ttl).ok().map( |d| Utc::now() + d);
        Ok( ReadUrl { url: request.uri().to_string(), expires } )
    }
}
