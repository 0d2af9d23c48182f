/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
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

//! configuration of the agriculture extraction service. Configs are RON files, durations are given
//! as human readable strings ("30m", "45s")

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};
use serde::{Deserialize, Serialize};

use eos_common::{datetime::{deserialize_duration, serialize_duration}, store::{GcsStore, LocalDirStore, ObjectStore}};
use crate::{aggregator::AggregationOptions, errors::{Result, op_failed}};

pub fn load_config<C,P> (path: P)->Result<C> where C: for <'a> Deserialize<'a>, P: AsRef<Path> {
    let data = std::fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

#[derive(Deserialize,Serialize,Debug,Clone)]
pub enum StoreConfig {
    /// a local directory tree
    Local { root: String },

    /// a Google Cloud Storage bucket. If `token_env` is set the named environment variable has to
    /// hold an OAuth2 bearer token, otherwise the bucket has to be public
    Gcs { bucket: String, token_env: Option<String>, base_url: Option<String> },

    /// an AWS S3 bucket (requires the "s3" feature)
    S3 { region: String, bucket: String, anonymous: bool }
}

impl StoreConfig {
    pub async fn create_store (&self)->Result<Arc<dyn ObjectStore>> {
        match self {
            StoreConfig::Local { root } => {
                if !Path::new(root).is_dir() { return Err( op_failed!("not a directory: {root}")) }
                Ok( Arc::new( LocalDirStore::new(root)))
            }
            StoreConfig::Gcs { bucket, token_env, base_url } => {
                let token = match token_env {
                    Some(var) => Some( std::env::var(var).map_err( |_| op_failed!("token env var {var} not set"))?),
                    None => None
                };
                let store = match base_url {
                    Some(url) => GcsStore::with_base_url( url, bucket, token)?,
                    None => GcsStore::new( bucket, token)?
                };
                Ok( Arc::new(store))
            }
            #[cfg(feature="s3")]
            StoreConfig::S3 { region, bucket, anonymous } => {
                let client = eos_common::s3::create_s3_client( region.clone(), *anonymous).await;
                Ok( Arc::new( eos_common::s3::S3Store::new( client, bucket)))
            }
            #[cfg(not(feature="s3"))]
            StoreConfig::S3 { bucket, .. } => {
                Err( op_failed!("cannot access s3://{bucket}: built without \"s3\" feature"))
            }
        }
    }
}

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct ServerConfig {
    pub sock_addr: SocketAddr
}

impl ServerConfig {
    pub fn url (&self)->String {
        format!("http://{}", self.sock_addr)
    }
}

#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct SamplingConfig {
    /// max number of data records we look at per object
    pub max_rows: usize,
    /// max number of bytes we read per object
    pub max_bytes: u64,
    /// max number of objects that are downloaded and parsed concurrently
    pub concurrency: usize
}

impl Default for SamplingConfig {
    fn default ()->Self { SamplingConfig { max_rows: 1000, max_bytes: 2 * 1024 * 1024, concurrency: 4 } }
}

/// objects up to `max_bytes` size (and larger than the previous tier), at most `max_files` of them
#[derive(Deserialize,Serialize,Debug,Clone,Copy,PartialEq)]
pub struct SizeTier {
    pub max_bytes: u64,
    pub max_files: usize
}

#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct SelectionConfig {
    /// only objects with names starting with this prefix are considered
    pub prefix: String,
    /// case insensitive name extensions of objects we process
    pub extensions: Vec<String>,
    /// ascending size tiers. Objects larger than the last tier are ignored
    pub tiers: Vec<SizeTier>
}

impl Default for SelectionConfig {
    fn default ()->Self {
        SelectionConfig {
            prefix: String::new(),
            extensions: vec![ "csv".to_string() ],
            tiers: vec![
                SizeTier { max_bytes: 1024 * 1024, max_files: 10 },
                SizeTier { max_bytes: 10 * 1024 * 1024, max_files: 5 },
                SizeTier { max_bytes: 100 * 1024 * 1024, max_files: 2 },
            ]
        }
    }
}

fn default_cache_ttl ()->Duration { Duration::from_secs(30 * 60) }
fn default_compute_timeout ()->Duration { Duration::from_secs(120) }
fn default_object_timeout ()->Duration { Duration::from_secs(30) }
fn default_request_timeout ()->Duration { Duration::from_secs(20) }
fn default_url_ttl ()->Duration { Duration::from_secs(60 * 60) }

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct AgriConfig {
    pub store: StoreConfig,
    pub server: ServerConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub aggregation: AggregationOptions,

    /// how long an aggregation is served from cache
    #[serde(default="default_cache_ttl", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub cache_ttl: Duration,

    /// limit for a complete aggregation run over all selected objects
    #[serde(default="default_compute_timeout", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub compute_timeout: Duration,

    /// limit for downloading a single object
    #[serde(default="default_object_timeout", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub object_timeout: Duration,

    /// how long a web request waits for an aggregation before it responds with what is available
    #[serde(default="default_request_timeout", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub request_timeout: Duration,

    /// default (and max) lifetime of read URLs
    #[serde(default="default_url_ttl", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub url_ttl: Duration
}

impl AgriConfig {
    /// a config for the given store with default values for everything else
    pub fn for_store (store: StoreConfig)->Self {
        AgriConfig {
            store,
            server: ServerConfig { sock_addr: SocketAddr::from(([127,0,0,1], 9010)) },
            sampling: SamplingConfig::default(),
            selection: SelectionConfig::default(),
            aggregation: AggregationOptions::default(),
            cache_ttl: default_cache_ttl(),
            compute_timeout: default_compute_timeout(),
            object_timeout: default_object_timeout(),
            request_timeout: default_request_timeout(),
            url_ttl: default_url_ttl()
        }
    }
}
