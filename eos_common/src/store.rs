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

//! read-only access to object storage containers (buckets). The `ObjectStore` trait is the minimal
//! capability set data extraction depends on: list objects, read (a bounded prefix of) an object's
//! bytes and obtain a URL clients can use to read the object directly.
//!
//! implementations:
//!  - [`LocalDirStore`]: a directory tree (tests, offline processing)
//!  - [`GcsStore`]: Google Cloud Storage JSON API over HTTP
//!  - `S3Store` (feature "s3"): AWS S3 via aws-sdk-s3

use std::{path::{Component, Path, PathBuf}, time::{Duration, SystemTime}};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header::{AUTHORIZATION, CONTENT_RANGE, RANGE}};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

use crate::define_error;

define_error!{ pub StoreError =
    IOError(#[from] std::io::Error) : "IO error: {0}",
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    UrlError(#[from] url::ParseError) : "url error: {0}",
    JsonError(#[from] serde_json::Error) : "JSON error: {0}",
    NotFound(String) : "object not found: {0}",
    OpFailed(String) : "operation failed: {0}"
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub fn op_failed (msg: impl ToString)->StoreError {
    StoreError::OpFailed(msg.to_string())
}

/// meta information about a stored object as we get it from listing a container
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    pub name: String,
    pub size_bytes: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub content_type: String
}

impl RemoteObject {
    /// last path element of the object name
    pub fn file_name (&self)->&str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn has_extension (&self, ext: &str)->bool {
        self.file_name().rsplit_once('.').is_some_and( |(_,e)| e.eq_ignore_ascii_case(ext))
    }
}

/// the (possibly truncated) content of an object
#[derive(Debug,Clone)]
pub struct ObjectBytes {
    pub data: Bytes,
    /// true if the object has more bytes than we read
    pub truncated: bool
}

#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadUrl {
    pub url: String,
    /// `None` if the URL does not expire (public objects, local files)
    #[serde(serialize_with = "crate::datetime::ser_epoch_millis_option")]
    pub expires: Option<DateTime<Utc>>
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// the name of the container (bucket) this store reads from
    fn container (&self)->&str;

    /// all objects whose name starts with `prefix`, sorted by name
    async fn list_objects (&self, prefix: &str)->Result<Vec<RemoteObject>>;

    /// read at most `max_bytes` from the start of the object. Implementations have to stop
    /// reading once the limit is reached, i.e. must not retrieve the whole object
    async fn read_object (&self, name: &str, max_bytes: u64)->Result<ObjectBytes>;

    /// a URL that can be used to read the object directly, valid for (at most) `ttl`
    async fn read_url (&self, name: &str, ttl: Duration)->Result<ReadUrl>;
}

pub fn content_type_for_name (name: &str)->&'static str {
    let ext = name.rsplit_once('.').map( |(_,e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => "text/csv",
        Some("geojson") => "application/geo+json",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("zip") => "application/zip",
        _ => "application/octet-stream"
    }
}

/// parse the total size from a "Content-Range: bytes 0-99/1234" header value
fn content_range_total (value: &str)->Option<u64> {
    value.rsplit_once('/').and_then( |(_,total)| total.trim().parse().ok())
}

/* #region LocalDirStore ******************************************************************************/

/// a directory tree that is treated as a container. Object names are '/' separated paths relative
/// to the root directory
#[derive(Debug,Clone)]
pub struct LocalDirStore {
    root: PathBuf,
    name: String
}

impl LocalDirStore {
    pub fn new (root: impl AsRef<Path>)->Self {
        let root = root.as_ref().to_path_buf();
        let name = root.file_name().map( |s| s.to_string_lossy().to_string()).unwrap_or_else( || "local".to_string());
        LocalDirStore { root, name }
    }

    pub fn root (&self)->&Path { &self.root }

    /// map object name to file path, rejecting anything that could escape the root dir
    fn object_path (&self, name: &str)->Result<PathBuf> {
        let rel = Path::new(name);
        if name.is_empty() || rel.components().any( |c| !matches!(c, Component::Normal(_))) {
            return Err( StoreError::NotFound(name.to_string()))
        }
        Ok( self.root.join(rel) )
    }

    async fn collect_objects (&self, dir: PathBuf, objects: &mut Vec<RemoteObject>)->Result<()> {
        let mut pending = vec![dir];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    pending.push(path);
                } else if meta.is_file() {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        let name = rel.components()
                            .map( |c| c.as_os_str().to_string_lossy().to_string())
                            .collect::<Vec<String>>()
                            .join("/");
                        let updated_at = meta.modified().ok().map( |t: SystemTime| DateTime::<Utc>::from(t));
                        let content_type = content_type_for_name(&name).to_string();
                        objects.push( RemoteObject { name, size_bytes: meta.len(), updated_at, content_type });
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    fn container (&self)->&str { &self.name }

    async fn list_objects (&self, prefix: &str)->Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        self.collect_objects( self.root.clone(), &mut objects).await?;
        objects.retain( |o| o.name.starts_with(prefix));
        objects.sort_by( |a,b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn read_object (&self, name: &str, max_bytes: u64)->Result<ObjectBytes> {
        let path = self.object_path(name)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err( StoreError::NotFound(name.to_string())),
            Err(e) => return Err(e.into())
        };
        let len = file.metadata().await?.len();

        let mut buf = Vec::with_capacity( len.min(max_bytes) as usize);
        file.take(max_bytes).read_to_end(&mut buf).await?;

        Ok( ObjectBytes { data: Bytes::from(buf), truncated: len > max_bytes } )
    }

    async fn read_url (&self, name: &str, _ttl: Duration)->Result<ReadUrl> {
        let path = self.object_path(name)?;
        if !path.is_file() { return Err( StoreError::NotFound(name.to_string())) }

        let path = tokio::fs::canonicalize(&path).await?;
        let url = Url::from_file_path(&path).map_err( |_| op_failed(format!("no file URL for {:?}", path)))?;
        Ok( ReadUrl { url: url.to_string(), expires: None } )
    }
}

/* #endregion LocalDirStore */

/* #region GcsStore ******************************************************************************/

pub const GCS_BASE_URL: &str = "https://storage.googleapis.com";

#[derive(Deserialize,Debug)]
#[serde(rename_all = "camelCase")]
struct GcsListing {
    #[serde(default)]
    items: Vec<GcsItem>,
    next_page_token: Option<String>
}

#[derive(Deserialize,Debug)]
#[serde(rename_all = "camelCase")]
struct GcsItem {
    name: String,
    size: Option<String>, // GCS encodes uint64 as string
    updated: Option<String>,
    content_type: Option<String>
}

impl From<GcsItem> for RemoteObject {
    fn from (item: GcsItem)->Self {
        let size_bytes = item.size.and_then( |s| s.parse().ok()).unwrap_or(0);
        let updated_at = item.updated
            .and_then( |s| DateTime::parse_from_rfc3339(&s).ok())
            .map( |d| d.with_timezone(&Utc));
        let content_type = item.content_type.unwrap_or_else( || content_type_for_name(&item.name).to_string());
        RemoteObject { name: item.name, size_bytes, updated_at, content_type }
    }
}

/// Google Cloud Storage bucket accessed through the JSON API. Without a token this only works for
/// publicly readable buckets
#[derive(Debug,Clone)]
pub struct GcsStore {
    client: Client,
    base_url: Url,
    bucket: String,
    token: Option<String>
}

impl GcsStore {
    pub fn new (bucket: impl ToString, token: Option<String>)->Result<Self> {
        Self::with_base_url( GCS_BASE_URL, bucket, token)
    }

    /// use a different endpoint, e.g. a local emulator
    pub fn with_base_url (base_url: &str, bucket: impl ToString, token: Option<String>)->Result<Self> {
        let base_url = Url::parse(base_url)?;
        Ok( GcsStore { client: Client::new(), base_url, bucket: bucket.to_string(), token } )
    }

    fn url_with_segments (&self, segments: &[&str])->Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err( |_| op_failed(format!("not a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized (&self, req: reqwest::RequestBuilder)->reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            req.header( AUTHORIZATION, format!("Bearer {token}"))
        } else {
            req
        }
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    fn container (&self)->&str { &self.bucket }

    async fn list_objects (&self, prefix: &str)->Result<Vec<RemoteObject>> {
        let url = self.url_with_segments( &["storage", "v1", "b", &self.bucket, "o"])?;
        let mut objects: Vec<RemoteObject> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.client.get(url.clone())
                .query( &[("prefix", prefix), ("fields", "items(name,size,updated,contentType),nextPageToken")]);
            if let Some(token) = &page_token {
                req = req.query( &[("pageToken", token.as_str())]);
            }

            let response = self.authorized(req).send().await?;
            match response.status() {
                StatusCode::OK => {
                    let listing: GcsListing = response.json().await?;
                    objects.extend( listing.items.into_iter().map( RemoteObject::from));
                    match listing.next_page_token {
                        Some(token) => page_token = Some(token),
                        None => break
                    }
                }
                StatusCode::NOT_FOUND => return Err( StoreError::NotFound( self.bucket.clone())),
                other => return Err( op_failed(format!("listing {} failed with status {other:?}", self.bucket)))
            }
        }

        debug!("listed {} objects in gs://{}/{}", objects.len(), self.bucket, prefix);
        objects.sort_by( |a,b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn read_object (&self, name: &str, max_bytes: u64)->Result<ObjectBytes> {
        if max_bytes == 0 { return Ok( ObjectBytes { data: Bytes::new(), truncated: true }) }

        let url = self.url_with_segments( &["download", "storage", "v1", "b", &self.bucket, "o", name])?;
        let req = self.client.get(url)
            .query( &[("alt", "media")])
            .header( RANGE, format!("bytes=0-{}", max_bytes - 1));

        let mut response = self.authorized(req).send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {
                let total = response.headers().get(CONTENT_RANGE)
                    .and_then( |v| v.to_str().ok())
                    .and_then( content_range_total);

                let mut buf = BytesMut::new();
                let mut truncated = total.is_some_and( |t| t > max_bytes);

                // servers are free to ignore the range so we still have to stop reading ourselves
                while let Some(chunk) = response.chunk().await? {
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
            StatusCode::NOT_FOUND => Err( StoreError::NotFound(name.to_string())),
            StatusCode::RANGE_NOT_SATISFIABLE => Ok( ObjectBytes { data: Bytes::new(), truncated: false }), // empty object
            other => Err( op_failed(format!("download of {name} failed with status {other:?}")))
        }
    }

    /// GCS V4 signatures require service account keys, which we do not handle. The URL we return is the
    /// public object URL that does not expire (and is only readable if the bucket is public)
    async fn read_url (&self, name: &str, _ttl: Duration)->Result<ReadUrl> {
        let url = self.url_with_segments( &[&self.bucket, name])?;
        Ok( ReadUrl { url: url.to_string(), expires: None } )
    }
}

/* #endregion GcsStore */
