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

//! HTTP interface of the agriculture extraction service. All routes are under `/api/agriculture`:
//!
//!   GET  sectors?sector=&country=&timeout_ms=   cached aggregation per sector
//!   GET  coordinates?sector=&country=&timeout_ms=   flat list of regions of the cached aggregation
//!   GET  geojson?sector=&country=&timeout_ms=   the same regions as GeoJSON FeatureCollection
//!   GET  files?prefix=                          object listing with sector tags
//!   GET  sample?file=&rows=                     CSV preview with inferred column roles
//!   GET  regions?file=&timeout_ms=              one-off extraction of a single object
//!   GET  url?file=&ttl_secs=                    time limited read URL of an object
//!   GET  status                                 cache status
//!   POST refresh?timeout_ms=                    invalidate cache and recompute
//!
//! Responses are JSON objects that always have a `success` field. Responses with aggregated data
//! also have a `source` field (cache, fresh, stale, fallback) so that clients can tell stale or
//! missing data from current data. Errors are returned as `{success: false, error: ".."}`

use std::{collections::BTreeMap, sync::Arc, time::Duration};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post}
};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use eos_common::{datetime::Clock, deadline::Deadline, geo::to_polygon, store::{ObjectStore, StoreError}};
use crate::{
    aggregator::Region,
    cache::{AggregationCache, CacheOutcome, DataSource},
    config::{AgriConfig, ServerConfig},
    errors::{EosAgriError, Result, invalid_request},
    extractor::{AgriExtractor, Aggregation, ExtractionSummary, SectorData},
    sector::Sector
};

pub const API_PREFIX: &str = "/api/agriculture";
const DEFAULT_SAMPLE_ROWS: usize = 10;

/* #region service ***********************************************************************************/

/// shared state of all handlers
pub struct AgriService {
    extractor: Arc<AgriExtractor>,
    cache: AggregationCache<Aggregation>,
    config: AgriConfig
}

impl AgriService {
    pub fn new (store: Arc<dyn ObjectStore>, config: AgriConfig, clock: Arc<dyn Clock>)->Self {
        let extractor = Arc::new( AgriExtractor::new( store, &config));
        let cache = AggregationCache::new( clock, config.cache_ttl);
        AgriService { extractor, cache, config }
    }

    pub fn extractor (&self)->&Arc<AgriExtractor> { &self.extractor }
    pub fn cache (&self)->&AggregationCache<Aggregation> { &self.cache }
    pub fn config (&self)->&AgriConfig { &self.config }

    /// how long a request waits for results. Clients can shorten but not extend the compute timeout
    pub fn request_wait (&self, timeout_ms: Option<u64>)->Duration {
        match timeout_ms {
            Some(ms) => Duration::from_millis(ms).min( self.config.compute_timeout),
            None => self.config.request_timeout
        }
    }

    /// the cached aggregation, computing it if required. The computation itself is bounded by the
    /// configured compute timeout, independent of how long this caller waits
    pub async fn aggregation (&self, wait: Duration)->CacheOutcome<Aggregation> {
        let extractor = self.extractor.clone();
        let compute_timeout = self.config.compute_timeout;

        self.cache.get_or_compute( &Deadline::after(wait), move || async move {
            extractor.aggregate_all( &Deadline::after( compute_timeout)).await
        }).await
    }
}

/* #endregion service */

/* #region responses *********************************************************************************/

impl IntoResponse for EosAgriError {
    fn into_response (self)->Response {
        let status = match &self {
            EosAgriError::NotFound(_) | EosAgriError::StoreError(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            EosAgriError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EosAgriError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            EosAgriError::StoreError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json( json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    data: T
}

fn success<T: Serialize> (data: T)->Response {
    Json( Success { success: true, data }).into_response()
}

/// envelope of responses with (possibly) cached data
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResponse<T: Serialize> {
    success: bool,
    source: DataSource,
    /// an aggregation is still in progress
    computing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(flatten)]
    payload: T
}

fn status_of<T> (outcome: &CacheOutcome<T>)->StatusCode {
    if outcome.error().is_some() { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK }
}

fn aggregation_response<P: Serialize> (outcome: &CacheOutcome<Aggregation>, payload: P)->Response {
    let response = AggregationResponse {
        success: outcome.error().is_none(),
        source: outcome.source(),
        computing: outcome.is_pending(),
        error: outcome.error().map( |e| e.to_string()),
        payload
    };
    (status_of(outcome), Json(response)).into_response()
}

#[derive(Serialize)]
struct SectorsPayload<'a> {
    sectors: BTreeMap<Sector,SectorData>,
    summary: Option<&'a ExtractionSummary>
}

#[derive(Serialize)]
struct CoordinatesPayload<'a> {
    coordinates: Vec<&'a Region>,
    count: usize
}

/* #endregion responses */

/* #region filters ***********************************************************************************/

#[derive(Deserialize,Debug,Default)]
pub struct AggregationQuery {
    pub sector: Option<String>,
    pub country: Option<String>,
    pub timeout_ms: Option<u64>
}

struct RegionFilter {
    sector: Option<Sector>,
    country: Option<String>
}

impl RegionFilter {
    fn from_query (q: &AggregationQuery)->Result<Self> {
        let sector = match q.sector.as_deref().map( str::trim).filter( |s| !s.is_empty()) {
            Some(s) => Some( Sector::from_key(s).ok_or_else( || invalid_request!("unknown sector '{s}'"))?),
            None => None
        };
        let country = q.country.as_deref().map( |s| s.trim().to_lowercase()).filter( |s| !s.is_empty());
        Ok( RegionFilter { sector, country })
    }

    fn accepts_sector (&self, sector: Sector)->bool {
        self.sector.is_none_or( |s| s == sector)
    }

    fn accepts_region (&self, region: &Region)->bool {
        self.country.as_ref().is_none_or( |c| {
            region.name.to_lowercase().contains(c) || region.country.to_lowercase().contains(c)
        })
    }

    fn sectors (&self, agg: &Aggregation)->BTreeMap<Sector,SectorData> {
        let mut sectors = BTreeMap::new();
        for (sector,sd) in agg.sectors.iter().filter( |(s,_)| self.accepts_sector(**s)) {
            let mut sd = sd.clone();
            if self.country.is_some() {
                sd.regions.retain( |r| self.accepts_region(r));
                if sd.regions.is_empty() { continue }
            }
            sectors.insert( *sector, sd);
        }
        sectors
    }

    fn regions<'a> (&self, agg: &'a Aggregation)->Vec<&'a Region> {
        agg.sectors.iter()
            .filter( |(s,_)| self.accepts_sector(**s))
            .flat_map( |(_,sd)| sd.regions.iter())
            .filter( |r| self.accepts_region(r))
            .collect()
    }
}

fn parse_query<T> (query: std::result::Result<Query<T>,QueryRejection>)->Result<T> {
    query.map( |Query(q)| q).map_err( |e| invalid_request!("{}", e.body_text()))
}

fn required (param: Option<String>, name: &str)->Result<String> {
    param.filter( |s| !s.trim().is_empty()).ok_or_else( || invalid_request!("missing '{name}' parameter"))
}

/* #endregion filters */

/* #region handlers **********************************************************************************/

type SharedService = Arc<AgriService>;

async fn get_sectors (State(svc): State<SharedService>, query: std::result::Result<Query<AggregationQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let filter = RegionFilter::from_query(&q)?;
    let outcome = svc.aggregation( svc.request_wait( q.timeout_ms)).await;

    let payload = SectorsPayload {
        sectors: outcome.data().map( |agg| filter.sectors(agg)).unwrap_or_default(),
        summary: outcome.data().map( |agg| &agg.summary)
    };
    Ok( aggregation_response( &outcome, payload))
}

async fn get_coordinates (State(svc): State<SharedService>, query: std::result::Result<Query<AggregationQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let filter = RegionFilter::from_query(&q)?;
    let outcome = svc.aggregation( svc.request_wait( q.timeout_ms)).await;

    let coordinates = outcome.data().map( |agg| filter.regions(agg)).unwrap_or_default();
    let payload = CoordinatesPayload { count: coordinates.len(), coordinates };
    Ok( aggregation_response( &outcome, payload))
}

fn region_feature (region: &Region)->Result<Feature> {
    let geometry = Geometry::new( geojson::Value::from( &to_polygon( &region.polygon)));
    let properties = match serde_json::to_value( region)? {
        serde_json::Value::Object(mut map) => {
            map.remove("polygon");
            map
        }
        _ => JsonObject::new()
    };

    Ok( Feature { bbox: None, geometry: Some(geometry), id: None, properties: Some(properties), foreign_members: None })
}

async fn get_geojson (State(svc): State<SharedService>, query: std::result::Result<Query<AggregationQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let filter = RegionFilter::from_query(&q)?;
    let outcome = svc.aggregation( svc.request_wait( q.timeout_ms)).await;

    let features = match outcome.data() {
        Some(agg) => filter.regions(agg).into_iter().map( region_feature).collect::<Result<Vec<Feature>>>()?,
        None => Vec::new()
    };

    let mut members = JsonObject::new();
    members.insert( "success".to_string(), json!( outcome.error().is_none()));
    members.insert( "source".to_string(), json!( outcome.source()));
    members.insert( "computing".to_string(), json!( outcome.is_pending()));
    if let Some(e) = outcome.error() {
        members.insert( "error".to_string(), json!( e.to_string()));
    }

    let fc = FeatureCollection { bbox: None, features, foreign_members: Some(members) };
    let body = serde_json::to_string( &fc)?;
    Ok( (status_of(&outcome), [(header::CONTENT_TYPE, "application/geo+json")], body).into_response())
}

#[derive(Deserialize,Debug)]
struct FilesQuery {
    prefix: Option<String>
}

async fn get_files (State(svc): State<SharedService>, query: std::result::Result<Query<FilesQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let files = svc.extractor.list_files( q.prefix.as_deref().unwrap_or("")).await?;
    Ok( success( json!({
        "container": svc.extractor.store().container(),
        "count": files.len(),
        "files": files
    })))
}

#[derive(Deserialize,Debug)]
struct SampleQuery {
    file: Option<String>,
    rows: Option<usize>
}

async fn get_sample (State(svc): State<SharedService>, query: std::result::Result<Query<SampleQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let file = required( q.file, "file")?;
    let deadline = Deadline::after( svc.config.request_timeout);
    let sample = svc.extractor.sample_object( &file, q.rows.unwrap_or(DEFAULT_SAMPLE_ROWS), &deadline).await?;
    Ok( success( json!({ "sample": sample })))
}

#[derive(Deserialize,Debug)]
struct RegionsQuery {
    file: Option<String>,
    timeout_ms: Option<u64>
}

async fn get_regions (State(svc): State<SharedService>, query: std::result::Result<Query<RegionsQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let file = required( q.file, "file")?;
    let deadline = Deadline::after( svc.request_wait( q.timeout_ms));
    let fx = svc.extractor.extract_object( &file, &deadline).await?;
    Ok( success( json!({ "source": DataSource::Fresh, "extraction": fx })))
}

#[derive(Deserialize,Debug)]
struct UrlQuery {
    file: Option<String>,
    ttl_secs: Option<u64>
}

async fn get_url (State(svc): State<SharedService>, query: std::result::Result<Query<UrlQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    let file = required( q.file, "file")?;
    let max_ttl = svc.config.url_ttl;
    let ttl = q.ttl_secs.map( |s| Duration::from_secs(s).min(max_ttl)).unwrap_or(max_ttl);
    let read_url = svc.extractor.store().read_url( &file, ttl).await?;
    Ok( success( read_url))
}

async fn get_status (State(svc): State<SharedService>)->Response {
    success( json!({
        "container": svc.extractor.store().container(),
        "cache": svc.cache.status()
    }))
}

#[derive(Deserialize,Debug)]
struct RefreshQuery {
    timeout_ms: Option<u64>
}

async fn post_refresh (State(svc): State<SharedService>, query: std::result::Result<Query<RefreshQuery>,QueryRejection>)->Result<Response> {
    let q = parse_query(query)?;
    svc.cache.invalidate();
    let outcome = svc.aggregation( svc.request_wait( q.timeout_ms)).await;

    let payload = SectorsPayload {
        sectors: outcome.data().map( |agg| agg.sectors.clone()).unwrap_or_default(),
        summary: outcome.data().map( |agg| &agg.summary)
    };
    Ok( aggregation_response( &outcome, payload))
}

/* #endregion handlers */

pub fn build_router (service: SharedService)->Router {
    Router::new()
        .route( &format!("{API_PREFIX}/sectors"), get(get_sectors))
        .route( &format!("{API_PREFIX}/coordinates"), get(get_coordinates))
        .route( &format!("{API_PREFIX}/geojson"), get(get_geojson))
        .route( &format!("{API_PREFIX}/files"), get(get_files))
        .route( &format!("{API_PREFIX}/sample"), get(get_sample))
        .route( &format!("{API_PREFIX}/regions"), get(get_regions))
        .route( &format!("{API_PREFIX}/url"), get(get_url))
        .route( &format!("{API_PREFIX}/status"), get(get_status))
        .route( &format!("{API_PREFIX}/refresh"), post(post_refresh))
        .layer( CorsLayer::permissive())
        .layer( TraceLayer::new_for_http())
        .with_state( service)
}

pub fn spawn_server_task (config: &ServerConfig, router: Router)->JoinHandle<Result<()>> {
    let sock_addr = config.sock_addr;
    let url = config.url();

    tokio::spawn( async move {
        let listener = tokio::net::TcpListener::bind( sock_addr).await?;
        info!("serving {} on {}", API_PREFIX, url);
        axum::serve( listener, router).await?;
        Ok(())
    })
}
