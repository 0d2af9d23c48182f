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

use std::sync::Arc;
use axum::{Router, body::{Body, to_bytes}, http::{Method, Request, StatusCode, header}};
use serde_json::Value;
use tower::ServiceExt;

use eos_common::{datetime::SystemClock, store::LocalDirStore};
use eos_agri::{AgriConfig, AgriService, build_router, config::StoreConfig, web::API_PREFIX};

// run with "cargo test -p eos_agri --test test_web -- --nocapture"

const FAO_DIR: &str = "tests/data/fao";

fn service ()->Arc<AgriService> {
    let config = AgriConfig::for_store( StoreConfig::Local { root: FAO_DIR.to_string() });
    Arc::new( AgriService::new( Arc::new( LocalDirStore::new(FAO_DIR)), config, Arc::new(SystemClock)))
}

async fn call (router: &Router, method: Method, path_query: &str)->(StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method( method)
        .uri( format!("{API_PREFIX}/{path_query}"))
        .body( Body::empty())
        .unwrap();
    let response = router.clone().oneshot( request).await.unwrap();

    let status = response.status();
    let content_type = response.headers().get( header::CONTENT_TYPE).and_then( |v| v.to_str().ok()).map( |s| s.to_string());
    let bytes = to_bytes( response.into_body(), 1 << 22).await.unwrap();
    let json: Value = serde_json::from_slice( &bytes).unwrap();
    println!("{path_query} -> {status}: {json}");

    (status, content_type, json)
}

async fn get (router: &Router, path_query: &str)->(StatusCode, Value) {
    let (status, _, json) = call( router, Method::GET, path_query).await;
    (status, json)
}

#[tokio::test]
async fn test_sectors() {
    let svc = service();
    let router = build_router( svc.clone());

    let (status, json) = get( &router, "sectors").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["success"], true);
    assert_eq!( json["source"], "fresh");
    assert_eq!( json["computing"], false);
    assert_eq!( json["sectors"]["crops_production"]["regions"][0]["name"], "Brazil");
    assert_eq!( json["sectors"]["crops_production"]["regions"][0]["dataPoints"], 2);
    assert_eq!( json["summary"]["filesProcessed"], 3);

    // second request is served from the cache
    let (_, json) = get( &router, "sectors?sector=livestock").await;
    assert_eq!( json["source"], "cache");
    let keys: Vec<&String> = json["sectors"].as_object().unwrap().keys().collect();
    assert_eq!( keys, vec!["livestock"]);
    assert_eq!( svc.cache().status().computations, 1);

    let (_, json) = get( &router, "sectors?country=argen").await;
    for sd in json["sectors"].as_object().unwrap().values() {
        let regions = sd["regions"].as_array().unwrap();
        assert_eq!( regions.len(), 1);
        assert_eq!( regions[0]["name"], "Argentina");
    }

    let (status, json) = get( &router, "sectors?sector=bananas").await;
    assert_eq!( status, StatusCode::BAD_REQUEST);
    assert_eq!( json["success"], false);
    assert!( json["error"].as_str().unwrap().contains("bananas"));

    let (status, _) = get( &router, "sectors?timeout_ms=soon").await;
    assert_eq!( status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_coordinates_and_geojson() {
    let router = build_router( service());

    let (status, json) = get( &router, "coordinates?sector=Fertilizers").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["count"], 2);
    let brazil = &json["coordinates"][0];
    assert_eq!( brazil["country"], "Brazil");
    assert_eq!( brazil["boundary"], "country_bounds");
    assert_eq!( brazil["polygon"].as_array().unwrap().len(), 5);

    let (status, content_type, json) = call( &router, Method::GET, "geojson?country=brazil").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( content_type.as_deref(), Some("application/geo+json"));
    assert_eq!( json["type"], "FeatureCollection");
    assert_eq!( json["success"], true);
    assert_eq!( json["source"], "cache");

    let features = json["features"].as_array().unwrap();
    assert_eq!( features.len(), 3); // one per sector
    for f in features {
        assert_eq!( f["geometry"]["type"], "Polygon");
        assert_eq!( f["properties"]["name"], "Brazil");
        assert!( f["properties"].get("polygon").is_none());
    }
}

#[tokio::test]
async fn test_object_routes() {
    let router = build_router( service());

    let (status, json) = get( &router, "files").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["container"], "fao");
    assert_eq!( json["count"], 5);

    let (status, json) = get( &router, "sample?file=crop_production_2020.csv&rows=1").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["sample"]["rows"].as_array().unwrap().len(), 1);
    assert_eq!( json["sample"]["rows"][0]["Item"], "Soybeans");

    let (status, json) = get( &router, "sample").await;
    assert_eq!( status, StatusCode::BAD_REQUEST);
    assert!( json["error"].as_str().unwrap().contains("file"));

    let (status, _) = get( &router, "sample?file=missing.csv").await;
    assert_eq!( status, StatusCode::NOT_FOUND);

    let (status, json) = get( &router, "regions?file=livestock_stats.csv").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["extraction"]["sector"], "livestock");
    assert_eq!( json["extraction"]["regions"].as_array().unwrap().len(), 2);

    let (status, json) = get( &router, "url?file=market_notes.csv&ttl_secs=60").await;
    assert_eq!( status, StatusCode::OK);
    assert!( json["url"].as_str().unwrap().starts_with("file://"));
}

#[tokio::test]
async fn test_status_and_refresh() {
    let router = build_router( service());

    let (_, json) = get( &router, "status").await;
    assert_eq!( json["success"], true);
    assert_eq!( json["cache"]["hasEntry"], false);
    assert_eq!( json["cache"]["computations"], 0);

    let (status, _, json) = call( &router, Method::POST, "refresh").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["source"], "fresh");

    let (status, _, json) = call( &router, Method::POST, "refresh").await;
    assert_eq!( status, StatusCode::OK);
    assert_eq!( json["source"], "fresh");

    let (_, json) = get( &router, "status").await;
    assert_eq!( json["cache"]["hasEntry"], true);
    assert_eq!( json["cache"]["isValid"], true);
    assert_eq!( json["cache"]["computations"], 2);
}
