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

use std::{collections::HashMap, sync::{Arc, Mutex}, time::Duration};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get
};
use serde_json::json;
use eos_common::store::{GcsStore, ObjectStore, StoreError};

// run with "cargo test -p eos_common --test test_gcs_store -- --nocapture"

const BUCKET: &str = "fao-test";
const BIG_SIZE: usize = 5000;

/// request details the stub server has seen
#[derive(Default)]
struct Requests {
    ranges: Vec<String>,
    page_tokens: Vec<Option<String>>,
    auth: Vec<String>
}

type Shared = Arc<Mutex<Requests>>;

async fn list_objects (State(reqs): State<Shared>, Path(bucket): Path<String>, Query(q): Query<HashMap<String,String>>, headers: HeaderMap)->Response {
    if bucket != BUCKET { return StatusCode::NOT_FOUND.into_response() }

    let token = q.get("pageToken").cloned();
    {
        let mut reqs = reqs.lock().unwrap();
        reqs.page_tokens.push( token.clone());
        if let Some(auth) = headers.get( header::AUTHORIZATION) { reqs.auth.push( auth.to_str().unwrap().to_string()) }
    }

    let page = match token.as_deref() {
        None => json!({
            "items": [ { "name": "trade/exports.csv", "size": "5000", "updated": "2024-03-01T12:00:00.000Z", "contentType": "text/csv" } ],
            "nextPageToken": "page-2"
        }),
        Some("page-2") => json!({
            "items": [ { "name": "crops/qcl_2020.csv", "size": "120" } ]
        }),
        Some(_) => return StatusCode::BAD_REQUEST.into_response()
    };
    Json(page).into_response()
}

/// a server that ignores Range headers, i.e. always sends the whole object
async fn download (State(reqs): State<Shared>, Path((bucket,name)): Path<(String,String)>, headers: HeaderMap)->Response {
    if bucket != BUCKET { return StatusCode::NOT_FOUND.into_response() }
    if let Some(range) = headers.get( header::RANGE) {
        reqs.lock().unwrap().ranges.push( range.to_str().unwrap().to_string());
    }

    match name.as_str() {
        "big.csv" => {
            let mut body = String::from("Country,Value\n");
            while body.len() < BIG_SIZE { body.push_str("Brazil,1\n") }
            body.truncate( BIG_SIZE);
            (StatusCode::OK, body).into_response()
        }
        "small.csv" => (StatusCode::OK, "Country,Value\nChile,3\n").into_response(),
        "empty.csv" => StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
        _ => StatusCode::NOT_FOUND.into_response()
    }
}

async fn start_server ()->(String, Shared) {
    let reqs: Shared = Arc::new( Mutex::new( Requests::default()));
    let router = Router::new()
        .route( "/storage/v1/b/{bucket}/o", get(list_objects))
        .route( "/download/storage/v1/b/{bucket}/o/{name}", get(download))
        .with_state( reqs.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn( async move { axum::serve( listener, router).await });

    (format!("http://{addr}/"), reqs)
}

#[tokio::test]
async fn test_paginated_listing() {
    let (base_url, reqs) = start_server().await;
    let store = GcsStore::with_base_url( &base_url, BUCKET, Some("secret".to_string())).unwrap();
    assert_eq!( store.container(), BUCKET);

    let objs = store.list_objects("").await.unwrap();
    println!("objects: {objs:?}");
    let names: Vec<&str> = objs.iter().map( |o| o.name.as_str()).collect();
    assert_eq!( names, vec!["crops/qcl_2020.csv", "trade/exports.csv"]);

    assert_eq!( objs[1].size_bytes, 5000);
    assert!( objs[1].updated_at.is_some());
    assert_eq!( objs[0].content_type, "text/csv"); // derived from the name
    assert!( objs[0].updated_at.is_none());

    {
        let reqs = reqs.lock().unwrap();
        assert_eq!( reqs.page_tokens, vec![ None, Some("page-2".to_string()) ]);
        assert_eq!( reqs.auth.len(), 2);
        assert!( reqs.auth.iter().all( |a| a == "Bearer secret"));
    }

    let other = GcsStore::with_base_url( &base_url, "no-such-bucket", None).unwrap();
    assert!( matches!( other.list_objects("").await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_byte_capped_read() {
    let (base_url, reqs) = start_server().await;
    let store = GcsStore::with_base_url( &base_url, BUCKET, None).unwrap();

    let head = store.read_object( "big.csv", 100).await.unwrap();
    assert!( head.truncated);
    assert_eq!( head.data.len(), 100);
    assert!( head.data.starts_with( b"Country,Value\nBrazil,1\n"));
    assert_eq!( reqs.lock().unwrap().ranges, vec!["bytes=0-99"]);

    let small = store.read_object( "small.csv", 100).await.unwrap();
    assert!( !small.truncated);
    assert_eq!( &small.data[..], b"Country,Value\nChile,3\n");

    let empty = store.read_object( "empty.csv", 100).await.unwrap();
    assert!( empty.data.is_empty());
    assert!( !empty.truncated);

    assert!( matches!( store.read_object( "missing.csv", 100).await, Err(StoreError::NotFound(_))));

    let url = store.read_url( "small.csv", Duration::from_secs(60)).await.unwrap();
    assert_eq!( url.url, format!("{base_url}{BUCKET}/small.csv"));
    assert!( url.expires.is_none());
}
