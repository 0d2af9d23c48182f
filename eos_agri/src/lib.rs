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

//! extraction of map regions from FAO agriculture CSV files in object storage containers.
//!
//! The pipeline is: list objects -> select by extension and size -> classify sector by name ->
//! sample CSV head -> infer column roles -> aggregate regions -> accumulate per sector. Complete
//! runs are cached ([`cache::AggregationCache`]) and served through the HTTP routes in [`web`]

mod errors;
pub use errors::*;

pub mod config;
pub use config::{AgriConfig, load_config};

pub mod csv_sampler;
pub mod columns;
pub mod sector;
pub mod country_bounds;
pub mod aggregator;
pub mod cache;

pub mod extractor;
pub use extractor::{AgriExtractor, Aggregation};

pub mod web;
pub use web::{AgriService, build_router, spawn_server_task};

/// install a fmt subscriber that is controlled by RUST_LOG. This does nothing if there already is a
/// global subscriber
pub fn init_tracing () {
    let _ = tracing_subscriber::fmt()
        .with_env_filter( tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
