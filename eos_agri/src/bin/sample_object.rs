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

//! show what the extraction pipeline gets out of a single object: headers, inferred column roles,
//! sample rows and the regions computed from them

use std::time::Duration;
use eos_common::{deadline::Deadline, define_cli, geo::ring_vertex_count};
use eos_agri::{AgriConfig, AgriExtractor, Result, init_tracing, load_config};

define_cli! { ARGS [about="sample and aggregate a single object"] =
    rows: usize [help="number of rows to show", short, long, default_value_t=5],
    timeout: u64 [help="timeout in seconds", short, long, default_value_t=30],
    config: String [help="pathname of AgriConfig RON file"],
    object: String [help="name of object to sample"]
}

#[tokio::main]
async fn main ()->Result<()> {
    init_tracing();

    let config: AgriConfig = load_config( &ARGS.config)?;
    let store = config.store.create_store().await?;
    let extractor = AgriExtractor::new( store, &config);
    let deadline = Deadline::after( Duration::from_secs( ARGS.timeout));

    let sample = extractor.sample_object( &ARGS.object, ARGS.rows, &deadline).await?;
    println!("object:    {} ({} bytes read{})", sample.file, sample.bytes_read, if sample.truncated {", truncated"} else {""});
    println!("sector:    {}", sample.sector);
    println!("headers:   {:?}", sample.headers);
    println!("roles:     {}", serde_json::to_string( &sample.roles)?);
    for row in &sample.rows {
        println!("  {row:?}");
    }

    let fx = extractor.extract_object( &ARGS.object, &deadline).await?;
    println!("\n{} regions from {} rows{}:", fx.regions.regions.len(), fx.rows_sampled, if fx.partial {" (partial)"} else {""});
    for r in &fx.regions.regions {
        println!("  {:<32} {:>6} points  {:?} with {} vertices", r.name, r.data_points, r.boundary, ring_vertex_count( &r.polygon));
    }
    println!("stats:     {}", serde_json::to_string( &fx.regions.stats)?);
    Ok(())
}
