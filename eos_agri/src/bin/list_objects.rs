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

//! list the objects of a container with the sector and year tags we derive from their names, and
//! mark the ones that would be selected for aggregation

use eos_common::define_cli;
use eos_agri::{AgriConfig, AgriExtractor, Result, init_tracing, load_config};

define_cli! { ARGS [about="list objects of the configured container"] =
    prefix: Option<String> [help="object name prefix", short, long],
    selected: bool [help="only show objects that are selected for aggregation", short, long],
    config: String [help="pathname of AgriConfig RON file"]
}

#[tokio::main]
async fn main ()->Result<()> {
    init_tracing();

    let config: AgriConfig = load_config( &ARGS.config)?;
    let store = config.store.create_store().await?;
    let extractor = AgriExtractor::new( store.clone(), &config);

    let files = extractor.list_files( ARGS.prefix.as_deref().unwrap_or("")).await?;
    println!("{} objects in {}:", files.len(), store.container());

    for f in files.iter().filter( |f| !ARGS.selected || f.selected) {
        let sel = if f.selected { "*" } else { " " };
        let year = f.year.map( |y| y.to_string()).unwrap_or_else( || "-".to_string());
        println!("{sel} {:>12}  {:<18}  {:>4}  {}", f.object.size_bytes, f.sector.key(), year, f.object.name);
    }
    Ok(())
}
