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

//! HTTP server for agriculture region extraction. Run with
//!
//!     RUST_LOG=info eos_agri_server eos_agri/configs/eos_agri.ron

use std::sync::Arc;
use tracing::{info, warn};

use eos_common::{datetime::SystemClock, define_cli};
use eos_agri::{AgriConfig, AgriService, Result, build_router, init_tracing, load_config, spawn_server_task};

define_cli! { ARGS [about="EOS agriculture region extraction server"] =
    prefetch: bool [help="start an aggregation right away instead of on first request", short, long],
    config: String [help="pathname of AgriConfig RON file"]
}

#[tokio::main]
async fn main ()->Result<()> {
    init_tracing();

    let config: AgriConfig = load_config( &ARGS.config)?;
    let store = config.store.create_store().await?;
    info!("using container {}", store.container());

    let server_config = config.server.clone();
    let service = Arc::new( AgriService::new( store, config, Arc::new(SystemClock)));

    if ARGS.prefetch {
        let svc = service.clone();
        tokio::spawn( async move {
            let outcome = svc.aggregation( svc.config().compute_timeout).await;
            if let Some(e) = outcome.error() { warn!("prefetch failed: {e}") }
        });
    }

    let server_task = spawn_server_task( &server_config, build_router( service));
    server_task.await?
}
