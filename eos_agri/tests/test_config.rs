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

use std::time::Duration;
use eos_agri::{AgriConfig, load_config, config::{SizeTier, StoreConfig}};

#[test]
fn test_load_server_config() {
    let config: AgriConfig = load_config("configs/eos_agri.ron").unwrap();
    println!("{config:#?}");

    match &config.store {
        StoreConfig::Gcs { bucket, token_env, base_url } => {
            assert_eq!( bucket, "eos-fao-agriculture");
            assert_eq!( token_env.as_deref(), Some("GCS_ACCESS_TOKEN"));
            assert!( base_url.is_none());
        }
        other => panic!("unexpected store config {other:?}")
    }
    assert_eq!( config.server.url(), "http://0.0.0.0:9010");
    assert_eq!( config.selection.tiers[1], SizeTier { max_bytes: 10485760, max_files: 5 });
    assert_eq!( config.cache_ttl, Duration::from_secs(30 * 60));
    assert_eq!( config.compute_timeout, Duration::from_secs(120));
}

#[test]
fn test_load_local_config_defaults() {
    let config: AgriConfig = load_config("configs/eos_agri_local.ron").unwrap();

    assert!( matches!( &config.store, StoreConfig::Local { root } if root == "data/fao"));
    assert_eq!( config.sampling.max_rows, 1000);
    assert_eq!( config.selection.extensions, vec!["csv"]);
    assert_eq!( config.aggregation.hull_threshold, 10);
    assert_eq!( config.object_timeout, Duration::from_secs(10));
}

#[test]
fn test_config_errors() {
    assert!( load_config::<AgriConfig,_>("configs/no_such_config.ron").is_err());

    let dir = std::env::temp_dir().join("eos_agri_test_config");
    std::fs::create_dir_all( &dir).unwrap();
    let path = dir.join("broken.ron");
    std::fs::write( &path, "AgriConfig( store: Local( root: 42 ) )").unwrap();
    assert!( matches!( load_config::<AgriConfig,_>(&path), Err(eos_agri::EosAgriError::ConfigError(_))));
}
