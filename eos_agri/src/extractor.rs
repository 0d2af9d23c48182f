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

//! the extraction pipeline: select objects of a container, sample each of them, infer column roles
//! and aggregate regions per sector.
//!
//! Objects are processed smallest first. Downloads are the only suspension points, parsing and
//! geometry run on blocking worker threads. Every object read gets a deadline derived from the
//! deadline of the whole run, so that a slow object cannot use up the budget of all others

use std::{collections::BTreeMap, sync::Arc, time::{Duration, Instant}};
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{debug, info, warn};

use eos_common::{deadline::Deadline, store::{ObjectBytes, ObjectStore, RemoteObject}};
use crate::{
    aggregator::{AggregationOptions, AggregationStats, Region, RegionSet, aggregate_regions},
    columns::{ColumnRoles, sniff_columns},
    config::{AgriConfig, SamplingConfig, SelectionConfig},
    csv_sampler::sample_csv,
    errors::{EosAgriError, Result},
    sector::{Sector, SectorInfo, classify_sector, file_year}
};

/// the regions we got out of a single object
#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtraction {
    pub file: String,
    pub sector: Sector,
    pub roles: ColumnRoles,
    pub rows_sampled: usize,
    /// true if we did not look at all of the object (size or row limit)
    pub partial: bool,
    #[serde(flatten)]
    pub regions: RegionSet
}

#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorData {
    pub sector: Sector,
    #[serde(flatten)]
    pub info: SectorInfo,
    pub regions: Vec<Region>,
    pub stats: AggregationStats,
    pub files: Vec<String>
}

impl SectorData {
    fn new (sector: Sector)->Self {
        SectorData { sector, info: sector.info(), regions: Vec::new(), stats: AggregationStats::default(), files: Vec::new() }
    }

    fn add (&mut self, fx: FileExtraction) {
        let mut set = RegionSet { regions: std::mem::take( &mut self.regions), stats: std::mem::take( &mut self.stats) };
        set.merge( fx.regions);
        self.regions = set.regions;
        self.stats = set.stats;
        self.files.push( fx.file);
    }

    fn retain_top (&mut self, k: usize) {
        let mut set = RegionSet { regions: std::mem::take( &mut self.regions), stats: std::mem::take( &mut self.stats) };
        set.retain_top(k);
        self.regions = set.regions;
        self.stats = set.stats;
    }
}

#[derive(Debug,Clone,Default,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub container: String,
    pub files_listed: usize,
    pub files_selected: usize,
    pub files_processed: usize,
    /// files without geographic columns
    pub files_skipped: usize,
    /// files we could not read (including per-object timeouts)
    pub files_failed: usize,
    pub rows_sampled: usize,
    pub regions: usize,
    pub degenerate_groups: usize,
    pub unmatched_rows: usize,
    #[serde(serialize_with = "eos_common::datetime::ser_epoch_millis_option")]
    pub computed_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64
}

/// the result of a complete extraction run
#[derive(Debug,Clone,Default,Serialize)]
pub struct Aggregation {
    pub sectors: BTreeMap<Sector,SectorData>,
    pub summary: ExtractionSummary
}

impl Aggregation {
    pub fn regions (&self)->impl Iterator<Item=&Region> {
        self.sectors.values().flat_map( |sd| sd.regions.iter())
    }
}

/// object listing entry with the tags we derive from its name
#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(flatten)]
    pub object: RemoteObject,
    pub sector: Sector,
    pub sector_name: &'static str,
    pub year: Option<u16>,
    /// would be processed by an aggregation run
    pub selected: bool
}

/// preview of an object
#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSample {
    pub file: String,
    pub sector: Sector,
    pub bytes_read: usize,
    pub truncated: bool,
    pub headers: Vec<String>,
    pub roles: ColumnRoles,
    pub rows: Vec<BTreeMap<String,String>>
}

pub struct AgriExtractor {
    store: Arc<dyn ObjectStore>,
    sampling: SamplingConfig,
    selection: SelectionConfig,
    aggregation: AggregationOptions,
    object_timeout: Duration
}

impl AgriExtractor {
    pub fn new (store: Arc<dyn ObjectStore>, config: &AgriConfig)->Self {
        AgriExtractor {
            store,
            sampling: config.sampling.clone(),
            selection: config.selection.clone(),
            aggregation: config.aggregation,
            object_timeout: config.object_timeout
        }
    }

    pub fn store (&self)->&Arc<dyn ObjectStore> { &self.store }

    pub fn sampling (&self)->&SamplingConfig { &self.sampling }

    /// candidates with matching extensions in ascending size order (ties by name), limited by the
    /// configured size tiers. Without tiers all candidates are selected
    pub fn select_objects (&self, objects: Vec<RemoteObject>)->Vec<RemoteObject> {
        let mut candidates: Vec<RemoteObject> = objects.into_iter()
            .filter( |o| self.selection.extensions.iter().any( |ext| o.has_extension(ext)))
            .collect();
        candidates.sort_by( |a,b| a.size_bytes.cmp( &b.size_bytes).then_with( || a.name.cmp( &b.name)));

        if self.selection.tiers.is_empty() { return candidates }

        let mut selected: Vec<RemoteObject> = Vec::new();
        let mut lower: Option<u64> = None;
        for tier in &self.selection.tiers {
            selected.extend(
                candidates.iter()
                    .filter( |o| lower.is_none_or( |min| o.size_bytes > min) && o.size_bytes <= tier.max_bytes)
                    .take( tier.max_files)
                    .cloned()
            );
            lower = Some( tier.max_bytes);
        }
        selected
    }

    async fn read_sample_bytes (&self, name: &str, max_bytes: u64, deadline: &Deadline)->Result<ObjectBytes> {
        let object_deadline = deadline.child( Some(self.object_timeout));
        match object_deadline.run( self.store.read_object( name, max_bytes)).await {
            Ok(res) => Ok(res?),
            Err(expiry) => Err( EosAgriError::DeadlineExceeded( format!("reading {name}: {expiry}")))
        }
    }

    /// download the head of an object and compute its regions
    pub async fn extract_object (&self, name: &str, deadline: &Deadline)->Result<FileExtraction> {
        let bytes = self.read_sample_bytes( name, self.sampling.max_bytes, deadline).await?;

        let file = name.to_string();
        let sector = classify_sector( file_name(name));
        let max_rows = self.sampling.max_rows;
        let opts = self.aggregation;

        let fx = tokio::task::spawn_blocking( move || {
            let sample = sample_csv( &bytes.data, max_rows, bytes.truncated);
            let roles = sniff_columns( &sample.headers);
            let regions = if roles.is_geographic() {
                aggregate_regions( &sample, &roles, sector, &file, &opts)
            } else {
                RegionSet::default()
            };
            FileExtraction { file, sector, roles, rows_sampled: sample.len(), partial: sample.partial, regions }
        }).await?;

        debug!("extracted {} regions from {} ({} rows)", fx.regions.regions.len(), name, fx.rows_sampled);
        Ok(fx)
    }

    /// run the whole pipeline over all selected objects. Objects that cannot be read are skipped,
    /// but if `deadline` expires the run fails with `DeadlineExceeded`
    pub async fn aggregate_all (&self, deadline: &Deadline)->Result<Aggregation> {
        let t0 = Instant::now();
        let container = self.store.container().to_string();

        let objects = match deadline.run( self.store.list_objects( &self.selection.prefix)).await {
            Ok(res) => res?,
            Err(expiry) => return Err( EosAgriError::DeadlineExceeded( format!("listing {container}: {expiry}")))
        };

        let mut summary = ExtractionSummary { container, files_listed: objects.len(), ..Default::default() };
        let selected = self.select_objects( objects);
        summary.files_selected = selected.len();
        info!("aggregating {} of {} objects in {}", summary.files_selected, summary.files_listed, summary.container);

        // buffered() yields results in input order, which keeps merging deterministic
        let names: Vec<String> = selected.iter().map( |o| o.name.clone()).collect();
        let mut results = stream::iter( names)
            .map( |name| async move { self.extract_object( &name, deadline).await })
            .buffered( self.sampling.concurrency.max(1));

        let mut sectors: BTreeMap<Sector,SectorData> = BTreeMap::new();
        let mut idx = 0;
        while let Some(res) = results.next().await {
            let name = &selected[idx].name;
            idx += 1;

            match res {
                Ok(fx) => {
                    summary.rows_sampled += fx.rows_sampled;
                    if fx.roles.is_geographic() {
                        let sector = fx.sector;
                        summary.files_processed += 1;
                        sectors.entry( sector).or_insert_with( || SectorData::new( sector)).add( fx);
                    } else {
                        debug!("skipping non-geographic object {name}");
                        summary.files_skipped += 1;
                    }
                }
                Err(e) => {
                    if deadline.is_expired() {
                        return Err( EosAgriError::DeadlineExceeded( format!("aggregation aborted after {idx} of {} objects", selected.len())))
                    }
                    warn!("skipping object {name}: {e}");
                    summary.files_failed += 1;
                }
            }
        }

        for sd in sectors.values_mut() {
            sd.retain_top( self.aggregation.top_regions);
            summary.regions += sd.regions.len();
            summary.degenerate_groups += sd.stats.degenerate_groups;
            summary.unmatched_rows += sd.stats.unmatched_rows;
        }
        summary.computed_at = Some( Utc::now());
        summary.elapsed_ms = t0.elapsed().as_millis() as u64;

        info!("aggregation of {} done: {} regions in {} sectors ({} ms)", summary.container, summary.regions, sectors.len(), summary.elapsed_ms);
        Ok( Aggregation { sectors, summary })
    }

    /// objects under `prefix` with sector and year tags
    pub async fn list_files (&self, prefix: &str)->Result<Vec<FileInfo>> {
        let objects = self.store.list_objects( prefix).await?;
        let selected: Vec<String> = self.select_objects( objects.clone()).into_iter().map( |o| o.name).collect();

        Ok( objects.into_iter().map( |object| {
            let fname = file_name( &object.name);
            let sector = classify_sector( fname);
            FileInfo {
                sector,
                sector_name: sector.info().name,
                year: file_year( fname),
                selected: selected.contains( &object.name),
                object
            }
        }).collect())
    }

    /// header, inferred roles and first `max_rows` rows of an object
    pub async fn sample_object (&self, name: &str, max_rows: usize, deadline: &Deadline)->Result<ObjectSample> {
        let bytes = self.read_sample_bytes( name, self.sampling.max_bytes, deadline).await?;
        let max_rows = max_rows.min( self.sampling.max_rows);
        let file = name.to_string();
        let sector = classify_sector( file_name(name));

        let sample = tokio::task::spawn_blocking( move || {
            let sample = sample_csv( &bytes.data, max_rows, bytes.truncated);
            let roles = sniff_columns( &sample.headers);
            ObjectSample {
                file,
                sector,
                bytes_read: bytes.data.len(),
                truncated: bytes.truncated,
                rows: sample.to_maps(),
                headers: sample.headers,
                roles
            }
        }).await?;

        Ok(sample)
    }
}

fn file_name (name: &str)->&str {
    name.rsplit('/').next().unwrap_or(name)
}
