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

//! turn sampled CSV rows into map regions.
//!
//! There are two paths, depending on the available column roles:
//!  - coordinate path (latitude and longitude columns): rows are grouped by their country/area value
//!    (or "Unknown Region") and each group with at least 3 distinct points gets a boundary polygon.
//!    Up to `hull_threshold` distinct points we compute the convex hull, above it the bounding box
//!  - country path (only a country column): rows are grouped by resolved country name and each
//!    group gets the static bounding box of that country
//!
//! Statistics are never made up. If there is no (consistent) value column the production of a
//! region is a placeholder with a `null` value, and every number carries its provenance

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use eos_common::geo::{LatLng, bounding_rect, close_ring, convex_hull, dedup_points, ring_area, ring_vertex_count};
use crate::{columns::ColumnRoles, country_bounds::lookup_country, csv_sampler::CsvSample, sector::Sector};

pub const UNKNOWN_REGION: &str = "Unknown Region";
const MAX_REPORTED_NAMES: usize = 25;

/* #region measurements *****************************************************************************/

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// computed from values in the data
    Measured,
    /// computed from the geometry we derived from the data
    Derived,
    /// taken from static reference tables
    Reference,
    /// unknown, `value` is null
    Placeholder
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Measurement {
    pub value: Option<f64>,
    pub unit: String,
    pub provenance: Provenance
}

impl Measurement {
    pub fn measured (value: f64, unit: impl ToString)->Self {
        Measurement { value: Some(value), unit: unit.to_string(), provenance: Provenance::Measured }
    }
    pub fn derived (value: f64, unit: impl ToString)->Self {
        Measurement { value: Some(value), unit: unit.to_string(), provenance: Provenance::Derived }
    }
    pub fn reference (value: f64, unit: impl ToString)->Self {
        Measurement { value: Some(value), unit: unit.to_string(), provenance: Provenance::Reference }
    }
    pub fn placeholder (unit: impl ToString)->Self {
        Measurement { value: None, unit: unit.to_string(), provenance: Provenance::Placeholder }
    }

    pub fn is_placeholder (&self)->bool { self.provenance == Provenance::Placeholder }

    /// sum of two measured quantities. Anything else (placeholders, different units) cannot be
    /// added and yields a placeholder
    pub fn add (&self, other: &Measurement)->Measurement {
        match (self.provenance, other.provenance, self.value, other.value) {
            (Provenance::Measured, Provenance::Measured, Some(a), Some(b)) if self.unit == other.unit => {
                Measurement::measured( a + b, &self.unit)
            }
            _ => {
                let unit = if self.unit == other.unit { self.unit.as_str() } else { MIXED_UNITS };
                Measurement::placeholder(unit)
            }
        }
    }
}

pub const AREA_UNIT_KM2: &str = "km2";
pub const AREA_UNIT_DEG2: &str = "deg2";
pub const MIXED_UNITS: &str = "mixed";
pub const NO_UNIT: &str = "";

/* #endregion measurements */

/* #region regions **********************************************************************************/

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    ConvexHull,
    BoundingBox,
    CountryBounds
}

#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct RegionProperties {
    pub area: Measurement,
    pub production: Measurement,
    pub sector: Sector
}

/// a named map polygon. `polygon` is always a closed ring with at least 3 distinct vertices
#[derive(Debug,Clone,PartialEq,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub name: String,
    pub country: String,
    pub polygon: Vec<LatLng>,
    pub boundary: BoundaryKind,
    pub data_points: usize,
    pub properties: RegionProperties,
    pub sources: Vec<String>
}

#[derive(Debug,Clone,Default,PartialEq,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationStats {
    pub rows: usize,
    /// rows without a usable group key or coordinates
    pub rows_skipped: usize,
    pub groups: usize,
    /// coordinate groups that did not span an area (< 3 distinct points, collinear)
    pub degenerate_groups: usize,
    /// rows with country names we could not resolve
    pub unmatched_rows: usize,
    /// first distinct unresolved names (for diagnostics)
    pub unmatched_names: Vec<String>,
    /// regions that were cut by the top-K limit
    pub dropped_regions: usize
}

impl AggregationStats {
    pub fn add (&mut self, other: &AggregationStats) {
        self.rows += other.rows;
        self.rows_skipped += other.rows_skipped;
        self.groups += other.groups;
        self.degenerate_groups += other.degenerate_groups;
        self.unmatched_rows += other.unmatched_rows;
        self.dropped_regions += other.dropped_regions;
        for name in &other.unmatched_names {
            add_unmatched( &mut self.unmatched_names, name);
        }
    }
}

fn add_unmatched (names: &mut Vec<String>, name: &str) {
    if names.len() < MAX_REPORTED_NAMES && !names.iter().any( |n| n == name) {
        names.push( name.to_string());
    }
}

#[derive(Debug,Clone,Default,PartialEq,Serialize)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub stats: AggregationStats
}

impl RegionSet {
    pub fn is_empty (&self)->bool { self.regions.is_empty() }

    /// accumulate regions of another set (usually another file of the same sector). Regions with
    /// the same name are combined: data points and measured values are added, the first polygon is
    /// kept and sources are appended
    pub fn merge (&mut self, other: RegionSet) {
        self.stats.add( &other.stats);

        for region in other.regions {
            if let Some(r) = self.regions.iter_mut().find( |r| r.name == region.name) {
                r.data_points += region.data_points;
                r.properties.production = r.properties.production.add( &region.properties.production);
                for src in region.sources {
                    if !r.sources.contains(&src) { r.sources.push(src) }
                }
            } else {
                self.regions.push( region);
            }
        }
    }

    /// keep the `k` regions with most data points. Ties keep their current order
    pub fn retain_top (&mut self, k: usize) {
        self.regions.sort_by( |a,b| b.data_points.cmp( &a.data_points));
        if self.regions.len() > k {
            self.stats.dropped_regions += self.regions.len() - k;
            self.regions.truncate(k);
        }
    }

    pub fn total_data_points (&self)->usize {
        self.regions.iter().map( |r| r.data_points).sum()
    }
}

/* #endregion regions */

/* #region aggregation ******************************************************************************/

#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
#[serde(default)]
pub struct AggregationOptions {
    /// max number of regions per file and sector
    pub top_regions: usize,
    /// max number of distinct points for which we compute convex hulls (bounding box above)
    pub hull_threshold: usize
}

impl Default for AggregationOptions {
    fn default ()->Self {
        AggregationOptions { top_regions: 30, hull_threshold: 10 }
    }
}

/// running per-group values
struct Group {
    name: String,
    rows: usize,
    points: Vec<LatLng>,
    value: Option<Measurement>
}

impl Group {
    fn new (name: &str)->Self {
        Group { name: name.to_string(), rows: 0, points: Vec::new(), value: None }
    }

    fn add_value (&mut self, v: Option<f64>, unit: &str) {
        if let Some(v) = v {
            let m = Measurement::measured( v, unit);
            self.value = Some( match &self.value {
                Some(acc) => acc.add(&m),
                None => m
            });
        }
    }

    fn production (&self)->Measurement {
        self.value.clone().unwrap_or_else( || Measurement::placeholder(NO_UNIT))
    }
}

/// insertion ordered group map
#[derive(Default)]
struct Groups {
    index: HashMap<String,usize>,
    groups: Vec<Group>
}

impl Groups {
    fn get_mut (&mut self, name: &str)->&mut Group {
        let idx = match self.index.get(name) {
            Some(idx) => *idx,
            None => {
                let idx = self.groups.len();
                self.index.insert( name.to_string(), idx);
                self.groups.push( Group::new(name));
                idx
            }
        };
        &mut self.groups[idx]
    }
}

fn parse_number (s: &str)->Option<f64> {
    s.trim().parse::<f64>().ok().filter( |v| v.is_finite())
}

fn parse_coordinate (lat: &str, lng: &str)->Option<LatLng> {
    let p = LatLng::new( parse_number(lat)?, parse_number(lng)?);
    if p.lat.abs() <= 90.0 && p.lng.abs() <= 180.0 { Some(p) } else { None }
}

/// compute the regions of one sampled file
pub fn aggregate_regions (sample: &CsvSample, roles: &ColumnRoles, sector: Sector, source: &str, opts: &AggregationOptions)->RegionSet {
    let mut set = if roles.has_coordinates() {
        aggregate_coordinates( sample, roles, sector, source, opts)
    } else if roles.country.is_some() {
        aggregate_countries( sample, roles, sector, source)
    } else {
        RegionSet::default()
    };

    set.retain_top( opts.top_regions);
    set
}

fn unit_column (sample: &CsvSample)->Option<usize> {
    sample.column_index("unit")
}

fn aggregate_coordinates (sample: &CsvSample, roles: &ColumnRoles, sector: Sector, source: &str, opts: &AggregationOptions)->RegionSet {
    let mut stats = AggregationStats { rows: sample.len(), ..Default::default() };
    let mut groups = Groups::default();
    let (Some(lat_col), Some(lng_col)) = (&roles.lat, &roles.lng) else { return RegionSet::default() };
    let unit_col = unit_column(sample);

    for row in &sample.rows {
        let Some(p) = parse_coordinate( row.get(lat_col.index), row.get(lng_col.index)) else {
            stats.rows_skipped += 1;
            continue
        };

        let name = roles.group_column().map( |c| row.get(c.index)).filter( |s| !s.is_empty()).unwrap_or(UNKNOWN_REGION);
        let group = groups.get_mut(name);
        group.rows += 1;
        group.points.push(p);
        if let Some(vc) = &roles.value {
            group.add_value( parse_number( row.get(vc.index)), unit_col.map( |i| row.get(i)).unwrap_or(NO_UNIT));
        }
    }

    stats.groups = groups.groups.len();
    let mut regions: Vec<Region> = Vec::new();

    for group in groups.groups {
        let distinct = dedup_points( &group.points);

        let boundary = if distinct.len() < 3 {
            None
        } else if distinct.len() <= opts.hull_threshold {
            convex_hull( &distinct).map( |hull| (close_ring(hull), BoundaryKind::ConvexHull))
        } else {
            bounding_rect( &distinct).filter( |r| r.has_extent()).map( |r| (r.ring(), BoundaryKind::BoundingBox))
        };

        let Some((polygon,kind)) = boundary else {
            warn!("degenerate point group '{}' in {} ({} distinct points)", group.name, source, distinct.len());
            stats.degenerate_groups += 1;
            continue
        };

        let country = if group.name == UNKNOWN_REGION || roles.country.is_none() {
            "Unknown".to_string()
        } else {
            lookup_country( &group.name).map( |cb| cb.name.to_string()).unwrap_or_else( || group.name.clone())
        };

        regions.push( Region {
            name: group.name.clone(),
            country,
            properties: RegionProperties {
                area: Measurement::derived( ring_area(&polygon), AREA_UNIT_DEG2),
                production: group.production(),
                sector
            },
            polygon,
            boundary: kind,
            data_points: group.rows,
            sources: vec![ source.to_string() ]
        });
    }

    debug!("{} coordinate regions from {} rows of {}", regions.len(), stats.rows, source);
    RegionSet { regions, stats }
}

fn aggregate_countries (sample: &CsvSample, roles: &ColumnRoles, sector: Sector, source: &str)->RegionSet {
    let mut stats = AggregationStats { rows: sample.len(), ..Default::default() };
    let mut groups = Groups::default();
    let Some(country_col) = &roles.country else { return RegionSet::default() };
    let unit_col = unit_column(sample);
    let mut bounds = Vec::new();

    for row in &sample.rows {
        let name = row.get( country_col.index);
        if name.is_empty() {
            stats.rows_skipped += 1;
            continue
        }

        let Some(cb) = lookup_country(name) else {
            stats.unmatched_rows += 1;
            add_unmatched( &mut stats.unmatched_names, name);
            continue
        };

        let group = groups.get_mut( cb.name);
        if group.rows == 0 { bounds.push(cb) }
        group.rows += 1;
        if let Some(vc) = &roles.value {
            group.add_value( parse_number( row.get(vc.index)), unit_col.map( |i| row.get(i)).unwrap_or(NO_UNIT));
        }
    }

    if !stats.unmatched_names.is_empty() {
        debug!("unmatched country names in {}: {:?}", source, stats.unmatched_names);
    }

    stats.groups = groups.groups.len();
    let regions: Vec<Region> = groups.groups.iter().zip( bounds.iter()).map( |(group,cb)| {
        Region {
            name: cb.name.to_string(),
            country: cb.name.to_string(),
            polygon: cb.bounds.ring(),
            boundary: BoundaryKind::CountryBounds,
            data_points: group.rows,
            properties: RegionProperties {
                area: Measurement::reference( cb.area_km2, AREA_UNIT_KM2),
                production: group.production(),
                sector
            },
            sources: vec![ source.to_string() ]
        }
    }).collect();

    debug_assert!( regions.iter().all( |r| ring_vertex_count(&r.polygon) >= 3));
    RegionSet { regions, stats }
}

/* #endregion aggregation */
