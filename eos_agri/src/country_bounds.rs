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

//! static bounding boxes and nominal areas for countries that show up in FAO datasets.
//! The boxes are coarse (mainland extents, no overseas territories) and only meant to give each
//! country a displayable footprint on a map.
//!
//! Name resolution goes exact (case insensitive, including aliases) first and only then falls back
//! to substring containment in either direction. Since the fallback takes the first match in table
//! order, entries whose names contain other entry names ("Guinea-Bissau" / "Guinea", "Nigeria" /
//! "Niger") have to come first.

use eos_common::geo::GeoRect;

#[derive(Debug,Clone,PartialEq)]
pub struct CountryBounds {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub bounds: GeoRect,
    pub area_km2: f64
}

impl CountryBounds {
    fn names (&self)->impl Iterator<Item=&'static str> {
        std::iter::once(self.name).chain( self.aliases.iter().copied())
    }
}

const fn c (name: &'static str, aliases: &'static [&'static str], w: f64, s: f64, e: f64, n: f64, area_km2: f64)->CountryBounds {
    CountryBounds { name, aliases, bounds: GeoRect::new(w,s,e,n), area_km2 }
}

pub const MIN_LOOKUP_LEN: usize = 3;

static COUNTRY_BOUNDS: &[CountryBounds] = &[
    c("Afghanistan", &[], 60.53, 29.32, 75.16, 38.49, 652230.0),
    c("Algeria", &[], -8.68, 19.06, 12.00, 37.12, 2381741.0),
    c("Angola", &[], 11.64, -17.93, 24.08, -4.44, 1246700.0),
    c("Argentina", &[], -73.58, -55.06, -53.64, -21.78, 2780400.0),
    c("Australia", &[], 113.34, -43.63, 153.57, -10.67, 7692024.0),
    c("Austria", &[], 9.48, 46.43, 16.98, 49.04, 83879.0),
    c("Bangladesh", &[], 88.08, 20.74, 92.67, 26.45, 147570.0),
    c("Belarus", &[], 23.18, 51.26, 32.78, 56.17, 207600.0),
    c("Belgium", &[], 2.51, 49.53, 6.16, 51.48, 30528.0),
    c("Bolivia", &[], -69.59, -22.90, -57.50, -9.68, 1098581.0),
    c("Brazil", &[], -73.99, -33.75, -34.79, 5.27, 8515767.0),
    c("Bulgaria", &[], 22.38, 41.23, 28.61, 44.23, 110994.0),
    c("Cambodia", &[], 102.35, 10.49, 107.63, 14.69, 181035.0),
    c("Cameroon", &[], 8.49, 1.73, 16.01, 12.86, 475442.0),
    c("Canada", &[], -141.00, 41.68, -52.65, 83.11, 9984670.0),
    c("Chile", &[], -75.64, -55.61, -66.96, -17.58, 756102.0),
    c("China", &["China, mainland"], 73.68, 18.20, 134.77, 53.56, 9596961.0),
    c("Colombia", &[], -78.99, -4.30, -66.88, 12.44, 1141748.0),
    c("Democratic Republic of the Congo", &["DR Congo", "Democratic Republic of Congo", "Dem. Rep. Congo"], 12.18, -13.46, 31.31, 5.39, 2344858.0),
    c("Congo", &["Republic of the Congo"], 11.09, -5.04, 18.65, 3.70, 342000.0),
    c("Côte d'Ivoire", &["Cote d'Ivoire", "Ivory Coast"], -8.60, 4.36, -2.49, 10.74, 322463.0),
    c("Cuba", &[], -84.97, 19.86, -74.18, 23.19, 109884.0),
    c("Czechia", &["Czech Republic"], 12.24, 48.56, 18.85, 51.12, 78871.0),
    c("Denmark", &[], 8.09, 54.80, 12.69, 57.73, 42933.0),
    c("Dominican Republic", &["Dominican Rep."], -71.95, 17.60, -68.32, 19.88, 48671.0),
    c("Dominica", &[], -61.48, 15.20, -61.24, 15.64, 751.0),
    c("Ecuador", &[], -80.97, -5.01, -75.23, 1.44, 283561.0),
    c("Egypt", &[], 24.70, 22.00, 36.87, 31.59, 1001450.0),
    c("Ethiopia", &[], 32.95, 3.42, 47.79, 14.96, 1104300.0),
    c("Finland", &[], 20.65, 59.81, 31.52, 70.16, 338455.0),
    c("France", &[], -5.14, 41.33, 9.56, 51.09, 551695.0),
    c("Germany", &[], 5.99, 47.30, 15.02, 54.98, 357588.0),
    c("Ghana", &[], -3.24, 4.71, 1.06, 11.17, 238533.0),
    c("Greece", &[], 20.15, 34.92, 26.60, 41.83, 131957.0),
    c("Guinea-Bissau", &[], -16.68, 10.92, -13.70, 12.69, 36125.0),
    c("Equatorial Guinea", &[], 9.31, 1.01, 11.29, 2.28, 28051.0),
    c("Papua New Guinea", &[], 141.00, -10.65, 156.02, -2.50, 462840.0),
    c("Guinea", &[], -15.13, 7.31, -7.83, 12.59, 245857.0),
    c("Hungary", &[], 16.20, 45.76, 22.71, 48.62, 93028.0),
    c("India", &[], 68.18, 7.97, 97.40, 35.49, 3287263.0),
    c("Indonesia", &[], 95.29, -10.36, 141.03, 5.48, 1904569.0),
    c("Iran", &[], 44.11, 25.08, 63.32, 39.71, 1648195.0),
    c("Iraq", &[], 38.79, 29.10, 48.57, 37.39, 438317.0),
    c("Ireland", &[], -9.98, 51.67, -6.03, 55.13, 70273.0),
    c("Italy", &[], 6.75, 36.62, 18.48, 47.12, 301340.0),
    c("Japan", &[], 129.41, 31.03, 145.54, 45.55, 377975.0),
    c("Kazakhstan", &[], 46.47, 40.66, 87.36, 55.39, 2724900.0),
    c("Kenya", &[], 33.89, -4.68, 41.86, 5.51, 580367.0),
    c("Democratic People's Republic of Korea", &["North Korea"], 124.21, 37.67, 130.78, 43.01, 120538.0),
    c("Republic of Korea", &["South Korea"], 126.12, 34.39, 129.47, 38.61, 100210.0),
    c("Madagascar", &[], 43.22, -25.61, 50.48, -11.95, 587041.0),
    c("Malaysia", &[], 100.09, 0.77, 119.18, 6.93, 330803.0),
    c("Somalia", &[], 40.99, -1.68, 51.41, 11.98, 637657.0),
    c("Mali", &[], -12.17, 10.10, 4.27, 24.97, 1240192.0),
    c("Mexico", &[], -117.13, 14.53, -86.81, 32.72, 1964375.0),
    c("Morocco", &[], -17.02, 21.42, -1.12, 35.76, 446550.0),
    c("Mozambique", &[], 30.18, -26.74, 40.78, -10.32, 801590.0),
    c("Myanmar", &["Burma"], 92.30, 9.93, 101.18, 28.34, 676578.0),
    c("Nepal", &[], 80.09, 26.40, 88.17, 30.42, 147181.0),
    c("Netherlands", &[], 3.31, 50.80, 7.09, 53.51, 41850.0),
    c("New Zealand", &[], 166.51, -46.64, 178.52, -34.45, 268021.0),
    c("Nigeria", &[], 2.69, 4.24, 14.58, 13.87, 923768.0),
    c("Niger", &[], 0.30, 11.66, 15.90, 23.47, 1267000.0),
    c("Norway", &[], 4.99, 58.08, 31.29, 70.92, 385207.0),
    c("Pakistan", &[], 60.87, 23.69, 77.84, 37.13, 881913.0),
    c("Paraguay", &[], -62.68, -27.55, -54.29, -19.29, 406752.0),
    c("Peru", &[], -81.41, -18.35, -68.67, -0.06, 1285216.0),
    c("Philippines", &[], 117.17, 5.58, 126.54, 18.51, 300000.0),
    c("Poland", &[], 14.07, 49.03, 24.03, 54.85, 312696.0),
    c("Portugal", &[], -9.53, 36.84, -6.39, 42.28, 92212.0),
    c("Romania", &[], 20.22, 43.69, 29.63, 48.22, 238397.0),
    c("Russian Federation", &["Russia"], 19.64, 41.19, 180.00, 81.86, 17098246.0),
    c("Saudi Arabia", &[], 34.63, 16.35, 55.67, 32.16, 2149690.0),
    c("Senegal", &[], -17.54, 12.31, -11.35, 16.69, 196722.0),
    c("South Africa", &[], 16.34, -34.82, 32.83, -22.09, 1221037.0),
    c("South Sudan", &[], 23.89, 3.51, 35.30, 12.25, 644329.0),
    c("Sudan", &[], 21.94, 8.62, 38.41, 22.00, 1861484.0),
    c("Spain", &[], -9.39, 35.95, 3.04, 43.75, 505990.0),
    c("Sri Lanka", &[], 79.65, 5.92, 81.88, 9.84, 65610.0),
    c("Sweden", &[], 11.03, 55.36, 23.90, 69.11, 450295.0),
    c("Switzerland", &[], 6.02, 45.78, 10.44, 47.83, 41285.0),
    c("Thailand", &[], 97.38, 5.69, 105.59, 20.46, 513120.0),
    c("Tunisia", &[], 7.52, 30.23, 11.60, 37.35, 163610.0),
    c("Türkiye", &["Turkey", "Turkiye"], 26.04, 35.82, 44.79, 42.14, 783562.0),
    c("Uganda", &[], 29.58, -1.48, 35.04, 4.23, 241550.0),
    c("Ukraine", &[], 22.14, 44.39, 40.23, 52.38, 603550.0),
    c("United Kingdom", &["United Kingdom of Great Britain and Northern Ireland", "UK", "Great Britain"], -8.65, 49.86, 1.77, 60.86, 242495.0),
    c("United Republic of Tanzania", &["Tanzania"], 29.34, -11.72, 40.32, -0.95, 947303.0),
    c("United States of America", &["United States", "USA"], -124.73, 24.54, -66.95, 49.38, 9833517.0),
    c("Uruguay", &[], -58.44, -34.95, -53.07, -30.11, 176215.0),
    c("Uzbekistan", &[], 55.99, 37.18, 73.13, 45.59, 448978.0),
    c("Venezuela", &[], -73.35, 0.65, -59.80, 12.20, 916445.0),
    c("Viet Nam", &["Vietnam"], 102.14, 8.56, 109.46, 23.39, 331212.0),
    c("Zambia", &[], 21.99, -18.08, 33.71, -8.22, 752612.0),
    c("Zimbabwe", &[], 25.24, -22.42, 33.06, -15.61, 390757.0),
];

/// name fragments of FAO aggregate areas (continents, economic groups) which must never resolve
/// to a single country
const AGGREGATE_FRAGMENTS: &[&str] = &[
    "world", "africa", "america", "asia", "europe", "oceania", "caribbean", "melanesia", "micronesia",
    "polynesia", "countries", "union", "developing", "developed", "income"
];

pub fn all_countries ()->&'static [CountryBounds] { COUNTRY_BOUNDS }

pub fn is_aggregate_name (name: &str)->bool {
    let name = name.to_lowercase();
    AGGREGATE_FRAGMENTS.iter().any( |f| name.contains(f))
}

/// resolve a free text country name to its table entry
pub fn lookup_country (name: &str)->Option<&'static CountryBounds> {
    let key = name.trim().to_lowercase();
    if key.is_empty() { return None }

    let exact = COUNTRY_BOUNDS.iter().find( |cb| cb.names().any( |n| n.to_lowercase() == key));
    if exact.is_some() { return exact }

    if key.chars().count() < MIN_LOOKUP_LEN || is_aggregate_name(&key) { return None }

    // short abbreviations ("UK") are too ambiguous for containment tests
    COUNTRY_BOUNDS.iter().find( |cb| {
        cb.names().filter( |n| n.chars().count() > MIN_LOOKUP_LEN).any( |n| {
            let n = n.to_lowercase();
            n.contains(&key) || key.contains(&n)
        })
    })
}
