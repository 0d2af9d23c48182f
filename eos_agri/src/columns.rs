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

//! infer which CSV columns carry geographic information

use serde::Serialize;

#[derive(Debug,Clone,PartialEq,Eq,Serialize)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String
}

/// semantic roles of columns. Each role is assigned to at most one column
#[derive(Debug,Clone,Default,PartialEq,Eq,Serialize)]
pub struct ColumnRoles {
    #[serde(rename = "countryColumn")]
    pub country: Option<ColumnRef>,
    #[serde(rename = "latColumn")]
    pub lat: Option<ColumnRef>,
    #[serde(rename = "lngColumn")]
    pub lng: Option<ColumnRef>,
    #[serde(rename = "valueColumn")]
    pub value: Option<ColumnRef>,
    /// sub-national region names, only used to group coordinates
    #[serde(rename = "regionColumn")]
    pub region: Option<ColumnRef>
}

impl ColumnRoles {
    /// both latitude and longitude columns were found
    pub fn has_coordinates (&self)->bool { self.lat.is_some() && self.lng.is_some() }

    /// false means the data cannot be mapped and should be skipped
    pub fn is_geographic (&self)->bool { self.country.is_some() || self.has_coordinates() }

    /// the column that names coordinate groups
    pub fn group_column (&self)->Option<&ColumnRef> { self.country.as_ref().or( self.region.as_ref()) }
}

const LAT_PATTERNS: &[&str] = &["lat"];
const LNG_PATTERNS: &[&str] = &["lon", "lng"];
const COUNTRY_PATTERNS: &[&str] = &["country", "area"];
const REGION_PATTERNS: &[&str] = &["region"];

/// words that contain "lat" but are no latitudes
const LAT_EXCLUDES: &[&str] = &["population", "relat", "latest"];

/// FAO tables have numeric "Area Code" columns next to "Area", which are identifiers and no names
const COUNTRY_EXCLUDES: &[&str] = &["code"];

fn find_column (headers: &[String], patterns: &[&str], excludes: &[&str])->Option<ColumnRef> {
    headers.iter().enumerate()
        .find( |(_,h)| {
            let h = h.to_lowercase();
            patterns.iter().any( |p| h.contains(p)) && !excludes.iter().any( |x| h.contains(x))
        })
        .map( |(index,h)| ColumnRef { index, name: h.clone() })
}

/// case insensitive substring match of headers against a fixed vocabulary, first match in header
/// order wins for each role. The value role requires a header that is exactly "value"
pub fn sniff_columns (headers: &[String])->ColumnRoles {
    ColumnRoles {
        country: find_column( headers, COUNTRY_PATTERNS, COUNTRY_EXCLUDES),
        lat: find_column( headers, LAT_PATTERNS, LAT_EXCLUDES),
        lng: find_column( headers, LNG_PATTERNS, &[]),
        value: headers.iter().position( |h| h.trim().eq_ignore_ascii_case("value"))
            .map( |index| ColumnRef { index, name: headers[index].clone() }),
        region: find_column( headers, REGION_PATTERNS, COUNTRY_EXCLUDES)
    }
}
