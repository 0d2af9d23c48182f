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

//! classification of data files into fixed agricultural sectors, based on substrings of their names

use std::fmt;
use serde::{Deserialize, Serialize};
use regex::Regex;
use lazy_static::lazy_static;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    CropsProduction,
    Trade,
    FoodSupply,
    LandUse,
    Forestry,
    Fertilizers,
    Emissions,
    Livestock,
    ProductionIndices,
    General
}

/// presentation metadata for map legends
#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
pub struct SectorInfo {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str
}

/// the order of this table is significant: the first sector with a matching pattern wins
const SECTOR_PATTERNS: &[(Sector, &[&str])] = &[
    (Sector::CropsProduction,   &["crop", "qcl"]),
    (Sector::Trade,             &["trade", "export", "import"]),
    (Sector::FoodSupply,        &["food_supply", "food_balance", "fbs"]),
    (Sector::LandUse,           &["land"]),
    (Sector::Forestry,          &["forest"]),
    (Sector::Fertilizers,       &["fertilizer"]),
    (Sector::Emissions,         &["emission"]),
    (Sector::Livestock,         &["livestock", "animal"]),
    (Sector::ProductionIndices, &["indices", "index"]),
];

const ALL_SECTORS: [Sector;10] = [
    Sector::CropsProduction, Sector::Trade, Sector::FoodSupply, Sector::LandUse, Sector::Forestry,
    Sector::Fertilizers, Sector::Emissions, Sector::Livestock, Sector::ProductionIndices, Sector::General
];

impl Sector {
    pub fn all ()->&'static [Sector] { &ALL_SECTORS }

    pub fn key (&self)->&'static str {
        match self {
            Sector::CropsProduction => "crops_production",
            Sector::Trade => "trade",
            Sector::FoodSupply => "food_supply",
            Sector::LandUse => "land_use",
            Sector::Forestry => "forestry",
            Sector::Fertilizers => "fertilizers",
            Sector::Emissions => "emissions",
            Sector::Livestock => "livestock",
            Sector::ProductionIndices => "production_indices",
            Sector::General => "general"
        }
    }

    /// parse a sector key ("land_use") or display name ("Land Use"), case insensitive
    pub fn from_key (s: &str)->Option<Sector> {
        let s = s.trim();
        ALL_SECTORS.iter().copied().find( |sec| sec.key().eq_ignore_ascii_case(s) || sec.info().name.eq_ignore_ascii_case(s))
    }

    pub fn info (&self)->SectorInfo {
        let (name,icon,color) = match self {
            Sector::CropsProduction => ("Crops & Production", "🌾", "#4caf50"),
            Sector::Trade => ("Trade", "🚢", "#2196f3"),
            Sector::FoodSupply => ("Food Supply", "🍽️", "#ff9800"),
            Sector::LandUse => ("Land Use", "🗺️", "#795548"),
            Sector::Forestry => ("Forestry", "🌲", "#2e7d32"),
            Sector::Fertilizers => ("Fertilizers", "🧪", "#9c27b0"),
            Sector::Emissions => ("Emissions", "🏭", "#607d8b"),
            Sector::Livestock => ("Livestock", "🐄", "#e91e63"),
            Sector::ProductionIndices => ("Production Indices", "📈", "#00bcd4"),
            Sector::General => ("General", "📊", "#9e9e9e")
        };
        SectorInfo { name, icon, color }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// map a file name to its sector. Matching is on the lower cased name, patterns are checked in
/// table order and `General` is returned if none matches
pub fn classify_sector (file_name: &str)->Sector {
    let name = file_name.to_lowercase();
    SECTOR_PATTERNS.iter()
        .find( |(_,patterns)| patterns.iter().any( |p| name.contains(p)))
        .map( |(sector,_)| *sector)
        .unwrap_or( Sector::General)
}

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r#"(?:^|[^0-9])((?:19|20)\d\d)(?:[^0-9]|$)"#).unwrap();
}

/// the first 4 digit year (1900..2099) that is not part of a longer number in the file name, if any
pub fn file_year (file_name: &str)->Option<u16> {
    YEAR_RE.captures( file_name)
        .and_then( |caps| caps.get(1))
        .and_then( |m| m.as_str().parse().ok())
}
