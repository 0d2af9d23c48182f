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

use eos_agri::country_bounds::{all_countries, is_aggregate_name, lookup_country};
use eos_common::geo::{is_closed_ring, ring_vertex_count};

fn resolve (name: &str)->Option<&'static str> { lookup_country(name).map( |cb| cb.name) }

#[test]
fn test_exact_match_first() {
    assert_eq!( resolve("Brazil"), Some("Brazil"));
    assert_eq!( resolve("  bRaZiL "), Some("Brazil"));
    assert_eq!( resolve("Guinea"), Some("Guinea"));
    assert_eq!( resolve("Guinea-Bissau"), Some("Guinea-Bissau"));
    assert_eq!( resolve("Equatorial Guinea"), Some("Equatorial Guinea"));
    assert_eq!( resolve("Niger"), Some("Niger"));
    assert_eq!( resolve("Nigeria"), Some("Nigeria"));
    assert_eq!( resolve("Dominica"), Some("Dominica"));
    assert_eq!( resolve("Sudan"), Some("Sudan"));
    assert_eq!( resolve("USA"), Some("United States of America"));
    assert_eq!( resolve("Turkey"), Some("Türkiye"));
}

#[test]
fn test_substring_fallback() {
    assert_eq!( resolve("Iran (Islamic Republic of)"), Some("Iran"));
    assert_eq!( resolve("Bolivia (Plurinational State of)"), Some("Bolivia"));
    assert_eq!( resolve("United Kingdom of Great Britain and Northern Ireland"), Some("United Kingdom"));
    assert_eq!( resolve("Russia"), Some("Russian Federation"));
    assert_eq!( resolve("Republic of Guinea-Bissau"), Some("Guinea-Bissau"));
    assert_eq!( resolve("Somalia"), Some("Somalia")); // not "Mali"
    assert_eq!( resolve("Sudan (former)"), Some("Sudan"));
    assert_eq!( resolve("Dominican Rep."), Some("Dominican Republic")); // not "Dominica"
    assert_eq!( resolve("Democratic Republic of Congo"), Some("Democratic Republic of the Congo"));
    assert_eq!( resolve("Congo"), Some("Congo"));
}

#[test]
fn test_short_aliases() {
    assert_eq!( resolve("UK"), Some("United Kingdom"));
    assert_eq!( resolve(" uk "), Some("United Kingdom"));
    assert_eq!( resolve("US"), None); // too short for containment tests
}

#[test]
fn test_rejected_names() {
    assert_eq!( resolve(""), None);
    assert_eq!( resolve("In"), None);
    assert_eq!( resolve("Atlantis"), None);
    assert_eq!( resolve("World"), None);
    assert_eq!( resolve("Southern Africa"), None);
    assert_eq!( resolve("South America"), None);
    assert_eq!( resolve("European Union (27)"), None);
    assert_eq!( resolve("Least Developed Countries"), None);

    assert!( is_aggregate_name("Eastern Asia"));
    assert!( !is_aggregate_name("Brazil"));
    // exact entries win over aggregate fragments
    assert_eq!( resolve("South Africa"), Some("South Africa"));
}

#[test]
fn test_table_consistency() {
    let countries = all_countries();
    assert!( countries.len() >= 70);

    for (i,cb) in countries.iter().enumerate() {
        assert!( cb.bounds.has_extent(), "{} has no extent", cb.name);
        assert!( cb.area_km2 > 0.0);

        let ring = cb.bounds.ring();
        assert_eq!( ring.len(), 5);
        assert!( is_closed_ring(&ring));
        assert_eq!( ring_vertex_count(&ring), 4);

        // every entry is reachable through its own name
        assert_eq!( resolve(cb.name), Some(cb.name));

        // names containing earlier names would be shadowed in the substring fallback
        for earlier in &countries[..i] {
            assert!( !cb.name.to_lowercase().contains( &earlier.name.to_lowercase()), "{} shadowed by {}", cb.name, earlier.name);
        }
    }
}
