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

//! planar geometry on geodetic degrees, as it is needed to turn point observations into map
//! polygons. Computations treat longitude as x and latitude as y, i.e. results are in degree space
//! and not ellipsoid aware. This is what map UIs (Leaflet, Mapbox) display, but areas computed here
//! are in square degrees and should only be used as display statistics.
//!
//! We use the [geo](https://docs.rs/geo/latest/geo/index.html) crate where it directly provides what
//! we need (bounding rectangles, polygon interop) and only implement the monotone chain hull ourselves
//! since we need its specific collinear point handling.

use std::{collections::HashSet, fmt};
use serde::{Serialize,Deserialize};
use geo::{BoundingRect, LineString, MultiPoint, Point, Polygon};

/* #region LatLng ***********************************************************************************************/

/// a point in geodetic degrees. This serializes as `[lat,lng]` pair, which is what Leaflet expects
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
#[serde(from = "[f64;2]", into = "[f64;2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64
}

impl LatLng {
    pub fn new (lat: f64, lng: f64)->Self { LatLng { lat, lng } }

    pub fn is_finite (&self)->bool { self.lat.is_finite() && self.lng.is_finite() }

    /// (x,y) order as used by geo types
    pub fn xy (&self)->(f64,f64) { (self.lng, self.lat) }

    fn bits (&self)->(u64,u64) { (self.lat.to_bits(), self.lng.to_bits()) }
}

impl From<[f64;2]> for LatLng {
    fn from (a: [f64;2])->Self { LatLng { lat: a[0], lng: a[1] } }
}

impl From<LatLng> for [f64;2] {
    fn from (p: LatLng)->Self { [p.lat, p.lng] }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.lat, self.lng)
    }
}

/* #endregion LatLng */

/* #region GeoRect ***********************************************************************************************/

/// an axis aligned rectangle in geodetic degrees
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct GeoRect {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64
}

impl GeoRect {
    pub const fn new (west: f64, south: f64, east: f64, north: f64)->Self {
        GeoRect { west, south, east, north }
    }

    pub fn width (&self)->f64 { self.east - self.west }
    pub fn height (&self)->f64 { self.north - self.south }

    pub fn has_extent (&self)->bool { self.width() > 0.0 && self.height() > 0.0 }

    pub fn contains (&self, p: &LatLng)->bool {
        p.lng >= self.west && p.lng <= self.east && p.lat >= self.south && p.lat <= self.north
    }

    pub fn center (&self)->LatLng {
        LatLng::new( (self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    /// closed counter clockwise ring sw -> se -> ne -> nw -> sw
    pub fn ring (&self)->Vec<LatLng> {
        let sw = LatLng::new( self.south, self.west);
        vec![
            sw,
            LatLng::new( self.south, self.east),
            LatLng::new( self.north, self.east),
            LatLng::new( self.north, self.west),
            sw
        ]
    }
}

/* #endregion GeoRect */

/* #region rings ***********************************************************************************************/

/// remove non-finite points and exact duplicates, keeping first-seen order
pub fn dedup_points (points: &[LatLng])->Vec<LatLng> {
    let mut seen: HashSet<(u64,u64)> = HashSet::with_capacity(points.len());
    points.iter()
        .filter( |p| p.is_finite() && seen.insert( p.bits()))
        .copied()
        .collect()
}

/// z component of (a-o) x (b-o) in (lng,lat) space. Positive for a counter clockwise turn o->a->b
#[inline]
fn cross (o: &LatLng, a: &LatLng, b: &LatLng)->f64 {
    (a.lng - o.lng) * (b.lat - o.lat) - (a.lat - o.lat) * (b.lng - o.lng)
}

/// 2D convex hull (Andrew's monotone chain) of the given points, as open counter clockwise ring.
/// Collinear points on the hull boundary are dropped.
/// Returns `None` if there are less than 3 distinct points or all points are collinear
pub fn convex_hull (points: &[LatLng])->Option<Vec<LatLng>> {
    let mut pts = dedup_points(points);
    if pts.len() < 3 { return None }

    pts.sort_by( |a,b| a.lng.total_cmp(&b.lng).then( a.lat.total_cmp(&b.lat)));

    let mut lower: Vec<LatLng> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross( &lower[lower.len()-2], &lower[lower.len()-1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<LatLng> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross( &upper[upper.len()-2], &upper[upper.len()-1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    // last point of each chain is the first point of the other one
    lower.pop();
    upper.pop();
    lower.append( &mut upper);

    if lower.len() < 3 { None } else { Some(lower) }
}

/// the axis aligned bounding rectangle of all finite points
pub fn bounding_rect (points: &[LatLng])->Option<GeoRect> {
    let mp: MultiPoint<f64> = points.iter()
        .filter( |p| p.is_finite())
        .map( |p| Point::new( p.lng, p.lat))
        .collect();

    mp.bounding_rect().map( |r| {
        let (min,max) = (r.min(), r.max());
        GeoRect::new( min.x, min.y, max.x, max.y)
    })
}

/// closed 5 point ring of the bounding rectangle of all finite points
pub fn bounding_ring (points: &[LatLng])->Option<Vec<LatLng>> {
    bounding_rect(points).map( |r| r.ring())
}

pub fn is_closed_ring (ring: &[LatLng])->bool {
    ring.len() > 1 && ring.first() == ring.last()
}

/// append the first vertex if the ring is not closed yet
pub fn close_ring (mut ring: Vec<LatLng>)->Vec<LatLng> {
    if !ring.is_empty() && !is_closed_ring(&ring) {
        ring.push( ring[0]);
    }
    ring
}

/// number of distinct vertices, i.e. not counting the closing vertex
pub fn ring_vertex_count (ring: &[LatLng])->usize {
    if is_closed_ring(ring) { ring.len() - 1 } else { ring.len() }
}

/// shoelace area in square degrees (absolute). Works for open and closed rings.
/// Note this is only meaningful for simple polygons - self intersecting rings return a (smaller) number
pub fn ring_area (ring: &[LatLng])->f64 {
    let n = ring.len();
    if n < 3 { return 0.0 }

    let mut sum = 0.0;
    for i in 0..n {
        let p = &ring[i];
        let q = &ring[(i+1) % n];
        sum += p.lng * q.lat - q.lng * p.lat;
    }
    sum.abs() / 2.0
}

/// convert into a `geo::Polygon` (x = longitude, y = latitude) for interop with geo/geojson
pub fn to_polygon (ring: &[LatLng])->Polygon<f64> {
    let coords: Vec<(f64,f64)> = ring.iter().map( |p| p.xy()).collect();
    Polygon::new( LineString::from(coords), vec![])
}

/* #endregion rings */
