//! Great-circle distances and distance ranking.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::property::{DistanceType, NormalizedProperty};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// Unrounded Haversine distance in miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Haversine distance in miles, rounded to two decimals.
pub fn calculate_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    round_to(haversine_miles(a, b), 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Backfill straight-line distances from `origin` and sort nearest first,
/// two decimals of precision.
pub fn rank_by_distance(properties: &mut [NormalizedProperty], origin: GeoPoint) {
    rank_by_distance_rounded(properties, origin, 2);
}

/// As [`rank_by_distance`] with a caller-chosen rounding.
///
/// Records without coordinates keep a distance of 0 and therefore sort
/// before every located record.
pub fn rank_by_distance_rounded(
    properties: &mut [NormalizedProperty],
    origin: GeoPoint,
    decimals: i32,
) {
    for property in properties.iter_mut() {
        if let Some(point) = property.location() {
            let miles = round_to(haversine_miles(origin, point), decimals);
            property.set_distance(miles, DistanceType::Straight);
        }
    }
    properties.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
}
