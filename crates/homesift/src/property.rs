//! Canonical property shape handed back to callers.

use chrono::{DateTime, NaiveDate, Utc};
use homesift_provider::{PropertyRecord, records::DateSold};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::GeoPoint;

/// How a [`NormalizedProperty::distance`] was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceType {
    #[default]
    Straight,
    Road,
}

/// One listing, normalized from whatever the provider sent.
///
/// Serialized with the consumer-facing field names (`Address`, `Price`,
/// `Distance`, ...). Missing upstream fields stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedProperty {
    pub zpid: Option<String>,
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "LivingArea")]
    pub living_area: Option<f64>,
    pub image: Option<String>,
    #[serde(rename = "Bedrooms")]
    pub bedrooms: Option<u32>,
    #[serde(rename = "Bathrooms")]
    pub bathrooms: Option<f64>,
    #[serde(rename = "YearBuilt")]
    pub year_built: Option<i32>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "listingType")]
    pub listing_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "dateSold")]
    pub date_sold: Option<DateTime<Utc>>,
    #[serde(rename = "Distance")]
    distance: f64,
    #[serde(rename = "DistanceType")]
    distance_type: DistanceType,
}

impl NormalizedProperty {
    pub fn from_record(record: PropertyRecord) -> Self {
        let zpid = record.zpid_string();
        let listing_type = record
            .listing_type
            .or_else(|| record.listing_status.clone());

        Self {
            zpid,
            address: record.address.map(|a| a.formatted()),
            price: record.price,
            living_area: record.living_area,
            image: record.img_src,
            bedrooms: record.bedrooms.filter(|b| *b >= 0.0).map(|b| b as u32),
            bathrooms: record.bathrooms,
            year_built: record.year_built.map(|y| y as i32),
            status: record.listing_status,
            listing_type,
            latitude: record.latitude,
            longitude: record.longitude,
            date_sold: record.date_sold.and_then(parse_date_sold),
            distance: 0.0,
            distance_type: DistanceType::Straight,
        }
    }

    /// Coordinates, when the provider sent both.
    pub fn location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.latitude?, self.longitude?))
    }

    /// Miles from the reference point; 0 until a distance has been set.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn distance_type(&self) -> DistanceType {
        self.distance_type
    }

    pub fn set_distance(&mut self, miles: f64, kind: DistanceType) {
        self.distance = miles;
        self.distance_type = kind;
    }
}

impl From<PropertyRecord> for NormalizedProperty {
    fn from(record: PropertyRecord) -> Self {
        Self::from_record(record)
    }
}

fn parse_date_sold(raw: DateSold) -> Option<DateTime<Utc>> {
    let parsed = match &raw {
        DateSold::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        DateSold::Text(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }),
    };
    if parsed.is_none() {
        debug!(?raw, "Ignoring unparseable dateSold");
    }
    parsed
}
