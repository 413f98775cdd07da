//! Wire shapes returned by the listings provider.
//!
//! The provider is loose about types: `zpid` arrives as a number or a string,
//! `address` as a plain string or a structured object, `dateSold` as epoch
//! milliseconds or a date string. Everything here is lenient, and a record
//! that still fails to decode is skipped instead of failing the whole page.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

/// A value the provider sends either as a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredAddress {
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordAddress {
    Text(String),
    Structured(StructuredAddress),
}

impl RecordAddress {
    /// Single-line address. Structured addresses render as `"street, city, state zip"`.
    pub fn formatted(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Structured(a) => format!(
                "{}, {}, {} {}",
                a.street_address.as_deref().unwrap_or_default(),
                a.city.as_deref().unwrap_or_default(),
                a.state.as_deref().unwrap_or_default(),
                a.zipcode.as_deref().unwrap_or_default(),
            )
            .trim()
            .to_string(),
        }
    }
}

/// Either epoch milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateSold {
    Millis(i64),
    Text(String),
}

/// One property as the provider returns it.
///
/// Each field decodes on its own: a value of the wrong shape becomes `None`
/// instead of dropping the whole listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyRecord {
    #[serde(deserialize_with = "lenient")]
    pub zpid: Option<StringOrNumber>,
    #[serde(deserialize_with = "lenient")]
    pub address: Option<RecordAddress>,
    #[serde(deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub living_area: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub img_src: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub bedrooms: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub bathrooms: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub year_built: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub listing_status: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub date_sold: Option<DateSold>,
    /// Not sent by the provider; set when a record is fetched for a specific listing status.
    #[serde(deserialize_with = "lenient")]
    pub listing_type: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok().flatten())
}

/// Numbers, or strings holding a plain number (`"2.5"`). Anything else is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl PropertyRecord {
    pub fn zpid_string(&self) -> Option<String> {
        self.zpid.clone().map(StringOrNumber::into_string)
    }

    pub fn with_listing_type(mut self, listing_type: impl Into<String>) -> Self {
        self.listing_type = Some(listing_type.into());
        self
    }
}

/// What a provider response contains, independent of which endpoint produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UpstreamPayload {
    /// `{ "props": [...] }` from the search endpoint
    List(Vec<PropertyRecord>),
    /// A bare property object with a `zpid`, from the detail endpoint
    Single(Box<PropertyRecord>),
    #[default]
    Empty,
}

impl UpstreamPayload {
    pub fn from_value(value: &Value) -> Self {
        if let Some(props) = value.get("props").and_then(Value::as_array) {
            let records = props
                .iter()
                .filter_map(|prop| match PropertyRecord::deserialize(prop) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(error = %e, "Skipping undecodable property record");
                        None
                    }
                })
                .collect();
            return Self::List(records);
        }

        if value.get("zpid").is_some_and(|zpid| !zpid.is_null()) {
            return match PropertyRecord::deserialize(value) {
                Ok(record) => Self::Single(Box::new(record)),
                Err(e) => {
                    warn!(error = %e, "Undecodable property detail");
                    Self::Empty
                }
            };
        }

        Self::Empty
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(records) => records.len(),
            Self::Single(_) => 1,
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<PropertyRecord> {
        match self {
            Self::List(records) => records,
            Self::Single(record) => vec![*record],
            Self::Empty => Vec::new(),
        }
    }
}
