use serde::{Deserialize, Serialize};

use crate::{CalendarDate, ValidationError};

/// Ordering key shared by every observation kind.
///
/// Adapters sort ascending on this key before handing a series to the
/// pipeline.
pub trait Dated {
    fn date(&self) -> CalendarDate;

    /// Epoch milliseconds used for ordering; midnight UTC unless overridden.
    fn epoch_millis(&self) -> i64 {
        self.date().epoch_millis()
    }
}

/// Dated numeric observation from a low-cadence series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: CalendarDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: CalendarDate, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }
        Ok(Self { date, value })
    }
}

impl Dated for Observation {
    fn date(&self) -> CalendarDate {
        self.date
    }
}

/// Price observation carrying the exact epoch millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: CalendarDate,
    pub timestamp: i64,
    pub close: f64,
}

impl PriceObservation {
    /// Builds an observation from an epoch millisecond timestamp, deriving
    /// the UTC calendar day.
    pub fn from_epoch_millis(timestamp: i64, close: f64) -> Result<Self, ValidationError> {
        if !close.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "close" });
        }
        Ok(Self {
            date: CalendarDate::from_epoch_millis(timestamp)?,
            timestamp,
            close,
        })
    }
}

impl Dated for PriceObservation {
    fn date(&self) -> CalendarDate {
        self.date
    }

    fn epoch_millis(&self) -> i64 {
        self.timestamp
    }
}

/// One aligned row of the merged stream, keyed on the primary timeline.
///
/// Field names on the wire follow the dashboard payload (`btc`, `nvda`,
/// `cape`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub date: CalendarDate,
    #[serde(rename = "btc")]
    pub primary_value: f64,
    #[serde(rename = "nvda")]
    pub secondary_value: Option<f64>,
    #[serde(rename = "cape")]
    pub metric_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_observation_derives_utc_day() {
        let observation =
            PriceObservation::from_epoch_millis(1_704_067_200_000, 42_000.5).expect("valid");
        assert_eq!(observation.date.to_string(), "2024-01-01");
        assert_eq!(observation.epoch_millis(), 1_704_067_200_000);
    }

    #[test]
    fn rejects_non_finite_values() {
        let day = CalendarDate::parse("2024-01-01").expect("valid");
        assert!(Observation::new(day, f64::NAN).is_err());
        assert!(PriceObservation::from_epoch_millis(0, f64::INFINITY).is_err());
    }

    #[test]
    fn merged_record_serializes_with_payload_names() {
        let record = MergedRecord {
            date: CalendarDate::parse("2024-01-01").expect("valid"),
            primary_value: 42_000.0,
            secondary_value: None,
            metric_value: 32.0,
        };
        let json = serde_json::to_value(record).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({"date": "2024-01-01", "btc": 42000.0, "nvda": null, "cape": 32.0})
        );
    }
}
