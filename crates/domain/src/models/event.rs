//! Course event domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A selectable number of days (course duration or accommodation nights).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayCount {
    One,
    Two,
    Three,
}

impl DayCount {
    pub const ALL: [DayCount; 3] = [DayCount::One, DayCount::Two, DayCount::Three];

    pub fn get(self) -> u8 {
        match self {
            DayCount::One => 1,
            DayCount::Two => 2,
            DayCount::Three => 3,
        }
    }
}

impl TryFrom<u8> for DayCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DayCount::One),
            2 => Ok(DayCount::Two),
            3 => Ok(DayCount::Three),
            _ => Err(format!("Day count must be 1, 2 or 3 (got {})", value)),
        }
    }
}

impl TryFrom<i32> for DayCount {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| format!("Day count must be 1, 2 or 3 (got {})", value))
            .and_then(DayCount::try_from)
    }
}

impl From<DayCount> for u8 {
    fn from(days: DayCount) -> Self {
        days.get()
    }
}

impl From<DayCount> for i32 {
    fn from(days: DayCount) -> Self {
        i32::from(days.get())
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Price table keyed by number of course days, as stored on the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiDayPricing {
    #[serde(rename = "1", default, skip_serializing_if = "Option::is_none")]
    pub one: Option<f64>,
    #[serde(rename = "2", default, skip_serializing_if = "Option::is_none")]
    pub two: Option<f64>,
    #[serde(rename = "3", default, skip_serializing_if = "Option::is_none")]
    pub three: Option<f64>,
}

impl MultiDayPricing {
    /// Looks up the price for a day count, if the table has one.
    pub fn get(&self, days: DayCount) -> Option<f64> {
        match days {
            DayCount::One => self.one,
            DayCount::Two => self.two,
            DayCount::Three => self.three,
        }
    }
}

/// A marketing price tier, e.g. `{ "name": "Early bird", "price": "£2,500" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PricingTier {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A bookable course event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CourseEvent {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub location: String,
    pub starts_on: NaiveDate,
    pub duration_days: i32,
    pub base_price: Option<f64>,
    pub multi_day_pricing: Option<MultiDayPricing>,
    pub pricing_tiers: Vec<PricingTier>,
    pub capacity: Option<i32>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for a price quote.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QuoteRequest {
    pub course_days: DayCount,
    #[serde(default)]
    pub accommodation_nights: Option<DayCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_count_from_u8() {
        assert_eq!(DayCount::try_from(1u8), Ok(DayCount::One));
        assert_eq!(DayCount::try_from(3u8), Ok(DayCount::Three));
        assert!(DayCount::try_from(0u8).is_err());
        assert!(DayCount::try_from(4u8).is_err());
    }

    #[test]
    fn test_day_count_from_i32() {
        assert_eq!(DayCount::try_from(2i32), Ok(DayCount::Two));
        assert!(DayCount::try_from(-1i32).is_err());
        assert!(DayCount::try_from(300i32).is_err());
    }

    #[test]
    fn test_day_count_serde_as_number() {
        assert_eq!(serde_json::to_string(&DayCount::Two).unwrap(), "2");
        let days: DayCount = serde_json::from_str("3").unwrap();
        assert_eq!(days, DayCount::Three);
        assert!(serde_json::from_str::<DayCount>("5").is_err());
    }

    #[test]
    fn test_multi_day_pricing_json_keys() {
        let table: MultiDayPricing =
            serde_json::from_str(r#"{"1": 950, "2": 1800, "3": 2500}"#).unwrap();
        assert_eq!(table.get(DayCount::One), Some(950.0));
        assert_eq!(table.get(DayCount::Two), Some(1800.0));
        assert_eq!(table.get(DayCount::Three), Some(2500.0));
    }

    #[test]
    fn test_multi_day_pricing_partial_table() {
        let table: MultiDayPricing = serde_json::from_str(r#"{"2": 1800}"#).unwrap();
        assert_eq!(table.get(DayCount::One), None);
        assert_eq!(table.get(DayCount::Two), Some(1800.0));
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"2":1800.0}"#);
    }

    #[test]
    fn test_quote_request_deserialization() {
        let req: QuoteRequest =
            serde_json::from_str(r#"{"course_days": 3, "accommodation_nights": 2}"#).unwrap();
        assert_eq!(req.course_days, DayCount::Three);
        assert_eq!(req.accommodation_nights, Some(DayCount::Two));

        let req: QuoteRequest = serde_json::from_str(r#"{"course_days": 1}"#).unwrap();
        assert_eq!(req.accommodation_nights, None);
    }
}
