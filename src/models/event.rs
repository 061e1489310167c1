use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored event row. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub city: String,
    pub brand: String,
    pub theme: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A candidate record with every required column present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub city: String,
    pub brand: String,
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
impl NewEvent {
    /// Returns true when `stored` carries exactly the fields of this candidate.
    pub(crate) fn matches(&self, stored: &Event) -> bool {
        self.start_date == stored.start_date
            && self.end_date == stored.end_date
            && self.city == stored.city
            && self.brand == stored.brand
            && self.theme == stored.theme
            && self.description == stored.description
    }
}

/// Insert request body as received over the wire.
///
/// Every field is optional here so that a missing column can be reported
/// by name instead of surfacing as an opaque deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub city: Option<String>,
    pub brand: Option<String>,
    pub theme: Option<String>,
    pub description: Option<String>,
}

impl EventPayload {
    /// Enforces the non-null constraints of the `events` table.
    ///
    /// Only presence is checked. Empty strings pass, and an `end_date`
    /// earlier than `start_date` is stored as given.
    pub fn validate(self) -> Result<NewEvent, AppError> {
        let mut missing = Vec::new();
        if self.start_date.is_none() {
            missing.push("start_date");
        }
        if self.end_date.is_none() {
            missing.push("end_date");
        }
        if self.city.is_none() {
            missing.push("city");
        }
        if self.brand.is_none() {
            missing.push("brand");
        }
        if self.theme.is_none() {
            missing.push("theme");
        }

        match (self.start_date, self.end_date, self.city, self.brand, self.theme) {
            (Some(start_date), Some(end_date), Some(city), Some(brand), Some(theme)) => {
                Ok(NewEvent {
                    start_date: parse_date("start_date", &start_date)?,
                    end_date: parse_date("end_date", &end_date)?,
                    city,
                    brand,
                    theme,
                    description: self.description,
                })
            }
            _ => Err(AppError::ValidationError(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::ValidationError(format!(
            "Field '{}' must be a date in YYYY-MM-DD format, got '{}'",
            field, value
        ))
    })
}
