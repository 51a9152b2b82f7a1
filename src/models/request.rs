//! Trip request model: one immutable value per planning session

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A single planning session's input.
///
/// Constructed once per user submission, consumed by `Orchestrator::plan`,
/// then discarded. Preference tags are held in a sorted set so two requests
/// that differ only in tag ordering produce the same cache fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    /// Departure city or airport code (e.g. "NYC" or "JFK")
    pub origin: String,
    /// Arrival city or airport code
    pub destination: String,
    /// First day of the trip
    pub start_date: NaiveDate,
    /// Last day of the trip, inclusive
    pub end_date: NaiveDate,
    /// Number of travelers
    pub travelers: u32,
    /// Optional total budget ceiling in USD
    pub budget_ceiling: Option<f64>,
    /// Optional preference tags (e.g. "museums", "food")
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TripRequest {
    /// Create a request without budget or tags.
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        travelers: u32,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            start_date,
            end_date,
            travelers,
            budget_ceiling: None,
            tags: BTreeSet::new(),
        }
    }

    /// Attach a budget ceiling.
    #[must_use]
    pub fn with_budget(mut self, ceiling: f64) -> Self {
        self.budget_ceiling = Some(ceiling);
        self
    }

    /// Attach preference tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Reject structurally invalid requests before any provider is contacted.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.origin.trim().is_empty() {
            return Err(PlanError::InvalidRequest("origin cannot be empty".into()));
        }
        if self.destination.trim().is_empty() {
            return Err(PlanError::InvalidRequest(
                "destination cannot be empty".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(PlanError::InvalidRequest(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        if self.travelers == 0 {
            return Err(PlanError::InvalidRequest(
                "traveler count must be at least 1".into(),
            ));
        }
        if let Some(ceiling) = self.budget_ceiling {
            if !ceiling.is_finite() || ceiling <= 0.0 {
                return Err(PlanError::InvalidRequest(format!(
                    "budget ceiling must be a positive amount, got {ceiling}"
                )));
            }
        }
        Ok(())
    }

    /// Trip length in nights (zero for a same-day trip).
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_valid_request() {
        let request = TripRequest::new("NYC", "PAR", date("2025-06-01"), date("2025-06-08"), 2);
        assert!(request.validate().is_ok());
        assert_eq!(request.nights(), 7);
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let request = TripRequest::new("NYC", "PAR", date("2025-06-08"), date("2025-06-01"), 2);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("before start date"));
    }

    #[test]
    fn test_zero_travelers_rejected() {
        let request = TripRequest::new("NYC", "PAR", date("2025-06-01"), date("2025-06-08"), 0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_same_day_trip_allowed() {
        let request = TripRequest::new("NYC", "BOS", date("2025-06-01"), date("2025-06-01"), 1);
        assert!(request.validate().is_ok());
        assert_eq!(request.nights(), 0);
    }

    #[test]
    fn test_tags_are_order_independent() {
        let a = TripRequest::new("NYC", "PAR", date("2025-06-01"), date("2025-06-08"), 2)
            .with_tags(["food", "art"]);
        let b = TripRequest::new("NYC", "PAR", date("2025-06-01"), date("2025-06-08"), 2)
            .with_tags(["art", "food"]);
        assert_eq!(a, b);
    }
}
