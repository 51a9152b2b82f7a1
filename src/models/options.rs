//! Canonical itinerary entities produced by normalization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A price with its currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    /// ISO 4217 currency code
    pub currency: String,
    pub amount: f64,
}

impl Money {
    #[must_use]
    pub fn new(currency: impl Into<String>, amount: f64) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }

    /// US dollars, the default currency of the upstream providers.
    #[must_use]
    pub fn usd(amount: f64) -> Self {
        Self::new("USD", amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

/// A single flight offer.
///
/// Ranking key: price ascending, then stop count ascending. Departure and
/// arrival timestamps are informational only; upstream feeds omit them often
/// enough that they never gate normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    /// Airline display name
    pub carrier: String,
    pub flight_number: Option<String>,
    pub price: Money,
    pub departs: Option<DateTime<Utc>>,
    pub arrives: Option<DateTime<Utc>>,
    /// Number of intermediate stops (0 for a direct flight)
    pub stops: u32,
}

/// A single hotel offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOption {
    pub name: String,
    pub nightly_price: Money,
    /// Guest rating on a 0-5 scale
    pub rating: f32,
    /// Free-form location descriptor (address or neighbourhood)
    pub location: String,
}

/// A single local attraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionOption {
    pub name: String,
    /// Coarse category (e.g. "museum", "park"); "general" when unknown
    pub category: String,
    /// Rating on a 0-5 scale, 0 when the source carries none
    pub rating: f32,
    /// Approximate visit duration in minutes
    pub visit_duration_minutes: Option<u32>,
}

/// Temperature range for the trip window in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f32,
    pub max: f32,
}

/// Destination weather metadata carried alongside the attractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Dominant condition over the trip window (e.g. "light rain")
    pub description: String,
    pub temperature: TemperatureRange,
    /// Average relative humidity in percent
    pub humidity: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        let price = Money::usd(523.5);
        assert_eq!(price.to_string(), "523.50 USD");
    }
}
