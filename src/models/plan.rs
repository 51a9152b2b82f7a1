//! The assembled travel plan and its partial-failure record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::{AttractionOption, FlightOption, HotelOption, WeatherSummary};
use crate::error::{FaultKind, ProviderFault};

/// Which part of the plan a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Flights,
    Hotels,
    Attractions,
    /// The AI-synthesis step; a failure here only costs the narrative
    Narrative,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Domain::Flights => "flights",
            Domain::Hotels => "hotels",
            Domain::Attractions => "attractions",
            Domain::Narrative => "narrative",
        };
        write!(f, "{label}")
    }
}

/// One failed sub-query: which section stayed empty and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedQuery {
    pub domain: Domain,
    pub kind: FaultKind,
    pub message: String,
}

/// Record of which sub-queries of a planning session failed.
///
/// Presentation layers use this to explain empty plan sections; the
/// orchestrator uses it to detect the all-failed terminal case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFailureSet {
    failures: Vec<FailedQuery>,
}

impl PartialFailureSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, domain: Domain, fault: &ProviderFault) {
        self.failures.push(FailedQuery {
            domain,
            kind: fault.kind,
            message: fault.message.clone(),
        });
    }

    #[must_use]
    pub fn contains(&self, domain: Domain) -> bool {
        self.failures.iter().any(|f| f.domain == domain)
    }

    /// Fault kind recorded for a domain, if any.
    #[must_use]
    pub fn kind_for(&self, domain: Domain) -> Option<FaultKind> {
        self.failures
            .iter()
            .find(|f| f.domain == domain)
            .map(|f| f.kind)
    }

    #[must_use]
    pub fn entries(&self) -> &[FailedQuery] {
        &self.failures
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }
}

/// The assembled aggregate handed back for every planning session that is
/// not a total failure.
///
/// Sections are ranked by their documented keys and may be empty; the
/// failure set explains each gap. Section order is fixed regardless of which
/// provider answered first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPlan {
    /// Destination echoed from the request for display
    pub destination: String,
    pub flights: Vec<FlightOption>,
    pub hotels: Vec<HotelOption>,
    pub attractions: Vec<AttractionOption>,
    /// Destination weather metadata, absent when the lookup failed
    pub weather: Option<WeatherSummary>,
    pub failures: PartialFailureSet,
    /// AI-generated itinerary narrative, absent if synthesis failed
    pub narrative: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl TravelPlan {
    /// Whether any itinerary section carries data.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.flights.is_empty() || !self.hotels.is_empty() || !self.attractions.is_empty()
    }
}
