//! Data models for the `TripSmith` application
//!
//! This module contains the core domain models organized by concern:
//! - Request: the immutable trip request that opens a planning session
//! - Options: canonical itinerary entities produced by normalization
//! - Plan: the assembled travel plan and its partial-failure record

pub mod options;
pub mod plan;
pub mod request;

// Re-export all public types for convenient access
pub use options::{
    AttractionOption, FlightOption, HotelOption, Money, TemperatureRange, WeatherSummary,
};
pub use plan::{Domain, FailedQuery, PartialFailureSet, TravelPlan};
pub use request::TripRequest;
