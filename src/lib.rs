//! `TripSmith` - Multi-provider travel planning and itinerary synthesis
//!
//! This library composes fallible external travel data providers (flights,
//! hotels, attractions, weather, and an AI summarizer) into a single
//! best-effort travel plan with explicit partial-failure reporting.

pub mod api;
pub mod cache;
pub mod config;
pub mod destination;
pub mod error;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod synthesizer;
pub mod web;

// Re-export core types for public API
pub use cache::ResponseCache;
pub use config::AppConfig;
pub use destination::{DestinationInfo, DestinationQuery, DestinationService};
pub use error::{FaultKind, PlanError, ProviderFault, ProviderResult};
pub use models::{
    AttractionOption, Domain, FlightOption, HotelOption, Money, PartialFailureSet, TravelPlan,
    TripRequest, WeatherSummary,
};
pub use orchestrator::Orchestrator;
pub use providers::{ProviderClient, ProviderId, ProviderQuery};
pub use synthesizer::{ChatSynthesizer, Synthesizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used at the planning boundary
pub type Result<T> = std::result::Result<T, PlanError>;
