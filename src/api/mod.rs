//! HTTP API surface
//!
//! Thin DTO layer over the orchestrator: the handlers translate wire shapes
//! and status codes, and nothing else. Empty plan sections travel together
//! with their failure explanations so the UI can always render something.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::models::{
    AttractionOption, FlightOption, HotelOption, TravelPlan, TripRequest, WeatherSummary,
};
use crate::orchestrator::Orchestrator;

#[derive(Debug, Deserialize)]
pub struct ApiTripRequest {
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: u32,
    pub budget_ceiling: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<ApiTripRequest> for TripRequest {
    fn from(api: ApiTripRequest) -> Self {
        TripRequest {
            origin: api.origin,
            destination: api.destination,
            start_date: api.start_date,
            end_date: api.end_date,
            travelers: api.travelers,
            budget_ceiling: api.budget_ceiling,
            tags: api.tags.into_iter().collect::<BTreeSet<String>>(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiFlight {
    pub carrier: String,
    pub flight_number: Option<String>,
    pub price: String,
    pub departs: Option<String>,
    pub arrives: Option<String>,
    pub stops: u32,
}

impl From<&FlightOption> for ApiFlight {
    fn from(flight: &FlightOption) -> Self {
        Self {
            carrier: flight.carrier.clone(),
            flight_number: flight.flight_number.clone(),
            price: flight.price.to_string(),
            departs: flight.departs.map(|t| t.to_rfc3339()),
            arrives: flight.arrives.map(|t| t.to_rfc3339()),
            stops: flight.stops,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiHotel {
    pub name: String,
    pub nightly_price: String,
    pub rating: f32,
    pub location: String,
}

impl From<&HotelOption> for ApiHotel {
    fn from(hotel: &HotelOption) -> Self {
        Self {
            name: hotel.name.clone(),
            nightly_price: hotel.nightly_price.to_string(),
            rating: hotel.rating,
            location: hotel.location.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiAttraction {
    pub name: String,
    pub category: String,
    pub rating: f32,
    pub visit_duration_minutes: Option<u32>,
}

impl From<&AttractionOption> for ApiAttraction {
    fn from(attraction: &AttractionOption) -> Self {
        Self {
            name: attraction.name.clone(),
            category: attraction.category.clone(),
            rating: attraction.rating,
            visit_duration_minutes: attraction.visit_duration_minutes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiWeather {
    pub description: String,
    pub temperature_min_c: f32,
    pub temperature_max_c: f32,
    pub humidity_percent: Option<u8>,
}

impl From<&WeatherSummary> for ApiWeather {
    fn from(weather: &WeatherSummary) -> Self {
        Self {
            description: weather.description.clone(),
            temperature_min_c: weather.temperature.min,
            temperature_max_c: weather.temperature.max,
            humidity_percent: weather.humidity,
        }
    }
}

/// Why a plan section is empty, in wire form.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub section: String,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiTravelPlan {
    pub destination: String,
    pub flights: Vec<ApiFlight>,
    pub hotels: Vec<ApiHotel>,
    pub attractions: Vec<ApiAttraction>,
    pub weather: Option<ApiWeather>,
    pub failures: Vec<ApiFailure>,
    pub narrative: Option<String>,
    pub generated_at: String,
}

impl From<&TravelPlan> for ApiTravelPlan {
    fn from(plan: &TravelPlan) -> Self {
        Self {
            destination: plan.destination.clone(),
            flights: plan.flights.iter().map(ApiFlight::from).collect(),
            hotels: plan.hotels.iter().map(ApiHotel::from).collect(),
            attractions: plan.attractions.iter().map(ApiAttraction::from).collect(),
            weather: plan.weather.as_ref().map(ApiWeather::from),
            failures: plan
                .failures
                .entries()
                .iter()
                .map(|failure| ApiFailure {
                    section: failure.domain.to_string(),
                    kind: failure.kind.to_string(),
                    message: failure.message.clone(),
                })
                .collect(),
            narrative: plan.narrative.clone(),
            generated_at: plan.generated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/plan", post(create_plan))
        .route("/health", get(health))
        .with_state(orchestrator)
}

async fn create_plan(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(payload): Json<ApiTripRequest>,
) -> Result<Json<ApiTravelPlan>, (StatusCode, Json<ApiError>)> {
    match orchestrator.plan(payload.into()).await {
        Ok(plan) => Ok(Json(ApiTravelPlan::from(&plan))),
        Err(err @ PlanError::InvalidRequest(_)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError {
                error: err.user_message(),
            }),
        )),
        Err(err @ PlanError::AllProvidersFailed(_)) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ApiError {
                error: err.user_message(),
            }),
        )),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "version": crate::VERSION}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, PartialFailureSet};
    use chrono::Utc;

    #[test]
    fn test_request_conversion_dedupes_tags() {
        let api = ApiTripRequest {
            origin: "NYC".to_string(),
            destination: "PAR".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            travelers: 2,
            budget_ceiling: None,
            tags: vec!["art".to_string(), "food".to_string(), "art".to_string()],
        };
        let request = TripRequest::from(api);
        assert_eq!(request.tags.len(), 2);
    }

    #[test]
    fn test_plan_conversion_carries_failures() {
        let mut failures = PartialFailureSet::new();
        failures.record(
            crate::models::Domain::Hotels,
            &crate::error::ProviderFault::timeout("no reply"),
        );
        let plan = TravelPlan {
            destination: "PAR".to_string(),
            flights: vec![FlightOption {
                carrier: "Air France".to_string(),
                flight_number: None,
                price: Money::usd(523.5),
                departs: None,
                arrives: None,
                stops: 0,
            }],
            hotels: vec![],
            attractions: vec![],
            weather: None,
            failures,
            narrative: None,
            generated_at: Utc::now(),
        };

        let api = ApiTravelPlan::from(&plan);
        assert_eq!(api.flights[0].price, "523.50 USD");
        assert_eq!(api.failures.len(), 1);
        assert_eq!(api.failures[0].section, "hotels");
        assert_eq!(api.failures[0].kind, "timeout");
    }
}
