//! AI itinerary synthesis
//!
//! The synthesizer is just another fallible provider: it consumes the
//! assembled plan plus the original request and returns prose. It runs under
//! the same timeout/retry policy as the data providers, and losing it only
//! costs the narrative, never the structured plan.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::config::SynthesizerConfig;
use crate::error::{ProviderFault, ProviderResult};
use crate::models::{TravelPlan, TripRequest};
use crate::normalize::normalize_narrative;
use crate::providers::{ProviderId, classify_status, classify_transport};

/// Producer of the natural-language itinerary narrative.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// One synthesis attempt; retry and deadline live with the caller.
    async fn summarize(&self, plan: &TravelPlan, request: &TripRequest) -> ProviderResult<String>;
}

/// OpenAI-compatible chat-completions synthesizer.
pub struct ChatSynthesizer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatSynthesizer {
    #[must_use]
    pub fn new(config: &SynthesizerConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("TripSmith/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Synthesizer for ChatSynthesizer {
    async fn summarize(&self, plan: &TravelPlan, request: &TripRequest) -> ProviderResult<String> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderFault::authentication(
                "synthesizer API key is not configured",
            ));
        };

        info!("Requesting itinerary narrative for {}", request.destination);

        let body = json!({
            "model": self.model,
            "temperature": 0.1,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a travel planner. Write a concise, friendly \
                                itinerary narrative from the structured data you are given. \
                                Mention gaps in the data honestly.",
                },
                {
                    "role": "user",
                    "content": build_prompt(plan, request),
                },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(ProviderId::Synthesizer, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(ProviderId::Synthesizer, status, &body));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| classify_transport(ProviderId::Synthesizer, &e))?;

        normalize_narrative(&payload)
    }
}

/// Assemble the user prompt from the structured plan and the request.
#[must_use]
pub fn build_prompt(plan: &TravelPlan, request: &TripRequest) -> String {
    let mut prompt = format!(
        "Create a travel plan narrative for a trip from {} to {}.\n\
         Travel dates: {} to {}\n\
         Number of travelers: {}\n",
        request.origin, request.destination, request.start_date, request.end_date,
        request.travelers,
    );

    if let Some(budget) = request.budget_ceiling {
        prompt.push_str(&format!("Budget: around {budget:.0} USD total\n"));
    }
    if !request.tags.is_empty() {
        let interests: Vec<&str> = request.tags.iter().map(String::as_str).collect();
        prompt.push_str(&format!("Interests: {}\n", interests.join(", ")));
    }

    prompt.push_str("\nFlight options:\n");
    if plan.flights.is_empty() {
        prompt.push_str("  (none available)\n");
    }
    for flight in plan.flights.iter().take(3) {
        prompt.push_str(&format!(
            "  - {} for {}, {} stop(s)\n",
            flight.carrier, flight.price, flight.stops
        ));
    }

    prompt.push_str("\nHotel options:\n");
    if plan.hotels.is_empty() {
        prompt.push_str("  (none available)\n");
    }
    for hotel in plan.hotels.iter().take(3) {
        prompt.push_str(&format!(
            "  - {} at {} per night, rated {:.1}/5\n",
            hotel.name, hotel.nightly_price, hotel.rating
        ));
    }

    prompt.push_str("\nAttractions:\n");
    if plan.attractions.is_empty() {
        prompt.push_str("  (none available)\n");
    }
    for attraction in plan.attractions.iter().take(5) {
        prompt.push_str(&format!("  - {} ({})\n", attraction.name, attraction.category));
    }

    if let Some(weather) = &plan.weather {
        prompt.push_str(&format!(
            "\nWeather: {}, {:.0} to {:.0} C\n",
            weather.description, weather.temperature.min, weather.temperature.max
        ));
    }

    if !plan.failures.is_empty() {
        prompt.push_str("\nUnavailable sections (explain these gaps to the traveler):\n");
        for failure in plan.failures.entries() {
            prompt.push_str(&format!("  - {}: {}\n", failure.domain, failure.kind));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use crate::models::{Money, PartialFailureSet};
    use chrono::{NaiveDate, Utc};

    fn sample_plan() -> TravelPlan {
        let mut failures = PartialFailureSet::new();
        failures.record(
            crate::models::Domain::Hotels,
            &ProviderFault::timeout("no reply"),
        );
        TravelPlan {
            destination: "PAR".to_string(),
            flights: vec![crate::models::FlightOption {
                carrier: "Air France".to_string(),
                flight_number: Some("AF123".to_string()),
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
        }
    }

    fn sample_request() -> TripRequest {
        TripRequest::new(
            "NYC",
            "PAR",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            2,
        )
        .with_budget(3000.0)
        .with_tags(["art", "food"])
    }

    #[test]
    fn test_prompt_includes_request_and_options() {
        let prompt = build_prompt(&sample_plan(), &sample_request());

        assert!(prompt.contains("from NYC to PAR"));
        assert!(prompt.contains("2025-06-01 to 2025-06-08"));
        assert!(prompt.contains("Air France for 523.50 USD"));
        assert!(prompt.contains("Interests: art, food"));
        assert!(prompt.contains("hotels: timeout"));
    }

    #[test]
    fn test_prompt_marks_empty_sections() {
        let prompt = build_prompt(&sample_plan(), &sample_request());
        assert!(prompt.contains("Hotel options:\n  (none available)"));
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_fault() {
        let synthesizer =
            ChatSynthesizer::new(&SynthesizerConfig::default(), Duration::from_secs(5));
        let fault = synthesizer
            .summarize(&sample_plan(), &sample_request())
            .await
            .unwrap_err();
        assert_eq!(fault.kind, FaultKind::Authentication);
    }
}
