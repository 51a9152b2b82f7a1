//! Trip planning orchestrator
//!
//! Fans a validated trip request out to the flight, hotel, and destination
//! providers concurrently, folds partial failures into the plan instead of
//! propagating them, ranks what survived, and finishes with the AI-synthesis
//! step. Availability beats completeness: the only hard failures are an
//! invalid request and the case where every data provider failed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::cache::ResponseCache;
use crate::config::{AppConfig, PolicyConfig};
use crate::destination::{DestinationInfo, DestinationQuery, DestinationService};
use crate::error::{PlanError, ProviderFault, ProviderResult};
use crate::models::{Domain, PartialFailureSet, TravelPlan, TripRequest};
use crate::normalize::{normalize_flights, normalize_hotels, rank_attractions, rank_flights, rank_hotels};
use crate::providers::{
    AttractionsClient, FlightQuery, FlightsClient, HotelQuery, HotelsClient, ProviderClient,
    ProviderId, ProviderQuery, WeatherClient, call_with_policy, with_fault_policy,
};
use crate::synthesizer::{ChatSynthesizer, Synthesizer};

/// Default number of attractions requested per destination lookup.
const MAX_ATTRACTIONS: u32 = 10;

/// The main coordinator. One instance serves many planning sessions; all
/// collaborators are injected at construction.
pub struct Orchestrator {
    flights: Arc<dyn ProviderClient>,
    hotels: Arc<dyn ProviderClient>,
    destination: Arc<DestinationService>,
    synthesizer: Arc<dyn Synthesizer>,
    cache: Arc<ResponseCache>,
    policy: PolicyConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        flights: Arc<dyn ProviderClient>,
        hotels: Arc<dyn ProviderClient>,
        destination: Arc<DestinationService>,
        synthesizer: Arc<dyn Synthesizer>,
        cache: Arc<ResponseCache>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            flights,
            hotels,
            destination,
            synthesizer,
            cache,
            policy,
        }
    }

    /// Wire up the real provider clients from configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = config.policy.timeout();
        let cache = Arc::new(ResponseCache::new(config.cache.clone()));

        let attractions: Arc<dyn ProviderClient> =
            Arc::new(AttractionsClient::new(&config.providers.attractions, timeout));
        let weather: Arc<dyn ProviderClient> =
            Arc::new(WeatherClient::new(&config.providers.weather, timeout));
        let destination = Arc::new(DestinationService::new(
            attractions,
            weather,
            Arc::clone(&cache),
            config.policy.clone(),
        ));

        Self::new(
            Arc::new(FlightsClient::new(&config.providers.flights, timeout)),
            Arc::new(HotelsClient::new(&config.providers.hotels, timeout)),
            destination,
            Arc::new(ChatSynthesizer::new(&config.providers.synthesizer, timeout)),
            cache,
            config.policy.clone(),
        )
    }

    /// Plan a trip. Runs until all branches resolve.
    pub async fn plan(&self, request: TripRequest) -> Result<TravelPlan, PlanError> {
        self.plan_inner(request, None).await
    }

    /// Plan a trip with cooperative cancellation.
    ///
    /// When the watch value flips to `true`, branches still in flight
    /// resolve to `Cancelled` and are folded into the failure set; branches
    /// that already completed keep their results.
    pub async fn plan_with_cancel(
        &self,
        request: TripRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<TravelPlan, PlanError> {
        self.plan_inner(request, Some(cancel)).await
    }

    #[instrument(skip_all, fields(origin = %request.origin, destination = %request.destination))]
    async fn plan_inner(
        &self,
        request: TripRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<TravelPlan, PlanError> {
        request.validate()?;

        info!(
            "Planning trip {} -> {} for {} traveler(s)",
            request.origin, request.destination, request.travelers
        );

        let flight_query = ProviderQuery::Flights(derive_flight_query(&request));
        let hotel_query = ProviderQuery::Hotels(derive_hotel_query(&request));
        let destination_query = derive_destination_query(&request);

        let (flights_result, hotels_result, destination_result) = tokio::join!(
            with_cancellation(cancel.clone(), async {
                let raw = self.cached_call(&self.flights, &flight_query).await?;
                normalize_flights(&raw)
            }),
            with_cancellation(cancel.clone(), async {
                let raw = self.cached_call(&self.hotels, &hotel_query).await?;
                normalize_hotels(&raw)
            }),
            with_cancellation(cancel.clone(), self.destination.lookup(&destination_query)),
        );

        let mut failures = PartialFailureSet::new();

        let mut flights = match flights_result {
            Ok(flights) => flights,
            Err(fault) => {
                warn!(%fault, "flight search failed");
                failures.record(Domain::Flights, &fault);
                Vec::new()
            }
        };
        let mut hotels = match hotels_result {
            Ok(hotels) => hotels,
            Err(fault) => {
                warn!(%fault, "hotel search failed");
                failures.record(Domain::Hotels, &fault);
                Vec::new()
            }
        };
        let (mut attractions, weather) = match destination_result {
            Ok(DestinationInfo {
                attractions,
                weather,
            }) => (attractions, weather),
            Err(fault) => {
                warn!(%fault, "destination lookup failed");
                failures.record(Domain::Attractions, &fault);
                (Vec::new(), None)
            }
        };

        if failures.contains(Domain::Flights)
            && failures.contains(Domain::Hotels)
            && failures.contains(Domain::Attractions)
        {
            return Err(PlanError::AllProvidersFailed(failures));
        }

        rank_flights(&mut flights);
        rank_hotels(&mut hotels);
        rank_attractions(&mut attractions);

        let mut plan = TravelPlan {
            destination: request.destination.clone(),
            flights,
            hotels,
            attractions,
            weather,
            failures,
            narrative: None,
            generated_at: Utc::now(),
        };

        let narrative = with_cancellation(
            cancel,
            with_fault_policy(&self.policy, ProviderId::Synthesizer, || {
                self.synthesizer.summarize(&plan, &request)
            }),
        )
        .await;
        match narrative {
            Ok(text) => plan.narrative = Some(text),
            Err(fault) => {
                warn!(%fault, "narrative synthesis failed");
                plan.failures.record(Domain::Narrative, &fault);
            }
        }

        info!(
            flights = plan.flights.len(),
            hotels = plan.hotels.len(),
            attractions = plan.attractions.len(),
            failures = plan.failures.len(),
            "Plan assembled"
        );

        Ok(plan)
    }

    async fn cached_call(
        &self,
        client: &Arc<dyn ProviderClient>,
        query: &ProviderQuery,
    ) -> ProviderResult<serde_json::Value> {
        self.cache
            .get_or_fetch(query.provider(), query.fingerprint(), || {
                call_with_policy(client.as_ref(), query, &self.policy)
            })
            .await
    }
}

fn derive_flight_query(request: &TripRequest) -> FlightQuery {
    FlightQuery {
        origin: request.origin.clone(),
        destination: request.destination.clone(),
        departure_date: request.start_date,
        return_date: (request.end_date > request.start_date).then_some(request.end_date),
        passengers: request.travelers,
    }
}

fn derive_hotel_query(request: &TripRequest) -> HotelQuery {
    let nights = request.nights().max(1);
    HotelQuery {
        city: request.destination.clone(),
        check_in: request.start_date,
        check_out: request.start_date + chrono::Duration::days(nights),
        guests: request.travelers,
        max_price: request
            .budget_ceiling
            .map(|budget| ((budget / nights as f64) as u32).max(1)),
    }
}

fn derive_destination_query(request: &TripRequest) -> DestinationQuery {
    DestinationQuery {
        city: request.destination.clone(),
        interests: request.tags.clone(),
        max_results: MAX_ATTRACTIONS,
        start_date: request.start_date,
        end_date: request.end_date,
    }
}

/// Race a branch against the session's cancellation signal.
async fn with_cancellation<T>(
    cancel: Option<watch::Receiver<bool>>,
    fut: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    match cancel {
        None => fut.await,
        Some(mut rx) => {
            if *rx.borrow() {
                return Err(ProviderFault::cancelled());
            }
            tokio::select! {
                result = fut => result,
                Ok(_) = rx.wait_for(|cancelled| *cancelled) => Err(ProviderFault::cancelled()),
            }
        }
    }
}
