//! Destination service: attractions plus destination metadata
//!
//! A second orchestrator with the same shape as the main one but scoped to a
//! single sub-domain. The main orchestrator consumes it as if it were one
//! provider; how it splits the lookup internally (attractions and weather,
//! each through the cache under the shared call policy) is opaque to the
//! caller. Only the attractions lookup decides success — a weather failure
//! just leaves the metadata absent.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::ResponseCache;
use crate::config::PolicyConfig;
use crate::error::ProviderResult;
use crate::models::{AttractionOption, WeatherSummary};
use crate::normalize::{normalize_attractions, normalize_weather};
use crate::providers::{
    AttractionQuery, ProviderClient, ProviderQuery, WeatherQuery, call_with_policy,
};

/// Destination-scoped lookup input, derived from the trip request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationQuery {
    pub city: String,
    pub interests: BTreeSet<String>,
    pub max_results: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// What the destination service knows about a place for a trip window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationInfo {
    pub attractions: Vec<AttractionOption>,
    /// Absent when the weather lookup failed
    pub weather: Option<WeatherSummary>,
}

/// Attractions + destination metadata, behind one provider-shaped boundary.
pub struct DestinationService {
    attractions: Arc<dyn ProviderClient>,
    weather: Arc<dyn ProviderClient>,
    cache: Arc<ResponseCache>,
    policy: PolicyConfig,
}

impl DestinationService {
    #[must_use]
    pub fn new(
        attractions: Arc<dyn ProviderClient>,
        weather: Arc<dyn ProviderClient>,
        cache: Arc<ResponseCache>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            attractions,
            weather,
            cache,
            policy,
        }
    }

    /// Resolve everything the service knows about the destination.
    ///
    /// Fails only when the attractions lookup fails; that failure is what
    /// the main orchestrator records for the attractions domain.
    pub async fn lookup(&self, query: &DestinationQuery) -> ProviderResult<DestinationInfo> {
        let attraction_query = ProviderQuery::Attractions(AttractionQuery {
            city: query.city.clone(),
            interests: query.interests.clone(),
            max_results: query.max_results,
        });
        let weather_query = ProviderQuery::Weather(WeatherQuery {
            city: query.city.clone(),
            start_date: query.start_date,
            end_date: query.end_date,
        });

        let (attractions_raw, weather_raw) = futures::join!(
            self.cached_call(&self.attractions, &attraction_query),
            self.cached_call(&self.weather, &weather_query),
        );

        let attractions = normalize_attractions(&attractions_raw?)?;

        let weather = match weather_raw
            .and_then(|payload| normalize_weather(&payload, query.start_date, query.end_date))
        {
            Ok(summary) => Some(summary),
            Err(fault) => {
                warn!(%fault, city = %query.city, "destination weather unavailable");
                None
            }
        };

        Ok(DestinationInfo {
            attractions,
            weather,
        })
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
