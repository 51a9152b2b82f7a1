//! Amadeus-style flight search client
//!
//! Wraps the flight-offers search endpoint behind the provider contract.
//! The OAuth2 client-credentials token is fetched lazily and cached until
//! shortly before its advertised expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ProviderClient, ProviderId, ProviderQuery, classify_status, classify_transport};
use crate::config::FlightsConfig;
use crate::error::{ProviderFault, ProviderResult};

/// Slack subtracted from the advertised token lifetime so a token is never
/// used right at its expiry edge.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Flight search provider client
pub struct FlightsClient {
    client: Client,
    base_url: String,
    auth_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    token: Mutex<Option<CachedToken>>,
}

impl FlightsClient {
    #[must_use]
    pub fn new(config: &FlightsConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("TripSmith/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        }
    }

    /// Return a cached access token or fetch a fresh one.
    async fn access_token(&self) -> ProviderResult<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(ProviderFault::authentication(
                "flight search credentials are not configured",
            ));
        };

        debug!("Requesting new flight search access token");
        let response = self
            .client
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| classify_transport(ProviderId::Flights, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFault::authentication(format!(
                "token request failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderFault::malformed(format!("token response not parseable: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK);
        let access_token = token.access_token.clone();
        *slot = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        });

        Ok(access_token)
    }
}

#[async_trait]
impl ProviderClient for FlightsClient {
    fn id(&self) -> ProviderId {
        ProviderId::Flights
    }

    async fn search(&self, query: &ProviderQuery) -> ProviderResult<Value> {
        let ProviderQuery::Flights(flight_query) = query else {
            return Err(ProviderFault::invalid_query(
                "flight client received a non-flight query",
            ));
        };

        let access_token = self.access_token().await?;

        info!(
            "Searching flights {} -> {} on {}",
            flight_query.origin, flight_query.destination, flight_query.departure_date
        );

        let mut params = vec![
            ("originLocationCode", flight_query.origin.clone()),
            ("destinationLocationCode", flight_query.destination.clone()),
            (
                "departureDate",
                flight_query.departure_date.format("%Y-%m-%d").to_string(),
            ),
            ("adults", flight_query.passengers.to_string()),
            ("max", "10".to_string()),
        ];
        if let Some(return_date) = flight_query.return_date {
            params.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
        }

        let response = self
            .client
            .get(format!("{}/shopping/flight-offers", self.base_url))
            .bearer_auth(access_token)
            .query(&params)
            .send()
            .await
            .map_err(|e| classify_transport(ProviderId::Flights, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(ProviderId::Flights, status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| classify_transport(ProviderId::Flights, &e))
    }
}
