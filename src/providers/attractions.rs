//! SerpAPI organic-search attractions client
//!
//! Attraction data comes from a general web search scoped to the destination
//! city; preference tags from the trip request are folded into the query
//! string to bias the results.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{ProviderClient, ProviderId, ProviderQuery, classify_status, classify_transport};
use crate::config::SearchEngineConfig;
use crate::error::{ProviderFault, ProviderResult};

/// Attraction search provider client
pub struct AttractionsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AttractionsClient {
    #[must_use]
    pub fn new(config: &SearchEngineConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("TripSmith/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ProviderClient for AttractionsClient {
    fn id(&self) -> ProviderId {
        ProviderId::Attractions
    }

    async fn search(&self, query: &ProviderQuery) -> ProviderResult<Value> {
        let ProviderQuery::Attractions(attraction_query) = query else {
            return Err(ProviderFault::invalid_query(
                "attraction client received a non-attraction query",
            ));
        };

        let Some(api_key) = &self.api_key else {
            return Err(ProviderFault::authentication(
                "attraction search API key is not configured",
            ));
        };

        let mut search_terms = format!("{} top attractions", attraction_query.city);
        for interest in &attraction_query.interests {
            search_terms.push(' ');
            search_terms.push_str(interest);
        }

        info!("Searching attractions: {search_terms}");

        let url = format!(
            "{}?engine=google&q={}&num={}&api_key={}",
            self.base_url,
            urlencoding::encode(&search_terms),
            attraction_query.max_results,
            api_key,
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(ProviderId::Attractions, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(ProviderId::Attractions, status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| classify_transport(ProviderId::Attractions, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use crate::providers::AttractionQuery;

    fn attraction_query() -> ProviderQuery {
        ProviderQuery::Attractions(AttractionQuery {
            city: "Paris".to_string(),
            interests: ["art", "food"].iter().map(|s| s.to_string()).collect(),
            max_results: 10,
        })
    }

    #[test]
    fn test_client_creation() {
        let client = AttractionsClient::new(&SearchEngineConfig::default(), Duration::from_secs(5));
        assert_eq!(client.id(), ProviderId::Attractions);
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_fault() {
        let client = AttractionsClient::new(&SearchEngineConfig::default(), Duration::from_secs(5));
        let fault = client.search(&attraction_query()).await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::Authentication);
    }
}
