//! SerpAPI Google-Hotels-style hotel search client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{ProviderClient, ProviderId, ProviderQuery, classify_status, classify_transport};
use crate::config::SearchEngineConfig;
use crate::error::{ProviderFault, ProviderResult};

/// Hotel search provider client
pub struct HotelsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HotelsClient {
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
impl ProviderClient for HotelsClient {
    fn id(&self) -> ProviderId {
        ProviderId::Hotels
    }

    async fn search(&self, query: &ProviderQuery) -> ProviderResult<Value> {
        let ProviderQuery::Hotels(hotel_query) = query else {
            return Err(ProviderFault::invalid_query(
                "hotel client received a non-hotel query",
            ));
        };

        let Some(api_key) = &self.api_key else {
            return Err(ProviderFault::authentication(
                "hotel search API key is not configured",
            ));
        };

        info!(
            "Searching hotels in {} for {} guest(s), {} to {}",
            hotel_query.city, hotel_query.guests, hotel_query.check_in, hotel_query.check_out
        );

        let mut url = format!(
            "{}?engine=google_hotels&q={}&check_in_date={}&check_out_date={}&adults={}&currency=USD&gl=us&hl=en&api_key={}",
            self.base_url,
            urlencoding::encode(&format!("{} hotels", hotel_query.city)),
            hotel_query.check_in.format("%Y-%m-%d"),
            hotel_query.check_out.format("%Y-%m-%d"),
            hotel_query.guests,
            api_key,
        );
        if let Some(max_price) = hotel_query.max_price {
            url.push_str(&format!("&max_price={max_price}"));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(ProviderId::Hotels, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(ProviderId::Hotels, status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| classify_transport(ProviderId::Hotels, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use crate::providers::{HotelQuery, WeatherQuery};
    use chrono::NaiveDate;

    fn hotel_query() -> ProviderQuery {
        ProviderQuery::Hotels(HotelQuery {
            city: "Paris".to_string(),
            check_in: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            guests: 2,
            max_price: Some(250),
        })
    }

    #[test]
    fn test_client_creation() {
        let client = HotelsClient::new(&SearchEngineConfig::default(), Duration::from_secs(5));
        assert_eq!(client.base_url, "https://serpapi.com/search");
        assert_eq!(client.id(), ProviderId::Hotels);
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_fault() {
        let client = HotelsClient::new(&SearchEngineConfig::default(), Duration::from_secs(5));
        let fault = client.search(&hotel_query()).await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::Authentication);
    }

    #[tokio::test]
    async fn test_wrong_query_variant_rejected() {
        let client = HotelsClient::new(&SearchEngineConfig::default(), Duration::from_secs(5));
        let query = ProviderQuery::Weather(WeatherQuery {
            city: "Paris".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        });
        let fault = client.search(&query).await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::InvalidQuery);
    }
}
