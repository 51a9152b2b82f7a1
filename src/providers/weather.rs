//! OpenWeatherMap-style forecast client
//!
//! Supplies destination weather metadata for the trip window. The free
//! forecast endpoint covers five days in three-hour steps; normalization
//! collapses the steps that fall inside the requested range.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{ProviderClient, ProviderId, ProviderQuery, classify_status, classify_transport};
use crate::config::WeatherConfig;
use crate::error::{ProviderFault, ProviderResult};

/// Weather forecast provider client
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    #[must_use]
    pub fn new(config: &WeatherConfig, timeout: Duration) -> Self {
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
impl ProviderClient for WeatherClient {
    fn id(&self) -> ProviderId {
        ProviderId::Weather
    }

    async fn search(&self, query: &ProviderQuery) -> ProviderResult<Value> {
        let ProviderQuery::Weather(weather_query) = query else {
            return Err(ProviderFault::invalid_query(
                "weather client received a non-weather query",
            ));
        };

        let Some(api_key) = &self.api_key else {
            return Err(ProviderFault::authentication(
                "weather API key is not configured",
            ));
        };

        info!("Fetching weather forecast for {}", weather_query.city);

        let url = format!(
            "{}/forecast?q={}&units=metric&appid={}",
            self.base_url,
            urlencoding::encode(&weather_query.city),
            api_key,
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(ProviderId::Weather, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(ProviderId::Weather, status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| classify_transport(ProviderId::Weather, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use crate::providers::WeatherQuery;
    use chrono::NaiveDate;

    #[test]
    fn test_client_creation() {
        let client = WeatherClient::new(&WeatherConfig::default(), Duration::from_secs(5));
        assert_eq!(client.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(client.id(), ProviderId::Weather);
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_fault() {
        let client = WeatherClient::new(&WeatherConfig::default(), Duration::from_secs(5));
        let query = ProviderQuery::Weather(WeatherQuery {
            city: "Paris".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        });
        let fault = client.search(&query).await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::Authentication);
    }
}
