//! Provider client boundary
//!
//! Every external data source sits behind the same contract: it receives a
//! normalized query and resolves to exactly one `ProviderResult` carrying
//! provider-native JSON. The payload stays opaque until normalization.
//!
//! This module also owns the shared call policy (per-attempt timeout, one
//! retry on transient faults) and the mapping from transport/HTTP errors to
//! the fault taxonomy.

pub mod attractions;
pub mod flights;
pub mod hotels;
pub mod weather;

use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PolicyConfig;
use crate::error::{ProviderFault, ProviderResult};

pub use attractions::AttractionsClient;
pub use flights::FlightsClient;
pub use hotels::HotelsClient;
pub use weather::WeatherClient;

/// Identity of an external data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    Flights,
    Hotels,
    Attractions,
    Weather,
    Synthesizer,
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProviderId::Flights => "flights",
            ProviderId::Hotels => "hotels",
            ProviderId::Attractions => "attractions",
            ProviderId::Weather => "weather",
            ProviderId::Synthesizer => "synthesizer",
        };
        write!(f, "{label}")
    }
}

/// Normalized flight search query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
}

/// Normalized hotel search query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HotelQuery {
    pub city: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    /// Nightly price cap in whole USD, derived from the budget ceiling
    pub max_price: Option<u32>,
}

/// Normalized attraction search query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttractionQuery {
    pub city: String,
    /// Sorted so tag ordering never changes the fingerprint
    pub interests: BTreeSet<String>,
    pub max_results: u32,
}

/// Normalized weather lookup query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WeatherQuery {
    pub city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A normalized query addressed to one provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderQuery {
    Flights(FlightQuery),
    Hotels(HotelQuery),
    Attractions(AttractionQuery),
    Weather(WeatherQuery),
}

impl ProviderQuery {
    #[must_use]
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderQuery::Flights(_) => ProviderId::Flights,
            ProviderQuery::Hotels(_) => ProviderId::Hotels,
            ProviderQuery::Attractions(_) => ProviderId::Attractions,
            ProviderQuery::Weather(_) => ProviderId::Weather,
        }
    }

    /// Deterministic cache fingerprint of the query.
    ///
    /// Two semantically identical queries hash identically within a process
    /// regardless of how their field values were assembled.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// One external data source.
///
/// Implementations are thin HTTP wrappers; retry and timeout live in
/// [`call_with_policy`], never inside a client.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Issue one search attempt and return the provider-native payload.
    async fn search(&self, query: &ProviderQuery) -> ProviderResult<Value>;
}

/// Apply the per-attempt deadline and single-retry policy to an operation.
///
/// The first attempt runs immediately; a retry happens only for retryable
/// fault kinds, once, after a short jittered backoff. Semantic faults
/// (authentication, invalid query, malformed response) surface unchanged.
pub async fn with_fault_policy<T, F, Fut>(
    policy: &PolicyConfig,
    label: ProviderId,
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let deadline = policy.timeout();
    let mut result = bounded(deadline, label, op()).await;

    for _ in 0..policy.transient_retries {
        match &result {
            Err(fault) if fault.kind.is_retryable() => {
                tracing::debug!(provider = %label, %fault, "retrying after transient fault");
                let jitter_ms: u64 = rand::rng().random_range(50..200);
                tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                result = bounded(deadline, label, op()).await;
            }
            _ => break,
        }
    }

    result
}

/// Run a provider call through the policy wrapper.
pub async fn call_with_policy(
    client: &dyn ProviderClient,
    query: &ProviderQuery,
    policy: &PolicyConfig,
) -> ProviderResult<Value> {
    with_fault_policy(policy, client.id(), || client.search(query)).await
}

async fn bounded<T>(
    deadline: Duration,
    label: ProviderId,
    fut: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderFault::timeout(format!(
            "{label} did not answer within {}s",
            deadline.as_secs_f32()
        ))),
    }
}

/// Map a reqwest transport error onto the fault taxonomy.
pub(crate) fn classify_transport(provider: ProviderId, err: &reqwest::Error) -> ProviderFault {
    if err.is_timeout() {
        ProviderFault::timeout(format!("{provider} request timed out: {err}"))
    } else if err.is_decode() {
        ProviderFault::malformed(format!("{provider} response could not be decoded: {err}"))
    } else {
        ProviderFault::transient(format!("{provider} request failed: {err}"))
    }
}

/// Map a non-success HTTP status onto the fault taxonomy.
pub(crate) fn classify_status(
    provider: ProviderId,
    status: reqwest::StatusCode,
    body: &str,
) -> ProviderFault {
    match status.as_u16() {
        401 | 403 => ProviderFault::authentication(format!(
            "{provider} rejected the credentials ({status})"
        )),
        400 | 404 | 422 => {
            ProviderFault::invalid_query(format!("{provider} rejected the query ({status}): {body}"))
        }
        // 429 and 5xx clear on their own; eligible for the single retry
        _ => ProviderFault::transient(format!("{provider} returned {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn flight_query(passengers: u32) -> ProviderQuery {
        ProviderQuery::Flights(FlightQuery {
            origin: "NYC".to_string(),
            destination: "PAR".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            return_date: Some(NaiveDate::from_ymd_opt(2025, 6, 8).unwrap()),
            passengers,
        })
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(flight_query(2).fingerprint(), flight_query(2).fingerprint());
        assert_ne!(flight_query(2).fingerprint(), flight_query(3).fingerprint());
    }

    #[test]
    fn test_fingerprint_ignores_tag_order() {
        let a = ProviderQuery::Attractions(AttractionQuery {
            city: "Paris".to_string(),
            interests: ["art", "food"].iter().map(|s| s.to_string()).collect(),
            max_results: 10,
        });
        let b = ProviderQuery::Attractions(AttractionQuery {
            city: "Paris".to_string(),
            interests: ["food", "art"].iter().map(|s| s.to_string()).collect(),
            max_results: 10,
        });
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[tokio::test]
    async fn test_transient_fault_retried_once() {
        let policy = PolicyConfig {
            timeout_seconds: 5,
            transient_retries: 1,
        };
        let calls = AtomicUsize::new(0);

        let result = with_fault_policy(&policy, ProviderId::Hotels, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(ProviderFault::transient("connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authentication_fault_not_retried() {
        let policy = PolicyConfig {
            timeout_seconds: 5,
            transient_retries: 1,
        };
        let calls = AtomicUsize::new(0);

        let result: ProviderResult<u32> = with_fault_policy(&policy, ProviderId::Hotels, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderFault::authentication("bad key")) }
        })
        .await;

        assert_eq!(result.unwrap_err().kind, FaultKind::Authentication);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let policy = PolicyConfig {
            timeout_seconds: 1,
            transient_retries: 0,
        };

        let result: ProviderResult<u32> = with_fault_policy(&policy, ProviderId::Flights, || {
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind, FaultKind::Timeout);
    }

    #[test]
    fn test_status_classification() {
        let auth = classify_status(ProviderId::Hotels, reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(auth.kind, FaultKind::Authentication);

        let invalid = classify_status(ProviderId::Hotels, reqwest::StatusCode::BAD_REQUEST, "");
        assert_eq!(invalid.kind, FaultKind::InvalidQuery);

        let throttled =
            classify_status(ProviderId::Hotels, reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(throttled.kind, FaultKind::TransientNetwork);

        let outage =
            classify_status(ProviderId::Hotels, reqwest::StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(outage.kind, FaultKind::TransientNetwork);
    }
}
