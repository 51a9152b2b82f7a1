//! Response normalization: provider-native JSON to canonical entities
//!
//! Every function here is pure. Missing optional fields get sensible
//! defaults; a missing or mis-shaped *required* field (price, identifying
//! name) fails the whole payload with `MalformedResponse` so garbage never
//! reaches ranking. Raw shapes mirror what the upstream providers actually
//! send: Amadeus flight offers, SerpAPI Google Hotels, SerpAPI organic
//! results, OpenWeatherMap 5-day forecasts, OpenAI-style chat completions.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::error::{ProviderFault, ProviderResult};
use crate::models::{
    AttractionOption, FlightOption, HotelOption, Money, TemperatureRange, WeatherSummary,
};

/// Convert an airline code to a display name.
///
/// Codes outside the mapping fall back to "<code> Airlines".
#[must_use]
pub fn airline_name(code: &str) -> String {
    let mapping = [
        ("AA", "American Airlines"),
        ("AC", "Air Canada"),
        ("AF", "Air France"),
        ("AI", "Air India"),
        ("BA", "British Airways"),
        ("CX", "Cathay Pacific"),
        ("DL", "Delta Air Lines"),
        ("EK", "Emirates"),
        ("EY", "Etihad Airways"),
        ("IB", "Iberia"),
        ("JL", "Japan Airlines"),
        ("KE", "Korean Air"),
        ("KL", "KLM Royal Dutch Airlines"),
        ("LH", "Lufthansa"),
        ("QF", "Qantas"),
        ("QR", "Qatar Airways"),
        ("SQ", "Singapore Airlines"),
        ("TK", "Turkish Airlines"),
        ("UA", "United Airlines"),
        ("WN", "Southwest Airlines"),
    ];

    mapping
        .iter()
        .find(|(c, _)| *c == code)
        .map_or_else(|| format!("{code} Airlines"), |(_, name)| (*name).to_string())
}

/// Parse a price that may arrive as a number or a formatted string
/// ("523.50", "$1,200").
fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn malformed(provider: &str, detail: &str) -> ProviderFault {
    ProviderFault::malformed(format!("{provider} payload: {detail}"))
}

/// Normalize an Amadeus-style flight-offers payload.
pub fn normalize_flights(payload: &Value) -> ProviderResult<Vec<FlightOption>> {
    let offers = payload["data"]
        .as_array()
        .ok_or_else(|| malformed("flights", "missing 'data' array"))?;

    let mut options = Vec::with_capacity(offers.len());
    for offer in offers {
        let price_value = &offer["price"]["total"];
        let amount = parse_price(price_value)
            .ok_or_else(|| malformed("flights", "offer without a parseable price.total"))?;
        let currency = offer["price"]["currency"]
            .as_str()
            .unwrap_or("USD")
            .to_string();

        let segments = offer["itineraries"][0]["segments"]
            .as_array()
            .filter(|segments| !segments.is_empty())
            .ok_or_else(|| malformed("flights", "offer without itinerary segments"))?;

        let first = &segments[0];
        let last = &segments[segments.len() - 1];

        let carrier_code = first["carrierCode"]
            .as_str()
            .ok_or_else(|| malformed("flights", "segment without a carrier code"))?;

        let flight_number = first["number"]
            .as_str()
            .map(|number| format!("{carrier_code}{number}"));

        options.push(FlightOption {
            carrier: airline_name(carrier_code),
            flight_number,
            price: Money {
                currency,
                amount,
            },
            departs: parse_timestamp(first["departure"].get("at")),
            arrives: parse_timestamp(last["arrival"].get("at")),
            stops: (segments.len() - 1) as u32,
        });
    }

    Ok(options)
}

/// Normalize a SerpAPI Google-Hotels payload.
pub fn normalize_hotels(payload: &Value) -> ProviderResult<Vec<HotelOption>> {
    let properties = payload["properties"]
        .as_array()
        .ok_or_else(|| malformed("hotels", "missing 'properties' array"))?;

    let mut options = Vec::with_capacity(properties.len());
    for property in properties {
        let name = property["name"]
            .as_str()
            .ok_or_else(|| malformed("hotels", "property without a name"))?
            .to_string();

        let rate = &property["rate_per_night"]["lowest"];
        let amount = parse_price(rate)
            .ok_or_else(|| malformed("hotels", "property without a parseable nightly rate"))?;

        let rating = property["overall_rating"]
            .as_f64()
            .map_or(0.0, |r| r.clamp(0.0, 5.0) as f32);

        let location = property["description"]
            .as_str()
            .or_else(|| property["neighborhood"].as_str())
            .unwrap_or("")
            .to_string();

        options.push(HotelOption {
            name,
            nightly_price: Money::usd(amount),
            rating,
            location,
        });
    }

    Ok(options)
}

/// Normalize a SerpAPI organic-search payload into attractions.
pub fn normalize_attractions(payload: &Value) -> ProviderResult<Vec<AttractionOption>> {
    let results = payload["organic_results"]
        .as_array()
        .ok_or_else(|| malformed("attractions", "missing 'organic_results' array"))?;

    let mut options = Vec::with_capacity(results.len());
    for result in results {
        let name = result["title"]
            .as_str()
            .ok_or_else(|| malformed("attractions", "result without a title"))?
            .to_string();

        let category = result["category"]
            .as_str()
            .unwrap_or("general")
            .to_string();

        let rating = result["rich_snippet"]["top"]["detected_extensions"]["rating"]
            .as_f64()
            .or_else(|| result["rating"].as_f64())
            .map_or(0.0, |r| r.clamp(0.0, 5.0) as f32);

        options.push(AttractionOption {
            name,
            category,
            rating,
            visit_duration_minutes: result["visit_duration_minutes"]
                .as_u64()
                .map(|minutes| minutes as u32),
        });
    }

    Ok(options)
}

/// Normalize an OpenWeatherMap forecast payload into a trip-window summary.
///
/// Three-hour steps outside the requested range are dropped; when the
/// forecast horizon does not reach the trip at all, the whole forecast is
/// summarized instead so the traveler still sees something indicative.
pub fn normalize_weather(
    payload: &Value,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ProviderResult<WeatherSummary> {
    let entries = payload["list"]
        .as_array()
        .filter(|list| !list.is_empty())
        .ok_or_else(|| malformed("weather", "forecast contained no entries"))?;

    let in_range: Vec<&Value> = entries
        .iter()
        .filter(|entry| {
            entry["dt"]
                .as_i64()
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .is_some_and(|dt| {
                    let date = dt.date_naive();
                    date >= start_date && date <= end_date
                })
        })
        .collect();
    let window: Vec<&Value> = if in_range.is_empty() {
        entries.iter().collect()
    } else {
        in_range
    };

    let mut min_temp = f32::INFINITY;
    let mut max_temp = f32::NEG_INFINITY;
    let mut humidity_sum = 0u64;
    let mut humidity_count = 0u64;
    let mut descriptions: HashMap<String, usize> = HashMap::new();

    for entry in &window {
        let temp = entry["main"]["temp"]
            .as_f64()
            .ok_or_else(|| malformed("weather", "forecast entry without a temperature"))?
            as f32;
        min_temp = min_temp.min(temp);
        max_temp = max_temp.max(temp);

        if let Some(humidity) = entry["main"]["humidity"].as_u64() {
            humidity_sum += humidity;
            humidity_count += 1;
        }

        if let Some(description) = entry["weather"][0]["description"].as_str() {
            *descriptions.entry(description.to_string()).or_insert(0) += 1;
        }
    }

    let description = descriptions
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map_or_else(|| "unknown".to_string(), |(description, _)| description);

    Ok(WeatherSummary {
        description,
        temperature: TemperatureRange {
            min: min_temp,
            max: max_temp,
        },
        humidity: if humidity_count > 0 {
            Some((humidity_sum / humidity_count).min(100) as u8)
        } else {
            None
        },
    })
}

/// Extract the narrative text from an OpenAI-style chat completion.
///
/// Models sometimes wrap their answer in a fenced block; the fence is
/// stripped so the caller always gets plain prose.
pub fn normalize_narrative(payload: &Value) -> ProviderResult<String> {
    let content = payload["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| malformed("synthesizer", "completion without message content"))?
        .trim();

    if content.is_empty() {
        return Err(malformed("synthesizer", "completion with empty content"));
    }

    let unfenced = content
        .strip_prefix("```")
        .and_then(|rest| rest.split_once('\n'))
        .and_then(|(_, body)| body.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(content);

    Ok(unfenced.to_string())
}

/// Rank flights: price ascending, then stop count ascending.
///
/// The sort is stable, so offers with equal keys keep provider order.
pub fn rank_flights(flights: &mut [FlightOption]) {
    flights.sort_by(|a, b| {
        a.price
            .amount
            .total_cmp(&b.price.amount)
            .then(a.stops.cmp(&b.stops))
    });
}

/// Rank hotels: rating descending, then nightly price ascending.
pub fn rank_hotels(hotels: &mut [HotelOption]) {
    hotels.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then(a.nightly_price.amount.total_cmp(&b.nightly_price.amount))
    });
}

/// Rank attractions: rating descending.
pub fn rank_attractions(attractions: &mut [AttractionOption]) {
    attractions.sort_by(|a, b| b.rating.total_cmp(&a.rating));
}
