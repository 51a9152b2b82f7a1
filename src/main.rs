use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

use tripsmith::config::AppConfig;
use tripsmith::models::TripRequest;
use tripsmith::orchestrator::Orchestrator;
use tripsmith::web;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tripsmith={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_usage() {
    println!("TripSmith - multi-provider travel planning");
    println!();
    println!("Usage:");
    println!("  tripsmith serve [port]");
    println!("  tripsmith <origin> <destination> <start> <end> [travelers]");
    println!();
    println!("Examples:");
    println!("  tripsmith serve 8080");
    println!("  tripsmith NYC PAR 2025-06-01 2025-06-08 2");
    println!();
    println!("Configuration is read from config.toml and TRIPSMITH_* environment");
    println!("variables (provider API keys, timeouts, cache TTLs).");
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is not a date in YYYY-MM-DD form"))
}

async fn run_once(orchestrator: Arc<Orchestrator>, args: &[String]) -> Result<()> {
    let travelers = match args.get(4) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("'{raw}' is not a traveler count"))?,
        None => 1,
    };
    let request = TripRequest::new(
        args[0].clone(),
        args[1].clone(),
        parse_date(&args[2])?,
        parse_date(&args[3])?,
        travelers,
    );

    let plan = match orchestrator.plan(request).await {
        Ok(plan) => plan,
        Err(err) => bail!("{}", err.user_message()),
    };

    println!("Travel plan for {}", plan.destination);
    println!();

    if let Some(narrative) = &plan.narrative {
        println!("{narrative}");
        println!();
    }

    println!("Flights ({}):", plan.flights.len());
    for flight in &plan.flights {
        println!(
            "  {} {} - {} ({} stop(s))",
            flight.carrier,
            flight.flight_number.as_deref().unwrap_or(""),
            flight.price,
            flight.stops
        );
    }

    println!("Hotels ({}):", plan.hotels.len());
    for hotel in &plan.hotels {
        println!(
            "  {} - {} per night, {:.1}/5",
            hotel.name, hotel.nightly_price, hotel.rating
        );
    }

    println!("Attractions ({}):", plan.attractions.len());
    for attraction in &plan.attractions {
        println!("  {} ({})", attraction.name, attraction.category);
    }

    if let Some(weather) = &plan.weather {
        println!(
            "Weather: {}, {:.0} to {:.0} C",
            weather.description, weather.temperature.min, weather.temperature.max
        );
    }

    if !plan.failures.is_empty() {
        println!();
        println!("Some sections could not be fetched:");
        for failure in plan.failures.entries() {
            println!("  {}: {}", failure.domain, failure.kind);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    let orchestrator = Arc::new(Orchestrator::from_config(&config));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("serve") => {
            let port = match args.get(1) {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("'{raw}' is not a port number"))?,
                None => 8080,
            };
            web::run(orchestrator, port).await
        }
        Some(_) if args.len() >= 4 => run_once(orchestrator, &args).await,
        _ => {
            print_usage();
            Ok(())
        }
    }
}
