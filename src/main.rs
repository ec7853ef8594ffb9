//! Flight aggregator: HTTP service and one-shot search CLI
//!
//! This is the main entry point for the application.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flight_aggregator::{
    cache::ResultCache,
    config::{self, Settings},
    search::{Aggregator, Deadline, SearchRequest},
    sources::SourceLoader,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Flight aggregator - one ranked list of offers from many airlines
#[derive(Parser)]
#[command(name = "flight-aggregator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Run a single search and print the JSON response
    #[command(alias = "s")]
    Search(SearchArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Origin airport code
    origin: String,
    /// Destination airport code
    destination: String,
    /// Departure date (YYYY-MM-DD)
    date: String,
    /// Return date (YYYY-MM-DD)
    #[arg(long)]
    return_date: Option<String>,
    #[arg(long, default_value = "1")]
    passengers: u32,
    #[arg(long, default_value = "economy")]
    cabin_class: String,
    #[arg(long)]
    min_price: Option<i64>,
    #[arg(long)]
    max_price: Option<i64>,
    #[arg(long)]
    min_stops: Option<u32>,
    #[arg(long)]
    max_stops: Option<u32>,
    /// Earliest departure time of day (HH:MM)
    #[arg(long)]
    departure_after: Option<String>,
    /// Latest departure time of day (HH:MM)
    #[arg(long)]
    departure_before: Option<String>,
    /// Earliest arrival time of day (HH:MM)
    #[arg(long)]
    arrival_after: Option<String>,
    /// Latest arrival time of day (HH:MM)
    #[arg(long)]
    arrival_before: Option<String>,
    /// Allowed airline name or code; repeat for several
    #[arg(long = "airline")]
    airlines: Vec<String>,
    #[arg(long)]
    min_duration: Option<i64>,
    #[arg(long)]
    max_duration: Option<i64>,
    /// Sort directive, e.g. price_asc
    #[arg(long)]
    sort_by: Option<String>,
    /// Run the search twice to show the cached response
    #[arg(long)]
    repeat: bool,
}

impl SearchArgs {
    fn request(&self) -> SearchRequest {
        let mut request = SearchRequest::new(&self.origin, &self.destination, &self.date)
            .with_passengers(self.passengers)
            .with_cabin_class(&self.cabin_class)
            .with_price_range(self.min_price, self.max_price)
            .with_stop_range(self.min_stops, self.max_stops)
            .with_duration_range(self.min_duration, self.max_duration);
        request.return_date = self.return_date.clone();
        request.departure_time_start = self.departure_after.clone();
        request.departure_time_end = self.departure_before.clone();
        request.arrival_time_start = self.arrival_after.clone();
        request.arrival_time_end = self.arrival_before.clone();
        if !self.airlines.is_empty() {
            request = request.with_airlines(self.airlines.clone());
        }
        if let Some(directive) = &self.sort_by {
            request = request.with_sort_by(directive);
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::load(cli.config.as_deref())?;
    init_logging(&settings);

    info!("Starting flight-aggregator v{}", flight_aggregator::VERSION);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings).await,
        Commands::Search(args) => search_once(settings, args.request(), args.repeat).await,
    }
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if settings.general.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn serve(settings: Settings) -> Result<()> {
    info!(
        "Loaded configuration for instance: {}",
        settings.general.instance_name
    );

    let registry = SourceLoader::load(&settings)?;
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, registry);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn search_once(settings: Settings, request: SearchRequest, repeat: bool) -> Result<()> {
    let registry = Arc::new(SourceLoader::load(&settings)?);
    let cache = Arc::new(ResultCache::new(
        settings.cache.max_entries,
        settings.cache.ttl(),
    ));
    let aggregator = Aggregator::from_settings(&settings, registry, cache);

    let runs = if repeat { 2 } else { 1 };
    for _ in 0..runs {
        let deadline = Deadline::after(settings.search.request_timeout());
        let response = aggregator.search(&request, &deadline).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
