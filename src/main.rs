use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use placemap::api::{Geocoder, HttpFetcher};
use placemap::config::FileConfig;
use placemap::controller::SourceOutcome;
use placemap::view::ConsoleView;
use placemap::{LoadOrchestrator, PlaceRegistry, Session};

/// Plot open-data point records on a map centered on a configured place
///
/// Examples:
///   # Show every Connecticut school district
///   placemap -p connecticut
///
///   # Only Austin traffic incidents
///   placemap -p austin -s trafficData
///
///   # Look up an incident address
///   placemap -p austin --geocode "5700 blk S Mopac NB" --api-key <KEY>
///
///   # List configured places and their feeds
///   placemap --list
#[derive(Parser, Debug)]
#[command(name = "placemap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches placemap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Place to load (case-insensitive)
    #[arg(short = 'p', long)]
    place: Option<String>,

    /// Data source to load; repeat for several (defaults to all of the place's sources)
    #[arg(short = 's', long = "source")]
    sources: Vec<String>,

    /// List known places and their data sources, then exit
    #[arg(long)]
    list: bool,

    /// Geocode a street address inside --place instead of loading markers
    #[arg(long, value_name = "ADDRESS")]
    geocode: Option<String>,

    /// API key for the geocoding service (overrides the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut config = FileConfig::resolve(args.config.as_deref()).context("Failed to load config")?;
    if let Some(key) = args.api_key.clone() {
        config.geocode.api_key = Some(key);
    }
    let http = config.http.clone();
    let registry = Arc::new(PlaceRegistry::from_config(config).context("Invalid place registry")?);

    if args.list {
        print_places(&registry)?;
        return Ok(());
    }

    let Some(place) = args.place.as_deref() else {
        bail!(
            "Must provide --place/-p (known places: {})",
            registry.known_places().join(", ")
        );
    };
    if !registry.is_known_place(place) {
        bail!(
            "Unknown place {:?} (known places: {})",
            place,
            registry.known_places().join(", ")
        );
    }

    let fetcher = HttpFetcher::new(&http).context("Failed to create HTTP client")?;

    if let Some(address) = args.geocode.as_deref() {
        let spinner = create_spinner("Geocoding address...");
        let start = Instant::now();
        let found = Geocoder::new(&registry, &fetcher)
            .geocode(place, address)
            .context("Failed to geocode address")?;
        spinner.finish_with_message(format!(
            "Geocoded: {} -> {} [{:.1}s]",
            found.formatted_address.as_deref().unwrap_or(address),
            found.position,
            start.elapsed().as_secs_f32()
        ));
        return Ok(());
    }

    let mut orchestrator = LoadOrchestrator::new(Session::new(Arc::clone(&registry)), fetcher);
    let mut view = ConsoleView::new(Vec::new());
    orchestrator.init(&mut view);

    let sources: Vec<&str> = args.sources.iter().map(String::as_str).collect();
    let spinner = create_spinner("Fetching open data...");
    let start = Instant::now();
    let report = orchestrator
        .load(place, &sources, &mut view)
        .context("Failed to load place")?;
    spinner.finish_with_message(format!(
        "Placed {} markers for {} ({} records skipped) [{:.1}s]",
        report.markers(),
        report.place,
        report.skipped(),
        start.elapsed().as_secs_f32()
    ));

    std::io::stdout()
        .write_all(&view.into_inner())
        .context("Failed to write map")?;

    for source in &report.sources {
        match &source.outcome {
            SourceOutcome::Failed(e) => eprintln!("Warning: {} unavailable: {}", source.name, e),
            SourceOutcome::Discarded => eprintln!("Warning: {} results discarded", source.name),
            SourceOutcome::Plotted { .. } => {}
        }
    }

    Ok(())
}

fn print_places(registry: &PlaceRegistry) -> Result<()> {
    println!("{}", registry.app_name());
    println!();
    for key in registry.known_places() {
        let place = registry.place(key)?;
        println!("{} ({}, zoom {})", key, place.center(), place.zoom());
        for (name, source) in &place.data_sources {
            println!("  {:<20} {}", name, source.description());
        }
    }
    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
