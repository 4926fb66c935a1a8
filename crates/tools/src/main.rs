use std::fs;
use std::path::{Path, PathBuf};

use catalog::{Location, default_locations, locations_from_json};
use clap::{Parser, Subcommand};
use geocode::{FixtureGeocoder, Geocoder, HttpGeocoder};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use widget::WidgetConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the map widget")]
struct Args {
    /// Geocoder access token (default: $MAPBOX_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Geocoder endpoint (default: $ATLAS_GEOCODER_URL or the Mapbox places API)
    #[arg(long)]
    geocoder_url: Option<String>,

    /// JSON array of locations to seed instead of the built-in six
    #[arg(long)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available map styles
    Styles,

    /// Run a scripted session (load, click, style switch, removal) and print a JSON report
    Demo {
        /// Style to switch to
        #[arg(long, default_value = "Dark")]
        style: String,
    },

    /// Resolve queries against a seeded widget and print the resulting store
    Search {
        /// Queries, applied in order
        #[arg(required = true)]
        text: Vec<String>,

        /// Answer lookups from a `{ "<query>": <feature collection> }` file instead of HTTP
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), String> {
    let mut config = WidgetConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(token) = args.token {
        config.geocoder.access_token = token;
    }
    if let Some(url) = args.geocoder_url {
        config.geocoder.endpoint = url;
    }
    let seed = load_seed(args.seed.as_deref())?;

    match args.command {
        Command::Styles => print_json(&tools::style_rows()),
        Command::Demo { style } => {
            let report = tools::run_demo(config, seed, &style).map_err(|e| e.to_string())?;
            print_json(&report)
        }
        Command::Search { text, fixture } => {
            let geocoder: Box<dyn Geocoder> = match fixture {
                Some(path) => {
                    let raw = read(&path)?;
                    Box::new(FixtureGeocoder::from_json(&raw).map_err(|e| format!("{path:?}: {e}"))?)
                }
                None => {
                    if config.geocoder.access_token.is_empty() {
                        return Err("no geocoder token: pass --token or set MAPBOX_TOKEN".to_string());
                    }
                    info!(endpoint = %config.geocoder.endpoint, "using HTTP geocoder");
                    Box::new(HttpGeocoder::new(config.geocoder.clone()))
                }
            };
            let report = tools::run_search(config, seed, geocoder.as_ref(), &text)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&report)
        }
    }
}

fn load_seed(path: Option<&Path>) -> Result<Vec<Location>, String> {
    match path {
        Some(path) => locations_from_json(&read(path)?).map_err(|e| format!("{path:?}: {e}")),
        None => Ok(default_locations()),
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
    println!("{out}");
    Ok(())
}
