use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use tools::{FeatureKind, LoadOptions, LoadReport, load_features, load_wellbores};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load wellbore and GeoJSON payloads and report the draw state")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct ViewArgs {
    /// Projected units per degree of latitude or longitude
    #[arg(long, default_value_t = 100.0)]
    scale: f64,

    /// Map zoom level used for sizing
    #[arg(long, default_value_t = 10.0)]
    zoom: f64,

    /// Draw labels after loading
    #[arg(long)]
    labels: bool,

    /// Module config as a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Click at lat,lng after loading and report the hits
    #[arg(long)]
    click: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a GeoJSON FeatureCollection
    Features {
        /// GeoJSON file
        path: PathBuf,

        /// Module that draws the features
        #[arg(long = "as", value_enum, default_value_t = FeatureKind::Geojson)]
        kind: FeatureKind,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Load a JSON array of wellbores
    Wellbores {
        /// Wellbore file
        path: PathBuf,

        /// Group the wellbores are added to
        #[arg(long, default_value = "default")]
        group: String,

        #[command(flatten)]
        view: ViewArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let report = match args.command {
        Command::Features { path, kind, view } => {
            let payload = read(&path)?;
            load_features(kind, &payload, &options(&view)?)?
        }
        Command::Wellbores { path, group, view } => {
            let payload = read(&path)?;
            load_wellbores(&payload, &group, &options(&view)?)?
        }
    };
    print(&report)
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()).into())
}

fn options(view: &ViewArgs) -> Result<LoadOptions, Box<dyn std::error::Error>> {
    let config = view.config.as_deref().map(read).transpose()?;
    let click = view.click.as_deref().map(parse_lat_lng).transpose()?;
    Ok(LoadOptions {
        units_per_degree: view.scale,
        zoom: view.zoom,
        labels: view.labels,
        config,
        click,
    })
}

fn parse_lat_lng(raw: &str) -> Result<(f64, f64), Box<dyn std::error::Error>> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng but got {raw:?}"))?;
    Ok((lat.trim().parse()?, lng.trim().parse()?))
}

fn print(report: &LoadReport) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
