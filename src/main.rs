use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use pollution_near_me::config::Config;
use pollution_near_me::constants;
use pollution_near_me::geocode::{GeocodeOutcome, Geocoder};
use pollution_near_me::infra::http_client::ReqwestHttp;
use pollution_near_me::logging;
use pollution_near_me::metrics;
use pollution_near_me::map::{self, MapView};
use pollution_near_me::pipeline::ingestion::fetch_npl;
use pollution_near_me::pipeline::output::write_json;
use pollution_near_me::pipeline::processing::converters::{ConvertContext, ConverterRegistry};
use pollution_near_me::pipeline::Pipeline;
use pollution_near_me::snapshot::{self, DatasetSource, DirSource, HttpSource};

#[derive(Parser)]
#[command(name = "pollution_near_me")]
#[command(about = "Convert EPA exports into the PollutionNearMe datasets and inspect them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simplify a TRI export into tri.json
    Tri {
        input: PathBuf,
        /// Defaults to tri.json in the data directory
        output: Option<PathBuf>,
    },
    /// Build superfund.json from an NPL export (CSV, JSON or GeoJSON)
    Superfund {
        input: PathBuf,
        output: Option<PathBuf>,
        /// Keep only current final NPL sites
        #[arg(long)]
        final_npl: bool,
    },
    /// Build violations.json from an ECHO exporter CSV
    Violations {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    /// Convert a CSV file to a JSON array of row objects
    CsvToJson {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    /// Download the raw NPL feature layer
    FetchNpl {
        output: Option<PathBuf>,
    },
    /// Compute the snapshot tiles and print them as JSON
    Snapshot {
        /// Read datasets from this directory instead of the configured data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Fetch datasets from a deployed site instead of the local data directory
        #[arg(long, conflicts_with = "data_dir")]
        base_url: Option<String>,
    },
    /// Write every map marker layer as GeoJSON
    Map {
        output: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long, conflicts_with = "data_dir")]
        base_url: Option<String>,
    },
    /// Look up a place and show where the map would center
    Geocode {
        query: String,
    },
}

fn convert(config: &Config, name: &str, input: &Path, output: Option<PathBuf>, ctx: ConvertContext) -> Result<()> {
    let registry = ConverterRegistry::new();
    let converter = registry.get(name)?;
    let output = output.unwrap_or_else(|| config.data_path(converter.default_output()));

    let span = tracing::info_span!("convert", converter = %name);
    let _enter = span.enter();

    let result = Pipeline::run(converter, input, &output, &ctx, config.paths.anomaly_log.as_deref())
        .with_context(|| format!("{} conversion of {} failed", name, input.display()))?;

    println!("\n📊 Conversion results for {}:", name);
    println!("   Input: {} bytes of {:?}", result.input_bytes, result.input_format);
    println!("   Records read: {}", result.records_read);
    println!("   Written: {}", result.records_written);
    println!("   Dropped: {}", result.records_dropped);
    println!("   Anomalies: {}", result.anomalies.len());
    println!("   Output file: {}", result.output.display());
    if let Some(log) = &result.anomaly_log {
        println!("   Anomaly log: {}", log.display());
    }
    Ok(())
}

fn http_client(user_agent: &str, timeout_seconds: u64) -> Result<Arc<ReqwestHttp>> {
    let client = ReqwestHttp::new(user_agent, Duration::from_secs(timeout_seconds))
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(client))
}

fn dataset_source(config: &Config, data_dir: Option<PathBuf>, base_url: Option<String>) -> Result<Arc<dyn DatasetSource>> {
    let source: Arc<dyn DatasetSource> = match base_url {
        Some(url) => {
            let http = http_client(&config.geocoder.user_agent, config.geocoder.timeout_seconds)?;
            Arc::new(HttpSource::new(&url, http))
        }
        None => Arc::new(DirSource::new(
            data_dir.unwrap_or_else(|| config.paths.data_dir.clone()),
        )),
    };
    Ok(source)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Tri { input, output } => {
            convert(&config, constants::TRI_CONVERTER, &input, output, ConvertContext::from_config(&config))?;
        }
        Commands::Superfund { input, output, final_npl } => {
            let mut ctx = ConvertContext::from_config(&config);
            if final_npl {
                ctx = ctx.with_final_npl(&config);
            }
            convert(&config, constants::SUPERFUND_CONVERTER, &input, output, ctx)?;
        }
        Commands::Violations { input, output } => {
            convert(&config, constants::VIOLATIONS_CONVERTER, &input, output, ConvertContext::from_config(&config))?;
        }
        Commands::CsvToJson { input, output } => {
            convert(&config, constants::CSV_TO_JSON_CONVERTER, &input, output, ConvertContext::from_config(&config))?;
        }
        Commands::FetchNpl { output } => {
            let output = output.unwrap_or_else(|| config.data_path(constants::NPL_RAW_OUTPUT));
            let http = http_client(&config.geocoder.user_agent, config.npl.timeout_seconds)?;
            let features = fetch_npl(http.as_ref(), &config.npl, &output)
                .await
                .context("NPL download failed")?;
            println!("✅ Saved raw NPL feature layer to {} with {} features", output.display(), features);
        }
        Commands::Snapshot { data_dir, base_url } => {
            let source = dataset_source(&config, data_dir, base_url)?;
            let tiles = snapshot::load_snapshots(source, &snapshot::datasets()).await;
            println!("{}", serde_json::to_string_pretty(&tiles)?);
        }
        Commands::Map { output, data_dir, base_url } => {
            let source = dataset_source(&config, data_dir, base_url)?;
            let view = map::load_map(source.as_ref()).await;
            let output = output.unwrap_or_else(|| config.data_path(constants::MARKERS_OUTPUT));
            write_json(&output, &view.to_geojson())?;
            for name in view.layer_names() {
                let count = view.layer(name).map_or(0, |layer| layer.len());
                println!("   {}: {} markers", name, count);
            }
            println!("✅ Wrote {}", output.display());
        }
        Commands::Geocode { query } => {
            let http = http_client(&config.geocoder.user_agent, config.geocoder.timeout_seconds)?;
            let geocoder = Geocoder::new(http, config.geocoder.clone());
            let mut view = MapView::new();
            let outcome = geocoder.locate(&query, &mut view).await;
            println!("{}", outcome);
            match outcome {
                GeocodeOutcome::Centered { position, zoom, .. } => {
                    println!("   {}, {} at zoom {}", position.lat, position.lon, zoom);
                }
                GeocodeOutcome::SearchError(e) => bail!("geocoding failed: {e}"),
                _ => {}
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    logging::init_logging(&config.paths.logs_dir);
    metrics::init_metrics();
    info!("Using data directory {}", config.paths.data_dir.display());

    let metrics_path = config.paths.logs_dir.join(constants::METRICS_FILE);
    let outcome = run(cli, config).await;
    if let Err(e) = metrics::write_snapshot(&metrics_path) {
        warn!("Could not write metrics: {}", e);
    }
    if let Err(e) = outcome {
        error!("{:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
