use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueHint};
use log::{error, info, warn};

use enrollment_layers::io::{load_addresses, load_census, load_geographies, load_stratifications};
use enrollment_layers::utils::logging::{create_main_progress_bar, finish_progress_bar};
use enrollment_layers::{
    Layer, LayerReport, MemoryRecordSource, ParquetOutputStore, PipelineConfig, ReferenceData,
    RunStatus, run_layer,
};

#[derive(Debug, Parser)]
#[command(name = "enrollment-layers")]
#[command(about = "Repair redacted enrollment counts and publish per-layer rollups")]
struct Args {
    /// Enrollment census CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    census: PathBuf,

    /// Stratification label table (group_by, group_by_value, label_name)
    #[arg(long, value_hint = ValueHint::FilePath)]
    stratifications: PathBuf,

    /// GEOID table (layer, name, geoid)
    #[arg(long, value_hint = ValueHint::FilePath)]
    geoids: PathBuf,

    /// School address directory, needed by the zip code and city layers
    #[arg(long, value_hint = ValueHint::FilePath)]
    addresses: Option<PathBuf>,

    /// Directory receiving one Parquet file per layer
    #[arg(long, value_hint = ValueHint::DirPath)]
    output: PathBuf,

    /// Layers to run: state, region, county, zip, city or all
    #[arg(long = "layer", default_value = "all")]
    layers: Vec<String>,

    /// JSON file overriding the default pipeline configuration
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Print the layer reports as JSON
    #[arg(long)]
    json: bool,
}

fn selected_layers(names: &[String]) -> anyhow::Result<Vec<Layer>> {
    if names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        return Ok(Layer::ALL.to_vec());
    }
    let mut layers = Vec::with_capacity(names.len());
    for name in names {
        let layer: Layer = name.parse().with_context(|| format!("invalid --layer {name:?}"))?;
        if !layers.contains(&layer) {
            layers.push(layer);
        }
    }
    Ok(layers)
}

fn print_report(report: &LayerReport) {
    match &report.status {
        RunStatus::Succeeded { rows_written } => println!(
            "{:<14} ok        {rows_written:>8} rows  {:>6} ms",
            report.layer.tag(),
            report.elapsed_ms
        ),
        RunStatus::NoInputData => println!("{:<14} no input", report.layer.tag()),
        RunStatus::Failed {
            operation, message, ..
        } => println!("{:<14} failed    {operation}: {message}", report.layer.tag()),
    }
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let layers = selected_layers(&args.layers)?;

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    info!("{config}");

    let census = load_census(&args.census)
        .with_context(|| format!("loading census from {}", args.census.display()))?;
    info!(
        "Loaded {} census records ({} redacted rows skipped)",
        census.records.len(),
        census.redacted
    );

    let addresses = match &args.addresses {
        Some(path) => load_addresses(path)
            .with_context(|| format!("loading addresses from {}", path.display()))?,
        None => {
            if layers.iter().any(|l| matches!(l, Layer::ZipCode | Layer::City)) {
                warn!("No address directory given; zip code and city layers will be empty");
            }
            Vec::new()
        }
    };
    let references = ReferenceData {
        stratifications: load_stratifications(&args.stratifications).with_context(|| {
            format!("loading stratifications from {}", args.stratifications.display())
        })?,
        geographies: load_geographies(&args.geoids)
            .with_context(|| format!("loading GEOIDs from {}", args.geoids.display()))?,
        addresses,
    };

    let source = MemoryRecordSource::new(census.records);
    if source.is_empty() {
        warn!("The census holds no usable records; every layer will report no input");
    } else {
        info!("Running layers over {} census records", source.len());
    }
    let mut store = ParquetOutputStore::open(&args.output)
        .with_context(|| format!("opening output directory {}", args.output.display()))?;

    let pb = create_main_progress_bar(layers.len() as u64, Some("Publishing layers"));
    let mut reports = Vec::with_capacity(layers.len());
    for layer in layers {
        pb.set_message(layer.tag());
        reports.push(run_layer(layer, &source, &mut store, &references, &config));
        pb.inc(1);
    }
    finish_progress_bar(&pb, Some("Layers complete"));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| matches!(r.status, RunStatus::Failed { .. }))
        .map(|r| r.layer.tag())
        .collect();
    if !failed.is_empty() {
        error!("{} layer(s) failed", failed.len());
        bail!("failed layers: {}", failed.join(", "));
    }
    Ok(())
}
