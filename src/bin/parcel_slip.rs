//! Parcel slip generator
//!
//! Renders one shipping label PDF from JSON shipment data

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use parcel_slip::{LabelConfig, LabelGenerator, LabelOptions, ShipmentRecord};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "parcel-slip")]
#[command(about = "Generate a printable parcel shipping label (PDF)")]
struct Args {
    /// Shipment record as JSON
    #[arg(short = 's', long)]
    shipment: PathBuf,

    /// Label options as JSON (company name, tracking page, terms)
    #[arg(short = 'o', long)]
    options: Option<PathBuf>,

    /// Company logo (PNG or JPEG)
    #[arg(short = 'l', long)]
    logo: Option<PathBuf>,

    /// Generator configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Tracking site base URL, overrides the configured deployment URL
    #[arg(short = 'u', long)]
    base_url: Option<String>,

    /// Directory the PDF is written to
    #[arg(short = 'd', long, default_value = ".")]
    out_dir: PathBuf,

    /// Generation time (RFC 3339) instead of the current clock
    #[arg(long)]
    at: Option<DateTime<Utc>>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Shipment: {:?}", args.shipment);

    let config = match &args.config {
        Some(path) => LabelConfig::from_file(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => LabelConfig::default(),
    };

    let mut builder = LabelGenerator::builder().config(config);
    if let Some(url) = &args.base_url {
        builder = builder.deployment_base_url(url.clone());
    }
    let generator = builder.build().context("invalid generator configuration")?;

    let raw = fs::read_to_string(&args.shipment)
        .with_context(|| format!("reading shipment {:?}", args.shipment))?;
    let record: ShipmentRecord = serde_json::from_str(&raw)
        .with_context(|| format!("parsing shipment {:?}", args.shipment))?;

    let mut options = match &args.options {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading options {:?}", path))?;
            serde_json::from_str::<LabelOptions>(&raw)
                .with_context(|| format!("parsing options {:?}", path))?
        }
        None => LabelOptions::new(),
    };
    if let Some(path) = &args.logo {
        let logo = fs::read(path).with_context(|| format!("reading logo {:?}", path))?;
        options = options.with_company_logo(logo);
    }

    let label = match args.at {
        Some(at) => generator.generate_at(&record, &options, at),
        None => generator.generate(&record, &options),
    }
    .with_context(|| format!("generating label for order {}", record.order_id))?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {:?}", args.out_dir))?;
    let path = args.out_dir.join(&label.file_name);
    fs::write(&path, &label.bytes).with_context(|| format!("writing {:?}", path))?;

    info!(
        "Tracking id {} -> {} (sha256 {})",
        label.tracking_id,
        label.tracking_url,
        label.digest()
    );
    println!("{}", path.display());

    Ok(())
}
