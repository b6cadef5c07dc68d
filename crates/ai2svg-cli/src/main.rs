//! Command-line interface for ai2svg.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai2svg::conversion::page_file_name;
use ai2svg::core::config::Environment;
use ai2svg::core::upload::validate_upload_name;
use ai2svg::{
    Converter, InkscapeConverter, PageConverter, ServiceConfig, StoredUpload, ensure_available, validate_path,
};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ai2svg", version, about = "Convert Adobe Illustrator files to per-page SVG documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the API server
    Serve {
        /// Address to bind to (overrides config and AI2SVG_HOST)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on (overrides config and AI2SVG_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert a local .ai file and write one SVG file per page
    Convert {
        /// Adobe Illustrator file to convert
        input: PathBuf,

        /// Directory the page-<n>.svg files are written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check whether Inkscape is available
    Check {
        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Serve { config, .. } | Commands::Convert { config, .. } | Commands::Check { config } => {
                config.as_deref()
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.command.config_path();
    let config = ServiceConfig::load(config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    init_tracing(config.environment);
    tracing::debug!(?config, "Effective configuration");

    match cli.command {
        Commands::Serve { host, port, .. } => serve(config, host, port).await,
        Commands::Convert { input, output, .. } => convert(config, &input, &output).await,
        Commands::Check { .. } => check(config).await,
    }
}

fn init_tracing(environment: Environment) {
    let default_filter = if environment.is_production() {
        "info"
    } else {
        "ai2svg=debug,tower_http=debug,info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if environment.is_production() {
        builder.with_ansi(false).with_target(false).init();
    } else {
        builder.init();
    }
}

async fn serve(mut config: ServiceConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    ai2svg::api::serve(config).await.context("Server failed")
}

async fn convert(config: ServiceConfig, input: &Path, output_dir: &Path) -> Result<()> {
    validate_upload_name(input.file_name().and_then(|name| name.to_str()))?;

    let converter: Arc<dyn Converter> = Arc::new(InkscapeConverter::from_config(&config.converter));

    let upload = StoredUpload::copy_from(input, config.uploads_dir(), config.max_upload_bytes())
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let outcome = convert_stored(&config, converter, upload.path()).await;
    upload.discard().await;
    let svgs = outcome?;

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for (index, svg) in svgs.iter().enumerate() {
        let path = output_dir.join(page_file_name(index));
        tokio::fs::write(&path, svg)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", path.display());
    }

    tracing::info!("Wrote {} page(s) to {}", svgs.len(), output_dir.display());
    Ok(())
}

async fn convert_stored(config: &ServiceConfig, converter: Arc<dyn Converter>, stored: &Path) -> Result<Vec<String>> {
    let input = validate_path(stored, &config.temp_dir).await?;
    ensure_available(converter.as_ref()).await?;

    let pages = PageConverter::from_config(converter, config);
    let result = tokio::time::timeout(config.request_timeout(), pages.convert(&input))
        .await
        .with_context(|| format!("Conversion timed out after {} seconds", config.request_timeout_secs))??;

    Ok(result.pages)
}

async fn check(config: ServiceConfig) -> Result<()> {
    let converter = InkscapeConverter::from_config(&config.converter);
    let status = converter.status().await;

    if status.available {
        println!("{}", status.message);
        println!("Executable: {}", converter.binary().display());
        return Ok(());
    }

    let guidance = converter.install_guidance();
    eprintln!("Install Inkscape:");
    eprintln!("  macOS:   {}", guidance.macos);
    eprintln!("  Linux:   {}", guidance.linux);
    eprintln!("  Windows: {}", guidance.windows);
    eprintln!("  Docker:  {}", guidance.docker);
    bail!("{}", status.message)
}
