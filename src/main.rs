use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use probectl::config::MonitorConfig;
use probectl::console;
use probectl::engine::Prober;

const OUTPUT_FILE: &str = "output.json";

#[derive(Parser)]
#[command(name = "probectl")]
#[command(about = "Run HTTP and TCP health checks once and report aggregate health")]
struct Cli {
    /// Monitoring file
    #[arg(long, default_value = "monitor.yml")]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    console::setup_console();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();

    let config = MonitorConfig::load(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;
    let checks = config.definitions()?;
    let prober = Prober::new(config.settings())?;

    let report = prober.run(&checks, console::print_result).await;

    if let Err(e) = report.write_json(OUTPUT_FILE) {
        error!("{:#}", e);
        return Err(e);
    }
    info!("Report written to {}", OUTPUT_FILE);

    Ok(ExitCode::from(report.exit_code()))
}
