use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use multipathd_collector::prometheus::format_prometheus;
use multipathd_exporter::shutdown::shutdown_signal;
use multipathd_exporter::{build_collector, init_logging, serve, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "multipathd-exporter")]
#[command(about = "Prometheus exporter for device-mapper multipath status")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (e.g., 0.0.0.0:10035)
    #[arg(short, long)]
    listen_addr: Option<String>,

    /// Path metrics are served under
    #[arg(long)]
    metrics_path: Option<String>,

    /// Prefix for all metric names
    #[arg(short, long)]
    namespace: Option<String>,

    /// Read the status report from this file instead of running multipathd
    #[arg(short, long)]
    status_file: Option<PathBuf>,

    /// Print one scrape to stdout and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen_addr: self.listen_addr.clone(),
            metrics_path: self.metrics_path.clone(),
            namespace: self.namespace.clone(),
            status_file: self.status_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref(), &args.overrides())
        .context("failed to load settings")?;
    init_logging(&settings.log_level);

    let collector = build_collector(&settings);

    // Handle one-shot mode (no server)
    if args.once {
        let samples = collector.collect().context("scrape failed")?;
        print!("{}", format_prometheus(&samples, &settings.namespace));
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(&settings, collector, shutdown_signal()))
}
