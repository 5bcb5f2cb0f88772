//! # multipathd-exporter
//!
//! Prometheus exporter for the Linux device-mapper multipath daemon.
//!
//! Every scrape of the metrics endpoint runs `multipathd show maps json`
//! (or reads a saved report), decodes it and serves one-hot gauges for the
//! state of every path group and path:
//!
//! ```text
//! multipath_path_group_device_mapper_state{map,group,state}
//! multipath_path_device_mapper_state{map,group,target_wwnn,dev,state}
//! multipath_path_device_state{map,group,target_wwnn,dev,state}
//! multipath_path_checker_state{map,group,target_wwnn,dev,state}
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Serve on the default address, 0.0.0.0:10035
//! multipathd-exporter
//!
//! # Print one scrape of a saved report and exit
//! multipathd-exporter --status-file maps.json --once
//! ```
//!
//! This crate holds the pieces of the binary that are worth testing on
//! their own: [`settings`], [`shutdown`], [`build_collector`] and [`serve`].

pub mod settings;
pub mod shutdown;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use multipathd_collector::prometheus::PrometheusExporter;
use multipathd_collector::{Collector, CommandSource, FileSource, StatusSource};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use settings::{CommandSettings, Overrides, Settings};

/// Build the collector described by `settings`.
///
/// A configured status file wins over the command. The command is killed
/// once it outlives the scrape timeout.
pub fn build_collector(settings: &Settings) -> Collector {
    let source: Box<dyn StatusSource> = match &settings.status_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(
            CommandSource::new(
                settings.command.program.as_str(),
                settings.command.args.iter().map(String::as_str),
            )
            .with_timeout(settings.scrape_timeout()),
        ),
    };
    Collector::from_boxed(source)
}

/// Serve metrics until `shutdown` completes or the server fails.
pub async fn serve(
    settings: &Settings,
    collector: Collector,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let config = settings.prometheus_config();

    let listener = TcpListener::bind(config.listen_addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    let local_addr = listener
        .local_addr()
        .context("listener has no local address")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %local_addr,
        path = %config.metrics_path,
        source = collector.source().description(),
        "starting multipathd exporter"
    );

    let exporter = PrometheusExporter::new(config, Arc::new(collector));

    tokio::select! {
        result = exporter.serve(listener) => {
            result.map_err(|e| anyhow::anyhow!(e)).context("metrics server failed")?;
        }
        _ = shutdown => {}
    }

    info!("exporter stopped");
    Ok(())
}

/// Install the fmt subscriber on stderr.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_logging(default_level: &str) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
