//! Prometheus exposition format support.
//!
//! Samples from the [`Collector`] are rendered in the Prometheus text-based
//! exposition format. With the `server` feature, [`PrometheusExporter`]
//! serves them over HTTP, running a fresh collection on every scrape.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use multipathd_collector::prometheus::{PrometheusConfig, PrometheusExporter};
//! use multipathd_collector::Collector;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PrometheusConfig::builder()
//!         .listen_addr("0.0.0.0:10035")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let exporter = PrometheusExporter::new(config, Arc::new(Collector::default()));
//!     let server = exporter.start_server();
//!
//!     // Metrics available at http://localhost:10035/metrics
//!     let _ = server.await;
//! }
//! ```

use std::fmt::Write;
#[cfg(feature = "server")]
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "server")]
use http_body_util::Full;
#[cfg(feature = "server")]
use hyper::body::Bytes;
#[cfg(feature = "server")]
use hyper::header::{HeaderValue, CONTENT_TYPE};
#[cfg(feature = "server")]
use hyper::server::conn::http1;
#[cfg(feature = "server")]
use hyper::service::service_fn;
#[cfg(feature = "server")]
use hyper::{Request, Response, StatusCode};
#[cfg(feature = "server")]
use hyper_util::rt::TokioIo;
#[cfg(feature = "server")]
use tokio::net::TcpListener;
#[cfg(feature = "server")]
use tracing::{debug, error, info, warn};

#[cfg(feature = "server")]
use crate::collector::Collector;
use crate::projector::{Family, Sample};

/// Default address the exporter listens on.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:10035";

/// Default path metrics are served under.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default metric name prefix.
pub const DEFAULT_NAMESPACE: &str = "multipath";

/// Default upper bound on one scrape.
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Configuration for the Prometheus metrics endpoint.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., "0.0.0.0:10035")
    pub listen_addr: String,
    /// Path for metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
    /// Prefix for all metric names
    pub namespace: String,
    /// Scrapes taking longer than this are answered with no samples
    pub scrape_timeout: Duration,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
    namespace: Option<String>,
    scrape_timeout: Option<Duration>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the metrics path.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Set the namespace prefix for all metrics.
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Set the scrape timeout.
    pub fn scrape_timeout(mut self, timeout: Duration) -> Self {
        self.scrape_timeout = Some(timeout);
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        PrometheusConfig {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            metrics_path: self
                .metrics_path
                .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string()),
            namespace: self
                .namespace
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            scrape_timeout: self.scrape_timeout.unwrap_or(DEFAULT_SCRAPE_TIMEOUT),
        }
    }
}

/// Format samples as Prometheus exposition format.
///
/// Every family gets its `HELP` and `TYPE` lines, even when it has no
/// samples. Samples are grouped by family and otherwise keep their order.
pub fn format_prometheus(samples: &[Sample], namespace: &str) -> String {
    let mut output = String::new();

    for &family in Family::ALL {
        let name = family.fq_name(namespace);

        // Writing to a String cannot fail
        let _ = writeln!(output, "# HELP {} {}", name, family.help());
        let _ = writeln!(output, "# TYPE {} gauge", name);

        for sample in samples.iter().filter(|s| s.family == family) {
            let labels = sample
                .labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                .collect::<Vec<_>>()
                .join(",");

            let _ = writeln!(output, "{}{{{}}} {}", name, labels, sample.value);
        }
    }

    output
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Prometheus exporter that serves freshly collected metrics over HTTP.
#[cfg(feature = "server")]
#[derive(Debug, Clone)]
pub struct PrometheusExporter {
    config: PrometheusConfig,
    collector: Arc<Collector>,
}

#[cfg(feature = "server")]
impl PrometheusExporter {
    /// Create a new Prometheus exporter.
    pub fn new(config: PrometheusConfig, collector: Arc<Collector>) -> Self {
        Self { config, collector }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// Run one collection and render it.
    ///
    /// This blocks while the status source runs.
    pub fn render(&self) -> String {
        format_prometheus(&self.collector.collect_or_empty(), &self.config.namespace)
    }

    /// Start the HTTP server to serve Prometheus metrics.
    ///
    /// This spawns a background task that listens for HTTP requests and serves
    /// metrics at the configured path. The server runs until the runtime shuts down
    /// or the returned handle is aborted.
    pub fn start_server(&self) -> tokio::task::JoinHandle<()> {
        let exporter = self.clone();

        tokio::spawn(async move {
            if let Err(e) = exporter.run_server().await {
                error!(error = %e, "prometheus server error");
            }
        })
    }

    async fn run_server(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(self.config.listen_addr.as_str()).await?;
        info!(
            addr = %listener.local_addr()?,
            path = %self.config.metrics_path,
            "serving metrics"
        );
        self.serve(listener).await
    }

    /// Serve requests on an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let exporter = Arc::new(self);

        loop {
            let (stream, peer) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let exporter = exporter.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let exporter = exporter.clone();
                    async move { exporter.handle_request(req).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(%peer, error = %e, "prometheus connection error");
                }
            });
        }
    }

    async fn handle_request(
        &self,
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Full<Bytes>>, std::convert::Infallible> {
        let path = req.uri().path();

        let response = if path == self.config.metrics_path {
            text_response(StatusCode::OK, TEXT_FORMAT, self.scrape().await)
        } else if path == "/health" || path == "/healthz" {
            text_response(StatusCode::OK, "text/plain", "OK".to_string())
        } else if path == "/" {
            text_response(
                StatusCode::OK,
                "text/html; charset=utf-8",
                landing_page(&self.config.metrics_path),
            )
        } else {
            text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string())
        };

        Ok(response)
    }

    /// Collect on the blocking pool, bounded by the scrape timeout.
    async fn scrape(&self) -> String {
        let collector = self.collector.clone();
        let task = tokio::task::spawn_blocking(move || collector.collect_or_empty());

        let samples = match tokio::time::timeout(self.config.scrape_timeout, task).await {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => {
                error!(error = %e, "scrape task failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.scrape_timeout,
                    "scrape timed out, serving no samples"
                );
                Vec::new()
            }
        };

        format_prometheus(&samples, &self.config.namespace)
    }
}

#[cfg(feature = "server")]
fn text_response(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(feature = "server")]
fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html>\n<head><title>Multipath Exporter</title></head>\n<body>\n\
         <h1>Multipath Exporter</h1>\n<p>Prometheus exporter for multipathd</p>\n\
         <p><a href=\"{0}\">{0}</a></p>\n</body>\n</html>\n",
        escape_html(metrics_path)
    )
}

#[cfg(feature = "server")]
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
