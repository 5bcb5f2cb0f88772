//! Layered runtime settings.
//!
//! Lowest to highest precedence: built-in defaults, an optional TOML file,
//! `MULTIPATHD_EXPORTER_*` environment variables, then command-line flags.
//!
//! ```toml
//! listen_addr = "0.0.0.0:10035"
//! metrics_path = "/metrics"
//! namespace = "multipath"
//! scrape_timeout_secs = 10
//! log_level = "info"
//!
//! [command]
//! program = "multipathd"
//! args = ["show", "maps", "json"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use multipathd_collector::prometheus::{
    PrometheusConfig, DEFAULT_LISTEN_ADDR, DEFAULT_METRICS_PATH, DEFAULT_NAMESPACE,
    DEFAULT_SCRAPE_TIMEOUT,
};
use multipathd_collector::{DEFAULT_ARGS, DEFAULT_PROGRAM};
use serde::Deserialize;

/// Prefix of the environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "MULTIPATHD_EXPORTER";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listen_addr: String,
    pub metrics_path: String,
    pub namespace: String,
    pub scrape_timeout_secs: u64,
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub command: CommandSettings,
    /// Read this file instead of running the daemon client.
    pub status_file: Option<PathBuf>,
}

/// The program queried for status, and its arguments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub program: String,
    pub args: Vec<String>,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen_addr: Option<String>,
    pub metrics_path: Option<String>,
    pub namespace: Option<String>,
    pub status_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            scrape_timeout_secs: DEFAULT_SCRAPE_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
            command: CommandSettings::default(),
            status_file: None,
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file, the process environment and
    /// command-line overrides.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_env(file, environment(), overrides)
    }

    fn load_with_env(
        file: Option<&Path>,
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(env)
            .set_override_option("listen_addr", overrides.listen_addr.clone())?
            .set_override_option("metrics_path", overrides.metrics_path.clone())?
            .set_override_option("namespace", overrides.namespace.clone())?
            .set_override_option(
                "status_file",
                overrides
                    .status_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .build()?
            .try_deserialize()
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    /// HTTP endpoint settings for the exporter.
    pub fn prometheus_config(&self) -> PrometheusConfig {
        PrometheusConfig::builder()
            .listen_addr(self.listen_addr.as_str())
            .metrics_path(self.metrics_path.as_str())
            .namespace(self.namespace.as_str())
            .scrape_timeout(self.scrape_timeout())
            .build()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, env(&[]), &Overrides::default()).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.listen_addr, "0.0.0.0:10035");
        assert_eq!(settings.command.program, "multipathd");
        assert_eq!(settings.command.args, ["show", "maps", "json"]);
        assert_eq!(settings.scrape_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_file_layer() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
namespace = "storage"
scrape_timeout_secs = 3

[command]
program = "/usr/sbin/multipathd"
args = ["-k", "show maps json"]
"#
        )
        .unwrap();

        let settings =
            Settings::load_with_env(Some(file.path()), env(&[]), &Overrides::default()).unwrap();

        assert_eq!(settings.namespace, "storage");
        assert_eq!(settings.scrape_timeout_secs, 3);
        assert_eq!(settings.command.program, "/usr/sbin/multipathd");
        assert_eq!(settings.command.args, ["-k", "show maps json"]);
        // untouched keys keep their defaults
        assert_eq!(settings.metrics_path, "/metrics");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "namespace = \"storage\"\nlisten_addr = \"127.0.0.1:9000\"").unwrap();

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("MULTIPATHD_EXPORTER_NAMESPACE", "san"),
                ("MULTIPATHD_EXPORTER_SCRAPE_TIMEOUT_SECS", "5"),
                ("MULTIPATHD_EXPORTER_COMMAND__PROGRAM", "/opt/bin/multipathd"),
            ]),
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.namespace, "san");
        assert_eq!(settings.listen_addr, "127.0.0.1:9000");
        assert_eq!(settings.scrape_timeout_secs, 5);
        assert_eq!(settings.command.program, "/opt/bin/multipathd");
    }

    #[test]
    fn test_cli_overrides_everything() {
        let overrides = Overrides {
            listen_addr: Some("[::1]:10035".to_string()),
            namespace: Some("cli".to_string()),
            status_file: Some(PathBuf::from("/tmp/maps.json")),
            ..Default::default()
        };

        let settings = Settings::load_with_env(
            None,
            env(&[("MULTIPATHD_EXPORTER_NAMESPACE", "env")]),
            &overrides,
        )
        .unwrap();

        assert_eq!(settings.listen_addr, "[::1]:10035");
        assert_eq!(settings.namespace, "cli");
        assert_eq!(settings.status_file, Some(PathBuf::from("/tmp/maps.json")));
        assert_eq!(settings.metrics_path, "/metrics");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load_with_env(
            Some(Path::new("/nonexistent/exporter.toml")),
            env(&[]),
            &Overrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_prometheus_config() {
        let settings = Settings {
            metrics_path: "/probe".to_string(),
            scrape_timeout_secs: 2,
            ..Default::default()
        };

        let config = settings.prometheus_config();
        assert_eq!(config.metrics_path, "/probe");
        assert_eq!(config.namespace, "multipath");
        assert_eq!(config.scrape_timeout, Duration::from_secs(2));
    }
}
