//! The Collector: fetch, decode and project one report per call.

use multipathd_types::Status;
use tracing::{debug, error};

use crate::error::{CollectError, DecodeError};
use crate::projector::{project, Sample};
use crate::source::{CommandSource, StatusSource};

/// Decode a raw report.
///
/// Malformed JSON, or a required field that is missing or mistyped, fails
/// the whole report; no partial tree is returned.
pub fn decode_status(bytes: &[u8]) -> Result<Status, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Turns a [`StatusSource`] into gauge samples.
///
/// Nothing is cached: every call fetches a fresh report, so concurrent
/// scrapes are independent of each other.
///
/// # Example
///
/// ```rust,no_run
/// use multipathd_collector::{Collector, CommandSource};
///
/// let collector = Collector::new(CommandSource::default());
/// for sample in collector.collect_or_empty() {
///     println!("{:?} {:?} {}", sample.family, sample.labels, sample.value);
/// }
/// ```
#[derive(Debug)]
pub struct Collector {
    source: Box<dyn StatusSource>,
}

impl Collector {
    /// Create a collector reading from `source`.
    pub fn new(source: impl StatusSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Create a collector from an already boxed source.
    pub fn from_boxed(source: Box<dyn StatusSource>) -> Self {
        Self { source }
    }

    /// The source this collector reads from.
    pub fn source(&self) -> &dyn StatusSource {
        self.source.as_ref()
    }

    /// Fetch and decode the current report.
    pub fn snapshot(&self) -> Result<Status, CollectError> {
        let bytes = self.source.fetch()?;
        let status = decode_status(&bytes)?;

        debug!(
            source = self.source.description(),
            bytes = bytes.len(),
            maps = status.len(),
            paths = status.path_count(),
            "decoded multipathd status"
        );

        Ok(status)
    }

    /// Fetch, decode and project the current report.
    pub fn collect(&self) -> Result<Vec<Sample>, CollectError> {
        let status = self.snapshot()?;
        Ok(project(&status))
    }

    /// Like [`collect`](Self::collect), but a failed scrape is logged and
    /// yields no samples.
    pub fn collect_or_empty(&self) -> Vec<Sample> {
        match self.collect() {
            Ok(samples) => samples,
            Err(e) => {
                error!(source = self.source.description(), error = %e, "scrape failed");
                Vec::new()
            }
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(CommandSource::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::projector::{Family, STATE_LABEL};
    use crate::source::FileSource;

    const FIXTURE: &str = include_str!("../testdata/maps.json");

    /// Hands back fixed bytes.
    #[derive(Debug)]
    struct StaticSource(Vec<u8>);

    impl StatusSource for StaticSource {
        fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            Ok(self.0.clone())
        }

        fn description(&self) -> &str {
            "static"
        }
    }

    #[derive(Debug)]
    struct FailingSource;

    impl StatusSource for FailingSource {
        fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Spawn {
                program: "multipathd".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        }

        fn description(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_decode_fixture() {
        let status = decode_status(FIXTURE.as_bytes()).unwrap();
        assert_eq!(status.len(), 2);
        assert_eq!(status.path_count(), 6);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode_status(b"not json").is_err());
        assert!(decode_status(b"{\"major_version\": \"0\", \"minor_version\": 1}").is_err());
        // collections are required, not defaulted
        assert!(decode_status(b"{\"major_version\": 0, \"minor_version\": 1}").is_err());
    }

    #[test]
    fn test_collect_fixture() {
        let collector = Collector::new(StaticSource(FIXTURE.as_bytes().to_vec()));
        let samples = collector.collect().unwrap();

        // map 1: group 1 active with 2 paths, group 2 enabled with 2 paths
        // map 2: one group with 2 paths
        let lit: Vec<&Sample> = samples
            .iter()
            .filter(|s| s.family == Family::PathDeviceMapperState && s.value == 1.0)
            .collect();
        assert_eq!(lit.len(), 6);

        let sdc_failed = samples.iter().find(|s| {
            s.family == Family::PathDeviceMapperState
                && s.label("dev") == Some("sdc")
                && s.label(STATE_LABEL) == Some("failed")
        });
        assert_eq!(sdc_failed.map(|s| s.value), Some(1.0));
    }

    #[test]
    fn test_end_to_end_active_map() {
        let collector = Collector::new(StaticSource(FIXTURE.as_bytes().to_vec()));
        let samples = collector.collect().unwrap();

        let for_dev = |state: &str| {
            samples
                .iter()
                .find(|s| {
                    s.family == Family::PathDeviceMapperState
                        && s.label("dev") == Some("sdag")
                        && s.label(STATE_LABEL) == Some(state)
                })
                .map(|s| s.value)
        };

        assert_eq!(for_dev("active"), Some(1.0));
        assert_eq!(for_dev("failed"), Some(0.0));
        assert_eq!(for_dev("undef"), Some(0.0));
    }

    #[test]
    fn test_fetch_error_is_terminal() {
        let collector = Collector::new(FailingSource);
        assert!(matches!(collector.collect(), Err(CollectError::Fetch(_))));
        assert!(collector.collect_or_empty().is_empty());
    }

    #[test]
    fn test_decode_error_is_terminal() {
        let collector = Collector::new(StaticSource(b"{\"maps\": [".to_vec()));
        assert!(matches!(collector.collect(), Err(CollectError::Decode(_))));
        assert!(collector.collect_or_empty().is_empty());
    }

    #[test]
    fn test_collect_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let collector = Collector::new(FileSource::new(&path));
        assert_eq!(collector.snapshot().unwrap().len(), 2);
        assert_eq!(collector.source().description(), format!("file: {}", path.display()));
    }

    #[test]
    fn test_repeated_collection_is_identical() {
        let collector = Collector::new(StaticSource(FIXTURE.as_bytes().to_vec()));
        assert_eq!(collector.collect().unwrap(), collector.collect().unwrap());
    }
}
