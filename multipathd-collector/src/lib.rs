//! # multipathd-collector
//!
//! Turns the status report of the multipath daemon into Prometheus gauges.
//!
//! A scrape runs three stages, with nothing kept between scrapes:
//!
//! 1. A [`StatusSource`] produces the raw `multipathd show maps json` report
//!    ([`CommandSource`] runs the daemon client, [`FileSource`] reads a saved
//!    report).
//! 2. [`decode_status`] parses it into a [`Status`] tree.
//! 3. [`project`] flattens the tree into one-hot [`Sample`]s: one sample per
//!    known state value, `1` for the current state and `0` for the rest.
//!
//! The [`prometheus`] module renders samples in the text exposition format
//! and, with the `server` feature (on by default), serves them over HTTP.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multipathd_collector::prometheus::format_prometheus;
//! use multipathd_collector::{Collector, FileSource};
//!
//! let collector = Collector::new(FileSource::new("maps.json"));
//! let samples = collector.collect()?;
//! print!("{}", format_prometheus(&samples, "multipath"));
//! # Ok::<(), multipathd_collector::CollectError>(())
//! ```

// Nested `json!` fixtures in the tests need more than the default depth
#![recursion_limit = "256"]

pub mod error;
pub mod prometheus;

mod collector;
mod projector;
mod source;

pub use collector::{decode_status, Collector};
pub use error::{CollectError, DecodeError, FetchError};
pub use projector::{project, Family, Sample, STATE_LABEL};
pub use source::{CommandSource, FileSource, StatusSource, DEFAULT_ARGS, DEFAULT_PROGRAM};

// Re-export the report model for convenience
pub use multipathd_types::{self, Map, Path, PathGroup, Status};
