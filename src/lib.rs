//! TRES Usage Library
//!
//! Turns line-oriented accounting reports into typed usage and limit records,
//! and translates those records between two component taxonomies.
//!
//! ## Architecture Overview
//!
//! - [`codec`] - unit-suffixed integers (`5K`, `10G`) and durations (`1-02:03:04.5`)
//! - [`parser`] - usage and association report lines
//! - [`report`] - whole-report parsing and per-account aggregation
//! - [`mapper`] - source/target component mapping with factor conversion
//! - [`models`] - shared data structures and serializable summaries
//! - [`config`] - TOML configuration with environment variable overrides
//! - [`logging`] - structured logging with JSON and pretty formats
//! - [`display`] - terminal and JSON output for the binary
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tres_usage::{ComponentConfig, ComponentMapper, ReportRecord, TresKeys, UsageLine};
//!
//! let keys = TresKeys::new(["cpu", "mem"]);
//! let line = UsageLine::parse("acctA|cpu=4,mem=2097152|00:10:00|userX", &keys)?;
//! assert_eq!(line.account(), "acctA");
//! assert_eq!(line.tres_usage()["cpu"], 40.0);
//!
//! let mut config = BTreeMap::new();
//! config.insert(
//!     "node_hours".to_string(),
//!     ComponentConfig::passthrough().with_target("gpu_hours", 5.0),
//! );
//! let mapper = ComponentMapper::from_config(&config)?;
//!
//! let mut limits = BTreeMap::new();
//! limits.insert("node_hours".to_string(), 100);
//! assert_eq!(mapper.convert_limits_to_target(&limits)["gpu_hours"], 500);
//! # Ok::<(), tres_usage::Error>(())
//! ```

pub mod codec;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod models;
pub mod parser;
pub mod report;

pub use codec::ScalarCodec;
pub use error::{Error, LineError, MapperError, Result, ScalarError};
pub use mapper::ComponentMapper;
pub use models::*;
pub use parser::{AssociationLine, ReportRecord, TresKeys, UsageLine};
