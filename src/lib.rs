//! # Chronicle RTS
//!
//! Typed query client for the time-series store's range-query command
//! family: single-series ranges, multi-series ranges by label filter, and
//! last-value gets.
//!
//! ## Features
//!
//! - **Builders**: one per query shape, options applied in any order and
//!   always rendered in the store's grammar order
//! - **Decoders**: generic nested replies turned into `DataPoint`,
//!   `TimeSeries` and `LastDatapoint` records
//! - **Pluggable transport**: bring any connection that can run a named
//!   command with positional arguments
//!
//! ## Modules
//!
//! - [`command`]: Command builders and argument rendering
//! - [`reply`]: Reply model and decoders
//! - [`client`]: Transport seam and query client
//! - [`filter`]: Label filter expressions
//! - [`config`]: File and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chronicle_rts::*;
//!
//! # async fn run<T: Transport>(transport: T) -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(transport);
//!
//! // Hourly averages of one series over its whole history
//! let points = client
//!     .range(
//!         RangeCommand::range("temp:living-room", Timestamp::Earliest, Timestamp::Latest)
//!             .aggregation(AggregationType::Avg, chrono::Duration::hours(1)),
//!     )
//!     .await?;
//! println!("{} buckets", points.len());
//!
//! // Latest reading of every temperature sensor, with their region label
//! let latest = client
//!     .mget(MGetCommand::new(vec![Filter::equal("sensor", "temp")]).with_labels(["region"]))
//!     .await?;
//! for last in latest {
//!     println!("{} {:?} {}", last.key, last.label("region"), last.data_point.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod reply;
pub mod types;

pub use client::{Client, ClientConfig, Transport};
pub use command::{Arg, Command, GetCommand, MGetCommand, MRangeCommand, RangeCommand};
pub use error::{DecodeError, ParseError, QueryError, QueryResult};
pub use filter::Filter;
pub use reply::{DecodeMode, Reply};
pub use types::{
    Aggregation, AggregationType, DataPoint, GroupBy, Label, LabelSelection, LastDatapoint,
    ReducerType, TimeSeries, Timestamp, ValueFilter,
};

pub use config::{Config, ConfigError, LoggingConfig};
