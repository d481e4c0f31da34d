//! Query command builders
//!
//! Each builder holds the required parameters of one query shape plus an
//! optional field per clause. Options may be applied in any order and may
//! be re-applied (last writer wins); `args()` always renders them in the
//! store's fixed grammar order.
//!
//! - [`RangeCommand`]: `TS.RANGE` / `TS.REVRANGE`
//! - [`MRangeCommand`]: `TS.MRANGE` / `TS.MREVRANGE`
//! - [`GetCommand`], [`MGetCommand`]: `TS.GET` / `TS.MGET`
//!
//! # Example
//!
//! ```rust
//! use chronicle_rts::command::MRangeCommand;
//! use chronicle_rts::{AggregationType, Filter, ReducerType, Timestamp};
//!
//! let cmd = MRangeCommand::mrange(
//!     Timestamp::Earliest,
//!     Timestamp::Latest,
//!     vec![Filter::equal("region", "us")],
//! )
//! .group_by("host", ReducerType::Max)
//! .aggregation(AggregationType::Avg, chrono::Duration::minutes(1))
//! .with_labels(Vec::<String>::new());
//!
//! assert_eq!(
//!     cmd.to_string(),
//!     "TS.MRANGE - + WITHLABELS AGGREGATION avg 60000 FILTER region=us GROUPBY host REDUCE max"
//! );
//! ```

mod get;
mod mrange;
mod range;

pub use get::{GetCommand, MGetCommand};
pub use mrange::MRangeCommand;
pub use range::RangeCommand;

use crate::error::DecodeError;
use crate::reply::{DecodeMode, Reply};
use crate::types::{Aggregation, AggregationType, LabelSelection, Timestamp, ValueFilter};
use chrono::{DateTime, Utc};

pub const OPTION_FILTER_BY_TS: &str = "FILTER_BY_TS";
pub const OPTION_FILTER_BY_VALUE: &str = "FILTER_BY_VALUE";
pub const OPTION_WITH_LABELS: &str = "WITHLABELS";
pub const OPTION_SELECTED_LABELS: &str = "SELECTED_LABELS";
pub const OPTION_COUNT: &str = "COUNT";
pub const OPTION_ALIGN: &str = "ALIGN";
pub const OPTION_AGGREGATION: &str = "AGGREGATION";
pub const OPTION_FILTER: &str = "FILTER";
pub const OPTION_GROUP_BY: &str = "GROUPBY";
pub const OPTION_REDUCE: &str = "REDUCE";

/// A positional command argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Float(n)
    }
}

impl std::fmt::Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Str(s) => f.write_str(s),
            Arg::Int(n) => write!(f, "{}", n),
            Arg::Float(n) => write!(f, "{}", n),
        }
    }
}

/// A renderable query with a matching reply decoder
pub trait Command {
    /// Decoded result type
    type Output;

    /// Command name sent to the store
    fn name(&self) -> &'static str;

    /// Positional arguments in grammar order
    fn args(&self) -> Vec<Arg>;

    /// Decode the store's reply to this command
    fn decode(&self, reply: Reply, mode: DecodeMode) -> Result<Self::Output, DecodeError>;
}

/// Render `name arg...` on one line
pub(crate) fn fmt_command<C: Command>(cmd: &C, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(cmd.name())?;
    for arg in cmd.args() {
        write!(f, " {}", arg)?;
    }
    Ok(())
}

/// Optional clauses shared by the single- and multi-series range builders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeOptions {
    pub ts_filter: Vec<DateTime<Utc>>,
    pub value_filter: Option<ValueFilter>,
    pub count: Option<i64>,
    pub align: Option<Timestamp>,
    pub aggregation: Option<Aggregation>,
}

impl RangeOptions {
    pub fn set_ts_filter<I>(&mut self, timestamps: I)
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        self.ts_filter = timestamps.into_iter().collect();
    }

    pub fn set_value_filter(&mut self, min: f64, max: f64) {
        self.value_filter = Some(ValueFilter::new(min, max));
    }

    pub fn set_count(&mut self, count: i64) {
        self.count = Some(count);
    }

    pub fn set_align(&mut self, align: Timestamp) {
        self.align = Some(align);
    }

    pub fn set_aggregation(&mut self, kind: AggregationType, bucket: chrono::Duration) {
        self.aggregation = Some(Aggregation::new(kind, bucket));
    }

    /// `[FILTER_BY_TS ts...] [FILTER_BY_VALUE min max]`
    pub(crate) fn push_filters(&self, args: &mut Vec<Arg>) {
        if !self.ts_filter.is_empty() {
            args.push(OPTION_FILTER_BY_TS.into());
            args.extend(self.ts_filter.iter().map(|ts| Arg::Int(ts.timestamp_millis())));
        }
        if let Some(vf) = self.value_filter {
            args.push(OPTION_FILTER_BY_VALUE.into());
            args.push(Arg::Float(vf.min));
            args.push(Arg::Float(vf.max));
        }
    }

    /// `[COUNT n] [ALIGN ts] [AGGREGATION type bucketMs]`
    pub(crate) fn push_shaping(&self, args: &mut Vec<Arg>) {
        if let Some(count) = self.count {
            args.push(OPTION_COUNT.into());
            args.push(Arg::Int(count));
        }
        if let Some(align) = self.align {
            args.push(OPTION_ALIGN.into());
            args.push(align.to_arg());
        }
        if let Some(agg) = self.aggregation {
            args.push(OPTION_AGGREGATION.into());
            args.push(agg.kind.as_str().into());
            args.push(Arg::Int(agg.bucket.num_milliseconds()));
        }
    }
}

/// `[WITHLABELS | SELECTED_LABELS name...]`
pub(crate) fn push_labels(selection: &LabelSelection, args: &mut Vec<Arg>) {
    match selection {
        LabelSelection::Unset => {}
        LabelSelection::All => args.push(OPTION_WITH_LABELS.into()),
        LabelSelection::Only(names) => {
            args.push(OPTION_SELECTED_LABELS.into());
            args.extend(names.iter().map(|n| Arg::Str(n.clone())));
        }
    }
}

#[cfg(test)]
pub(crate) fn render(args: &[Arg]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
