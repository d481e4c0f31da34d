//! Core data types for Chronicle time-series queries
//!
//! This module defines the primitives shared by the command builders and
//! the reply decoders:
//! - `DataPoint`, `TimeSeries`, `LastDatapoint`: decoded query results
//! - `Label`: a name/value tag attached to a series
//! - `Timestamp`: a range bound, possibly a sentinel
//! - `ValueFilter`, `Aggregation`, `GroupBy`: optional query clauses
//! - `LabelSelection`: which labels a multi-series query returns

use crate::command::Arg;
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single sample returned by the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Sample time, millisecond resolution
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Sample value
    pub value: f64,
}

impl DataPoint {
    /// Create a data point from a millisecond epoch and a value
    ///
    /// Out-of-range timestamps fall back to the Unix epoch.
    pub fn from_millis(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp: DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default(),
            value,
        }
    }

    /// Sample time as a millisecond epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// A key/value tag attached to a series
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A series returned by a multi-series range query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Series key
    pub key: String,
    /// Labels, empty unless requested
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Samples in the requested direction
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
}

impl TimeSeries {
    /// Look up a label value by name
    pub fn label(&self, name: &str) -> Option<&str> {
        find_label(&self.labels, name)
    }
}

/// The last sample of a series, as returned by a multi-get
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastDatapoint {
    pub key: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub data_point: DataPoint,
}

impl LastDatapoint {
    /// Look up a label value by name
    pub fn label(&self, name: &str) -> Option<&str> {
        find_label(&self.labels, name)
    }
}

fn find_label<'a>(labels: &'a [Label], name: &str) -> Option<&'a str> {
    labels
        .iter()
        .find(|l| l.name == name)
        .map(|l| l.value.as_str())
}

/// A range bound or alignment point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Earliest sample available (`-`)
    Earliest,
    /// Latest sample available (`+`)
    Latest,
    /// A concrete instant
    At(DateTime<Utc>),
}

impl Timestamp {
    /// Create a timestamp from a millisecond epoch
    pub fn from_millis(timestamp_ms: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(timestamp_ms).map(Self::At)
    }

    /// Render as a command argument
    pub fn to_arg(&self) -> Arg {
        match self {
            Self::Earliest => Arg::from("-"),
            Self::Latest => Arg::from("+"),
            Self::At(dt) => Arg::Int(dt.timestamp_millis()),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::At(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Earliest => write!(f, "-"),
            Self::Latest => write!(f, "+"),
            Self::At(dt) => write!(f, "{}", dt.timestamp_millis()),
        }
    }
}

impl FromStr for Timestamp {
    type Err = ParseError;

    /// Accepts `-`, `+`, a millisecond epoch, or RFC 3339
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "-" => return Ok(Self::Earliest),
            "+" => return Ok(Self::Latest),
            _ => {}
        }

        if let Ok(ms) = s.parse::<i64>() {
            return Self::from_millis(ms).ok_or_else(|| ParseError::Timestamp(s.to_string()));
        }

        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::At(dt.with_timezone(&Utc)))
            .map_err(|_| ParseError::Timestamp(s.to_string()))
    }
}

/// Inclusive value bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueFilter {
    pub min: f64,
    pub max: f64,
}

impl ValueFilter {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Per-bucket reduction applied within a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    #[serde(rename = "avg")]
    Avg,
    #[serde(rename = "sum")]
    Sum,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "first")]
    First,
    #[serde(rename = "last")]
    Last,
    /// Population standard deviation
    #[serde(rename = "std.p")]
    StdP,
    /// Sample standard deviation
    #[serde(rename = "std.s")]
    StdS,
    /// Population variance
    #[serde(rename = "var.p")]
    VarP,
    /// Sample variance
    #[serde(rename = "var.s")]
    VarS,
    /// Time-weighted average
    #[serde(rename = "twa")]
    Twa,
}

impl AggregationType {
    /// All aggregation types, in declaration order
    pub fn all() -> &'static [AggregationType] {
        &[
            Self::Avg,
            Self::Sum,
            Self::Min,
            Self::Max,
            Self::Range,
            Self::Count,
            Self::First,
            Self::Last,
            Self::StdP,
            Self::StdS,
            Self::VarP,
            Self::VarS,
            Self::Twa,
        ]
    }

    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Range => "range",
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
            Self::StdP => "std.p",
            Self::StdS => "std.s",
            Self::VarP => "var.p",
            Self::VarS => "var.s",
            Self::Twa => "twa",
        }
    }
}

impl std::fmt::Display for AggregationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| ParseError::AggregationType(s.to_string()))
    }
}

/// Time-bucketed aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    pub kind: AggregationType,
    /// Bucket width, rendered in whole milliseconds
    pub bucket: chrono::Duration,
}

impl Aggregation {
    pub fn new(kind: AggregationType, bucket: chrono::Duration) -> Self {
        Self { kind, bucket }
    }
}

/// Cross-series reducer used with GROUPBY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReducerType {
    #[serde(rename = "avg")]
    Avg,
    #[serde(rename = "sum")]
    Sum,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "std.p")]
    StdP,
    #[serde(rename = "std.s")]
    StdS,
    #[serde(rename = "var.p")]
    VarP,
    #[serde(rename = "var.s")]
    VarS,
}

impl ReducerType {
    pub fn all() -> &'static [ReducerType] {
        &[
            Self::Avg,
            Self::Sum,
            Self::Min,
            Self::Max,
            Self::Range,
            Self::Count,
            Self::StdP,
            Self::StdS,
            Self::VarP,
            Self::VarS,
        ]
    }

    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Range => "range",
            Self::Count => "count",
            Self::StdP => "std.p",
            Self::StdS => "std.s",
            Self::VarP => "var.p",
            Self::VarS => "var.s",
        }
    }
}

impl std::fmt::Display for ReducerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReducerType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| ParseError::Reducer(s.to_string()))
    }
}

/// Group matched series by a label and reduce each group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy {
    pub label: String,
    pub reducer: ReducerType,
}

impl GroupBy {
    pub fn new(label: impl Into<String>, reducer: ReducerType) -> Self {
        Self {
            label: label.into(),
            reducer,
        }
    }
}

/// Which labels a multi-series query returns
///
/// `All` and `Only` are distinct from `Unset`: an empty name list asks for
/// every label, while never selecting asks for none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LabelSelection {
    /// No label clause; replies carry no labels
    #[default]
    Unset,
    /// `WITHLABELS`
    All,
    /// `SELECTED_LABELS name...`
    Only(Vec<String>),
}

impl LabelSelection {
    /// Map a name list to a selection: empty means every label
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self::All
        } else {
            Self::Only(names)
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}
