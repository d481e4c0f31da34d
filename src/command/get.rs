//! Last-value queries (`TS.GET` / `TS.MGET`)

use super::{fmt_command, push_labels, Arg, Command, OPTION_FILTER};
use crate::error::DecodeError;
use crate::filter::Filter;
use crate::reply::{decode_data_point, decode_last_datapoints, DecodeMode, Reply};
use crate::types::{DataPoint, LabelSelection, LastDatapoint};

/// Last sample of one series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCommand {
    key: String,
}

impl GetCommand {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Command for GetCommand {
    type Output = DataPoint;

    fn name(&self) -> &'static str {
        "TS.GET"
    }

    fn args(&self) -> Vec<Arg> {
        vec![Arg::Str(self.key.clone())]
    }

    fn decode(&self, reply: Reply, mode: DecodeMode) -> Result<Self::Output, DecodeError> {
        decode_data_point(reply, mode)
    }
}

impl std::fmt::Display for GetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_command(self, f)
    }
}

/// Last sample of every series matching a filter set
///
/// Renders `[WITHLABELS | SELECTED_LABELS name...] FILTER filter...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MGetCommand {
    filters: Vec<Filter>,
    labels: LabelSelection,
}

impl MGetCommand {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            labels: LabelSelection::Unset,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn label_selection(&self) -> &LabelSelection {
        &self.labels
    }

    /// Return labels: every label when `names` is empty, otherwise only these
    pub fn with_labels<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels(LabelSelection::from_names(names))
    }

    pub fn labels(mut self, selection: LabelSelection) -> Self {
        self.labels = selection;
        self
    }
}

impl Command for MGetCommand {
    type Output = Vec<LastDatapoint>;

    fn name(&self) -> &'static str {
        "TS.MGET"
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = Vec::with_capacity(self.filters.len() + 2);
        push_labels(&self.labels, &mut args);
        args.push(OPTION_FILTER.into());
        args.extend(self.filters.iter().map(|f| Arg::Str(f.to_string())));
        args
    }

    fn decode(&self, reply: Reply, mode: DecodeMode) -> Result<Self::Output, DecodeError> {
        decode_last_datapoints(reply, mode)
    }
}

impl std::fmt::Display for MGetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_command(self, f)
    }
}
