//! Multi-series range queries (`TS.MRANGE` / `TS.MREVRANGE`)

use super::{
    fmt_command, push_labels, Arg, Command, RangeOptions, OPTION_FILTER, OPTION_GROUP_BY,
    OPTION_REDUCE,
};
use crate::error::DecodeError;
use crate::filter::Filter;
use crate::reply::{decode_time_series_list, DecodeMode, Reply};
use crate::types::{AggregationType, GroupBy, LabelSelection, ReducerType, TimeSeries, Timestamp};
use chrono::{DateTime, Utc};

const NAME_MRANGE: &str = "TS.MRANGE";
const NAME_MREV_RANGE: &str = "TS.MREVRANGE";

/// Builder for a range query across every series matching a filter set
///
/// Renders `from to [FILTER_BY_TS ts...] [FILTER_BY_VALUE min max]
/// [WITHLABELS | SELECTED_LABELS name...] [COUNT n] [ALIGN ts]
/// [AGGREGATION type bucketMs] FILTER filter... [GROUPBY label REDUCE reducer]`.
///
/// The filter set is not validated here; an empty set is rejected by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MRangeCommand {
    name: &'static str,
    from: Timestamp,
    to: Timestamp,
    filters: Vec<Filter>,
    options: RangeOptions,
    labels: LabelSelection,
    group_by: Option<GroupBy>,
}

impl MRangeCommand {
    /// Query matching series in forward order
    pub fn mrange(from: Timestamp, to: Timestamp, filters: Vec<Filter>) -> Self {
        Self::new(NAME_MRANGE, from, to, filters)
    }

    /// Query matching series in reverse order
    pub fn mrev_range(from: Timestamp, to: Timestamp, filters: Vec<Filter>) -> Self {
        Self::new(NAME_MREV_RANGE, from, to, filters)
    }

    fn new(name: &'static str, from: Timestamp, to: Timestamp, filters: Vec<Filter>) -> Self {
        Self {
            name,
            from,
            to,
            filters,
            options: RangeOptions::default(),
            labels: LabelSelection::Unset,
            group_by: None,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn label_selection(&self) -> &LabelSelection {
        &self.labels
    }

    pub fn is_reverse(&self) -> bool {
        self.name == NAME_MREV_RANGE
    }

    /// Replace every shared range clause at once
    pub fn with_options(mut self, options: RangeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn filter_by_ts<I>(mut self, timestamps: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        self.options.set_ts_filter(timestamps);
        self
    }

    pub fn filter_by_value(mut self, min: f64, max: f64) -> Self {
        self.options.set_value_filter(min, max);
        self
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

    pub fn count(mut self, count: i64) -> Self {
        self.options.set_count(count);
        self
    }

    pub fn align(mut self, align: Timestamp) -> Self {
        self.options.set_align(align);
        self
    }

    pub fn aggregation(mut self, kind: AggregationType, bucket: chrono::Duration) -> Self {
        self.options.set_aggregation(kind, bucket);
        self
    }

    /// Group matched series by `label` and reduce each group with `reducer`
    pub fn group_by(mut self, label: impl Into<String>, reducer: ReducerType) -> Self {
        self.group_by = Some(GroupBy::new(label, reducer));
        self
    }
}

impl Command for MRangeCommand {
    type Output = Vec<TimeSeries>;

    fn name(&self) -> &'static str {
        self.name
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = vec![self.from.to_arg(), self.to.to_arg()];
        self.options.push_filters(&mut args);
        push_labels(&self.labels, &mut args);
        self.options.push_shaping(&mut args);

        args.push(OPTION_FILTER.into());
        args.extend(self.filters.iter().map(|f| Arg::Str(f.to_string())));

        if let Some(group_by) = &self.group_by {
            args.push(OPTION_GROUP_BY.into());
            args.push(Arg::Str(group_by.label.clone()));
            args.push(OPTION_REDUCE.into());
            args.push(group_by.reducer.as_str().into());
        }
        args
    }

    fn decode(&self, reply: Reply, mode: DecodeMode) -> Result<Self::Output, DecodeError> {
        decode_time_series_list(reply, mode)
    }
}

impl std::fmt::Display for MRangeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_command(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::render;

    fn base() -> MRangeCommand {
        MRangeCommand::mrange(
            Timestamp::Earliest,
            Timestamp::Latest,
            vec![Filter::equal("sensor", "temp")],
        )
    }

    #[test]
    fn test_bare_mrange() {
        let cmd = base();
        assert_eq!(cmd.name(), "TS.MRANGE");
        assert_eq!(cmd.filters(), &[Filter::equal("sensor", "temp")]);
        assert_eq!(render(&cmd.args()), vec!["-", "+", "FILTER", "sensor=temp"]);
    }

    #[test]
    fn test_mrev_range_name() {
        let cmd = MRangeCommand::mrev_range(
            Timestamp::Earliest,
            Timestamp::Latest,
            vec![Filter::equal("sensor", "temp")],
        );
        assert_eq!(cmd.name(), "TS.MREVRANGE");
        assert!(cmd.is_reverse());
    }

    #[test]
    fn test_label_selection_renderings_are_distinct() {
        let unset = render(&base().args());
        let all = render(&base().with_labels(Vec::<String>::new()).args());
        let only = render(&base().with_labels(["region", "host"]).args());

        assert_eq!(all, vec!["-", "+", "WITHLABELS", "FILTER", "sensor=temp"]);
        assert_eq!(
            only,
            vec!["-", "+", "SELECTED_LABELS", "region", "host", "FILTER", "sensor=temp"]
        );
        assert!(!unset.iter().any(|a| a == "WITHLABELS" || a == "SELECTED_LABELS"));

        assert_ne!(unset, all);
        assert_ne!(unset, only);
        assert_ne!(all, only);
    }

    #[test]
    fn test_filter_clause_position_independent_of_application_order() {
        let expected = vec![
            "-",
            "+",
            "FILTER_BY_TS",
            "1000",
            "FILTER_BY_VALUE",
            "0",
            "100",
            "WITHLABELS",
            "COUNT",
            "5",
            "ALIGN",
            "+",
            "AGGREGATION",
            "sum",
            "60000",
            "FILTER",
            "sensor=temp",
            "region!=(eu)",
            "GROUPBY",
            "region",
            "REDUCE",
            "sum",
        ];

        let filters = vec![Filter::equal("sensor", "temp"), Filter::none_of("region", ["eu"])];
        let ts = DateTime::from_timestamp_millis(1000).unwrap();

        let forward = MRangeCommand::mrange(Timestamp::Earliest, Timestamp::Latest, filters.clone())
            .filter_by_ts([ts])
            .filter_by_value(0.0, 100.0)
            .with_labels(Vec::<String>::new())
            .count(5)
            .align(Timestamp::Latest)
            .aggregation(AggregationType::Sum, chrono::Duration::minutes(1))
            .group_by("region", ReducerType::Sum);

        let shuffled = MRangeCommand::mrange(Timestamp::Earliest, Timestamp::Latest, filters)
            .group_by("region", ReducerType::Sum)
            .aggregation(AggregationType::Sum, chrono::Duration::minutes(1))
            .count(5)
            .with_labels(Vec::<String>::new())
            .align(Timestamp::Latest)
            .filter_by_value(0.0, 100.0)
            .filter_by_ts([ts]);

        assert_eq!(render(&forward.args()), expected);
        assert_eq!(render(&shuffled.args()), expected);
    }

    #[test]
    fn test_reapplied_labels_last_writer_wins() {
        let cmd = base().with_labels(["region"]).with_labels(Vec::<String>::new());
        assert_eq!(cmd.label_selection(), &LabelSelection::All);

        let cmd = base().with_labels(["region"]).labels(LabelSelection::Unset);
        assert_eq!(render(&cmd.args()), vec!["-", "+", "FILTER", "sensor=temp"]);
    }

    #[test]
    fn test_empty_filter_set_still_emits_filter_token() {
        let cmd = MRangeCommand::mrange(Timestamp::Earliest, Timestamp::Latest, vec![]);
        assert_eq!(render(&cmd.args()), vec!["-", "+", "FILTER"]);
    }
}
