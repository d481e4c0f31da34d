//! Single-series range queries (`TS.RANGE` / `TS.REVRANGE`)

use super::{fmt_command, Arg, Command, RangeOptions};
use crate::error::DecodeError;
use crate::reply::{decode_data_points, DecodeMode, Reply};
use crate::types::{AggregationType, DataPoint, Timestamp};
use chrono::{DateTime, Utc};

const NAME_RANGE: &str = "TS.RANGE";
const NAME_REV_RANGE: &str = "TS.REVRANGE";

/// Builder for a single-series range query
///
/// Renders `key from to [FILTER_BY_TS ts...] [FILTER_BY_VALUE min max]
/// [COUNT n] [ALIGN ts] [AGGREGATION type bucketMs]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCommand {
    name: &'static str,
    key: String,
    from: Timestamp,
    to: Timestamp,
    options: RangeOptions,
}

impl RangeCommand {
    /// Query samples in forward (chronological) order
    pub fn range(key: impl Into<String>, from: Timestamp, to: Timestamp) -> Self {
        Self::new(NAME_RANGE, key.into(), from, to)
    }

    /// Query samples in reverse order
    pub fn rev_range(key: impl Into<String>, from: Timestamp, to: Timestamp) -> Self {
        Self::new(NAME_REV_RANGE, key.into(), from, to)
    }

    fn new(name: &'static str, key: String, from: Timestamp, to: Timestamp) -> Self {
        Self {
            name,
            key,
            from,
            to,
            options: RangeOptions::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_reverse(&self) -> bool {
        self.name == NAME_REV_RANGE
    }

    pub fn options(&self) -> &RangeOptions {
        &self.options
    }

    /// Replace every shared range clause at once
    pub fn with_options(mut self, options: RangeOptions) -> Self {
        self.options = options;
        self
    }

    /// Restrict to samples at exactly these timestamps
    pub fn filter_by_ts<I>(mut self, timestamps: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        self.options.set_ts_filter(timestamps);
        self
    }

    /// Restrict to samples with `min <= value <= max`
    pub fn filter_by_value(mut self, min: f64, max: f64) -> Self {
        self.options.set_value_filter(min, max);
        self
    }

    /// Cap the number of returned samples (or buckets when aggregating)
    pub fn count(mut self, count: i64) -> Self {
        self.options.set_count(count);
        self
    }

    /// Bucket alignment point for aggregation
    pub fn align(mut self, align: Timestamp) -> Self {
        self.options.set_align(align);
        self
    }

    /// Aggregate samples into buckets of `bucket` width
    pub fn aggregation(mut self, kind: AggregationType, bucket: chrono::Duration) -> Self {
        self.options.set_aggregation(kind, bucket);
        self
    }
}

impl Command for RangeCommand {
    type Output = Vec<DataPoint>;

    fn name(&self) -> &'static str {
        self.name
    }

    fn args(&self) -> Vec<Arg> {
        let mut args = vec![
            Arg::Str(self.key.clone()),
            self.from.to_arg(),
            self.to.to_arg(),
        ];
        self.options.push_filters(&mut args);
        self.options.push_shaping(&mut args);
        args
    }

    fn decode(&self, reply: Reply, mode: DecodeMode) -> Result<Self::Output, DecodeError> {
        decode_data_points(reply, mode)
    }
}

impl std::fmt::Display for RangeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_command(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::render;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_bare_range_renders_required_only() {
        let cmd = RangeCommand::range("temp:1", Timestamp::Earliest, Timestamp::Latest);
        assert_eq!(cmd.name(), "TS.RANGE");
        assert_eq!(render(&cmd.args()), vec!["temp:1", "-", "+"]);

        let cmd = RangeCommand::range(
            "temp:1",
            Timestamp::from_millis(1000).unwrap(),
            Timestamp::from_millis(2000).unwrap(),
        );
        assert_eq!(
            cmd.args(),
            vec![Arg::from("temp:1"), Arg::Int(1000), Arg::Int(2000)]
        );
    }

    #[test]
    fn test_rev_range_name() {
        let cmd = RangeCommand::rev_range("temp:1", Timestamp::Earliest, Timestamp::Latest);
        assert_eq!(cmd.name(), "TS.REVRANGE");
        assert!(cmd.is_reverse());
        assert_eq!(render(&cmd.args()), vec!["temp:1", "-", "+"]);
    }

    #[test]
    fn test_all_options_render_in_grammar_order() {
        // Applied in reverse of the grammar order
        let cmd = RangeCommand::range("temp:1", Timestamp::Earliest, Timestamp::Latest)
            .aggregation(AggregationType::Max, chrono::Duration::seconds(5))
            .align(Timestamp::from_millis(500).unwrap())
            .count(10)
            .filter_by_value(1.5, 9.0)
            .filter_by_ts([ts(1000), ts(2000)]);

        assert_eq!(
            cmd.to_string(),
            "TS.RANGE temp:1 - + FILTER_BY_TS 1000 2000 FILTER_BY_VALUE 1.5 9 \
             COUNT 10 ALIGN 500 AGGREGATION max 5000"
        );
    }

    #[test]
    fn test_align_sentinel() {
        let cmd = RangeCommand::range("temp:1", Timestamp::Earliest, Timestamp::Latest)
            .align(Timestamp::Earliest);
        assert_eq!(render(&cmd.args()), vec!["temp:1", "-", "+", "ALIGN", "-"]);
    }

    #[test]
    fn test_reapplied_option_last_writer_wins() {
        let cmd = RangeCommand::range("temp:1", Timestamp::Earliest, Timestamp::Latest)
            .count(10)
            .count(20);
        assert_eq!(render(&cmd.args()), vec!["temp:1", "-", "+", "COUNT", "20"]);

        let cmd = RangeCommand::range("temp:1", Timestamp::Earliest, Timestamp::Latest)
            .filter_by_ts([ts(1000), ts(2000)])
            .filter_by_ts([ts(3000)]);
        assert_eq!(
            render(&cmd.args()),
            vec!["temp:1", "-", "+", "FILTER_BY_TS", "3000"]
        );
    }

    #[test]
    fn test_decode_uses_data_point_list() {
        let cmd = RangeCommand::range("temp:1", Timestamp::Earliest, Timestamp::Latest);
        let reply = Reply::Array(vec![Reply::Array(vec![
            Reply::Integer(1000),
            Reply::String("3.5".into()),
        ])]);

        let points = cmd.decode(reply, DecodeMode::Lenient).unwrap();
        assert_eq!(points, vec![DataPoint::from_millis(1000, 3.5)]);
    }
}
