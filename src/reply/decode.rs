//! Reply decoders
//!
//! One decoder per result shape:
//!
//! ```text
//! data point      [timestampMs, value]
//! range reply     [[timestampMs, value], ...]
//! series          [key, [[name, value], ...], [[timestampMs, value], ...]]
//! last datapoint  [key, [[name, value], ...], [timestampMs, value]]
//! ```
//!
//! A reply that is not the expected array decodes to the empty or zero
//! value for that slot. `DecodeMode` only governs scalars that are present
//! but unparsable.

use super::Reply;
use crate::error::DecodeError;
use crate::types::{DataPoint, Label, LastDatapoint, TimeSeries};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How to treat sample timestamps and values that fail to parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Substitute zero
    #[default]
    Lenient,
    /// Fail with a `DecodeError`
    Strict,
}

impl DecodeMode {
    pub fn is_strict(&self) -> bool {
        matches!(self, DecodeMode::Strict)
    }
}

impl std::fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeMode::Lenient => write!(f, "lenient"),
            DecodeMode::Strict => write!(f, "strict"),
        }
    }
}

/// Decode `[timestampMs, value]`
pub fn decode_data_point(reply: Reply, mode: DecodeMode) -> Result<DataPoint, DecodeError> {
    let kind = reply.kind();
    let mut items = reply.into_array().unwrap_or_default().into_iter();

    let (Some(timestamp), Some(value)) = (items.next(), items.next()) else {
        tracing::trace!(kind, "Data point reply is not a pair, using zero value");
        return Ok(DataPoint::default());
    };

    let timestamp = decode_timestamp(timestamp, mode)?;
    let value = decode_value(value, mode)?;
    Ok(DataPoint { timestamp, value })
}

/// Decode `[[timestampMs, value], ...]`
pub fn decode_data_points(reply: Reply, mode: DecodeMode) -> Result<Vec<DataPoint>, DecodeError> {
    match reply {
        Reply::Array(items) => items
            .into_iter()
            .map(|item| decode_data_point(item, mode))
            .collect(),
        other => {
            tracing::debug!(kind = other.kind(), "Expected a sample list, decoding as empty");
            Ok(Vec::new())
        }
    }
}

/// Decode `[[name, value], ...]`
///
/// Anything but an array (labels not requested) yields no labels.
pub fn decode_labels(reply: Reply) -> Vec<Label> {
    let Reply::Array(items) = reply else {
        return Vec::new();
    };

    items
        .into_iter()
        .map(|item| {
            let mut pair = item.into_array().unwrap_or_default().into_iter();
            Label {
                name: pair.next().and_then(Reply::into_text).unwrap_or_default(),
                value: pair.next().and_then(Reply::into_text).unwrap_or_default(),
            }
        })
        .collect()
}

/// Decode `[key, labels, [[timestampMs, value], ...]]`
pub fn decode_time_series(reply: Reply, mode: DecodeMode) -> Result<TimeSeries, DecodeError> {
    let mut items = reply.into_array().unwrap_or_default().into_iter();

    let key = items.next().and_then(Reply::into_text).unwrap_or_default();
    let labels = items.next().map(decode_labels).unwrap_or_default();
    let data_points = match items.next() {
        Some(points) => decode_data_points(points, mode)?,
        None => Vec::new(),
    };

    Ok(TimeSeries {
        key,
        labels,
        data_points,
    })
}

/// Decode a multi-series range reply
pub fn decode_time_series_list(
    reply: Reply,
    mode: DecodeMode,
) -> Result<Vec<TimeSeries>, DecodeError> {
    match reply {
        Reply::Array(items) => items
            .into_iter()
            .map(|item| decode_time_series(item, mode))
            .collect(),
        other => {
            tracing::debug!(kind = other.kind(), "Expected a series list, decoding as empty");
            Ok(Vec::new())
        }
    }
}

/// Decode `[key, labels, [timestampMs, value]]`
pub fn decode_last_datapoint(
    reply: Reply,
    mode: DecodeMode,
) -> Result<LastDatapoint, DecodeError> {
    let mut items = reply.into_array().unwrap_or_default().into_iter();

    let key = items.next().and_then(Reply::into_text).unwrap_or_default();
    let labels = items.next().map(decode_labels).unwrap_or_default();
    let data_point = match items.next() {
        Some(point) => decode_data_point(point, mode)?,
        None => DataPoint::default(),
    };

    Ok(LastDatapoint {
        key,
        labels,
        data_point,
    })
}

/// Decode a multi-get reply
pub fn decode_last_datapoints(
    reply: Reply,
    mode: DecodeMode,
) -> Result<Vec<LastDatapoint>, DecodeError> {
    match reply {
        Reply::Array(items) => items
            .into_iter()
            .map(|item| decode_last_datapoint(item, mode))
            .collect(),
        other => {
            tracing::debug!(kind = other.kind(), "Expected a last-sample list, decoding as empty");
            Ok(Vec::new())
        }
    }
}

fn decode_timestamp(reply: Reply, mode: DecodeMode) -> Result<DateTime<Utc>, DecodeError> {
    let raw = match reply {
        Reply::Integer(n) => match DateTime::from_timestamp_millis(n) {
            Some(ts) => return Ok(ts),
            None => n.to_string(),
        },
        // Integral doubles within i64 range only; `as` would saturate
        Reply::Double(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            match DateTime::from_timestamp_millis(n as i64) {
                Some(ts) => return Ok(ts),
                None => n.to_string(),
            }
        }
        Reply::Double(n) => n.to_string(),
        Reply::String(s) => {
            let parsed = s.trim().parse::<i64>().ok();
            match parsed.and_then(DateTime::from_timestamp_millis) {
                Some(ts) => return Ok(ts),
                None => s,
            }
        }
        Reply::Nil | Reply::Array(_) => return Ok(DateTime::default()),
    };

    if mode.is_strict() {
        Err(DecodeError::InvalidTimestamp(raw))
    } else {
        tracing::trace!(raw = %raw, "Unparsable timestamp, using epoch");
        Ok(DateTime::default())
    }
}

fn decode_value(reply: Reply, mode: DecodeMode) -> Result<f64, DecodeError> {
    match reply {
        Reply::Double(n) => Ok(n),
        Reply::Integer(n) => Ok(n as f64),
        Reply::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Ok(n),
            Err(_) if mode.is_strict() => Err(DecodeError::InvalidValue(s)),
            Err(_) => Ok(0.0),
        },
        Reply::Nil | Reply::Array(_) => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> Reply {
        Reply::from(value)
    }

    #[test]
    fn test_decode_range_reply() {
        let points = decode_data_points(
            reply(json!([[1000, "3.5"], [2000, "4.25"]])),
            DecodeMode::Lenient,
        )
        .unwrap();

        assert_eq!(
            points,
            vec![DataPoint::from_millis(1000, 3.5), DataPoint::from_millis(2000, 4.25)]
        );
    }

    #[test]
    fn test_decode_range_reply_not_an_array() {
        let points = decode_data_points(Reply::Nil, DecodeMode::Strict).unwrap();
        assert!(points.is_empty());

        let points = decode_data_points(Reply::from("OK"), DecodeMode::Lenient).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_decode_numeric_value_variants() {
        let points = decode_data_points(
            reply(json!([[1000, 3.5], [2000, 7], ["3000", " 1.5 "]])),
            DecodeMode::Strict,
        )
        .unwrap();

        assert_eq!(points[0], DataPoint::from_millis(1000, 3.5));
        assert_eq!(points[1], DataPoint::from_millis(2000, 7.0));
        assert_eq!(points[2], DataPoint::from_millis(3000, 1.5));
    }

    #[test]
    fn test_unparsable_value_lenient_is_zero() {
        let point = decode_data_point(reply(json!([1000, "abc"])), DecodeMode::Lenient).unwrap();
        assert_eq!(point, DataPoint::from_millis(1000, 0.0));
    }

    #[test]
    fn test_unparsable_value_strict_is_error() {
        let err = decode_data_point(reply(json!([1000, "abc"])), DecodeMode::Strict).unwrap_err();
        assert_eq!(err, DecodeError::InvalidValue("abc".to_string()));

        let err = decode_data_point(reply(json!(["soon", "1.0"])), DecodeMode::Strict).unwrap_err();
        assert_eq!(err, DecodeError::InvalidTimestamp("soon".to_string()));
    }

    #[test]
    fn test_out_of_range_timestamp_strict_is_error() {
        let err = decode_data_point(
            Reply::Array(vec![Reply::Integer(i64::MAX), Reply::from("1.0")]),
            DecodeMode::Strict,
        )
        .unwrap_err();
        assert_eq!(err, DecodeError::InvalidTimestamp(i64::MAX.to_string()));

        let err = decode_data_point(
            Reply::Array(vec![Reply::Double(1e300), Reply::from("1.0")]),
            DecodeMode::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTimestamp(_)));

        let err = decode_data_point(
            Reply::Array(vec![Reply::from(i64::MAX.to_string()), Reply::from("1.0")]),
            DecodeMode::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_fractional_timestamp_strict_is_error() {
        let err = decode_data_point(
            Reply::Array(vec![Reply::Double(1.5), Reply::from("1.0")]),
            DecodeMode::Strict,
        )
        .unwrap_err();
        assert_eq!(err, DecodeError::InvalidTimestamp("1.5".to_string()));

        let point = decode_data_point(
            Reply::Array(vec![Reply::Double(2000.0), Reply::from("1.0")]),
            DecodeMode::Strict,
        )
        .unwrap();
        assert_eq!(point, DataPoint::from_millis(2000, 1.0));
    }

    #[test]
    fn test_invalid_timestamp_lenient_is_epoch() {
        let point = decode_data_point(
            Reply::Array(vec![Reply::Integer(i64::MAX), Reply::from("4.0")]),
            DecodeMode::Lenient,
        )
        .unwrap();
        assert_eq!(point, DataPoint::from_millis(0, 4.0));

        let point = decode_data_point(
            Reply::Array(vec![Reply::Double(1.5), Reply::from("4.0")]),
            DecodeMode::Lenient,
        )
        .unwrap();
        assert_eq!(point.timestamp_millis(), 0);
    }

    #[test]
    fn test_malformed_point_decodes_zero_value() {
        let points = decode_data_points(reply(json!([[1000], "x", [2000, "2"]])), DecodeMode::Strict)
            .unwrap();

        assert_eq!(
            points,
            vec![
                DataPoint::default(),
                DataPoint::default(),
                DataPoint::from_millis(2000, 2.0)
            ]
        );
    }

    #[test]
    fn test_decode_time_series_with_labels() {
        let series = decode_time_series(
            reply(json!(["series-a", [["region", "us"]], [[1000, "1.0"]]])),
            DecodeMode::Lenient,
        )
        .unwrap();

        assert_eq!(series.key, "series-a");
        assert_eq!(series.labels, vec![Label::new("region", "us")]);
        assert_eq!(series.data_points, vec![DataPoint::from_millis(1000, 1.0)]);
    }

    #[test]
    fn test_decode_time_series_labels_not_array() {
        let series = decode_time_series(
            reply(json!(["series-a", "none", [[1000, "1.0"]]])),
            DecodeMode::Strict,
        )
        .unwrap();

        assert_eq!(series.key, "series-a");
        assert!(series.labels.is_empty());
        assert_eq!(series.data_points.len(), 1);
    }

    #[test]
    fn test_decode_selected_label_missing_on_series() {
        // SELECTED_LABELS returns a nil value for labels the series lacks
        let labels = decode_labels(reply(json!([["region", "us"], ["host", null]])));
        assert_eq!(labels, vec![Label::new("region", "us"), Label::new("host", "")]);
    }

    #[test]
    fn test_decode_short_series_element() {
        let series = decode_time_series(reply(json!(["series-a"])), DecodeMode::Strict).unwrap();
        assert_eq!(series.key, "series-a");
        assert!(series.labels.is_empty());
        assert!(series.data_points.is_empty());

        let series = decode_time_series(Reply::Integer(3), DecodeMode::Strict).unwrap();
        assert_eq!(series, TimeSeries::default());
    }

    #[test]
    fn test_decode_time_series_list() {
        let list = decode_time_series_list(
            reply(json!([
                ["a", [], [[1000, "1"], [2000, "2"]]],
                ["b", [], []]
            ])),
            DecodeMode::Lenient,
        )
        .unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].data_points.len(), 2);
        assert!(list[1].data_points.is_empty());
    }

    #[test]
    fn test_decode_last_datapoint_labels_not_array() {
        let last = decode_last_datapoint(
            reply(json!(["temp:1", "none", [1000, "1"]])),
            DecodeMode::Strict,
        )
        .unwrap();

        assert_eq!(last.key, "temp:1");
        assert!(last.labels.is_empty());
        assert_eq!(last.data_point, DataPoint::from_millis(1000, 1.0));
    }

    #[test]
    fn test_decode_last_datapoints() {
        let list = decode_last_datapoints(
            reply(json!([
                ["temp:1", [["region", "us"]], [1000, "21.5"]],
                ["temp:2", [], []]
            ])),
            DecodeMode::Lenient,
        )
        .unwrap();

        assert_eq!(list[0].key, "temp:1");
        assert_eq!(list[0].label("region"), Some("us"));
        assert_eq!(list[0].data_point, DataPoint::from_millis(1000, 21.5));
        assert_eq!(list[1].data_point, DataPoint::default());
    }

    #[test]
    fn test_strict_error_propagates_from_nested_series() {
        let err = decode_time_series_list(
            reply(json!([["a", [], [[1000, "1"], [2000, "oops"]]]])),
            DecodeMode::Strict,
        )
        .unwrap_err();
        assert_eq!(err, DecodeError::InvalidValue("oops".to_string()));
    }
}
