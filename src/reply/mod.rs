//! Store replies
//!
//! The transport hands back a dynamically shaped reply: a scalar or an
//! array of further replies, nested arbitrarily. [`Reply`] models that as
//! a sum type and the decoders in [`decode`] turn it into typed records.
//!
//! Decoding degrades instead of failing when a reply's shape differs from
//! the expected one (a missing label array, a non-array series list). Only
//! unparsable sample timestamps and values can fail, and only under
//! [`DecodeMode::Strict`].

mod decode;

pub use decode::{
    decode_data_point, decode_data_points, decode_labels, decode_last_datapoint,
    decode_last_datapoints, decode_time_series, decode_time_series_list, DecodeMode,
};

/// A generic reply value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Reply {
    #[default]
    Nil,
    Integer(i64),
    Double(f64),
    String(String),
    Array(Vec<Reply>),
}

impl Reply {
    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Integer(_) => "integer",
            Reply::Double(_) => "double",
            Reply::String(_) => "string",
            Reply::Array(_) => "array",
        }
    }

    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Textual form of a scalar reply; `None` for nil and arrays
    pub fn into_text(self) -> Option<String> {
        match self {
            Reply::String(s) => Some(s),
            Reply::Integer(n) => Some(n.to_string()),
            Reply::Double(n) => Some(n.to_string()),
            Reply::Nil | Reply::Array(_) => None,
        }
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::String(s.to_string())
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::String(s)
    }
}

impl From<i64> for Reply {
    fn from(n: i64) -> Self {
        Reply::Integer(n)
    }
}

impl From<f64> for Reply {
    fn from(n: f64) -> Self {
        Reply::Double(n)
    }
}

impl From<Vec<Reply>> for Reply {
    fn from(items: Vec<Reply>) -> Self {
        Reply::Array(items)
    }
}

/// Convert a JSON document into a reply
///
/// Objects become arrays of `[key, value]` pairs, the shape label lists use.
impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Reply::Nil,
            Value::Bool(b) => Reply::Integer(i64::from(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Reply::Integer(i),
                None => Reply::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Reply::String(s),
            Value::Array(items) => Reply::Array(items.into_iter().map(Reply::from).collect()),
            Value::Object(map) => Reply::Array(
                map.into_iter()
                    .map(|(k, v)| Reply::Array(vec![Reply::String(k), Reply::from(v)]))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let reply = Reply::from(json!([[1000, "3.5"], [2000, 4.25], null, true]));
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::Array(vec![Reply::Integer(1000), Reply::from("3.5")]),
                Reply::Array(vec![Reply::Integer(2000), Reply::Double(4.25)]),
                Reply::Nil,
                Reply::Integer(1),
            ])
        );
    }

    #[test]
    fn test_from_json_object_becomes_pairs() {
        let reply = Reply::from(json!({"region": "us"}));
        assert_eq!(
            reply,
            Reply::Array(vec![Reply::Array(vec![
                Reply::from("region"),
                Reply::from("us")
            ])])
        );
    }

    #[test]
    fn test_into_text() {
        assert_eq!(Reply::from("key").into_text(), Some("key".to_string()));
        assert_eq!(Reply::Integer(7).into_text(), Some("7".to_string()));
        assert_eq!(Reply::Nil.into_text(), None);
        assert_eq!(Reply::Array(vec![]).into_text(), None);
    }
}
