//! Label filter expressions
//!
//! A filter selects the series a multi-series query targets. Each filter
//! renders to one argument of the `FILTER` clause:
//!
//! ```text
//! region=us          label equals value
//! region!=us         label differs from value
//! region!=           label exists
//! region=            label is missing
//! region=(us,eu)     label is one of
//! region!=(us,eu)    label is none of
//! ```

use crate::error::ParseError;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::value,
    multi::separated_list1,
    sequence::delimited,
    IResult,
};
use std::str::FromStr;

/// A predicate over series labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `label=value`
    Equal { label: String, value: String },
    /// `label!=value`
    NotEqual { label: String, value: String },
    /// `label!=`
    Exists(String),
    /// `label=`
    Missing(String),
    /// `label=(v1,v2,...)`
    In { label: String, values: Vec<String> },
    /// `label!=(v1,v2,...)`
    NotIn { label: String, values: Vec<String> },
    /// Pre-rendered expression, passed through verbatim
    Raw(String),
}

impl Filter {
    pub fn equal(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equal {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn not_equal(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotEqual {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn exists(label: impl Into<String>) -> Self {
        Self::Exists(label.into())
    }

    pub fn missing(label: impl Into<String>) -> Self {
        Self::Missing(label.into())
    }

    pub fn one_of<I, S>(label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn none_of<I, S>(label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotIn {
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    /// Label this filter tests, if it is a typed filter
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Equal { label, .. }
            | Self::NotEqual { label, .. }
            | Self::In { label, .. }
            | Self::NotIn { label, .. } => Some(label),
            Self::Exists(label) | Self::Missing(label) => Some(label),
            Self::Raw(_) => None,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal { label, value } => write!(f, "{}={}", label, value),
            Self::NotEqual { label, value } => write!(f, "{}!={}", label, value),
            Self::Exists(label) => write!(f, "{}!=", label),
            Self::Missing(label) => write!(f, "{}=", label),
            Self::In { label, values } => write!(f, "{}=({})", label, values.join(",")),
            Self::NotIn { label, values } => write!(f, "{}!=({})", label, values.join(",")),
            Self::Raw(expr) => f.write_str(expr),
        }
    }
}

impl FromStr for Filter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        match parse_filter(input) {
            Ok((remaining, filter)) if remaining.trim().is_empty() => Ok(filter),
            Ok((remaining, _)) => Err(ParseError::Filter(format!(
                "unexpected input after filter: '{}'",
                remaining.trim()
            ))),
            Err(_) => Err(ParseError::Filter(input.to_string())),
        }
    }
}

/// Parse `label op [value | (values)]`
fn parse_filter(input: &str) -> IResult<&str, Filter> {
    let (input, label) = parse_label(input)?;
    let (input, negated) = parse_operator(input)?;
    let label = label.to_string();

    if let Ok((input, values)) = parse_value_set(input) {
        let values = values.into_iter().map(|v| v.trim().to_string()).collect();
        let filter = if negated {
            Filter::NotIn { label, values }
        } else {
            Filter::In { label, values }
        };
        return Ok((input, filter));
    }

    let (input, value) = take_while(|c: char| !c.is_whitespace() && c != '(' && c != ')')(input)?;

    let filter = match (negated, value.is_empty()) {
        (false, true) => Filter::Missing(label),
        (true, true) => Filter::Exists(label),
        (false, false) => Filter::Equal {
            label,
            value: value.to_string(),
        },
        (true, false) => Filter::NotEqual {
            label,
            value: value.to_string(),
        },
    };

    Ok((input, filter))
}

fn parse_label(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '=' && c != '!' && c != '(' && c != ')' && !c.is_whitespace())(
        input,
    )
}

/// Returns true for `!=`
fn parse_operator(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("!=")), value(false, tag("="))))(input)
}

fn parse_value_set(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        char('('),
        separated_list1(
            char(','),
            delimited(multispace0, take_while1(|c: char| c != ',' && c != ')'), multispace0),
        ),
        char(')'),
    )(input)
}
