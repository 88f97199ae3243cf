//! Path matching for compiled routes.
//!
//! Patterns are compiled once at route registration and matched
//! segment-by-segment at dispatch time. A segment of the form `{name}` is a
//! parameter; its type constraint comes from the parameter scope in effect
//! where the route was declared. No regex in the hot path.

use crate::params::ParamMap;
use crate::resource::ParamType;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param { name: String, kind: ParamType },
}

/// A resolved path compiled for matching.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a resolved path against the parameter scope in effect.
    ///
    /// A templated segment whose name has no declaration in scope matches
    /// as a plain string.
    pub fn compile(path: &str, scope: &ParamMap) -> Self {
        let segments = path
            .split('/')
            .map(|segment| {
                if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
                    let name = &segment[1..segment.len() - 1];
                    let kind = scope
                        .get(name)
                        .map(|spec| spec.kind)
                        .unwrap_or(ParamType::String);
                    Segment::Param {
                        name: name.to_string(),
                        kind,
                    }
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// The resolved path this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, coercing parameter segments to their declared
    /// types. Returns the captured parameters on success, `None` when any
    /// segment is missing, extra, different, or fails its type constraint.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut actual = path.split('/');

        for expected in &self.segments {
            let segment = actual.next()?;
            match expected {
                Segment::Literal(literal) => {
                    if literal != segment {
                        return None;
                    }
                }
                Segment::Param { name, kind } => {
                    let value = coerce(*kind, segment)?;
                    params.insert(name.clone(), value);
                }
            }
        }

        if actual.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn coerce(kind: ParamType, raw: &str) -> Option<ParamValue> {
    if raw.is_empty() {
        return None;
    }
    match kind {
        ParamType::String => Some(ParamValue::String(raw.to_string())),
        ParamType::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ParamValue::Number),
        ParamType::Integer => raw.parse::<i64>().ok().map(ParamValue::Integer),
        ParamType::Boolean => match raw {
            "true" => Some(ParamValue::Boolean(true)),
            "false" => Some(ParamValue::Boolean(false)),
            _ => None,
        },
    }
}

/// A path parameter value after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
}

/// Captured path parameters for one matched request.
///
/// Inserted into the request's extensions before the route's middleware
/// runs, so handlers can read typed parameter values.
#[derive(Debug, Clone, Default)]
pub struct PathParams(HashMap<String, ParamValue>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: String, value: ParamValue) {
        self.0.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}
