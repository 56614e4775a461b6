//! Scalar parameter values and concrete parameter samples.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{BatcherError, ErrorInfo};

/// A single scalar candidate for an experiment parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Free-form string.
    Str(String),
}

impl ParamValue {
    /// Converts a JSON scalar into a parameter value.
    ///
    /// Arrays, objects and `null` are rejected: candidate lists are flattened by
    /// the caller before individual values reach this point.
    pub fn from_json(value: &Value) -> Result<Self, BatcherError> {
        match value {
            Value::Bool(flag) => Ok(ParamValue::Bool(*flag)),
            Value::Number(num) => {
                if let Some(int) = num.as_i64() {
                    Ok(ParamValue::Int(int))
                } else if let Some(float) = num.as_f64() {
                    Ok(ParamValue::Float(float))
                } else {
                    Err(BatcherError::Spec(
                        ErrorInfo::new("spec.number_range", "numeric value out of range")
                            .with_context("value", num.to_string()),
                    ))
                }
            }
            Value::String(text) => Ok(ParamValue::Str(text.clone())),
            other => Err(BatcherError::Spec(
                ErrorInfo::new("spec.param_value", "parameter values must be scalars")
                    .with_context("value", other.to_string()),
            )),
        }
    }

    /// Returns the value as a float when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(int) => Some(*int as f64),
            ParamValue::Float(float) => Some(*float),
            _ => None,
        }
    }

    /// Returns the value as an integer when it is integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(int) => Some(*int),
            ParamValue::Float(float) if float.fract() == 0.0 => Some(*float as i64),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(flag) => write!(f, "{flag}"),
            ParamValue::Int(int) => write!(f, "{int}"),
            ParamValue::Float(float) => f.write_str(&format_float(*float)),
            ParamValue::Str(text) => f.write_str(text),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

/// Renders a float with at least one decimal digit (`1.0`, `0.25`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// One concrete assignment of parameter name to scalar value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSample {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSample {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Returns a copy of this sample with `name` bound to `value`.
    pub fn with(&self, name: impl Into<String>, value: ParamValue) -> Self {
        let mut next = self.clone();
        next.values.insert(name.into(), value);
        next
    }

    /// Binds `name` to `value` in place.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    /// Iterates over the bound parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for the empty assignment.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ParamValue)> for ParameterSample {
    fn from_iter<T: IntoIterator<Item = (K, ParamValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
