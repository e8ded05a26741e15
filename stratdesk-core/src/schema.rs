//! Strategy descriptors and typed parameter values.
//!
//! A strategy is described by the server as an ordered list of parameter
//! descriptors. The descriptor list drives both form rendering and
//! optimization range synthesis; it is data, not code.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared type of a strategy parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Float,
    Boolean,
    String,
}

impl ParamType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ParamType::Integer | ParamType::Float)
    }
}

/// A typed parameter value as it travels between forms, context, and wire.
///
/// Untagged on the wire: `10` parses as `Int`, `10.5` as `Float`, `true` as
/// `Bool`, and anything quoted as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Coerce this value to the declared type. Returns `None` when the value
    /// cannot represent the target type (e.g. unparsable text for a number).
    pub fn coerce(&self, ty: ParamType) -> Option<ParamValue> {
        match ty {
            ParamType::Integer => match self {
                ParamValue::Int(i) => Some(ParamValue::Int(*i)),
                ParamValue::Float(f) if f.is_finite() => Some(ParamValue::Int(f.round() as i64)),
                ParamValue::Bool(b) => Some(ParamValue::Int(i64::from(*b))),
                ParamValue::Text(s) => {
                    let f = s.trim().parse::<f64>().ok()?;
                    f.is_finite().then(|| ParamValue::Int(f.round() as i64))
                }
                _ => None,
            },
            ParamType::Float => match self {
                ParamValue::Int(i) => Some(ParamValue::Float(*i as f64)),
                ParamValue::Float(f) if f.is_finite() => Some(ParamValue::Float(*f)),
                ParamValue::Bool(b) => Some(ParamValue::Float(if *b { 1.0 } else { 0.0 })),
                ParamValue::Text(s) => {
                    let f = s.trim().parse::<f64>().ok()?;
                    f.is_finite().then_some(ParamValue::Float(f))
                }
                _ => None,
            },
            ParamType::Boolean => match self {
                ParamValue::Bool(b) => Some(ParamValue::Bool(*b)),
                ParamValue::Int(i) => Some(ParamValue::Bool(*i != 0)),
                ParamValue::Float(f) => Some(ParamValue::Bool(*f != 0.0)),
                ParamValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Some(ParamValue::Bool(true)),
                    "false" | "0" | "no" | "off" | "" => Some(ParamValue::Bool(false)),
                    _ => None,
                },
            },
            ParamType::String => Some(ParamValue::Text(self.to_string())),
        }
    }

    /// True if the value already is of the declared type.
    pub fn matches(&self, ty: ParamType) -> bool {
        matches!(
            (self, ty),
            (ParamValue::Int(_), ParamType::Integer)
                | (ParamValue::Float(_), ParamType::Float)
                | (ParamValue::Bool(_), ParamType::Boolean)
                | (ParamValue::Text(_), ParamType::String)
        )
    }

    /// The zero value for a declared type, used when the server sends a
    /// descriptor with no default at all.
    pub fn zero(ty: ParamType) -> ParamValue {
        match ty {
            ParamType::Integer => ParamValue::Int(0),
            ParamType::Float => ParamValue::Float(0.0),
            ParamType::Boolean => ParamValue::Bool(false),
            ParamType::String => ParamValue::Text(String::new()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Map from parameter name to its current typed value.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Descriptor for a single tunable strategy parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub default: ParamValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl ParameterDescriptor {
    pub fn is_numeric(&self) -> bool {
        self.param_type.is_numeric()
    }

    /// The default coerced to the declared type; falls back to the type's
    /// zero value if the server sent a default of the wrong shape.
    pub fn typed_default(&self) -> ParamValue {
        self.default
            .coerce(self.param_type)
            .unwrap_or_else(|| ParamValue::zero(self.param_type))
    }

    /// Check the descriptor's own consistency. Booleans and strings ignore
    /// min/max/step entirely.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !self.is_numeric() {
            return Ok(());
        }
        if let Some(step) = self.step {
            if !(step > 0.0) || !step.is_finite() {
                return Err(SchemaError::InvalidStep {
                    name: self.name.clone(),
                    step,
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            let default = self.typed_default().as_f64().unwrap_or(0.0);
            if default < min || default > max {
                return Err(SchemaError::DefaultOutOfBounds {
                    name: self.name.clone(),
                    default,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// A strategy as advertised by the server: stable id, display name, and an
/// ordered parameter list. Form rows follow the list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
}

impl StrategyDescriptor {
    pub fn numeric_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.is_numeric())
    }

    pub fn has_numeric_parameters(&self) -> bool {
        self.numeric_parameters().next().is_some()
    }

    /// Descriptor defaults as a ready-to-use parameter map.
    pub fn default_params(&self) -> ParamMap {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.typed_default()))
            .collect()
    }
}

/// Reject strategy lists with duplicate ids; the id is the lookup key for
/// every page.
pub fn ensure_unique_ids(strategies: &[StrategyDescriptor]) -> Result<(), SchemaError> {
    let mut seen = std::collections::BTreeSet::new();
    for s in strategies {
        if !seen.insert(s.id.as_str()) {
            return Err(SchemaError::DuplicateId { id: s.id.clone() });
        }
    }
    Ok(())
}

/// Structural problems in a descriptor set.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("parameter '{name}' has non-positive step {step}")]
    InvalidStep { name: String, step: f64 },

    #[error("parameter '{name}' default {default} is outside [{min}, {max}]")]
    DefaultOutOfBounds {
        name: String,
        default: f64,
        min: f64,
        max: f64,
    },

    #[error("duplicate strategy id '{id}'")]
    DuplicateId { id: String },
}
