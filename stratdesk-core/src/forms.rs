//! Parameter form engine.
//!
//! The form schema is data: an ordered descriptor list renders to an ordered
//! list of typed input fields, and reading inverts rendering. Two modes:
//! *single* (one value per parameter, used by the dashboard and backtest
//! pages) and *range* (a min/max/step triple per numeric parameter, used by
//! the optimize page). Booleans and strings render identically in both.
//!
//! Every field carries a deterministic id derived from the parameter name,
//! so reads locate inputs without positional assumptions.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::schema::{ParamMap, ParamType, ParamValue, ParameterDescriptor};

/// How the form presents numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Single,
    Range,
}

/// Deterministic id for a parameter's input.
pub fn input_id(name: &str) -> String {
    format!("param-{name}")
}

/// One rendered input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    pub name: String,
    pub input_id: String,
    pub kind: FieldKind,
}

/// The input widget backing a field. Buffers hold the user's raw text;
/// coercion happens on read, never while typing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Number {
        buffer: String,
        integer: bool,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    Toggle {
        value: bool,
    },
    Text {
        buffer: String,
    },
    Range {
        start: String,
        end: String,
        step: String,
        integer: bool,
    },
}

impl ParamField {
    /// Short display string for list rendering.
    pub fn display_value(&self) -> String {
        match &self.kind {
            FieldKind::Number { buffer, .. } => buffer.clone(),
            FieldKind::Toggle { value } => value.to_string(),
            FieldKind::Text { buffer } => buffer.clone(),
            FieldKind::Range { start, end, step, .. } => {
                format!("[{start} .. {end}] step {step}")
            }
        }
    }
}

/// Value read back from a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(ParamValue),
    /// Empty or missing input; the request builder substitutes the
    /// last-known context value, else the descriptor default.
    Unspecified,
}

impl FieldValue {
    pub fn into_option(self) -> Option<ParamValue> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Unspecified => None,
        }
    }
}

/// Result of reading a single-mode form.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub values: BTreeMap<String, FieldValue>,
    /// Parameters whose input was not found at all. Reported, not fatal.
    pub missing: Vec<String>,
}

/// Raw range triple read from a range-mode form; `None` parts were left
/// empty and fall back to descriptor bounds downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeInput {
    pub name: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub step: Option<f64>,
}

/// A parameter whose text could not be coerced to its declared type.
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("invalid value '{text}' for parameter '{name}'")]
    Invalid { name: String, text: String },
}

/// The rendered form: ordered fields plus the mode they were rendered in.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamForm {
    pub mode: FormMode,
    pub fields: Vec<ParamField>,
}

impl ParamForm {
    pub fn empty(mode: FormMode) -> Self {
        Self { mode, fields: Vec::new() }
    }

    /// Build input fields from the descriptor list, pre-populated from
    /// `current` (falling back to descriptor defaults). Field order matches
    /// descriptor order.
    pub fn render(
        descriptors: &[ParameterDescriptor],
        current: &ParamMap,
        mode: FormMode,
    ) -> ParamForm {
        let fields = descriptors
            .iter()
            .map(|d| {
                let seed = current
                    .get(&d.name)
                    .and_then(|v| v.coerce(d.param_type))
                    .unwrap_or_else(|| d.typed_default());
                let kind = match (mode, d.param_type) {
                    (FormMode::Range, t) if t.is_numeric() => FieldKind::Range {
                        start: d
                            .min_value
                            .map(|v| fmt_num(v, t == ParamType::Integer))
                            .unwrap_or_else(|| seed.to_string()),
                        end: d
                            .max_value
                            .map(|v| fmt_num(v, t == ParamType::Integer))
                            .unwrap_or_else(|| seed.to_string()),
                        step: d
                            .step
                            .map(|v| fmt_num(v, t == ParamType::Integer))
                            .unwrap_or_else(|| "1".into()),
                        integer: t == ParamType::Integer,
                    },
                    (_, ParamType::Boolean) => FieldKind::Toggle {
                        value: matches!(seed, ParamValue::Bool(true)),
                    },
                    (_, ParamType::String) => FieldKind::Text {
                        buffer: seed.to_string(),
                    },
                    (_, t) => FieldKind::Number {
                        buffer: seed.to_string(),
                        integer: t == ParamType::Integer,
                        min: d.min_value,
                        max: d.max_value,
                        step: d.step,
                    },
                };
                ParamField {
                    name: d.name.clone(),
                    input_id: input_id(&d.name),
                    kind,
                }
            })
            .collect();
        ParamForm { mode, fields }
    }

    pub fn field(&self, name: &str) -> Option<&ParamField> {
        let id = input_id(name);
        self.fields.iter().find(|f| f.input_id == id)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut ParamField> {
        let id = input_id(name);
        self.fields.iter_mut().find(|f| f.input_id == id)
    }

    /// Read single values back, coercing text to the declared types. Walks
    /// the descriptor list, not the field list, so stray fields are ignored
    /// and absent ones reported.
    pub fn read(&self, descriptors: &[ParameterDescriptor]) -> Result<ReadOutcome, FormError> {
        let mut outcome = ReadOutcome::default();
        for d in descriptors {
            let Some(field) = self.field(&d.name) else {
                outcome.missing.push(d.name.clone());
                outcome
                    .values
                    .insert(d.name.clone(), FieldValue::Unspecified);
                continue;
            };
            let value = match &field.kind {
                FieldKind::Toggle { value } => FieldValue::Value(ParamValue::Bool(*value)),
                FieldKind::Text { buffer } => {
                    if buffer.is_empty() {
                        FieldValue::Unspecified
                    } else {
                        FieldValue::Value(ParamValue::Text(buffer.clone()))
                    }
                }
                FieldKind::Number { buffer, .. } => {
                    let text = buffer.trim();
                    if text.is_empty() {
                        FieldValue::Unspecified
                    } else {
                        let coerced = ParamValue::Text(text.into())
                            .coerce(d.param_type)
                            .ok_or_else(|| FormError::Invalid {
                                name: d.name.clone(),
                                text: text.into(),
                            })?;
                        FieldValue::Value(coerced)
                    }
                }
                // A range field in a single-mode read has no single value.
                FieldKind::Range { .. } => FieldValue::Unspecified,
            };
            outcome.values.insert(d.name.clone(), value);
        }
        Ok(outcome)
    }

    /// Read the min/max/step triples for every numeric parameter. Empty
    /// parts come back as `None`; unparsable text fails naming the
    /// parameter.
    pub fn read_ranges(
        &self,
        descriptors: &[ParameterDescriptor],
    ) -> Result<Vec<RangeInput>, FormError> {
        let mut ranges = Vec::new();
        for d in descriptors.iter().filter(|d| d.is_numeric()) {
            let Some(field) = self.field(&d.name) else {
                ranges.push(RangeInput {
                    name: d.name.clone(),
                    start: None,
                    end: None,
                    step: None,
                });
                continue;
            };
            if let FieldKind::Range { start, end, step, .. } = &field.kind {
                ranges.push(RangeInput {
                    name: d.name.clone(),
                    start: parse_part(&d.name, start)?,
                    end: parse_part(&d.name, end)?,
                    step: parse_part(&d.name, step)?,
                });
            }
        }
        Ok(ranges)
    }
}

fn parse_part(name: &str, text: &str) -> Result<Option<f64>, FormError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(FormError::Invalid {
            name: name.into(),
            text: text.into(),
        }),
    }
}

fn fmt_num(v: f64, integer: bool) -> String {
    if integer {
        format!("{}", v.round() as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn descriptors() -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor {
                name: "fast_ema_period".into(),
                param_type: ParamType::Integer,
                default: ParamValue::Int(10),
                min_value: Some(2.0),
                max_value: Some(50.0),
                step: Some(1.0),
            },
            ParameterDescriptor {
                name: "slow_ema_period".into(),
                param_type: ParamType::Integer,
                default: ParamValue::Int(30),
                min_value: Some(5.0),
                max_value: Some(100.0),
                step: Some(1.0),
            },
            ParameterDescriptor {
                name: "stop_pct".into(),
                param_type: ParamType::Float,
                default: ParamValue::Float(0.05),
                min_value: None,
                max_value: None,
                step: Some(0.01),
            },
            ParameterDescriptor {
                name: "long_only".into(),
                param_type: ParamType::Boolean,
                default: ParamValue::Bool(true),
                min_value: None,
                max_value: None,
                step: None,
            },
        ]
    }

    #[test]
    fn single_mode_renders_defaults_in_order() {
        let form = ParamForm::render(&descriptors(), &ParamMap::new(), FormMode::Single);
        assert_eq!(form.fields.len(), 4);
        assert_eq!(form.fields[0].input_id, "param-fast_ema_period");
        match &form.fields[0].kind {
            FieldKind::Number { buffer, integer, min, max, step } => {
                assert_eq!(buffer, "10");
                assert!(integer);
                assert_eq!((*min, *max, *step), (Some(2.0), Some(50.0), Some(1.0)));
            }
            other => panic!("expected number field, got {other:?}"),
        }
        match &form.fields[1].kind {
            FieldKind::Number { buffer, .. } => assert_eq!(buffer, "30"),
            other => panic!("expected number field, got {other:?}"),
        }
    }

    #[test]
    fn current_values_override_defaults() {
        let mut current = ParamMap::new();
        current.insert("fast_ema_period".into(), ParamValue::Int(7));
        let form = ParamForm::render(&descriptors(), &current, FormMode::Single);
        assert_eq!(form.fields[0].display_value(), "7");
        assert_eq!(form.fields[1].display_value(), "30");
    }

    #[test]
    fn range_mode_triples_only_for_numerics() {
        let form = ParamForm::render(&descriptors(), &ParamMap::new(), FormMode::Range);
        assert!(matches!(form.fields[0].kind, FieldKind::Range { .. }));
        assert!(matches!(form.fields[2].kind, FieldKind::Range { .. }));
        assert!(matches!(form.fields[3].kind, FieldKind::Toggle { .. }));

        match &form.fields[0].kind {
            FieldKind::Range { start, end, step, .. } => {
                assert_eq!(start, "2");
                assert_eq!(end, "50");
                assert_eq!(step, "1");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn read_coerces_to_declared_types() {
        let ds = descriptors();
        let mut form = ParamForm::render(&ds, &ParamMap::new(), FormMode::Single);
        if let Some(f) = form.field_mut("fast_ema_period") {
            if let FieldKind::Number { buffer, .. } = &mut f.kind {
                *buffer = "12".into();
            }
        }
        let outcome = form.read(&ds).unwrap();
        assert_eq!(
            outcome.values["fast_ema_period"],
            FieldValue::Value(ParamValue::Int(12))
        );
        assert_eq!(
            outcome.values["long_only"],
            FieldValue::Value(ParamValue::Bool(true))
        );
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn empty_input_reads_unspecified() {
        let ds = descriptors();
        let mut form = ParamForm::render(&ds, &ParamMap::new(), FormMode::Single);
        if let Some(f) = form.field_mut("stop_pct") {
            if let FieldKind::Number { buffer, .. } = &mut f.kind {
                buffer.clear();
            }
        }
        let outcome = form.read(&ds).unwrap();
        assert_eq!(outcome.values["stop_pct"], FieldValue::Unspecified);
    }

    #[test]
    fn missing_field_is_reported_not_fatal() {
        let ds = descriptors();
        let mut form = ParamForm::render(&ds, &ParamMap::new(), FormMode::Single);
        form.fields.retain(|f| f.name != "slow_ema_period");
        let outcome = form.read(&ds).unwrap();
        assert_eq!(outcome.missing, vec!["slow_ema_period".to_string()]);
        assert_eq!(outcome.values["slow_ema_period"], FieldValue::Unspecified);
    }

    #[test]
    fn unparsable_number_names_the_parameter() {
        let ds = descriptors();
        let mut form = ParamForm::render(&ds, &ParamMap::new(), FormMode::Single);
        if let Some(f) = form.field_mut("fast_ema_period") {
            if let FieldKind::Number { buffer, .. } = &mut f.kind {
                *buffer = "ten".into();
            }
        }
        let err = form.read(&ds).unwrap_err();
        assert_eq!(
            err,
            FormError::Invalid {
                name: "fast_ema_period".into(),
                text: "ten".into()
            }
        );
    }

    #[test]
    fn read_ranges_empty_parts_are_none() {
        let ds = descriptors();
        let mut form = ParamForm::render(&ds, &ParamMap::new(), FormMode::Range);
        if let Some(f) = form.field_mut("stop_pct") {
            if let FieldKind::Range { start, .. } = &mut f.kind {
                start.clear();
            }
        }
        let ranges = form.read_ranges(&ds).unwrap();
        let stop = ranges.iter().find(|r| r.name == "stop_pct").unwrap();
        assert_eq!(stop.start, None);
        assert_eq!(stop.step, Some(0.01));
        // Booleans contribute no range rows.
        assert!(ranges.iter().all(|r| r.name != "long_only"));
    }

    proptest! {
        /// Reading a rendered single-mode form returns the seed values,
        /// type-coerced, with absent seeds replaced by defaults.
        #[test]
        fn read_render_round_trip(fast in 2i64..=50, stop in 0.0f64..1.0, flag: bool) {
            let ds = descriptors();
            let mut current = ParamMap::new();
            current.insert("fast_ema_period".into(), ParamValue::Int(fast));
            current.insert("stop_pct".into(), ParamValue::Float(stop));
            current.insert("long_only".into(), ParamValue::Bool(flag));

            let form = ParamForm::render(&ds, &current, FormMode::Single);
            let outcome = form.read(&ds).unwrap();

            prop_assert_eq!(
                outcome.values["fast_ema_period"].clone(),
                FieldValue::Value(ParamValue::Int(fast))
            );
            prop_assert_eq!(
                outcome.values["stop_pct"].clone(),
                FieldValue::Value(ParamValue::Float(stop))
            );
            prop_assert_eq!(
                outcome.values["long_only"].clone(),
                FieldValue::Value(ParamValue::Bool(flag))
            );
            // Seed omitted: the descriptor default comes back.
            prop_assert_eq!(
                outcome.values["slow_ema_period"].clone(),
                FieldValue::Value(ParamValue::Int(30))
            );
        }
    }
}
