//! Leaf structures over JSON primitives.

use std::ops::RangeBounds;

use serde_json::Value;

use crate::failure::{FailureKind, StructureFailure};
use crate::structure::Structure;
use crate::validators;

pub fn string() -> Structure<String> {
    Structure::new("String", |input| match input {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(StructureFailure::incorrect_type("a string", other)),
    })
}

pub fn number() -> Structure<f64> {
    Structure::new("Number", |input| match input {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| StructureFailure::invalid_value(format!("{n} is not representable"))),
        other => Err(StructureFailure::incorrect_type("a number", other)),
    })
}

/// Whole number of any sign, kept exact for the full `i64`/`u64` range.
pub fn integer() -> Structure<i128> {
    Structure::new("Integer", |input| match input {
        Some(Value::Number(n)) => whole_number(n),
        other => Err(StructureFailure::incorrect_type("an integer", other)),
    })
}

pub(crate) fn whole_number(n: &serde_json::Number) -> Result<i128, StructureFailure> {
    if let Some(i) = n.as_i64() {
        return Ok(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(i128::from(u));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.7e38 => Ok(f as i128),
        _ => Err(StructureFailure::new(
            FailureKind::InvalidValue,
            format!("expected an integer, received number {n}"),
        )),
    }
}

pub fn boolean() -> Structure<bool> {
    Structure::new("Boolean", |input| match input {
        Some(Value::Bool(b)) => Ok(*b),
        other => Err(StructureFailure::incorrect_type("a boolean", other)),
    })
}

/// Accepts any present value unchanged.
pub fn any() -> Structure<Value> {
    Structure::new("Any", |input| match input {
        Some(value) => Ok(value.clone()),
        None => Err(StructureFailure::incorrect_type("a value", None)),
    })
}

/// Accepts exactly `expected`.
pub fn value(expected: Value) -> Structure<Value> {
    let name = expected.to_string();
    Structure::new(name, move |input| match input {
        Some(actual) if *actual == expected => Ok(actual.clone()),
        Some(actual) => Err(StructureFailure::invalid_value(format!(
            "expected {expected}, received {actual}"
        ))),
        None => Err(StructureFailure::incorrect_type(&expected.to_string(), None)),
    })
}

pub fn null() -> Structure<()> {
    Structure::new("Null", |input| match input {
        Some(Value::Null) => Ok(()),
        other => Err(StructureFailure::incorrect_type("null", other)),
    })
}

/// Accepts only a missing value.
pub fn undefined() -> Structure<()> {
    Structure::new("Undefined", |input| match input {
        None => Ok(()),
        other => Err(StructureFailure::incorrect_type("undefined", other)),
    })
}

impl Structure<String> {
    /// Restricts the length in characters.
    pub fn length(self, range: impl RangeBounds<usize>) -> Self {
        self.validate(validators::length(range))
    }
}

impl Structure<f64> {
    pub fn range(self, range: impl RangeBounds<f64>) -> Self {
        self.validate(validators::in_range(range))
    }
}

impl Structure<i128> {
    pub fn range(self, range: impl RangeBounds<i128>) -> Self {
        self.validate(validators::in_range(range))
    }
}
