//! Objects, arrays and tuples.

use serde_json::{Map, Value};

use crate::failure::{FailureKind, PathSegment, StructureFailure};
use crate::structure::Structure;

/// Declared properties plus the catch-all rule for undeclared keys.
struct ObjectShape {
    properties: Vec<(String, Structure<Value>)>,
    catch_all: Option<(Structure<String>, Structure<Value>)>,
}

impl ObjectShape {
    fn check(&self, input: Option<&Value>) -> Result<Map<String, Value>, StructureFailure> {
        let Some(Value::Object(map)) = input else {
            return Err(StructureFailure::incorrect_type("an object", input));
        };

        let mut output = Map::new();
        let mut failures = Vec::new();

        for (key, property) in &self.properties {
            let field = map.get(key);
            match property.check_input(field) {
                // Missing keys that validate (e.g. optional properties) stay missing.
                Ok(value) if field.is_some() => {
                    output.insert(key.clone(), value);
                }
                Ok(_) => {}
                Err(failure) => failures.push(failure.prefixed(PathSegment::key(key))),
            }
        }

        for (key, value) in map {
            if self.properties.iter().any(|(declared, _)| declared == key) {
                continue;
            }
            match &self.catch_all {
                Some((key_structure, value_structure)) => {
                    let checked_key = key_structure
                        .check(&Value::String(key.clone()))
                        .map_err(|f| f.prefixed(PathSegment::key(key)));
                    let checked_value = value_structure.check(value);
                    match (checked_key, checked_value) {
                        (Ok(normalized_key), Ok(normalized_value)) => {
                            output.insert(normalized_key, normalized_value);
                        }
                        (Err(failure), _) => failures.push(failure),
                        (Ok(_), Err(failure)) => {
                            failures.push(failure.prefixed(PathSegment::key(key)))
                        }
                    }
                }
                None => failures.push(
                    StructureFailure::new(
                        FailureKind::UnexpectedProperty,
                        "is not an expected property",
                    )
                    .prefixed(PathSegment::key(key)),
                ),
            }
        }

        match StructureFailure::aggregate(failures) {
            Some(failure) => Err(failure),
            None => Ok(output),
        }
    }
}

/// Exact-shape object: every key must be declared.
///
/// Declared properties missing from the input are checked as undefined, so
/// they fail unless their structure accepts a missing value (see
/// [`optional`](crate::optional)); accepted missing properties are left out of
/// the output.
///
/// # Examples
///
/// ```
/// use command_syntax_structure::{object, optional, number, string, FailureKind};
/// use serde_json::json;
///
/// let shape = object([
///     ("a", string().erase()),
///     ("b", optional(number()).erase()),
/// ]);
///
/// let ok = shape.check(&json!({"a": "x"})).unwrap();
/// assert!(!ok.contains_key("b"));
///
/// let err = object([("a", string().erase())]).check(&json!({"a": 1})).unwrap_err();
/// assert_eq!(err.kind, FailureKind::IncorrectType);
/// assert!(err.first_line().unwrap().starts_with("a: "));
/// ```
pub fn object<K: Into<String>>(
    properties: impl IntoIterator<Item = (K, Structure<Value>)>,
) -> Structure<Map<String, Value>> {
    build_object(properties, None)
}

/// Object whose undeclared keys are accepted when the key satisfies `key`
/// and the value satisfies `value`.
pub fn object_with_catch_all<K: Into<String>>(
    properties: impl IntoIterator<Item = (K, Structure<Value>)>,
    key: Structure<String>,
    value: Structure<Value>,
) -> Structure<Map<String, Value>> {
    build_object(properties, Some((key, value)))
}

fn build_object<K: Into<String>>(
    properties: impl IntoIterator<Item = (K, Structure<Value>)>,
    catch_all: Option<(Structure<String>, Structure<Value>)>,
) -> Structure<Map<String, Value>> {
    let shape = ObjectShape {
        properties: properties
            .into_iter()
            .map(|(key, structure)| (key.into(), structure))
            .collect(),
        catch_all,
    };
    let name = format!(
        "{{ {} }}",
        shape
            .properties
            .iter()
            .map(|(key, structure)| format!("{key}: {}", structure.name()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Structure::new(name, move |input| shape.check(input))
}

/// Homogeneous array; every failing index is reported.
pub fn array<T: 'static>(element: Structure<T>) -> Structure<Vec<T>> {
    let name = format!("Array<{}>", element.name());
    Structure::new(name, move |input| {
        let Some(Value::Array(items)) = input else {
            return Err(StructureFailure::incorrect_type("an array", input));
        };
        let mut output = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match element.check(item) {
                Ok(value) => output.push(value),
                Err(failure) => failures.push(failure.prefixed(PathSegment::Index(index))),
            }
        }
        match StructureFailure::aggregate(failures) {
            Some(failure) => Err(failure),
            None => Ok(output),
        }
    })
}

/// Fixed-arity array with a structure per position.
pub fn tuple(elements: Vec<Structure<Value>>) -> Structure<Vec<Value>> {
    let name = format!(
        "[{}]",
        elements
            .iter()
            .map(|e| e.name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Structure::new(name, move |input| {
        let Some(Value::Array(items)) = input else {
            return Err(StructureFailure::incorrect_type("an array", input));
        };
        if items.len() != elements.len() {
            return Err(StructureFailure::new(
                FailureKind::IncorrectArity,
                format!(
                    "expected {} elements, received {}",
                    elements.len(),
                    items.len()
                ),
            ));
        }
        let mut output = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (index, (item, element)) in items.iter().zip(&elements).enumerate() {
            match element.check(item) {
                Ok(value) => output.push(value),
                Err(failure) => failures.push(failure.prefixed(PathSegment::Index(index))),
            }
        }
        match StructureFailure::aggregate(failures) {
            Some(failure) => Err(failure),
            None => Ok(output),
        }
    })
}
