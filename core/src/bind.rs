//! Binding extracted text to declared argument constraints.

use command_syntax_structure::{Structure, StructureFailure, nullable, object, string};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::DeclaredArgument;

/// The object structure derived from a command's declared arguments.
///
/// Each argument contributes one property keyed by its id: its further
/// constraint, or a plain string when it has none, wrapped in
/// [`nullable`] when the argument is optional.
#[derive(Debug, Clone)]
pub struct Specification {
    structure: Structure<Map<String, Value>>,
}

impl Specification {
    pub fn from_arguments(arguments: &[DeclaredArgument]) -> Self {
        let properties = arguments.iter().map(|argument| {
            let base = argument
                .further_constraint
                .clone()
                .unwrap_or_else(|| string().erase());
            let property = if argument.optional {
                nullable(base).erase()
            } else {
                base
            };
            (argument.id.clone(), property)
        });
        Self {
            structure: object(properties),
        }
    }

    pub fn structure(&self) -> &Structure<Map<String, Value>> {
        &self.structure
    }

    /// Checks raw extracted values. All or nothing: any failing argument
    /// fails the whole bind with one aggregated failure.
    pub fn bind(&self, raw: &Map<String, Value>) -> Result<BoundArguments, StructureFailure> {
        let input = Value::Object(raw.clone());
        match self.structure.check(&input) {
            Ok(values) => Ok(BoundArguments(values)),
            Err(failure) => {
                debug!(trail = ?failure.lines(), "Argument binding failed");
                Err(failure)
            }
        }
    }
}

/// Builds the specification for `arguments` and binds `raw` against it.
///
/// # Examples
///
/// ```
/// use command_syntax_core::{DeclaredArgument, bind};
/// use command_syntax_structure::leaves::UINT4_LIKE;
/// use serde_json::json;
///
/// let args = [
///     DeclaredArgument::required("name", "Role name"),
///     DeclaredArgument::optional("tier", "Tier").with_constraint(UINT4_LIKE.clone()),
/// ];
///
/// let raw = json!({"name": "Vault", "tier": "3"});
/// let bound = bind(&args, raw.as_object().unwrap()).unwrap();
/// assert_eq!(bound.get_str("name"), Some("Vault"));
/// assert_eq!(bound.get("tier"), Some(&json!(3)));
///
/// let raw = json!({"name": "Vault", "tier": "three"});
/// assert!(bind(&args, raw.as_object().unwrap()).is_err());
/// ```
pub fn bind(
    arguments: &[DeclaredArgument],
    raw: &Map<String, Value>,
) -> Result<BoundArguments, StructureFailure> {
    Specification::from_arguments(arguments).bind(raw)
}

/// Validated, normalized argument values keyed by argument id.
///
/// Absent optional arguments are present as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct BoundArguments(Map<String, Value>);

impl BoundArguments {
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.0.get(id)
    }

    pub fn get_str(&self, id: &str) -> Option<&str> {
        self.0.get(id).and_then(Value::as_str)
    }

    /// Whether `id` was supplied (bound to something other than `null`).
    pub fn is_present(&self, id: &str) -> bool {
        self.0.get(id).is_some_and(|v| !v.is_null())
    }

    /// Deserializes the whole record into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
