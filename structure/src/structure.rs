//! The [`Structure`] value type.
//!
//! A structure is a named pair of pure functions:
//!
//! - `transform` converts an untyped input (`Option<&Value>`, where `None`
//!   stands for a missing/undefined value) into a typed `T`;
//! - `validate_transformed` refines an already-typed `T`, optionally
//!   normalizing it.
//!
//! [`check`](Structure::check) runs both. Keeping the phases apart lets
//! [`validate`](Structure::validate) stack refinements without re-deriving the
//! base conversion, and lets [`before`](Structure::before) insert
//! preprocessing ahead of a fixed transform.
//!
//! Structures are immutable and cheap to clone; every method returns a new
//! structure.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::failure::{FailureKind, StructureFailure};

/// Result of a transform step.
pub type TransformResult<T> = Result<T, StructureFailure>;

/// Result of a full check (transform followed by validation).
pub type ValidatedResult<T> = Result<T, StructureFailure>;

type TransformFn<T> = dyn Fn(Option<&Value>) -> TransformResult<T> + Send + Sync;
/// Validation step; receives the structure's current name as subject.
type ValidateFn<T> = dyn Fn(T, &str) -> TransformResult<T> + Send + Sync;

/// Deferred failure message produced by a validator.
///
/// The closure receives the subject (the structure's name) so the text can
/// name both the value and the exact bound it violated.
pub struct Violation(Box<dyn FnOnce(&str) -> String + Send>);

impl Violation {
    pub fn new(describe: impl FnOnce(&str) -> String + Send + 'static) -> Self {
        Self(Box::new(describe))
    }

    /// A violation whose message does not mention the subject.
    pub fn message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| message)
    }

    pub fn describe(self, subject: &str) -> String {
        (self.0)(subject)
    }
}

impl fmt::Debug for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Violation(..)")
    }
}

/// A named, composable validator/normalizer producing values of type `T`.
///
/// # Examples
///
/// ```
/// use command_syntax_structure::{string, FailureKind};
/// use serde_json::json;
///
/// let username = string().length(3..=16).named("Username");
///
/// assert_eq!(username.check(&json!("vault")).unwrap(), "vault");
///
/// let err = username.check(&json!("ab")).unwrap_err();
/// assert_eq!(err.kind, FailureKind::InvalidValue);
/// assert_eq!(err.first_line().unwrap(), "Username must be between 3 and 16 characters long");
/// ```
pub struct Structure<T> {
    name: String,
    transform: Arc<TransformFn<T>>,
    validate_transformed: Arc<ValidateFn<T>>,
}

impl<T> Clone for Structure<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            transform: Arc::clone(&self.transform),
            validate_transformed: Arc::clone(&self.validate_transformed),
        }
    }
}

impl<T> fmt::Debug for Structure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure").field("name", &self.name).finish()
    }
}

impl<T: 'static> Structure<T> {
    /// Creates a structure whose validation step accepts every transformed value.
    pub fn new(
        name: impl Into<String>,
        transform: impl Fn(Option<&Value>) -> TransformResult<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
            validate_transformed: Arc::new(|value: T, _: &str| -> TransformResult<T> { Ok(value) }),
        }
    }

    /// Creates a structure from explicit transform and validation steps.
    pub fn with_validation(
        name: impl Into<String>,
        transform: impl Fn(Option<&Value>) -> TransformResult<T> + Send + Sync + 'static,
        validate_transformed: impl Fn(T) -> TransformResult<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
            validate_transformed: Arc::new(move |value: T, _: &str| validate_transformed(value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs only the transform step.
    pub fn transform(&self, input: Option<&Value>) -> TransformResult<T> {
        (self.transform)(input)
    }

    /// Runs only the validation step on an already-typed value.
    pub fn validate_transformed(&self, value: T) -> TransformResult<T> {
        (self.validate_transformed)(value, &self.name)
    }

    /// Transforms and validates a present value.
    pub fn check(&self, input: &Value) -> ValidatedResult<T> {
        self.check_input(Some(input))
    }

    /// Transforms and validates a possibly-missing value.
    pub fn check_input(&self, input: Option<&Value>) -> ValidatedResult<T> {
        let transformed = self.transform(input)?;
        self.validate_transformed(transformed)
    }

    /// Returns the same structure under a different name.
    ///
    /// Refinements already attached with [`validate`](Self::validate) report
    /// violations under the new name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a refinement to the validation step.
    ///
    /// The refinement runs after all existing validation. A violation becomes
    /// an [`InvalidValue`](FailureKind::InvalidValue) failure whose message is
    /// built with the structure's name as subject.
    pub fn validate(
        self,
        validator: impl Fn(&T) -> Result<(), Violation> + Send + Sync + 'static,
    ) -> Self {
        let previous = self.validate_transformed;
        Self {
            name: self.name,
            transform: self.transform,
            validate_transformed: Arc::new(move |value: T, subject: &str| {
                let value = previous(value, subject)?;
                match validator(&value) {
                    Ok(()) => Ok(value),
                    Err(violation) => Err(StructureFailure::new(
                        FailureKind::InvalidValue,
                        violation.describe(subject),
                    )),
                }
            }),
        }
    }

    /// Appends a normalizing step to the validation phase.
    pub fn normalize(self, normalizer: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        let previous = self.validate_transformed;
        Self {
            name: self.name,
            transform: self.transform,
            validate_transformed: Arc::new(move |value: T, subject: &str| {
                previous(value, subject).map(&normalizer)
            }),
        }
    }

    /// Inserts a preprocessing step ahead of the transform.
    ///
    /// `preprocess` only sees present values; a missing input is passed
    /// through untouched.
    pub fn before(self, preprocess: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        let inner = self.transform;
        Self {
            name: self.name,
            transform: Arc::new(move |input: Option<&Value>| match input {
                Some(value) => {
                    let prepared = preprocess(value);
                    inner(Some(&prepared))
                }
                None => inner(None),
            }),
            validate_transformed: self.validate_transformed,
        }
    }

    /// Builds a structure of a narrower type on top of this one.
    ///
    /// The new transform fully checks the input against `self`, then applies
    /// `convert`. A violation becomes an
    /// [`InvalidValue`](FailureKind::InvalidValue) failure named `name`.
    pub fn convert<U: 'static>(
        self,
        name: impl Into<String>,
        convert: impl Fn(T) -> Result<U, Violation> + Send + Sync + 'static,
    ) -> Structure<U> {
        let name = name.into();
        let subject = name.clone();
        Structure::new(name, move |input| {
            let checked = self.check_input(input)?;
            convert(checked).map_err(|violation| {
                StructureFailure::new(FailureKind::InvalidValue, violation.describe(&subject))
            })
        })
    }

    /// Lifts into `Option<T>`, producing `Some` on success.
    ///
    /// Validation of `None` succeeds without consulting `self`; callers
    /// dispatch `None` elsewhere.
    pub(crate) fn lift_some(self) -> Structure<Option<T>> {
        let transform = self.transform;
        let validate = self.validate_transformed;
        Structure {
            name: self.name,
            transform: Arc::new(move |input: Option<&Value>| transform(input).map(Some)),
            validate_transformed: Arc::new(move |value: Option<T>, subject: &str| match value {
                Some(inner) => validate(inner, subject).map(Some),
                None => Ok(None),
            }),
        }
    }
}

impl<T> Structure<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// Erases the output type into a [`Value`].
    ///
    /// Used to put structures of different types into the same object shape
    /// or tuple. Validation of an erased value deserializes it back into `T`,
    /// so refinements on the original structure keep working.
    pub fn erase(self) -> Structure<Value> {
        let transform = self.transform;
        let validate = self.validate_transformed;
        Structure {
            name: self.name,
            transform: Arc::new(move |input: Option<&Value>| {
                transform(input).and_then(|value| to_value(&value))
            }),
            validate_transformed: Arc::new(move |value: Value, subject: &str| {
                let typed: T = serde_json::from_value(value).map_err(|e| {
                    StructureFailure::new(
                        FailureKind::IncorrectType,
                        format!("value does not fit {subject}: {e}"),
                    )
                })?;
                validate(typed, subject).and_then(|value| to_value(&value))
            }),
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> TransformResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        StructureFailure::new(
            FailureKind::InvalidValue,
            format!("value cannot be represented: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{number, string};

    #[test]
    fn test_validate_chains_after_existing_validation() {
        let even_and_small = number()
            .validate(|n| {
                if *n % 2.0 == 0.0 {
                    Ok(())
                } else {
                    Err(Violation::new(|s| format!("{s} must be even")))
                }
            })
            .validate(|n| {
                if *n < 10.0 {
                    Ok(())
                } else {
                    Err(Violation::message("too big"))
                }
            });

        assert_eq!(even_and_small.check(&json!(4)).unwrap(), 4.0);
        assert_eq!(
            even_and_small.check(&json!(3)).unwrap_err().lines(),
            vec!["Number must be even"]
        );
        assert_eq!(
            even_and_small.check(&json!(12)).unwrap_err().lines(),
            vec!["too big"]
        );
    }

    #[test]
    fn test_before_runs_ahead_of_transform() {
        let trimmed = string().before(|v| match v {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        });
        assert_eq!(trimmed.check(&json!("  hi ")).unwrap(), "hi");
        assert!(trimmed.check_input(None).is_err());
    }

    #[test]
    fn test_transform_and_validate_are_separable() {
        let short = string().length(..=3);
        let transformed = short.transform(Some(&json!("abcdef"))).unwrap();
        assert_eq!(transformed, "abcdef");
        assert!(short.validate_transformed(transformed).is_err());
    }

    #[test]
    fn test_erase_keeps_refinements() {
        let erased = string().length(1..).erase();
        assert_eq!(erased.check(&json!("x")).unwrap(), json!("x"));
        assert!(erased.check(&json!("")).is_err());
        assert_eq!(
            erased.check(&json!(1)).unwrap_err().kind,
            FailureKind::IncorrectType
        );
    }

    #[test]
    fn test_name_applied_after_validate_reaches_message() {
        let username = string().length(3..=16).named("Username");
        assert_eq!(username.name(), "Username");
        assert_eq!(
            username.check(&json!("ab")).unwrap_err().lines(),
            vec!["Username must be between 3 and 16 characters long"]
        );

        let renamed_again = username.clone().named("Handle");
        assert_eq!(
            renamed_again.check(&json!("ab")).unwrap_err().first_line().unwrap(),
            "Handle must be between 3 and 16 characters long"
        );

        let erased = string().length(..=2).named("Code").erase();
        assert_eq!(
            erased.check(&json!("abc")).unwrap_err().first_line().unwrap(),
            "Code must be at most 2 characters long"
        );
    }

    #[test]
    fn test_normalize_rewrites_value() {
        let lower = string().normalize(|s| s.to_lowercase());
        assert_eq!(lower.check(&json!("ABC")).unwrap(), "abc");
    }
}
