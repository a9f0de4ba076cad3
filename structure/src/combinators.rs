//! Union and intersection combinators.

use serde_json::{Map, Value};

use crate::failure::{FailureKind, PathSegment, StructureFailure};
use crate::primitives::{null, undefined};
use crate::structure::Structure;

/// Which member of a [`union`] owns an already-transformed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionSide {
    First,
    Second,
}

/// Accepts anything either member accepts.
///
/// The transform tries `first`, then `second`. When both fail, the failure is
/// [`NoMatchingUnionMember`](FailureKind::NoMatchingUnionMember) with both
/// trails prefixed by the member's name. Validation does not re-run the
/// transforms: `discriminator` decides from the produced value which member's
/// validation applies, so a value constructed directly is validated the same
/// way as a parsed one.
///
/// # Examples
///
/// ```
/// use command_syntax_structure::{string, union, UnionSide, FailureKind};
/// use serde_json::json;
///
/// let short_or_shouty = union(
///     string().length(..=3),
///     string().validate(|s| {
///         if s.chars().all(|c| !c.is_lowercase()) {
///             Ok(())
///         } else {
///             Err(command_syntax_structure::Violation::message("must be upper case"))
///         }
///     }),
///     |s| if s.chars().count() <= 3 { UnionSide::First } else { UnionSide::Second },
/// );
///
/// assert!(short_or_shouty.check(&json!("abc")).is_ok());
/// assert!(short_or_shouty.check(&json!("LOUD")).is_ok());
/// assert!(short_or_shouty.check(&json!("quiet")).is_err());
/// assert_eq!(short_or_shouty.check(&json!(1)).unwrap_err().kind, FailureKind::NoMatchingUnionMember);
/// ```
pub fn union<T: 'static>(
    first: Structure<T>,
    second: Structure<T>,
    discriminator: impl Fn(&T) -> UnionSide + Send + Sync + 'static,
) -> Structure<T> {
    let name = format!("{} | {}", first.name(), second.name());
    let (first_for_validate, second_for_validate) = (first.clone(), second.clone());

    Structure::with_validation(
        name,
        move |input| match first.transform(input) {
            Ok(value) => Ok(value),
            Err(first_failure) => match second.transform(input) {
                Ok(value) => Ok(value),
                Err(second_failure) => {
                    let mut failure = StructureFailure::aggregate(vec![
                        first_failure.prefixed(PathSegment::member(first.name())),
                        second_failure.prefixed(PathSegment::member(second.name())),
                    ])
                    .unwrap_or_else(|| StructureFailure::new(FailureKind::NoMatchingUnionMember, ""));
                    failure.kind = FailureKind::NoMatchingUnionMember;
                    Err(failure)
                }
            },
        },
        move |value: T| {
            let member = match discriminator(&value) {
                UnionSide::First => &first_for_validate,
                UnionSide::Second => &second_for_validate,
            };
            member
                .validate_transformed(value)
                .map_err(|failure| failure.prefixed(PathSegment::member(member.name())))
        },
    )
}

/// `inner` or `null`, producing `None` for null.
///
/// # Examples
///
/// ```
/// use command_syntax_structure::{nullable, leaves::SNOWFLAKE, FailureKind};
/// use serde_json::{json, Value};
///
/// let channel = nullable(SNOWFLAKE.clone());
/// assert_eq!(channel.check(&Value::Null).unwrap(), None);
/// assert!(channel.check(&json!("123456789012345678")).unwrap().is_some());
/// assert_eq!(channel.check(&json!("abc")).unwrap_err().kind, FailureKind::InvalidValue);
/// ```
pub fn nullable<T: 'static>(inner: Structure<T>) -> Structure<Option<T>> {
    let name = format!("Nullable<{}>", inner.name());
    union(absent_as_none(null()), inner.lift_some(), is_none_first).named(name)
}

/// `inner` or a missing value, producing `None` when missing.
pub fn optional<T: 'static>(inner: Structure<T>) -> Structure<Option<T>> {
    let name = format!("Optional<{}>", inner.name());
    union(absent_as_none(undefined()), inner.lift_some(), is_none_first).named(name)
}

fn is_none_first<T>(value: &Option<T>) -> UnionSide {
    if value.is_none() {
        UnionSide::First
    } else {
        UnionSide::Second
    }
}

fn absent_as_none<T: 'static>(marker: Structure<()>) -> Structure<Option<T>> {
    let name = marker.name().to_string();
    Structure::new(name, move |input| marker.check_input(input).map(|()| None))
}

/// Requires both members to accept the same input and merges their results.
///
/// Each member is fully checked (transform and validation) against the raw
/// input before `intersector` combines the two normalized values.
pub fn intersection<A, B, T>(
    first: Structure<A>,
    second: Structure<B>,
    intersector: impl Fn(A, B) -> T + Send + Sync + 'static,
) -> Structure<T>
where
    A: 'static,
    B: 'static,
    T: 'static,
{
    let name = format!("{} & {}", first.name(), second.name());
    Structure::new(name, move |input| {
        let left = first
            .check_input(input)
            .map_err(|f| f.prefixed(PathSegment::member(first.name())));
        let right = second
            .check_input(input)
            .map_err(|f| f.prefixed(PathSegment::member(second.name())));
        match (left, right) {
            (Ok(a), Ok(b)) => Ok(intersector(a, b)),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
            (Err(a), Err(b)) => Err(StructureFailure::aggregate(vec![a, b])
                .unwrap_or_else(|| StructureFailure::invalid_value("intersection failed"))),
        }
    })
}

/// Intersection of two object structures with a shallow, right-biased merge.
pub fn intersect_objects(
    first: Structure<Map<String, Value>>,
    second: Structure<Map<String, Value>>,
) -> Structure<Map<String, Value>> {
    intersection(first, second, |mut left, right| {
        left.extend(right);
        left
    })
}
