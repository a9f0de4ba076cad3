//! Composable runtime validation and normalization of untyped values.
//!
//! A [`Structure<T>`] turns an untyped [`serde_json::Value`] into a checked,
//! normalized `T`, or into a [`StructureFailure`] whose explanations carry
//! the path to the offending value.
//!
//! - Leaves: [`string`], [`number`], [`integer`], [`boolean`], [`any`],
//!   [`value`], [`null`], [`undefined`] and the domain constants in
//!   [`leaves`].
//! - Combinators: [`union`], [`nullable`], [`optional`], [`intersection`],
//!   [`intersect_objects`].
//! - Compound shapes: [`object`], [`object_with_catch_all`], [`array`],
//!   [`tuple`].
//! - Refinements: [`Structure::validate`] with the closures in
//!   [`validators`], [`Structure::before`], [`Structure::normalize`].
//!
//! # Example
//!
//! ```
//! use command_syntax_structure::*;
//! use serde_json::json;
//!
//! let role = object([
//!     ("name", string().length(1..=32).erase()),
//!     ("tier", nullable(leaves::UINT4_LIKE.clone()).erase()),
//!     ("channels", array(leaves::SNOWFLAKE.clone()).erase()),
//! ]);
//!
//! let checked = role
//!     .check(&json!({"name": "Vault", "tier": "3", "channels": ["123456789012345678"]}))
//!     .unwrap();
//! assert_eq!(checked["tier"], json!(3));
//!
//! let err = role
//!     .check(&json!({"name": "Vault", "tier": null, "channels": ["nope"]}))
//!     .unwrap_err();
//! assert_eq!(err.kind, FailureKind::InvalidValue);
//! assert!(err.first_line().unwrap().starts_with("channels[0]"));
//! ```

mod combinators;
mod compound;
mod failure;
pub mod leaves;
mod primitives;
mod structure;
pub mod validators;

pub use combinators::{UnionSide, intersect_objects, intersection, nullable, optional, union};
pub use compound::{array, object, object_with_catch_all, tuple};
pub use failure::{Explanation, FailureKind, PathSegment, StructureFailure, describe_input};
pub use primitives::{any, boolean, integer, null, number, string, undefined, value};
pub use structure::{Structure, TransformResult, ValidatedResult, Violation};
