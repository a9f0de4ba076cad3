//! Syntax-string compiler, argument extractor and specification binder.
//!
//! A command declares its arguments ([`DeclaredArgument`]) and a syntax
//! string describing how they appear in a chat message:
//!
//! - `<prefix>` stands for the active command prefix and must come first;
//! - `$N` captures the `N`th declared argument (1-based);
//! - `{opt $N}[ ... ]` is a key-off block, present only when optional
//!   argument `N` is supplied. Blocks nest.
//!
//! The pipeline is [`parse_syntax`] → [`compile`] (cached by
//! [`PatternCache`]) → [`extract`] → [`bind`].
//!
//! # Example
//!
//! ```
//! use command_syntax_core::*;
//!
//! let cache = PatternCache::default();
//! let args = [
//!     DeclaredArgument::required("name", "Role name"),
//!     DeclaredArgument::optional("tier", "Tier"),
//!     DeclaredArgument::required("info", "Description"),
//! ];
//! let syntax = "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3";
//!
//! let extracted = extract(
//!     &cache,
//!     "%",
//!     &args,
//!     syntax,
//!     "%role set NAME Vault TIER Expert INFO a vault jump",
//! );
//! assert!(extracted.succeeded);
//!
//! let bound = bind(&args, &extracted.values_as_json()).unwrap();
//! assert_eq!(bound.get_str("tier"), Some("Expert"));
//! ```

mod bind;
mod cache;
mod compiler;
mod error;
mod extract;
mod parser;
mod types;
mod usage;

pub use bind::{BoundArguments, Specification, bind};
pub use cache::{CacheKey, PatternCache};
pub use compiler::{CompiledCommand, argument_group, compile, compile_segments, key_off_group};
pub use error::{CompileError, ParseError, ParseFailureReason};
pub use extract::{ExtractionResult, KeyOffInconsistency, extract, extract_compiled};
pub use parser::{PREFIX_TAG, parse_syntax};
pub use types::{DeclaredArgument, SyntaxSegment, keyed_off_arguments, referenced_arguments};
pub use usage::render_usage;
