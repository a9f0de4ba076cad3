//! Domain-specific leaf structures.
//!
//! These are process-wide constants; clone them (cheap) to compose:
//!
//! ```
//! use command_syntax_structure::{array, leaves::UINT4_LIKE};
//! use serde_json::json;
//!
//! let ids = array(UINT4_LIKE.clone());
//! assert_eq!(ids.check(&json!([1, "2"])).unwrap(), vec![1, 2]);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::primitives::{string, whole_number};
use crate::structure::{Structure, Violation};
use crate::validators;
use crate::{FailureKind, StructureFailure};

/// Largest value accepted by the `UINT4*` structures.
pub const UINT4_MAX: u64 = u32::MAX as u64;

/// Largest value accepted by the `UINT8*` structures.
pub const UINT8_MAX: u128 = u64::MAX as u128;

static SNOWFLAKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{17,20}$").expect("static regex must compile"));
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("static regex must compile"));
static HEX_DIGEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9a-fA-F]{32}|[0-9a-fA-F]{40}|[0-9a-fA-F]{64})$")
        .expect("static regex must compile")
});
static STATUS_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:www\.|mobile\.)?(?:twitter|x)\.com/[A-Za-z0-9_]{1,15}/status(?:es)?/\d+/?(?:[?#]\S*)?$",
    )
    .expect("static regex must compile")
});

/// Platform identifier: a 17 to 20 digit decimal string.
pub static SNOWFLAKE: LazyLock<Structure<String>> = LazyLock::new(|| {
    string()
        .named("Snowflake")
        .validate(validators::matches(&SNOWFLAKE_RE, "a 17 to 20 digit identifier"))
});

/// Unsigned 32-bit integer given as a JSON number.
pub static UINT4N: LazyLock<Structure<u32>> = LazyLock::new(|| {
    Structure::new("UInt4N", |input| match input {
        Some(Value::Number(n)) => {
            let whole = whole_number(n)?;
            bounded(whole, UINT4_MAX as u128)
                .and_then(|v| u32::try_from(v).map_err(|_| out_of_range("UInt4N", UINT4_MAX as u128)))
        }
        other => Err(StructureFailure::incorrect_type("a number", other)),
    })
});

/// Unsigned 32-bit integer given as a decimal string.
pub static UINT4S: LazyLock<Structure<u32>> = LazyLock::new(|| {
    string().convert("UInt4S", |s| {
        parse_unsigned(&s, UINT4_MAX as u128).and_then(|v| {
            u32::try_from(v).map_err(|_| bound_violation(UINT4_MAX as u128))
        })
    })
});

/// Unsigned 32-bit integer given as either a number or a decimal string.
pub static UINT4_LIKE: LazyLock<Structure<u32>> =
    LazyLock::new(|| number_or_digits("UInt4Like", UINT4N.clone(), UINT4_MAX as u128));

/// Unsigned 64-bit integer given as a JSON number.
pub static UINT8N: LazyLock<Structure<u64>> = LazyLock::new(|| {
    Structure::new("UInt8N", |input| match input {
        Some(Value::Number(n)) => {
            let whole = whole_number(n)?;
            bounded(whole, UINT8_MAX)
                .and_then(|v| u64::try_from(v).map_err(|_| out_of_range("UInt8N", UINT8_MAX)))
        }
        other => Err(StructureFailure::incorrect_type("a number", other)),
    })
});

/// Unsigned 64-bit integer given as a decimal string; parsed exactly.
pub static UINT8S: LazyLock<Structure<u64>> = LazyLock::new(|| {
    string().convert("UInt8S", |s| {
        parse_unsigned(&s, UINT8_MAX)
            .and_then(|v| u64::try_from(v).map_err(|_| bound_violation(UINT8_MAX)))
    })
});

/// Unsigned 64-bit integer given as either a number or a decimal string.
pub static UINT8_LIKE: LazyLock<Structure<u64>> =
    LazyLock::new(|| number_or_digits("UInt8Like", UINT8N.clone(), UINT8_MAX));

/// Boolean encoded as `yes`/`no`/`true`/`false`, case-insensitive.
pub static BOOLEAN_S: LazyLock<Structure<bool>> = LazyLock::new(|| {
    string().convert("BooleanS", |s| {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "yes" | "true" => Ok(true),
            "no" | "false" => Ok(false),
            _ => Err(Violation::new(move |subject| {
                format!("{subject} must be one of yes, no, true or false, received {s:?}")
            })),
        }
    })
});

/// MD5, SHA-1 or SHA-256 hex digest, normalized to lower case.
pub static HEX_DIGEST: LazyLock<Structure<String>> = LazyLock::new(|| {
    string()
        .named("HexDigest")
        .validate(validators::matches(&HEX_DIGEST_RE, "a hex digest"))
        .normalize(|s| s.to_ascii_lowercase())
});

/// Link to a single post on twitter.com / x.com.
pub static STATUS_LINK: LazyLock<Structure<String>> = LazyLock::new(|| {
    string()
        .named("StatusLink")
        .validate(validators::matches(&STATUS_LINK_RE, "a link to a post"))
});

/// Hex digest of exactly `length` characters, normalized to lower case.
pub fn hex_digest(length: usize) -> Structure<String> {
    let name = format!("HexDigest{length}");
    string()
        .named(name)
        .validate(move |s| {
            if s.len() == length && s.chars().all(|c| c.is_ascii_hexdigit()) {
                Ok(())
            } else {
                Err(Violation::new(move |subject| {
                    format!("{subject} must be {length} hexadecimal characters")
                }))
            }
        })
        .normalize(|s| s.to_ascii_lowercase())
}

fn bounded(value: i128, max: u128) -> Result<u128, StructureFailure> {
    match u128::try_from(value) {
        Ok(v) if v <= max => Ok(v),
        _ => Err(StructureFailure::invalid_value(format!(
            "{value} is outside the range 0 to {max}"
        ))),
    }
}

fn out_of_range(name: &str, max: u128) -> StructureFailure {
    StructureFailure::new(
        FailureKind::InvalidValue,
        format!("{name} must be between 0 and {max}"),
    )
}

fn bound_violation(max: u128) -> Violation {
    Violation::new(move |subject| format!("{subject} must be between 0 and {max}"))
}

fn parse_unsigned(s: &str, max: u128) -> Result<u128, Violation> {
    if !DIGITS_RE.is_match(s) {
        let shown = s.to_string();
        return Err(Violation::new(move |subject| {
            format!("{subject} must be a non-negative decimal integer, received {shown:?}")
        }));
    }
    // More than 39 digits cannot fit a u128; anything that long is out of range anyway.
    match s.parse::<u128>() {
        Ok(v) if v <= max => Ok(v),
        _ => Err(bound_violation(max)),
    }
}

/// Digit strings are parsed exactly against `max`; everything else goes to `numeric`.
fn number_or_digits<T>(name: &str, numeric: Structure<T>, max: u128) -> Structure<T>
where
    T: TryFrom<u128> + 'static,
{
    let subject = name.to_string();
    Structure::new(name, move |input| match input {
        Some(Value::String(s)) if DIGITS_RE.is_match(s) => {
            let parsed = parse_unsigned(s, max)
                .map_err(|violation| StructureFailure::invalid_value(violation.describe(&subject)))?;
            T::try_from(parsed).map_err(|_| out_of_range(&subject, max))
        }
        other => numeric.check_input(other),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::nullable;

    #[test]
    fn test_snowflake() {
        assert!(SNOWFLAKE.check(&json!("123456789012345678")).is_ok());
        let err = SNOWFLAKE.check(&json!("abc")).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidValue);
        assert_eq!(
            SNOWFLAKE.check(&json!(123)).unwrap_err().kind,
            FailureKind::IncorrectType
        );
    }

    #[test]
    fn test_nullable_snowflake() {
        let channel = nullable(SNOWFLAKE.clone());
        assert_eq!(channel.check(&Value::Null).unwrap(), None);
        assert_eq!(
            channel.check(&json!("123456789012345678")).unwrap(),
            Some("123456789012345678".to_string())
        );
        assert_eq!(
            channel.check(&json!("abc")).unwrap_err().kind,
            FailureKind::InvalidValue
        );
    }

    #[test]
    fn test_uint4_bounds() {
        assert_eq!(UINT4N.check(&json!(0)).unwrap(), 0);
        assert_eq!(UINT4N.check(&json!(4294967295u64)).unwrap(), u32::MAX);
        assert!(UINT4N.check(&json!(4294967296u64)).is_err());
        assert!(UINT4N.check(&json!(-1)).is_err());
        assert!(UINT4N.check(&json!(1.5)).is_err());
        assert_eq!(
            UINT4N.check(&json!("1")).unwrap_err().kind,
            FailureKind::IncorrectType
        );
    }

    #[test]
    fn test_uint4_string_and_like() {
        assert_eq!(UINT4S.check(&json!("42")).unwrap(), 42);
        assert!(UINT4S.check(&json!("4294967296")).is_err());
        assert!(UINT4S.check(&json!("-4")).is_err());
        assert!(UINT4S.check(&json!(4)).is_err());

        assert_eq!(UINT4_LIKE.check(&json!("7")).unwrap(), 7);
        assert_eq!(UINT4_LIKE.check(&json!(7)).unwrap(), 7);
        assert_eq!(
            UINT4_LIKE.check(&json!("seven")).unwrap_err().kind,
            FailureKind::IncorrectType
        );
    }

    #[test]
    fn test_like_digit_strings_past_u64_are_out_of_range() {
        let err = UINT4_LIKE.check(&json!("99999999999999999999")).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidValue);
        assert_eq!(
            err.first_line().unwrap(),
            "UInt4Like must be between 0 and 4294967295"
        );
        assert_eq!(
            UINT4_LIKE.check(&json!("4294967296")).unwrap_err().kind,
            FailureKind::InvalidValue
        );

        let err = UINT8_LIKE.check(&json!("18446744073709551616")).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidValue);
        assert_eq!(
            err.first_line().unwrap(),
            "UInt8Like must be between 0 and 18446744073709551615"
        );
        assert_eq!(
            UINT8_LIKE
                .check(&json!("9".repeat(60)))
                .unwrap_err()
                .kind,
            FailureKind::InvalidValue
        );
    }

    #[test]
    fn test_uint8_is_exact() {
        assert_eq!(
            UINT8S.check(&json!("18446744073709551615")).unwrap(),
            u64::MAX
        );
        assert!(UINT8S.check(&json!("18446744073709551616")).is_err());
        assert!(UINT8S.check(&json!("99999999999999999999999999999999999999999")).is_err());
        assert_eq!(UINT8N.check(&json!(u64::MAX)).unwrap(), u64::MAX);
        assert_eq!(
            UINT8_LIKE.check(&json!("18446744073709551615")).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_boolean_s() {
        assert!(BOOLEAN_S.check(&json!("YES")).unwrap());
        assert!(BOOLEAN_S.check(&json!("true")).unwrap());
        assert!(!BOOLEAN_S.check(&json!("No")).unwrap());
        assert!(!BOOLEAN_S.check(&json!("false")).unwrap());
        assert!(BOOLEAN_S.check(&json!("maybe")).is_err());
    }

    #[test]
    fn test_status_link() {
        assert!(
            STATUS_LINK
                .check(&json!("https://twitter.com/someuser/status/123456"))
                .is_ok()
        );
        assert!(
            STATUS_LINK
                .check(&json!("https://x.com/some_user/status/99?s=20"))
                .is_ok()
        );
        assert!(STATUS_LINK.check(&json!("https://example.com")).is_err());
        assert!(
            STATUS_LINK
                .check(&json!("https://twitter.com/someuser"))
                .is_err()
        );
    }

    #[test]
    fn test_hex_digests() {
        let md5 = "D41D8CD98F00B204E9800998ECF8427E";
        assert_eq!(
            HEX_DIGEST.check(&json!(md5)).unwrap(),
            md5.to_ascii_lowercase()
        );
        assert!(HEX_DIGEST.check(&json!("xyz")).is_err());
        assert!(hex_digest(8).check(&json!("deadBEEF")).is_ok());
        assert!(hex_digest(8).check(&json!("deadbee")).is_err());
    }
}
