//! Reusable refinements for [`Structure::validate`](crate::Structure::validate).
//!
//! Each function returns a closure that yields a [`Violation`] describing the
//! exact bound that was violated.

use std::fmt::Display;
use std::ops::{Bound, RangeBounds};

use crate::structure::Violation;

/// Owned copy of a range's bounds, so validators can outlive the range value.
#[derive(Debug, Clone, Copy)]
struct Bounds<N> {
    start: Bound<N>,
    end: Bound<N>,
}

impl<N: Copy + PartialOrd + Display> Bounds<N> {
    fn from_range(range: &impl RangeBounds<N>) -> Self {
        Self {
            start: range.start_bound().cloned(),
            end: range.end_bound().cloned(),
        }
    }

    fn contains(&self, value: &N) -> bool {
        let above = match self.start {
            Bound::Included(min) => *value >= min,
            Bound::Excluded(min) => *value > min,
            Bound::Unbounded => true,
        };
        let below = match self.end {
            Bound::Included(max) => *value <= max,
            Bound::Excluded(max) => *value < max,
            Bound::Unbounded => true,
        };
        above && below
    }

    fn describe(&self) -> String {
        match (self.start, self.end) {
            (Bound::Included(min), Bound::Included(max)) => format!("between {min} and {max}"),
            (Bound::Included(min), Bound::Excluded(max)) => {
                format!("at least {min} and less than {max}")
            }
            (Bound::Excluded(min), Bound::Included(max)) => {
                format!("greater than {min} and at most {max}")
            }
            (Bound::Excluded(min), Bound::Excluded(max)) => {
                format!("greater than {min} and less than {max}")
            }
            (Bound::Included(min), Bound::Unbounded) => format!("at least {min}"),
            (Bound::Excluded(min), Bound::Unbounded) => format!("greater than {min}"),
            (Bound::Unbounded, Bound::Included(max)) => format!("at most {max}"),
            (Bound::Unbounded, Bound::Excluded(max)) => format!("less than {max}"),
            (Bound::Unbounded, Bound::Unbounded) => "any value".to_string(),
        }
    }
}

/// Requires a whole number.
pub fn integer() -> impl Fn(&f64) -> Result<(), Violation> + Send + Sync + 'static {
    |value: &f64| {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(())
        } else {
            let value = *value;
            Err(Violation::new(move |subject| {
                format!("{subject} must be an integer, received {value}")
            }))
        }
    }
}

/// Requires a value strictly greater than zero.
pub fn positive<N>() -> impl Fn(&N) -> Result<(), Violation> + Send + Sync + 'static
where
    N: PartialOrd + Default + Display + 'static,
{
    |value: &N| {
        if *value > N::default() {
            Ok(())
        } else {
            let shown = value.to_string();
            Err(Violation::new(move |subject| {
                format!("{subject} must be positive, received {shown}")
            }))
        }
    }
}

/// Requires a value inside `range`.
///
/// # Examples
///
/// ```
/// use command_syntax_structure::{number, validators};
/// use serde_json::json;
///
/// let percent = number().validate(validators::in_range(0.0..=100.0)).named("Percentage");
/// let err = percent.check(&json!(101)).unwrap_err();
/// assert_eq!(err.first_line().unwrap(), "Percentage must be between 0 and 100, received 101");
/// ```
pub fn in_range<N>(
    range: impl RangeBounds<N>,
) -> impl Fn(&N) -> Result<(), Violation> + Send + Sync + 'static
where
    N: Copy + PartialOrd + Display + Send + Sync + 'static,
{
    let bounds = Bounds::from_range(&range);
    move |value: &N| {
        if bounds.contains(value) {
            Ok(())
        } else {
            let expected = bounds.describe();
            let shown = value.to_string();
            Err(Violation::new(move |subject| {
                format!("{subject} must be {expected}, received {shown}")
            }))
        }
    }
}

/// Requires a string whose length in characters is inside `range`.
pub fn length(
    range: impl RangeBounds<usize>,
) -> impl Fn(&String) -> Result<(), Violation> + Send + Sync + 'static {
    let bounds = Bounds::from_range(&range);
    move |value: &String| {
        if bounds.contains(&value.chars().count()) {
            Ok(())
        } else {
            let expected = bounds.describe();
            Err(Violation::new(move |subject| {
                format!("{subject} must be {expected} characters long")
            }))
        }
    }
}

/// Requires a string matching `pattern`; `what` names the expected shape.
pub fn matches(
    pattern: &'static regex::Regex,
    what: &'static str,
) -> impl Fn(&String) -> Result<(), Violation> + Send + Sync + 'static {
    move |value: &String| {
        if pattern.is_match(value) {
            Ok(())
        } else {
            let shown = value.clone();
            Err(Violation::new(move |subject| {
                format!("{subject} must be {what}, received {shown:?}")
            }))
        }
    }
}

/// Requires one of a fixed set of strings, compared case-insensitively.
pub fn one_of(
    choices: Vec<String>,
) -> impl Fn(&String) -> Result<(), Violation> + Send + Sync + 'static {
    move |value: &String| {
        if choices.iter().any(|c| c.eq_ignore_ascii_case(value)) {
            Ok(())
        } else {
            let listed = choices.join(", ");
            let shown = value.clone();
            Err(Violation::new(move |subject| {
                format!("{subject} must be one of: {listed}; received {shown:?}")
            }))
        }
    }
}
