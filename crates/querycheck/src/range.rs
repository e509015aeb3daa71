//! Monitoring-plugin threshold ranges.
//!
//! Supported forms, tried in this order (first match wins):
//!
//! | Syntax  | Alert when                |
//! |---------|---------------------------|
//! | `N:`    | value < N                 |
//! | `~:N`   | value > N                 |
//! | `N:M`   | value < N or value > M    |
//! | `@N:M`  | N <= value <= M           |
//! | `N`     | value < 0 or value > N    |
//!
//! Only non-negative integer boundaries are accepted. Values are truncated
//! toward zero before comparison.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::trace;

/// Threshold parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("\"{0}\" is not a recognised threshold range")]
    Syntax(String),
}

/// Which of the five range forms a threshold uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKind {
    AtLeast,
    AtMost,
    OutsideClosed,
    InsideClosed,
    SimpleNonNegativeUpper,
}

/// A parsed threshold range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSpec {
    /// `N:`
    AtLeast { low: i64 },
    /// `~:N`
    AtMost { high: i64 },
    /// `N:M`
    OutsideClosed { low: i64, high: i64 },
    /// `@N:M`, alerts when the value falls inside
    InsideClosed { low: i64, high: i64 },
    /// `N`, same as `0:N`
    SimpleNonNegativeUpper { high: i64 },
}

/// Result of testing a value against a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeOutcome {
    Within,
    Violated,
}

impl RangeOutcome {
    pub fn is_violated(self) -> bool {
        self == RangeOutcome::Violated
    }
}

type Extractor = fn(&Captures<'_>, &str) -> Result<RangeSpec, RangeError>;

/// Grammar table in priority order.
static PATTERNS: LazyLock<Vec<(Regex, Extractor)>> = LazyLock::new(|| {
    let table: [(&str, Extractor); 5] = [
        (r"^([0-9]+):$", at_least),
        (r"^~:([0-9]+)$", at_most),
        (r"^([0-9]+):([0-9]+)$", outside_closed),
        (r"^@([0-9]+):([0-9]+)$", inside_closed),
        (r"^([0-9]+)$", simple_upper),
    ];

    table
        .into_iter()
        .map(|(pattern, extract)| {
            (
                Regex::new(pattern).expect("range grammar patterns are valid"),
                extract,
            )
        })
        .collect()
});

fn at_least(caps: &Captures<'_>, raw: &str) -> Result<RangeSpec, RangeError> {
    Ok(RangeSpec::AtLeast {
        low: boundary(caps, 1, raw)?,
    })
}

fn at_most(caps: &Captures<'_>, raw: &str) -> Result<RangeSpec, RangeError> {
    Ok(RangeSpec::AtMost {
        high: boundary(caps, 1, raw)?,
    })
}

fn outside_closed(caps: &Captures<'_>, raw: &str) -> Result<RangeSpec, RangeError> {
    Ok(RangeSpec::OutsideClosed {
        low: boundary(caps, 1, raw)?,
        high: boundary(caps, 2, raw)?,
    })
}

fn inside_closed(caps: &Captures<'_>, raw: &str) -> Result<RangeSpec, RangeError> {
    Ok(RangeSpec::InsideClosed {
        low: boundary(caps, 1, raw)?,
        high: boundary(caps, 2, raw)?,
    })
}

fn simple_upper(caps: &Captures<'_>, raw: &str) -> Result<RangeSpec, RangeError> {
    Ok(RangeSpec::SimpleNonNegativeUpper {
        high: boundary(caps, 1, raw)?,
    })
}

/// Captured groups are all ASCII digits, so the only parse failure is a
/// value past `i64::MAX`; such boundaries saturate.
fn boundary(caps: &Captures<'_>, group: usize, raw: &str) -> Result<i64, RangeError> {
    let digits = caps
        .get(group)
        .ok_or_else(|| RangeError::Syntax(raw.to_string()))?
        .as_str();
    Ok(digits.parse().unwrap_or(i64::MAX))
}

impl RangeSpec {
    /// Parse a threshold string.
    ///
    /// Malformed input is an ordinary `Err`, never a panic.
    pub fn parse(raw: &str) -> Result<Self, RangeError> {
        for (regex, extract) in PATTERNS.iter() {
            if let Some(caps) = regex.captures(raw) {
                let spec = extract(&caps, raw)?;
                trace!(raw, kind = ?spec.kind(), "parsed threshold range");
                return Ok(spec);
            }
        }
        Err(RangeError::Syntax(raw.to_string()))
    }

    pub fn kind(&self) -> RangeKind {
        match self {
            RangeSpec::AtLeast { .. } => RangeKind::AtLeast,
            RangeSpec::AtMost { .. } => RangeKind::AtMost,
            RangeSpec::OutsideClosed { .. } => RangeKind::OutsideClosed,
            RangeSpec::InsideClosed { .. } => RangeKind::InsideClosed,
            RangeSpec::SimpleNonNegativeUpper { .. } => RangeKind::SimpleNonNegativeUpper,
        }
    }

    pub fn low(&self) -> Option<i64> {
        match *self {
            RangeSpec::AtLeast { low }
            | RangeSpec::OutsideClosed { low, .. }
            | RangeSpec::InsideClosed { low, .. } => Some(low),
            RangeSpec::AtMost { .. } | RangeSpec::SimpleNonNegativeUpper { .. } => None,
        }
    }

    pub fn high(&self) -> Option<i64> {
        match *self {
            RangeSpec::AtMost { high }
            | RangeSpec::OutsideClosed { high, .. }
            | RangeSpec::InsideClosed { high, .. }
            | RangeSpec::SimpleNonNegativeUpper { high } => Some(high),
            RangeSpec::AtLeast { .. } => None,
        }
    }

    /// Test a value, truncating it toward zero first.
    pub fn evaluate(&self, value: f64) -> RangeOutcome {
        // `as` saturates at the i64 bounds and maps NaN to 0.
        self.evaluate_integer(value.trunc() as i64)
    }

    /// Test an already-integral value.
    pub fn evaluate_integer(&self, value: i64) -> RangeOutcome {
        let violated = match *self {
            RangeSpec::AtLeast { low } => value < low,
            RangeSpec::AtMost { high } => value > high,
            RangeSpec::OutsideClosed { low, high } => value < low || value > high,
            RangeSpec::InsideClosed { low, high } => low <= value && value <= high,
            RangeSpec::SimpleNonNegativeUpper { high } => value < 0 || value > high,
        };

        if violated {
            RangeOutcome::Violated
        } else {
            RangeOutcome::Within
        }
    }
}

impl FromStr for RangeSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeSpec::parse(s)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::AtLeast { low } => write!(f, "{low}:"),
            RangeSpec::AtMost { high } => write!(f, "~:{high}"),
            RangeSpec::OutsideClosed { low, high } => write!(f, "{low}:{high}"),
            RangeSpec::InsideClosed { low, high } => write!(f, "@{low}:{high}"),
            RangeSpec::SimpleNonNegativeUpper { high } => write!(f, "{high}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_form() {
        assert_eq!(RangeSpec::parse("10:").unwrap(), RangeSpec::AtLeast { low: 10 });
        assert_eq!(RangeSpec::parse("~:10").unwrap(), RangeSpec::AtMost { high: 10 });
        assert_eq!(
            RangeSpec::parse("5:10").unwrap(),
            RangeSpec::OutsideClosed { low: 5, high: 10 }
        );
        assert_eq!(
            RangeSpec::parse("@5:10").unwrap(),
            RangeSpec::InsideClosed { low: 5, high: 10 }
        );
        assert_eq!(
            RangeSpec::parse("10").unwrap(),
            RangeSpec::SimpleNonNegativeUpper { high: 10 }
        );
    }

    #[test]
    fn test_outside_closed_wins_over_simple() {
        let spec = RangeSpec::parse("5:10").unwrap();
        assert_eq!(spec.kind(), RangeKind::OutsideClosed);
        assert_eq!(spec.low(), Some(5));
        assert_eq!(spec.high(), Some(10));
    }

    #[test]
    fn test_parse_failures() {
        for raw in ["abc", "bogus!!", "", "-5", "1.5", "~:", ":5", "@5", "@5:", "5:10:15", " 5", "5 "] {
            assert!(
                matches!(RangeSpec::parse(raw), Err(RangeError::Syntax(_))),
                "expected syntax failure for {raw:?}"
            );
        }
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Arabic-Indic digits are \d in Unicode regex but not valid boundaries.
        assert!(RangeSpec::parse("\u{0661}\u{0662}").is_err());
    }

    #[test]
    fn test_oversized_boundary_saturates() {
        let spec = RangeSpec::parse("99999999999999999999").unwrap();
        assert_eq!(spec, RangeSpec::SimpleNonNegativeUpper { high: i64::MAX });
        assert!(!spec.evaluate(5.0).is_violated());

        let spec = RangeSpec::parse("10:99999999999999999999").unwrap();
        assert_eq!(spec, RangeSpec::OutsideClosed { low: 10, high: i64::MAX });
        assert!(spec.evaluate(9.0).is_violated());
    }

    #[test]
    fn test_at_least() {
        let spec = RangeSpec::AtLeast { low: 10 };
        assert_eq!(spec.evaluate(9.0), RangeOutcome::Violated);
        assert_eq!(spec.evaluate(10.0), RangeOutcome::Within);
        assert_eq!(spec.evaluate(1000.0), RangeOutcome::Within);
    }

    #[test]
    fn test_at_most() {
        let spec = RangeSpec::AtMost { high: 10 };
        assert_eq!(spec.evaluate(10.0), RangeOutcome::Within);
        assert_eq!(spec.evaluate(11.0), RangeOutcome::Violated);
        assert_eq!(spec.evaluate(-50.0), RangeOutcome::Within);
    }

    #[test]
    fn test_outside_closed() {
        let spec = RangeSpec::OutsideClosed { low: 5, high: 10 };
        assert!(spec.evaluate(4.0).is_violated());
        assert!(!spec.evaluate(5.0).is_violated());
        assert!(!spec.evaluate(10.0).is_violated());
        assert!(spec.evaluate(11.0).is_violated());
    }

    #[test]
    fn test_inside_closed_is_inverted() {
        let spec = RangeSpec::InsideClosed { low: 5, high: 10 };
        assert!(!spec.evaluate(4.0).is_violated());
        assert!(spec.evaluate(5.0).is_violated());
        assert!(spec.evaluate(7.0).is_violated());
        assert!(spec.evaluate(10.0).is_violated());
        assert!(!spec.evaluate(11.0).is_violated());
    }

    #[test]
    fn test_simple_upper() {
        let spec = RangeSpec::SimpleNonNegativeUpper { high: 10 };
        assert!(spec.evaluate(-1.0).is_violated());
        assert!(!spec.evaluate(0.0).is_violated());
        assert!(!spec.evaluate(10.0).is_violated());
        assert!(spec.evaluate(42.0).is_violated());
    }

    #[test]
    fn test_truncation_toward_zero() {
        let spec = RangeSpec::SimpleNonNegativeUpper { high: 10 };
        assert!(!spec.evaluate(10.9).is_violated());
        // -0.5 truncates to 0, which is inside 0..=10
        assert!(!spec.evaluate(-0.5).is_violated());
        assert!(spec.evaluate(-1.2).is_violated());
    }

    #[test]
    fn test_display_is_canonical() {
        for raw in ["10:", "~:10", "5:10", "@5:10", "10"] {
            assert_eq!(RangeSpec::parse(raw).unwrap().to_string(), raw);
        }
    }
}
