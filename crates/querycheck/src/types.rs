//! Check types and structures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status reported to the monitoring supervisor.
///
/// Variants are declared in escalation order, so the derived `Ord` is the
/// precedence rule: `Ok < Warning < Critical < Unknown`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Every configured comparison passed
    #[default]
    Ok,
    /// The warning threshold was violated
    Warning,
    /// A string, regex or critical comparison failed
    Critical,
    /// The check itself could not be evaluated
    Unknown,
}

impl Severity {
    /// Combine two severities, keeping the more severe one.
    pub fn escalate(self, other: Severity) -> Severity {
        self.max(other)
    }

    /// Prefix used on the status line.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARN",
            Severity::Critical => "CRIT",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Process exit code expected by the supervisor.
    pub fn exit_code(self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// The scalar returned by the query.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInput {
    /// Text form, used for string and regex comparisons and in the message
    pub raw: String,

    /// Numeric form, `None` when the text is not a finite number
    pub numeric: Option<f64>,
}

impl CheckInput {
    /// Wrap a raw result, parsing its numeric form once.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let numeric = parse_numeric(&raw);
        Self { raw, numeric }
    }
}

/// Accepted forms: decimal or exponent notation, `0x` hex integers, and
/// `_` between digits (`1_000`).
/// Surrounding whitespace is ignored. Non-finite spellings are rejected.
fn parse_numeric(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let hex = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"));

    let magnitude = if let Some(hex) = hex {
        let hex = strip_digit_separators(hex, |b| b.is_ascii_hexdigit())?;
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u128::from_str_radix(&hex, 16).ok()? as f64
    } else {
        let decimal = strip_digit_separators(body, |b| b.is_ascii_digit())?;
        let stray_letter = decimal
            .bytes()
            .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E'));
        if stray_letter || decimal.starts_with(['+', '-']) {
            return None;
        }
        decimal.parse::<f64>().ok()?
    };

    let value = if negative { -magnitude } else { magnitude };
    value.is_finite().then_some(value)
}

/// Remove `_` separators, which are only legal between two digits.
fn strip_digit_separators(text: &str, is_digit: impl Fn(u8) -> bool) -> Option<String> {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let before = i.checked_sub(1).map(|j| bytes[j]);
            let after = bytes.get(i + 1).copied();
            if !matches!((before, after), (Some(l), Some(r)) if is_digit(l) && is_digit(r)) {
                return None;
            }
        }
    }
    Some(text.replace('_', ""))
}

/// The comparisons requested for one invocation.
///
/// All four may be set at once; none excludes another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Exact string the result must equal
    pub expected: Option<String>,

    /// Pattern the result must match (unanchored search)
    pub regex: Option<String>,

    /// Warning range in threshold syntax
    pub warn: Option<String>,

    /// Critical range in threshold syntax
    pub crit: Option<String>,
}

impl ComparisonConfig {
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn with_warn(mut self, warn: impl Into<String>) -> Self {
        self.warn = Some(warn.into());
        self
    }

    pub fn with_crit(mut self, crit: impl Into<String>) -> Self {
        self.crit = Some(crit.into());
        self
    }

    /// Whether any numeric threshold is configured.
    pub fn has_thresholds(&self) -> bool {
        self.warn.is_some() || self.crit.is_some()
    }
}

/// Final outcome of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Final status
    pub severity: Severity,

    /// Message printed after the status label
    pub message: String,

    /// Operator-facing notes gathered while deciding (shown in verbose mode)
    pub diagnostics: Vec<String>,
}

impl Verdict {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Create a critical verdict
    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, message)
    }

    /// Create an unknown verdict
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Severity::Unknown, message)
    }

    /// Exit code for this verdict.
    pub fn exit_code(&self) -> u8 {
        self.severity.exit_code()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)
    }
}
