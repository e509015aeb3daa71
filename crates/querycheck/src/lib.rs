//! Threshold classification for single-value query checks.
//!
//! This crate turns one scalar query result into a monitoring-plugin
//! status. It provides:
//! - the threshold range syntax (`N`, `N:`, `~:N`, `N:M`, `@N:M`)
//! - a totally ordered [`Severity`] with an escalate-only combinator
//! - the decision engine combining string, regex, warning and critical checks
//!
//! # Example
//!
//! ```
//! use querycheck::{CheckInput, ComparisonConfig, Severity, decide};
//!
//! let config = ComparisonConfig::default().with_warn("10").with_crit("50");
//! let verdict = decide(&CheckInput::new("42"), &config);
//!
//! assert_eq!(verdict.severity, Severity::Warning);
//! assert_eq!(verdict.to_string(), "WARN: 42");
//! assert_eq!(verdict.exit_code(), 1);
//! ```

pub mod engine;
pub mod range;
pub mod types;

pub use engine::decide;
pub use range::{RangeError, RangeKind, RangeOutcome, RangeSpec};
pub use types::{CheckInput, ComparisonConfig, Severity, Verdict};
