//! Status decision engine.
//!
//! Stages run in a fixed order and may only raise severity. Once a stage
//! produces `Unknown`, its message replaces the result text and the
//! remaining stages are skipped.

use crate::range::RangeSpec;
use crate::types::{CheckInput, ComparisonConfig, Severity, Verdict};
use regex::Regex;
use tracing::{debug, warn};

pub const NON_NUMERIC_MESSAGE: &str = "Result contains non-numeric characters.";
pub const WARN_SYNTAX_MESSAGE: &str = "Warn threshold syntax failure.";
pub const CRIT_SYNTAX_MESSAGE: &str = "Critical threshold syntax failure.";
pub const REGEX_SYNTAX_MESSAGE: &str = "Regex syntax failure.";

/// One of the two numeric threshold stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Threshold {
    Warning,
    Critical,
}

impl Threshold {
    fn name(self) -> &'static str {
        match self {
            Threshold::Warning => "Warning",
            Threshold::Critical => "Critical",
        }
    }

    fn on_violation(self) -> Severity {
        match self {
            Threshold::Warning => Severity::Warning,
            Threshold::Critical => Severity::Critical,
        }
    }

    fn syntax_message(self) -> &'static str {
        match self {
            Threshold::Warning => WARN_SYNTAX_MESSAGE,
            Threshold::Critical => CRIT_SYNTAX_MESSAGE,
        }
    }
}

/// Accumulated state while the stages run.
#[derive(Debug, Default)]
struct Decision {
    severity: Severity,
    unknown_message: Option<&'static str>,
    diagnostics: Vec<String>,
}

impl Decision {
    fn raise(&mut self, severity: Severity) {
        self.severity = self.severity.escalate(severity);
    }

    fn unknown(&mut self, message: &'static str) {
        self.raise(Severity::Unknown);
        self.unknown_message.get_or_insert(message);
    }

    fn is_unknown(&self) -> bool {
        self.severity == Severity::Unknown
    }

    fn note(&mut self, line: String) {
        self.diagnostics.push(line);
    }

    fn into_verdict(self, input: &CheckInput) -> Verdict {
        let message = match self.unknown_message {
            Some(message) => message.to_string(),
            None => input.raw.clone(),
        };
        Verdict {
            severity: self.severity,
            message,
            diagnostics: self.diagnostics,
        }
    }
}

/// Classify a query result against the configured comparisons.
pub fn decide(input: &CheckInput, config: &ComparisonConfig) -> Verdict {
    let mut decision = Decision::default();

    if let Some(expected) = &config.expected {
        if input.raw == *expected {
            debug!(expected = %expected, "result matches expected string");
        } else {
            debug!(expected = %expected, result = %input.raw, "result differs from expected string");
            decision.raise(Severity::Critical);
        }
    }

    if let Some(pattern) = &config.regex {
        match Regex::new(pattern) {
            Ok(regex) if regex.is_match(&input.raw) => {
                debug!(pattern = %pattern, "result matches regex");
            }
            Ok(_) => {
                debug!(pattern = %pattern, result = %input.raw, "result does not match regex");
                decision.raise(Severity::Critical);
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "regex failed to compile");
                decision.unknown(REGEX_SYNTAX_MESSAGE);
            }
        }
    }

    if config.has_thresholds() && !decision.is_unknown() {
        match input.numeric {
            Some(value) => {
                let stages = [
                    (Threshold::Warning, config.warn.as_deref()),
                    (Threshold::Critical, config.crit.as_deref()),
                ];
                for (threshold, raw) in stages {
                    if let Some(raw) = raw {
                        if decision.is_unknown() {
                            break;
                        }
                        apply_threshold(&mut decision, threshold, raw, value);
                    }
                }
            }
            None => {
                debug!(result = %input.raw, "numeric threshold requested for non-numeric result");
                decision.unknown(NON_NUMERIC_MESSAGE);
            }
        }
    }

    decision.into_verdict(input)
}

fn apply_threshold(decision: &mut Decision, threshold: Threshold, raw: &str, value: f64) {
    let name = threshold.name();
    match RangeSpec::parse(raw) {
        Ok(spec) => {
            if spec.evaluate(value).is_violated() {
                debug!(threshold = name, range = %spec, value, "threshold exceeded");
                decision.note(format!("{name} threshold exceeded."));
                decision.raise(threshold.on_violation());
            } else {
                debug!(threshold = name, range = %spec, value, "threshold not exceeded");
                decision.note(format!("{name} threshold not exceeded."));
            }
        }
        Err(e) => {
            warn!(threshold = name, error = %e, "threshold syntax failure");
            decision.note(format!(
                "\"{raw}\" is a strange and confusing {name} value."
            ));
            decision.unknown(threshold.syntax_message());
        }
    }
}
