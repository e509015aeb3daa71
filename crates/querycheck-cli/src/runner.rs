//! Check orchestration: one query, one classification, one status line.

use crate::config::{CheckPlan, ConfigError, Options};
use crate::query::{QueryError, QueryExecutor};
use querycheck::{CheckInput, Severity, Verdict, decide};
use tracing::{debug, info};

/// What the process prints and how it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub verdict: Verdict,

    /// Operator lines, printed with a `+ ` prefix in verbose mode
    pub notes: Vec<String>,

    pub verbose: bool,
}

impl Report {
    pub fn new(verdict: Verdict, verbose: bool) -> Self {
        Self {
            verdict,
            notes: Vec::new(),
            verbose,
        }
    }

    /// Report for options that could not be loaded or validated.
    pub fn config_error(err: &ConfigError, verbose: bool) -> Self {
        Self::new(Verdict::unknown(err.to_string()), verbose)
    }

    /// Exit code for the supervisor.
    ///
    /// Verbose runs are for humans, not the supervisor: they always exit
    /// with UNKNOWN's code, whatever the verdict.
    pub fn exit_code(&self) -> u8 {
        if self.verbose {
            Severity::Unknown.exit_code()
        } else {
            self.verdict.exit_code()
        }
    }

    /// Text written to standard output, ending with the status line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.verbose {
            for note in &self.notes {
                out.push_str("+ ");
                out.push_str(note);
                out.push('\n');
            }
        }
        // the supervisor reads a single line
        out.push_str(&self.verdict.to_string().replace(['\r', '\n'], " "));
        out.push('\n');
        out
    }
}

/// Map a collaborator failure onto a verdict.
fn query_failure(err: QueryError) -> Verdict {
    match err {
        QueryError::Connection(_) | QueryError::Query(_) => Verdict::critical(err.to_string()),
        QueryError::NoRows => Verdict::unknown(err.to_string()),
    }
}

/// Run a validated plan.
pub async fn run_plan<E>(executor: &E, plan: &CheckPlan) -> Report
where
    E: QueryExecutor + ?Sized,
{
    debug!(connection = ?plan.connection, query = %plan.query, "executing query");

    let raw = match executor.fetch_scalar(&plan.connection, &plan.query).await {
        Ok(raw) => raw,
        Err(e) => {
            info!(error = %e, "query did not produce a result");
            return Report::new(query_failure(e), plan.verbose);
        }
    };

    let mut notes = vec![format!("Result: \"{raw}\"")];
    let mut verdict = decide(&CheckInput::new(raw), &plan.comparison);
    notes.append(&mut verdict.diagnostics);

    info!(severity = %verdict.severity, "check complete");
    Report {
        verdict,
        notes,
        verbose: plan.verbose,
    }
}

/// Validate merged options and run the check.
pub async fn run<E>(executor: &E, options: Options) -> Report
where
    E: QueryExecutor + ?Sized,
{
    let verbose = options.verbose;
    match options.into_plan() {
        Ok(plan) => run_plan(executor, &plan).await,
        Err(e) => {
            info!(error = %e, "configuration rejected");
            Report::config_error(&e, verbose)
        }
    }
}
