//! MySQL query check for monitoring supervisors.
//!
//! Wires the `querycheck` decision engine to a MySQL data source and the
//! monitoring-plugin process contract: one status line on stdout, exit code
//! 0/1/2/3.
//!
//! # Components
//!
//! - **cli**: command-line switches
//! - **config**: config file overlay, required-field check, validation
//! - **query**: the `QueryExecutor` seam and its MySQL implementation
//! - **runner**: sequences the query and the decision into a `Report`

pub mod cli;
pub mod config;
pub mod query;
pub mod runner;

pub use cli::Cli;
pub use config::{CheckPlan, ConfigError, FileOptions, Options};
pub use query::{ConnectionParams, MySqlExecutor, QueryError, QueryExecutor};
pub use runner::{Report, run, run_plan};
