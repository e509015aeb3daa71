//! Command-line surface.

use clap::{CommandFactory, Parser};
use common::LogFormat;
use std::ffi::OsString;
use std::path::PathBuf;

/// Run a MySQL query and classify its single result.
#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(
    name = "check_mysql_query",
    about = "Monitoring plugin that performs a MySQL query and checks the result.",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// The query to execute
    #[arg(short = 'q', long = "query", value_name = "QUERY", allow_hyphen_values = true)]
    pub query: Option<String>,

    /// Expected (string) result. No need for -w or -c.
    #[arg(short = 's', long = "result", value_name = "STRING", allow_hyphen_values = true)]
    pub result_string: Option<String>,

    /// Expected result expressed as a regular expression. No need for -w or -c.
    #[arg(short = 'r', long = "regex", value_name = "REGEX", allow_hyphen_values = true)]
    pub result_regex: Option<String>,

    /// Warning threshold
    #[arg(short = 'w', long = "warn", value_name = "RANGE")]
    pub warn: Option<String>,

    /// Critical threshold
    #[arg(short = 'c', long = "crit", value_name = "RANGE")]
    pub crit: Option<String>,

    /// YAML config file; its keys override the switches
    #[arg(short = 'f', long = "file", value_name = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// MySQL host
    #[arg(long = "host", value_name = "HOST")]
    pub mysql_host: Option<String>,

    /// MySQL port
    #[arg(long = "port", value_name = "PORT")]
    pub mysql_port: Option<u16>,

    /// MySQL database
    #[arg(long = "database", value_name = "DATABASE")]
    pub mysql_database: Option<String>,

    /// MySQL user
    #[arg(long = "user", value_name = "USER")]
    pub mysql_user: Option<String>,

    /// MySQL password
    #[arg(long = "pass", value_name = "PASS", allow_hyphen_values = true)]
    pub mysql_pass: Option<String>,

    /// Log record format on stderr (text or json)
    #[arg(long = "log-format", value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Human output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Help!
    #[arg(short = 'h', long = "help")]
    pub help: bool,
}

impl Cli {
    /// Parse arguments, returning a one-line description on failure.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map_err(|e| {
            let rendered = e.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            first.trim_start_matches("error: ").to_string()
        })
    }

    /// Usage text printed for `-h`.
    pub fn usage() -> String {
        Cli::command().render_help().to_string()
    }
}
