//! Option merging and validation.
//!
//! Options come from the command line and, optionally, a flat YAML file
//! whose keys override the switches. The merged value is checked once and
//! frozen into a [`CheckPlan`].

use crate::cli::Cli;
use crate::query::ConnectionParams;
use common::LogFormat;
use querycheck::ComparisonConfig;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Default MySQL port
pub const DEFAULT_PORT: u16 = 3306;

/// Required option names, in the order they are reported.
pub const REQUIRED: [&str; 5] = [
    "mysql_host",
    "mysql_database",
    "mysql_user",
    "mysql_pass",
    "query",
];

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Need to specify:{}.", .0.iter().map(|f| format!(" {f}")).collect::<String>())]
    Missing(Vec<&'static str>),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid arguments: {0}")]
    Usage(String),
}

/// Keys accepted in the config file.
///
/// Scalars are taken as text, so `warn: 10` and `warn: "10"` are the same.
/// Every key may also be written with a leading colon (`:warn:`), the form
/// written by Ruby symbol-keyed YAML.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileOptions {
    #[serde(
        default,
        alias = "host",
        alias = ":mysql_host",
        deserialize_with = "scalar_text"
    )]
    pub mysql_host: Option<String>,

    #[serde(default, alias = "port", alias = ":mysql_port")]
    pub mysql_port: Option<u16>,

    #[serde(
        default,
        alias = "database",
        alias = ":mysql_database",
        deserialize_with = "scalar_text"
    )]
    pub mysql_database: Option<String>,

    #[serde(
        default,
        alias = "user",
        alias = ":mysql_user",
        deserialize_with = "scalar_text"
    )]
    pub mysql_user: Option<String>,

    #[serde(
        default,
        alias = "pass",
        alias = ":mysql_pass",
        deserialize_with = "scalar_text"
    )]
    pub mysql_pass: Option<String>,

    #[serde(default, alias = ":query", deserialize_with = "scalar_text")]
    pub query: Option<String>,

    #[serde(default, alias = ":result_string", deserialize_with = "scalar_text")]
    pub result_string: Option<String>,

    #[serde(default, alias = ":result_regex", deserialize_with = "scalar_text")]
    pub result_regex: Option<String>,

    #[serde(default, alias = ":warn", deserialize_with = "scalar_text")]
    pub warn: Option<String>,

    #[serde(default, alias = ":crit", deserialize_with = "scalar_text")]
    pub crit: Option<String>,

    #[serde(default, alias = ":verbose")]
    pub verbose: Option<bool>,

    #[serde(default, alias = ":log_level", deserialize_with = "scalar_text")]
    pub log_level: Option<String>,

    #[serde(default, alias = ":log_format")]
    pub log_format: Option<LogFormat>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {other:?}"
        ))),
    }
}

impl FileOptions {
    /// Load a config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse config file contents. An empty document sets nothing.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Merged options, before the required-field check.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Options {
    pub mysql_host: Option<String>,

    #[validate(range(min = 1))]
    pub mysql_port: u16,

    pub mysql_database: Option<String>,
    pub mysql_user: Option<String>,
    pub mysql_pass: Option<String>,
    pub query: Option<String>,
    pub result_string: Option<String>,

    #[validate(custom = "validate_regex")]
    pub result_regex: Option<String>,

    pub warn: Option<String>,
    pub crit: Option<String>,
    pub verbose: bool,
    pub log_level: Option<String>,
    pub log_format: LogFormat,

    /// File the options were overlaid from, if any.
    pub config_file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mysql_host: None,
            mysql_port: DEFAULT_PORT,
            mysql_database: None,
            mysql_user: None,
            mysql_pass: None,
            query: None,
            result_string: None,
            result_regex: None,
            warn: None,
            crit: None,
            verbose: false,
            log_level: None,
            log_format: LogFormat::Text,
            config_file: None,
        }
    }
}

fn validate_regex(pattern: &str) -> Result<(), ValidationError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|_| ValidationError::new("result_regex_invalid"))
}

/// Everything one check run needs, fully validated.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckPlan {
    pub connection: ConnectionParams,
    pub query: String,
    pub comparison: ComparisonConfig,
    pub verbose: bool,
}

impl From<&Cli> for Options {
    fn from(cli: &Cli) -> Self {
        Self {
            mysql_host: cli.mysql_host.clone(),
            mysql_port: cli.mysql_port.unwrap_or(DEFAULT_PORT),
            mysql_database: cli.mysql_database.clone(),
            mysql_user: cli.mysql_user.clone(),
            mysql_pass: cli.mysql_pass.clone(),
            query: cli.query.clone(),
            result_string: cli.result_string.clone(),
            result_regex: cli.result_regex.clone(),
            warn: cli.warn.clone(),
            crit: cli.crit.clone(),
            verbose: cli.verbose,
            log_level: None,
            log_format: cli.log_format.unwrap_or_default(),
            config_file: cli.config_file.clone(),
        }
    }
}

impl Options {
    /// Build options from the command line, overlaying the config file if
    /// one was given.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut options = Options::from(cli);
        if let Some(path) = &cli.config_file {
            options.overlay(FileOptions::load_from_file(path)?);
        }
        Ok(options)
    }

    /// Apply every key present in the file over the current values.
    pub fn overlay(&mut self, file: FileOptions) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.mysql_host, file.mysql_host);
        set(&mut self.mysql_database, file.mysql_database);
        set(&mut self.mysql_user, file.mysql_user);
        set(&mut self.mysql_pass, file.mysql_pass);
        set(&mut self.query, file.query);
        set(&mut self.result_string, file.result_string);
        set(&mut self.result_regex, file.result_regex);
        set(&mut self.warn, file.warn);
        set(&mut self.crit, file.crit);
        set(&mut self.log_level, file.log_level);
        if let Some(port) = file.mysql_port {
            self.mysql_port = port;
        }
        if let Some(verbose) = file.verbose {
            self.verbose = verbose;
        }
        if let Some(format) = file.log_format {
            self.log_format = format;
        }
    }

    /// Required options that are absent, in declaration order.
    ///
    /// An empty string counts as supplied.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.mysql_host.is_some(),
            self.mysql_database.is_some(),
            self.mysql_user.is_some(),
            self.mysql_pass.is_some(),
            self.query.is_some(),
        ];
        REQUIRED
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Log level for the tracing subscriber.
    pub fn log_level(&self) -> &str {
        match &self.log_level {
            Some(level) => level,
            None if self.verbose => "debug",
            None => "warn",
        }
    }

    /// Check required fields and validation rules, then freeze.
    pub fn into_plan(self) -> Result<CheckPlan, ConfigError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        self.validate()?;

        match (
            self.mysql_host,
            self.mysql_database,
            self.mysql_user,
            self.mysql_pass,
            self.query,
        ) {
            (Some(host), Some(database), Some(user), Some(password), Some(query)) => {
                Ok(CheckPlan {
                    connection: ConnectionParams {
                        host,
                        port: self.mysql_port,
                        user,
                        password,
                        database,
                    },
                    query,
                    comparison: ComparisonConfig {
                        expected: self.result_string,
                        regex: self.result_regex,
                        warn: self.warn,
                        crit: self.crit,
                    },
                    verbose: self.verbose,
                })
            }
            _ => Err(ConfigError::Missing(REQUIRED.to_vec())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete() -> Options {
        Options {
            mysql_host: Some("db1".into()),
            mysql_database: Some("app".into()),
            mysql_user: Some("nagios".into()),
            mysql_pass: Some("secret".into()),
            query: Some("SELECT 1".into()),
            ..Options::default()
        }
    }

    #[test]
    fn test_default_options_miss_everything() {
        let options = Options::default();
        assert_eq!(options.missing_fields(), REQUIRED.to_vec());
        assert_eq!(options.mysql_port, 3306);
    }

    #[test]
    fn test_missing_message_lists_fields_in_order() {
        let options = Options {
            mysql_database: Some("app".into()),
            mysql_pass: Some("secret".into()),
            query: Some("SELECT 1".into()),
            ..Options::default()
        };
        let err = options.into_plan().unwrap_err();
        assert_eq!(err.to_string(), "Need to specify: mysql_host mysql_user.");
    }

    #[test]
    fn test_empty_password_counts_as_supplied() {
        let options = Options {
            mysql_pass: Some(String::new()),
            ..complete()
        };
        assert!(options.missing_fields().is_empty());
        assert_eq!(options.into_plan().unwrap().connection.password, "");
    }

    #[test]
    fn test_into_plan_builds_comparison() {
        let options = Options {
            result_string: Some("ok".into()),
            warn: Some("10".into()),
            ..complete()
        };
        let plan = options.into_plan().unwrap();
        assert_eq!(plan.query, "SELECT 1");
        assert_eq!(plan.connection.host, "db1");
        assert_eq!(plan.comparison.expected.as_deref(), Some("ok"));
        assert_eq!(plan.comparison.warn.as_deref(), Some("10"));
        assert!(plan.comparison.crit.is_none());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let options = Options {
            result_regex: Some("(unclosed".into()),
            ..complete()
        };
        assert!(matches!(
            options.into_plan(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_port_zero_rejected() {
        let options = Options {
            mysql_port: 0,
            ..complete()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_yaml_parsing_coerces_scalars() {
        let yaml = r#"
mysql_host: db2
mysql_port: 3307
mysql_database: app
mysql_user: nagios
mysql_pass: 12345
query: "SELECT COUNT(*) FROM queue"
warn: 10
crit: "~:50"
verbose: true
log_format: json
"#;
        let file = FileOptions::from_yaml(yaml).unwrap();
        assert_eq!(file.mysql_host.as_deref(), Some("db2"));
        assert_eq!(file.mysql_port, Some(3307));
        assert_eq!(file.mysql_pass.as_deref(), Some("12345"));
        assert_eq!(file.warn.as_deref(), Some("10"));
        assert_eq!(file.crit.as_deref(), Some("~:50"));
        assert_eq!(file.verbose, Some(true));
        assert_eq!(file.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn test_yaml_short_aliases() {
        let file = FileOptions::from_yaml("host: db3\nuser: root\n").unwrap();
        assert_eq!(file.mysql_host.as_deref(), Some("db3"));
        assert_eq!(file.mysql_user.as_deref(), Some("root"));
    }

    #[test]
    fn test_yaml_symbol_keys() {
        let yaml = ":mysql_host: db1\n:mysql_database: app\n:mysql_user: nagios\n:mysql_pass: secret\n:query: SELECT 1\n:warn: 10\n:verbose: true\n";
        let mut options = Options::default();
        options.overlay(FileOptions::from_yaml(yaml).unwrap());
        assert!(options.missing_fields().is_empty());
        assert_eq!(options.mysql_host.as_deref(), Some("db1"));
        assert_eq!(options.warn.as_deref(), Some("10"));
        assert!(options.verbose);
    }

    #[test]
    fn test_yaml_unknown_keys_ignored() {
        let file = FileOptions::from_yaml("query: SELECT 1\nsomething_else: 4\n").unwrap();
        assert_eq!(file.query.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_yaml_rejects_nested_values() {
        assert!(matches!(
            FileOptions::from_yaml("warn: [1, 2]\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_empty_file_sets_nothing() {
        assert_eq!(FileOptions::from_yaml("\n").unwrap(), FileOptions::default());
    }

    #[test]
    fn test_file_overrides_cli() {
        let mut options = Options {
            warn: Some("5".into()),
            crit: Some("9".into()),
            ..complete()
        };
        options.overlay(FileOptions::from_yaml("warn: 20\nmysql_port: 3310\n").unwrap());
        assert_eq!(options.warn.as_deref(), Some("20"));
        // keys absent from the file keep their CLI value
        assert_eq!(options.crit.as_deref(), Some("9"));
        assert_eq!(options.mysql_port, 3310);
    }

    #[test]
    fn test_resolve_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mysql_host: filehost\nquery: SELECT 2").unwrap();

        let cli = Cli {
            mysql_host: Some("clihost".into()),
            config_file: Some(file.path().to_path_buf()),
            ..Cli::default()
        };
        let options = Options::resolve(&cli).unwrap();
        assert_eq!(options.mysql_host.as_deref(), Some("filehost"));
        assert_eq!(options.query.as_deref(), Some("SELECT 2"));
        assert_eq!(options.config_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_resolve_without_file() {
        let options = Options::resolve(&Cli::default()).unwrap();
        assert_eq!(options.config_file, None);
    }

    #[test]
    fn test_resolve_missing_file() {
        let cli = Cli {
            config_file: Some("/nonexistent/querycheck.yaml".into()),
            ..Cli::default()
        };
        assert!(matches!(
            Options::resolve(&cli),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_log_level_follows_verbose() {
        let mut options = complete();
        assert_eq!(options.log_level(), "warn");
        options.verbose = true;
        assert_eq!(options.log_level(), "debug");
        options.log_level = Some("trace".into());
        assert_eq!(options.log_level(), "trace");
    }
}
