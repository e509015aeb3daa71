//! check_mysql_query binary

use querycheck::{Severity, Verdict};
use querycheck_cli::{Cli, ConfigError, MySqlExecutor, Options, Report, run};
use std::process::ExitCode;

/// In verbose mode a panic still ends with a status line and exit code 3.
fn install_verbose_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        println!("{}", Verdict::unknown(info.to_string()));
        std::process::exit(i32::from(Severity::Unknown.exit_code()));
    }));
}

fn emit(report: &Report) -> ExitCode {
    print!("{}", report.render());
    ExitCode::from(report.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let verdict = Verdict::unknown(ConfigError::Usage(e).to_string());
            return emit(&Report::new(verdict, false));
        }
    };

    if cli.help {
        println!("{}", Cli::usage());
        return ExitCode::from(Severity::Unknown.exit_code());
    }

    let options = match Options::resolve(&cli) {
        Ok(options) => options,
        Err(e) => return emit(&Report::config_error(&e, cli.verbose)),
    };

    if options.verbose {
        install_verbose_panic_hook();
    }
    common::logging::init(options.log_level(), options.log_format);
    if let Some(path) = &options.config_file {
        tracing::info!("Loaded configuration from: {}", path.display());
    }
    tracing::debug!(verbose = options.verbose, "options resolved");

    let report = run(&MySqlExecutor::new(), options).await;
    emit(&report)
}
