pub mod cli;
pub mod commands;
pub mod models;
pub mod services;
pub mod utils;

use clap::Parser;
use cli::Cli;
use console::style;
use models::{ExchangeResult, Report, ReportFormat};
use services::{KeyStore, RusshTransport, TerminalPrompt};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Parse the command line, distribute the key and print the summary.
/// Exit status is success when at least one host succeeded.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_directive());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli)) {
        Ok((report, format)) => {
            print_report(&report, format);
            ExitCode::from(report.exit_code())
        }
        Err(e) => {
            log::error!("[run] {}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> ExchangeResult<(Report, ReportFormat)> {
    let config = cli.into_config()?;
    let format = config.report_format;
    let transport = Arc::new(RusshTransport::new(config.connect_timeout));

    let report = commands::exchange_keys(
        config,
        &KeyStore::new(),
        transport,
        Arc::new(TerminalPrompt),
    )
    .await?;
    Ok((report, format))
}

fn print_report(report: &Report, format: ReportFormat) {
    match format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => match report.render_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
        },
    }
}

/// `RUST_LOG` wins over the `-v` derived directive. `log` records are
/// forwarded through the subscriber's log bridge.
fn init_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
