use std::process::ExitCode;

use clap::Parser as ClapParser;
use indicatif::MultiProgress;

use sbc_tools::cli::command::EncodeCli;
use sbc_tools::cli::logging::init_logging;
use sbc_tools::cli::{create_output, open_input, path_label};
use sbc_tools::error::SessionError;
use sbc_tools::session::encode::{EncodeOptions, encode};
use sbc_tools::session::report::SessionReport;

fn run(cli: &EncodeCli, multi: Option<&MultiProgress>) -> Result<SessionReport, SessionError> {
    let input = open_input(cli.input.as_deref())?;
    let output = create_output(cli.output.as_deref())?;

    let options = EncodeOptions {
        config: cli.config(),
        progress: multi,
    };

    let mut report = encode(input, output, &options)?;
    report.input = path_label(cli.input.as_deref());
    report.output = path_label(cli.output.as_deref());

    Ok(report)
}

fn main() -> ExitCode {
    let cli = EncodeCli::parse();

    let multi = match init_logging(&cli.log) {
        Ok(multi) => multi,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, multi.as_ref()) {
        Ok(report) => {
            if let Some(path) = &cli.report {
                if let Err(e) = report.write_to(path) {
                    log::error!("Failed to write report: {e:#}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.exit_status())
        }
    }
}
