//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::error::Error;
use std::process::ExitCode;

use env_logger::Env;
use townlands_cli::CliError;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    match townlands_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("townlands: {}", error_chain(&err));
            ExitCode::from(err.exit_code())
        }
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
