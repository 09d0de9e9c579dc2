use clap::Parser;
use hgen::GenerateError;
use hgen::cli::{self, Args};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Arc<Args> = Args::parse().into();
    let config = match cli::initialize(args.clone()) {
        Ok(Some(config)) => config,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let Some(input) = args.input.as_deref() else {
        error!("Error: No source file specified.");
        return ExitCode::FAILURE;
    };
    let output = cli::output_path(input, args.output.as_deref());

    match hgen::generate(&config, input, &output, args.clang_args.iter().cloned()) {
        Ok(_) => ExitCode::SUCCESS,
        // The synthesizer has already reported which path could not be written.
        Err(GenerateError::Synthesis(_)) => ExitCode::FAILURE,
        Err(e) => {
            error!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
