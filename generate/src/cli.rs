//! The command-line arguments and configuration system for the `generate_header` binary.

use clap::{Parser, ValueEnum};
use config::FileFormat::Toml;
use directories::ProjectDirs;
use hgen_core::config::Config;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IncludesArg {
    /// Copy the #include directives written in the source file.
    Exact,
    /// Guess standard headers from the prototype types.
    Heuristic,
}

/// Command-line arguments for the `generate_header` binary.
#[derive(Debug, Parser)]
#[command(name = "generate_header")]
#[command(about = "Generate a C header declaring the functions of a C source file", long_about = None)]
pub struct Args {
    /// Set a configuration value; format $NAME=$VALUE.
    #[arg(long, short)]
    pub config: Vec<String>,

    /// Path to the C source file.
    // Should always be present unless using --print-config-path
    pub input: Option<PathBuf>,

    /// Path of the header to write. Defaults to the input path with an `h` extension.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How to determine the header's include directives.
    #[arg(long, value_enum)]
    pub includes: Option<IncludesArg>,

    /// Emit <stddef.h>, <stdbool.h> and <stdint.h> ahead of the resolved includes.
    #[arg(long)]
    pub baseline_includes: bool,

    /// Prints out the location of the config file.
    #[arg(long)]
    pub print_config_path: bool,

    /// Extra arguments passed to clang, after `--`.
    #[arg(last = true)]
    pub clang_args: Vec<String>,
}

/// Prints out a warning message for every field in `unknown`.
///
/// `prefix` should be the path to this entry (e.g. the `[clang]` table calls this with a
/// `prefix` of `clang`).
pub(crate) fn unknown_field_warning(prefix: &str, unknown: &HashMap<String, Value>) {
    let mut entries: Vec<_> = unknown.keys().collect();
    entries.sort_unstable();
    entries.into_iter().for_each(|name| match prefix {
        "" => eprintln!("Warning: unknown config key {name}"),
        p => eprintln!("Warning: unknown config key {p}.{name}"),
    });
}

/// Performs parsing and validation of the config; to be called by main() before doing any work.
///
/// Returns the config, or None if a command line flag that calls for an early exit (such as
/// --print-config-path) was provided.
pub fn initialize(args: Arc<Args>) -> Result<Option<Config>, config::ConfigError> {
    let config_dir = ProjectDirs::from("", "", "hgen").map(|dirs| dirs.config_dir().to_owned());
    if args.print_config_path {
        match &config_dir {
            Some(dir) => println!("Config file location: {:?}", config_file(dir)),
            None => println!("No config file location: home directory not found"),
        }
        return Ok(None);
    }
    let config = load_config(&args, config_dir.as_deref())?;
    unknown_field_warning("", &config.unknown);
    unknown_field_warning("clang", &config.clang.unknown);
    Ok(Some(config))
}

fn load_config(args: &Args, config_dir: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut settings = config::Config::builder().add_source(config::File::from_str(
        include_str!("../default_config.toml"),
        Toml,
    ));
    if let Some(dir) = config_dir {
        settings = settings.add_source(config::File::from(config_file(dir)).required(false));
    }
    settings = settings.add_source(config::File::from(PathBuf::from("hgen.toml")).required(false));
    for config_arg in &args.config {
        let Some((name, value)) = config_arg.split_once('=') else {
            return Err(config::ConfigError::Message(format!(
                "failed to parse config value {config_arg:?}; no '=' found"
            )));
        };
        // Booleans are passed through as such so they survive the `unknown` flattening.
        settings = match value.parse::<bool>() {
            Ok(flag) => settings.set_override(name, flag)?,
            Err(_) => settings.set_override(name, value)?,
        };
    }

    if let Some(includes) = args.includes {
        let strategy = match includes {
            IncludesArg::Exact => "exact",
            IncludesArg::Heuristic => "heuristic",
        };
        settings = settings.set_override("includes", strategy)?;
    }
    if args.baseline_includes {
        settings = settings.set_override("baseline_includes", true)?;
    }

    settings.build()?.try_deserialize()
}

/// Returns the config file path, given the config directory.
fn config_file(config_dir: &Path) -> PathBuf {
    [config_dir, "generate_header.toml".as_ref()].iter().collect()
}

/// The header path for `input`: `output` if given, otherwise `input` with its extension replaced
/// by `h` (or `h` appended when it has none).
pub fn output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(output) => output.to_owned(),
        None => input.with_extension("h"),
    }
}
