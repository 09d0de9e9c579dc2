//! Configuration of a header generation run. Values are layered by the `generate_header` binary
//! (built-in defaults, user config file, local `hgen.toml`, then command-line overrides) and
//! deserialized into [Config].

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Filter directive for the tracing subscriber, e.g. `info` or `c_ast=debug`.
    pub log_filter: String,

    /// How the include directives of the generated header are determined.
    pub includes: IncludeStrategy,

    /// Emit `<stddef.h>`, `<stdbool.h>` and `<stdint.h>` ahead of the resolved includes.
    pub baseline_includes: bool,

    /// Settings for the clang front end.
    pub clang: ClangConfig,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

/// Strategy for resolving the include directives a header needs.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IncludeStrategy {
    /// Copy the `#include` directives written in the primary file.
    #[default]
    Exact,
    /// Guess standard headers from substrings of the signature types.
    Heuristic,
}

#[derive(Debug, Deserialize)]
pub struct ClangConfig {
    /// Program name or path of the clang driver.
    pub program: String,

    /// C language standard passed as `-std=`.
    pub std: String,

    /// Extra arguments passed to clang before the input file.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

impl Default for ClangConfig {
    fn default() -> ClangConfig {
        ClangConfig {
            program: "clang".to_owned(),
            std: "c17".to_owned(),
            args: Vec::new(),
            unknown: HashMap::new(),
        }
    }
}

impl Config {
    /// Returns a mock config for testing.
    pub fn mock() -> Self {
        Self {
            log_filter: "off".to_owned(),
            includes: IncludeStrategy::Exact,
            baseline_includes: false,
            clang: ClangConfig::default(),
            unknown: HashMap::new(),
        }
    }
}
