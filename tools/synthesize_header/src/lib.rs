//! Produces the text of a generated header and writes it to disk.

use hgen_core::RequiredHeaderSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Includes emitted ahead of the resolved ones when baseline includes are enabled. They cover the
/// size, boolean and fixed-width integer types most prototypes use.
pub const BASELINE_INCLUDES: [&str; 3] = ["<stddef.h>", "<stdbool.h>", "<stdint.h>"];

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Could not open output file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not write output file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Derives the include guard from the output path: uppercased, with `.`, `-`, `/` and `\`
/// replaced by `_`, followed by a trailing `_`. `./f1.h` becomes `__F1_H_`.
///
/// Any other character that cannot appear in an identifier is also replaced by `_`, and a guard
/// that would start with a digit is prefixed with `_`.
pub fn header_guard(output_path: &str) -> String {
    let mut guard: String = output_path
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            c @ ('A'..='Z' | '0'..='9' | '_') => c,
            _ => '_',
        })
        .collect();
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        guard.insert(0, '_');
    }
    guard.push('_');
    guard
}

/// Renders the complete header text.
pub fn render_header(
    guard: &str,
    includes: &RequiredHeaderSet,
    declarations: &[String],
    baseline: bool,
) -> String {
    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(text, "#ifndef {guard}");
    let _ = writeln!(text, "#define {guard}");
    text.push('\n');
    let baseline_includes: &[&str] = if baseline { &BASELINE_INCLUDES } else { &[] };
    for directive in baseline_includes.iter().copied().chain(
        includes
            .iter()
            .filter(|d| !baseline_includes.contains(d)),
    ) {
        let _ = writeln!(text, "#include {directive}");
    }
    text.push('\n');
    for declaration in declarations {
        text.push_str(declaration);
        text.push('\n');
    }
    text.push('\n');
    let _ = writeln!(text, "#endif // {guard}");
    text
}

/// Creates (or truncates) `path` and writes `text` to it. If the file cannot be opened nothing
/// is written; a failure part-way through a write is reported and not retried.
pub fn write_header(path: &Path, text: &str) -> Result<(), SynthesisError> {
    let mut file = std::fs::File::create(path).map_err(|source| SynthesisError::Open {
        path: path.into(),
        source,
    })?;
    file.write_all(text.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| SynthesisError::Write {
            path: path.into(),
            source,
        })
}

/// A header that has been written to disk.
#[derive(Debug)]
pub struct GeneratedHeader {
    pub path: PathBuf,
    pub guard: String,
    pub text: String,
}

/// Final stage of a run: assembles and writes the header for one output path.
pub struct HeaderSynthesizer {
    output_path: PathBuf,
    baseline_includes: bool,
}

impl HeaderSynthesizer {
    pub fn new(output_path: impl Into<PathBuf>) -> HeaderSynthesizer {
        HeaderSynthesizer {
            output_path: output_path.into(),
            baseline_includes: false,
        }
    }

    /// Emits the baseline includes ahead of the resolved ones.
    pub fn baseline_includes(mut self, enabled: bool) -> HeaderSynthesizer {
        self.baseline_includes = enabled;
        self
    }

    pub fn synthesize(
        &self,
        declarations: &[String],
        includes: &RequiredHeaderSet,
    ) -> Result<GeneratedHeader, SynthesisError> {
        let guard = header_guard(&self.output_path.to_string_lossy());
        let text = render_header(&guard, includes, declarations, self.baseline_includes);
        if let Err(e) = write_header(&self.output_path, &text) {
            error!("{e}");
            return Err(e);
        }
        info!("Generated {} successfully.", self.output_path.display());
        Ok(GeneratedHeader {
            path: self.output_path.clone(),
            guard,
            text,
        })
    }
}
