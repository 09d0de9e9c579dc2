//! Generates a C header declaring the functions defined in a C source file. This is normally used
//! through the `generate_header` binary, but is exposed as a library crate as well.
//!
//! A run parses the source once, feeds the resulting events through a [DeclarationExtractor] and
//! an [IncludeResolver] in a single pass, then writes the header with a [HeaderSynthesizer].

pub mod cli;

use c_ast::{ClangFrontEnd, FrontEndError};
use extract_decls::DeclarationExtractor;
use hgen_core::config::{Config, IncludeStrategy};
use hgen_core::{RequiredHeaderSet, TranslationUnit};
use resolve_includes::IncludeResolver;
use std::path::Path;
use synthesize_header::{GeneratedHeader, HeaderSynthesizer, SynthesisError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    FrontEnd(#[from] FrontEndError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// What one pass over a translation unit accumulated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Collected {
    /// Canonical prototypes, sorted and deduplicated.
    pub declarations: Vec<String>,
    pub includes: RequiredHeaderSet,
}

/// Feeds both event streams of `unit` to the accumulators. Inclusion events go to the resolver;
/// each declaration goes to the extractor, and the type texts of the ones it accepts go on to the
/// resolver.
pub fn run_pass(
    unit: &TranslationUnit,
    extractor: &mut DeclarationExtractor,
    resolver: &mut dyn IncludeResolver,
) {
    for event in &unit.inclusions {
        resolver.on_inclusion(event);
    }
    for record in &unit.declarations {
        if extractor.observe(record) {
            record.type_texts().for_each(|ty| resolver.on_type(ty));
        }
    }
}

/// Runs a complete pass over `unit` with the given include strategy.
pub fn collect(unit: &TranslationUnit, strategy: IncludeStrategy) -> Collected {
    let mut extractor = DeclarationExtractor::new(unit.primary_file.as_str());
    let mut resolver = resolve_includes::resolver(strategy, &unit.primary_file);
    run_pass(unit, &mut extractor, resolver.as_mut());
    debug!(
        "Extracted {} declarations from {}; resolving includes with the {} strategy",
        extractor.len(),
        unit.primary_file,
        resolver.name()
    );
    Collected {
        declarations: extractor.finish(),
        includes: resolver.finish(),
    }
}

/// Collects `unit` and writes its header to `output`.
pub fn generate_from_unit(
    config: &Config,
    unit: &TranslationUnit,
    output: &Path,
) -> Result<GeneratedHeader, SynthesisError> {
    let collected = collect(unit, config.includes);
    HeaderSynthesizer::new(output)
        .baseline_includes(config.baseline_includes)
        .synthesize(&collected.declarations, &collected.includes)
}

/// Parses `input` with clang and writes the generated header to `output`. `clang_args` are
/// passed to clang after the configured arguments.
pub fn generate<I: IntoIterator<Item = String>>(
    config: &Config,
    input: &Path,
    output: &Path,
    clang_args: I,
) -> Result<GeneratedHeader, GenerateError> {
    let unit = ClangFrontEnd::new(&config.clang)
        .with_args(clang_args)
        .parse(input)?;
    Ok(generate_from_unit(config, &unit, output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hgen_core::test_util::{RecordBuilder, tempdir};
    use hgen_core::{IncludeStyle, InclusionEvent, StorageClass};

    fn include(spelling: &str, style: IncludeStyle, source_file: &str) -> InclusionEvent {
        InclusionEvent {
            spelling: spelling.to_owned(),
            style,
            source_file: source_file.to_owned(),
            line: 1,
        }
    }

    /// The events clang and the directive scanner produce for f1.c, which includes `<stdio.h>`
    /// and `"inttypes.h"`.
    fn f1_unit() -> TranslationUnit {
        TranslationUnit {
            primary_file: "f1.c".to_owned(),
            declarations: vec![
                RecordBuilder::new("int", "printf")
                    .param("const char *restrict", "__format")
                    .variadic()
                    .storage(StorageClass::Extern)
                    .build("/usr/include/stdio.h"),
                RecordBuilder::new("const int", "s_n_nn")
                    .storage(StorageClass::Static)
                    .param("const int", "n")
                    .build("f1.c"),
                RecordBuilder::new("const int", "n_nn")
                    .param("const int", "n")
                    .build("f1.c"),
                RecordBuilder::new("void", "stars")
                    .storage(StorageClass::Static)
                    .build("f1.c"),
                RecordBuilder::new("void", "hehe")
                    .param("size_t", "s")
                    .build("f1.c"),
                RecordBuilder::new("int", "sum")
                    .param("uint8_t", "a")
                    .param("int", "b")
                    .param("int", "c")
                    .build("f1.c"),
                RecordBuilder::new("char *", "print_hello_sx")
                    .param("char *", "s")
                    .build("f1.c"),
                RecordBuilder::new("int", "sum")
                    .param("uint8_t", "a")
                    .param("int", "b")
                    .param("int", "c")
                    .offset(900)
                    .build("f1.c"),
            ],
            inclusions: vec![
                include("stdio.h", IncludeStyle::Angled, "f1.c"),
                include("inttypes.h", IncludeStyle::Quoted, "f1.c"),
                include("bits/libc-header-start.h", IncludeStyle::Angled, "/usr/include/stdio.h"),
            ],
        }
    }

    const F1_DECLARATIONS: [&str; 6] = [
        "char *print_hello_sx(char *s);",
        "const int n_nn(const int n);",
        "int sum(uint8_t a, int b, int c);",
        "static const int s_n_nn(const int n);",
        "static void stars();",
        "void hehe(size_t s);",
    ];

    #[test]
    fn exact_pass() {
        let collected = collect(&f1_unit(), IncludeStrategy::Exact);
        assert_eq!(collected.declarations, F1_DECLARATIONS);
        assert_eq!(
            collected.includes.iter().collect::<Vec<_>>(),
            ["\"inttypes.h\"", "<stdio.h>"]
        );
    }

    #[test]
    fn heuristic_pass_only_sees_primary_file_types() {
        let collected = collect(&f1_unit(), IncludeStrategy::Heuristic);
        assert_eq!(collected.declarations, F1_DECLARATIONS);
        // `char` and `int` select <stdio.h>, `size_t` selects <stddef.h>. The `restrict` pointer
        // of printf is never seen because printf lives in stdio.h.
        assert_eq!(
            collected.includes.iter().collect::<Vec<_>>(),
            ["<stddef.h>", "<stdio.h>"]
        );
    }

    #[test]
    fn included_declarations_never_appear() {
        let collected = collect(&f1_unit(), IncludeStrategy::Exact);
        assert!(collected.declarations.iter().all(|d| !d.contains("printf")));
    }

    #[test]
    fn generation_is_deterministic() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("f1.h");
        let config = Config::mock();
        let first = generate_from_unit(&config, &f1_unit(), &output).unwrap();
        let first_bytes = std::fs::read(&output).unwrap();
        let second = generate_from_unit(&config, &f1_unit(), &output).unwrap();
        assert_eq!(first.text, second.text);
        assert_eq!(first_bytes, std::fs::read(&output).unwrap());
    }

    #[test]
    fn header_text_for_f1() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("f1.h");
        let header = generate_from_unit(&Config::mock(), &f1_unit(), &output).unwrap();
        let guard = synthesize_header::header_guard(&output.to_string_lossy());
        let expected = format!(
            "#ifndef {guard}\n#define {guard}\n\n\
             #include \"inttypes.h\"\n#include <stdio.h>\n\n\
             {}\n\n#endif // {guard}\n",
            F1_DECLARATIONS.join("\n")
        );
        assert_eq!(header.text, expected);
    }
}
