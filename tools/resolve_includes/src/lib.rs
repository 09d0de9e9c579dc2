//! Determines which include directives a generated header carries.
//!
//! Two strategies share the [IncludeResolver] interface. [ExactCapture] copies the directives
//! written in the primary file and is the default. [Heuristic] guesses standard headers from the
//! type texts of the extracted signatures, for use when no inclusion events are available.

use hgen_core::config::IncludeStrategy;
use hgen_core::{InclusionEvent, RequiredHeaderSet};
use tracing::{debug, trace};

/// Observes a single front-end pass and produces the header's [RequiredHeaderSet].
///
/// Both callbacks are offered to every resolver; each strategy reacts to the events it uses.
pub trait IncludeResolver {
    /// Name of the strategy, for logging.
    fn name(&self) -> &'static str;

    /// Called for each `#include` directive the front end reports, in source order.
    fn on_inclusion(&mut self, _event: &InclusionEvent) {}

    /// Called for each type text (return or parameter type) of an extracted declaration.
    fn on_type(&mut self, _type_text: &str) {}

    /// Ends the pass.
    fn finish(self: Box<Self>) -> RequiredHeaderSet;
}

/// Returns a resolver implementing `strategy` for the given primary file.
pub fn resolver(strategy: IncludeStrategy, primary_file: &str) -> Box<dyn IncludeResolver> {
    match strategy {
        IncludeStrategy::Exact => Box::new(ExactCapture::new(primary_file)),
        IncludeStrategy::Heuristic => Box::new(Heuristic::default()),
    }
}

/// Reproduces every include directive physically written in the primary file, in the bracket
/// style the author used. Directives reached through other files are excluded.
pub struct ExactCapture {
    primary_file: String,
    headers: RequiredHeaderSet,
}

impl ExactCapture {
    pub fn new(primary_file: impl Into<String>) -> ExactCapture {
        ExactCapture {
            primary_file: primary_file.into(),
            headers: RequiredHeaderSet::new(),
        }
    }
}

impl IncludeResolver for ExactCapture {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn on_inclusion(&mut self, event: &InclusionEvent) {
        if event.source_file != self.primary_file {
            trace!(
                "Ignoring nested include of {} from {}",
                event.spelling, event.source_file
            );
            return;
        }
        let directive = event.directive();
        debug!("Captured #include {directive} (line {})", event.line);
        self.headers.insert(directive);
    }

    fn finish(self: Box<Self>) -> RequiredHeaderSet {
        self.headers
    }
}

/// Type-text substrings and the standard header each one pulls in. Matching is plain substring
/// membership, so a type named `boolean_grid` selects `<stdbool.h>` and almost any type containing
/// `int` selects `<stdio.h>`.
const HEURISTIC_TABLE: &[(&str, &str)] = &[
    ("size_t", "<stddef.h>"),
    ("bool", "<stdbool.h>"),
    ("int", "<stdio.h>"),
    ("char", "<stdio.h>"),
];

/// Infers standard headers from substrings of the signature types.
#[derive(Default)]
pub struct Heuristic {
    headers: RequiredHeaderSet,
}

impl IncludeResolver for Heuristic {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn on_type(&mut self, type_text: &str) {
        for (needle, header) in HEURISTIC_TABLE {
            if type_text.contains(needle) && self.headers.insert(*header) {
                debug!("{type_text:?} matched {needle:?}; adding {header}");
            }
        }
    }

    fn finish(self: Box<Self>) -> RequiredHeaderSet {
        self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hgen_core::IncludeStyle;

    fn event(spelling: &str, style: IncludeStyle, source_file: &str) -> InclusionEvent {
        InclusionEvent {
            spelling: spelling.to_owned(),
            style,
            source_file: source_file.to_owned(),
            line: 1,
        }
    }

    fn headers(set: RequiredHeaderSet) -> Vec<String> {
        set.iter().map(str::to_owned).collect()
    }

    #[test]
    fn exact_capture_keeps_bracket_style() {
        let mut resolver = resolver(IncludeStrategy::Exact, "f1.c");
        assert_eq!(resolver.name(), "exact");
        resolver.on_inclusion(&event("stdio.h", IncludeStyle::Angled, "f1.c"));
        resolver.on_inclusion(&event("inttypes.h", IncludeStyle::Quoted, "f1.c"));
        resolver.on_inclusion(&event("stdio.h", IncludeStyle::Angled, "f1.c"));
        // Types are not this strategy's concern.
        resolver.on_type("size_t");
        assert_eq!(
            headers(resolver.finish()),
            ["\"inttypes.h\"", "<stdio.h>"]
        );
    }

    #[test]
    fn exact_capture_excludes_nested_includes() {
        let mut resolver = ExactCapture::new("f1.c");
        resolver.on_inclusion(&event("features.h", IncludeStyle::Angled, "/usr/include/stdio.h"));
        resolver.on_inclusion(&event("stddef.h", IncludeStyle::Angled, "f1.c"));
        assert_eq!(headers(Box::new(resolver).finish()), ["<stddef.h>"]);
    }

    #[test]
    fn heuristic_table() {
        let mut resolver = resolver(IncludeStrategy::Heuristic, "f1.c");
        assert_eq!(resolver.name(), "heuristic");
        resolver.on_type("size_t");
        resolver.on_type("void");
        resolver.on_inclusion(&event("math.h", IncludeStyle::Angled, "f1.c"));
        assert_eq!(headers(resolver.finish()), ["<stddef.h>"]);

        let mut resolver = Heuristic::default();
        for ty in ["bool", "const char *", "uint8_t"] {
            resolver.on_type(ty);
        }
        assert_eq!(
            headers(Box::new(resolver).finish()),
            ["<stdbool.h>", "<stdio.h>"]
        );
    }

    #[test]
    fn heuristic_false_positives_are_kept() {
        let mut resolver = Heuristic::default();
        resolver.on_type("struct boolean_grid *");
        resolver.on_type("struct point");
        assert_eq!(
            headers(Box::new(resolver).finish()),
            ["<stdbool.h>", "<stdio.h>"]
        );
    }

    #[test]
    fn heuristic_misses_unmatched_types() {
        let mut resolver = Heuristic::default();
        resolver.on_type("FILE *");
        resolver.on_type("double");
        assert!(Box::new(resolver).finish().is_empty());
    }
}
