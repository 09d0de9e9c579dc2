//! Turns the function declarations of a primary file into canonical prototype strings.

use hgen_core::{DeclarationRecord, Param};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Accumulates the canonical signatures of the declarations visited during one pass.
///
/// Signatures are deduplicated on their full text, parameter names included, and come out of
/// [DeclarationExtractor::finish] in lexicographic order.
pub struct DeclarationExtractor {
    primary_file: String,
    signatures: BTreeSet<String>,
}

impl DeclarationExtractor {
    pub fn new(primary_file: impl Into<String>) -> DeclarationExtractor {
        DeclarationExtractor {
            primary_file: primary_file.into(),
            signatures: BTreeSet::new(),
        }
    }

    /// Observes one declaration. Returns true if the declaration belongs to the primary file and
    /// was rendered; declarations from any other file are ignored.
    pub fn observe(&mut self, record: &DeclarationRecord) -> bool {
        if record.source_file != self.primary_file {
            trace!(
                "Ignoring {} declared in {:?}",
                record.name, record.source_file
            );
            return false;
        }
        let signature = render_signature(record);
        if !self.signatures.insert(signature) {
            debug!("Duplicate declaration of {} collapsed", record.name);
        }
        true
    }

    /// Number of distinct signatures collected so far.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// The sorted, deduplicated signatures.
    pub fn finish(self) -> Vec<String> {
        self.signatures.into_iter().collect()
    }
}

/// Renders a declaration as `[static |extern ]returnType name(paramList);`.
pub fn render_signature(record: &DeclarationRecord) -> String {
    let mut params: Vec<String> = record.params.iter().map(render_param).collect();
    if record.is_variadic {
        params.push("...".to_owned());
    }
    format!(
        "{}{}({});",
        record.storage_class.prefix(),
        declarator(&record.return_type, Some(&record.name)),
        params.join(", ")
    )
}

fn render_param(param: &Param) -> String {
    declarator(&param.type_text, param.name.as_deref())
}

/// Attaches `name` to `type_text`. The name follows a space, except after a trailing `*` where it
/// is attached directly (`char *s`), and inside the `(*)` of a function pointer type
/// (`int (*cb)(int)`).
fn declarator(type_text: &str, name: Option<&str>) -> String {
    let Some(name) = name else {
        return type_text.to_owned();
    };
    if let Some(at) = type_text.find("(*)") {
        return format!("{}(*{name}){}", &type_text[..at], &type_text[at + 3..]);
    }
    if type_text.ends_with('*') {
        format!("{type_text}{name}")
    } else {
        format!("{type_text} {name}")
    }
}
