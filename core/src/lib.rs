//! Types shared by every stage of header generation: the declaration and inclusion events a
//! front end produces for one source file, and the configuration of a run.

pub mod config;
#[cfg(not(miri))]
pub mod test_util;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Linkage keyword written in front of a function declaration.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum StorageClass {
    #[default]
    None,
    Static,
    Extern,
}

impl StorageClass {
    /// Maps clang's `storageClass` spelling onto the enum. Storage classes that have no meaning
    /// for a function prototype (e.g. `auto`, `register`) map to `None`.
    pub fn from_clang(spelling: Option<&str>) -> StorageClass {
        match spelling {
            Some("static") => StorageClass::Static,
            Some("extern") => StorageClass::Extern,
            _ => StorageClass::None,
        }
    }

    /// The keyword followed by a space, or the empty string.
    pub fn prefix(self) -> &'static str {
        match self {
            StorageClass::None => "",
            StorageClass::Static => "static ",
            StorageClass::Extern => "extern ",
        }
    }
}

/// One parameter of a function declaration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Type text as spelled by the front end.
    pub type_text: String,
    /// Declared parameter name, if the declaration gives one.
    pub name: Option<String>,
}

impl Param {
    pub fn new(type_text: impl Into<String>, name: Option<&str>) -> Param {
        Param {
            type_text: type_text.into(),
            name: name.filter(|n| !n.is_empty()).map(str::to_owned),
        }
    }
}

/// A function declaration visited by the front end. The source position is only used to decide
/// whether the declaration belongs to the primary file; it never reaches the generated header.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct DeclarationRecord {
    pub return_type: String,
    pub name: String,
    pub storage_class: StorageClass,
    pub params: Vec<Param>,
    /// True only if the declaration explicitly ends in `...`.
    pub is_variadic: bool,
    pub source_file: String,
    pub source_offset: usize,
}

impl DeclarationRecord {
    /// Every type text appearing in the signature: the return type first, then each parameter
    /// type in order.
    pub fn type_texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.return_type.as_str())
            .chain(self.params.iter().map(|p| p.type_text.as_str()))
    }
}

/// Bracket style of an `#include` directive.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum IncludeStyle {
    /// `#include <header.h>`
    Angled,
    /// `#include "header.h"`
    Quoted,
}

/// An `#include` directive as written in a source file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct InclusionEvent {
    /// The header name between the delimiters.
    pub spelling: String,
    pub style: IncludeStyle,
    /// File containing the directive.
    pub source_file: String,
    /// 1-based line of the `#` that starts the directive.
    pub line: usize,
}

impl InclusionEvent {
    /// The directive operand in final textual form, e.g. `<stdio.h>` or `"local.h"`.
    pub fn directive(&self) -> String {
        match self.style {
            IncludeStyle::Angled => format!("<{}>", self.spelling),
            IncludeStyle::Quoted => format!("\"{}\"", self.spelling),
        }
    }
}

/// The two ordered event streams produced by one front-end pass over a primary file.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TranslationUnit {
    /// Path of the primary file, spelled the way the front end reports it in source locations.
    pub primary_file: String,
    pub declarations: Vec<DeclarationRecord>,
    pub inclusions: Vec<InclusionEvent>,
}

impl fmt::Display for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} declarations, {} includes)",
            self.primary_file,
            self.declarations.len(),
            self.inclusions.len()
        )
    }
}

/// Include operands (`<stddef.h>`, `"local.h"`) a generated header must carry. Iteration is in
/// lexicographic order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequiredHeaderSet(BTreeSet<String>);

impl RequiredHeaderSet {
    pub fn new() -> RequiredHeaderSet {
        RequiredHeaderSet::default()
    }

    /// Adds a directive operand. Returns false if it was already present.
    pub fn insert(&mut self, directive: impl Into<String>) -> bool {
        self.0.insert(directive.into())
    }

    pub fn contains(&self, directive: &str) -> bool {
        self.0.contains(directive)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RequiredHeaderSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        RequiredHeaderSet(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_class_from_clang() {
        assert_eq!(StorageClass::from_clang(Some("static")), StorageClass::Static);
        assert_eq!(StorageClass::from_clang(Some("extern")), StorageClass::Extern);
        assert_eq!(StorageClass::from_clang(Some("auto")), StorageClass::None);
        assert_eq!(StorageClass::from_clang(None), StorageClass::None);
    }

    #[test]
    fn empty_param_name_is_absent() {
        assert_eq!(Param::new("int", Some("")).name, None);
        assert_eq!(Param::new("int", Some("n")).name.as_deref(), Some("n"));
    }

    #[test]
    fn directive_keeps_bracket_style() {
        let mut event = InclusionEvent {
            spelling: "stdio.h".into(),
            style: IncludeStyle::Angled,
            source_file: "f1.c".into(),
            line: 1,
        };
        assert_eq!(event.directive(), "<stdio.h>");
        event.style = IncludeStyle::Quoted;
        assert_eq!(event.directive(), "\"stdio.h\"");
    }

    #[test]
    fn header_set_iterates_sorted() {
        let set: RequiredHeaderSet = ["<stdio.h>", "\"local.h\"", "<stddef.h>", "<stdio.h>"]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            ["\"local.h\"", "<stddef.h>", "<stdio.h>"]
        );
    }

    #[test]
    fn type_texts_lists_return_then_params() {
        let record = DeclarationRecord {
            return_type: "char *".into(),
            name: "f".into(),
            storage_class: StorageClass::None,
            params: vec![Param::new("size_t", Some("n")), Param::new("bool", None)],
            is_variadic: false,
            source_file: "f.c".into(),
            source_offset: 0,
        };
        assert_eq!(
            record.type_texts().collect::<Vec<_>>(),
            ["char *", "size_t", "bool"]
        );
    }
}
