//! The C front end: runs clang over a single source file, decodes its JSON AST dump and lowers
//! the top-level function declarations into [DeclarationRecord]s. The `#include` directives of
//! the same file are recovered by [scan_includes].

mod directives;

pub use directives::scan_includes;

use clang_ast::Node;
use hgen_core::config::ClangConfig;
use hgen_core::{DeclarationRecord, Param, StorageClass, TranslationUnit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

/// Represents a (possibly) qualified type in the Clang AST, such as `int`, `const int`, or `const volatile int`.
/// Clang Docs on QualType: https://clang.llvm.org/doxygen/classclang_1_1QualType.html
#[derive(Serialize, Deserialize, Debug)]
pub struct QualType {
    /// String representation of the desugared type, i.e., it will have `typedefs` and `typeofs` resolved.
    #[serde(rename = "desugaredQualType")]
    pub desugared_qual_type: Option<String>,
    /// String representation of the type as written in the source code, i.e., it may include `typedefs` and `typeofs`.
    #[serde(rename = "qualType")]
    pub qual_type: String,
}

/// Represents a node in the Clang AST.
/// Only the nodes that can appear at the top level of a C translation unit (and the parameters of
/// functions) are decoded. Every variant below the root, [Clang::Other] included, keeps its `loc`
/// and `range` fields even where unused: clang omits a location's file when it repeats the
/// previous one, and `clang_ast` can only restore it from locations it has seen.
#[derive(Serialize, Deserialize, Debug)]
pub enum Clang {
    TranslationUnitDecl,
    /// Represents a typedef declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1TypedefDecl.html
    TypedefDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
    },
    /// Represents a function declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FunctionDecl.html
    FunctionDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
        #[serde(rename = "storageClass")]
        storage_class: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(default)]
        variadic: bool,
        #[serde(default, rename = "isImplicit")]
        is_implicit: bool,
    },
    /// Represents a record (struct/union) declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1RecordDecl.html
    RecordDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
    },
    /// Represents an enum declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1EnumDecl.html
    EnumDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
    },
    /// Represents a variable declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1VarDecl.html
    VarDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
    },
    /// Represents a parameter variable declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1ParmVarDecl.html
    ParmVarDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
    },
    /// Represents a compound statement in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1CompoundStmt.html
    CompoundStmt {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
    },
    /// Every other node (not relevant to header generation)
    Other {
        kind: Option<String>,
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
    },
}

/// Logs the declaration kind with appropriate log level.
fn log_decl_kind(kind: &Clang) {
    match kind {
        Clang::TranslationUnitDecl => warn!("Unexpected nested TranslationUnitDecl"),
        Clang::TypedefDecl { name, .. } => debug!("Skipping TypedefDecl: {}", name),
        Clang::FunctionDecl { name, .. } => debug!("Processing FunctionDecl: {}", name),
        Clang::RecordDecl { name, .. } => debug!("Skipping RecordDecl: {:?}", name),
        Clang::EnumDecl { name, .. } => debug!("Skipping EnumDecl: {:?}", name),
        Clang::VarDecl { name, .. } => debug!("Skipping VarDecl: {}", name),
        Clang::ParmVarDecl { name, .. } => {
            warn!("Unexpected ParmVarDecl at top level: {:?}", name)
        }
        Clang::CompoundStmt { .. } => warn!("Unexpected CompoundStmt at top level"),
        Clang::Other { kind, .. } => debug!("Skipping top-level {:?}", kind),
    }
}

#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("could not decode the clang AST of {path} (clang exited with {status}): {source}")]
    Decode {
        path: PathBuf,
        status: std::process::ExitStatus,
        source: serde_json::Error,
    },
    #[error("clang AST root is {0}, expected TranslationUnitDecl")]
    NotATranslationUnit(String),
}

/// Runs clang in a fixed language mode and turns its output into a [TranslationUnit].
pub struct ClangFrontEnd {
    program: String,
    std: String,
    args: Vec<String>,
}

impl ClangFrontEnd {
    pub fn new(config: &ClangConfig) -> ClangFrontEnd {
        ClangFrontEnd {
            program: config.program.clone(),
            std: config.std.clone(),
            args: config.args.clone(),
        }
    }

    /// Appends arguments passed to clang ahead of the input file.
    pub fn with_args<I: IntoIterator<Item = String>>(mut self, args: I) -> ClangFrontEnd {
        self.args.extend(args);
        self
    }

    /// The clang invocation used to dump the AST of `input`.
    fn command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-x", "c"])
            .arg(format!("-std={}", self.std))
            .args(["-Xclang", "-ast-dump=json", "-fsyntax-only"])
            .args(&self.args)
            .arg(input)
            .stdin(Stdio::null());
        cmd
    }

    /// Parses `input` once and returns its declaration and inclusion events.
    ///
    /// Clang diagnostics do not stop the pass: as long as clang printed an AST, whatever it
    /// managed to declare is returned, and the diagnostics are logged as a warning.
    pub fn parse(&self, input: &Path) -> Result<TranslationUnit, FrontEndError> {
        let primary_file = input.to_string_lossy().into_owned();
        let text = std::fs::read_to_string(input).map_err(|source| FrontEndError::Read {
            path: input.into(),
            source,
        })?;
        let inclusions = scan_includes(&primary_file, &text);

        let output = self
            .command(input)
            .output()
            .map_err(|source| FrontEndError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let ast: Node<Clang> =
            serde_json::from_slice(&output.stdout).map_err(|source| FrontEndError::Decode {
                path: input.into(),
                status: output.status,
                source,
            })?;
        if !output.status.success() {
            warn!(
                "clang reported errors for {primary_file}; continuing with the declarations it produced:\n{}",
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        let declarations = lower_translation_unit(&ast)?;
        let unit = TranslationUnit {
            primary_file,
            declarations,
            inclusions,
        };
        debug!("Parsed {unit}");
        Ok(unit)
    }
}

/// Lowers every top-level function declaration of a translation unit. Declarations from every
/// file are returned; filtering to the primary file is left to the consumer.
pub fn lower_translation_unit(ast: &Node<Clang>) -> Result<Vec<DeclarationRecord>, FrontEndError> {
    if !matches!(ast.kind, Clang::TranslationUnitDecl) {
        return Err(FrontEndError::NotATranslationUnit(format!("{:?}", ast.kind)));
    }
    Ok(ast
        .inner
        .iter()
        .inspect(|node| log_decl_kind(&node.kind))
        .filter_map(lower_function)
        .collect())
}

/// Converts a `FunctionDecl` node into a [DeclarationRecord]. Returns `None` for any other node
/// and for declarations clang synthesized implicitly.
pub fn lower_function(node: &Node<Clang>) -> Option<DeclarationRecord> {
    let Clang::FunctionDecl {
        loc,
        name,
        storage_class,
        qtype,
        variadic,
        is_implicit,
        ..
    } = &node.kind
    else {
        return None;
    };
    if *is_implicit {
        debug!("Skipping implicit declaration of {name}");
        return None;
    }

    let params: Vec<Param> = node
        .inner
        .iter()
        .filter_map(|child| match &child.kind {
            Clang::ParmVarDecl { name, qtype, .. } => {
                Some(Param::new(qtype.qual_type.as_str(), name.as_deref()))
            }
            _ => None,
        })
        .collect();

    // Prefer where the declaration was expanded, so functions produced by a macro defined in a
    // header but invoked in the primary file belong to the primary file.
    let location = loc
        .as_ref()
        .and_then(|l| l.expansion_loc.as_ref().or(l.spelling_loc.as_ref()));
    let (source_file, source_offset) = location
        .map(|l| (l.file.to_string(), l.offset))
        .unwrap_or_default();

    Some(DeclarationRecord {
        return_type: return_type(&qtype.qual_type).to_owned(),
        name: name.clone(),
        storage_class: StorageClass::from_clang(storage_class.as_deref()),
        params,
        is_variadic: *variadic || qtype.qual_type.trim_end().ends_with("...)"),
        source_file,
        source_offset,
    })
}

/// Extracts the return type from a function type spelling such as `char *(char *)` or
/// `void (void) __attribute__((noreturn))`.
///
/// The parameter list is the last parenthesized group at nesting depth zero that is not the
/// argument of an `__attribute__`. Function types returning function pointers are not
/// decomposed.
pub fn return_type(function_type: &str) -> &str {
    let mut depth = 0usize;
    let mut group_start = None;
    let mut params_start = None;
    for (i, c) in function_type.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    group_start = Some(i);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0
                    && let Some(start) = group_start.take()
                    && !function_type[..start].trim_end().ends_with("__attribute__")
                {
                    params_start = Some(start);
                }
            }
            _ => {}
        }
    }
    match params_start {
        Some(start) => function_type[..start].trim_end(),
        None => function_type.trim_end(),
    }
}
