//! Place to put utilities that are only used by tests.

use crate::{DeclarationRecord, Param, StorageClass};

/// Returns a new temporary directory. Unlike the defaults in the `tempdir` and `tempfile` crates,
/// this directory is not world-accessible by default.
pub fn tempdir() -> std::io::Result<tempfile::TempDir> {
    use std::fs::Permissions;
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o700));
    }
    builder.tempdir()
}

/// Builder for [DeclarationRecord]s, so tests only spell out the fields they care about.
///
/// # Example
/// ```
/// use hgen_core::test_util::RecordBuilder;
/// let record = RecordBuilder::new("int", "sum")
///     .param("int", "a")
///     .param("int", "b")
///     .build("f1.c");
/// assert_eq!(record.params.len(), 2);
/// ```
pub struct RecordBuilder {
    record: DeclarationRecord,
}

impl RecordBuilder {
    /// Starts a non-variadic declaration with no storage class and no parameters.
    pub fn new(return_type: &str, name: &str) -> RecordBuilder {
        RecordBuilder {
            record: DeclarationRecord {
                return_type: return_type.to_owned(),
                name: name.to_owned(),
                storage_class: StorageClass::None,
                params: Vec::new(),
                is_variadic: false,
                source_file: String::new(),
                source_offset: 0,
            },
        }
    }

    /// Appends a named parameter.
    pub fn param(mut self, type_text: &str, name: &str) -> RecordBuilder {
        self.record.params.push(Param::new(type_text, Some(name)));
        self
    }

    /// Appends an unnamed parameter.
    pub fn unnamed(mut self, type_text: &str) -> RecordBuilder {
        self.record.params.push(Param::new(type_text, None));
        self
    }

    pub fn storage(mut self, storage_class: StorageClass) -> RecordBuilder {
        self.record.storage_class = storage_class;
        self
    }

    pub fn variadic(mut self) -> RecordBuilder {
        self.record.is_variadic = true;
        self
    }

    pub fn offset(mut self, offset: usize) -> RecordBuilder {
        self.record.source_offset = offset;
        self
    }

    /// Finishes the record, placing it in `source_file`.
    pub fn build(mut self, source_file: &str) -> DeclarationRecord {
        self.record.source_file = source_file.to_owned();
        self.record
    }
}
