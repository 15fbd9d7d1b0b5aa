//! Upload acceptance checks.

use super::DocumentsConfig;

const MIB: u64 = 1024 * 1024;

/// What the gateway knows about an uploaded file before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub mime: String,
}

impl FileMeta {
    #[must_use]
    pub fn new(size: u64, mime: impl Into<String>) -> Self {
        Self {
            size,
            mime: mime.into(),
        }
    }
}

/// Every rejection reason for a file, in a user-presentable form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileValidation {
    pub errors: Vec<String>,
}

impl FileValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check size and MIME type, reporting both violations when both apply.
#[must_use]
pub fn validate(documents: &DocumentsConfig, file: &FileMeta) -> FileValidation {
    let mut errors = Vec::new();

    if !documents.is_size_allowed(file.size) {
        errors.push(format!(
            "File size must be less than {}MB",
            rounded_mib(documents.max_file_size)
        ));
    }

    if !documents.is_type_allowed(&file.mime) {
        errors.push(format!("File type {} is not supported", file.mime));
    }

    FileValidation { errors }
}

/// Nearest whole MiB, halves rounding up.
#[must_use]
pub const fn rounded_mib(bytes: u64) -> u64 {
    bytes.saturating_add(MIB / 2) / MIB
}
