use thiserror::Error;

use crate::SourceFile;

/// The only document type the conversion service accepts.
pub const REQUIRED_EXTENSION: &str = ".pdf";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a PDF file")]
    NoFile,
    #[error("Please upload a PDF file ({name} is not a PDF)")]
    WrongType { name: String },
    #[error("{name} is empty")]
    Empty { name: String },
    #[error("{name} is too large ({size} bytes, limit {max} bytes)")]
    TooLarge { name: String, size: u64, max: u64 },
    #[error("Please sign in before creating a podcast")]
    NotSignedIn,
}

/// Local checks performed before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionRules {
    pub max_bytes: u64,
    pub require_auth: bool,
    pub signed_in: bool,
}

pub fn validate_source(
    file: Option<&SourceFile>,
    rules: &SubmissionRules,
) -> Result<(), ValidationError> {
    if rules.require_auth && !rules.signed_in {
        return Err(ValidationError::NotSignedIn);
    }
    let file = file.ok_or(ValidationError::NoFile)?;
    if !has_required_extension(&file.name) {
        return Err(ValidationError::WrongType {
            name: file.name.clone(),
        });
    }
    if file.bytes.is_empty() {
        return Err(ValidationError::Empty {
            name: file.name.clone(),
        });
    }
    let size = file.bytes.len() as u64;
    if size > rules.max_bytes {
        return Err(ValidationError::TooLarge {
            name: file.name.clone(),
            size,
            max: rules.max_bytes,
        });
    }
    Ok(())
}

fn has_required_extension(name: &str) -> bool {
    let name = name.trim();
    name.len()
        .checked_sub(REQUIRED_EXTENSION.len())
        .and_then(|start| name.get(start..))
        .is_some_and(|suffix| suffix.eq_ignore_ascii_case(REQUIRED_EXTENSION))
}
