//! PDF signature heuristic command.

use std::path::Path;

use caseflow_admin::services::signature::{is_signature_valid, validate_pdf_signature};

use super::{CommandError, print_json};

/// Score the PDF at `path` and print the result.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a PDF.
pub fn check(path: &Path) -> Result<(), CommandError> {
    let bytes = std::fs::read(path).map_err(|source| CommandError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let result = validate_pdf_signature(&bytes)?;

    if is_signature_valid(&result) {
        tracing::info!(confidence = result.confidence, "Signature likely present");
    } else {
        tracing::warn!(confidence = result.confidence, "No signature detected");
    }
    print_json(&result)
}
