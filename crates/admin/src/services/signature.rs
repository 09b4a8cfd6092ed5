//! PDF signature heuristic.
//!
//! Estimates whether a PDF *contains* a signature by counting form fields and
//! scanning the serialized document for signature-related tokens.
//!
//! This is a probabilistic check, not signature verification. No certificate,
//! digest or byte range is validated, so the result is not tamper-proof and
//! must not be relied on for non-repudiation. It can accept an unsigned PDF
//! whose body text mentions "signature", and it can reject a validly signed
//! PDF produced by a signing product it does not recognize.

use std::sync::LazyLock;

use lopdf::{Document, Object};
use regex::bytes::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Confidence above which a document is treated as signed.
pub const SIGNATURE_THRESHOLD: f64 = 0.4;

/// Inputs longer than this get the large-file bonus.
pub const LARGE_FILE_BYTES: usize = 500 * 1024;

/// Deepest `/Kids` nesting followed when counting form fields.
const MAX_FIELD_DEPTH: usize = 16;

/// Indicator tokens: (reported keyword, pattern, marks a signature dictionary).
const INDICATORS: &[(&str, &str, bool)] = &[
    ("signature", r"signature", false),
    ("signed", r"signed", false),
    ("digital signature", r"digital\s+signature", false),
    ("electronic signature", r"electronic\s+signature", false),
    ("e-signature", r"e-signature", false),
    ("docusign", r"docusign", false),
    ("adobe sign", r"adobe\s+sign", false),
    ("hellosign", r"hellosign", false),
    ("pandadoc", r"pandadoc", false),
    ("signnow", r"signnow", false),
    ("/Type /Sig", r"/Type\s*/Sig\b", true),
    ("/SubFilter", r"/SubFilter\b", true),
    ("/ByteRange", r"/ByteRange\b", false),
];

static PATTERNS: LazyLock<Vec<(&'static str, Regex, bool)>> = LazyLock::new(|| {
    INDICATORS
        .iter()
        .map(|&(keyword, pattern, structural)| {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .unicode(false)
                .build()
                .expect("valid signature pattern");
            (keyword, regex, structural)
        })
        .collect()
});

/// Errors from [`validate_pdf_signature`].
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("empty document")]
    Empty,

    #[error("malformed PDF: {0}")]
    Malformed(String),

    #[error("failed to serialize PDF: {0}")]
    Serialize(String),
}

/// What the heuristic observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignatureDetails {
    pub has_form_fields: bool,
    pub field_count: usize,
    pub has_text_signature: bool,
    pub has_drawn_signature: bool,
    /// Matched indicator tokens, deduplicated, in vocabulary order.
    pub suspicious_keywords: Vec<String>,
    /// Length of the submitted bytes.
    pub file_size: usize,
}

/// Verdict of the heuristic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureValidation {
    pub has_signature: bool,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub details: SignatureDetails,
}

/// Inspect `bytes` and estimate whether the document carries a signature.
///
/// # Errors
///
/// Returns `SignatureError::Empty` for an empty slice and
/// `SignatureError::Malformed` if the bytes do not parse as a PDF.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn validate_pdf_signature(bytes: &[u8]) -> Result<SignatureValidation, SignatureError> {
    if bytes.is_empty() {
        return Err(SignatureError::Empty);
    }

    let mut document =
        Document::load_mem(bytes).map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let field_count = count_form_fields(&document)?;

    let mut serialized = Vec::with_capacity(bytes.len());
    document
        .save_to(&mut serialized)
        .map_err(|e| SignatureError::Serialize(e.to_string()))?;

    let mut details = scan_tokens(&serialized);
    details.field_count = field_count;
    details.has_form_fields = field_count > 0;
    details.file_size = bytes.len();

    let confidence = score(&details);
    let validation = SignatureValidation {
        has_signature: confidence > SIGNATURE_THRESHOLD,
        confidence,
        details,
    };
    debug!(
        confidence = validation.confidence,
        keywords = validation.details.suspicious_keywords.len(),
        fields = validation.details.field_count,
        "pdf signature heuristic"
    );
    Ok(validation)
}

/// Accumulate confidence from observed details, capped at 1.0.
#[must_use]
pub fn score(details: &SignatureDetails) -> f64 {
    let mut confidence: f64 = 0.0;
    if details.has_form_fields {
        confidence += 0.3;
    }
    if details.has_text_signature {
        confidence += 0.4;
    }
    if details.has_drawn_signature {
        confidence += 0.5;
    }
    if !details.suspicious_keywords.is_empty() {
        confidence += 0.2;
    }
    if details.suspicious_keywords.len() > 2 {
        confidence += 0.1;
    }
    if details.file_size > LARGE_FILE_BYTES {
        confidence += 0.1;
    }
    confidence.min(1.0)
}

/// Gate used before accepting an upload marked as signed.
///
/// Probabilistic: see the module documentation for its failure modes.
#[must_use]
pub fn is_signature_valid(result: &SignatureValidation) -> bool {
    let details = &result.details;
    result.confidence > SIGNATURE_THRESHOLD
        && (details.has_text_signature || details.has_form_fields || details.has_drawn_signature)
}

fn scan_tokens(serialized: &[u8]) -> SignatureDetails {
    let mut details = SignatureDetails::default();
    for (keyword, regex, structural) in PATTERNS.iter() {
        if !regex.is_match(serialized) {
            continue;
        }
        details.suspicious_keywords.push((*keyword).to_owned());
        details.has_text_signature = true;
        if *structural {
            details.has_drawn_signature = true;
        }
    }
    details
}

/// Count terminal fields reachable from the catalog's `/AcroForm /Fields`.
fn count_form_fields(document: &Document) -> Result<usize, SignatureError> {
    let catalog = document
        .catalog()
        .map_err(|e| SignatureError::Malformed(format!("no document catalog: {e}")))?;

    let fields = catalog
        .get(b"AcroForm")
        .and_then(|form| document.dereference(form))
        .and_then(|(_, form)| form.as_dict())
        .and_then(|form| form.get(b"Fields"))
        .and_then(|fields| document.dereference(fields))
        .and_then(|(_, fields)| fields.as_array());

    Ok(fields.map_or(0, |fields| count_fields(document, fields, 0)))
}

fn count_fields(document: &Document, fields: &[Object], depth: usize) -> usize {
    fields
        .iter()
        .filter_map(|field| document.dereference(field).ok())
        .filter_map(|(_, field)| field.as_dict().ok())
        .map(|field| {
            let child_fields: Vec<Object> = if depth < MAX_FIELD_DEPTH {
                field
                    .get(b"Kids")
                    .and_then(|kids| document.dereference(kids))
                    .and_then(|(_, kids)| kids.as_array())
                    .map(|kids| {
                        kids.iter()
                            .filter(|kid| {
                                document
                                    .dereference(kid)
                                    .and_then(|(_, kid)| kid.as_dict())
                                    .is_ok_and(|kid| kid.has(b"T"))
                            })
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            } else {
                Vec::new()
            };

            if child_fields.is_empty() {
                1
            } else {
                count_fields(document, &child_fields, depth + 1)
            }
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details(keywords: usize) -> SignatureDetails {
        SignatureDetails {
            suspicious_keywords: (0..keywords).map(|i| format!("k{i}")).collect(),
            has_text_signature: keywords > 0,
            ..SignatureDetails::default()
        }
    }

    #[test]
    fn test_score_is_capped() {
        let all = SignatureDetails {
            has_form_fields: true,
            field_count: 2,
            has_text_signature: true,
            has_drawn_signature: true,
            suspicious_keywords: vec!["a".into(), "b".into(), "c".into()],
            file_size: LARGE_FILE_BYTES + 1,
        };
        assert!((score(&all) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_is_monotonic_in_keywords() {
        let mut previous = score(&details(0));
        for n in 1..6 {
            let current = score(&details(n));
            assert!(current >= previous, "{n} keywords scored lower");
            previous = current;
        }
    }

    #[test]
    fn test_form_fields_alone_are_not_enough() {
        let result = SignatureValidation {
            confidence: 0.3,
            has_signature: false,
            details: SignatureDetails {
                has_form_fields: true,
                field_count: 1,
                ..SignatureDetails::default()
            },
        };
        assert!(!is_signature_valid(&result));
    }

    #[test]
    fn test_large_file_boundary() {
        let at_limit = SignatureDetails {
            file_size: LARGE_FILE_BYTES,
            ..SignatureDetails::default()
        };
        let over = SignatureDetails {
            file_size: LARGE_FILE_BYTES + 1,
            ..SignatureDetails::default()
        };
        assert!(score(&at_limit).abs() < f64::EPSILON);
        assert!((score(&over) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_tokens_tolerate_whitespace_and_case() {
        let found = scan_tokens(b"<< /type/sig /BYTERANGE [0 1 2 3] >>");
        assert_eq!(found.suspicious_keywords, ["/Type /Sig", "/ByteRange"]);
        assert!(found.has_drawn_signature);
        assert!(found.has_text_signature);
    }

    #[test]
    fn test_plain_keywords_are_text_only() {
        let found = scan_tokens(b"(Electronic   Signature by HelloSign)");
        assert_eq!(
            found.suspicious_keywords,
            ["signature", "electronic signature", "hellosign"]
        );
        assert!(found.has_text_signature);
        assert!(!found.has_drawn_signature);
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(matches!(validate_pdf_signature(b""), Err(SignatureError::Empty)));
        assert!(matches!(
            validate_pdf_signature(b"definitely not a pdf"),
            Err(SignatureError::Malformed(_))
        ));
    }
}
