//! Integration tests for the PDF signature heuristic.
//!
//! Fixtures are generated in-test so the scanned bytes are known exactly.

#![allow(clippy::unwrap_used)]

use caseflow_admin::services::signature::{
    LARGE_FILE_BYTES, SignatureError, is_signature_valid, validate_pdf_signature,
};
use caseflow_integration_tests::pdf::PdfBuilder;

#[test]
fn test_plain_document_is_unsigned() {
    let pdf = PdfBuilder::new("Quarterly roster").build();
    let result = validate_pdf_signature(&pdf).unwrap();

    assert!(!result.has_signature);
    assert!(result.confidence.abs() < f64::EPSILON);
    assert!(result.details.suspicious_keywords.is_empty());
    assert_eq!(result.details.file_size, pdf.len());
    assert!(!is_signature_valid(&result));
}

#[test]
fn test_signature_dictionary_scores_full_confidence() {
    let pdf = PdfBuilder::new("Employment contract")
        .signed_field("Signature1")
        .build();
    let result = validate_pdf_signature(&pdf).unwrap();

    assert!(result.has_signature);
    assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(result.details.field_count, 1);
    assert!(result.details.has_drawn_signature);
    for keyword in ["/Type /Sig", "/SubFilter", "/ByteRange"] {
        assert!(
            result.details.suspicious_keywords.iter().any(|k| k == keyword),
            "missing {keyword}"
        );
    }
    assert!(is_signature_valid(&result));
}

#[test]
fn test_signature_dictionary_without_form_fields() {
    let pdf = PdfBuilder::new("Offer letter")
        .loose_signature()
        .padded(50 * 1024)
        .build();
    let result = validate_pdf_signature(&pdf).unwrap();

    assert!(pdf.len() < LARGE_FILE_BYTES);
    assert_eq!(result.details.field_count, 0);
    assert!(!result.details.has_form_fields);
    assert!(result.details.has_drawn_signature);
    assert!(result.details.has_text_signature);
    assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    assert!(result.has_signature);
    assert!(is_signature_valid(&result));
}

#[test]
fn test_form_fields_alone_stay_below_threshold() {
    let pdf = PdfBuilder::new("Application form")
        .text_field("FullName")
        .text_field("Nationality")
        .build();
    let result = validate_pdf_signature(&pdf).unwrap();

    assert!(result.details.has_form_fields);
    assert_eq!(result.details.field_count, 2);
    assert!((result.confidence - 0.3).abs() < 1e-9);
    assert!(!result.has_signature);
}

#[test]
fn test_signature_wording_is_enough() {
    let pdf = PdfBuilder::new("Signed via DocuSign").build();
    let result = validate_pdf_signature(&pdf).unwrap();

    assert!(result.details.has_text_signature);
    assert!(!result.details.has_drawn_signature);
    assert_eq!(result.details.suspicious_keywords, ["signed", "docusign"]);
    assert!((result.confidence - 0.6).abs() < 1e-9);
    assert!(result.has_signature);
}

#[test]
fn test_large_file_bonus() {
    let pdf = PdfBuilder::new("Scanned passport")
        .padded(LARGE_FILE_BYTES + 1024)
        .build();
    assert!(pdf.len() > LARGE_FILE_BYTES);

    let result = validate_pdf_signature(&pdf).unwrap();
    assert!((result.confidence - 0.1).abs() < 1e-9);
    assert!(!result.has_signature);
}

#[test]
fn test_rejects_non_pdf_input() {
    assert!(matches!(validate_pdf_signature(&[]), Err(SignatureError::Empty)));
    assert!(matches!(
        validate_pdf_signature(b"PK\x03\x04 this is a zip file"),
        Err(SignatureError::Malformed(_))
    ));
}
