use std::path::Path;

use galign_core::errors::{AlignError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("method", "sana")
        .with_context("g1", "yeast")
}

#[test]
fn config_error_surface() {
    let err = AlignError::Config(sample_info("C001", "unknown method"));
    assert_eq!(err.info().code, "C001");
    assert!(err.info().context.contains_key("method"));
    assert!(!err.is_recoverable());
}

#[test]
fn lookup_error_display_names_keys() {
    let err = AlignError::LookupNotFound(sample_info("L001", "no row"));
    let text = err.to_string();
    assert!(text.starts_with("lookup failed: no row (code: L001)"));
    assert!(text.contains("g1=yeast"));
    assert!(text.contains("method=sana"));
}

#[test]
fn missing_result_is_recoverable() {
    let err = AlignError::MissingResult(ErrorInfo::new("R001", "not yet written"));
    assert!(err.is_recoverable());
}

#[test]
fn missing_file_carries_path() {
    let err = AlignError::missing_file(Path::new("scores/table.cnf"));
    assert!(matches!(err, AlignError::MissingFile(_)));
    assert_eq!(
        err.info().context.get("path").map(String::as_str),
        Some("scores/table.cnf")
    );
}

#[test]
fn missing_field_names_field() {
    let err = AlignError::missing_field("ntabus");
    assert_eq!(err.info().code, "config-missing-field");
    assert!(err.to_string().contains("ntabus"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = AlignError::DivisionUndefined(ErrorInfo::new("D001", "zero denominator"));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["family"], "DivisionUndefined");
    let back: AlignError = serde_json::from_value(json).unwrap();
    assert_eq!(back, err);
}
