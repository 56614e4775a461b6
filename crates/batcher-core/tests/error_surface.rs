use batcher_core::errors::{BatcherError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("param", "mode")
        .with_context("expected", "a")
}

#[test]
fn pack_error_surface() {
    let err = BatcherError::Pack(sample_info("pack.mismatch", "members disagree"));
    assert_eq!(err.info().code, "pack.mismatch");
    assert!(err.info().context.contains_key("expected"));
}

#[test]
fn template_error_surface() {
    let err = BatcherError::Template(sample_info("template.missing_param", "unknown"));
    assert_eq!(err.info().code, "template.missing_param");
    assert!(err.info().context.contains_key("param"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = BatcherError::Spec(
        ErrorInfo::new("spec.read", "cannot read description")
            .with_context("path", "exp.json")
            .with_hint("check the --file argument"),
    );
    let text = err.to_string();
    assert!(text.starts_with("spec error: cannot read description (code: spec.read)"));
    assert!(text.contains("path=exp.json"));
    assert!(text.contains("hint: check the --file argument"));
}

#[test]
fn io_helper_records_path() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err = BatcherError::io("spec.read", "/tmp/none.json", io);
    assert_eq!(err.info().context["path"], "/tmp/none.json");
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = BatcherError::Backend(ErrorInfo::new("backend.submit", "sbatch failed"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Backend");
    let back: BatcherError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, err);
}
