use jacoco2cobertura::error::ConvertError;
use jacoco2cobertura::ingest;

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jacoco.xml");
    std::fs::write(&path, include_bytes!("fixtures/sample_jacoco.xml")).unwrap();

    let report = ingest::load(&path).unwrap();
    assert_eq!(report.session_start_ms, 1723456789123);
    assert_eq!(report.packages.len(), 2);
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ingest::load(&dir.path().join("does-not-exist.xml")).unwrap_err();
    assert!(matches!(err, ConvertError::Io(_)), "{err}");
}

#[test]
fn load_malformed_report_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xml");
    std::fs::write(
        &path,
        b"<report><sessioninfo start=\"0\"/><package name=\"p\"></class></report>",
    )
    .unwrap();

    let err = ingest::load(&path).unwrap_err();
    assert!(matches!(err, ConvertError::Xml { .. }), "{err}");
}

#[test]
fn load_from_reader_matches_file_load() {
    // The stdin route feeds load_from; drive it with a plain buffer.
    let bytes: &[u8] = include_bytes!("fixtures/sample_jacoco.xml");
    let report = ingest::load_from(bytes).unwrap();
    assert_eq!(report.session_start_ms, 1723456789123);
    assert_eq!(report.packages.len(), 2);
}

#[test]
fn load_report_without_sessioninfo_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-session.xml");
    std::fs::write(&path, b"<report name=\"r\"><package name=\"p\"/></report>").unwrap();

    let err = ingest::load(&path).unwrap_err();
    assert!(matches!(err, ConvertError::Parse(_)), "{err}");
}
