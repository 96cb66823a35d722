use galign_core::{AlignError, Alignment, Measure, NodeCorrectness};

#[test]
fn written_alignment_loads_back() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("nested/run0.align");
    let alignment = Alignment::new(vec![3, 1, 2, 0]);
    alignment.write(&path).expect("write");
    let loaded = Alignment::load(&path).expect("load");
    assert_eq!(loaded, alignment);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "3 1 2 0\n");
}

#[test]
fn absent_alignment_is_missing_file() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let err = Alignment::load(&dir.path().join("absent.align")).unwrap_err();
    assert!(matches!(err, AlignError::MissingFile(_)));
}

#[test]
fn empty_alignment_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("empty.align");
    std::fs::write(&path, "\n").unwrap();
    let err = Alignment::load(&path).unwrap_err();
    assert_eq!(err.info().code, "alignment-empty");
}

#[test]
fn identity_alignment_is_fully_correct() {
    let score = NodeCorrectness.eval(&Alignment::identity(7)).unwrap();
    assert_eq!(score, 1.0);
}
