use std::fs;
use std::process::Command;

#[test]
fn experiment_command_writes_reports() {
    let dir = tempfile::tempdir().expect("tmp dir");
    fs::write(dir.path().join("a.align"), "0 1 2 3 0\n").unwrap();
    fs::write(dir.path().join("b.align"), "0 1 2 0 0\n").unwrap();
    let config = dir.path().join("experiment.yaml");
    fs::write(
        &config,
        "\
measures: [nc]
methods: [A, B]
network_pairs:
  - [yeast, human]
alignments:
  layout: files
  files:
    - [a.align, b.align]
",
    )
    .unwrap();
    let out = dir.path().join("out");

    let output = Command::new(env!("CARGO_BIN_EXE_galign"))
        .arg("experiment")
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run galign experiment");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = fs::read_to_string(out.join("report.txt")).unwrap();
    assert!(report.contains("yeast-human\t0.800\t0.600"));
    assert!(out.join("report.csv").is_file());
    assert!(out.join("collection_summary.json").is_file());
}

#[test]
fn alpha_command_reports_missing_row() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let table = dir.path().join("scores.cnf");
    fs::write(&table, "lgraal yeast human 0.75 0.25\n").unwrap();

    let ok = Command::new(env!("CARGO_BIN_EXE_galign"))
        .args(["alpha", "--method", "lgraal", "--g1", "yeast", "--g2", "human", "--beta", "0.5"])
        .arg("--score-table")
        .arg(&table)
        .output()
        .expect("run galign alpha");
    assert!(ok.status.success());
    assert_eq!(String::from_utf8_lossy(&ok.stdout).trim(), "0.75");

    let missing = Command::new(env!("CARGO_BIN_EXE_galign"))
        .args(["alpha", "--method", "sanaec", "--g1", "yeast", "--g2", "human", "--beta", "0.5"])
        .arg("--score-table")
        .arg(&table)
        .output()
        .expect("run galign alpha");
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("sanaec"));
}
