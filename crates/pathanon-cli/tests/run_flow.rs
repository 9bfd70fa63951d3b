#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn pathanon_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pathanon"))
}

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(label: &str) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "pathanon_flow_test_{}_{}",
            std::process::id(),
            label.replace(['\\', '/', ':'], "_")
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn join(&self, rel: &str) -> PathBuf {
        self.path.join(rel)
    }

    fn slide(&self, rel: &str) {
        let path = self.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create slide dir");
        std::fs::write(path, b"slide").expect("write slide");
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

const FAKE_ANONYMIZER: &str = r#"#!/bin/sh
echo "$@" >> "$FAKE_ANON_LOG"
if [ "$1" = "-o" ]; then
  : > "$2/${4}_anon.svs"
else
  : > "$(dirname "$3")/${2}_anon.svs"
fi
"#;

const FAILING_ANONYMIZER: &str = "#!/bin/sh\nexit 2\n";

fn install_script(dir: &TestDir, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}

fn write_csv_ledger(path: &Path, rows: &[&[&str]]) {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .expect("create ledger");
    writer
        .write_record(["", "", "", "AIDA Pathology Anonymization Sheet"])
        .expect("title row");
    for _ in 2..12 {
        writer.write_record([""]).expect("spacer row");
    }
    writer
        .write_record(["Status", "Case", "OrigFile", "AnonID", "Block", "Stain"])
        .expect("header row");
    for row in rows {
        writer.write_record(*row).expect("data row");
    }
    writer.flush().expect("flush ledger");
}

/// Data rows (13 onwards), first six cells each.
fn read_data_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .expect("open ledger");
    reader
        .records()
        .skip(12)
        .map(|record| {
            let record = record.expect("read record");
            (0..6)
                .map(|i| record.get(i).unwrap_or("").to_string())
                .collect()
        })
        .collect()
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

fn call_count(log: &Path) -> usize {
    std::fs::read_to_string(log)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

fn stderr_contains_reason_code(stderr: &str, code: &str) -> bool {
    stderr.lines().any(|line| {
        serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|v| v.get("reason_code").and_then(|r| r.as_str()).map(str::to_string))
            .is_some_and(|r| r == code)
    })
}

fn run(dir: &TestDir, ledger: &Path, tool: &Path, extra: &[&str]) -> Output {
    pathanon_cmd()
        .arg("run")
        .arg("--ledger")
        .arg(ledger)
        .arg("--anonymizer")
        .arg(tool)
        .args(["--prefix", "P", "--digits", "3"])
        .args(extra)
        .env("FAKE_ANON_LOG", dir.join("calls.log"))
        .output()
        .expect("run pathanon run")
}

#[test]
fn pending_case_is_anonymized_and_rerun_is_stable() {
    let dir = TestDir::new("expand");
    dir.slide("case1/A_HE/a.svs");
    dir.slide("case1/B_PAS/b.svs");
    let tool = install_script(&dir, "fake_anon.sh", FAKE_ANONYMIZER);
    let ledger = dir.join("study.csv");
    write_csv_ledger(&ledger, &[&["", "case1"]]);

    let out = run(&dir, &ledger, &tool, &[]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Your data is now Pseudonymous."));
    assert!(!stdout.contains("not referenced by the ledger"));

    assert_eq!(
        read_data_rows(&ledger),
        vec![
            row(&["Done", "case1", "A_HE/a.svs", "P001", "A", "HE"]),
            row(&["Done", "case1", "B_PAS/b.svs", "P001", "B", "PAS"]),
        ]
    );
    let anondir = dir.join("study_anon");
    assert!(anondir.join("P001;P001;A;HE_anon.svs").is_file());
    assert!(anondir.join("P001;P001;B;PAS_anon.svs").is_file());
    assert!(dir.join("study_tmp").is_dir());
    assert_eq!(call_count(&dir.join("calls.log")), 2);

    let after_first = std::fs::read(&ledger).expect("read ledger");
    let out = run(&dir, &ledger, &tool, &[]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(call_count(&dir.join("calls.log")), 2);
    assert_eq!(std::fs::read(&ledger).expect("read ledger"), after_first);
}

#[test]
fn anonymizer_failure_is_fatal_and_leaves_row_pending() {
    let dir = TestDir::new("tool_fails");
    dir.slide("case1/A_HE/a.svs");
    let tool = install_script(&dir, "failing.sh", FAILING_ANONYMIZER);
    let ledger = dir.join("study.csv");
    write_csv_ledger(&ledger, &[&["", "case1"]]);

    let out = run(&dir, &ledger, &tool, &[]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr_contains_reason_code(&stderr, "ANONYMIZER_FAILED"));
    assert!(stderr.contains("Error on row 13"));
    assert_eq!(read_data_rows(&ledger)[0][0], "");
}

#[test]
fn move_output_style_collects_tool_output() {
    let dir = TestDir::new("move_output");
    dir.slide("case1/A_HE/a.svs");
    let tool = install_script(&dir, "fake_anon.sh", FAKE_ANONYMIZER);
    let ledger = dir.join("study.csv");
    write_csv_ledger(&ledger, &[&["", "case1"]]);

    let out = run(&dir, &ledger, &tool, &["--anonymizer-style", "move-output"]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.join("study_anon").join("P001;P001;A;HE_anon.svs").is_file());
    assert!(!dir.join("case1/A_HE/P001;P001;A;HE_anon.svs").exists());
}

#[test]
fn missing_case_stops_early_without_error() {
    let dir = TestDir::new("early_stop");
    dir.slide("case1/A_HE/a.svs");
    let tool = install_script(&dir, "fake_anon.sh", FAKE_ANONYMIZER);
    let ledger = dir.join("study.csv");
    write_csv_ledger(&ledger, &[&["", "case1"], &["", "case2"]]);

    let out = run(&dir, &ledger, &tool, &[]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Terminating at Row 14: Case case2 does not exist"));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr_contains_reason_code(&stderr, "CASE_NOT_FOUND"));

    let rows = read_data_rows(&ledger);
    assert_eq!(rows[0], row(&["Done", "case1", "A_HE/a.svs", "P001", "A", "HE"]));
    assert_eq!(rows[1][0..2], row(&["", "case2"])[..]);
}

#[test]
fn garbage_command_lists_unknown_outputs() {
    let dir = TestDir::new("garbage");
    dir.slide("case1/A_HE/a.svs");
    let tool = install_script(&dir, "fake_anon.sh", FAKE_ANONYMIZER);
    let ledger = dir.join("study.csv");
    write_csv_ledger(&ledger, &[&["", "case1"]]);

    let out = run(&dir, &ledger, &tool, &[]);
    assert_eq!(out.status.code(), Some(0));
    std::fs::write(dir.join("study_anon").join("P009;P009;Z;HE_anon.svs"), b"x")
        .expect("write stray output");

    let out = pathanon_cmd()
        .arg("garbage")
        .arg("--ledger")
        .arg(&ledger)
        .output()
        .expect("run garbage");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("P009;P009;Z;HE_anon.svs"));
    assert!(!stdout.contains("P001;P001;A;HE_anon.svs"));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr_contains_reason_code(&stderr, "GARBAGE_FOUND"));
}
