use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write");
}

fn seed_input(input: &Path) {
    write(input, "JISC1/WO1/BDPO/1894/11/07/service/WO1_BDPO_1894_11_07-0001.xml", "a");
    write(input, "JISC1/WO1/BDPO/1894/11/08/service/WO1_BDPO_1894_11_08-0001.xml", "b");
    write(input, "JISC2/WO1/BDPO/1894/11/08/service/WO1_BDPO_1894_11_08-0001.xml", "b");
    write(input, "JISC2/WO1/LEMR/1873/01/04_S/master/WO1_LEMR_1873_01_04_S-0001.xml", "c");
    write(input, "JISC3/lsidyv10001b/MOPT-1861-12-05.xml", "d");
    write(input, "JISC4/OSMaps/sheet1/metadata.xml", "e");
}

fn wrangler(tmp: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("jisc-wrangler");
    cmd.current_dir(tmp)
        .env("HOME", tmp)
        .env("JW_CONFIG_PATH", tmp.join("absent.toml"))
        .env("JW_PROGRESS", "false")
        .env_remove("JW_ALT_SUFFIX")
        .env_remove("JW_WORKING_DIR");
    cmd
}

fn single_working_subdir(work: &Path) -> std::path::PathBuf {
    let mut dirs: Vec<_> = fs::read_dir(work)
        .expect("read work")
        .map(|e| e.expect("entry").path())
        .collect();
    assert_eq!(dirs.len(), 1, "{dirs:?}");
    dirs.remove(0)
}

#[test]
fn wrangle_merges_inputs_into_canonical_tree() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    let work = tmp.path().join("work");
    seed_input(&input);

    wrangler(tmp.path())
        .arg("wrangle")
        .arg(&input)
        .arg(&output)
        .arg("--working_dir")
        .arg(&work)
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicates: 1"))
        .stdout(predicate::str::contains("ignored: 1"));

    assert!(output.join("BDPO/1894/11/07/WO1_BDPO_1894_11_07-0001.xml").is_file());
    assert!(output.join("BDPO/1894/11/08/WO1_BDPO_1894_11_08-0001.xml").is_file());
    assert!(output.join("LEMR/1873/01/04/WO1_LEMR_1873_01_04_S-0001.xml").is_file());
    assert!(output.join("MOPT/1861/12/05/MOPT-1861-12-05.xml").is_file());
    assert!(!output.join("LEMR/1873/01/04_S").exists());

    let run_dir = single_working_subdir(&work);
    let log = fs::read_to_string(run_dir.join("jw.log")).expect("log");
    assert!(log.contains("Found 1 files matching the OSMAPS pattern."));
    let duplicates = fs::read_to_string(run_dir.join("jw_duplicates.txt")).expect("dups");
    assert!(duplicates.contains(" duplicated at "));
}

#[test]
fn wrangle_json_report_and_dry_run() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    seed_input(&input);

    let assert = wrangler(tmp.path())
        .arg("--json")
        .arg("wrangle")
        .arg(&input)
        .arg(&output)
        .arg("--working-dir")
        .arg(tmp.path().join("work"))
        .arg("--dry-run")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["command"], "wrangle");
    assert_eq!(report["ok"], true);
    assert_eq!(fs::read_dir(&output).expect("read out").count(), 0);
}

#[test]
fn wrangle_fails_on_unmatched_paths() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    let work = tmp.path().join("work");
    seed_input(&input);
    write(&input, "misc/readme.txt", "?");

    wrangler(tmp.path())
        .arg("wrangle")
        .arg(&input)
        .arg(tmp.path().join("out"))
        .arg("--working_dir")
        .arg(&work)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("JW001_UNMATCHED"));

    let run_dir = single_working_subdir(&work);
    let unmatched = fs::read_to_string(run_dir.join("jw_unmatched.txt")).expect("manifest");
    assert!(unmatched.contains("misc/readme.txt"));
}

#[test]
fn wrangle_rejects_output_inside_input() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    seed_input(&input);

    wrangler(tmp.path())
        .arg("wrangle")
        .arg(&input)
        .arg(input.join("out"))
        .arg("--working_dir")
        .arg(tmp.path().join("work"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("JW008_INVALID_LAYOUT"));
}

#[test]
fn classify_reports_unmatched_as_issues() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    seed_input(&input);
    write(&input, "misc/readme.txt", "?");

    wrangler(tmp.path())
        .arg("classify")
        .arg(&input)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("SERVICE: 3"))
        .stdout(predicate::str::contains("unmatched: "));
}
