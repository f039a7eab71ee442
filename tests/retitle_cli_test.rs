use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LOOKUP: &str = "\
title|nlp|start_day|start_month|start_year|end_day|end_month|end_year
RDNP|95|1|January|1850|31|December|1899
ANJO|31|1|January|1800|23|August|1876
";

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write");
}

fn metadata(title: &str, date: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<lwm>\n<publication id=\"{title}\">\n<issue id=\"1\"><date>{date}</date></issue>\n</publication>\n</lwm>\n"
    )
}

fn retitle(tmp: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("jisc-wrangler");
    cmd.current_dir(tmp)
        .env("HOME", tmp)
        .env("JW_CONFIG_PATH", tmp.join("absent.toml"))
        .env("JW_TITLE_LOOKUP", tmp.join("lookup.csv"));
    cmd.arg("retitle");
    cmd
}

#[test]
fn retitle_rewrites_publication_ids() {
    let tmp = tempdir().expect("tempdir");
    write(&tmp.path().join("lookup.csv"), LOOKUP);
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    let day = "RDNP/1850/05/05";
    write(&input.join(day).join("WO1_RDNP_1850_05_05-0001-001_metadata.xml"), &metadata("RDNP", "1850-05-05"));
    write(&input.join(day).join("WO1_RDNP_1850_05_05-0001-001.txt"), "text");

    retitle(tmp.path())
        .arg(&input)
        .arg(&output)
        .arg("--working_dir")
        .arg(tmp.path().join("work"))
        .assert()
        .success()
        .stdout(predicate::str::contains("rewritten: 1"));

    let xml = fs::read_to_string(
        output.join(day).join("WO1_RDNP_1850_05_05-0001-001_metadata.xml"),
    )
    .expect("xml");
    assert_eq!(xml, metadata("0000095", "1850-05-05"));
    assert!(output.join(day).join("WO1_RDNP_1850_05_05-0001-001.txt").is_file());
    assert!(tmp.path().join("work/jw_alto2txt.log").is_file());
}

#[test]
fn retitle_flags_skipped_files_as_issues() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("in");
    write(&input.join("ANJO/a_metadata.xml"), &metadata("ANJO", "1890-01-01"));
    write(&input.join("ANJO/a.txt"), "a");
    let lookup = tmp.path().join("custom.csv");
    write(&lookup, LOOKUP);

    retitle(tmp.path())
        .arg(&input)
        .arg(tmp.path().join("out"))
        .arg("--lookup")
        .arg(&lookup)
        .arg("--working_dir")
        .arg(tmp.path().join("work"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("skipped: 1"))
        .stdout(predicate::str::contains("unequal input & output metadata file counts"));
}

#[test]
fn retitle_requires_empty_output() {
    let tmp = tempdir().expect("tempdir");
    write(&tmp.path().join("lookup.csv"), LOOKUP);
    let input = tmp.path().join("in");
    fs::create_dir_all(&input).expect("mkdir");
    write(&tmp.path().join("out/old.txt"), "stale");

    retitle(tmp.path())
        .arg(&input)
        .arg(tmp.path().join("out"))
        .arg("--working_dir")
        .arg(tmp.path().join("work"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("initially empty"));
}
