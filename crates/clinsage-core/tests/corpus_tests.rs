use clinsage_core::{
    parse_replace_rules, run, MacroStatus, Outcome, RunMode, ScanOptions, Severity,
};
use std::fs;
use tempfile::TempDir;

fn corpus(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, body) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
    dir
}

fn root_of(dir: &TempDir) -> String {
    dir.path().display().to_string()
}

fn replace_mode(dir: &TempDir, spec: &str) -> RunMode {
    RunMode::SearchReplace { root: root_of(dir), rules: parse_replace_rules(spec) }
}

#[test]
fn other_extensions_never_contribute() {
    let dir = corpus(&[
        ("prog.sas", b"%let dev=1;\n"),
        ("prog.SAS", b"%let dev=2;\n"),
        ("notes.txt", b"dev dev dev\n"),
        ("prog.sas.bak", b"dev\n"),
    ]);
    let out = run(
        &RunMode::TermSearch { root: root_of(&dir), terms: vec!["dev".into()] },
        &ScanOptions::default(),
    )
    .unwrap();
    assert_eq!(out.stats.files_scanned, 2);
    let detail = out.report.sheet("Search Results").unwrap();
    assert_eq!(detail.rows.len(), 2);
}

#[test]
fn replace_example_rewrites_line_and_logs_two_mutations() {
    let dir = corpus(&[("p.sas", b"CHECK1 and Check 2 values\n")]);
    let out = run(&replace_mode(&dir, "check1:testval1\nCheck 2:Test Value 2"), &ScanOptions::default()).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("p.sas")).unwrap(),
        "testval1 and Test Value 2 values\n"
    );
    assert_eq!(out.stats.findings, 2);
    assert_eq!(out.stats.files_rewritten, 1);
    let detail = out.report.sheet("Replacements").unwrap();
    assert_eq!(detail.rows.len(), 2);
}

#[test]
fn second_replace_pass_is_a_no_op() {
    let dir = corpus(&[("a.sas", b"libname x 'dmc4';\n"), ("sub/b.sas", b"title 'DMC4 run';\n")]);
    let mode = replace_mode(&dir, "dmc4:dmc5");
    let first = run(&mode, &ScanOptions::default()).unwrap();
    assert_eq!(first.stats.findings, 2);

    let second = run(&mode, &ScanOptions::default()).unwrap();
    assert_eq!(second.stats.findings, 0);
    assert_eq!(second.outcome(), Outcome::NoMatches);
}

#[test]
fn replacement_matching_a_search_term_retriggers() {
    let dir = corpus(&[("a.sas", b"x = dev;\n")]);
    // 第二条规则把 prod 又换回包含 dev 的文本
    let mode = replace_mode(&dir, "dev:prod\nprod:prod_dev");
    let first = run(&mode, &ScanOptions::default()).unwrap();
    assert_eq!(first.stats.findings, 2);
    assert_eq!(fs::read_to_string(dir.path().join("a.sas")).unwrap(), "x = prod_dev;\n");

    let second = run(&mode, &ScanOptions::default()).unwrap();
    assert!(second.stats.findings > 0);
}

#[test]
fn untouched_files_stay_byte_identical() {
    let odd: &[u8] = b"data x;\r\n  y = '\xe9t\xe9';\rrun;\n\n";
    let dir = corpus(&[("clean.sas", odd), ("dirty.sas", b"keep dev;\r\nkeep \xff raw;\r\n")]);
    run(&replace_mode(&dir, "dev:prod"), &ScanOptions::default()).unwrap();

    assert_eq!(fs::read(dir.path().join("clean.sas")).unwrap(), odd);
    assert_eq!(fs::read(dir.path().join("dirty.sas")).unwrap(), b"keep prod;\r\nkeep \xff raw;\r\n");
}

#[test]
fn macro_usage_follows_substring_policy() {
    let macros = corpus(&[("STD1.sas", b""), ("unused.sas", b""), ("deep/ignored.sas", b"")]);
    let programs = corpus(&[("t/adsl.sas", b"%Std1x(in=adsl);\n")]);
    let out = run(
        &RunMode::MacroUsage { macro_dir: root_of(&macros), program_dir: root_of(&programs) },
        &ScanOptions::default(),
    )
    .unwrap();

    let detail = out.report.sheet("Macro Usage").unwrap();
    let rows: Vec<_> = detail
        .rows
        .iter()
        .map(|r| serde_json::to_value(r).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], serde_json::json!(["std1", MacroStatus::Used.as_str()]));
    assert_eq!(rows[1], serde_json::json!(["unused", "Not Used"]));
}

#[test]
fn hardcoding_audit_reports_severity_summary() {
    let dir = corpus(&[("qc/adae.sas", b"data adae;\n  if patid = \"001\";\nrun;\n")]);
    let out = run(&RunMode::Hardcoding { root: root_of(&dir) }, &ScanOptions::default()).unwrap();
    let detail = out.report.sheet("Detailed Issues").unwrap();
    assert_eq!(detail.rows.len(), 2);

    let summary = serde_json::to_value(out.report.sheet("Summary by Severity").unwrap()).unwrap();
    assert_eq!(summary["rows"], serde_json::json!([[Severity::High.as_str(), 1], ["Medium", 1]]));
}

#[test]
fn extra_rule_file_adds_detectors() {
    let dir = corpus(&[
        ("p.sas", b"libname raw '/data/prod';\n" as &[u8]),
        ("rules.toml", b"[[rules]]\nid = \"libname\"\ndescription = \"Hardcoded library\"\npattern = \"(?i)^libname\"\nseverity = \"High\"\n"),
    ]);
    let opts = ScanOptions { rules_path: Some(dir.path().join("rules.toml")), ..ScanOptions::default() };
    let out = run(&RunMode::Hardcoding { root: root_of(&dir) }, &opts).unwrap();
    let detail = serde_json::to_value(out.report.sheet("Detailed Issues").unwrap()).unwrap();
    let issues: Vec<_> = detail["rows"].as_array().unwrap().iter().map(|r| r[3].clone()).collect();
    assert!(issues.contains(&serde_json::json!("Hardcoded library")));
    assert!(issues.contains(&serde_json::json!("Constant string literal")));
}

#[test]
fn empty_corpus_signals_no_matches_and_exports_nothing() {
    let dir = corpus(&[("readme.txt", b"nothing here")]);
    let out = run(&RunMode::Hardcoding { root: root_of(&dir) }, &ScanOptions::default()).unwrap();
    assert_eq!(out.outcome(), Outcome::NoMatches);

    let reports = tempfile::tempdir().unwrap();
    assert!(out.report.export(reports.path()).unwrap().is_none());
    assert_eq!(fs::read_dir(reports.path()).unwrap().count(), 0);
}

#[test]
fn directory_with_target_extension_is_not_read() {
    let dir = corpus(&[("ok.sas", b"%let dev=1;\n")]);
    fs::create_dir(dir.path().join("weird.sas")).unwrap();
    let out = run(
        &RunMode::TermSearch { root: root_of(&dir), terms: vec!["dev".into()] },
        &ScanOptions::default(),
    )
    .unwrap();
    assert_eq!(out.stats.files_scanned, 1);
    assert_eq!(out.stats.files_failed, 0);
    assert!(!out.has_warnings());
}

#[cfg(unix)]
#[test]
fn symlinked_program_is_scanned() {
    let shared = corpus(&[("shared.sas", b"%let dev=1;\n")]);
    let dir = corpus(&[("own.sas", b"data x; run;\n")]);
    std::os::unix::fs::symlink(shared.path().join("shared.sas"), dir.path().join("linked.sas")).unwrap();

    let out = run(
        &RunMode::TermSearch { root: root_of(&dir), terms: vec!["dev".into()] },
        &ScanOptions::default(),
    )
    .unwrap();
    assert_eq!(out.stats.files_scanned, 2);
    assert_eq!(out.report.sheet("Search Results").unwrap().rows.len(), 1);
}
