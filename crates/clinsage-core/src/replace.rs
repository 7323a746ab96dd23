//! 搜索并替换：逐行按规则顺序改写，只回写真正发生变化的文件
//!
//! - 规则按插入顺序作用于"当前"行内容，前一条规则的结果对后一条可见。
//! - 未命中的行按原始字节输出；没有任何命中的文件不做写操作。
//! - 写回失败时改写记录仍然返回（`persisted = false`），并产出 Write 诊断。
use regex::{escape, NoExpand, Regex, RegexBuilder};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::{ClinsageError, Result};
use crate::findings::{Diagnostic, DiagnosticKind, FileOutcome, MutationRecord};
use crate::options::{ReplaceRules, ScanOptions};
use crate::scan::ScanOutput;
use crate::walker::{decode_lossy, split_lines_inclusive, walk_corpus};

/// 原子写入时使用的临时文件后缀
const TMP_SUFFIX: &str = ".clinsage.tmp";

/// 单条编译后的替换规则
#[derive(Debug, Clone)]
pub struct CompiledReplace {
    pub search: String,
    pub replacement: String,
    regex: Regex,
}

/// 有序替换规则集合
#[derive(Debug, Clone, Default)]
pub struct ReplaceSet {
    rules: Vec<CompiledReplace>,
}

impl ReplaceSet {
    /// 空搜索词会匹配每个位置，直接跳过
    pub fn compile(rules: &ReplaceRules) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (search, replacement) in rules {
            if search.is_empty() {
                warn!("skipping replace rule with empty search term");
                continue;
            }
            let regex = RegexBuilder::new(&escape(search))
                .case_insensitive(true)
                .build()
                .map_err(|e| ClinsageError::InvalidPattern(search.clone(), e))?;
            compiled.push(CompiledReplace { search: search.clone(), replacement: replacement.clone(), regex });
        }
        Ok(Self { rules: compiled })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 对一行依次应用所有规则；返回最终内容与每条触发规则的 (前, 后) 状态
    fn apply_line(&self, line: &str) -> (String, Vec<(&CompiledReplace, String, String)>) {
        let mut current = line.to_string();
        let mut fired = Vec::new();
        for rule in &self.rules {
            if !rule.regex.is_match(&current) {
                continue;
            }
            let next = rule.regex.replace_all(&current, NoExpand(&rule.replacement)).into_owned();
            fired.push((rule, current.trim().to_string(), next.trim().to_string()));
            current = next;
        }
        (current, fired)
    }

    /// 改写整个文件内容；没有任何命中时返回的字节与输入相同
    pub fn rewrite_bytes(&self, path: &Path, bytes: &[u8]) -> (Vec<u8>, Vec<MutationRecord>) {
        let mut out = Vec::with_capacity(bytes.len());
        let mut records = Vec::new();
        for (idx, raw) in split_lines_inclusive(bytes).enumerate() {
            let (line, fired) = self.apply_line(&decode_lossy(raw));
            if fired.is_empty() {
                out.extend_from_slice(raw);
                continue;
            }
            for (rule, before, after) in fired {
                records.push(MutationRecord {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    original_line: before,
                    modified_line: after,
                    search: rule.search.clone(),
                    replacement: rule.replacement.clone(),
                    persisted: false,
                });
            }
            out.extend_from_slice(line.as_bytes());
        }
        (out, records)
    }
}

/// 对语料执行搜索替换
pub fn search_and_replace(root: &Path, rules: &ReplaceRules, opts: &ScanOptions) -> Result<ScanOutput<MutationRecord>> {
    let set = ReplaceSet::compile(rules)?;
    let mut out = ScanOutput::default();
    for path in walk_corpus(root, &opts.extension, opts.max_file_size) {
        let outcome = process_file(&path, &set, opts.atomic_write, &mut out.diagnostics);
        if let FileOutcome::Hits(records) = &outcome {
            if records.iter().all(|r| r.persisted) {
                out.stats.files_rewritten += 1;
            }
        }
        out.absorb(outcome);
    }
    info!(
        files = out.stats.files_scanned,
        rewritten = out.stats.files_rewritten,
        mutations = out.stats.findings,
        "replace finished"
    );
    Ok(out)
}

fn process_file(
    path: &Path,
    set: &ReplaceSet,
    atomic: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> FileOutcome<MutationRecord> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => return FileOutcome::Failed(Diagnostic::new(path, DiagnosticKind::Read, e.to_string())),
    };
    let (rewritten, mut records) = set.rewrite_bytes(path, &bytes);
    if records.is_empty() {
        return FileOutcome::Clean;
    }
    match write_file(path, &rewritten, atomic) {
        Ok(()) => {
            debug!(path = %path.display(), mutations = records.len(), "file rewritten");
            records.iter_mut().for_each(|r| r.persisted = true);
        }
        Err(e) => {
            // 报告里的改写与磁盘不一致，单独告警
            let msg = format!("{} mutation(s) reported but file was not written: {e}", records.len());
            warn!(path = %path.display(), error = %e, "rewrite failed");
            diagnostics.push(Diagnostic::new(path, DiagnosticKind::Write, msg));
        }
    }
    FileOutcome::Hits(records)
}

fn write_file(path: &Path, bytes: &[u8], atomic: bool) -> std::io::Result<()> {
    if !atomic {
        return fs::write(path, bytes);
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(TMP_SUFFIX);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> ReplaceRules {
        pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn rules_apply_in_order_to_current_line() {
        let set = ReplaceSet::compile(&rules(&[("check1", "testval1"), ("Check 2", "Test Value 2")])).unwrap();
        let (out, recs) = set.rewrite_bytes(Path::new("p.sas"), b"CHECK1 and Check 2 values\n");
        assert_eq!(out, b"testval1 and Test Value 2 values\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].original_line, "CHECK1 and Check 2 values");
        assert_eq!(recs[0].modified_line, "testval1 and Check 2 values");
        assert_eq!(recs[1].original_line, "testval1 and Check 2 values");
        assert_eq!(recs[1].modified_line, "testval1 and Test Value 2 values");
        assert_eq!(recs[1].search, "Check 2");
    }

    #[test]
    fn later_rule_sees_earlier_output() {
        let set = ReplaceSet::compile(&rules(&[("a", "b"), ("b", "c")])).unwrap();
        let (out, recs) = set.rewrite_bytes(Path::new("p.sas"), b"a\n");
        assert_eq!(out, b"c\n");
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn unmatched_lines_pass_through_byte_for_byte() {
        let set = ReplaceSet::compile(&rules(&[("dmc4", "dmc5")])).unwrap();
        let input = b"keep \xff raw;\r\nlibname x 'dmc4';\r\nno newline";
        let (out, recs) = set.rewrite_bytes(Path::new("p.sas"), input);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].line_number, 2);
        assert_eq!(out, b"keep \xff raw;\r\nlibname x 'dmc5';\r\nno newline".to_vec());
    }

    #[test]
    fn replacement_is_literal_and_all_occurrences_replaced() {
        let set = ReplaceSet::compile(&rules(&[("x.y", "$1 cost")])).unwrap();
        let (out, recs) = set.rewrite_bytes(Path::new("p.sas"), b"X.Y or x.y but not xzy");
        assert_eq!(out, b"$1 cost or $1 cost but not xzy");
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn empty_search_is_skipped() {
        let set = ReplaceSet::compile(&rules(&[("", "boom"), ("a", "b")])).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clean_file_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.sas");
        fs::write(&path, "data x; run;\n").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        let out = search_and_replace(dir.path(), &rules(&[("zzz", "y")]), &ScanOptions::default()).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.stats.files_rewritten, 0);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.sas");
        fs::write(&path, "%let x=dev;\n").unwrap();
        let opts = ScanOptions { atomic_write: true, ..ScanOptions::default() };

        let out = search_and_replace(dir.path(), &rules(&[("dev", "prod")]), &opts).unwrap();
        assert_eq!(out.stats.files_rewritten, 1);
        assert!(out.records[0].persisted);
        assert_eq!(fs::read_to_string(&path).unwrap(), "%let x=prod;\n");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn write_failure_is_reported_separately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.sas");
        fs::write(&path, "%let x=dev;\n").unwrap();
        // 临时文件路径被目录占用，写入必然失败
        fs::create_dir(tmp_path(&path)).unwrap();
        let opts = ScanOptions { atomic_write: true, ..ScanOptions::default() };

        let out = search_and_replace(dir.path(), &rules(&[("dev", "prod")]), &opts).unwrap();
        assert_eq!(out.records.len(), 1);
        assert!(!out.records[0].persisted);
        assert_eq!(out.stats.files_rewritten, 0);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Write);
        assert_eq!(fs::read_to_string(&path).unwrap(), "%let x=dev;\n");
    }
}
