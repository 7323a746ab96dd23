//! 扫描主流程：词项搜索与硬编码审计
//!
//! 顺序保证：文件遍历顺序 → 行号升序 → 词项/检测器定义顺序。
//! 单文件读取失败只产出诊断，不影响其余文件。
use regex::{escape, RegexSet, RegexSetBuilder};
use std::path::Path;
use tracing::{debug, warn};

use crate::detectors::DetectorRegistry;
use crate::errors::{ClinsageError, Result};
use crate::findings::{Diagnostic, DiagnosticKind, FileOutcome, Finding};
use crate::options::{ScanOptions, ScanStats};
use crate::walker::{read_text, walk_corpus};

/// 一次扫描的输出
#[derive(Debug, Clone)]
pub struct ScanOutput<T> {
    pub records: Vec<T>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ScanStats,
}

impl<T> Default for ScanOutput<T> {
    fn default() -> Self {
        Self { records: Vec::new(), diagnostics: Vec::new(), stats: ScanStats::default() }
    }
}

impl<T> ScanOutput<T> {
    pub(crate) fn absorb(&mut self, outcome: FileOutcome<T>) {
        match outcome {
            FileOutcome::Hits(mut records) => {
                self.stats.files_scanned += 1;
                self.stats.findings += records.len();
                self.records.append(&mut records);
            }
            FileOutcome::Clean => self.stats.files_scanned += 1,
            FileOutcome::Failed(diag) => {
                warn!(path = %diag.path.display(), message = %diag.message, "file skipped");
                self.stats.files_failed += 1;
                self.diagnostics.push(diag);
            }
        }
    }
}

/// 编译后的搜索词集合：字面量匹配、忽略大小写
#[derive(Debug, Clone)]
pub struct TermMatcher {
    terms: Vec<String>,
    set: RegexSet,
}

impl TermMatcher {
    pub fn new(terms: &[String]) -> Result<Self> {
        let set = RegexSetBuilder::new(terms.iter().map(|t| escape(t)))
            .case_insensitive(true)
            .build()
            .map_err(|e| ClinsageError::InvalidPattern("search_terms".to_string(), e))?;
        Ok(Self { terms: terms.to_vec(), set })
    }

    /// 按调用方给定的顺序返回命中该行的词项
    pub fn matches<'a>(&'a self, line: &str) -> impl Iterator<Item = &'a str> + 'a {
        let hits = self.set.matches(line);
        self.terms
            .iter()
            .enumerate()
            .filter(move |(i, _)| hits.matched(*i))
            .map(|(_, t)| t.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// 在语料中搜索词项；一行命中几个词就产出几条 Finding
pub fn search_terms(root: &Path, terms: &[String], opts: &ScanOptions) -> Result<ScanOutput<Finding>> {
    let matcher = TermMatcher::new(terms)?;
    if matcher.is_empty() {
        debug!("empty term list, nothing to search");
    }
    Ok(drive(root, opts, |path, text| search_text(path, text, &matcher)))
}

/// 对语料执行全部检测器
pub fn audit_hardcoding(root: &Path, detectors: &DetectorRegistry, opts: &ScanOptions) -> ScanOutput<Finding> {
    drive(root, opts, |path, text| audit_text(path, text, detectors))
}

pub fn search_text(path: &Path, text: &str, matcher: &TermMatcher) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for term in matcher.matches(line) {
            findings.push(Finding {
                path: path.to_path_buf(),
                line_number: idx + 1,
                line: line.trim().to_string(),
                matched: term.to_string(),
                description: term.to_string(),
                severity: None,
            });
        }
    }
    findings
}

pub fn audit_text(path: &Path, text: &str, detectors: &DetectorRegistry) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for d in detectors.detect(line) {
            findings.push(Finding {
                path: path.to_path_buf(),
                line_number: idx + 1,
                line: line.trim().to_string(),
                matched: d.id.clone(),
                description: d.description.clone(),
                severity: Some(d.severity),
            });
        }
    }
    findings
}

/// 遍历语料并对每个文件的文本调用 `per_file`
fn drive<T, F>(root: &Path, opts: &ScanOptions, per_file: F) -> ScanOutput<T>
where
    F: FnMut(&Path, &str) -> Vec<T>,
{
    drive_with(root, opts, read_text, per_file)
}

/// 单个文件读取失败只记诊断，继续处理后续文件
fn drive_with<T, R, F>(root: &Path, opts: &ScanOptions, mut read: R, mut per_file: F) -> ScanOutput<T>
where
    R: FnMut(&Path) -> std::io::Result<String>,
    F: FnMut(&Path, &str) -> Vec<T>,
{
    let mut out = ScanOutput::default();
    for path in walk_corpus(root, &opts.extension, opts.max_file_size) {
        let outcome = match read(&path) {
            Ok(text) => FileOutcome::from_records(per_file(&path, &text)),
            Err(e) => FileOutcome::Failed(Diagnostic::new(&path, DiagnosticKind::Read, e.to_string())),
        };
        out.absorb(outcome);
    }
    debug!(files = out.stats.files_scanned, findings = out.stats.findings, "scan finished");
    out
}
