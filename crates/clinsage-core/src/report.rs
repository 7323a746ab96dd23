//! 报告生成与导出
//!
//! 报告是一个"工作簿"：若干张表（明细 + 汇总），每张表列固定。
//! 导出为 JSON；空结果不导出，返回 `Ok(None)` 作为"无命中"信号。
use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{ClinsageError, Result};
use crate::findings::{Finding, MacroUsage, MutationRecord};
use crate::types::{Outcome, Severity};

/// 单元格：文本或计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(u64),
}

impl Cell {
    fn text(s: impl AsRef<str>) -> Self {
        Cell::Text(clean_cell(s.as_ref()))
    }

    fn count(n: usize) -> Self {
        Cell::Number(n as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub mode: String,
    pub generated_at: String,
    pub sheets: Vec<Sheet>,
    #[serde(skip)]
    stamp: String,
}

impl Report {
    fn new(mode: &str, sheets: Vec<Sheet>) -> Self {
        let now = Local::now();
        Self {
            mode: mode.to_string(),
            generated_at: now.to_rfc3339(),
            sheets,
            stamp: now.format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// 明细表（第一张表）的行数
    pub fn detail_rows(&self) -> usize {
        self.sheets.first().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.detail_rows() == 0
    }

    pub fn outcome(&self) -> Outcome {
        if self.is_empty() {
            Outcome::NoMatches
        } else {
            Outcome::Success
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// 文件名包含模式与生成时间，避免多次运行互相覆盖
    pub fn file_name(&self) -> String {
        format!("report_{}_{}.json", self.mode, self.stamp)
    }

    /// 导出到目录；空报告不写文件
    pub fn export(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if self.is_empty() {
            info!(mode = %self.mode, "no findings, report not exported");
            return Ok(None);
        }
        let path = dir.join(self.file_name());
        let io_err = |source| ClinsageError::Export { path: path.clone(), source };
        fs::create_dir_all(dir).map_err(io_err)?;
        let mut out = BufWriter::new(File::create(&path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush().map_err(io_err)?;
        info!(path = %path.display(), rows = self.detail_rows(), "report exported");
        Ok(Some(path))
    }
}

/// 按模式组装报告
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn macro_usage(mode: &str, rows: &[MacroUsage]) -> Report {
        let mut detail = Sheet::new("Macro Usage", &["List of macros", "Status"]);
        for r in rows {
            detail.rows.push(vec![Cell::text(&r.name), Cell::text(r.status.as_str())]);
        }
        let summary = summary_sheet("Summary by Status", "Status", rows.iter().map(|r| r.status.as_str()));
        Report::new(mode, vec![detail, summary])
    }

    pub fn term_search(mode: &str, findings: &[Finding]) -> Report {
        let mut detail = Sheet::new(
            "Search Results",
            &["Program Name", "Line Number", "Line Code", "Identified Term"],
        );
        for f in findings {
            detail.rows.push(vec![
                Cell::text(f.program_name()),
                Cell::count(f.line_number),
                Cell::text(&f.line),
                Cell::text(&f.matched),
            ]);
        }
        let summary = summary_sheet("Summary by Term", "Identified Term", findings.iter().map(|f| f.matched.as_str()));
        Report::new(mode, vec![detail, summary])
    }

    pub fn replacements(mode: &str, records: &[MutationRecord]) -> Report {
        let mut detail = Sheet::new(
            "Replacements",
            &[
                "Program Name",
                "Line Number",
                "Original Line",
                "Modified Line",
                "Identified Term",
                "Replaced With",
            ],
        );
        for r in records {
            detail.rows.push(vec![
                Cell::text(r.program_name()),
                Cell::count(r.line_number),
                Cell::text(&r.original_line),
                Cell::text(&r.modified_line),
                Cell::text(&r.search),
                Cell::text(&r.replacement),
            ]);
        }
        let summary = summary_sheet("Summary by Term", "Identified Term", records.iter().map(|r| r.search.as_str()));
        Report::new(mode, vec![detail, summary])
    }

    pub fn hardcoding(mode: &str, findings: &[Finding]) -> Report {
        let mut detail = Sheet::new("Detailed Issues", &["File", "Line Number", "Line", "Issue", "Severity"]);
        for f in findings {
            detail.rows.push(vec![
                Cell::text(f.path.display().to_string()),
                Cell::count(f.line_number),
                Cell::text(&f.line),
                Cell::text(&f.description),
                Cell::text(f.severity.map(Severity::as_str).unwrap_or_default()),
            ]);
        }
        let mut summary = Sheet::new("Summary by Severity", &["Severity", "Count"]);
        for (severity, n) in severity_counts(findings) {
            summary.rows.push(vec![Cell::text(severity.as_str()), Cell::count(n)]);
        }
        Report::new(mode, vec![detail, summary])
    }
}

/// 按严重级别计数：计数降序，相同计数时 High → Medium → Low
pub fn severity_counts(findings: &[Finding]) -> Vec<(Severity, usize)> {
    let mut counts: IndexMap<Severity, usize> =
        [Severity::High, Severity::Medium, Severity::Low].into_iter().map(|s| (s, 0)).collect();
    for s in findings.iter().filter_map(|f| f.severity) {
        *counts.entry(s).or_default() += 1;
    }
    let mut out: Vec<_> = counts.into_iter().filter(|(_, n)| *n > 0).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// 按分类列计数：计数降序，相同计数保持首次出现顺序
pub fn count_by<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for k in keys {
        *counts.entry(k).or_default() += 1;
    }
    let mut out: Vec<_> = counts.into_iter().map(|(k, n)| (k.to_string(), n)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

fn summary_sheet<'a>(name: &str, key_column: &str, keys: impl Iterator<Item = &'a str>) -> Sheet {
    let mut sheet = Sheet::new(name, &[key_column, "Count"]);
    for (k, n) in count_by(keys) {
        sheet.rows.push(vec![Cell::text(k), Cell::count(n)]);
    }
    sheet
}

/// 去掉表格不接受的控制字符（保留 tab 与换行）
fn clean_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| !matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'))
        .collect()
}
