//! 按模式调度：参数校验 → 引擎 → 报告
use std::path::Path;
use tracing::info;

use crate::detectors::DetectorRegistry;
use crate::errors::{ClinsageError, Result};
use crate::findings::Diagnostic;
use crate::macros::{ProgramBuffer, TermIndex};
use crate::options::{RunMode, ScanOptions, ScanStats};
use crate::replace::search_and_replace;
use crate::report::{Report, ReportBuilder};
use crate::scan::{audit_hardcoding, search_terms};
use crate::types::Outcome;

/// 一次运行的完整结果
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: Report,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ScanStats,
}

impl RunOutput {
    pub fn outcome(&self) -> Outcome {
        self.report.outcome()
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// 执行一次分析；只有缺少必填参数或规则/词项无法编译才会返回错误
pub fn run(mode: &RunMode, opts: &ScanOptions) -> Result<RunOutput> {
    let slug = mode.slug();
    info!(mode = slug, extension = %opts.extension, "starting run");

    let out = match mode {
        RunMode::MacroUsage { macro_dir, program_dir } => {
            let macro_dir = required(macro_dir, "macro_dir")?;
            let program_dir = required(program_dir, "program_dir")?;
            let index = TermIndex::from_dir(macro_dir, &opts.extension);
            let mut diagnostics = Vec::new();
            let buffer = ProgramBuffer::load(program_dir, &opts.extension, opts.max_file_size, &mut diagnostics);
            let rows = index.check_usage(&buffer)?;
            let stats = ScanStats {
                files_scanned: buffer.files(),
                files_failed: diagnostics.len(),
                findings: rows.len(),
                files_rewritten: 0,
            };
            RunOutput { report: ReportBuilder::macro_usage(slug, &rows), diagnostics, stats }
        }
        RunMode::TermSearch { root, terms } => {
            let scan = search_terms(required(root, "root")?, terms, opts)?;
            RunOutput {
                report: ReportBuilder::term_search(slug, &scan.records),
                diagnostics: scan.diagnostics,
                stats: scan.stats,
            }
        }
        RunMode::SearchReplace { root, rules } => {
            let scan = search_and_replace(required(root, "root")?, rules, opts)?;
            RunOutput {
                report: ReportBuilder::replacements(slug, &scan.records),
                diagnostics: scan.diagnostics,
                stats: scan.stats,
            }
        }
        RunMode::Hardcoding { root } => {
            let root = required(root, "root")?;
            let detectors = DetectorRegistry::with_rule_file(opts.rules_path.as_deref())?;
            let scan = audit_hardcoding(root, &detectors, opts);
            RunOutput {
                report: ReportBuilder::hardcoding(slug, &scan.records),
                diagnostics: scan.diagnostics,
                stats: scan.stats,
            }
        }
    };

    info!(
        mode = slug,
        files_scanned = out.stats.files_scanned,
        rows = out.report.detail_rows(),
        warnings = out.diagnostics.len(),
        "run finished"
    );
    Ok(out)
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a Path> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClinsageError::MissingParameter(name));
    }
    Ok(Path::new(trimmed))
}
