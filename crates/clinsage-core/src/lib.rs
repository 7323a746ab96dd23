//! 核心分析库
//!
//! 设计要点：
//! - 面向脚本语料（默认 `.sas`）的逐行正则分析，不做语法解析。
//! - 四种模式共用一个遍历器：宏使用检查、词项搜索、搜索替换、硬编码审计。
//! - 单文件失败只产出诊断，整次运行不中断。
//! - 替换只回写真正发生变化的文件，未命中的行按原始字节输出。
//! - 输出顺序确定：文件名排序遍历 → 行号 → 词项/检测器定义顺序。

mod options;
mod types;
mod errors;
mod findings;
mod walker;
mod rules;
mod detectors;
mod macros;
mod terms;
mod scan;
mod replace;
mod report;
mod run;

pub use options::{ReplaceRules, RunMode, ScanOptions, ScanStats, DEFAULT_EXTENSION};
pub use types::{MacroStatus, Outcome, Severity};
pub use errors::{ClinsageError, Result};
pub use findings::{Diagnostic, DiagnosticKind, Finding, MacroUsage, MutationRecord};
pub use walker::{decode_lossy, has_extension, read_text, walk_corpus};
pub use rules::{load_rule_specs, RuleSpec};
pub use detectors::{Detector, DetectorKind, DetectorRegistry};
pub use macros::{ProgramBuffer, TermIndex, MACRO_SIGIL};
pub use terms::{parse_replace_rules, parse_search_terms};
pub use scan::{audit_hardcoding, audit_text, search_terms, search_text, ScanOutput, TermMatcher};
pub use replace::{search_and_replace, CompiledReplace, ReplaceSet};
pub use report::{count_by, severity_counts, Cell, Report, ReportBuilder, Sheet};
pub use run::{run, RunOutput};
