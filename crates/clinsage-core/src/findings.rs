//! 命中项、改写记录与诊断信息
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{MacroStatus, Severity};

/// 单条命中：检测器或搜索词在某一行上的一次匹配，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub path: PathBuf,
    /// 1 起始行号
    pub line_number: usize,
    /// 去掉首尾空白后的原始行
    pub line: String,
    /// 检测器 id 或命中的搜索词
    pub matched: String,
    /// 检测器描述；搜索模式下与 `matched` 相同
    pub description: String,
    /// 搜索模式没有严重级别
    pub severity: Option<Severity>,
}

impl Finding {
    pub fn program_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// 替换记录：每个 (行, 规则) 实际触发一次产生一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationRecord {
    pub path: PathBuf,
    pub line_number: usize,
    /// 该规则应用前的行（trim 后）
    pub original_line: String,
    /// 该规则应用后的行（trim 后）
    pub modified_line: String,
    pub search: String,
    pub replacement: String,
    /// 是否已真正写回磁盘
    pub persisted: bool,
}

impl MutationRecord {
    pub fn program_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// 宏使用检查的一行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroUsage {
    pub name: String,
    pub status: MacroStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// 文件无法读取
    Read,
    /// 文件无法写回：报告中的改写记录与磁盘状态不一致
    Write,
}

/// 单文件级诊断：汇总到运行结果，由调用方展示
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(path: impl Into<PathBuf>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self { path: path.into(), kind, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Read => "read",
            DiagnosticKind::Write => "write",
        };
        write!(f, "[{kind}] {}: {}", self.path.display(), self.message)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 单文件处理结果：有命中、无命中或失败（附诊断）
#[derive(Debug)]
pub(crate) enum FileOutcome<T> {
    Hits(Vec<T>),
    Clean,
    Failed(Diagnostic),
}

impl<T> FileOutcome<T> {
    pub(crate) fn from_records(records: Vec<T>) -> Self {
        if records.is_empty() {
            FileOutcome::Clean
        } else {
            FileOutcome::Hits(records)
        }
    }
}
