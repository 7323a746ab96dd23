//! 扫描选项、运行模式与统计信息（模块）
use indexmap::IndexMap;
use std::path::PathBuf;

/// 默认目标扩展名（不含点号，比较时忽略大小写）
pub const DEFAULT_EXTENSION: &str = "sas";

/// 扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 目标文件扩展名，例如 "sas"
    pub extension: String,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 额外检测规则文件（TOML），追加在内置检测器之后
    pub rules_path: Option<PathBuf>,
    /// 替换模式：先写临时文件再 rename 覆盖原文件
    pub atomic_write: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            max_file_size: None,
            rules_path: None,
            atomic_write: false,
        }
    }
}

/// 有序的 search → replace 规则表；插入顺序即应用顺序
pub type ReplaceRules = IndexMap<String, String>;

/// 运行模式：四种分析任务共用同一套引擎，由调用方显式选择
#[derive(Debug, Clone)]
pub enum RunMode {
    /// 宏使用情况检查
    MacroUsage { macro_dir: String, program_dir: String },
    /// 词项搜索
    TermSearch { root: String, terms: Vec<String> },
    /// 搜索并替换（会改写文件）
    SearchReplace { root: String, rules: ReplaceRules },
    /// 硬编码 / 宏变量误用审计
    Hardcoding { root: String },
}

impl RunMode {
    /// 用于报告文件名的短标识
    pub fn slug(&self) -> &'static str {
        match self {
            RunMode::MacroUsage { .. } => "macro_usage_check",
            RunMode::TermSearch { .. } => "search_for_terms",
            RunMode::SearchReplace { .. } => "search_and_replace_terms",
            RunMode::Hardcoding { .. } => "hardcoding_audit",
        }
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub findings: usize,
    pub files_rewritten: usize,
}
