//! 错误类型（对外暴露）
//!
//! 只有"整次运行无法继续"的情况才会成为错误；单个文件的读写失败
//! 走 `Diagnostic`，不会中断扫描。
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinsageError {
    /// 必填参数缺失（例如根目录为空字符串）
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("failed to read rule file {path}: {source}")]
    RuleFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule file {path}: {source}")]
    RuleFileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 规则 id 与正则编译错误
    #[error("invalid pattern in rule '{0}': {1}")]
    InvalidPattern(String, regex::Error),

    #[error("failed to build macro index: {0}")]
    MacroIndex(#[from] aho_corasick::BuildError),

    #[error("failed to export report to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = ClinsageError> = std::result::Result<T, E>;
