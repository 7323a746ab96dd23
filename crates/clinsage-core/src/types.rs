//! 公共类型（对外暴露）
use serde::{Deserialize, Serialize};
use std::fmt;

/// 严重级别：按检测器静态指定，不从内容计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 宏使用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MacroStatus {
    Used,
    NotUsed,
}

impl MacroStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MacroStatus::Used => "Used",
            MacroStatus::NotUsed => "Not Used",
        }
    }
}

/// 一次运行的结果信号（提供给前端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoMatches,
}
