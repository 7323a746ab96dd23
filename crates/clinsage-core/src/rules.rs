//! 规则文件加载（TOML）
use serde::Deserialize;
use std::path::Path;

use crate::errors::{ClinsageError, Result};
use crate::types::Severity;

/// 单条规则的配置（支持 pattern 或 regex 字段）
#[derive(Debug, Clone, Deserialize)]
struct RuleEntry {
    pub id: String,
    #[serde(default, alias = "name")]
    pub description: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub severity: Severity,
}

/// 顶层规则文件结构
#[derive(Debug, Clone, Deserialize)]
struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// 归一化后的规则规格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub id: String,
    pub description: String,
    pub pat: String,
    pub severity: Severity,
}

/// 从 TOML 规则文件加载并归一化为 RuleSpec 列表
pub fn load_rule_specs(path: &Path) -> Result<Vec<RuleSpec>> {
    let txt = std::fs::read_to_string(path)
        .map_err(|source| ClinsageError::RuleFileRead { path: path.to_path_buf(), source })?;
    parse_rule_specs(&txt)
        .map_err(|source| ClinsageError::RuleFileParse { path: path.to_path_buf(), source })
}

pub(crate) fn parse_rule_specs(txt: &str) -> std::result::Result<Vec<RuleSpec>, toml::de::Error> {
    let parsed: RuleFile = toml::from_str(txt)?;
    let mut out = Vec::new();

    for e in parsed.rules {
        // 兼容两种字段名：pattern 或 regex
        let pat = match (e.pattern, e.regex) {
            (Some(p), _) => p,
            (None, Some(r)) => r,
            _ => continue,
        };
        let description = e.description.unwrap_or_else(|| e.id.clone());
        out.push(RuleSpec { id: e.id, description, pat, severity: e.severity });
    }

    Ok(out)
}
