//! 词项输入解析
//!
//! - 搜索词：逗号分隔，去首尾空白，丢弃空项。
//! - 替换规则：每行一个 `search:replace`，只按第一个 `:` 切分；
//!   没有分隔符或搜索词为空的行跳过。重复的搜索词保留首次出现的位置、取最后一次的替换值。
use tracing::debug;

use crate::options::ReplaceRules;

pub fn parse_search_terms(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_replace_rules(text: &str) -> ReplaceRules {
    let mut rules = ReplaceRules::new();
    for (idx, line) in text.lines().enumerate() {
        let Some((search, replace)) = line.split_once(':') else {
            if !line.trim().is_empty() {
                debug!(line = idx + 1, "skipping replace rule line without ':'");
            }
            continue;
        };
        let search = search.trim();
        if search.is_empty() {
            debug!(line = idx + 1, "skipping replace rule line with empty search term");
            continue;
        }
        rules.insert(search.to_string(), replace.trim().to_string());
    }
    rules
}
