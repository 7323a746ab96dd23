//! 检测器集合
//!
//! 每个检测器是一条不可变记录 (id, 描述, 严重级别, 匹配方式)。
//! 所有检测器对每一行独立求值，一行命中多个检测器就产出多条 Finding。
use regex::Regex;
use std::fmt;
use std::path::Path;

use crate::errors::{ClinsageError, Result};
use crate::rules::{load_rule_specs, RuleSpec};
use crate::types::Severity;

/// 内置正则规则：(id, 描述, 模式, 严重级别)
const BUILTIN_PATTERNS: &[(&str, &str, &str, Severity)] = &[
    (
        "conditional_literal",
        "Hardcoded value in condition",
        r#"(?i)\b(where|if|when)\b\s+.*?=\s*['"0-9]"#,
        Severity::High,
    ),
    (
        "dataset_literal",
        "Hardcoded dataset or literal in SET/MERGE",
        r#"(?i)\b(set|merge)\b\s+[^;]*['"0-9]"#,
        Severity::High,
    ),
    (
        "put_literal",
        "Hardcoded value in PUT statement",
        r#"(?i)\bput\s+['"0-9]"#,
        Severity::High,
    ),
    (
        "string_literal",
        "Constant string literal",
        r#"['"][A-Za-z0-9 _/-]{2,}['"]"#,
        Severity::Medium,
    ),
    ("literal_date", "Hardcoded date", r"\d{4}-\d{2}-\d{2}", Severity::High),
    (
        "select_literal",
        "Hardcoded SELECT clause",
        r#"(?i)\bselect\b\s+[^;]*['"0-9]"#,
        Severity::High,
    ),
];

/// 常被参数化的领域词
const DOMAIN_TERMS: &str = r"(?i)\b(study|site|visit|dose|group|arm|treatment)\b";
/// 宏变量引用
const MACRO_VAR_REF: &str = r"&\w+";

type LinePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// 匹配方式：正则或自定义谓词
pub enum DetectorKind {
    Pattern(Regex),
    Predicate(LinePredicate),
}

impl fmt::Debug for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::Pattern(rx) => f.debug_tuple("Pattern").field(&rx.as_str()).finish(),
            DetectorKind::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Debug)]
pub struct Detector {
    pub id: String,
    pub description: String,
    pub severity: Severity,
    pub kind: DetectorKind,
}

impl Detector {
    pub fn is_match(&self, line: &str) -> bool {
        match &self.kind {
            DetectorKind::Pattern(rx) => rx.is_match(line),
            DetectorKind::Predicate(pred) => pred(line),
        }
    }
}

/// 有序检测器集合
#[derive(Debug, Default)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
}

impl DetectorRegistry {
    /// 内置硬编码 / 宏变量误用检测器
    pub fn builtin() -> Result<Self> {
        let specs: Vec<RuleSpec> = BUILTIN_PATTERNS
            .iter()
            .map(|(id, desc, pat, severity)| RuleSpec {
                id: (*id).to_string(),
                description: (*desc).to_string(),
                pat: (*pat).to_string(),
                severity: *severity,
            })
            .collect();
        let mut set = Self::from_specs(&specs)?;
        set.detectors.push(macro_variable_misuse()?);
        Ok(set)
    }

    /// 内置检测器 + 可选规则文件（追加在后）
    pub fn with_rule_file(path: Option<&Path>) -> Result<Self> {
        let mut set = Self::builtin()?;
        if let Some(path) = path {
            let specs = load_rule_specs(path)?;
            set.extend(Self::from_specs(&specs)?);
        }
        Ok(set)
    }

    /// 从规则条目构建检测器集合；任何一条编译失败即报错
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self> {
        let mut detectors = Vec::with_capacity(specs.len());
        for r in specs {
            let rx = Regex::new(&r.pat).map_err(|e| ClinsageError::InvalidPattern(r.id.clone(), e))?;
            detectors.push(Detector {
                id: r.id.clone(),
                description: r.description.clone(),
                severity: r.severity,
                kind: DetectorKind::Pattern(rx),
            });
        }
        Ok(Self { detectors })
    }

    pub fn extend(&mut self, other: DetectorRegistry) {
        self.detectors.extend(other.detectors);
    }

    /// 依定义顺序返回命中该行的检测器
    pub fn detect<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a Detector> + 'a {
        self.detectors.iter().filter(move |d| d.is_match(line))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

/// 行内出现未带 `&` 前缀的领域词，且整行没有任何宏变量引用
fn macro_variable_misuse() -> Result<Detector> {
    let id = "macro_variable_misuse";
    let terms = Regex::new(DOMAIN_TERMS).map_err(|e| ClinsageError::InvalidPattern(id.to_string(), e))?;
    let reference = Regex::new(MACRO_VAR_REF).map_err(|e| ClinsageError::InvalidPattern(id.to_string(), e))?;
    let pred = move |line: &str| {
        let bare = terms
            .find_iter(line)
            .any(|m| !line[..m.start()].ends_with('&'));
        bare && !reference.is_match(line)
    };
    Ok(Detector {
        id: id.to_string(),
        description: "Possible macro variable misuse".to_string(),
        severity: Severity::Low,
        kind: DetectorKind::Predicate(Box::new(pred)),
    })
}
