//! 宏使用检查：宏名索引 + 程序文本缓冲
//!
//! 判定规则是"小写拼接文本中是否包含 `%name` 子串"，不看词边界：
//! 出现在更长的 token 或注释里也算 Used。宁可误报 Used，也不误报 Not Used。
use aho_corasick::AhoCorasick;
use indexmap::IndexSet;
use std::path::Path;
use tracing::warn;

use crate::errors::Result;
use crate::findings::{Diagnostic, DiagnosticKind, MacroUsage};
use crate::types::MacroStatus;
use crate::walker::{list_flat, read_text, walk_corpus};

/// 宏调用前缀
pub const MACRO_SIGIL: char = '%';

/// 宏名集合：宏定义目录下每个文件一个宏，名字为小写文件名（去扩展名）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermIndex {
    names: IndexSet<String>,
}

impl TermIndex {
    /// 只读取目录第一层
    pub fn from_dir(macro_dir: &Path, extension: &str) -> Self {
        let names = list_flat(macro_dir, extension)
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_lowercase()))
            .collect();
        Self { names }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { names: names.into_iter().map(|s| s.as_ref().to_lowercase()).collect() }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 对每个宏名判断 `%name` 是否出现在（已小写的）程序缓冲中
    pub fn check_usage(&self, buffer: &ProgramBuffer) -> Result<Vec<MacroUsage>> {
        let needles: Vec<String> = self.names.iter().map(|n| format!("{MACRO_SIGIL}{n}")).collect();
        let ac = AhoCorasick::new(&needles)?;
        let mut used = vec![false; needles.len()];
        // 重叠匹配：%std 与 %std1 需要同时被记录
        for m in ac.find_overlapping_iter(buffer.text()) {
            used[m.pattern().as_usize()] = true;
        }
        Ok(self
            .names
            .iter()
            .zip(used)
            .map(|(name, hit)| MacroUsage {
                name: name.clone(),
                status: if hit { MacroStatus::Used } else { MacroStatus::NotUsed },
            })
            .collect())
    }
}

/// 程序目录下所有文件的小写全文拼接（以换行分隔）
#[derive(Debug, Clone, Default)]
pub struct ProgramBuffer {
    text: String,
    files: usize,
}

impl ProgramBuffer {
    /// 递归读取；读取失败的文件记入诊断并跳过
    pub fn load(
        program_dir: &Path,
        extension: &str,
        max_file_size: Option<u64>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut parts = Vec::new();
        for path in walk_corpus(program_dir, extension, max_file_size) {
            match read_text(&path) {
                Ok(txt) => parts.push(txt.to_lowercase()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read program file");
                    diagnostics.push(Diagnostic::new(&path, DiagnosticKind::Read, e.to_string()));
                }
            }
        }
        let files = parts.len();
        Self { text: parts.join("\n"), files }
    }

    pub fn from_text(text: &str) -> Self {
        Self { text: text.to_lowercase(), files: 1 }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn files(&self) -> usize {
        self.files
    }
}
