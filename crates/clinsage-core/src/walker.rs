//! 语料遍历与宽松解码
//!
//! - 递归遍历根目录，按文件名排序，保证同一次运行内顺序确定。
//! - 扩展名比较忽略大小写。
//! - 跟随符号链接；链接成环或悬空链接当作不可读条目跳过。
//! - 根目录本身无法列出时告警；更深层无法列出的目录直接跳过。
//! - 无法读取的文件由调用方转为诊断信息。
//! - 解码时丢弃非法 UTF-8 字节，损坏文件仍可产出部分结果。
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 遍历 `root` 下所有扩展名为 `extension` 的文件（惰性）
pub fn walk_corpus<'a>(
    root: &'a Path,
    extension: &'a str,
    max_file_size: Option<u64>,
) -> impl Iterator<Item = PathBuf> + 'a {
    walk(root, extension, max_file_size, None)
}

/// 只列出目录第一层的文件（宏定义目录）
pub fn list_flat<'a>(dir: &'a Path, extension: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    walk(dir, extension, None, Some(1))
}

fn walk<'a>(
    root: &'a Path,
    extension: &'a str,
    max_file_size: Option<u64>,
    max_depth: Option<usize>,
) -> impl Iterator<Item = PathBuf> + 'a {
    let mut walker = WalkDir::new(root).min_depth(1).follow_links(true).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }
    walker
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) => Some(e),
            Err(err) if is_root_error(&err) => {
                warn!(root = %root.display(), error = %err, "cannot list root directory");
                None
            }
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(move |e| has_extension(e.path(), extension))
        .filter(move |e| match max_file_size {
            Some(max) => match e.metadata() {
                Ok(md) if md.len() > max => {
                    debug!(path = %e.path().display(), size = md.len(), "skipping oversized file");
                    false
                }
                _ => true,
            },
            None => true,
        })
        .map(walkdir::DirEntry::into_path)
}

fn is_root_error(err: &walkdir::Error) -> bool {
    err.depth() == 0
}

/// 扩展名精确匹配（忽略大小写，允许传入 ".sas" 或 "sas"）
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let want = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(want))
        .unwrap_or(false)
}

/// 读取文件并宽松解码
pub fn read_text(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_lossy(&bytes))
}

/// UTF-8 解码，非法字节直接丢弃（不替换为 U+FFFD）
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// 按行切分文本，保留行尾换行符
pub(crate) fn split_lines_inclusive(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    bytes.split_inclusive(|&b| b == b'\n')
}
