//! IO helper: 文本读取、原子写入、项目根目录查找

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::data_core::AppError;

/// 读取UTF-8文本文件；非UTF-8内容视为格式错误
pub fn read_text_file(p: &Path) -> Result<String, AppError> {
    let bytes = fs::read(p)?;
    String::from_utf8(bytes).map_err(|e| {
        AppError::format(0, format!("{} 不是有效的UTF-8: {}", p.display(), e))
    })
}

/// 读取源文件的全部行，非法UTF-8字节替换为占位符
pub fn read_source_lines(p: &Path) -> Result<Vec<String>, AppError> {
    let bytes = fs::read(p)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

/// 先写入同目录下的临时文件，再整体替换目标文件。
/// 任何一步失败，目标文件都保持原样。
pub fn write_atomic(p: &Path, content: &str) -> Result<(), AppError> {
    let dir = match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(p).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

/// 从文件所在目录向上查找，返回第一个直接包含 `marker` 子目录的目录
pub fn find_project_root(file: &Path, marker: &str) -> Option<PathBuf> {
    let start = file.parent()?;
    let start = if start.as_os_str().is_empty() {
        Path::new(".")
    } else {
        start
    };
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
