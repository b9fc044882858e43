//! Catalog：有序的单元集合与文件头元数据

use std::collections::BTreeMap;

use crate::model::unit::Unit;

pub const HEADER_LANGUAGE: &str = "Language";
pub const HEADER_PROJECT_ID_VERSION: &str = "Project-Id-Version";
pub const HEADER_POT_CREATION_DATE: &str = "POT-Creation-Date";
pub const HEADER_PO_REVISION_DATE: &str = "PO-Revision-Date";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const DEFAULT_CONTENT_TRANSFER_ENCODING: &str = "8bit";

/// 文件头中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// `Key: value`，值按读入原样保存，不去空白
    Field { key: String, value: String },
    /// 不符合 `Key: value` 的行，原样写回
    Raw(String),
}

impl HeaderLine {
    /// 在第一个 `": "` 处切分；切不开的整行作为 `Raw`
    pub fn parse(line: &str) -> Self {
        match line.split_once(": ") {
            Some((key, value)) if !key.is_empty() => HeaderLine::Field {
                key: key.to_string(),
                value: value.to_string(),
            },
            _ => HeaderLine::Raw(line.to_string()),
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            HeaderLine::Field { key, value } => format!("{}: {}", key, value),
            HeaderLine::Raw(line) => line.clone(),
        }
    }
}

/// 文件头元数据。行按读入顺序保存，导入→导出保持原样。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMetadata {
    pub lines: Vec<HeaderLine>,
    /// 头条目前的译者注释行
    pub header_comments: Vec<String>,
    /// 头条目的格式标记（如 `fuzzy`）
    pub header_flags: Vec<String>,
}

impl CatalogMetadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            HeaderLine::Field { key: k, value } if k.eq_ignore_ascii_case(key) => Some(value.as_str()),
            _ => None,
        })
    }

    /// 已存在的字段原位更新，否则追加到末尾
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let slot = self.lines.iter_mut().find_map(|line| match line {
            HeaderLine::Field { key: k, value } if k.eq_ignore_ascii_case(key) => Some(value),
            _ => None,
        });
        match slot {
            Some(slot) => *slot = value,
            None => self.lines.push(HeaderLine::Field {
                key: key.to_string(),
                value,
            }),
        }
    }

    /// 字段不存在时才追加，已有的值保持不变
    pub fn set_if_absent(&mut self, key: &str, value: &str) {
        if self.get(key).is_none() {
            self.set(key, value);
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.get(HEADER_LANGUAGE).filter(|l| !l.trim().is_empty())
    }

    pub fn project_id_version(&self) -> Option<&str> {
        self.get(HEADER_PROJECT_ID_VERSION)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.header_comments.is_empty() && self.header_flags.is_empty()
    }
}

/// 状态统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub translated: usize,
    pub untranslated: usize,
    pub fuzzy: usize,
    pub reviewed: usize,
    pub ignored: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    pub units: Vec<Unit>,
    /// 按出现路径缓存的源文件行，供界面显示上下文
    source_context: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new(metadata: CatalogMetadata, units: Vec<Unit>) -> Self {
        Self {
            metadata,
            units,
            source_context: BTreeMap::new(),
        }
    }

    pub fn from_units(units: Vec<Unit>) -> Self {
        Self::new(CatalogMetadata::default(), units)
    }

    /// 生成空模板目录的文件头，字段与常见 xgettext 输出一致
    pub fn template(project: &str, version: &str, creation_date: &str) -> Self {
        let mut metadata = CatalogMetadata::default();
        metadata.set(HEADER_PROJECT_ID_VERSION, format!("{} {}", project, version));
        metadata.set("Report-Msgid-Bugs-To", "");
        metadata.set(HEADER_POT_CREATION_DATE, creation_date);
        metadata.set("MIME-Version", "1.0");
        metadata.set(HEADER_CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        metadata.set(HEADER_CONTENT_TRANSFER_ENCODING, DEFAULT_CONTENT_TRANSFER_ENCODING);
        metadata.set(
            "Generated-By",
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        );
        Self::new(metadata, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn language(&self) -> Option<&str> {
        self.metadata.language()
    }

    pub fn set_language(&mut self, code: &str) {
        self.metadata.set(HEADER_LANGUAGE, code);
    }

    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.units.iter().position(|u| u.id() == id)
    }

    pub fn unit_mut_by_id(&mut self, id: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id() == id)
    }

    /// 删除单元，返回被删除的值
    pub fn remove_by_id(&mut self, id: &str) -> Option<Unit> {
        let index = self.find_by_id(id)?;
        Some(self.units.remove(index))
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for unit in self.units.iter().filter(|u| !u.is_new_entry()) {
            stats.total += 1;
            if unit.is_translated() {
                stats.translated += 1;
            } else {
                stats.untranslated += 1;
            }
            if unit.is_fuzzy() {
                stats.fuzzy += 1;
            }
            if unit.is_reviewed() {
                stats.reviewed += 1;
            }
            if unit.is_ignored() {
                stats.ignored += 1;
            }
        }
        stats
    }

    pub(crate) fn insert_source_context(&mut self, path: String, lines: Vec<String>) {
        self.source_context.insert(path, lines);
    }

    pub(crate) fn has_source_context(&self, path: &str) -> bool {
        self.source_context.contains_key(path)
    }

    /// 取单元第一处出现位置前后 `radius` 行的源文本（行号从1开始）
    pub fn context_lines(&self, index: usize, radius: usize) -> Vec<&str> {
        let Some(unit) = self.units.get(index) else {
            return Vec::new();
        };
        let Some(occurrence) = unit.occurrences.first() else {
            return Vec::new();
        };
        let Some(lines) = self.source_context.get(&occurrence.path) else {
            return Vec::new();
        };
        let line = occurrence.line.unwrap_or(unit.line_num) as usize;
        if line == 0 || line > lines.len() {
            return Vec::new();
        }
        let start = line.saturating_sub(radius + 1);
        let end = (line + radius).min(lines.len());
        lines[start..end].iter().map(String::as_str).collect()
    }
}
