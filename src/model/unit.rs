//! Unit：单条可本地化文本及其翻译/审校状态

use std::fmt;

use uuid::Uuid;

/// 界面中"正在新建、尚未提交"的占位行使用的ID，永远不会被保存
pub const NEW_ENTRY_ID: &str = "##NEW_ENTRY##";

/// 源文件中的一次出现位置（`path:line`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub path: String,
    /// 行号缺省时只写路径
    pub line: Option<u32>,
}

impl Occurrence {
    pub fn new(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
        }
    }

    /// 解析 `#:` 注释中的单个引用。
    ///
    /// 最后一个 `:` 之后全为数字时视为行号；否则整体作为路径。空串返回 `None`。
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if let Some((path, line)) = token.rsplit_once(':') {
            if !path.is_empty() && !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()) {
                let line = line.parse::<u32>().ok()?;
                return Some(Self {
                    path: path.to_string(),
                    line: Some(line),
                });
            }
            if line.is_empty() {
                // "path:" 这种残缺引用不可信
                return None;
            }
        }
        Some(Self {
            path: token.to_string(),
            line: None,
        })
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.path, line),
            None => write!(f, "{}", self.path),
        }
    }
}

/// 一条翻译单元。
///
/// `id` 在创建时生成一次，之后不随内容变化。三个状态只能通过 setter 修改：
/// 置为审校/忽略会清除 `is_fuzzy`。对账继承的单元例外，可以同时带审校与 fuzzy，
/// 导出时审校优先。
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    id: String,
    pub original: String,
    pub translation: String,
    pub comment: String,
    is_reviewed: bool,
    is_ignored: bool,
    is_fuzzy: bool,
    pub occurrences: Vec<Occurrence>,
    pub line_num: u32,
    pub msgctxt: Option<String>,
    /// 除 `fuzzy` 外的格式标记（如 `c-format`）
    pub flags: Vec<String>,
    pub developer_comment_lines: Vec<String>,
    /// 上一次修改前的原文（只保留一级）
    pub previous_original: Option<String>,
}

impl Unit {
    /// 新建一条默认状态的单元，生成新的ID
    pub fn new(original: impl Into<String>, line_num: u32) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), original, line_num)
    }

    /// 使用给定ID构建（恢复已有数据时使用）
    pub fn with_id(id: impl Into<String>, original: impl Into<String>, line_num: u32) -> Self {
        Self {
            id: id.into(),
            original: original.into(),
            translation: String::new(),
            comment: String::new(),
            is_reviewed: false,
            is_ignored: false,
            is_fuzzy: false,
            occurrences: Vec::new(),
            line_num,
            msgctxt: None,
            flags: Vec::new(),
            developer_comment_lines: Vec::new(),
            previous_original: None,
        }
    }

    /// 界面新建行的占位单元
    pub fn new_entry_placeholder() -> Self {
        Self::with_id(NEW_ENTRY_ID, "", 0)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new_entry(&self) -> bool {
        self.id == NEW_ENTRY_ID
    }

    pub fn is_reviewed(&self) -> bool {
        self.is_reviewed
    }

    pub fn is_ignored(&self) -> bool {
        self.is_ignored
    }

    pub fn is_fuzzy(&self) -> bool {
        self.is_fuzzy
    }

    pub fn is_translated(&self) -> bool {
        !self.translation.trim().is_empty()
    }

    /// 标记为已审校；置真时清除 fuzzy
    pub fn set_reviewed(&mut self, reviewed: bool) {
        self.is_reviewed = reviewed;
        if reviewed {
            self.is_fuzzy = false;
        }
    }

    /// 标记为忽略；置真时清除 fuzzy
    pub fn set_ignored(&mut self, ignored: bool) {
        self.is_ignored = ignored;
        if ignored {
            self.is_fuzzy = false;
        }
    }

    /// 已审校或已忽略的单元不接受 fuzzy
    pub fn set_fuzzy(&mut self, fuzzy: bool) {
        self.is_fuzzy = fuzzy && !self.is_reviewed && !self.is_ignored;
    }

    /// 对账时原文已改动、译文被继承：无论审校与否都标为待确认
    pub(crate) fn mark_carried_over(&mut self) {
        self.is_fuzzy = true;
    }

    pub fn with_occurrence(mut self, path: impl Into<String>, line: u32) -> Self {
        self.occurrences.push(Occurrence::new(path, line));
        self
    }

    /// 把旧单元的用户状态（ID、译文、注释、审校、忽略）搬到本单元上。
    /// 位置信息与原文保持本单元的值。
    pub(crate) fn inherit_state(&mut self, old: &Unit) {
        self.id = old.id.clone();
        self.translation = old.translation.clone();
        self.comment = old.comment.clone();
        self.is_reviewed = old.is_reviewed;
        self.is_ignored = old.is_ignored;
        self.is_fuzzy = old.is_fuzzy;
    }

    /// 除 `id` 以外逐字段相等（ID不写入交换文件）
    pub fn same_content(&self, other: &Unit) -> bool {
        self.original == other.original
            && self.translation == other.translation
            && self.comment == other.comment
            && self.is_reviewed == other.is_reviewed
            && self.is_ignored == other.is_ignored
            && self.is_fuzzy == other.is_fuzzy
            && self.occurrences == other.occurrences
            && self.line_num == other.line_num
            && self.msgctxt == other.msgctxt
            && self.flags == other.flags
            && self.developer_comment_lines == other.developer_comment_lines
            && self.previous_original == other.previous_original
    }
}
