//! 译文质量检查：按需从原文/译文推导，不落盘

use std::collections::BTreeSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::unit::Unit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityWarning {
    /// 原文与译文的占位符集合不一致
    PlaceholderMismatch {
        missing: BTreeSet<String>,
        extra: BTreeSet<String>,
    },
    /// 换行数量不一致
    LineCountMismatch { original: usize, translation: usize },
    /// 首尾空白不一致
    EdgeWhitespaceMismatch,
    /// 结尾标点不一致
    TrailingPunctuationMismatch,
}

impl QualityWarning {
    /// 阻断级警告在排序中优先于未翻译条目
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            QualityWarning::PlaceholderMismatch { .. } | QualityWarning::LineCountMismatch { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityReport {
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    pub fn has_blocking(&self) -> bool {
        self.warnings.iter().any(QualityWarning::is_blocking)
    }

    pub fn has_minor(&self) -> bool {
        self.warnings.iter().any(|w| !w.is_blocking())
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(\d+\$)?0?\d*[sdif]|\{[^{}\s]+\}|\[[^\[\]\s]+\]").expect("valid placeholder regex")
});

/// 提取占位符：`{name}`、`{0}`、`%s`/`%d`/`%1$s`、`[Token]`
pub fn extract_placeholders(s: &str) -> BTreeSet<String> {
    PLACEHOLDER_RE
        .find_iter(s)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 对单元做全部检查；译文为空时不检查
pub fn assess(unit: &Unit) -> QualityReport {
    let mut report = QualityReport::default();
    if !unit.is_translated() {
        return report;
    }
    let original = unit.original.as_str();
    let translation = unit.translation.as_str();

    let source_ph = extract_placeholders(original);
    let target_ph = extract_placeholders(translation);
    if source_ph != target_ph {
        report.warnings.push(QualityWarning::PlaceholderMismatch {
            missing: source_ph.difference(&target_ph).cloned().collect(),
            extra: target_ph.difference(&source_ph).cloned().collect(),
        });
    }

    let original_lines = original.matches('\n').count();
    let translation_lines = translation.matches('\n').count();
    if original_lines != translation_lines {
        report.warnings.push(QualityWarning::LineCountMismatch {
            original: original_lines,
            translation: translation_lines,
        });
    }

    if edge_whitespace(original) != edge_whitespace(translation) {
        report.warnings.push(QualityWarning::EdgeWhitespaceMismatch);
    }

    if trailing_punctuation_class(original) != trailing_punctuation_class(translation) {
        report.warnings.push(QualityWarning::TrailingPunctuationMismatch);
    }

    report
}

fn edge_whitespace(s: &str) -> (bool, bool) {
    let leading = s.chars().next().is_some_and(char::is_whitespace);
    let trailing = s.chars().last().is_some_and(char::is_whitespace);
    (leading, trailing)
}

/// 把中英文标点归为同一类，避免 "." 与 "。" 被误报
fn trailing_punctuation_class(s: &str) -> Option<char> {
    match s.trim_end().chars().last()? {
        '.' | '。' | '．' => Some('.'),
        '!' | '！' => Some('!'),
        '?' | '？' => Some('?'),
        ':' | '：' => Some(':'),
        _ => None,
    }
}
