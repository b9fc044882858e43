//! VM桥接层：把目录、视图和对账结果整理成命令行输出的文本

use crate::model::catalog::CatalogStats;
use crate::model::quality::assess;
use crate::model::reconcile::DiffReport;
use crate::model::unit::Unit;

// === 常量定义（消除魔法值） ===
pub const STATUS_LOADED: &str = "文件加载完成";
pub const STATUS_SAVED: &str = "保存成功";
pub const STATUS_TEMPLATE_WRITTEN: &str = "模板已生成";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 列表中单元的状态标签
pub fn status_label(unit: &Unit) -> &'static str {
    if unit.is_ignored() {
        "忽略"
    } else if unit.is_reviewed() {
        "已审"
    } else if unit.is_fuzzy() {
        "模糊"
    } else if !unit.is_translated() {
        "未译"
    } else if assess(unit).has_blocking() {
        "错误"
    } else {
        "已译"
    }
}

/// 单行预览，换行显示为 `⏎`，超过 `max_chars` 截断
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', "⏎");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn format_row(position: usize, unit: &Unit) -> String {
    format!(
        "{:>5}  [{}]  L{:<5} {}  =>  {}",
        position + 1,
        status_label(unit),
        unit.line_num,
        preview(&unit.original, 40),
        preview(&unit.translation, 40)
    )
}

pub fn format_stats(stats: &CatalogStats, language: Option<&str>) -> String {
    format!(
        "语言: {}\n总计: {}\n已翻译: {}\n未翻译: {}\n模糊: {}\n已审校: {}\n已忽略: {}",
        language.unwrap_or("(未设置)"),
        stats.total,
        stats.translated,
        stats.untranslated,
        stats.fuzzy,
        stats.reviewed,
        stats.ignored
    )
}

/// 对账摘要加上每个继承配对的相似度
pub fn format_report(report: &DiffReport) -> String {
    let mut out = report.summary();
    for pair in &report.modified {
        out.push_str(&format!(
            "\n  ~ {:.2}  {}  ->  {}",
            pair.similarity,
            preview(&pair.old.original, 30),
            preview(&pair.new.original, 30)
        ));
    }
    out
}
