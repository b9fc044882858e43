//! 视图引擎：在目录之上维护过滤、排序后的行索引
//!
//! 只保存指向 `Catalog::units` 的下标，不复制单元。每次目录变更或条件变化后
//! 整体重算；调用方负责在读取前调用 `refresh`。

use std::fmt;
use std::str::FromStr;

use crate::model::catalog::Catalog;
use crate::model::quality::assess;
use crate::model::unit::Unit;

/// 过滤条件，各项之间为"与"关系
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFilter {
    /// 在原文、译文、注释中做不区分大小写的子串搜索
    pub search: String,
    pub show_ignored: bool,
    pub hide_translated: bool,
    pub hide_untranslated: bool,
    pub hide_reviewed: bool,
    /// 编辑模式下"新条目"占位行始终可见并固定在末尾
    pub interchange_edit_mode: bool,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            show_ignored: true,
            hide_translated: false,
            hide_untranslated: false,
            hide_reviewed: false,
            interchange_edit_mode: false,
        }
    }
}

impl ViewFilter {
    pub fn matches(&self, unit: &Unit) -> bool {
        if unit.is_new_entry() {
            return self.interchange_edit_mode;
        }
        if !self.show_ignored && unit.is_ignored() {
            return false;
        }
        // 已忽略单元只受 show_ignored 控制
        let translated = unit.is_translated();
        if self.hide_translated && translated && !unit.is_ignored() {
            return false;
        }
        if self.hide_untranslated && !translated && !unit.is_ignored() {
            return false;
        }
        if self.hide_reviewed && unit.is_reviewed() {
            return false;
        }
        let needle = self.search.trim();
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        [&unit.original, &unit.translation, &unit.comment]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// 目录中的原始顺序
    #[default]
    Index,
    Status,
    Original,
    Translation,
    Comment,
    Reviewed,
    LineNum,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" => Ok(Self::Index),
            "status" => Ok(Self::Status),
            "original" => Ok(Self::Original),
            "translation" => Ok(Self::Translation),
            "comment" => Ok(Self::Comment),
            "reviewed" => Ok(Self::Reviewed),
            "line" | "line_num" | "line-num" => Ok(Self::LineNum),
            other => Err(format!("未知的排序列: {}", other)),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Index => "index",
            Self::Status => "status",
            Self::Original => "original",
            Self::Translation => "translation",
            Self::Comment => "comment",
            Self::Reviewed => "reviewed",
            Self::LineNum => "line",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// 状态权重，越小越靠前：阻断警告 0、未翻译 1、轻微警告 2、已翻译无警告 3、已审校 4、已忽略 5
pub fn status_weight(unit: &Unit) -> u8 {
    if unit.is_ignored() {
        return 5;
    }
    if unit.is_reviewed() {
        return 4;
    }
    let report = assess(unit);
    if report.has_blocking() {
        0
    } else if !unit.is_translated() {
        1
    } else if report.has_minor() {
        2
    } else {
        3
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    filter: ViewFilter,
    column: SortColumn,
    order: SortOrder,
    rows: Vec<usize>,
}

impl CatalogView {
    pub fn new(filter: ViewFilter, column: SortColumn, order: SortOrder) -> Self {
        Self {
            filter,
            column,
            order,
            rows: Vec::new(),
        }
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn sort(&self) -> (SortColumn, SortOrder) {
        (self.column, self.order)
    }

    /// 修改过滤条件；需随后调用 `refresh`
    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.filter = filter;
    }

    /// 修改排序；需随后调用 `refresh`
    pub fn set_sort(&mut self, column: SortColumn, order: SortOrder) {
        self.column = column;
        self.order = order;
    }

    /// 可见行，值为 `Catalog::units` 的下标
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn units<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a Unit> + 'a {
        self.rows.iter().filter_map(move |&i| catalog.units.get(i))
    }

    /// 指定ID的单元在当前视图中的行号
    pub fn position_of_id(&self, catalog: &Catalog, id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|&i| catalog.units.get(i).is_some_and(|u| u.id() == id))
    }

    /// 按当前条件整体重算
    pub fn refresh(&mut self, catalog: &Catalog) {
        let mut placeholder = None;
        let mut keyed: Vec<(usize, SortKey, u32)> = Vec::with_capacity(catalog.units.len());

        for (index, unit) in catalog.units.iter().enumerate() {
            if !self.filter.matches(unit) {
                continue;
            }
            if unit.is_new_entry() {
                placeholder.get_or_insert(index);
                continue;
            }
            keyed.push((index, self.key_of(index, unit), unit.line_num));
        }

        let descending = self.order == SortOrder::Descending;
        let tie_on_line = matches!(self.column, SortColumn::Status | SortColumn::Reviewed);
        keyed.sort_by(|a, b| {
            let primary = if descending { b.1.cmp(&a.1) } else { a.1.cmp(&b.1) };
            if tie_on_line {
                primary.then(a.2.cmp(&b.2))
            } else {
                primary
            }
        });

        self.rows = keyed.into_iter().map(|(index, _, _)| index).collect();
        if let Some(index) = placeholder {
            self.rows.push(index);
        }
        tracing::debug!(
            "视图重算: {}/{} 行可见, 排序 {} {:?}",
            self.rows.len(),
            catalog.units.len(),
            self.column,
            self.order
        );
    }

    fn key_of(&self, index: usize, unit: &Unit) -> SortKey {
        match self.column {
            SortColumn::Index => SortKey::Number(index as u64),
            SortColumn::Status | SortColumn::Reviewed => {
                SortKey::Number(u64::from(status_weight(unit)))
            }
            SortColumn::Original => SortKey::Text(unit.original.to_lowercase()),
            SortColumn::Translation => SortKey::Text(unit.translation.to_lowercase()),
            SortColumn::Comment => SortKey::Text(unit.comment.to_lowercase()),
            SortColumn::LineNum => SortKey::Number(u64::from(unit.line_num)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(original: &str, translation: &str, line: u32) -> Unit {
        let mut u = Unit::new(original, line);
        u.translation = translation.into();
        u
    }

    fn three_units() -> Catalog {
        let mut ignored = unit("Debug only", "", 1);
        ignored.set_ignored(true);
        let mut reviewed = unit("Start", "开始", 2);
        reviewed.set_reviewed(true);
        let plain = unit("Quit", "", 3);
        Catalog::from_units(vec![ignored, reviewed, plain])
    }

    fn visible_originals(view: &CatalogView, catalog: &Catalog) -> Vec<String> {
        view.units(catalog).map(|u| u.original.clone()).collect()
    }

    #[test]
    fn test_hide_ignored_and_status_sort() {
        let catalog = three_units();
        let filter = ViewFilter {
            show_ignored: false,
            ..ViewFilter::default()
        };
        let mut view = CatalogView::new(filter, SortColumn::Status, SortOrder::Ascending);
        view.refresh(&catalog);

        assert_eq!(view.rows(), &[2, 1]);
        assert_eq!(visible_originals(&view, &catalog), vec!["Quit", "Start"]);
    }

    #[test]
    fn test_status_weights() {
        let blocking = unit("Hello {name}", "你好", 1);
        let untranslated = unit("Bye", "", 2);
        let minor = unit("Done.", "完成", 3);
        let clean = unit("Done!", "完成！", 4);

        assert_eq!(status_weight(&blocking), 0);
        assert_eq!(status_weight(&untranslated), 1);
        assert_eq!(status_weight(&minor), 2);
        assert_eq!(status_weight(&clean), 3);
    }

    #[test]
    fn test_status_tie_broken_by_line_num_even_descending() {
        let catalog = Catalog::from_units(vec![
            unit("B", "", 9),
            unit("A", "", 4),
            unit("C", "丙", 1),
        ]);
        let mut view = CatalogView::new(ViewFilter::default(), SortColumn::Status, SortOrder::Ascending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[1, 0, 2]);

        view.set_sort(SortColumn::Status, SortOrder::Descending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[2, 1, 0]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut commented = unit("Exit", "", 1);
        commented.comment = "Main MENU".into();
        let catalog = Catalog::from_units(vec![
            unit("Open menu", "", 2),
            commented,
            unit("Close", "关闭菜单", 3),
        ]);
        let mut view = CatalogView::default();
        view.set_filter(ViewFilter {
            search: "MeNu".into(),
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0, 1]);

        view.set_filter(ViewFilter {
            search: "菜单".into(),
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[2]);
    }

    #[test]
    fn test_toggles_combine() {
        let catalog = three_units();
        let mut view = CatalogView::default();

        view.set_filter(ViewFilter {
            hide_translated: true,
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0, 2]);

        view.set_filter(ViewFilter {
            hide_untranslated: true,
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0, 1], "已忽略的未翻译单元仍可见");

        view.set_filter(ViewFilter {
            hide_reviewed: true,
            show_ignored: false,
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[2]);
    }

    #[test]
    fn test_hide_toggles_leave_ignored_to_show_ignored() {
        let mut debug = unit("Debug", "调试", 1);
        debug.set_ignored(true);
        let catalog = Catalog::from_units(vec![debug, unit("Quit", "", 2)]);
        let mut view = CatalogView::default();

        view.set_filter(ViewFilter {
            hide_translated: true,
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0, 1]);

        view.set_filter(ViewFilter {
            hide_translated: true,
            show_ignored: false,
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[1]);
    }

    #[test]
    fn test_reviewed_column_sorts_by_status_weight() {
        let mut ignored = unit("Hidden", "", 8);
        ignored.set_ignored(true);
        let mut reviewed_late = unit("Done", "完成", 7);
        reviewed_late.set_reviewed(true);
        let mut reviewed_early = unit("Start", "开始", 3);
        reviewed_early.set_reviewed(true);
        let catalog = Catalog::from_units(vec![
            ignored,
            reviewed_late,
            unit("Quit", "", 5),
            reviewed_early,
        ]);

        let mut view = CatalogView::new(ViewFilter::default(), SortColumn::Reviewed, SortOrder::Ascending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[2, 3, 1, 0]);

        view.set_sort(SortColumn::Reviewed, SortOrder::Descending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0, 3, 1, 2]);
    }

    #[test]
    fn test_text_columns_and_stability() {
        let catalog = Catalog::from_units(vec![
            unit("beta", "", 1),
            unit("Alpha", "", 2),
            unit("BETA", "", 3),
        ]);
        let mut view = CatalogView::new(ViewFilter::default(), SortColumn::Original, SortOrder::Ascending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[1, 0, 2]);

        view.set_sort(SortColumn::Original, SortOrder::Descending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0, 2, 1]);

        view.set_sort(SortColumn::LineNum, SortOrder::Descending);
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[2, 1, 0]);
    }

    #[test]
    fn test_placeholder_pinned_last_in_edit_mode() {
        let mut catalog = three_units();
        catalog.units.insert(0, Unit::new_entry_placeholder());

        let mut view = CatalogView::new(ViewFilter::default(), SortColumn::Original, SortOrder::Ascending);
        view.refresh(&catalog);
        assert!(!view.rows().contains(&0), "非编辑模式下占位行不可见");

        view.set_filter(ViewFilter {
            interchange_edit_mode: true,
            search: "no such text".into(),
            show_ignored: false,
            ..ViewFilter::default()
        });
        view.refresh(&catalog);
        assert_eq!(view.rows(), &[0]);

        view.set_filter(ViewFilter {
            interchange_edit_mode: true,
            ..ViewFilter::default()
        });
        view.set_sort(SortColumn::Original, SortOrder::Descending);
        view.refresh(&catalog);
        assert_eq!(view.rows().last(), Some(&0));
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_position_of_id() {
        let catalog = three_units();
        let mut view = CatalogView::new(ViewFilter::default(), SortColumn::LineNum, SortOrder::Descending);
        view.refresh(&catalog);
        let id = catalog.units[0].id().to_string();
        assert_eq!(view.position_of_id(&catalog, &id), Some(2));
        assert_eq!(view.position_of_id(&catalog, "missing"), None);
    }

    #[test]
    fn test_sort_column_from_str() {
        assert_eq!("Status".parse::<SortColumn>(), Ok(SortColumn::Status));
        assert_eq!("line".parse::<SortColumn>(), Ok(SortColumn::LineNum));
        assert!("bogus".parse::<SortColumn>().is_err());
    }
}
