//! 重新提取后的新旧单元对账：按相似度继承译文、注释与审校状态

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::model::catalog::Catalog;
use crate::model::data_core::AppError;
use crate::model::similarity::{similarity, whitespace_equal};
use crate::model::unit::Unit;

pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// 对账参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// 相似度不低于此值的配对才会被接受
    pub threshold: f64,
    /// 被删除的旧单元是否追加保留在合并结果末尾
    pub retain_removed: bool,
    /// 折叠空白后完全相同的配对按"未变"处理（不标 fuzzy）
    pub whitespace_equal_is_unchanged: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            retain_removed: false,
            whitespace_equal_is_unchanged: true,
        }
    }
}

/// 一对被继承的新旧单元
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedPair {
    pub old: Unit,
    /// 已继承旧状态的新单元
    pub new: Unit,
    pub similarity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffReport {
    pub added: Vec<Unit>,
    pub removed: Vec<Unit>,
    pub modified: Vec<ModifiedPair>,
    pub unchanged: Vec<Unit>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "新增 {} 条，删除 {} 条，修改/继承 {} 条，未变 {} 条",
            self.added.len(),
            self.removed.len(),
            self.modified.len(),
            self.unchanged.len()
        )
    }
}

/// 对账结果：合并后的目录与差异报告
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub merged: Catalog,
    pub report: DiffReport,
}

/// 新旧单元的最终归类，按新提取顺序排列
enum Slot {
    Unchanged(usize),
    Modified(usize, f64),
    Added,
}

struct Candidate {
    old: usize,
    new: usize,
    score: f64,
}

/// 对账入口。
///
/// `old` 是当前目录，`extracted` 是提取器刚给出的单元（默认状态）。
/// 合并目录沿用旧目录的文件头。任一输入单元缺少ID即返回 `ContractViolation`，
/// 不产生任何部分结果。
pub fn reconcile(
    old: &Catalog,
    extracted: &[Unit],
    options: &ReconcileOptions,
) -> Result<Reconciliation, AppError> {
    validate_ids(&old.units, "旧目录")?;
    validate_ids(extracted, "新提取结果")?;

    let old_units: Vec<&Unit> = old.units.iter().filter(|u| !u.is_new_entry()).collect();
    let new_units: Vec<&Unit> = extracted.iter().filter(|u| !u.is_new_entry()).collect();

    let mut old_claimed = vec![false; old_units.len()];
    let mut slots: Vec<Option<Slot>> = (0..new_units.len()).map(|_| None).collect();

    // 1. 原文完全相同：同一原文的多个旧单元按顺序依次认领
    let mut by_original: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (i, unit) in old_units.iter().enumerate() {
        by_original
            .entry(unit.original.as_str())
            .or_default()
            .push_back(i);
    }
    for (j, unit) in new_units.iter().enumerate() {
        if let Some(i) = by_original
            .get_mut(unit.original.as_str())
            .and_then(VecDeque::pop_front)
        {
            old_claimed[i] = true;
            slots[j] = Some(Slot::Unchanged(i));
        }
    }

    // 2-3. 剩余两池全配对打分，全局取最高分贪心配对
    let mut candidates = Vec::new();
    for (i, old_unit) in old_units.iter().enumerate() {
        if old_claimed[i] {
            continue;
        }
        for (j, new_unit) in new_units.iter().enumerate() {
            if slots[j].is_some() {
                continue;
            }
            let score = similarity(&old_unit.original, &new_unit.original);
            if score >= options.threshold {
                candidates.push(Candidate {
                    old: i,
                    new: j,
                    score,
                });
            }
        }
    }
    candidates.sort_by(|a, b| compare_candidates(a, b, &old_units));

    for candidate in candidates {
        if old_claimed[candidate.old] || slots[candidate.new].is_some() {
            continue;
        }
        old_claimed[candidate.old] = true;
        let old_unit = old_units[candidate.old];
        let new_unit = new_units[candidate.new];
        slots[candidate.new] = if options.whitespace_equal_is_unchanged
            && whitespace_equal(&old_unit.original, &new_unit.original)
        {
            Some(Slot::Unchanged(candidate.old))
        } else {
            Some(Slot::Modified(candidate.old, candidate.score))
        };
    }

    // 4-6. 按新提取顺序组装
    let mut report = DiffReport::default();
    let mut merged_units = Vec::with_capacity(new_units.len());
    for (j, slot) in slots.into_iter().enumerate() {
        let mut unit = new_units[j].clone();
        match slot.unwrap_or(Slot::Added) {
            Slot::Unchanged(i) => {
                let old_unit = old_units[i];
                unit.inherit_state(old_unit);
                carry_history(&mut unit, old_unit);
                report.unchanged.push(unit.clone());
            }
            Slot::Modified(i, score) => {
                let old_unit = old_units[i];
                unit.inherit_state(old_unit);
                unit.previous_original = Some(old_unit.original.clone());
                unit.mark_carried_over();
                report.modified.push(ModifiedPair {
                    old: old_unit.clone(),
                    new: unit.clone(),
                    similarity: score,
                });
            }
            Slot::Added => {
                report.added.push(unit.clone());
            }
        }
        merged_units.push(unit);
    }

    for (i, claimed) in old_claimed.into_iter().enumerate() {
        if !claimed {
            report.removed.push(old_units[i].clone());
        }
    }
    if options.retain_removed {
        merged_units.extend(report.removed.iter().cloned());
    }

    tracing::info!("对账完成: {}", report.summary());

    Ok(Reconciliation {
        merged: Catalog::new(old.metadata.clone(), merged_units),
        report,
    })
}

/// 分数降序；同分时旧单元行号小者优先，再按旧ID、新提取顺序
fn compare_candidates(a: &Candidate, b: &Candidate, old_units: &[&Unit]) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| old_units[a.old].line_num.cmp(&old_units[b.old].line_num))
        .then_with(|| old_units[a.old].id().cmp(old_units[b.old].id()))
        .then_with(|| a.new.cmp(&b.new))
}

/// 未变单元保留旧单元的历史与开发者注释（新提取结果里没有这些字段时）
fn carry_history(unit: &mut Unit, old: &Unit) {
    if unit.previous_original.is_none() {
        unit.previous_original = old.previous_original.clone();
    }
    if unit.developer_comment_lines.is_empty() {
        unit.developer_comment_lines = old.developer_comment_lines.clone();
    }
    if unit.flags.is_empty() {
        unit.flags = old.flags.clone();
    }
    if unit.msgctxt.is_none() {
        unit.msgctxt = old.msgctxt.clone();
    }
}

fn validate_ids(units: &[Unit], side: &str) -> Result<(), AppError> {
    match units.iter().position(|u| u.id().trim().is_empty()) {
        Some(index) => Err(AppError::ContractViolation(format!(
            "{}第 {} 条单元缺少ID",
            side, index
        ))),
        None => Ok(()),
    }
}
