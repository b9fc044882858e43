//! 性能基准测试模块
//!
//! 用合成目录测试对账、PO编码/解码和视图重算的耗时

use std::time::Instant;

use crate::codec::po_file::{decode, encode, EncodeOptions};
use crate::model::catalog::{Catalog, CatalogMetadata};
use crate::model::reconcile::{reconcile, ReconcileOptions};
use crate::model::unit::Unit;
use crate::vm::view::{CatalogView, SortColumn, SortOrder, ViewFilter};

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

const WORDS: [&str; 12] = [
    "Hero", "died", "Round", "starts", "Press", "[Interact]", "to", "capture", "the", "point",
    "{0}", "seconds",
];

/// 生成合成目录：每个单元由若干词拼成，部分已翻译、部分已审校
pub fn generate_catalog(size: usize) -> Catalog {
    let mut metadata = CatalogMetadata::default();
    metadata.set("Project-Id-Version", "Benchmark 1.0");
    metadata.set("Language", "zh");

    let units = (0..size)
        .map(|i| {
            let words: Vec<&str> = (0..4 + i % 5).map(|k| WORDS[(i * 7 + k * 3) % WORDS.len()]).collect();
            let line = i as u32 + 1;
            let mut unit = Unit::new(format!("{} #{}", words.join(" "), i), line)
                .with_occurrence("bench.ow", line);
            if i % 3 != 0 {
                unit.translation = format!("译文 {}", i);
            }
            if i % 7 == 0 {
                unit.set_reviewed(true);
            }
            if i % 11 == 0 {
                unit.comment = "基准注释".to_string();
            }
            unit
        })
        .collect();
    Catalog::new(metadata, units)
}

/// 模拟一次重新提取：部分原文改动、部分删除、末尾追加新条目
pub fn mutate_extraction(catalog: &Catalog) -> Vec<Unit> {
    let mut extracted: Vec<Unit> = catalog
        .units
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 10 != 9)
        .map(|(i, u)| {
            let original = if i % 4 == 0 {
                format!("{}!", u.original)
            } else {
                u.original.clone()
            };
            Unit::new(original, u.line_num)
        })
        .collect();
    let base = catalog.len() as u32;
    for k in 0..catalog.len() / 20 {
        extracted.push(Unit::new(format!("Brand new line {}", k), base + k as u32 + 1));
    }
    extracted
}

/// 测试对账性能
pub fn benchmark_reconcile(old: &Catalog, extracted: &[Unit]) -> PerformanceResult {
    let start = Instant::now();
    let result = reconcile(old, extracted, &ReconcileOptions::default());
    let duration = start.elapsed();

    match result {
        Ok(r) => PerformanceResult::new("对账", duration.as_millis(), true, &r.report.summary()),
        Err(e) => PerformanceResult::new("对账", duration.as_millis(), false, &format!("对账失败: {}", e)),
    }
}

/// 测试PO编码性能，成功时一并返回文本
pub fn benchmark_encode(catalog: &Catalog) -> (PerformanceResult, Option<String>) {
    let start = Instant::now();
    let result = encode(catalog, &EncodeOptions::default());
    let duration = start.elapsed();

    match result {
        Ok(text) => (
            PerformanceResult::new(
                "PO编码",
                duration.as_millis(),
                true,
                &format!("生成了 {} 字节", text.len()),
            ),
            Some(text),
        ),
        Err(e) => (
            PerformanceResult::new("PO编码", duration.as_millis(), false, &format!("编码失败: {}", e)),
            None,
        ),
    }
}

/// 测试PO解析性能
pub fn benchmark_decode(text: &str) -> PerformanceResult {
    let start = Instant::now();
    let result = decode(text);
    let duration = start.elapsed();

    match result {
        Ok(decoded) => PerformanceResult::new(
            "PO解析",
            duration.as_millis(),
            true,
            &format!("解析了 {} 条", decoded.catalog.len()),
        ),
        Err(e) => PerformanceResult::new("PO解析", duration.as_millis(), false, &format!("解析失败: {}", e)),
    }
}

/// 测试按状态排序的视图重算
pub fn benchmark_view_refresh(catalog: &Catalog) -> PerformanceResult {
    let start = Instant::now();
    let mut view = CatalogView::new(ViewFilter::default(), SortColumn::Status, SortOrder::Ascending);
    view.refresh(catalog);
    let duration = start.elapsed();

    PerformanceResult::new(
        "视图重算",
        duration.as_millis(),
        view.len() == catalog.len(),
        &format!("{} 行可见", view.len()),
    )
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    for size in [100usize, 500, 2000] {
        tracing::info!("测试规模：{} 条", size);

        let start = Instant::now();
        let catalog = generate_catalog(size);
        let extracted = mutate_extraction(&catalog);
        results.push(PerformanceResult::new(
            &format!("数据生成({})", size),
            start.elapsed().as_millis(),
            true,
            &format!("目录 {} 条，新提取 {} 条", catalog.len(), extracted.len()),
        ));

        results.push(benchmark_reconcile(&catalog, &extracted));
        let (encode_result, text) = benchmark_encode(&catalog);
        results.push(encode_result);
        if let Some(text) = text {
            results.push(benchmark_decode(&text));
        }
        results.push(benchmark_view_refresh(&catalog));
    }

    results
}
