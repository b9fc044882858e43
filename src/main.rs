//! 程序入口：解析命令行、初始化日志，分派到各子命令

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use po_fanyi::config::{Settings, SETTINGS_FILE_NAME};
use po_fanyi::model::data_core::revision_timestamp;
use po_fanyi::model::performance::run_performance_suite;
use po_fanyi::vm::bridge::*;
use po_fanyi::{load, AppState, Catalog, SortColumn, SortOrder, Unit, ViewFilter};

#[derive(Parser)]
#[command(name = "po_fanyi")]
#[command(about = "PO 翻译目录工具：查看、筛选、对账合并")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, default_value = SETTINGS_FILE_NAME)]
    config: PathBuf,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 只输出警告和错误
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 统计各状态的单元数量
    Stats { file: PathBuf },

    /// 按过滤与排序条件列出单元
    List(ListArgs),

    /// 用新提取的模板对账旧目录，写出合并结果
    Reconcile(ReconcileArgs),

    /// 生成空模板
    Template(TemplateArgs),

    /// 运行合成数据性能测试
    Bench,
}

#[derive(Args)]
struct ListArgs {
    file: PathBuf,
    /// 在原文、译文、注释中搜索（不区分大小写）
    #[arg(long, default_value = "")]
    search: String,
    /// 排序列: index, status, original, translation, comment, reviewed, line
    #[arg(long, default_value = "index")]
    sort: SortColumn,
    #[arg(long)]
    desc: bool,
    #[arg(long)]
    hide_ignored: bool,
    #[arg(long)]
    hide_translated: bool,
    #[arg(long)]
    hide_untranslated: bool,
    #[arg(long)]
    hide_reviewed: bool,
}

#[derive(Args)]
struct ReconcileArgs {
    /// 现有译文目录
    old: PathBuf,
    /// 新提取的模板
    new: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
    /// 覆盖配置中的相似度阈值
    #[arg(long)]
    threshold: Option<f64>,
    /// 把被删除的单元保留在结果末尾
    #[arg(long)]
    retain_removed: bool,
}

#[derive(Args)]
struct TemplateArgs {
    output: PathBuf,
    #[arg(long)]
    project: String,
    #[arg(long = "version", id = "project_version")]
    project_version: String,
    /// 从已有目录复制原文（不含译文与状态）
    #[arg(long)]
    from: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志输出
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("无法读取配置 {}", cli.config.display()))?;

    let result = match cli.command {
        Commands::Stats { file } => run_stats(settings, &file),
        Commands::List(args) => run_list(settings, args),
        Commands::Reconcile(args) => run_reconcile(settings, args),
        Commands::Template(args) => run_template(settings, args),
        Commands::Bench => run_bench(),
    };
    if let Err(e) = &result {
        tracing::error!("{}{:#}", STATUS_ERROR_PREFIX, e);
    }
    result
}

fn open_state(settings: Settings, file: &Path) -> Result<AppState> {
    let mut state = AppState::with_settings(settings);
    state
        .load_file(file)
        .with_context(|| format!("无法加载 {}", file.display()))?;
    tracing::info!("{}: {}", STATUS_LOADED, file.display());
    Ok(state)
}

fn run_stats(settings: Settings, file: &Path) -> Result<()> {
    let state = open_state(settings, file)?;
    let catalog = state.catalog()?;
    println!("{}", format_stats(&catalog.stats(), catalog.language()));
    Ok(())
}

fn run_list(settings: Settings, args: ListArgs) -> Result<()> {
    let mut state = open_state(settings, &args.file)?;
    state.apply_filter(ViewFilter {
        search: args.search,
        show_ignored: !args.hide_ignored,
        hide_translated: args.hide_translated,
        hide_untranslated: args.hide_untranslated,
        hide_reviewed: args.hide_reviewed,
        interchange_edit_mode: false,
    });
    let order = if args.desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    state.apply_sort(args.sort, order);

    for (position, unit) in state.visible_units().into_iter().enumerate() {
        println!("{}", format_row(position, unit));
    }
    println!("共 {} 条", state.view.len());
    Ok(())
}

fn run_reconcile(mut settings: Settings, args: ReconcileArgs) -> Result<()> {
    if let Some(threshold) = args.threshold {
        anyhow::ensure!(
            (0.0..=1.0).contains(&threshold),
            "阈值必须在 0 到 1 之间: {}",
            threshold
        );
        settings.reconcile.threshold = threshold;
    }
    settings.reconcile.retain_removed |= args.retain_removed;

    let extracted = load(&args.new, &settings.load_options())
        .with_context(|| format!("无法加载模板 {}", args.new.display()))?;
    let mut state = open_state(settings, &args.old)?;
    let report = state.reconcile_with(&extracted.catalog.units)?;

    state
        .save_to_file(&args.output)
        .with_context(|| format!("无法写入 {}", args.output.display()))?;
    println!("{}", format_report(&report));
    tracing::info!("{}: {}", STATUS_SAVED, args.output.display());
    Ok(())
}

fn run_template(settings: Settings, args: TemplateArgs) -> Result<()> {
    let mut catalog = Catalog::template(&args.project, &args.project_version, &revision_timestamp());
    if let Some(from) = &args.from {
        let source = load(from, &settings.load_options())
            .with_context(|| format!("无法加载 {}", from.display()))?;
        catalog.units = source
            .catalog
            .units
            .into_iter()
            .map(|u| {
                let mut fresh = Unit::new(u.original, u.line_num);
                fresh.occurrences = u.occurrences;
                fresh.msgctxt = u.msgctxt;
                fresh.developer_comment_lines = u.developer_comment_lines;
                fresh
            })
            .collect();
    }

    let mut state = AppState::with_settings(settings);
    state.set_catalog(catalog);
    state
        .save_to_file(&args.output)
        .with_context(|| format!("无法写入 {}", args.output.display()))?;
    tracing::info!("{}: {}", STATUS_TEMPLATE_WRITTEN, args.output.display());
    Ok(())
}

fn run_bench() -> Result<()> {
    for result in run_performance_suite() {
        println!(
            "{:<20} {:>6}ms  {}  {}",
            result.operation,
            result.duration_ms,
            if result.success { "OK" } else { "FAIL" },
            result.details
        );
    }
    Ok(())
}
