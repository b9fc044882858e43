//! Catalog <-> PO 文件
//!
//! 解码：条目映射为 `Unit`，剥离私有标记，首个空 msgid 条目作为文件头。
//! 编码：在内存中生成完整文本，再一次性替换目标文件。

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::codec::escape::{escape_po, write_keyword, write_prefixed_keyword};
use crate::codec::markers::{append_markers, strip_markers, PrivateState};
use crate::codec::parser::{parse_entries, PoEntry, ISOLATE_END, ISOLATE_START};
use crate::model::catalog::{
    Catalog, CatalogMetadata, HeaderLine, DEFAULT_CONTENT_TRANSFER_ENCODING, DEFAULT_CONTENT_TYPE,
    HEADER_CONTENT_TRANSFER_ENCODING, HEADER_CONTENT_TYPE, HEADER_PO_REVISION_DATE,
};
use crate::model::data_core::AppError;
use crate::model::unit::{Occurrence, Unit};
use crate::utils::fs::{find_project_root, read_source_lines, read_text_file, write_atomic};

pub const FUZZY_FLAG: &str = "fuzzy";
pub const DEFAULT_SOURCE_NAME: &str = "source_code";
pub const DEFAULT_PROJECT_MARKER_DIR: &str = "locales";

/// 导入时的非致命问题，记录后继续
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportWarning {
    #[error("上下文源文件不可用 {path}: {reason}")]
    MissingSource { path: String, reason: String },
    #[error("第 {line} 行的引用无法解析: {token}")]
    MalformedOccurrence { line: usize, token: String },
    #[error("第 {line} 行的复数形式未保留，只使用 msgstr[0]")]
    PluralFormsDropped { line: usize },
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub catalog: Catalog,
    pub warnings: Vec<ImportWarning>,
}

impl Decoded {
    /// 文件头中的 `Language` 字段
    pub fn language(&self) -> Option<&str> {
        self.catalog.language()
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// 向上查找项目根目录时使用的标志目录名；`None` 表示不加载上下文
    pub project_marker_dir: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            project_marker_dir: Some(DEFAULT_PROJECT_MARKER_DIR.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// 单元没有出现位置时，用此文件名和 `line_num` 补一个
    pub source_name: String,
    /// 设置后写入 `PO-Revision-Date`
    pub revision_date: Option<String>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            revision_date: None,
        }
    }
}

/// 解析 PO 文本为目录（不访问文件系统）
pub fn decode(text: &str) -> Result<Decoded, AppError> {
    let entries = parse_entries(text)?;
    let mut metadata = CatalogMetadata::default();
    let mut units = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();
    let mut seen_entry = false;
    let mut obsolete = 0usize;

    for entry in entries {
        if entry.obsolete {
            obsolete += 1;
            continue;
        }
        let is_first = !seen_entry;
        seen_entry = true;

        if entry.msgid.is_empty() {
            if is_first && entry.msgctxt.is_none() {
                metadata = parse_header(&entry);
            } else {
                tracing::debug!("跳过第 {} 行的空 msgid 条目", entry.line);
            }
            continue;
        }
        units.push(entry_to_unit(entry, &mut warnings));
    }

    if obsolete > 0 {
        tracing::debug!("跳过 {} 个废弃条目", obsolete);
    }
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    Ok(Decoded {
        catalog: Catalog::new(metadata, units),
        warnings,
    })
}

/// 读取并解析 PO 文件；能定位到项目根目录时顺带加载出现位置对应的源文件
pub fn load(path: &Path, options: &LoadOptions) -> Result<Decoded, AppError> {
    let text = read_text_file(path)?;
    let mut decoded = decode(&text)?;

    if let Some(marker) = options.project_marker_dir.as_deref() {
        match find_project_root(path, marker) {
            Some(root) => load_source_context(&root, &mut decoded),
            None => tracing::debug!("未找到包含 {} 的项目根目录，跳过上下文加载", marker),
        }
    }

    tracing::info!(
        "PO文件加载完成: {} ({} 条, {} 个警告)",
        path.display(),
        decoded.catalog.len(),
        decoded.warnings.len()
    );
    Ok(decoded)
}

fn load_source_context(root: &Path, decoded: &mut Decoded) {
    let paths: Vec<String> = decoded
        .catalog
        .units
        .iter()
        .filter_map(|u| u.occurrences.first().map(|o| o.path.clone()))
        .collect();
    let mut failed: HashSet<String> = HashSet::new();

    for rel in paths {
        if decoded.catalog.has_source_context(&rel) || failed.contains(&rel) {
            continue;
        }
        let full = root.join(rel.replace('\\', "/"));
        match read_source_lines(&full) {
            Ok(lines) => decoded.catalog.insert_source_context(rel, lines),
            Err(e) => {
                let warning = ImportWarning::MissingSource {
                    path: rel.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", warning);
                decoded.warnings.push(warning);
                failed.insert(rel);
            }
        }
    }
}

fn parse_header(entry: &PoEntry) -> CatalogMetadata {
    let mut metadata = CatalogMetadata {
        header_comments: entry.translator_comments.clone(),
        header_flags: entry.flags.clone(),
        ..CatalogMetadata::default()
    };
    for line in entry.msgstr.split('\n').filter(|l| !l.is_empty()) {
        let parsed = HeaderLine::parse(line);
        if let HeaderLine::Raw(raw) = &parsed {
            tracing::debug!("文件头行不是 Key: value 形式，原样保留: {}", raw);
        }
        metadata.lines.push(parsed);
    }
    metadata
}

fn entry_to_unit(entry: PoEntry, warnings: &mut Vec<ImportWarning>) -> Unit {
    let mut occurrences = Vec::with_capacity(entry.references.len());
    for token in &entry.references {
        match Occurrence::parse(token) {
            Some(occurrence) => occurrences.push(occurrence),
            None => warnings.push(ImportWarning::MalformedOccurrence {
                line: entry.line,
                token: token.clone(),
            }),
        }
    }
    let line_num = occurrences.first().and_then(|o| o.line).unwrap_or(0);

    let mut unit = Unit::new(entry.msgid, line_num);
    unit.occurrences = occurrences;
    unit.msgctxt = entry.msgctxt;
    unit.previous_original = entry.previous_msgid;
    unit.translation = match entry.msgid_plural {
        Some(_) => {
            warnings.push(ImportWarning::PluralFormsDropped { line: entry.line });
            entry.msgstr_plural.into_iter().next().unwrap_or_default()
        }
        None => entry.msgstr,
    };

    let (comment, state) = strip_markers(&entry.translator_comments);
    unit.comment = comment;
    unit.set_reviewed(state.reviewed);
    unit.set_ignored(state.ignored);

    // 旧版本曾把 #: #, #| 注解写进开发者注释，这里丢弃，由编码器重新生成
    unit.developer_comment_lines = entry
        .extracted_comments
        .into_iter()
        .filter(|l| !is_annotation_line(l))
        .collect();

    let mut fuzzy = false;
    for flag in entry.flags {
        if flag == FUZZY_FLAG {
            fuzzy = true;
        } else if !unit.flags.contains(&flag) {
            unit.flags.push(flag);
        }
    }
    unit.set_fuzzy(fuzzy);
    unit
}

fn is_annotation_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("#:") || t.starts_with("#,") || t.starts_with("#|")
}

/// 目录编码为 PO 文本。
///
/// 占位行与空原文单元不输出；已审校/已忽略的单元不写 `fuzzy`。
/// 文件头总会写出，缺少编码声明时补上 `Content-Type` 与 `Content-Transfer-Encoding`。
pub fn encode(catalog: &Catalog, options: &EncodeOptions) -> Result<String, AppError> {
    let mut out = String::with_capacity(catalog.len() * 96 + 512);

    let mut metadata = catalog.metadata.clone();
    metadata.set_if_absent(HEADER_CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
    metadata.set_if_absent(HEADER_CONTENT_TRANSFER_ENCODING, DEFAULT_CONTENT_TRANSFER_ENCODING);
    if let Some(date) = &options.revision_date {
        metadata.set(HEADER_PO_REVISION_DATE, date.as_str());
    }
    write_header(&mut out, &metadata);

    for (index, unit) in catalog.units.iter().enumerate() {
        if unit.is_new_entry() || unit.original.is_empty() {
            continue;
        }
        if unit.id().trim().is_empty() {
            return Err(AppError::ContractViolation(format!(
                "第 {} 条单元缺少ID，拒绝导出",
                index
            )));
        }
        out.push('\n');
        write_unit(&mut out, unit, options);
    }

    Ok(out)
}

/// 编码后原子写入；失败时目标文件保持原样
pub fn save(path: &Path, catalog: &Catalog, options: &EncodeOptions) -> Result<(), AppError> {
    let text = encode(catalog, options)?;
    write_atomic(path, &text)?;
    tracing::info!("PO文件已保存到: {} ({} 条)", path.display(), catalog.len());
    Ok(())
}

fn write_header(out: &mut String, metadata: &CatalogMetadata) {
    for line in &metadata.header_comments {
        write_comment_line(out, "#", line);
    }
    if !metadata.header_flags.is_empty() {
        out.push_str("#, ");
        out.push_str(&metadata.header_flags.join(", "));
        out.push('\n');
    }
    out.push_str("msgid \"\"\n");
    out.push_str("msgstr \"\"\n");
    for line in &metadata.lines {
        out.push('"');
        out.push_str(&escape_po(&line.to_line()));
        out.push_str("\\n\"\n");
    }
}

fn write_unit(out: &mut String, unit: &Unit, options: &EncodeOptions) {
    let state = PrivateState {
        reviewed: unit.is_reviewed(),
        ignored: unit.is_ignored(),
    };
    for line in append_markers(&unit.comment, state) {
        write_comment_line(out, "#", &line);
    }
    for line in &unit.developer_comment_lines {
        write_comment_line(out, "#.", line);
    }

    let synthesized;
    let occurrences: &[Occurrence] = if unit.occurrences.is_empty() && unit.line_num > 0 {
        synthesized = [Occurrence::new(options.source_name.as_str(), unit.line_num)];
        &synthesized
    } else {
        &unit.occurrences
    };
    if !occurrences.is_empty() {
        let refs: Vec<String> = occurrences.iter().map(format_reference).collect();
        out.push_str("#: ");
        out.push_str(&refs.join(" "));
        out.push('\n');
    }

    let mut flags: Vec<&str> = Vec::with_capacity(unit.flags.len() + 1);
    // 审校/忽略的结论优先于残留的 fuzzy
    if unit.is_fuzzy() && !unit.is_reviewed() && !unit.is_ignored() {
        flags.push(FUZZY_FLAG);
    }
    for flag in &unit.flags {
        if flag.as_str() != FUZZY_FLAG && !flags.contains(&flag.as_str()) {
            flags.push(flag.as_str());
        }
    }
    if !flags.is_empty() {
        out.push_str("#, ");
        out.push_str(&flags.join(", "));
        out.push('\n');
    }

    if let Some(previous) = &unit.previous_original {
        write_prefixed_keyword(out, "#| ", "msgid", previous);
    }
    if let Some(context) = &unit.msgctxt {
        write_keyword(out, "msgctxt", context);
    }
    write_keyword(out, "msgid", &unit.original);
    write_keyword(out, "msgstr", &unit.translation);
}

/// 路径含空白时用 FSI/PDI 包裹，避免被读取端按空白拆开
fn format_reference(occurrence: &Occurrence) -> String {
    if !occurrence.path.chars().any(char::is_whitespace) {
        return occurrence.to_string();
    }
    let path = format!("{}{}{}", ISOLATE_START, occurrence.path, ISOLATE_END);
    match occurrence.line {
        Some(line) => format!("{}:{}", path, line),
        None => path,
    }
}

fn write_comment_line(out: &mut String, prefix: &str, text: &str) {
    out.push_str(prefix);
    if !text.is_empty() {
        out.push(' ');
        out.push_str(text);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        let mut metadata = CatalogMetadata::default();
        metadata.set("Project-Id-Version", "Arena 1.0");
        metadata.set("Language", "zh");
        metadata.set("Content-Type", "text/plain; charset=utf-8");
        metadata.set("Content-Transfer-Encoding", "8bit");

        let mut reviewed = Unit::new("Press [Button] to start", 12).with_occurrence("main.ow", 12);
        reviewed.translation = "按[Button]开始".into();
        reviewed.comment = "主菜单\n第二行".into();
        reviewed.set_reviewed(true);

        let mut fuzzy = Unit::new("Round {0}\nbegins", 20).with_occurrence("main.ow", 20);
        fuzzy.translation = "第{0}回合\n开始".into();
        fuzzy.set_fuzzy(true);
        fuzzy.flags = vec!["c-format".into()];
        fuzzy.previous_original = Some("Round {0} starts".into());
        fuzzy.developer_comment_lines = vec!["shown at round start".into()];

        let mut ignored = Unit::new("DEBUG", 31).with_occurrence("debug.ow", 31);
        ignored.set_ignored(true);
        ignored.msgctxt = Some("dev".into());

        Catalog::new(metadata, vec![reviewed, fuzzy, ignored])
    }

    #[test]
    fn test_round_trip() {
        let catalog = sample_catalog();
        let text = encode(&catalog, &EncodeOptions::default()).expect("编码失败");
        let decoded = decode(&text).expect("解码失败");

        assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
        assert_eq!(decoded.catalog.metadata, catalog.metadata);
        assert_eq!(decoded.catalog.len(), catalog.len());
        for (before, after) in catalog.units.iter().zip(&decoded.catalog.units) {
            assert!(before.same_content(after), "\n{:?}\n{:?}", before, after);
        }
        assert_eq!(decoded.language(), Some("zh"));
    }

    #[test]
    fn test_markers_written_but_not_visible() {
        let catalog = sample_catalog();
        let text = encode(&catalog, &EncodeOptions::default()).expect("编码失败");
        assert!(text.contains("# #PoFanyi:reviewed\n"));
        assert!(text.contains("# #PoFanyi:ignored\n"));

        let decoded = decode(&text).expect("解码失败");
        assert!(decoded
            .catalog
            .units
            .iter()
            .all(|u| !u.comment.contains(crate::codec::markers::MARKER_PREFIX)));
    }

    #[test]
    fn test_reviewed_never_writes_fuzzy() {
        let mut unit = Unit::new("Hello", 1).with_occurrence("a.ow", 1);
        unit.set_fuzzy(true);
        unit.set_reviewed(true);
        unit.flags = vec!["fuzzy".into()];
        let text = encode(&Catalog::from_units(vec![unit]), &EncodeOptions::default()).expect("编码失败");
        assert!(!text.contains("fuzzy"), "{}", text);
    }

    #[test]
    fn test_skips_placeholder_and_empty_original() {
        let units = vec![
            Unit::new_entry_placeholder(),
            Unit::new("", 2),
            Unit::new("Kept", 3),
        ];
        let text = encode(&Catalog::from_units(units), &EncodeOptions::default()).expect("编码失败");
        assert!(!text.contains("##NEW_ENTRY##"));
        let decoded = decode(&text).expect("解码失败");
        assert_eq!(decoded.catalog.len(), 1);
        assert_eq!(decoded.catalog.units[0].original, "Kept");
    }

    #[test]
    fn test_synthesized_occurrence() {
        let unit = Unit::new("No refs", 7);
        let options = EncodeOptions {
            source_name: "mode.ow".into(),
            ..EncodeOptions::default()
        };
        let text = encode(&Catalog::from_units(vec![unit]), &options).expect("编码失败");
        assert!(text.contains("#: mode.ow:7\n"));
    }

    #[test]
    fn test_revision_date_is_stamped() {
        let options = EncodeOptions {
            revision_date: Some("2026-10-16 08:00+0000".into()),
            ..EncodeOptions::default()
        };
        let text = encode(&sample_catalog(), &options).expect("编码失败");
        let decoded = decode(&text).expect("解码失败");
        assert_eq!(
            decoded.catalog.metadata.get("PO-Revision-Date"),
            Some("2026-10-16 08:00+0000")
        );
    }

    #[test]
    fn test_header_lines_kept_verbatim() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"X-Note:  padded  \\n\"\n\"no colon line\\n\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\"Content-Transfer-Encoding: 8bit\\n\"\n";
        let decoded = decode(text).expect("解码失败");
        let metadata = &decoded.catalog.metadata;
        assert_eq!(metadata.get("X-Note"), Some(" padded  "));
        assert_eq!(metadata.lines[1], HeaderLine::Raw("no colon line".into()));

        let encoded = encode(&decoded.catalog, &EncodeOptions::default()).expect("编码失败");
        assert_eq!(encoded, text, "文件头应逐行原样写回");
    }

    #[test]
    fn test_missing_encoding_fields_are_added() {
        let mut unit = Unit::new("Hello", 1).with_occurrence("a.ow", 1);
        unit.translation = "你好".into();
        let options = EncodeOptions {
            revision_date: Some("2026-10-16 08:00+0000".into()),
            ..EncodeOptions::default()
        };
        let text = encode(&Catalog::from_units(vec![unit]), &options).expect("编码失败");
        assert!(text.starts_with("msgid \"\"\nmsgstr \"\"\n"), "{}", text);
        assert!(text.contains("\"Content-Type: text/plain; charset=utf-8\\n\"\n"), "{}", text);
        assert!(text.contains("\"Content-Transfer-Encoding: 8bit\\n\"\n"), "{}", text);
        assert!(text.contains("\"PO-Revision-Date: 2026-10-16 08:00+0000\\n\"\n"), "{}", text);

        let decoded = decode(&text).expect("解码失败");
        assert_eq!(decoded.catalog.len(), 1);
        assert_eq!(decoded.catalog.units[0].translation, "你好");
    }

    #[test]
    fn test_existing_content_type_is_not_replaced() {
        let mut metadata = CatalogMetadata::default();
        metadata.set("Content-Type", "text/plain; charset=UTF-8");
        let text = encode(&Catalog::new(metadata, Vec::new()), &EncodeOptions::default()).expect("编码失败");
        assert!(text.contains("charset=UTF-8"));
        assert!(!text.contains("charset=utf-8"));
        assert_eq!(text.matches("Content-Type").count(), 1);
    }

    #[test]
    fn test_reference_with_spaces_round_trips() {
        let unit = Unit::new("Spawn", 3)
            .with_occurrence("My Mode/main.ow", 3)
            .with_occurrence("plain.ow", 8);
        let catalog = Catalog::from_units(vec![unit]);
        let text = encode(&catalog, &EncodeOptions::default()).expect("编码失败");
        assert!(text.contains("#: \u{2068}My Mode/main.ow\u{2069}:3 plain.ow:8\n"), "{}", text);

        let decoded = decode(&text).expect("解码失败");
        assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
        assert!(catalog.units[0].same_content(&decoded.catalog.units[0]));
        assert_eq!(decoded.catalog.units[0].occurrences[0], Occurrence::new("My Mode/main.ow", 3));
    }

    #[test]
    fn test_third_party_file() {
        let text = r#"# SOME DESCRIPTIVE TITLE.
#, fuzzy
msgid ""
msgstr ""
"Project-Id-Version: demo\n"
"Language: ja\n"

#. #: stale.ow:1
#. keep me
#: main.ow:3 broken: main.ow:9
#, fuzzy, c-format
msgid "Hello %s"
msgstr "こんにちは %s"

msgid ""
msgstr "orphan"

#~ msgid "Old"
#~ msgstr "古い"

msgid "file"
msgid_plural "files"
msgstr[0] "ファイル"
msgstr[1] "ファイル"
"#;
        let decoded = decode(text).expect("解码失败");
        let catalog = &decoded.catalog;
        assert_eq!(catalog.metadata.header_comments, vec!["SOME DESCRIPTIVE TITLE."]);
        assert_eq!(catalog.metadata.header_flags, vec!["fuzzy"]);
        assert_eq!(decoded.language(), Some("ja"));
        assert_eq!(catalog.len(), 2);

        let hello = &catalog.units[0];
        assert_eq!(hello.developer_comment_lines, vec!["keep me"]);
        assert_eq!(hello.occurrences.len(), 2);
        assert_eq!(hello.line_num, 3);
        assert!(hello.is_fuzzy());
        assert_eq!(hello.flags, vec!["c-format"]);

        assert_eq!(catalog.units[1].translation, "ファイル");
        assert!(decoded
            .warnings
            .iter()
            .any(|w| matches!(w, ImportWarning::MalformedOccurrence { token, .. } if token == "broken:")));
        assert!(decoded
            .warnings
            .iter()
            .any(|w| matches!(w, ImportWarning::PluralFormsDropped { .. })));
    }

    #[test]
    fn test_structurally_broken_file_aborts() {
        let result = decode("msgid \"A\"\nmsgstr \"unterminated\n");
        assert!(matches!(result, Err(AppError::Format { .. })));
    }

    #[test]
    fn test_missing_id_is_contract_violation() {
        let catalog = Catalog::from_units(vec![Unit::with_id(" ", "text", 1)]);
        assert!(matches!(
            encode(&catalog, &EncodeOptions::default()),
            Err(AppError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_load_with_context_and_missing_source() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let root = dir.path();
        std::fs::create_dir_all(root.join("locales")).expect("创建目录失败");
        std::fs::write(root.join("main.ow"), "line 1\nline 2\nline 3\n").expect("写入失败");

        let po = "#: main.ow:2\nmsgid \"A\"\nmsgstr \"\"\n\n#: missing.ow:1\nmsgid \"B\"\nmsgstr \"\"\n";
        let po_path = root.join("locales").join("zh.po");
        std::fs::write(&po_path, po).expect("写入失败");

        let decoded = load(&po_path, &LoadOptions::default()).expect("加载失败");
        assert_eq!(decoded.catalog.context_lines(0, 1), vec!["line 1", "line 2", "line 3"]);
        assert!(decoded.catalog.context_lines(1, 1).is_empty());
        assert!(decoded
            .warnings
            .iter()
            .any(|w| matches!(w, ImportWarning::MissingSource { path, .. } if path == "missing.ow")));
    }

    #[test]
    fn test_save_replaces_file() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().join("out.po");
        std::fs::write(&path, "old content").expect("写入失败");
        save(&path, &sample_catalog(), &EncodeOptions::default()).expect("保存失败");

        let decoded = load(&path, &LoadOptions { project_marker_dir: None }).expect("加载失败");
        assert_eq!(decoded.catalog.len(), 3);
    }
}
