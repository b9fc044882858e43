//! PO 文本 → 原始条目序列
//!
//! 只做语法层面的切分；条目到 `Unit` 的映射在 `po_file` 中完成。

use crate::codec::escape::parse_po_string;
use crate::model::data_core::AppError;

/// 含空白的路径在 `#:` 中用 FSI/PDI 包裹（与 gettext 0.20+ 一致）
pub const ISOLATE_START: char = '\u{2068}';
pub const ISOLATE_END: char = '\u{2069}';

/// 一个未经解释的 PO 条目
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoEntry {
    /// `# ` 译者注释
    pub translator_comments: Vec<String>,
    /// `#.` 开发者注释
    pub extracted_comments: Vec<String>,
    /// `#:` 引用片段；FSI/PDI 包裹的路径已去掉包裹字符
    pub references: Vec<String>,
    /// `#,` 标记
    pub flags: Vec<String>,
    pub previous_msgctxt: Option<String>,
    pub previous_msgid: Option<String>,
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: String,
    pub msgstr_plural: Vec<String>,
    /// `#~` 废弃条目
    pub obsolete: bool,
    /// 条目第一行的行号（从1开始）
    pub line: usize,
}

/// 续行要追加到的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    PreviousMsgctxt,
    PreviousMsgid,
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrPlural(usize),
}

#[derive(Default)]
struct Builder {
    entry: PoEntry,
    started: bool,
    has_msgid: bool,
    has_msgstr: bool,
}

impl Builder {
    fn touch(&mut self, line: usize) {
        if !self.started {
            self.started = true;
            self.entry.line = line;
        }
    }

    fn finish(&mut self, out: &mut Vec<PoEntry>) -> Result<(), AppError> {
        if self.has_msgid {
            if !self.has_msgstr {
                return Err(AppError::format(self.entry.line, "条目缺少 msgstr"));
            }
            out.push(std::mem::take(&mut self.entry));
        } else if self.started {
            tracing::debug!("第 {} 行起的注释没有对应条目，已忽略", self.entry.line);
        }
        *self = Builder::default();
        Ok(())
    }
}

/// 解析整个 PO 文本。结构性错误（未知行、缺引号、缺 msgstr 等）直接返回错误。
pub fn parse_entries(text: &str) -> Result<Vec<PoEntry>, AppError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut out = Vec::new();
    let mut cur = Builder::default();
    let mut field = Field::None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        // 注释行保留行尾空白，避免改动用户注释
        let line = raw.trim_start();

        if line.trim_end().is_empty() {
            if cur.has_msgid {
                cur.finish(&mut out)?;
                field = Field::None;
            }
            continue;
        }

        let (line, obsolete) = match line.strip_prefix("#~") {
            Some(rest) => (rest.trim(), true),
            None => (line, false),
        };
        if obsolete && line.trim_end().is_empty() {
            continue;
        }

        let previous = match line.strip_prefix("#|") {
            Some(rest) => Some(rest),
            None if obsolete => line.strip_prefix('|'),
            None => None,
        };
        if let Some(rest) = previous {
            if cur.has_msgstr {
                cur.finish(&mut out)?;
            }
            cur.touch(line_no);
            cur.entry.obsolete |= obsolete;
            field = parse_previous(&mut cur.entry, rest.trim(), field, line_no)?;
            continue;
        }

        if line.starts_with('#') && !obsolete {
            if cur.has_msgstr {
                cur.finish(&mut out)?;
            }
            cur.touch(line_no);
            parse_comment(&mut cur.entry, line);
            field = Field::None;
            continue;
        }

        if line.starts_with('"') {
            let value = parse_po_string(line, line_no)?;
            append_to(&mut cur.entry, field, &value, line_no)?;
            continue;
        }

        let (keyword, rest) = split_keyword(line);
        match keyword {
            "msgctxt" => {
                if cur.has_msgstr {
                    cur.finish(&mut out)?;
                }
                if cur.has_msgid {
                    return Err(AppError::format(line_no, "msgctxt 出现在 msgid 之后"));
                }
                cur.touch(line_no);
                cur.entry.obsolete |= obsolete;
                cur.entry.msgctxt = Some(parse_po_string(rest, line_no)?);
                field = Field::Msgctxt;
            }
            "msgid" => {
                if cur.has_msgstr {
                    cur.finish(&mut out)?;
                }
                if cur.has_msgid {
                    return Err(AppError::format(line_no, "重复的 msgid"));
                }
                cur.touch(line_no);
                cur.entry.obsolete |= obsolete;
                cur.entry.msgid = parse_po_string(rest, line_no)?;
                cur.has_msgid = true;
                field = Field::Msgid;
            }
            "msgid_plural" => {
                if !cur.has_msgid || cur.has_msgstr {
                    return Err(AppError::format(line_no, "msgid_plural 位置错误"));
                }
                cur.entry.msgid_plural = Some(parse_po_string(rest, line_no)?);
                field = Field::MsgidPlural;
            }
            "msgstr" => {
                if !cur.has_msgid {
                    return Err(AppError::format(line_no, "msgstr 之前没有 msgid"));
                }
                if cur.has_msgstr {
                    return Err(AppError::format(line_no, "重复的 msgstr"));
                }
                cur.entry.msgstr = parse_po_string(rest, line_no)?;
                cur.has_msgstr = true;
                field = Field::Msgstr;
            }
            other => {
                let Some(index) = plural_index(other) else {
                    return Err(AppError::format(line_no, format!("无法识别的行: {}", line)));
                };
                if !cur.has_msgid {
                    return Err(AppError::format(line_no, "msgstr 之前没有 msgid"));
                }
                let value = parse_po_string(rest, line_no)?;
                let plurals = &mut cur.entry.msgstr_plural;
                if plurals.len() <= index {
                    plurals.resize(index + 1, String::new());
                }
                plurals[index] = value;
                cur.has_msgstr = true;
                field = Field::MsgstrPlural(index);
            }
        }
    }

    cur.finish(&mut out)?;
    Ok(out)
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(|c: char| c.is_whitespace()) {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    }
}

/// `msgstr[2]` -> `Some(2)`
fn plural_index(keyword: &str) -> Option<usize> {
    keyword
        .strip_prefix("msgstr[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

fn parse_comment(entry: &mut PoEntry, line: &str) {
    let body = &line[1..];
    match body.chars().next() {
        Some('.') => entry.extracted_comments.push(strip_one_space(&body[1..]).to_string()),
        Some(':') => entry.references.extend(split_references(&body[1..])),
        Some(',') => entry.flags.extend(
            body[1..]
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        ),
        _ => entry.translator_comments.push(strip_one_space(body).to_string()),
    }
}

/// 按空白切分引用；包裹字符之间的空白属于路径本身
fn split_references(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut isolated = false;
    for c in body.chars() {
        match c {
            ISOLATE_START => isolated = true,
            ISOLATE_END => isolated = false,
            c if c.is_whitespace() && !isolated => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_previous(
    entry: &mut PoEntry,
    rest: &str,
    field: Field,
    line_no: usize,
) -> Result<Field, AppError> {
    if rest.starts_with('"') {
        let value = parse_po_string(rest, line_no)?;
        append_to(entry, field, &value, line_no)?;
        return Ok(field);
    }
    let (keyword, value) = split_keyword(rest);
    match keyword {
        "msgctxt" => {
            entry.previous_msgctxt = Some(parse_po_string(value, line_no)?);
            Ok(Field::PreviousMsgctxt)
        }
        "msgid" => {
            entry.previous_msgid = Some(parse_po_string(value, line_no)?);
            Ok(Field::PreviousMsgid)
        }
        // 旧复数原文不保留
        _ => Ok(Field::None),
    }
}

fn append_to(entry: &mut PoEntry, field: Field, value: &str, line_no: usize) -> Result<(), AppError> {
    let target = match field {
        Field::None => {
            return Err(AppError::format(line_no, "续行字符串前没有关键字"));
        }
        Field::PreviousMsgctxt => entry.previous_msgctxt.get_or_insert_with(String::new),
        Field::PreviousMsgid => entry.previous_msgid.get_or_insert_with(String::new),
        Field::Msgctxt => entry.msgctxt.get_or_insert_with(String::new),
        Field::Msgid => &mut entry.msgid,
        Field::MsgidPlural => entry.msgid_plural.get_or_insert_with(String::new),
        Field::Msgstr => &mut entry.msgstr,
        Field::MsgstrPlural(i) => match entry.msgstr_plural.get_mut(i) {
            Some(slot) => slot,
            None => return Err(AppError::format(line_no, "续行字符串前没有关键字")),
        },
    };
    target.push_str(value);
    // 跨行拼接后可能出现新的 \r\n
    if target.contains("\r\n") {
        *target = target.replace("\r\n", "\n");
    }
    Ok(())
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_entry() {
        let text = r#"# translator note
#. developer note
#: main.ow:12 other.ow:3
#, fuzzy, c-format
#| msgid "Old text"
msgctxt "menu"
msgid "New text"
msgstr "新文本"
"#;
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.translator_comments, vec!["translator note"]);
        assert_eq!(e.extracted_comments, vec!["developer note"]);
        assert_eq!(e.references, vec!["main.ow:12", "other.ow:3"]);
        assert_eq!(e.flags, vec!["fuzzy", "c-format"]);
        assert_eq!(e.previous_msgid.as_deref(), Some("Old text"));
        assert_eq!(e.msgctxt.as_deref(), Some("menu"));
        assert_eq!(e.msgid, "New text");
        assert_eq!(e.msgstr, "新文本");
        assert_eq!(e.line, 1);
    }

    #[test]
    fn test_multiline_and_header() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Language: zh\\n\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\nmsgid \"\"\n\"Line one\\n\"\n\"Line two\"\nmsgstr \"一\\n二\"\n";
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].msgid, "");
        assert!(entries[0].msgstr.starts_with("Language: zh\n"));
        assert_eq!(entries[1].msgid, "Line one\nLine two");
        assert_eq!(entries[1].msgstr, "一\n二");
        assert_eq!(entries[1].line, 6);
    }

    #[test]
    fn test_entries_without_blank_separator() {
        let text = "msgid \"A\"\nmsgstr \"甲\"\n# note\nmsgid \"B\"\nmsgstr \"乙\"\n";
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].translator_comments, vec!["note"]);
    }

    #[test]
    fn test_obsolete_and_plural() {
        let text = "#~ msgid \"Gone\"\n#~ msgstr \"没了\"\n\nmsgid \"apple\"\nmsgid_plural \"apples\"\nmsgstr[0] \"苹果\"\nmsgstr[1] \"苹果们\"\n";
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].obsolete);
        assert_eq!(entries[0].msgid, "Gone");
        assert_eq!(entries[1].msgid_plural.as_deref(), Some("apples"));
        assert_eq!(entries[1].msgstr_plural, vec!["苹果", "苹果们"]);
    }

    #[test]
    fn test_crlf_and_bom() {
        let text = "\u{feff}msgid \"A\"\r\nmsgstr \"甲\"\r\n";
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries[0].msgstr, "甲");
    }

    #[test]
    fn test_structural_errors() {
        assert!(parse_entries("msgstr \"orphan\"\n").is_err());
        assert!(parse_entries("msgid \"A\"\n\n").is_err());
        assert!(parse_entries("\"dangling\"\n").is_err());
        assert!(parse_entries("garbage line\n").is_err());
        assert!(parse_entries("msgid \"A\"\nmsgid \"B\"\n").is_err());
        match parse_entries("msgid \"A\"\nmsgstr \"x\"\n\nmsgid broken\nmsgstr \"\"\n") {
            Err(AppError::Format { line, .. }) => assert_eq!(line, 4),
            other => panic!("应为格式错误: {:?}", other),
        }
    }

    #[test]
    fn test_isolated_reference_keeps_spaces() {
        let text = "#: \u{2068}My Mode/main.ow\u{2069}:3  other.ow:4\nmsgid \"A\"\nmsgstr \"\"\n";
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries[0].references, vec!["My Mode/main.ow:3", "other.ow:4"]);
    }

    #[test]
    fn test_empty_comment_line() {
        let text = "#\n# second\nmsgid \"A\"\nmsgstr \"\"\n";
        let entries = parse_entries(text).expect("解析应成功");
        assert_eq!(entries[0].translator_comments, vec!["", "second"]);
    }
}
