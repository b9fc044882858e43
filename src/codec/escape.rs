//! PO 字符串的转义与反转义

use crate::model::data_core::AppError;

/// 写入 PO 的转义：`\`、`"`、换行、回车、制表符
pub fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// 解析一段带引号的 PO 字符串（如 `"Hello\n"`），返回反转义后的文本。
///
/// 内部统一用 `\n` 作为换行，`\r\n` 在这里折叠。
pub fn parse_po_string(s: &str, line: usize) -> Result<String, AppError> {
    let s = s.trim();
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return Err(AppError::format(line, format!("无效的PO字符串: {}", s)));
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('a') => out.push('\u{07}'),
                Some('b') => out.push('\u{08}'),
                Some('f') => out.push('\u{0C}'),
                Some('v') => out.push('\u{0B}'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {
                    return Err(AppError::format(line, "字符串以反斜杠结尾"));
                }
            }
        } else if c == '"' {
            return Err(AppError::format(line, "字符串中含有未转义的引号"));
        } else {
            out.push(c);
        }
    }
    Ok(normalize_newlines(out))
}

pub fn normalize_newlines(s: String) -> String {
    if s.contains('\r') {
        s.replace("\r\n", "\n")
    } else {
        s
    }
}

/// 按 gettext 习惯输出 `keyword "..."`；含内部换行时改为多行续写形式
pub fn write_keyword(out: &mut String, keyword: &str, value: &str) {
    write_prefixed_keyword(out, "", keyword, value);
}

/// 同 `write_keyword`，但每一行都带前缀（用于 `#| msgid` 这类注释形式）
pub fn write_prefixed_keyword(out: &mut String, prefix: &str, keyword: &str, value: &str) {
    let segments: Vec<&str> = value.split_inclusive('\n').collect();
    out.push_str(prefix);
    out.push_str(keyword);
    if segments.len() > 1 {
        out.push_str(" \"\"\n");
        for segment in segments {
            out.push_str(prefix);
            out.push('"');
            out.push_str(&escape_po(segment));
            out.push_str("\"\n");
        }
    } else {
        out.push_str(" \"");
        out.push_str(&escape_po(value));
        out.push_str("\"\n");
    }
}
