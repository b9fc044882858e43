//! 私有状态标记：把"已审校/已忽略"藏在译者注释的保留行里
//!
//! 第三方 PO 编辑器会把这些行当作普通注释原样保留。解码时剥离，编码时追加，
//! 其他注释处理代码不接触这些标记。

pub const MARKER_PREFIX: &str = "#PoFanyi:";
pub const REVIEWED_MARKER: &str = "#PoFanyi:reviewed";
pub const IGNORED_MARKER: &str = "#PoFanyi:ignored";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivateState {
    pub reviewed: bool,
    pub ignored: bool,
}

/// 从译者注释行中取出私有状态，返回用户可见的注释文本
pub fn strip_markers(lines: &[String]) -> (String, PrivateState) {
    let mut state = PrivateState::default();
    let mut visible: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        let trimmed = line.trim();
        if trimmed == REVIEWED_MARKER {
            state.reviewed = true;
        } else if trimmed == IGNORED_MARKER {
            state.ignored = true;
        } else if trimmed.starts_with(MARKER_PREFIX) {
            tracing::debug!("丢弃未知的私有标记: {}", trimmed);
        } else {
            visible.push(line);
        }
    }
    (visible.join("\n"), state)
}

/// 用户注释按行拆开，再在末尾追加为真的标记
pub fn append_markers(comment: &str, state: PrivateState) -> Vec<String> {
    let mut lines: Vec<String> = if comment.is_empty() {
        Vec::new()
    } else {
        comment.split('\n').map(str::to_string).collect()
    };
    if state.reviewed {
        lines.push(REVIEWED_MARKER.to_string());
    }
    if state.ignored {
        lines.push(IGNORED_MARKER.to_string());
    }
    lines
}
