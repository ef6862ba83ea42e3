//! 大模型输出的简易 Markdown 转 HTML
//!
//! 只支持一个很小的子集：
//! - `**粗体**`、`*斜体*`（同一行内成对出现才转换）
//! - 行首 `#` / `##` / `###` 标题
//! - 行首 `- ` 无序列表，连续的列表项合并到同一个 `<ul>`
//! - 其余换行替换为 `<br>`
//!
//! 按行扫描并用一个 `in_list` 状态记录当前是否处于列表中。
//! 输出不做 HTML 转义，调用方需自行确认输入来源可信。

use std::sync::LazyLock;

use regex::Regex;

/// 标题行：1~3 个 `#` 后至少一个空白
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#{1,3})\s+(.*)$").unwrap());

/// 列表行：`-` 后至少一个空白
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s+(.*)$").unwrap());

/// 单行的块级类型
#[derive(Debug, PartialEq)]
enum Line<'a> {
    Heading(usize, &'a str),
    ListItem(&'a str),
    Text(&'a str),
}

impl<'a> Line<'a> {
    fn classify(line: &'a str) -> Self {
        if let Some(caps) = HEADING_RE.captures(line) {
            let level = caps.get(1).map_or(1, |m| m.as_str().len());
            let content = caps.get(2).map_or("", |m| m.as_str());
            return Line::Heading(level, content);
        }
        if let Some(caps) = LIST_ITEM_RE.captures(line) {
            return Line::ListItem(caps.get(1).map_or("", |m| m.as_str()));
        }
        Line::Text(line)
    }
}

/// 将 Markdown 子集转换为 HTML 片段
pub fn render_markdown(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + 64);
    let mut in_list = false;

    for (index, raw) in text.split('\n').enumerate() {
        match Line::classify(raw) {
            Line::ListItem(content) => {
                if !in_list {
                    if index > 0 {
                        html.push_str("<br>");
                    }
                    html.push_str("<ul>");
                    in_list = true;
                }
                html.push_str("<li>");
                html.push_str(&render_inline(content));
                html.push_str("</li>");
            }
            other => {
                if in_list {
                    html.push_str("</ul>");
                    in_list = false;
                }
                if index > 0 {
                    html.push_str("<br>");
                }
                match other {
                    Line::Heading(level, content) => {
                        html.push_str(&format!("<h{level}>{}</h{level}>", render_inline(content)));
                    }
                    _ => html.push_str(&render_inline(raw)),
                }
            }
        }
    }

    if in_list {
        html.push_str("</ul>");
    }

    html
}

/// 行内强调：先粗体后斜体
pub fn render_inline(text: &str) -> String {
    let bold = replace_paired(text, "**", "strong");
    replace_paired(&bold, "*", "em")
}

/// 把成对出现的 `marker` 替换为 `<tag>..</tag>`
///
/// 没有闭合或内容为空的标记保持原样
fn replace_paired(text: &str, marker: &str, tag: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(marker) {
        let after = &rest[start + marker.len()..];
        match after.find(marker) {
            Some(0) => {
                let skip = start + marker.len() * 2;
                out.push_str(&rest[..skip]);
                rest = &rest[skip..];
            }
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str(&format!("<{tag}>{}</{tag}>", &after[..end]));
                rest = &after[end + marker.len()..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}
