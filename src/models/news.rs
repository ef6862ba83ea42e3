//! 新闻数据模型

use serde::{Deserialize, Serialize};

/// 新闻标题缺失时的占位
pub const DEFAULT_NEWS_TITLE: &str = "No title available";
/// 发布方缺失时的占位
pub const DEFAULT_NEWS_PUBLISHER: &str = "Unknown";
/// 链接缺失时的占位锚点
pub const DEFAULT_NEWS_LINK: &str = "#";

/// 数据源返回的原始新闻条目，任何字段都可能缺失
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawNewsItem {
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub link: Option<String>,
}

/// 页面展示用新闻条目
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewsItem {
    /// 标题
    pub title: String,
    /// 发布方
    pub publisher: String,
    /// 原文链接
    pub link: String,
}

impl From<RawNewsItem> for NewsItem {
    fn from(raw: RawNewsItem) -> Self {
        Self {
            title: raw.title.unwrap_or_else(|| DEFAULT_NEWS_TITLE.to_string()),
            publisher: raw.publisher.unwrap_or_else(|| DEFAULT_NEWS_PUBLISHER.to_string()),
            link: raw.link.unwrap_or_else(|| DEFAULT_NEWS_LINK.to_string()),
        }
    }
}
