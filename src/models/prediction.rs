//! 预测请求与结果模型

use serde::{Deserialize, Serialize};

use super::{NewsItem, QuoteSnapshot};

/// 表单提交参数
///
/// 两个字段都可能缺失，缺失或为空时重新展示表单
#[derive(Debug, Default, Deserialize)]
pub struct PredictionForm {
    /// 股票代码
    pub ticker: Option<String>,
    /// 大模型 API Key，只在本次请求内转发，不存储、不记录日志
    pub api_key: Option<String>,
}

impl PredictionForm {
    /// 返回非空的 (ticker, api_key)，任一缺失返回 None
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let ticker = self.ticker.as_deref().filter(|s| !s.is_empty())?;
        let api_key = self.api_key.as_deref().filter(|s| !s.is_empty())?;
        Some((ticker, api_key))
    }
}

/// 一次成功预测的全部展示数据
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResults {
    /// 股票代码
    pub ticker: String,
    /// 行情快照
    pub quote: QuoteSnapshot,
    /// 最近新闻（最多 5 条）
    pub news: Vec<NewsItem>,
    /// base64 编码的走势图
    pub chart_img: String,
    /// 走势图 MIME 类型
    pub chart_mime: String,
    /// 已转换为 HTML 的预测文本
    pub prediction_html: Option<String>,
    /// 大模型调用失败时的纯文本提示，与 prediction_html 二选一
    pub prediction_error: Option<String>,
}

/// 页面渲染结果
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// 仅展示表单，可附带校验提示
    Form { error: Option<String> },
    /// 请求失败，统一展示 "Error: <message>"
    Error(String),
    /// 预测成功
    Results(Box<PredictionResults>),
}
