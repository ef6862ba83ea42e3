//! 预测请求的错误类型
//!
//! 除 `MissingFields` 作为表单校验提示外，其余错误统一渲染为 "Error: <message>"。
//! 大模型调用失败不属于这里的错误，会在结果页中降级展示。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictionError {
    /// 表单缺少股票代码或 API Key
    #[error("Please provide both ticker and API key.")]
    MissingFields,

    /// 股票代码不在白名单内
    #[error("Invalid ticker selected.")]
    InvalidTicker,

    /// 行情数据源没有返回历史收盘价
    #[error("No historical data found for this ticker.")]
    NoHistoricalData,

    /// 行情或新闻获取失败
    #[error("{0}")]
    MarketData(anyhow::Error),

    /// 走势图渲染失败
    #[error("Failed to render chart: {0}")]
    Chart(anyhow::Error),
}

impl PredictionError {
    /// 页面上展示的错误文案
    pub fn user_message(&self) -> String {
        match self {
            PredictionError::MissingFields => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}
