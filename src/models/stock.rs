//! 股票数据模型
//!
//! 定义股票代码白名单、行情快照与历史收盘价

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// AI 相关股票代码白名单（按页面展示顺序）
pub const AI_TICKERS: &[&str] = &["NVDA", "GOOGL", "MSFT", "AMD", "INTC", "TSLA", "AAPL", "AMZN"];

/// 经过白名单校验的股票代码
///
/// 只能通过 [`Ticker::parse`] 构造，保证取值一定来自 [`AI_TICKERS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker(&'static str);

impl Ticker {
    /// 校验股票代码是否在白名单内（区分大小写）
    pub fn parse(symbol: &str) -> Option<Self> {
        AI_TICKERS
            .iter()
            .find(|allowed| **allowed == symbol)
            .map(|allowed| Ticker(*allowed))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// 行情快照
///
/// 每个字段为 None 表示数据源未提供，页面显示为 N/A
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct QuoteSnapshot {
    /// 股票代码
    pub symbol: String,
    /// 当前价格
    pub current_price: Option<f64>,
    /// 52 周最高价
    pub high_52w: Option<f64>,
    /// 52 周最低价
    pub low_52w: Option<f64>,
    /// 市值（十亿美元）
    pub market_cap: Option<f64>,
    /// 成交量
    pub volume: Option<u64>,
}

/// 单日收盘价
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricePoint {
    /// 交易日
    pub date: NaiveDate,
    /// 收盘价
    pub close: f64,
}

/// 一次行情请求的结果：快照加一年日线收盘价
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub quote: QuoteSnapshot,
    pub history: Vec<PricePoint>,
}

impl MarketData {
    /// 历史收盘价序列
    pub fn closes(&self) -> Vec<f64> {
        self.history.iter().map(|p| p.close).collect()
    }
}
