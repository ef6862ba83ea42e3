//! 股票数据服务模块
//!
//! 定义行情数据源接口，默认实现对接 Yahoo Finance

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MarketData, RawNewsItem, Ticker};

pub use yahoo::YahooFinanceClient;

/// 行情数据源
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 获取行情快照与一年日线收盘价
    async fn get_market_data(&self, ticker: &Ticker) -> Result<MarketData>;

    /// 获取最近新闻，最多 `limit` 条
    async fn get_news(&self, ticker: &Ticker, limit: usize) -> Result<Vec<RawNewsItem>>;
}
