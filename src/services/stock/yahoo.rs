//! Yahoo Finance 接口实现
//!
//! - 日线与行情快照: /v8/finance/chart/{symbol}
//! - 市值等报价字段: /v10/finance/quoteSummary/{symbol}（需要 cookie + crumb，尽力而为，失败时只记录警告）
//! - 新闻: /v1/finance/search

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use super::MarketDataProvider;
use crate::config::FinanceConfig;
use crate::models::{MarketData, PricePoint, QuoteSnapshot, RawNewsItem, Ticker};

/// quoteSummary 接口的鉴权信息
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

/// Yahoo Finance 客户端
pub struct YahooFinanceClient {
    /// HTTP 客户端
    client: Client,
    config: FinanceConfig,
    /// 缓存的 crumb，401 时清空重新获取
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooFinanceClient {
    pub fn new(config: FinanceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .gzip(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            config,
            crumb: RwLock::new(None),
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        log::debug!("📡 请求 Yahoo Finance URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::REFERER, "https://finance.yahoo.com/")
            .send()
            .await
            .with_context(|| format!("请求 {} 失败", url.path()))?;

        if !response.status().is_success() {
            return Err(anyhow!("获取行情数据失败: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    /// 一年日线及 meta 中的快照字段
    async fn fetch_chart(&self, symbol: &str) -> Result<MarketData> {
        let mut url = endpoint(&self.config.quote_base_url, &["v8", "finance", "chart", symbol])?;
        url.query_pairs_mut()
            .append_pair("range", "1y")
            .append_pair("interval", "1d");

        let json = self.get_json(url).await?;
        parse_chart(&json, symbol)
    }

    /// 获取 crumb，优先使用缓存
    async fn ensure_crumb(&self) -> Result<CrumbData> {
        let cached = self.crumb.read().await.clone();
        if let Some(crumb) = cached {
            return Ok(crumb);
        }

        let crumb = self.fetch_crumb().await?;
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    /// cookie 换 crumb
    async fn fetch_crumb(&self) -> Result<CrumbData> {
        // 该地址返回 404，只需要响应里的 Set-Cookie
        let response = self
            .client
            .get(&self.config.crumb_cookie_url)
            .send()
            .await
            .context("获取 Yahoo cookie 失败")?;
        let cookie = cookie_from_headers(response.headers())
            .ok_or_else(|| anyhow!("Yahoo 响应中没有 cookie"))?;

        let url = endpoint(&self.config.quote_base_url, &["v1", "test", "getcrumb"])?;
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .context("获取 Yahoo crumb 失败")?;
        if !response.status().is_success() {
            return Err(anyhow!("获取 Yahoo crumb 失败: {}", response.status()));
        }

        let crumb = parse_crumb(&response.text().await?)?;
        log::debug!("🔑 获取 Yahoo crumb 成功");
        Ok(CrumbData { cookie, crumb })
    }

    /// quoteSummary 报价（含市值），crumb 过期时重试一次
    async fn fetch_quote_summary(&self, symbol: &str) -> Result<QuoteSummaryResponse> {
        for _ in 0..2 {
            let crumb = self.ensure_crumb().await?;
            let url = quote_summary_url(&self.config.quote_base_url, symbol, &crumb.crumb)?;

            let response = self
                .client
                .get(url)
                .header(header::COOKIE, &crumb.cookie)
                .header(header::REFERER, "https://finance.yahoo.com/")
                .send()
                .await
                .with_context(|| format!("请求 {} 报价失败", symbol))?;

            if response.status() == StatusCode::UNAUTHORIZED {
                log::debug!("Yahoo crumb 已失效，重新获取");
                *self.crumb.write().await = None;
                continue;
            }
            if !response.status().is_success() {
                return Err(anyhow!("获取报价数据失败: {}", response.status()));
            }

            return response.json().await.context("解析报价数据失败");
        }

        Err(anyhow!("Yahoo 鉴权失败"))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn get_market_data(&self, ticker: &Ticker) -> Result<MarketData> {
        let symbol = ticker.as_str();
        let mut data = self.fetch_chart(symbol).await?;

        let applied = self
            .fetch_quote_summary(symbol)
            .await
            .and_then(|summary| apply_quote_summary(summary, &mut data.quote));
        if let Err(e) = applied {
            log::warn!("获取 {} 报价数据失败，市值不可用: {:#}", symbol, e);
        }

        log::info!("📈 {} 获取到 {} 条日线数据", symbol, data.history.len());
        Ok(data)
    }

    async fn get_news(&self, ticker: &Ticker, limit: usize) -> Result<Vec<RawNewsItem>> {
        let mut url = endpoint(&self.config.search_base_url, &["v1", "finance", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", ticker.as_str())
            .append_pair("quotesCount", "0")
            .append_pair("newsCount", &limit.to_string());

        let json = self.get_json(url).await?;
        Ok(parse_news(&json, limit))
    }
}

/// 拼接接口地址
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("无效的接口地址: {}", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("无效的接口地址: {}", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 解析 chart 接口
///
/// 格式: {"chart":{"result":[{"meta":{...},"timestamp":[...],"indicators":{"quote":[{"close":[...]}]}}],"error":null}}
fn parse_chart(json: &Value, symbol: &str) -> Result<MarketData> {
    let chart = &json["chart"];
    if let Some(desc) = chart["error"]["description"].as_str() {
        return Err(anyhow!("获取 {} 行情失败: {}", symbol, desc));
    }

    let result = chart["result"]
        .get(0)
        .ok_or_else(|| anyhow!("{} 行情数据为空", symbol))?;
    let meta = &result["meta"];

    let quote = QuoteSnapshot {
        symbol: symbol.to_string(),
        current_price: meta["regularMarketPrice"].as_f64(),
        high_52w: meta["fiftyTwoWeekHigh"].as_f64(),
        low_52w: meta["fiftyTwoWeekLow"].as_f64(),
        market_cap: None,
        volume: meta["regularMarketVolume"].as_u64(),
    };

    // 交易日按交易所时区换算
    let gmt_offset = meta["gmtoffset"].as_i64().unwrap_or(0);
    let empty = Vec::new();
    let timestamps = result["timestamp"].as_array().unwrap_or(&empty);
    let closes = result["indicators"]["quote"][0]["close"]
        .as_array()
        .unwrap_or(&empty);

    let history = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let close = close.as_f64()?;
            let date = DateTime::from_timestamp(ts.as_i64()? + gmt_offset, 0)?.date_naive();
            Some(PricePoint { date, close })
        })
        .collect();

    Ok(MarketData { quote, history })
}

/// quoteSummary 地址
fn quote_summary_url(base: &str, symbol: &str, crumb: &str) -> Result<Url> {
    let mut url = endpoint(base, &["v10", "finance", "quoteSummary", symbol])?;
    url.query_pairs_mut()
        .append_pair("modules", "price,summaryDetail")
        .append_pair("crumb", crumb);
    Ok(url)
}

/// 取每个 Set-Cookie 的 name=value 部分
fn cookie_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies: Vec<&str> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .filter_map(|s| s.split(';').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

/// getcrumb 返回纯文本；限流时返回 "Too Many Requests" 之类的提示
fn parse_crumb(body: &str) -> Result<String> {
    let crumb = body.trim();
    if crumb.is_empty() || crumb.starts_with('<') || crumb.contains(char::is_whitespace) {
        let preview: String = crumb.chars().take(40).collect();
        return Err(anyhow!("无效的 Yahoo crumb: {}", preview));
    }
    Ok(crumb.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<RawNumber>,
    regular_market_volume: Option<RawNumber>,
    market_cap: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    fifty_two_week_high: Option<RawNumber>,
    fifty_two_week_low: Option<RawNumber>,
    market_cap: Option<RawNumber>,
}

/// 格式: {"raw": 120.5, "fmt": "120.50"}，缺失时为 {}
#[derive(Debug, Default, Deserialize)]
struct RawNumber {
    raw: Option<f64>,
}

fn raw(value: &Option<RawNumber>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// 用 quoteSummary 的字段补全快照
///
/// 格式: {"quoteSummary":{"result":[{"price":{..},"summaryDetail":{..}}],"error":null}}
fn apply_quote_summary(response: QuoteSummaryResponse, quote: &mut QuoteSnapshot) -> Result<()> {
    let summary = response.quote_summary;
    if let Some(desc) = summary.error.as_ref().and_then(|e| e["description"].as_str()) {
        return Err(anyhow!("报价接口返回错误: {}", desc));
    }

    let result = summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("报价数据为空"))?;
    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();

    if let Some(current) = raw(&price.regular_market_price) {
        quote.current_price = Some(current);
    }
    if let Some(volume) = raw(&price.regular_market_volume).filter(|v| *v >= 0.0) {
        quote.volume = Some(volume as u64);
    }
    if let Some(high) = raw(&detail.fifty_two_week_high) {
        quote.high_52w = Some(high);
    }
    if let Some(low) = raw(&detail.fifty_two_week_low) {
        quote.low_52w = Some(low);
    }
    // 市值为 0 视为缺失
    quote.market_cap = raw(&price.market_cap)
        .or_else(|| raw(&detail.market_cap))
        .filter(|cap| *cap > 0.0)
        .map(|cap| cap / 1e9);

    Ok(())
}

/// 解析新闻搜索结果
fn parse_news(json: &Value, limit: usize) -> Vec<RawNewsItem> {
    let text = |v: &Value| v.as_str().map(|s| s.to_string());

    json["news"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .take(limit)
                .map(|item| RawNewsItem {
                    title: text(&item["title"]),
                    publisher: text(&item["publisher"]),
                    link: text(&item["link"]),
                })
                .collect()
        })
        .unwrap_or_default()
}
