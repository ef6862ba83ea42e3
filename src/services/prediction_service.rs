//! 预测流程编排
//!
//! 表单校验 -> 行情与历史 -> 新闻 -> 走势图 -> 大模型预测，严格顺序执行。
//! 前四步任一失败都放弃整个请求；大模型失败只在预测面板降级提示。

use std::sync::Arc;

use anyhow::anyhow;

use crate::config::{ChartConfig, LlmConfig};
use crate::error::PredictionError;
use crate::models::{NewsItem, PageOutcome, PredictionForm, PredictionResults, Ticker};
use crate::services::chart::{render_price_chart, CHART_MIME};
use crate::services::llm::{CompletionClient, CompletionRequest};
use crate::services::markdown::render_markdown;
use crate::services::stock::MarketDataProvider;
use crate::services::summary::{build_prompt, news_summary, SeriesSummary};

/// 每次请求最多展示的新闻条数
pub const NEWS_LIMIT: usize = 5;

pub struct PredictionService {
    market: Arc<dyn MarketDataProvider>,
    llm: Arc<dyn CompletionClient>,
    llm_config: LlmConfig,
    chart_config: ChartConfig,
}

impl PredictionService {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        llm: Arc<dyn CompletionClient>,
        llm_config: LlmConfig,
        chart_config: ChartConfig,
    ) -> Self {
        Self {
            market,
            llm,
            llm_config,
            chart_config,
        }
    }

    /// 处理一次表单提交，返回页面应展示的结果
    pub async fn handle(&self, form: &PredictionForm) -> PageOutcome {
        match self.predict(form).await {
            Ok(results) => PageOutcome::Results(Box::new(results)),
            Err(PredictionError::MissingFields) => PageOutcome::Form {
                error: Some(PredictionError::MissingFields.user_message()),
            },
            Err(e @ PredictionError::InvalidTicker) => {
                log::warn!("拒绝无效的股票代码: {:?}", form.ticker);
                PageOutcome::Error(e.user_message())
            }
            Err(e) => {
                log::error!("预测请求失败: {}", e);
                PageOutcome::Error(e.user_message())
            }
        }
    }

    /// 执行完整的预测流程
    pub async fn predict(&self, form: &PredictionForm) -> Result<PredictionResults, PredictionError> {
        let (symbol, api_key) = form.required_fields().ok_or(PredictionError::MissingFields)?;
        let ticker = Ticker::parse(symbol).ok_or(PredictionError::InvalidTicker)?;

        log::info!("🔮 开始生成 {} 的预测", ticker);

        // 行情快照与一年历史
        let market = self
            .market
            .get_market_data(&ticker)
            .await
            .map_err(PredictionError::MarketData)?;
        if market.history.is_empty() {
            return Err(PredictionError::NoHistoricalData);
        }

        // 最近新闻
        let news: Vec<NewsItem> = self
            .market
            .get_news(&ticker, NEWS_LIMIT)
            .await
            .map_err(PredictionError::MarketData)?
            .into_iter()
            .take(NEWS_LIMIT)
            .map(NewsItem::from)
            .collect();

        // 走势图（CPU 密集，放到阻塞线程池）
        let history = market.history.clone();
        let (width, height) = (self.chart_config.width, self.chart_config.height);
        let chart_img = tokio::task::spawn_blocking(move || {
            render_price_chart(ticker.as_str(), &history, width, height)
        })
        .await
        .map_err(|e| PredictionError::Chart(anyhow!(e)))?
        .map_err(PredictionError::Chart)?;

        // 大模型预测
        let history_summary = SeriesSummary::describe(&market.closes())
            .map(|s| s.to_table())
            .unwrap_or_default();
        let prompt = build_prompt(&ticker, &history_summary, &news_summary(&news));
        let request = CompletionRequest {
            api_key: api_key.to_string(),
            model: self.llm_config.model.clone(),
            prompt,
            temperature: self.llm_config.temperature,
            max_tokens: self.llm_config.max_tokens,
        };

        let completion = self.llm.complete(request).await.and_then(|text| {
            if text.trim().is_empty() {
                Err(anyhow!("empty response from model"))
            } else {
                Ok(text)
            }
        });
        let (prediction_html, prediction_error) = match completion {
            Ok(text) => (Some(render_markdown(&text)), None),
            Err(e) => {
                log::warn!("⚠️ {} 预测生成失败，降级展示: {}", ticker, e);
                (None, Some(format!("Failed to generate prediction: {}", e)))
            }
        };

        log::info!("✅ {} 预测完成，新闻 {} 条", ticker, news.len());

        Ok(PredictionResults {
            ticker: ticker.to_string(),
            quote: market.quote,
            news,
            chart_img,
            chart_mime: CHART_MIME.to_string(),
            prediction_html,
            prediction_error,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{MarketData, PricePoint, QuoteSnapshot, RawNewsItem};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 行情数据源替身
    pub(crate) struct FakeMarket {
        pub history: Vec<PricePoint>,
        pub news: Vec<RawNewsItem>,
        pub fail: bool,
        pub fail_news: bool,
        pub calls: AtomicUsize,
    }

    impl FakeMarket {
        pub fn with_history(days: usize) -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
            Self {
                history: (0..days)
                    .map(|i| PricePoint {
                        date: start + chrono::Duration::days(i as i64),
                        close: 100.0 + i as f64,
                    })
                    .collect(),
                news: vec![
                    RawNewsItem {
                        title: Some("Nvidia unveils new AI chip".to_string()),
                        publisher: Some("Reuters".to_string()),
                        link: Some("https://example.com/nvda".to_string()),
                    },
                    RawNewsItem::default(),
                ],
                fail: false,
                fail_news: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for FakeMarket {
        async fn get_market_data(&self, ticker: &Ticker) -> Result<MarketData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("upstream unavailable"));
            }
            Ok(MarketData {
                quote: QuoteSnapshot {
                    symbol: ticker.to_string(),
                    current_price: Some(120.5),
                    high_52w: Some(140.76),
                    low_52w: Some(75.61),
                    market_cap: Some(2950.1234),
                    volume: Some(231514900),
                },
                history: self.history.clone(),
            })
        }

        async fn get_news(&self, _ticker: &Ticker, limit: usize) -> Result<Vec<RawNewsItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_news {
                return Err(anyhow!("news search unavailable"));
            }
            Ok(self.news.iter().take(limit).cloned().collect())
        }
    }

    /// 大模型替身
    pub(crate) struct FakeLlm {
        pub reply: std::result::Result<String, String>,
        pub calls: AtomicUsize,
        pub last_request: Mutex<Option<CompletionRequest>>,
    }

    impl FakeLlm {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for FakeLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);
            self.reply.clone().map_err(|e| anyhow!(e))
        }
    }

    pub(crate) fn service(market: Arc<FakeMarket>, llm: Arc<FakeLlm>) -> PredictionService {
        PredictionService::new(
            market,
            llm,
            LlmConfig::default(),
            ChartConfig { width: 640, height: 320 },
        )
    }

    fn form(ticker: Option<&str>, api_key: Option<&str>) -> PredictionForm {
        PredictionForm {
            ticker: ticker.map(|s| s.to_string()),
            api_key: api_key.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_successful_prediction() {
        let market = Arc::new(FakeMarket::with_history(30));
        let llm = Arc::new(FakeLlm::replying("## Trend\n- **Up** next month"));
        let svc = service(market.clone(), llm.clone());

        let results = svc.predict(&form(Some("NVDA"), Some("gsk_key"))).await.unwrap();

        assert_eq!(results.ticker, "NVDA");
        assert_eq!(results.quote.current_price, Some(120.5));
        assert_eq!(results.news.len(), 2);
        assert_eq!(results.news[1].title, "No title available");
        assert_eq!(results.news[1].link, "#");
        assert!(!results.chart_img.is_empty());
        assert_eq!(results.chart_mime, "image/svg+xml");
        assert_eq!(
            results.prediction_html.as_deref(),
            Some("<h2>Trend</h2><br><ul><li><strong>Up</strong> next month</li></ul>")
        );
        assert!(results.prediction_error.is_none());

        let request = llm.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.api_key, "gsk_key");
        assert_eq!(request.model, "llama-3.1-8b-instant");
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, 500);
        assert!(request.prompt.contains("data for NVDA"));
        assert!(request.prompt.contains("- Nvidia unveils new AI chip"));
        assert!(request.prompt.contains("count"));
    }

    #[tokio::test]
    async fn test_news_capped_at_five() {
        let mut fake = FakeMarket::with_history(5);
        fake.news = (0..8)
            .map(|i| RawNewsItem {
                title: Some(format!("headline {}", i)),
                ..Default::default()
            })
            .collect();
        let svc = service(Arc::new(fake), Arc::new(FakeLlm::replying("ok")));

        let results = svc.predict(&form(Some("AMD"), Some("k"))).await.unwrap();
        assert_eq!(results.news.len(), NEWS_LIMIT);
        assert_eq!(results.news[4].title, "headline 4");
    }

    #[tokio::test]
    async fn test_invalid_ticker_makes_no_external_calls() {
        let market = Arc::new(FakeMarket::with_history(30));
        let llm = Arc::new(FakeLlm::replying("unused"));
        let svc = service(market.clone(), llm.clone());

        let err = svc.predict(&form(Some("IBM"), Some("k"))).await.unwrap_err();
        assert!(matches!(err, PredictionError::InvalidTicker));
        assert_eq!(market.calls.load(Ordering::SeqCst), 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        match svc.handle(&form(Some("IBM"), Some("k"))).await {
            PageOutcome::Error(message) => assert_eq!(message, "Error: Invalid ticker selected."),
            other => panic!("期望错误页，实际: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_fields_returns_form() {
        let market = Arc::new(FakeMarket::with_history(30));
        let llm = Arc::new(FakeLlm::replying("unused"));
        let svc = service(market.clone(), llm.clone());

        for f in [form(None, Some("k")), form(Some("NVDA"), None), form(Some("NVDA"), Some(""))] {
            match svc.handle(&f).await {
                PageOutcome::Form { error } => {
                    assert_eq!(error.as_deref(), Some("Please provide both ticker and API key."))
                }
                other => panic!("期望表单页，实际: {:?}", other),
            }
        }
        assert_eq!(market.calls.load(Ordering::SeqCst), 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_history_is_fatal() {
        let market = Arc::new(FakeMarket::with_history(0));
        let llm = Arc::new(FakeLlm::replying("unused"));
        let svc = service(market.clone(), llm.clone());

        match svc.handle(&form(Some("TSLA"), Some("k"))).await {
            PageOutcome::Error(message) => {
                assert_eq!(message, "Error: No historical data found for this ticker.")
            }
            other => panic!("期望错误页，实际: {:?}", other),
        }
        // 只调用了行情接口，新闻与大模型都未调用
        assert_eq!(market.calls.load(Ordering::SeqCst), 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_market_failure_is_fatal() {
        let mut fake = FakeMarket::with_history(30);
        fake.fail = true;
        let llm = Arc::new(FakeLlm::replying("unused"));
        let svc = service(Arc::new(fake), llm.clone());

        match svc.handle(&form(Some("AAPL"), Some("k"))).await {
            PageOutcome::Error(message) => assert_eq!(message, "Error: upstream unavailable"),
            other => panic!("期望错误页，实际: {:?}", other),
        }
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_news_failure_is_fatal() {
        let mut fake = FakeMarket::with_history(30);
        fake.fail_news = true;
        let market = Arc::new(fake);
        let llm = Arc::new(FakeLlm::replying("unused"));
        let svc = service(market.clone(), llm.clone());

        match svc.handle(&form(Some("GOOGL"), Some("k"))).await {
            PageOutcome::Error(message) => assert_eq!(message, "Error: news search unavailable"),
            other => panic!("期望错误页，实际: {:?}", other),
        }
        // 行情与新闻各调用一次，大模型未调用
        assert_eq!(market.calls.load(Ordering::SeqCst), 2);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_llm_reply_degrades() {
        let market = Arc::new(FakeMarket::with_history(30));
        let llm = Arc::new(FakeLlm::replying(" \n  "));
        let svc = service(market, llm);

        let results = svc.predict(&form(Some("NVDA"), Some("k"))).await.unwrap();
        assert!(results.prediction_html.is_none());
        assert_eq!(
            results.prediction_error.as_deref(),
            Some("Failed to generate prediction: empty response from model")
        );
    }

    #[tokio::test]
    async fn test_llm_failure_degrades() {
        let market = Arc::new(FakeMarket::with_history(30));
        let llm = Arc::new(FakeLlm::failing("HTTP 401 Unauthorized: Invalid API Key"));
        let svc = service(market, llm);

        let results = svc.predict(&form(Some("MSFT"), Some("bad"))).await.unwrap();
        assert_eq!(results.quote.current_price, Some(120.5));
        assert!(!results.chart_img.is_empty());
        assert_eq!(results.news.len(), 2);
        assert!(results.prediction_html.is_none());
        assert_eq!(
            results.prediction_error.as_deref(),
            Some("Failed to generate prediction: HTTP 401 Unauthorized: Invalid API Key")
        );
    }
}
