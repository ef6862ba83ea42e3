//! 提示词构建
//!
//! 收盘价分布统计、新闻标题汇总以及发送给大模型的提示词模板

use std::fmt::Write as _;

use crate::models::{NewsItem, Ticker};

/// 收盘价分布统计（与 pandas `describe()` 口径一致）
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    /// 样本标准差（n-1）
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl SeriesSummary {
    /// 计算统计量，空序列返回 None
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.50),
            p75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }

    /// 渲染为 "名称 数值" 的多行文本
    pub fn to_table(&self) -> String {
        let rows = [
            ("count", self.count as f64),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.p25),
            ("50%", self.p50),
            ("75%", self.p75),
            ("max", self.max),
        ];

        let mut table = String::new();
        for (i, (name, value)) in rows.iter().enumerate() {
            if i > 0 {
                table.push('\n');
            }
            let _ = write!(table, "{:<6}{:>14.6}", name, value);
        }
        table
    }
}

/// 线性插值分位数，`sorted` 必须已升序且非空
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// 新闻标题汇总
pub fn news_summary(news: &[NewsItem]) -> String {
    if news.is_empty() {
        return "No recent news available.".to_string();
    }
    news.iter()
        .map(|n| format!("- {}", n.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 构建预测提示词
pub fn build_prompt(ticker: &Ticker, history_summary: &str, news_summary: &str) -> String {
    format!(
        "You are a stock market analyst. Based on the following data for {ticker}:\n\
         \n\
         Historical price summary (1 year):\n\
         {history_summary}\n\
         \n\
         Recent news:\n\
         {news_summary}\n\
         \n\
         Predict the stock price trend for the next month. Provide a reasoned analysis and a predicted price range.\n\
         Note: This is for educational purposes only and not financial advice.\n\
         Format your response with markdown-style headings (e.g., ## Section Title) and use asterisks (*) for emphasis where needed. \
         Use lists for recommendations or key points.\n\
         Suggested sections: ## Stock Market Analysis, ## Recent News Summary, ## Predicted Stock Price Trend, ## Note"
    )
}
