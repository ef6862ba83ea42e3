//! 页面渲染
//!
//! 单一模板 `templates/index.html`，根据结果展示表单、错误提示或预测结果。
//! 模板开启 HTML 自动转义，只有预测 HTML 以 `safe` 原样输出。

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use minijinja::{context, Environment, Value};

use crate::models::{PageOutcome, AI_TICKERS};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// 页面渲染器，启动时构建一次，所有请求共享
pub struct PageRenderer {
    env: Environment<'static>,
    timezone: Tz,
}

impl PageRenderer {
    pub fn new(timezone: Tz) -> Result<Self> {
        let mut env = Environment::new();
        env.add_filter("floatformat", floatformat);
        env.add_filter("intcomma", intcomma);
        env.add_template("index.html", INDEX_TEMPLATE)
            .context("加载页面模板失败")?;

        Ok(Self { env, timezone })
    }

    /// 渲染页面，`selected` 为表单中回显的股票代码
    pub fn render(&self, outcome: &PageOutcome, selected: Option<&str>) -> Result<String> {
        let (error, results) = match outcome {
            PageOutcome::Form { error } => (error.clone(), None),
            PageOutcome::Error(message) => (Some(message.clone()), None),
            PageOutcome::Results(results) => (None, Some(results.as_ref())),
        };

        let template = self.env.get_template("index.html")?;
        let html = template
            .render(context! {
                tickers => AI_TICKERS,
                selected_ticker => selected,
                current_time => get_market_time(self.timezone),
                error => error,
                results => results,
            })
            .context("渲染页面失败")?;

        Ok(html)
    }
}

/// 获取页脚展示的市场时间
fn get_market_time(timezone: Tz) -> String {
    Utc::now()
        .with_timezone(&timezone)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn as_number(value: &Value) -> Option<f64> {
    if value.is_none() || value.is_undefined() {
        return None;
    }
    f64::try_from(value.clone()).ok()
}

/// 保留指定小数位，缺失显示 N/A
///
/// 输出只含数字、`.`、`-` 与 `N/A`，标记为安全以免 `/` 被转义
fn floatformat(value: Value, precision: Option<usize>) -> Value {
    Value::from_safe_string(format_float(as_number(&value), precision.unwrap_or(2)))
}

/// 千分位整数，缺失显示 N/A
fn intcomma(value: Value) -> Value {
    Value::from_safe_string(format_intcomma(as_number(&value)))
}

pub fn format_float(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", precision, v),
        _ => "N/A".to_string(),
    }
}

pub fn format_intcomma(value: Option<f64>) -> String {
    let v = match value {
        Some(v) if v.is_finite() => v.trunc() as i64,
        _ => return "N/A".to_string(),
    };

    let digits = v.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsItem, PredictionResults, QuoteSnapshot};

    fn renderer() -> PageRenderer {
        PageRenderer::new(chrono_tz::America::New_York).unwrap()
    }

    fn results() -> PredictionResults {
        PredictionResults {
            ticker: "NVDA".to_string(),
            quote: QuoteSnapshot {
                symbol: "NVDA".to_string(),
                current_price: Some(120.456),
                high_52w: Some(140.76),
                low_52w: None,
                market_cap: Some(2950.1234),
                volume: Some(231514900),
            },
            news: vec![NewsItem {
                title: "Chips <rally>".to_string(),
                publisher: "Reuters".to_string(),
                link: "#".to_string(),
            }],
            chart_img: "PHN2Zz48L3N2Zz4=".to_string(),
            chart_mime: "image/svg+xml".to_string(),
            prediction_html: Some("<h2>Trend</h2><br><ul><li>up</li></ul>".to_string()),
            prediction_error: None,
        }
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(Some(120.456), 2), "120.46");
        assert_eq!(format_float(Some(3.0), 2), "3.00");
        assert_eq!(format_float(None, 2), "N/A");
        assert_eq!(format_float(Some(f64::NAN), 2), "N/A");
    }

    #[test]
    fn test_format_intcomma() {
        assert_eq!(format_intcomma(Some(231514900.0)), "231,514,900");
        assert_eq!(format_intcomma(Some(999.0)), "999");
        assert_eq!(format_intcomma(Some(1000.0)), "1,000");
        assert_eq!(format_intcomma(Some(-1234567.8)), "-1,234,567");
        assert_eq!(format_intcomma(Some(0.0)), "0");
        assert_eq!(format_intcomma(None), "N/A");
    }

    #[test]
    fn test_render_form() {
        let html = renderer().render(&PageOutcome::Form { error: None }, None).unwrap();
        for ticker in AI_TICKERS {
            assert!(html.contains(&format!("<option value=\"{}\">", ticker)), "缺少 {}", ticker);
        }
        assert!(!html.contains("alert-danger"));
        assert!(!html.contains("Market Overview"));
        assert!(html.contains("Last updated:"));
    }

    #[test]
    fn test_render_form_keeps_selection_and_error() {
        let outcome = PageOutcome::Form {
            error: Some("Please provide both ticker and API key.".to_string()),
        };
        let html = renderer().render(&outcome, Some("AMD")).unwrap();
        assert!(html.contains("<option value=\"AMD\" selected>"));
        assert!(html.contains("Please provide both ticker and API key."));
    }

    #[test]
    fn test_render_error() {
        let outcome = PageOutcome::Error("Error: Invalid ticker selected.".to_string());
        let html = renderer().render(&outcome, None).unwrap();
        assert!(html.contains("Error: Invalid ticker selected."));
        assert!(!html.contains("Generated AI Prediction"));
    }

    #[test]
    fn test_render_results() {
        let outcome = PageOutcome::Results(Box::new(results()));
        let html = renderer().render(&outcome, Some("NVDA")).unwrap();

        assert!(html.contains("AI-Powered Prediction for NVDA"));
        assert!(html.contains("<strong>Current Price:</strong> 120.46"));
        assert!(html.contains("<strong>52-Week Low:</strong> N/A"));
        assert!(html.contains("<strong>Market Cap:</strong> 2950.12B"));
        assert!(html.contains("<strong>Volume:</strong> 231,514,900"));
        assert!(html.contains(";base64,PHN2Zz48L3N2Zz4="));
        // 预测 HTML 原样输出，新闻标题被转义
        assert!(html.contains("<h2>Trend</h2><br><ul><li>up</li></ul>"));
        assert!(html.contains("Chips &lt;rally&gt;"));
        assert!(html.contains("(Reuters)"));
        assert!(html.contains("Regenerate"));
    }

    #[test]
    fn test_render_degraded_prediction_is_escaped() {
        let mut degraded = results();
        degraded.prediction_html = None;
        degraded.prediction_error = Some("Failed to generate prediction: <b>401</b>".to_string());
        let html = renderer().render(&PageOutcome::Results(Box::new(degraded)), None).unwrap();

        assert!(html.contains("Failed to generate prediction: &lt;b&gt;401&lt;&#x2f;b&gt;"));
        assert!(html.contains("Market Overview"));
        assert!(html.contains("Chips &lt;rally&gt;"));
    }

    #[test]
    fn test_render_missing_quote_fields() {
        let mut sparse = results();
        sparse.quote = QuoteSnapshot {
            symbol: "INTC".to_string(),
            ..Default::default()
        };
        let html = renderer().render(&PageOutcome::Results(Box::new(sparse)), None).unwrap();

        assert!(html.contains("<strong>Current Price:</strong> N/A"));
        assert!(html.contains("<strong>52-Week High:</strong> N/A"));
        assert!(html.contains("<strong>Market Cap:</strong> N/A</li>"));
        assert!(html.contains("<strong>Volume:</strong> N/A"));
        assert!(!html.contains("N&#x2f;A"));
        assert!(!html.contains("N/AB"));
    }

    #[test]
    fn test_render_without_prediction_text() {
        let mut blank = results();
        blank.prediction_html = None;
        blank.prediction_error = None;
        let html = renderer().render(&PageOutcome::Results(Box::new(blank)), None).unwrap();

        assert!(html.contains("Generated AI Prediction"));
        assert!(!html.contains("text-danger"));
        assert!(!html.to_lowercase().contains(">none<"));
    }

    #[test]
    fn test_render_without_news() {
        let mut empty = results();
        empty.news.clear();
        let html = renderer().render(&PageOutcome::Results(Box::new(empty)), None).unwrap();
        assert!(html.contains("No recent news available."));
    }
}
