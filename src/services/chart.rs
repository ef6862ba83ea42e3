//! 收盘价走势图
//!
//! 使用 plotters 的 SVG 后端在内存中绘制，输出 base64 供页面内联

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use plotters::prelude::*;

use crate::models::PricePoint;

/// 内联图片的 MIME 类型
pub const CHART_MIME: &str = "image/svg+xml";

/// 折线颜色 #007bff
const LINE_COLOR: RGBColor = RGBColor(0, 123, 255);
const GRID_COLOR: RGBColor = RGBColor(220, 220, 220);

/// 绘制一年收盘价折线图，返回 base64 编码的 SVG
pub fn render_price_chart(symbol: &str, history: &[PricePoint], width: u32, height: u32) -> Result<String> {
    if history.is_empty() {
        return Err(anyhow!("没有可绘制的历史数据"));
    }

    let svg = draw_svg(symbol, history, (width, height)).map_err(|e| anyhow!("绘制走势图失败: {}", e))?;
    Ok(STANDARD.encode(svg.as_bytes()))
}

fn draw_svg(
    symbol: &str,
    history: &[PricePoint],
    size: (u32, u32),
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let (y_min, y_max) = price_bounds(history);
    let x_max = (history.len().saturating_sub(1)).max(1) as f64;
    let label_date = |x: &f64| {
        history
            .get(x.round().max(0.0) as usize)
            .map(|p| p.date.format("%Y-%m").to_string())
            .unwrap_or_default()
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} 1-Year Price History", symbol), ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price ($)")
            .x_labels(8)
            .x_label_formatter(&label_date)
            .y_label_formatter(&|y| format!("{:.0}", y))
            .light_line_style(&GRID_COLOR)
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                history.iter().enumerate().map(|(i, p)| (i as f64, p.close)),
                LINE_COLOR.stroke_width(2),
            ))?
            .label("Close Price")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_COLOR.stroke_width(2)));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(svg)
}

/// y 轴范围，上下各留 5% 空白
fn price_bounds(history: &[PricePoint]) -> (f64, f64) {
    let (min, max) = history
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.close), hi.max(p.close)));

    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}
