//! 健康检查
//!
//! - GET /health - 服务存活状态，不访问任何外部接口

use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::models::{ApiResponse, AI_TICKERS};

/// 健康检查结果
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// 可预测的股票代码数量
    pub tickers: usize,
}

pub async fn health_check() -> Result<HttpResponse> {
    let status = HealthStatus {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        tickers: AI_TICKERS.len(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
