//! AI 股票预测服务
//!
//! 单页表单：选择股票代码并填写 Groq API Key，
//! 获取 Yahoo Finance 行情、新闻与一年走势图，再由大模型生成走势分析

mod config;     // 配置加载
mod error;      // 请求错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod views;      // 页面渲染

use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::services::llm::GroqClient;
use crate::services::prediction_service::PredictionService;
use crate::services::stock::YahooFinanceClient;
use crate::views::PageRenderer;

/// 应用程序入口
#[actix_web::main]
async fn main() -> io::Result<()> {
    let (config, source) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    source.log();

    let state = build_state(&config).map_err(|e| io::Error::other(format!("{:#}", e)))?;
    let state = web::Data::new(state);

    let addr = config.bind_addr();
    log::info!("启动 AI 股票预测服务，监听 {}", addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 请求日志（表单内容不会被记录）
            .app_data(state.clone())
            .configure(handlers::config)
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(addr)?.run().await
}

/// 构建所有请求共享的服务实例
fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let market = Arc::new(YahooFinanceClient::new(config.finance.clone())?);
    let llm = Arc::new(GroqClient::new(&config.llm)?);

    Ok(AppState {
        predictor: PredictionService::new(market, llm, config.llm.clone(), config.chart.clone()),
        pages: PageRenderer::new(config.display_timezone())?,
    })
}
