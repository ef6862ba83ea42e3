pub mod predict;
pub mod health;

use actix_web::web;

use crate::services::prediction_service::PredictionService;
use crate::views::PageRenderer;

/// 所有请求共享的只读状态
pub struct AppState {
    pub predictor: PredictionService,
    pub pages: PageRenderer,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config)
        .configure(predict::config);
}
