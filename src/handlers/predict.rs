//! 预测页面处理器
//!
//! - GET / - 展示表单
//! - POST / - 提交表单（ticker、api_key），返回表单/错误/结果页面

use actix_web::{web, HttpResponse, Result};

use super::AppState;
use crate::models::{PageOutcome, PredictionForm};

/// 展示空表单
///
/// GET /
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render_page(&state, &PageOutcome::Form { error: None }, None))
}

/// 处理表单提交
///
/// POST /
pub async fn submit(
    state: web::Data<AppState>,
    form: web::Form<PredictionForm>,
) -> Result<HttpResponse> {
    let outcome = state.predictor.handle(&form).await;
    Ok(render_page(&state, &outcome, form.ticker.as_deref()))
}

fn render_page(state: &AppState, outcome: &PageOutcome, selected: Option<&str>) -> HttpResponse {
    match state.pages.render(outcome, selected) {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            log::error!("页面渲染失败: {:#}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("Failed to render page")
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().to(submit)),
    );
}
