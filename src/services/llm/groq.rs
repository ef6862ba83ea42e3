//! Groq 文本补全实现
//!
//! 对接 OpenAI 兼容的 `POST {base_url}/chat/completions`

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionRequest};
use crate::config::LlmConfig;

pub struct GroqClient {
    client: Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        log::debug!("📡 请求大模型 {} 模型: {}", self.base_url, request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&request.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("HTTP {}: {}", status, upstream_error_message(&text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("解析大模型响应失败: {}", e))?;

        extract_content(parsed)
    }
}

/// 取第一个候选的文本
fn extract_content(response: ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("大模型响应中没有候选结果"))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| anyhow!("大模型响应内容为空"))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(anyhow!("大模型响应内容为空"));
    }
    Ok(content.to_string())
}

/// 优先取 `{"error":{"message":..}}` 中的描述，否则返回原始文本
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.to_string())
}
