//! 大模型服务模块
//!
//! 定义文本补全接口，默认实现对接 Groq（OpenAI 兼容接口）

pub mod groq;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

pub use groq::GroqClient;

/// 一次文本补全请求
#[derive(Clone)]
pub struct CompletionRequest {
    /// 调用方提供的 API Key，不落盘、不打印
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 提示词
    pub prompt: String,
    /// 采样温度
    pub temperature: f32,
    /// 最大输出 token 数
    pub max_tokens: u32,
}

// API Key 不出现在调试输出中
impl fmt::Debug for CompletionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("prompt_len", &self.prompt.len())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// 文本补全客户端
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 返回模型生成的文本（已去除首尾空白）
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
