//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，所有字段都有默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 行情数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceConfig {
    /// 行情与报价接口地址
    #[serde(default = "default_quote_base_url")]
    pub quote_base_url: String,
    /// 新闻搜索接口地址
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    /// 获取 crumb 前用来取 cookie 的地址
    #[serde(default = "default_crumb_cookie_url")]
    pub crumb_cookie_url: String,
    /// 请求头 User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 大模型接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI 兼容接口地址
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,
    /// 采样温度
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// 最大输出 token 数
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// 走势图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

/// 页面展示配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// 页脚时间使用的时区（IANA 名称）
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 配置来源
#[derive(Debug)]
pub enum ConfigSource {
    /// 从文件加载，`failures` 为之前尝试失败的文件
    File { path: &'static str, failures: Vec<String> },
    /// 使用默认配置
    Default { failures: Vec<String> },
}

impl ConfigSource {
    /// 记录配置加载结果
    pub fn log(&self) {
        let failures = match self {
            ConfigSource::File { path, failures } => {
                log::info!("从 {} 加载配置成功", path);
                failures
            }
            ConfigSource::Default { failures } => {
                log::info!("使用默认配置");
                failures
            }
        };
        for failure in failures {
            log::warn!("加载配置文件失败 {}", failure);
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub finance: FinanceConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5000 }
fn default_quote_base_url() -> String { "https://query1.finance.yahoo.com".to_string() }
fn default_search_base_url() -> String { "https://query2.finance.yahoo.com".to_string() }
fn default_crumb_cookie_url() -> String { "https://fc.yahoo.com".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_llm_base_url() -> String { "https://api.groq.com/openai/v1".to_string() }
fn default_model() -> String { "llama-3.1-8b-instant".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 500 }
fn default_llm_timeout() -> u64 { 60 }
fn default_chart_width() -> u32 { 1000 }
fn default_chart_height() -> u32 { 500 }
fn default_timezone() -> String { "America/New_York".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            quote_base_url: default_quote_base_url(),
            search_base_url: default_search_base_url(),
            crumb_cookie_url: default_crumb_cookie_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 调用时日志系统尚未初始化，加载过程通过 [`ConfigSource`] 返回给调用方记录
    pub fn load() -> (Self, ConfigSource) {
        let config_paths = ["config.json", "config/config.json"];
        let mut failures = Vec::new();

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => return (config, ConfigSource::File { path, failures }),
                    Err(e) => failures.push(format!("{}: {}", path, e)),
                }
            }
        }

        (Self::default(), ConfigSource::Default { failures })
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 解析页脚时区，无效时回退到美东时间
    pub fn display_timezone(&self) -> chrono_tz::Tz {
        self.display.timezone.parse().unwrap_or_else(|_| {
            log::warn!("无效的时区配置 {}，使用 America/New_York", self.display.timezone);
            chrono_tz::America::New_York
        })
    }
}
