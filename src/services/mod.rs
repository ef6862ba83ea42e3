//! 业务逻辑服务模块
//!
//! 封装数据获取、图表、提示词与预测流程

pub mod chart;              // 走势图
pub mod llm;                // 大模型接口
pub mod markdown;           // 预测文本格式化
pub mod prediction_service; // 预测流程编排
pub mod stock;              // 行情数据源
pub mod summary;            // 统计摘要与提示词
