//! 流水线错误类型
//!
//! ConfigError 在任何阶段开始前终止运行；GenerationFailed / JsonParseError 传播给调用的 Agent
//!（仅 Design Agent 的默认设计回退例外）。不做重试。

use thiserror::Error;

use crate::llm::Provider;

/// Agent 运行过程中可能出现的错误（配置、生成、解析、校验、文件输出）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Generation failed ({provider}): {message}")]
    GenerationFailed { provider: Provider, message: String },

    /// 保留原始响应文本
    #[error("JSON parse error: {message}\nraw response: {raw}")]
    JsonParseError { message: String, raw: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AgentError {
    pub fn generation(provider: Provider, message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            provider,
            message: message.into(),
        }
    }

    /// 是否为配置错误（缺少凭据）
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }
}
