//! LLM 客户端抽象
//!
//! 所有后端（Claude / Gemini / Mock）实现 LlmClient：complete 负责一次请求；
//! generate / generate_json 是在其上的统一约定（单条 user prompt + 可选 system）。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::llm::{parse_json_response, with_json_instruction, Message, Provider};

/// 一次生成的结果
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    /// (prompt_tokens, completion_tokens)，后端不返回时为 None
    pub usage: Option<(u64, u64)>,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 该客户端代表的后端
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// 文本生成：可选 system + 单条 user prompt
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<LlmResponse, AgentError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));
        self.complete(&messages).await
    }

    /// JSON 生成：追加 JSON-only 指令，剥离代码块后解析
    async fn generate_json(&self, prompt: &str, system: Option<&str>) -> Result<Value, AgentError> {
        let system = with_json_instruction(system);
        let response = self.generate(prompt, Some(&system)).await?;
        parse_json_response(&response.content)
    }

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
