//! Claude / Gemini 客户端工厂（均为 OpenAI 兼容格式）
//!
//! - Claude: https://api.anthropic.com/v1/ ，负责逻辑类任务
//! - Gemini: https://generativelanguage.googleapis.com/v1beta/openai/ ，负责视觉类任务

use std::time::Duration;

use crate::config::{AppConfig, ProviderSection};
use crate::core::AgentError;
use crate::llm::{OpenAiClient, Provider};

pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com/v1/";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

fn build_client(
    provider: Provider,
    section: &ProviderSection,
    default_base: &str,
    timeout_secs: u64,
) -> Result<OpenAiClient, AgentError> {
    let api_key = section.api_key().ok_or_else(|| {
        AgentError::ConfigError(format!(
            "{} is not set (required by the {} provider)",
            section.api_key_env, provider
        ))
    })?;
    let base_url = section.base_url.as_deref().unwrap_or(default_base);

    tracing::info!("Using {} LLM ({})", provider, section.model);
    Ok(OpenAiClient::new(provider, base_url, &section.model, &api_key)
        .with_max_tokens(section.max_tokens)
        .with_temperature(section.temperature)
        .with_timeout(Duration::from_secs(timeout_secs)))
}

/// 创建 Claude 客户端；Key 从 `[llm.claude].api_key_env` 指定的环境变量读取
pub fn create_claude_client(cfg: &AppConfig) -> Result<OpenAiClient, AgentError> {
    build_client(
        Provider::Claude,
        &cfg.llm.claude,
        CLAUDE_BASE_URL,
        cfg.llm.timeouts.request,
    )
}

/// 创建 Gemini 客户端；Key 从 `[llm.gemini].api_key_env` 指定的环境变量读取
pub fn create_gemini_client(cfg: &AppConfig) -> Result<OpenAiClient, AgentError> {
    build_client(
        Provider::Gemini,
        &cfg.llm.gemini,
        GEMINI_BASE_URL,
        cfg.llm.timeouts.request,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmClient;

    #[test]
    fn test_missing_key_is_config_error() {
        let mut cfg = AppConfig::default();
        cfg.llm.gemini.api_key_env = "PPT_AGENT_TEST_GEMINI_KEY_NEVER_SET".to_string();
        let err = create_gemini_client(&cfg).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_client_uses_configured_model() {
        let mut cfg = AppConfig::default();
        cfg.llm.claude.api_key_env = "PATH".to_string();
        cfg.llm.claude.model = "claude-test".to_string();
        let client = create_claude_client(&cfg).unwrap();
        assert_eq!(client.model(), "claude-test");
        assert_eq!(client.provider(), Provider::Claude);
    }
}
