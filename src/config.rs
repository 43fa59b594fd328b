//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PPT_AGENT__*` 覆盖（双下划线表示嵌套，如 `PPT_AGENT__AGENT__MOCK_MODE=true`）。
//! 兼容旧开关 `PPT_AGENT_MOCK`（1/true/yes/on），只在这里解析。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::AgentError;
use crate::llm::{Provider, ROUTING_TABLE};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub llm: LlmSection,
}

/// [agent] 段：HITL 次数上限、输出目录、语言、Mock 模式
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_max_hitl")]
    pub max_hitl_interactions: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_language")]
    pub language: String,
    /// 为 true 时所有任务类型都路由到 Mock
    #[serde(default)]
    pub mock_mode: bool,
}

fn default_max_hitl() -> usize {
    4
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_language() -> String {
    "ko".to_string()
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_hitl_interactions: default_max_hitl(),
            output_dir: default_output_dir(),
            language: default_language(),
            mock_mode: false,
        }
    }
}

/// [llm] 段：Claude / Gemini 两个后端与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_claude")]
    pub claude: ProviderSection,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            claude: default_claude(),
            gemini: default_gemini(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

/// [llm.claude] / [llm.gemini] 段
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    pub model: String,
    /// 未设置时使用该后端的 OpenAI 兼容端点
    pub base_url: Option<String>,
    /// 读取 API Key 的环境变量名
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ProviderSection {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_claude() -> ProviderSection {
    ProviderSection {
        model: "claude-sonnet-4-20250514".to_string(),
        base_url: None,
        api_key_env: "ANTHROPIC_API_KEY".to_string(),
        max_tokens: default_max_tokens(),
        temperature: default_temperature(),
    }
}

fn default_gemini() -> ProviderSection {
    ProviderSection {
        model: "gemini-2.0-flash-exp".to_string(),
        base_url: None,
        api_key_env: "GOOGLE_API_KEY".to_string(),
        max_tokens: default_max_tokens(),
        temperature: default_temperature(),
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

impl AppConfig {
    /// Mock 模式配置（测试用）
    pub fn mock() -> Self {
        let mut cfg = Self::default();
        cfg.agent.mock_mode = true;
        cfg
    }

    pub fn provider_section(&self, provider: Provider) -> Option<&ProviderSection> {
        match provider {
            Provider::Claude => Some(&self.llm.claude),
            Provider::Gemini => Some(&self.llm.gemini),
            Provider::Mock => None,
        }
    }

    /// 运行前检查：非 Mock 模式下，逻辑类任务依赖的 Claude 必须有 Key。
    ///
    /// Gemini 只服务于设计类任务，缺 Key 时由 Design Agent 回退到默认设计，这里不拦截。
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.agent.mock_mode {
            return Ok(());
        }
        let needs_claude = ROUTING_TABLE
            .iter()
            .any(|(_, provider)| *provider == Provider::Claude);
        if needs_claude && self.llm.claude.api_key().is_none() {
            return Err(AgentError::ConfigError(format!(
                "{} is not set (required by the claude provider); set it or enable mock mode",
                self.llm.claude.api_key_env
            )));
        }
        Ok(())
    }
}

/// `PPT_AGENT_MOCK` 的取值解析；无法识别的值记警告并视为关闭
fn parse_mock_flag(value: Option<&str>) -> bool {
    let Some(value) = value.map(str::trim) else {
        return false;
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        other => {
            tracing::warn!(value = other, "Unrecognized PPT_AGENT_MOCK value, mock mode stays off");
            false
        }
    }
}

fn legacy_mock_flag() -> bool {
    parse_mock_flag(std::env::var("PPT_AGENT_MOCK").ok().as_deref())
}

/// 从 config 目录加载配置，环境变量 PPT_AGENT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PPT_AGENT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PPT_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    let mut cfg: AppConfig = c.try_deserialize()?;
    if legacy_mock_flag() {
        cfg.agent.mock_mode = true;
    }
    Ok(cfg)
}
