//! 任务路由器
//!
//! 根据任务类型选择后端：
//! - 逻辑类任务（orchestrate / research / structure / logic_eval / export）→ Claude
//! - 视觉类任务（design / asset / visual_eval）→ Gemini
//! - Mock 模式下所有任务都路由到 Mock
//!
//! 每个后端的客户端在首次使用时创建，同一路由器内最多创建一次。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::core::AgentError;
use crate::llm::{create_claude_client, create_gemini_client, LlmClient, LlmResponse, MockLlmClient};

/// 任务类型（用于路由决策）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Orchestrate,
    Research,
    Structure,
    LogicEval,
    Export,
    Design,
    Asset,
    VisualEval,
}

impl TaskType {
    pub const ALL: [TaskType; 8] = [
        TaskType::Orchestrate,
        TaskType::Research,
        TaskType::Structure,
        TaskType::LogicEval,
        TaskType::Export,
        TaskType::Design,
        TaskType::Asset,
        TaskType::VisualEval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Orchestrate => "orchestrate",
            TaskType::Research => "research",
            TaskType::Structure => "structure",
            TaskType::LogicEval => "logic_eval",
            TaskType::Export => "export",
            TaskType::Design => "design",
            TaskType::Asset => "asset",
            TaskType::VisualEval => "visual_eval",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 后端标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Claude,
    Gemini,
    Mock,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Claude => write!(f, "claude"),
            Provider::Gemini => write!(f, "gemini"),
            Provider::Mock => write!(f, "mock"),
        }
    }
}

/// 静态路由表：每个任务类型对应唯一后端
pub const ROUTING_TABLE: [(TaskType, Provider); 8] = [
    (TaskType::Orchestrate, Provider::Claude),
    (TaskType::Research, Provider::Claude),
    (TaskType::Structure, Provider::Claude),
    (TaskType::LogicEval, Provider::Claude),
    (TaskType::Export, Provider::Claude),
    (TaskType::Design, Provider::Gemini),
    (TaskType::Asset, Provider::Gemini),
    (TaskType::VisualEval, Provider::Gemini),
];

fn table_lookup(task: TaskType) -> Provider {
    ROUTING_TABLE
        .iter()
        .find(|(t, _)| *t == task)
        .map(|(_, p)| *p)
        .unwrap_or(Provider::Claude)
}

/// 任务路由器：持有配置与已创建的客户端
pub struct TaskRouter {
    config: AppConfig,
    mock_mode: bool,
    clients: Mutex<HashMap<Provider, Arc<dyn LlmClient>>>,
}

impl TaskRouter {
    /// Mock 开关取自传入配置，不读取全局状态
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            mock_mode: config.agent.mock_mode,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    /// 根据任务类型决定后端
    pub fn resolve(&self, task: TaskType) -> Provider {
        if self.mock_mode {
            Provider::Mock
        } else {
            table_lookup(task)
        }
    }

    /// 预置某个后端的客户端（自定义后端 / 测试注入）
    pub fn install(&self, provider: Provider, client: Arc<dyn LlmClient>) {
        self.lock_clients().insert(provider, client);
    }

    /// 已创建（或预置）的客户端数量
    pub fn constructed_clients(&self) -> usize {
        self.lock_clients().len()
    }

    fn lock_clients(&self) -> std::sync::MutexGuard<'_, HashMap<Provider, Arc<dyn LlmClient>>> {
        // 锁内只做 HashMap 操作与同步构造，不会在持锁时 panic
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn build_client(&self, provider: Provider) -> Result<Arc<dyn LlmClient>, AgentError> {
        let client: Arc<dyn LlmClient> = match provider {
            Provider::Claude => Arc::new(create_claude_client(&self.config)?),
            Provider::Gemini => Arc::new(create_gemini_client(&self.config)?),
            Provider::Mock => Arc::new(MockLlmClient::new()),
        };
        Ok(client)
    }

    /// 获取任务对应的客户端（懒创建，同一后端只创建一次）
    pub fn client_for(&self, task: TaskType) -> Result<Arc<dyn LlmClient>, AgentError> {
        let provider = self.resolve(task);
        let mut clients = self.lock_clients();
        if let Some(client) = clients.get(&provider) {
            return Ok(client.clone());
        }
        let client = self.build_client(provider)?;
        clients.insert(provider, client.clone());
        Ok(client)
    }

    pub async fn generate(
        &self,
        task: TaskType,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LlmResponse, AgentError> {
        let client = self.client_for(task)?;
        tracing::debug!(task = %task, provider = %client.provider(), "routing generate");
        client.generate(prompt, system).await
    }

    pub async fn generate_json(
        &self,
        task: TaskType,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<Value, AgentError> {
        let client = self.client_for(task)?;
        tracing::debug!(task = %task, provider = %client.provider(), "routing generate_json");
        client.generate_json(prompt, system).await
    }

    /// Glass Box：说明路由决策的依据
    pub fn explain_routing(&self, task: TaskType) -> String {
        let provider = self.resolve(task);
        let reason = match provider {
            Provider::Claude => "Claude는 논리적 추론, 긴 문서 처리, 구조화에 강점이 있습니다.",
            Provider::Gemini => "Gemini는 시각적 이해와 이미지 생성에 강점이 있습니다.",
            Provider::Mock => "Mock 모드: 실제 LLM 대신 고정 응답을 사용합니다.",
        };
        format!("[라우팅] {} → {}: {}", task, provider, reason)
    }

    /// 所有客户端的累计 token 使用
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.lock_clients()
            .values()
            .map(|client| client.token_usage())
            .fold((0, 0, 0), |acc, (a, b, c)| (acc.0 + a, acc.1 + b, acc.2 + c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_routing() {
        let router = TaskRouter::new(&AppConfig::default());
        assert_eq!(router.resolve(TaskType::Orchestrate), Provider::Claude);
        assert_eq!(router.resolve(TaskType::Research), Provider::Claude);
        assert_eq!(router.resolve(TaskType::Structure), Provider::Claude);
        assert_eq!(router.resolve(TaskType::Design), Provider::Gemini);
        assert_eq!(router.resolve(TaskType::VisualEval), Provider::Gemini);
        for task in TaskType::ALL {
            assert_ne!(router.resolve(task), Provider::Mock);
        }
    }

    #[test]
    fn test_mock_mode_overrides_every_task() {
        let router = TaskRouter::new(&AppConfig::mock());
        for task in TaskType::ALL {
            assert_eq!(router.resolve(task), Provider::Mock);
        }
    }

    #[test]
    fn test_clients_are_memoized() {
        let router = TaskRouter::new(&AppConfig::mock());
        let a = router.client_for(TaskType::Research).unwrap();
        let b = router.client_for(TaskType::Design).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(router.constructed_clients(), 1);
    }

    #[test]
    fn test_missing_key_surfaces_config_error() {
        let mut cfg = AppConfig::default();
        cfg.llm.gemini.api_key_env = "PPT_AGENT_TEST_ROUTER_KEY_NEVER_SET".to_string();
        let router = TaskRouter::new(&cfg);
        let err = router.client_for(TaskType::Design).err().unwrap();
        assert!(err.is_config());
        assert_eq!(router.constructed_clients(), 0);
    }

    #[test]
    fn test_install_preempts_construction() {
        let router = TaskRouter::new(&AppConfig::default());
        router.install(Provider::Claude, Arc::new(MockLlmClient::new()));
        let client = router.client_for(TaskType::Structure).unwrap();
        assert_eq!(client.provider(), Provider::Mock);
    }

    #[tokio::test]
    async fn test_generate_json_through_mock() {
        let router = TaskRouter::new(&AppConfig::mock());
        let value = router
            .generate_json(TaskType::Research, "주제: 테스트\n{\"research_strategy\": \"...\"}", None)
            .await
            .unwrap();
        assert!(value.get("results").is_some());
    }

    #[test]
    fn test_explain_routing() {
        let router = TaskRouter::new(&AppConfig::default());
        let text = router.explain_routing(TaskType::Design);
        assert!(text.contains("design → gemini"));
    }
}
