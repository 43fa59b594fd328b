//! Agent 能力抽象
//!
//! 每个 Agent = 名称 + 绑定的任务类型 + system prompt + execute(ctx)。
//! 公共部分放在 AgentCore 中以组合方式复用：所有生成调用都经过注入的 TaskRouter，
//! Agent 自己从不选择后端。

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{AgentContext, AgentDecision, AgentError, DecisionLog};
use crate::llm::{TaskRouter, TaskType};

/// Agent 共享的状态与工具方法
pub struct AgentCore {
    name: String,
    task_type: TaskType,
    system_prompt: String,
    router: Arc<TaskRouter>,
    log: DecisionLog,
}

impl AgentCore {
    pub fn new(
        name: impl Into<String>,
        task_type: TaskType,
        router: Arc<TaskRouter>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            task_type,
            system_prompt: system_prompt.into(),
            router,
            log: DecisionLog::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn router(&self) -> &Arc<TaskRouter> {
        &self.router
    }

    pub fn decisions(&self) -> &[AgentDecision] {
        self.log.entries()
    }

    /// 记录决策并立即输出
    pub fn log_decision(
        &mut self,
        action: impl Into<String>,
        rationale: impl Into<String>,
        confidence: f32,
    ) -> &AgentDecision {
        let decision = self
            .log
            .push(AgentDecision::new(action, rationale, confidence));
        tracing::info!(
            agent = %self.name,
            action = %decision.action,
            confidence = decision.confidence,
            "{}",
            decision.rationale
        );
        decision
    }

    fn system<'a>(&'a self, system: Option<&'a str>) -> &'a str {
        system.unwrap_or(&self.system_prompt)
    }

    /// 文本生成；system 为 None 时使用 Agent 自身的 system prompt
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AgentError> {
        let response = self
            .router
            .generate(self.task_type, prompt, Some(self.system(system)))
            .await?;
        Ok(response.content)
    }

    pub async fn generate_json(&self, prompt: &str, system: Option<&str>) -> Result<Value, AgentError> {
        self.router
            .generate_json(self.task_type, prompt, Some(self.system(system)))
            .await
    }

    /// JSON 生成并反序列化为具体类型；字段不符时同样视为 JsonParseError
    pub async fn generate_typed<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<T, AgentError> {
        let value = self.generate_json(prompt, system).await?;
        serde_json::from_value(value.clone()).map_err(|e| AgentError::JsonParseError {
            message: e.to_string(),
            raw: value.to_string(),
        })
    }

    /// Glass Box：为什么这个 Agent 使用当前后端
    pub fn explain_llm_choice(&self) -> String {
        self.router.explain_routing(self.task_type)
    }
}

/// Agent trait：执行结果类型由具体 Agent 决定
#[async_trait]
pub trait Agent: Send {
    type Output: Send;

    fn core(&self) -> &AgentCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn task_type(&self) -> TaskType {
        self.core().task_type()
    }

    fn system_prompt(&self) -> &str {
        self.core().system_prompt()
    }

    fn decisions(&self) -> &[AgentDecision] {
        self.core().decisions()
    }

    async fn execute(&mut self, ctx: &mut AgentContext) -> Result<Self::Output, AgentError>;
}
