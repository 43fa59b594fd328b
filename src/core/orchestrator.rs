//! Orchestrator：请求分析、进度清单与 HITL 预算
//!
//! 阶段标签按固定顺序创建，只在驱动方显式调用时前进。
//! HITL 次数用完后自动通过，并记录一条低置信度的决策。

use std::sync::Arc;

use serde::Deserialize;

use crate::agents::AgentCore;
use crate::core::pipeline::PipelineOptions;
use crate::core::{
    AgentContext, AgentDecision, AgentError, HitlRequest, HitlResponder, HitlStep, PendingHitl,
    TodoItem, TodoList, TodoStatus, DEFAULT_AUDIENCE, DEFAULT_TONE,
};
use crate::llm::{lenient, lenient_seq, TaskRouter, TaskType};

pub const ORCHESTRATOR_NAME: &str = "Orchestrator";

pub const STAGE_CONFIRM: &str = "사용자 요청 확인 (HITL#1)";
pub const STAGE_RESEARCH: &str = "주제 리서치";
pub const STAGE_DESIGN: &str = "디자인 시스템 생성";
pub const STAGE_STRUCTURE: &str = "슬라이드 구조 생성";
pub const STAGE_VISUAL_EVAL: &str = "시각 품질 평가";
pub const STAGE_EXPORT: &str = "프레젠테이션 파일 생성";

/// 未给出建议时的默认页数
pub const DEFAULT_SLIDE_COUNT: u32 = 5;

/// HITL 被跳过时的置信度
const HITL_SKIP_CONFIDENCE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "당신은 PPT 생성을 총괄하는 Orchestrator Agent입니다.

역할:
1. 사용자 요청을 분석하여 PPT 생성 계획을 수립합니다.
2. 각 단계에서 필요한 정보를 파악하고 Sub-agent에게 전달합니다.
3. 결과물의 품질을 검토하고 필요시 수정을 요청합니다.

원칙:
- Glass Box: 모든 결정에 대한 근거를 명확히 설명합니다.
- 효율성: 불필요한 사용자 인터랙션을 최소화합니다.
- 품질: 각 단계의 결과물을 검증합니다.";

/// 请求分析的响应；缺失、null 或类型不符的字段在 analyze_request 中补默认值
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestAnalysis {
    #[serde(deserialize_with = "lenient")]
    pub topic: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub audience: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub tone: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub requirements: Vec<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub constraints: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub slide_count_suggestion: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub reasoning: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct OrchestratorAgent {
    core: AgentCore,
    todos: TodoList,
    hitl_count: usize,
    max_hitl: usize,
}

impl OrchestratorAgent {
    pub fn new(router: Arc<TaskRouter>, max_hitl: usize) -> Self {
        Self {
            core: AgentCore::new(ORCHESTRATOR_NAME, TaskType::Orchestrate, router, SYSTEM_PROMPT),
            todos: TodoList::new(),
            hitl_count: 0,
            max_hitl,
        }
    }

    pub fn core(&self) -> &AgentCore {
        &self.core
    }

    pub fn decisions(&self) -> &[AgentDecision] {
        self.core.decisions()
    }

    pub fn log_decision(&mut self, action: impl Into<String>, rationale: impl Into<String>, confidence: f32) {
        self.core.log_decision(action, rationale, confidence);
    }

    pub fn hitl_count(&self) -> usize {
        self.hitl_count
    }

    pub fn max_hitl(&self) -> usize {
        self.max_hitl
    }

    /// 申请一次人工确认：预算用完时直接 AutoProceed，否则计数并挂起等待回答
    pub fn request_hitl(&mut self, request: HitlRequest) -> HitlStep {
        if self.hitl_count >= self.max_hitl {
            self.core.log_decision(
                "HITL 스킵",
                format!(
                    "최대 상호작용 횟수({}) 도달, 자동 진행: {}",
                    self.max_hitl, request.question
                ),
                HITL_SKIP_CONFIDENCE,
            );
            return HitlStep::AutoProceed;
        }
        self.hitl_count += 1;
        self.core.log_decision(
            format!("HITL #{} 요청", self.hitl_count),
            request.question.clone(),
            1.0,
        );
        HitlStep::AwaitingInput(PendingHitl {
            seq: self.hitl_count,
            request,
        })
    }

    /// 交回回答；空回答视为未回答（按同意处理）
    pub fn resolve_hitl(&mut self, pending: &PendingHitl, answer: Option<String>) -> Option<String> {
        let answer = non_empty(answer);
        match &answer {
            Some(text) => {
                self.core
                    .log_decision(format!("HITL #{} 응답", pending.seq), text.clone(), 1.0);
            }
            None => {
                self.core.log_decision(
                    format!("HITL #{} 응답 없음", pending.seq),
                    "응답이 없어 기본값으로 진행",
                    HITL_SKIP_CONFIDENCE,
                );
            }
        }
        answer
    }

    /// request_hitl + responder + resolve_hitl
    pub async fn ask(&mut self, request: HitlRequest, responder: &dyn HitlResponder) -> Option<String> {
        match self.request_hitl(request) {
            HitlStep::AutoProceed => None,
            HitlStep::AwaitingInput(pending) => {
                let answer = responder.respond(&pending).await;
                self.resolve_hitl(&pending, answer)
            }
        }
    }

    /// 从自由文本中提取主题、听众、语气、要求与页数建议
    pub async fn analyze_request(&mut self, user_input: &str) -> Result<AgentContext, AgentError> {
        self.core.log_decision(
            "요청 분석 시작",
            "사용자 입력에서 주제, 청중, 톤, 요구사항을 추출합니다.",
            1.0,
        );

        let prompt = format!(
            r#"다음 사용자 요청을 분석하여 PPT 생성에 필요한 정보를 추출하세요.

사용자 요청:
{user_input}

다음 JSON 형식으로 응답하세요:
{{
    "topic": "PPT 주제",
    "audience": "대상 청중",
    "tone": "톤 (professional/casual/academic)",
    "requirements": ["요구사항1", "요구사항2"],
    "constraints": ["제약사항1"],
    "slide_count_suggestion": 5,
    "reasoning": "분석 근거"
}}"#
        );
        let analysis: RequestAnalysis = self.core.generate_typed(&prompt, None).await?;

        let mut ctx = AgentContext::new(
            non_empty(analysis.topic).unwrap_or_else(|| user_input.trim().to_string()),
        )
        .with_audience(non_empty(analysis.audience).unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()))
        .with_tone(non_empty(analysis.tone).unwrap_or_else(|| DEFAULT_TONE.to_string()));
        for requirement in analysis.requirements {
            ctx.add_requirement(requirement);
        }
        ctx.constraints = analysis
            .constraints
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        ctx.artifacts.slide_count_suggestion =
            Some(analysis.slide_count_suggestion.unwrap_or(DEFAULT_SLIDE_COUNT));

        let reasoning = if analysis.reasoning.trim().is_empty() {
            "분석 완료".to_string()
        } else {
            analysis.reasoning
        };
        self.core.log_decision("요청 분석 완료", reasoning.clone(), 1.0);
        ctx.add_decision(
            format!("요청 분석: {} ({}, {})", ctx.topic, ctx.audience, ctx.tone),
            reasoning,
            1.0,
        );
        Ok(ctx)
    }

    /// 按固定顺序创建阶段；design / visual_eval 受选项控制
    pub fn create_plan(&mut self, options: &PipelineOptions) -> &[TodoItem] {
        self.core.log_decision(
            "실행 계획 수립",
            format!(
                "디자인 단계 {}, 시각 평가 {}",
                if options.design { "포함" } else { "생략" },
                if options.visual_eval { "포함" } else { "생략" }
            ),
            1.0,
        );
        self.add_todo(STAGE_CONFIRM, ORCHESTRATOR_NAME);
        self.add_todo(STAGE_RESEARCH, crate::agents::research::RESEARCH_AGENT_NAME);
        if options.design {
            self.add_todo(STAGE_DESIGN, crate::agents::design::DESIGN_AGENT_NAME);
        }
        self.add_todo(STAGE_STRUCTURE, crate::skills::structure::STRUCTURE_SKILL_NAME);
        if options.visual_eval {
            self.add_todo(STAGE_VISUAL_EVAL, crate::agents::design::DESIGN_AGENT_NAME);
        }
        self.add_todo(STAGE_EXPORT, crate::skills::export::EXPORT_SKILL_NAME);
        self.todos.items()
    }

    pub fn add_todo(&mut self, task: &str, agent: &str) -> &TodoItem {
        self.todos.add(task, agent)
    }

    pub fn update_todo(
        &mut self,
        task: &str,
        status: TodoStatus,
        result: Option<String>,
    ) -> Result<(), AgentError> {
        self.todos.update(task, status, result)?;
        tracing::info!(task, status = %status, "Todo updated");
        Ok(())
    }

    pub fn todos(&self) -> &TodoList {
        &self.todos
    }

    pub fn render_todos(&self) -> String {
        self.todos.render()
    }

    /// 把当前进行中的阶段标为 blocked
    pub fn block_active(&mut self, reason: &str) {
        let Some(task) = self.todos.active().map(|t| t.task.clone()) else {
            return;
        };
        if let Err(e) = self.todos.update(&task, TodoStatus::Blocked, Some(reason.to_string())) {
            tracing::warn!("Failed to block todo '{}': {}", task, e);
        }
    }

    /// HITL #1：确认或修改请求；返回是否追加了修改要求
    pub async fn confirm_request(&mut self, ctx: &mut AgentContext, responder: &dyn HitlResponder) -> bool {
        let request = HitlRequest::new("다음 내용으로 PPT를 생성할까요?")
            .with_context(format!(
                "주제: {}\n청중: {}\n톤: {}",
                ctx.topic, ctx.audience, ctx.tone
            ))
            .with_options(["예, 진행해주세요", "아니요, 수정이 필요합니다"]);

        let declined = match self.ask(request, responder).await {
            Some(answer) => answer.contains("아니") || answer.trim() == "2",
            None => false,
        };
        if !declined {
            return false;
        }

        match self
            .ask(HitlRequest::new("어떤 부분을 수정할까요?"), responder)
            .await
        {
            Some(modification) => {
                ctx.add_decision("요청 수정", modification.clone(), 1.0);
                ctx.add_requirement(modification);
                true
            }
            None => false,
        }
    }
}
