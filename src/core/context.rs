//! 共享上下文与决策记录（Glass Box）
//!
//! AgentContext 每次运行由 Orchestrator 创建一次，依次以 &mut 传给各 Agent，运行结束即丢弃。
//! AgentDecision 只追加、不修改，仅用于可观测性，不影响控制流。

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{DesignOption, ResearchResult};

/// 未提供理由时写入的占位文本，保证每条决策都有理由
pub const MISSING_RATIONALE: &str = "근거가 제공되지 않았습니다.";

/// 空白理由替换为占位文本；决策、调研结果、幻灯片、设计方案共用
pub fn rationale_or_placeholder(rationale: impl Into<String>) -> String {
    let rationale = rationale.into();
    if rationale.trim().is_empty() {
        MISSING_RATIONALE.to_string()
    } else {
        rationale
    }
}

/// 决策记录
#[derive(Debug, Clone, Serialize)]
pub struct AgentDecision {
    pub action: String,
    pub rationale: String,
    pub timestamp: DateTime<Local>,
    /// 0.0 ~ 1.0
    pub confidence: f32,
}

impl AgentDecision {
    pub fn new(action: impl Into<String>, rationale: impl Into<String>, confidence: f32) -> Self {
        Self {
            action: action.into(),
            rationale: rationale_or_placeholder(rationale),
            timestamp: Local::now(),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
        }
    }
}

impl fmt::Display for AgentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[결정] {}\n[근거] {}", self.action, self.rationale)
    }
}

/// 某个 Agent 私有的决策日志
#[derive(Debug, Clone, Default)]
pub struct DecisionLog {
    entries: Vec<AgentDecision>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decision: AgentDecision) -> &AgentDecision {
        self.entries.push(decision);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AgentDecision] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&AgentDecision> {
        self.entries.last()
    }
}

/// 各阶段之间传递的产物（替代开放式的 data 字典）
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunArtifacts {
    pub research_results: Option<Vec<ResearchResult>>,
    pub research_summary: Option<String>,
    pub key_insights: Vec<String>,
    pub design_options: Vec<DesignOption>,
    pub design_recommendation: Option<usize>,
    pub storyline: Option<String>,
    pub structure_reasoning: Option<String>,
    pub slide_count_suggestion: Option<u32>,
}

/// Agent 间共享的上下文
#[derive(Debug, Clone, Serialize)]
pub struct AgentContext {
    pub topic: String,
    pub audience: String,
    pub tone: String,
    pub requirements: Vec<String>,
    pub constraints: Vec<String>,
    pub artifacts: RunArtifacts,
    pub decisions: Vec<AgentDecision>,
}

pub const DEFAULT_AUDIENCE: &str = "일반";
pub const DEFAULT_TONE: &str = "professional";

impl AgentContext {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            audience: DEFAULT_AUDIENCE.to_string(),
            tone: DEFAULT_TONE.to_string(),
            requirements: Vec::new(),
            constraints: Vec::new(),
            artifacts: RunArtifacts::default(),
            decisions: Vec::new(),
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// 记录阶段结论
    pub fn add_decision(
        &mut self,
        action: impl Into<String>,
        rationale: impl Into<String>,
        confidence: f32,
    ) -> &AgentDecision {
        self.decisions.push(AgentDecision::new(action, rationale, confidence));
        &self.decisions[self.decisions.len() - 1]
    }

    pub fn add_requirement(&mut self, requirement: impl Into<String>) {
        let requirement = requirement.into();
        if !requirement.trim().is_empty() {
            self.requirements.push(requirement);
        }
    }

    /// 要求列表的 prompt 文本，空时为「없음」
    pub fn requirements_text(&self) -> String {
        if self.requirements.is_empty() {
            "없음".to_string()
        } else {
            self.requirements.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_always_has_rationale() {
        let d = AgentDecision::new("리서치 시작", "   ", 1.0);
        assert_eq!(d.rationale, MISSING_RATIONALE);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(AgentDecision::new("a", "b", 1.7).confidence, 1.0);
        assert_eq!(AgentDecision::new("a", "b", -0.2).confidence, 0.0);
        assert_eq!(AgentDecision::new("a", "b", f32::NAN).confidence, 0.0);
    }

    #[test]
    fn test_context_defaults_and_log() {
        let mut ctx = AgentContext::new("AI 기술 트렌드 2024");
        assert_eq!(ctx.audience, "일반");
        assert_eq!(ctx.tone, "professional");
        assert_eq!(ctx.requirements_text(), "없음");

        ctx.add_requirement("사례 포함");
        ctx.add_requirement("");
        assert_eq!(ctx.requirements, vec!["사례 포함".to_string()]);

        ctx.add_decision("리서치 Agent 실행 완료", "5개 정보 수집", 1.0);
        assert_eq!(ctx.decisions.len(), 1);
        assert!(ctx.decisions[0].to_string().contains("[근거] 5개 정보 수집"));
    }
}
