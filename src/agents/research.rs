//! Research Agent：按主题收集要点，记录来源与可信度
//!
//! 单次 JSON 生成：{research_strategy, results[], summary, key_insights[]}。
//! 结果与摘要写入 AgentContext.artifacts 供后续阶段使用。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::{Agent, AgentCore};
use crate::core::{AgentContext, AgentError};
use crate::llm::{lenient, lenient_seq, TaskRouter, TaskType};
use crate::models::{ConfidenceLevel, ResearchResult};

pub const RESEARCH_AGENT_NAME: &str = "Research Agent";

/// 未给出来源时的默认值
pub const DEFAULT_SOURCE: &str = "일반 지식";

/// 通过阈值
pub const PASS_THRESHOLD: f64 = 0.7;

const SYSTEM_PROMPT: &str = "당신은 PPT 작성을 위한 리서치 전문 Agent입니다.

역할:
1. 주어진 주제에 대해 신뢰할 수 있는 정보를 수집합니다.
2. 각 정보의 출처와 신뢰도를 명시합니다.
3. PPT 슬라이드에 적합한 핵심 포인트를 추출합니다.

원칙:
- 정확성: 검증된 정보만 제공합니다.
- 출처 명시: 모든 정보에 출처를 기록합니다.
- 간결성: PPT에 적합한 핵심 내용 위주로 정리합니다.
- Glass Box: 검색 전략과 정보 선별 근거를 설명합니다.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResearchItem {
    #[serde(deserialize_with = "lenient")]
    topic: String,
    #[serde(deserialize_with = "lenient")]
    content: String,
    #[serde(deserialize_with = "lenient")]
    source: Option<String>,
    #[serde(deserialize_with = "lenient")]
    confidence: Option<String>,
    #[serde(deserialize_with = "lenient")]
    reasoning: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResearchResponse {
    #[serde(deserialize_with = "lenient")]
    research_strategy: String,
    #[serde(deserialize_with = "lenient_seq")]
    results: Vec<ResearchItem>,
    #[serde(deserialize_with = "lenient")]
    summary: String,
    #[serde(deserialize_with = "lenient_seq")]
    key_insights: Vec<String>,
}

/// 调研质量评估
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchEvaluation {
    pub total_results: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
    /// 加权平均，保留两位小数
    pub quality_score: f64,
    pub pass: bool,
}

impl ResearchEvaluation {
    /// 按可信度加权（high 1.0 / medium 0.7 / low 0.4）；空列表得 0 分且不通过
    pub fn from_results(results: &[ResearchResult]) -> Self {
        let count = |level: ConfidenceLevel| results.iter().filter(|r| r.confidence == level).count();
        let total = results.len();
        let score = if total == 0 {
            0.0
        } else {
            results.iter().map(|r| r.confidence.weight()).sum::<f64>() / total as f64
        };
        Self {
            total_results: total,
            high_confidence: count(ConfidenceLevel::High),
            medium_confidence: count(ConfidenceLevel::Medium),
            low_confidence: count(ConfidenceLevel::Low),
            quality_score: (score * 100.0).round() / 100.0,
            pass: total > 0 && score >= PASS_THRESHOLD,
        }
    }
}

pub struct ResearchAgent {
    core: AgentCore,
}

impl ResearchAgent {
    pub fn new(router: Arc<TaskRouter>) -> Self {
        Self {
            core: AgentCore::new(RESEARCH_AGENT_NAME, TaskType::Research, router, SYSTEM_PROMPT),
        }
    }

    fn build_prompt(topic: &str, ctx: &AgentContext) -> String {
        format!(
            r#"다음 주제에 대해 PPT 작성에 필요한 핵심 정보를 리서치하세요.

주제: {topic}
대상 청중: {audience}
톤: {tone}
요구사항: {requirements}

다음 JSON 형식으로 5개의 핵심 정보를 제공하세요:
{{
    "research_strategy": "검색 전략 설명",
    "results": [
        {{
            "topic": "세부 주제",
            "content": "핵심 내용 (2-3문장)",
            "source": "정보 출처",
            "confidence": "high/medium/low",
            "reasoning": "이 정보를 선택한 이유"
        }}
    ],
    "summary": "전체 리서치 요약",
    "key_insights": ["핵심 인사이트 1", "핵심 인사이트 2", "핵심 인사이트 3"]
}}"#,
            topic = topic,
            audience = ctx.audience,
            tone = ctx.tone,
            requirements = ctx.requirements_text(),
        )
    }

    /// 执行调研并把结果写入上下文
    pub async fn research(
        &mut self,
        topic: &str,
        ctx: &mut AgentContext,
    ) -> Result<Vec<ResearchResult>, AgentError> {
        self.core.log_decision(
            "리서치 시작",
            format!("주제 '{}'에 대해 {} 대상 정보 수집", topic, ctx.audience),
            1.0,
        );

        let prompt = Self::build_prompt(topic, ctx);
        let response: ResearchResponse = self.core.generate_typed(&prompt, None).await?;

        let strategy = if response.research_strategy.trim().is_empty() {
            "일반적인 검색 전략 적용".to_string()
        } else {
            response.research_strategy.clone()
        };
        self.core.log_decision("리서치 전략", strategy, 1.0);

        let results: Vec<ResearchResult> = response
            .results
            .into_iter()
            .map(|item| {
                ResearchResult::new(
                    item.topic,
                    item.content,
                    item.source
                        .filter(|s| !s.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                    ConfidenceLevel::from_label(item.confidence.as_deref()),
                    item.reasoning,
                )
            })
            .collect();

        let summary_preview: String = response.summary.chars().take(100).collect();
        ctx.artifacts.research_results = Some(results.clone());
        ctx.artifacts.key_insights = response.key_insights;
        ctx.artifacts.research_summary = Some(response.summary);

        self.core.log_decision(
            "리서치 완료",
            format!("{}개 정보 수집 완료. 요약: {}...", results.len(), summary_preview),
            1.0,
        );
        Ok(results)
    }

    /// 评估调研质量并记录
    pub fn evaluate_results(&mut self, results: &[ResearchResult]) -> ResearchEvaluation {
        self.core
            .log_decision("결과 품질 평가", "수집된 정보의 신뢰도와 커버리지 평가", 1.0);
        let evaluation = ResearchEvaluation::from_results(results);
        self.core.log_decision(
            "평가 완료",
            format!(
                "품질 점수: {} ({})",
                evaluation.quality_score,
                if evaluation.pass { "통과" } else { "재검토 필요" }
            ),
            1.0,
        );
        evaluation
    }
}

#[async_trait]
impl Agent for ResearchAgent {
    type Output = Vec<ResearchResult>;

    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn execute(&mut self, ctx: &mut AgentContext) -> Result<Self::Output, AgentError> {
        let topic = ctx.topic.clone();
        let results = self.research(&topic, ctx).await?;
        let evaluation = self.evaluate_results(&results);
        ctx.add_decision(
            "리서치 Agent 실행 완료",
            format!(
                "품질 점수 {}, {}개 정보 수집",
                evaluation.quality_score,
                results.len()
            ),
            1.0,
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::{MockLlmClient, Provider};

    fn result(level: ConfidenceLevel) -> ResearchResult {
        ResearchResult::new("t", "c", DEFAULT_SOURCE, level, "r")
    }

    #[test]
    fn test_empty_results_score_zero() {
        let eval = ResearchEvaluation::from_results(&[]);
        assert_eq!(eval.total_results, 0);
        assert_eq!(eval.quality_score, 0.0);
        assert!(!eval.pass);
    }

    #[test]
    fn test_all_high_scores_one() {
        let results: Vec<_> = (0..4).map(|_| result(ConfidenceLevel::High)).collect();
        let eval = ResearchEvaluation::from_results(&results);
        assert_eq!(eval.quality_score, 1.0);
        assert_eq!(eval.high_confidence, 4);
        assert!(eval.pass);
    }

    #[test]
    fn test_weighted_score_rounding() {
        // (1.0 + 0.7 + 0.4) / 3 = 0.7
        let results = vec![
            result(ConfidenceLevel::High),
            result(ConfidenceLevel::Medium),
            result(ConfidenceLevel::Low),
        ];
        let eval = ResearchEvaluation::from_results(&results);
        assert_eq!(eval.quality_score, 0.7);

        // (0.7 + 0.4) / 2 = 0.55
        let eval = ResearchEvaluation::from_results(&[
            result(ConfidenceLevel::Medium),
            result(ConfidenceLevel::Low),
        ]);
        assert_eq!(eval.quality_score, 0.55);
        assert!(!eval.pass);
    }

    #[tokio::test]
    async fn test_execute_with_mock() {
        let router = Arc::new(TaskRouter::new(&AppConfig::mock()));
        let mut agent = ResearchAgent::new(router);
        let mut ctx = AgentContext::new("AI 기술 트렌드 2024");

        let results = agent.execute(&mut ctx).await.unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().any(|r| r.confidence == ConfidenceLevel::High));
        // "unsure" 解码为 medium
        assert_eq!(results[4].confidence, ConfidenceLevel::Medium);

        assert_eq!(ctx.artifacts.research_results.as_ref().map(Vec::len), Some(5));
        assert_eq!(ctx.artifacts.key_insights.len(), 3);
        assert_eq!(ctx.decisions.len(), 1);
        assert!(agent.decisions().len() >= 4);
        assert!(agent.decisions().iter().all(|d| !d.rationale.is_empty()));
    }

    fn router_returning(value: serde_json::Value) -> Arc<TaskRouter> {
        let router = TaskRouter::new(&AppConfig::mock());
        router.install(Provider::Mock, Arc::new(MockLlmClient::fixed(value)));
        Arc::new(router)
    }

    #[tokio::test]
    async fn test_loosely_typed_fields_use_defaults() {
        let router = router_returning(serde_json::json!({
            "research_strategy": null,
            "results": [
                { "topic": "수치", "content": "성장률", "confidence": 0.9, "reasoning": null },
                { "topic": "사례", "content": "도입 사례", "source": 3, "confidence": "low" },
                "잘못된 항목"
            ],
            "summary": null,
            "key_insights": "인사이트 하나"
        }));
        let mut agent = ResearchAgent::new(router);
        let mut ctx = AgentContext::new("AI");

        let results = agent.research("AI", &mut ctx).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].confidence, ConfidenceLevel::Medium);
        assert_eq!(results[1].confidence, ConfidenceLevel::Low);
        assert_eq!(results[1].source, DEFAULT_SOURCE);
        assert_eq!(ctx.artifacts.key_insights, vec!["인사이트 하나".to_string()]);
        assert_eq!(agent.decisions()[1].rationale, "일반적인 검색 전략 적용");
    }

    #[tokio::test]
    async fn test_missing_reasoning_gets_placeholder() {
        let router = router_returning(serde_json::json!({
            "results": [{ "topic": "개요", "content": "현황", "confidence": "high" }]
        }));
        let mut agent = ResearchAgent::new(router);
        let mut ctx = AgentContext::new("AI");

        let results = agent.research("AI", &mut ctx).await.unwrap();
        assert_eq!(results[0].rationale, crate::core::MISSING_RATIONALE);
    }
}
