//! Structure Skill：把调研结果变成幻灯片结构（기-승-전-결）
//!
//! 单次 JSON 生成；幻灯片顺序只看返回列表中的位置，忽略响应里的 order 字段。

use std::sync::Arc;

use serde::Deserialize;

use crate::core::{rationale_or_placeholder, AgentContext, AgentError};
use crate::llm::{lenient, lenient_seq, TaskRouter, TaskType};
use crate::models::{Presentation, ResearchResult, Slide, SlideContent, SlideType};

pub const STRUCTURE_SKILL_NAME: &str = "Structure Skill";

const SYSTEM_PROMPT: &str = "당신은 PPT 구조화 전문가입니다.

역할:
1. 리서치 결과를 효과적인 슬라이드 구조로 변환합니다.
2. 각 슬라이드의 핵심 메시지를 명확히 정의합니다.
3. 청중에게 설득력 있는 스토리라인을 구성합니다.

한국형 PPT 구조:
- 기(起): 도입 - 주제 소개, 청중 관심 유발
- 승(承): 전개 - 핵심 내용 전달
- 전(轉): 전환 - 인사이트, 시사점
- 결(結): 마무리 - 요약, Call to Action

원칙:
- 슬라이드당 핵심 메시지 1개
- 글머리 기호 3-5개
- 명확하고 간결한 제목";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlideItem {
    #[serde(deserialize_with = "lenient")]
    slide_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    title: String,
    #[serde(deserialize_with = "lenient_seq")]
    body: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    key_message: String,
    #[serde(deserialize_with = "lenient")]
    notes: String,
    #[serde(deserialize_with = "lenient")]
    reasoning: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StructureResponse {
    #[serde(deserialize_with = "lenient")]
    storyline: String,
    #[serde(deserialize_with = "lenient_seq")]
    slides: Vec<SlideItem>,
    #[serde(deserialize_with = "lenient")]
    structure_reasoning: String,
}

/// 调研摘要：`- 主题: 内容 (출처: 来源, 신뢰도: 等级)`
pub fn render_research_summary(results: &[ResearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "- {}: {} (출처: {}, 신뢰도: {})",
                r.topic, r.content, r.source, r.confidence
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct StructureSkill {
    router: Arc<TaskRouter>,
}

impl StructureSkill {
    pub fn new(router: Arc<TaskRouter>) -> Self {
        Self { router }
    }

    pub fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn build_prompt(
        presentation: &Presentation,
        research_results: &[ResearchResult],
        ctx: &AgentContext,
        feedback: Option<&str>,
    ) -> String {
        let feedback = feedback
            .filter(|f| !f.trim().is_empty())
            .map(|f| format!("\n이전 구성에 대한 검토 의견 (반드시 반영하세요):\n{}\n", f.trim()))
            .unwrap_or_default();

        format!(
            r#"다음 정보를 바탕으로 PPT 슬라이드 구조를 생성하세요.

주제: {topic}
청중: {audience}
톤: {tone}

리서치 결과:
{summary}

핵심 인사이트:
{insights}
{feedback}
다음 JSON 형식으로 슬라이드 구조를 생성하세요 (5-7장):
{{
    "storyline": "전체 스토리라인 요약",
    "slides": [
        {{
            "slide_type": "title/content/section/two_column/conclusion",
            "title": "슬라이드 제목",
            "body": ["핵심 포인트 1", "핵심 포인트 2", "핵심 포인트 3"],
            "key_message": "이 슬라이드의 핵심 메시지",
            "notes": "발표자 노트",
            "reasoning": "이 슬라이드가 필요한 이유"
        }}
    ],
    "structure_reasoning": "이 구조를 선택한 이유"
}}"#,
            topic = presentation.topic,
            audience = presentation.audience,
            tone = presentation.tone,
            summary = render_research_summary(research_results),
            insights = ctx.artifacts.key_insights.join(", "),
            feedback = feedback,
        )
    }

    /// 生成幻灯片结构；feedback 为重新生成时的审阅意见
    pub async fn generate_structure(
        &self,
        presentation: &Presentation,
        research_results: &[ResearchResult],
        ctx: &mut AgentContext,
        feedback: Option<&str>,
    ) -> Result<Vec<Slide>, AgentError> {
        let prompt = Self::build_prompt(presentation, research_results, ctx, feedback);
        let value = self
            .router
            .generate_json(TaskType::Structure, &prompt, Some(SYSTEM_PROMPT))
            .await?;
        let response: StructureResponse =
            serde_json::from_value(value.clone()).map_err(|e| AgentError::JsonParseError {
                message: e.to_string(),
                raw: value.to_string(),
            })?;

        let slides: Vec<Slide> = response
            .slides
            .into_iter()
            .enumerate()
            .map(|(i, item)| Slide {
                slide_type: item
                    .slide_type
                    .as_deref()
                    .map(SlideType::from_label)
                    .unwrap_or(SlideType::Content),
                content: SlideContent {
                    title: item.title,
                    body: item.body,
                    notes: item.notes,
                    ..Default::default()
                },
                order: i + 1,
                key_message: item.key_message,
                rationale: rationale_or_placeholder(item.reasoning),
            })
            .collect();

        let preview: String = response.storyline.chars().take(100).collect();
        tracing::info!(slides = slides.len(), "Slide structure generated: {}...", preview);

        ctx.add_decision(
            format!("{}: {}개 슬라이드 구조 생성", STRUCTURE_SKILL_NAME, slides.len()),
            response.structure_reasoning.clone(),
            1.0,
        );
        ctx.artifacts.storyline = Some(response.storyline);
        ctx.artifacts.structure_reasoning = Some(response.structure_reasoning);
        Ok(slides)
    }
}
