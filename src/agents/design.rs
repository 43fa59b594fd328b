//! Design Agent：生成设计方案并评估视觉质量
//!
//! 唯一允许回退的环节：生成失败（后端不可用、缺少凭据、JSON 不合法）时
//! 按语气返回一套预置设计，错误不会传给 Orchestrator。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::{Agent, AgentCore};
use crate::core::{rationale_or_placeholder, AgentContext, AgentError};
use crate::llm::{lenient, lenient_seq, TaskRouter, TaskType};
use crate::models::{DesignOption, DesignSystem, Presentation, SlideType};
use crate::skills::design::{parse_hex, validate_contrast};

pub const DESIGN_AGENT_NAME: &str = "Design Agent";

/// 亮度差阈值
pub const MIN_LUMINANCE_DELTA: f64 = 0.4;

/// 正文最小字号
pub const MIN_BODY_FONT_SIZE: u32 = 16;

const SYSTEM_PROMPT: &str = "You are a professional presentation design expert.

Role:
1. Create cohesive design systems for presentations
2. Select color palettes that match the topic and audience
3. Ensure visual consistency and modern aesthetics

Design Principles:
- Use color psychology appropriately for the context
- Ensure high contrast for readability
- Follow modern, clean design trends
- Consider cultural context (Korean business presentations)

Always respond in JSON format with Korean text for content.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionItem {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    description: String,
    #[serde(deserialize_with = "lenient")]
    primary_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    secondary_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    accent_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    background_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    text_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    font_title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    font_body: Option<String>,
    #[serde(deserialize_with = "lenient")]
    font_size_title: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    font_size_body: Option<u32>,
    #[serde(deserialize_with = "lenient_seq")]
    style_keywords: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    reasoning: String,
}

impl OptionItem {
    fn into_option(self) -> DesignOption {
        let d = DesignSystem::default();
        DesignOption {
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            description: self.description,
            system: DesignSystem {
                primary_color: self.primary_color.unwrap_or(d.primary_color),
                secondary_color: self.secondary_color.unwrap_or(d.secondary_color),
                accent_color: self.accent_color.unwrap_or(d.accent_color),
                background_color: self.background_color.unwrap_or(d.background_color),
                text_color: self.text_color.unwrap_or(d.text_color),
                font_title: self.font_title.unwrap_or(d.font_title),
                font_body: self.font_body.unwrap_or(d.font_body),
                font_size_title: self.font_size_title.unwrap_or(d.font_size_title),
                font_size_body: self.font_size_body.unwrap_or(d.font_size_body),
            },
            style_keywords: self.style_keywords,
            rationale: rationale_or_placeholder(self.reasoning),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsResponse {
    #[serde(deserialize_with = "lenient_seq")]
    options: Vec<OptionItem>,
    #[serde(deserialize_with = "lenient")]
    recommendation: usize,
    #[serde(deserialize_with = "lenient")]
    recommendation_reason: String,
}

/// 视觉质量评估
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualEvaluation {
    /// 背景与文字的亮度差（0~1，保留两位小数）
    pub contrast_ratio: f64,
    pub contrast_pass: bool,
    pub font_size_pass: bool,
    pub slide_count: usize,
    pub has_title_slide: bool,
    pub has_conclusion: bool,
    /// WCAG 对比度（参考值，不计入 overall_pass）
    pub wcag_ratio: f64,
    pub wcag_aa: bool,
    pub overall_pass: bool,
}

/// 广播亮度 (0.299R + 0.587G + 0.114B) / 255
pub fn broadcast_luminance(color: &str) -> Result<f64, AgentError> {
    let [r, g, b] = parse_hex(color)?;
    Ok((0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0)
}

impl VisualEvaluation {
    pub fn of(presentation: &Presentation) -> Result<Self, AgentError> {
        let design = &presentation.design;
        let delta = (broadcast_luminance(&design.background_color)?
            - broadcast_luminance(&design.text_color)?)
        .abs();
        let wcag = validate_contrast(&design.background_color, &design.text_color)?;

        let contrast_pass = delta > MIN_LUMINANCE_DELTA;
        let font_size_pass = design.font_size_body >= MIN_BODY_FONT_SIZE;
        let has_title_slide = presentation.has_slide_type(SlideType::Title);
        Ok(Self {
            contrast_ratio: (delta * 100.0).round() / 100.0,
            contrast_pass,
            font_size_pass,
            slide_count: presentation.slides.len(),
            has_title_slide,
            has_conclusion: presentation.has_slide_type(SlideType::Conclusion),
            wcag_ratio: (wcag.ratio * 100.0).round() / 100.0,
            wcag_aa: wcag.passes_aa,
            overall_pass: contrast_pass && font_size_pass && has_title_slide,
        })
    }
}

/// 语气对应的预置设计；未知语气按 professional
pub fn tone_default(tone: &str) -> DesignOption {
    let (name, system) = match tone {
        "casual" => (
            "Casual Violet",
            DesignSystem::with_palette("#7C3AED", "#A78BFA", "#F472B6", "#FAFAFA", "#374151"),
        ),
        "academic" => (
            "Academic Slate",
            DesignSystem::with_palette("#1F2937", "#4B5563", "#059669", "#FFFFFF", "#111827"),
        ),
        _ => ("Professional Blue", DesignSystem::default()),
    };
    DesignOption {
        name: name.to_string(),
        description: format!("{} 톤 기본 디자인", tone),
        system,
        style_keywords: Vec::new(),
        rationale: "디자인 생성 실패 시 톤에 맞춘 기본 디자인".to_string(),
    }
}

pub struct DesignAgent {
    core: AgentCore,
}

impl DesignAgent {
    pub fn new(router: Arc<TaskRouter>) -> Self {
        Self {
            core: AgentCore::new(DESIGN_AGENT_NAME, TaskType::Design, router, SYSTEM_PROMPT),
        }
    }

    fn build_prompt(ctx: &AgentContext, num_options: usize) -> String {
        format!(
            r##"Create {num_options} different design system options for a presentation.

Topic: {topic}
Target Audience: {audience}
Tone: {tone}

For each option, provide a complete design system in this JSON format:
{{
    "options": [
        {{
            "name": "Option name (e.g., 'Corporate Blue', 'Modern Gradient')",
            "description": "Brief description of the design style",
            "primary_color": "#HEXCODE (main brand color)",
            "secondary_color": "#HEXCODE (supporting color)",
            "accent_color": "#HEXCODE (highlight color)",
            "background_color": "#HEXCODE (slide background)",
            "text_color": "#HEXCODE (main text color)",
            "font_title": "Korean font name (e.g., '맑은 고딕', '나눔스퀘어')",
            "font_body": "Korean font name",
            "font_size_title": 44,
            "font_size_body": 18,
            "style_keywords": ["keyword1", "keyword2"],
            "reasoning": "Why this design fits the context"
        }}
    ],
    "recommendation": 0,
    "recommendation_reason": "Why this option is recommended"
}}

Consider:
- Color psychology for the topic
- Professional vs creative balance based on audience
- Korean business presentation norms
- Readability and accessibility"##,
            num_options = num_options,
            topic = ctx.topic,
            audience = ctx.audience,
            tone = ctx.tone,
        )
    }

    async fn request_options(
        &self,
        ctx: &AgentContext,
        num_options: usize,
    ) -> Result<OptionsResponse, AgentError> {
        let prompt = Self::build_prompt(ctx, num_options);
        let response: OptionsResponse = self.core.generate_typed(&prompt, None).await?;
        if response.options.is_empty() {
            return Err(AgentError::ValidationError(
                "design response contained no options".to_string(),
            ));
        }
        Ok(response)
    }

    /// 生成设计方案；失败时返回恰好一套语气默认设计
    pub async fn generate_design_system(
        &mut self,
        ctx: &mut AgentContext,
        num_options: usize,
    ) -> Vec<DesignOption> {
        self.core.log_decision(
            "디자인 시스템 생성 시작",
            format!("주제: {}, 청중: {}, 톤: {}", ctx.topic, ctx.audience, ctx.tone),
            1.0,
        );
        tracing::info!("{}", self.core.explain_llm_choice());

        let response = match self.request_options(ctx, num_options).await {
            Ok(response) => response,
            Err(e) => {
                self.core.log_decision(
                    "디자인 폴백",
                    format!("디자인 생성 실패, 기본 디자인 사용: {}", e),
                    0.6,
                );
                let fallback = tone_default(&ctx.tone);
                ctx.artifacts.design_options = vec![fallback.clone()];
                ctx.artifacts.design_recommendation = Some(0);
                return vec![fallback];
            }
        };

        let options: Vec<DesignOption> = response
            .options
            .into_iter()
            .map(OptionItem::into_option)
            .collect();
        for option in &options {
            self.core.log_decision(
                format!("디자인 옵션: {}", option.name),
                option.rationale.clone(),
                1.0,
            );
        }

        let recommendation = if response.recommendation < options.len() {
            response.recommendation
        } else {
            0
        };
        self.core.log_decision(
            format!("추천 옵션: #{}", recommendation + 1),
            response.recommendation_reason,
            1.0,
        );

        ctx.artifacts.design_options = options.clone();
        ctx.artifacts.design_recommendation = Some(recommendation);
        options
    }

    /// 评估视觉质量；颜色不是合法的 #RRGGBB 时返回 ValidationError
    pub fn evaluate_visual_quality(
        &mut self,
        presentation: &Presentation,
    ) -> Result<VisualEvaluation, AgentError> {
        self.core
            .log_decision("시각적 품질 평가", "디자인 일관성 및 가독성 검토", 1.0);
        let evaluation = VisualEvaluation::of(presentation)?;
        self.core.log_decision(
            "평가 완료",
            format!(
                "전체 통과: {}, 대비율: {}",
                evaluation.overall_pass, evaluation.contrast_ratio
            ),
            1.0,
        );
        Ok(evaluation)
    }
}

#[async_trait]
impl Agent for DesignAgent {
    type Output = Vec<DesignOption>;

    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn execute(&mut self, ctx: &mut AgentContext) -> Result<Self::Output, AgentError> {
        let options = self.generate_design_system(ctx, 3).await;
        ctx.add_decision(
            "Design Agent 실행 완료",
            format!("{}개 디자인 옵션 생성", options.len()),
            1.0,
        );
        Ok(options)
    }
}
