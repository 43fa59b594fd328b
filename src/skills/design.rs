//! Design Skill：配色、字体、版式模板与对比度校验
//!
//! 预置五套韩国商务演示配色；语气决定默认配色与字体。
//! generate_color_palette 先请求视觉类后端，失败时退回预置配色。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::llm::{lenient, TaskRouter, TaskType};
use crate::models::{DesignSystem, SlideType};

/// WCAG AA 正文对比度下限
pub const WCAG_AA_RATIO: f64 = 4.5;

/// 预置配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedPalette {
    pub name: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub text: &'static str,
}

pub const PALETTES: [NamedPalette; 5] = [
    NamedPalette {
        name: "corporate_blue",
        primary: "#1E3A8A",
        secondary: "#3B82F6",
        accent: "#F59E0B",
        background: "#FFFFFF",
        text: "#1F2937",
    },
    NamedPalette {
        name: "modern_navy",
        primary: "#0F172A",
        secondary: "#334155",
        accent: "#22D3EE",
        background: "#F8FAFC",
        text: "#0F172A",
    },
    NamedPalette {
        name: "tech_gradient",
        primary: "#4F46E5",
        secondary: "#7C3AED",
        accent: "#06B6D4",
        background: "#FFFFFF",
        text: "#1E293B",
    },
    NamedPalette {
        name: "nature_green",
        primary: "#047857",
        secondary: "#10B981",
        accent: "#F59E0B",
        background: "#FFFFFF",
        text: "#1F2937",
    },
    NamedPalette {
        name: "warm_coral",
        primary: "#DC2626",
        secondary: "#F87171",
        accent: "#FBBF24",
        background: "#FFFBEB",
        text: "#1F2937",
    },
];

pub fn palette(name: &str) -> Option<&'static NamedPalette> {
    PALETTES.iter().find(|p| p.name == name)
}

/// 语气 → 预置配色；未知语气按 professional
pub fn palette_for_tone(tone: &str) -> &'static NamedPalette {
    let name = match tone {
        "casual" => "tech_gradient",
        "academic" => "modern_navy",
        _ => "corporate_blue",
    };
    palette(name).unwrap_or(&PALETTES[0])
}

/// 一组配色（可能来自 LLM）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

impl From<&NamedPalette> for ColorPalette {
    fn from(p: &NamedPalette) -> Self {
        Self {
            primary: p.primary.to_string(),
            secondary: p.secondary.to_string(),
            accent: p.accent.to_string(),
            background: p.background.to_string(),
            text: p.text.to_string(),
        }
    }
}

/// 标题 / 正文字体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typography {
    pub style: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

pub const TYPOGRAPHY: [Typography; 4] = [
    Typography { style: "professional", title: "맑은 고딕", body: "맑은 고딕" },
    Typography { style: "modern", title: "나눔스퀘어", body: "나눔고딕" },
    Typography { style: "creative", title: "나눔바른펜", body: "나눔고딕" },
    Typography { style: "academic", title: "본명조", body: "본고딕" },
];

/// 语气 → 字体风格（casual 用 modern）
pub fn typography_for_tone(tone: &str) -> &'static Typography {
    let style = match tone {
        "casual" => "modern",
        "academic" => "academic",
        _ => "professional",
    };
    TYPOGRAPHY
        .iter()
        .find(|t| t.style == style)
        .unwrap_or(&TYPOGRAPHY[0])
}

/// 英寸坐标 (left, top, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

const fn at(left: f32, top: f32, width: f32, height: f32) -> Placement {
    Placement { left, top, width, height }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutTemplate {
    pub name: &'static str,
    pub slide_type: SlideType,
    pub title: Placement,
    pub content: Placement,
    pub image: Option<Placement>,
    pub description: &'static str,
}

pub const LAYOUTS: [LayoutTemplate; 4] = [
    LayoutTemplate {
        name: "title_centered",
        slide_type: SlideType::Title,
        title: at(1.0, 2.5, 8.0, 1.5),
        content: at(1.0, 4.0, 8.0, 0.75),
        image: None,
        description: "중앙 정렬 타이틀 슬라이드",
    },
    LayoutTemplate {
        name: "content_standard",
        slide_type: SlideType::Content,
        title: at(0.5, 0.5, 9.0, 1.0),
        content: at(0.5, 1.5, 9.0, 4.5),
        image: None,
        description: "표준 콘텐츠 레이아웃",
    },
    LayoutTemplate {
        name: "two_column",
        slide_type: SlideType::TwoColumn,
        title: at(0.5, 0.5, 9.0, 1.0),
        content: at(0.5, 1.5, 4.0, 4.5),
        image: Some(at(5.0, 1.5, 4.5, 4.5)),
        description: "2단 레이아웃",
    },
    LayoutTemplate {
        name: "image_focus",
        slide_type: SlideType::Image,
        title: at(0.5, 0.3, 9.0, 0.75),
        content: at(0.5, 4.5, 4.0, 1.0),
        image: Some(at(0.5, 1.2, 9.0, 3.2)),
        description: "이미지 중심 레이아웃",
    },
];

/// 没有专用模板的类型使用标准内容版式
pub fn layout_for(slide_type: SlideType) -> &'static LayoutTemplate {
    LAYOUTS
        .iter()
        .find(|l| l.slide_type == slide_type)
        .unwrap_or(&LAYOUTS[1])
}

/// 解析 `#RRGGBB`
pub fn parse_hex(color: &str) -> Result<[u8; 3], AgentError> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AgentError::ValidationError(format!(
            "malformed hex color: {:?}",
            color
        )));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|e| AgentError::ValidationError(format!("malformed hex color {:?}: {}", color, e)))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// WCAG 相对亮度
pub fn relative_luminance(color: &str) -> Result<f64, AgentError> {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let [r, g, b] = parse_hex(color)?;
    Ok(0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContrastCheck {
    pub ratio: f64,
    pub passes_aa: bool,
}

/// WCAG 对比度 (L1 + 0.05) / (L2 + 0.05)，AA 要求 ≥ 4.5
pub fn validate_contrast(background: &str, text: &str) -> Result<ContrastCheck, AgentError> {
    let bg = relative_luminance(background)?;
    let fg = relative_luminance(text)?;
    let (lighter, darker) = if bg >= fg { (bg, fg) } else { (fg, bg) };
    let ratio = (lighter + 0.05) / (darker + 0.05);
    Ok(ContrastCheck {
        ratio,
        passes_aa: ratio >= WCAG_AA_RATIO,
    })
}

/// 配色 + 语气对应字体 → 完整设计系统
pub fn design_system_from(palette: &ColorPalette, tone: &str) -> DesignSystem {
    let typography = typography_for_tone(tone);
    DesignSystem {
        font_title: typography.title.to_string(),
        font_body: typography.body.to_string(),
        ..DesignSystem::with_palette(
            &palette.primary,
            &palette.secondary,
            &palette.accent,
            &palette.background,
            &palette.text,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PaletteResponse {
    #[serde(deserialize_with = "lenient")]
    primary: Option<String>,
    #[serde(deserialize_with = "lenient")]
    secondary: Option<String>,
    #[serde(deserialize_with = "lenient")]
    accent: Option<String>,
    #[serde(deserialize_with = "lenient")]
    background: Option<String>,
    #[serde(deserialize_with = "lenient")]
    text: Option<String>,
    #[serde(deserialize_with = "lenient")]
    reasoning: String,
}

pub struct DesignSkill {
    router: Arc<TaskRouter>,
}

impl DesignSkill {
    pub fn new(router: Arc<TaskRouter>) -> Self {
        Self { router }
    }

    /// 请求定制配色；任何失败都退回语气对应的预置配色
    pub async fn generate_color_palette(&self, topic: &str, tone: &str, audience: &str) -> ColorPalette {
        let fallback = palette_for_tone(tone);
        tracing::info!(tone, "Generating color palette");

        let prompt = format!(
            r##"Generate a color palette for a presentation.

Topic: {topic}
Tone: {tone}
Audience: {audience}

Based on the topic and context, suggest a color palette in JSON format:
{{
    "primary": "#HEXCODE",
    "secondary": "#HEXCODE",
    "accent": "#HEXCODE",
    "background": "#HEXCODE",
    "text": "#HEXCODE",
    "reasoning": "Why these colors work for this context"
}}

Consider color psychology and Korean business culture."##
        );

        let result = match self.router.generate_json(TaskType::Design, &prompt, None).await {
            Ok(value) => serde_json::from_value::<PaletteResponse>(value).map_err(AgentError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                let preview: String = response.reasoning.chars().take(50).collect();
                tracing::info!("Palette generated: {}...", preview);
                let pick = |v: Option<String>, d: &str| v.filter(|s| parse_hex(s).is_ok()).unwrap_or_else(|| d.to_string());
                let base = &PALETTES[0];
                ColorPalette {
                    primary: pick(response.primary, base.primary),
                    secondary: pick(response.secondary, base.secondary),
                    accent: pick(response.accent, base.accent),
                    background: pick(response.background, base.background),
                    text: pick(response.text, base.text),
                }
            }
            Err(e) => {
                tracing::warn!(palette = fallback.name, "Palette generation failed, using preset: {}", e);
                ColorPalette::from(fallback)
            }
        }
    }

    pub async fn create_design_system(&self, topic: &str, tone: &str, audience: &str) -> DesignSystem {
        let palette = self.generate_color_palette(topic, tone, audience).await;
        let design = design_system_from(&palette, tone);
        tracing::info!(
            primary = %design.primary_color,
            font = %design.font_title,
            "Design system created"
        );
        design
    }
}
