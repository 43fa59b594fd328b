//! 幻灯片与演示文稿数据模型
//!
//! Presentation 独占其 Slide 列表与 DesignSystem；add_slide 时按列表长度重新编号。

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::core::rationale_or_placeholder;

/// 幻灯片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    Title,
    Content,
    Section,
    TwoColumn,
    Image,
    Chart,
    Conclusion,
}

impl SlideType {
    /// 未知标签一律按 content 处理
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "title" => SlideType::Title,
            "section" => SlideType::Section,
            "two_column" => SlideType::TwoColumn,
            "image" => SlideType::Image,
            "chart" => SlideType::Chart,
            "conclusion" => SlideType::Conclusion,
            _ => SlideType::Content,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideType::Title => "title",
            SlideType::Content => "content",
            SlideType::Section => "section",
            SlideType::TwoColumn => "two_column",
            SlideType::Image => "image",
            SlideType::Chart => "chart",
            SlideType::Conclusion => "conclusion",
        }
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可信度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// 缺失或未知的标签按 medium 处理
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_lowercase()).as_deref() {
            Some("high") => ConfidenceLevel::High,
            Some("low") => ConfidenceLevel::Low,
            _ => ConfidenceLevel::Medium,
        }
    }

    /// 质量评分权重（固定策略常量）
    pub fn weight(&self) -> f64 {
        match self {
            ConfidenceLevel::High => 1.0,
            ConfidenceLevel::Medium => 0.7,
            ConfidenceLevel::Low => 0.4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 调研结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub topic: String,
    pub content: String,
    pub source: String,
    pub confidence: ConfidenceLevel,
    pub timestamp: DateTime<Local>,
    /// Glass Box：选取这条信息的理由
    pub rationale: String,
}

impl ResearchResult {
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        confidence: ConfidenceLevel,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            source: source.into(),
            confidence,
            timestamp: Local::now(),
            rationale: rationale_or_placeholder(rationale),
        }
    }
}

/// 幻灯片内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    #[serde(default)]
    pub body: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<serde_json::Value>,
}

/// 单张幻灯片
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    pub slide_type: SlideType,
    pub content: SlideContent,
    pub order: usize,
    pub key_message: String,
    /// Glass Box：这张幻灯片存在的理由
    pub rationale: String,
}

/// 设计系统
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSystem {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub text_color: String,
    pub font_title: String,
    pub font_body: String,
    pub font_size_title: u32,
    pub font_size_body: u32,
}

impl Default for DesignSystem {
    fn default() -> Self {
        Self {
            primary_color: "#1E3A8A".to_string(),
            secondary_color: "#3B82F6".to_string(),
            accent_color: "#F59E0B".to_string(),
            background_color: "#FFFFFF".to_string(),
            text_color: "#1F2937".to_string(),
            font_title: "맑은 고딕".to_string(),
            font_body: "맑은 고딕".to_string(),
            font_size_title: 44,
            font_size_body: 18,
        }
    }
}

impl DesignSystem {
    /// 仅替换五个颜色，字体保持默认
    pub fn with_palette(primary: &str, secondary: &str, accent: &str, background: &str, text: &str) -> Self {
        Self {
            primary_color: primary.to_string(),
            secondary_color: secondary.to_string(),
            accent_color: accent.to_string(),
            background_color: background.to_string(),
            text_color: text.to_string(),
            ..Self::default()
        }
    }
}

/// Design Agent 给出的命名设计方案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignOption {
    pub name: String,
    pub description: String,
    pub system: DesignSystem,
    pub style_keywords: Vec<String>,
    pub rationale: String,
}

/// 演示文稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    pub topic: String,
    pub audience: String,
    pub tone: String,
    pub slides: Vec<Slide>,
    pub research_results: Vec<ResearchResult>,
    pub design: DesignSystem,
    pub created_at: DateTime<Local>,
}

impl Presentation {
    pub fn new(topic: impl Into<String>, audience: impl Into<String>, tone: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            audience: audience.into(),
            tone: tone.into(),
            slides: Vec::new(),
            research_results: Vec::new(),
            design: DesignSystem::default(),
            created_at: Local::now(),
        }
    }

    /// 追加幻灯片，order 重置为追加后的位置（从 1 开始）
    pub fn add_slide(&mut self, mut slide: Slide) {
        slide.order = self.slides.len() + 1;
        self.slides.push(slide);
    }

    /// 替换全部幻灯片（重新生成结构时使用）
    pub fn replace_slides(&mut self, slides: Vec<Slide>) {
        self.slides.clear();
        for slide in slides {
            self.add_slide(slide);
        }
    }

    pub fn has_slide_type(&self, slide_type: SlideType) -> bool {
        self.slides.iter().any(|s| s.slide_type == slide_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(slide_type: SlideType, order: usize) -> Slide {
        Slide {
            slide_type,
            content: SlideContent {
                title: "t".into(),
                ..Default::default()
            },
            order,
            key_message: String::new(),
            rationale: "r".into(),
        }
    }

    #[test]
    fn test_add_slide_reassigns_order() {
        let mut p = Presentation::new("주제", "일반", "professional");
        p.add_slide(slide(SlideType::Title, 9));
        p.add_slide(slide(SlideType::Content, 9));
        assert_eq!(p.slides[0].order, 1);
        assert_eq!(p.slides[1].order, 2);

        p.replace_slides(vec![slide(SlideType::Conclusion, 7)]);
        assert_eq!(p.slides.len(), 1);
        assert_eq!(p.slides[0].order, 1);
        assert!(p.has_slide_type(SlideType::Conclusion));
    }

    #[test]
    fn test_slide_type_labels() {
        assert_eq!(SlideType::from_label("two_column"), SlideType::TwoColumn);
        assert_eq!(SlideType::from_label(" Title "), SlideType::Title);
        assert_eq!(SlideType::from_label("timeline"), SlideType::Content);
        assert_eq!(
            serde_json::to_value(SlideType::TwoColumn).unwrap(),
            serde_json::json!("two_column")
        );
    }

    #[test]
    fn test_confidence_defaults_to_medium() {
        assert_eq!(ConfidenceLevel::from_label(Some("HIGH")), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_label(Some("low")), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_label(Some("certain")), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_label(None), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_design_defaults() {
        let d = DesignSystem::default();
        assert_eq!(d.primary_color, "#1E3A8A");
        assert_eq!(d.font_size_body, 18);
        let casual = DesignSystem::with_palette("#7C3AED", "#A78BFA", "#F472B6", "#FAFAFA", "#374151");
        assert_eq!(casual.font_title, "맑은 고딕");
        assert_eq!(casual.background_color, "#FAFAFA");
    }
}
