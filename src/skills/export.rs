//! Export Skill：把 Presentation 写成文件
//!
//! JSON（完整数据模型）或 Markdown（逐页大纲 + 讲者备注 + 设计摘要）。
//! 未指定路径时写到 `<output_dir>/<safe_topic>.<ext>`，并创建父目录。

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::core::AgentError;
use crate::models::Presentation;
use crate::skills::design::layout_for;

pub const EXPORT_SKILL_NAME: &str = "Export Skill";

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
}

impl ExportFormat {
    /// `.md` / `.markdown` → Markdown，其余 → JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("md") | Some("markdown") => ExportFormat::Markdown,
            _ => ExportFormat::Json,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn exporter(&self, output_dir: impl Into<PathBuf>) -> Box<dyn Exporter> {
        match self {
            ExportFormat::Json => Box::new(JsonExporter::new(output_dir)),
            ExportFormat::Markdown => Box::new(MarkdownExporter::new(output_dir)),
        }
    }
}

/// 文件名安全的主题：前 30 个字符中保留字母数字与 ` _-`，空格替换为 `_`
pub fn safe_topic(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .take(30)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let name = kept.trim().replace(' ', "_");
    if name.is_empty() {
        "presentation".to_string()
    } else {
        name
    }
}

pub trait Exporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn output_dir(&self) -> &Path;

    fn render(&self, presentation: &Presentation) -> Result<String, AgentError>;

    fn default_path(&self, presentation: &Presentation) -> PathBuf {
        self.output_dir().join(format!(
            "{}.{}",
            safe_topic(&presentation.topic),
            self.format().extension()
        ))
    }

    /// 写出文件，返回最终路径
    fn export(&self, presentation: &Presentation, path: Option<&Path>) -> Result<PathBuf, AgentError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_path(presentation));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.render(presentation)?)?;
        tracing::info!(path = %path.display(), slides = presentation.slides.len(), "Presentation exported");
        Ok(path)
    }
}

pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn render(&self, presentation: &Presentation) -> Result<String, AgentError> {
        Ok(serde_json::to_string_pretty(presentation)?)
    }
}

pub struct MarkdownExporter {
    output_dir: PathBuf,
}

impl MarkdownExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl Exporter for MarkdownExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Markdown
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn render(&self, p: &Presentation) -> Result<String, AgentError> {
        let d = &p.design;
        let mut out = String::new();
        // String 的 fmt::Write 不会失败
        let _ = writeln!(out, "# {}\n", p.topic);
        let _ = writeln!(out, "- 청중: {}", p.audience);
        let _ = writeln!(out, "- 톤: {}", p.tone);
        let _ = writeln!(out, "- 생성 시각: {}", p.created_at.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(
            out,
            "- 디자인: {} / {} / {} (배경 {}, 글자 {}), 글꼴 {} {}pt / {} {}pt\n",
            d.primary_color,
            d.secondary_color,
            d.accent_color,
            d.background_color,
            d.text_color,
            d.font_title,
            d.font_size_title,
            d.font_body,
            d.font_size_body
        );

        for slide in &p.slides {
            let _ = writeln!(
                out,
                "## {}. {} `[{} · {}]`\n",
                slide.order,
                slide.content.title,
                slide.slide_type,
                layout_for(slide.slide_type).name
            );
            for bullet in &slide.content.body {
                let _ = writeln!(out, "- {}", bullet);
            }
            if !slide.key_message.is_empty() {
                let _ = writeln!(out, "\n> 핵심 메시지: {}", slide.key_message);
            }
            if !slide.content.notes.is_empty() {
                let _ = writeln!(out, "\n발표자 노트: {}", slide.content.notes);
            }
            out.push('\n');
        }

        if !p.research_results.is_empty() {
            let _ = writeln!(out, "## 참고 자료\n");
            for r in &p.research_results {
                let _ = writeln!(out, "- {} ({}, 신뢰도: {})", r.topic, r.source, r.confidence);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Slide, SlideContent, SlideType};

    fn presentation() -> Presentation {
        let mut p = Presentation::new("AI 기술 트렌드 2024", "일반", "professional");
        p.add_slide(Slide {
            slide_type: SlideType::Title,
            content: SlideContent {
                title: "AI 기술 트렌드 2024".into(),
                body: vec!["핵심 동향".into()],
                notes: "인사".into(),
                ..Default::default()
            },
            order: 0,
            key_message: "주제 소개".into(),
            rationale: "도입".into(),
        });
        p
    }

    #[test]
    fn test_safe_topic() {
        assert_eq!(safe_topic("AI 기술 트렌드 2024"), "AI_기술_트렌드_2024");
        assert_eq!(safe_topic("a/b:c?"), "abc");
        assert_eq!(safe_topic("  ///  "), "presentation");
        assert_eq!(safe_topic(&"가".repeat(40)).chars().count(), 30);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out/deck.md")), ExportFormat::Markdown);
        assert_eq!(ExportFormat::from_path(Path::new("deck.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("deck.pptx")), ExportFormat::Json);
    }

    #[test]
    fn test_json_export_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path().join("nested"));
        let path = exporter.export(&presentation(), None).unwrap();
        assert_eq!(path, dir.path().join("nested").join("AI_기술_트렌드_2024.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["slides"][0]["slide_type"], "title");
        assert_eq!(written["slides"][0]["order"], 1);
    }

    #[test]
    fn test_markdown_export_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deck.md");
        let exporter = ExportFormat::from_path(&target).exporter(dir.path());
        let path = exporter.export(&presentation(), Some(&target)).unwrap();
        assert_eq!(path, target);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# AI 기술 트렌드 2024"));
        assert!(text.contains("## 1. AI 기술 트렌드 2024 `[title · title_centered]`"));
        assert!(text.contains("> 핵심 메시지: 주제 소개"));
        assert!(text.contains("발표자 노트: 인사"));
    }
}
