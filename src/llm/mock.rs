//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按 prompt 中的特征字段匹配固定响应：请求分析、调研、幻灯片结构、设计方案、配色；
//! JSON 响应包在 ```json 代码块中，以覆盖剥离逻辑。其余 prompt 回显为文本。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::AgentError;
use crate::llm::{LlmClient, LlmResponse, Message, Provider, Role};

const MOCK_MODEL: &str = "mock-fixture";

/// Mock 客户端：按 prompt 特征返回固定数据
#[derive(Debug, Default)]
pub struct MockLlmClient {
    calls: AtomicUsize,
    fixed: Option<Value>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 无论 prompt 为何都返回同一份 JSON
    pub fn fixed(value: Value) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fixed: Some(value),
        }
    }

    /// 已处理的请求数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

/// 取 `label` 开头那一行冒号后的值
fn line_value<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(label))
        .map(|rest| rest.trim_start_matches([':', '：']).trim())
        .filter(|v| !v.is_empty())
}

/// 从请求分析 prompt 中取出用户原文
fn user_request(prompt: &str) -> &str {
    let start = prompt
        .find("사용자 요청:")
        .map(|i| i + "사용자 요청:".len())
        .unwrap_or(0);
    let rest = &prompt[start..];
    let end = rest.find("\n\n다음 JSON").unwrap_or(rest.len());
    rest[..end].trim()
}

fn analysis_fixture(prompt: &str) -> Value {
    let request = user_request(prompt);
    let topic = request.lines().next().unwrap_or(request).trim();
    let audience = line_value(request, "대상 청중:").unwrap_or("일반");
    let tone = line_value(request, "톤:").unwrap_or("professional");
    json!({
        "topic": topic,
        "audience": audience,
        "tone": tone,
        "requirements": ["핵심 트렌드 중심으로 구성"],
        "constraints": [],
        "slide_count_suggestion": 5,
        "reasoning": "입력 문장에서 주제를 그대로 추출하고 청중/톤은 명시된 값 또는 기본값을 사용"
    })
}

fn research_fixture(prompt: &str) -> Value {
    let topic = line_value(prompt, "주제:").unwrap_or("주제");
    json!({
        "research_strategy": format!("'{}'의 최신 동향, 주요 사례, 시장 수치, 과제, 전망 순으로 정보 수집", topic),
        "results": [
            {
                "topic": "현황 개요",
                "content": format!("{}의 전반적인 현황과 최근 변화 요약.", topic),
                "source": "업계 보고서",
                "confidence": "high",
                "reasoning": "도입부에서 청중의 배경 지식을 맞추기 위해 필요"
            },
            {
                "topic": "주요 사례",
                "content": "대표 기업과 기관의 적용 사례.",
                "source": "기업 발표 자료",
                "confidence": "high",
                "reasoning": "구체적 사례가 설득력을 높임"
            },
            {
                "topic": "시장 수치",
                "content": "시장 규모와 성장률 추정치.",
                "source": "시장 조사 기관",
                "confidence": "medium",
                "reasoning": "규모감을 전달하는 정량 근거"
            },
            {
                "topic": "과제와 리스크",
                "content": "규제, 비용, 인력 측면의 과제.",
                "source": "정책 보고서",
                "confidence": "high",
                "reasoning": "균형 잡힌 시각 제공"
            },
            {
                "topic": "향후 전망",
                "content": "향후 2-3년의 예상 흐름.",
                "source": "전문가 전망",
                "confidence": "unsure",
                "reasoning": "결론 슬라이드의 Call to Action 근거"
            }
        ],
        "summary": format!("{}에 대한 현황, 사례, 수치, 과제, 전망을 5개 항목으로 정리", topic),
        "key_insights": ["빠른 확산", "사례 기반 검증 필요", "규제 대응이 관건"]
    })
}

fn structure_fixture(prompt: &str) -> Value {
    let topic = line_value(prompt, "주제:").unwrap_or("발표");
    // order 提示故意倒序：编号以列表位置为准
    json!({
        "storyline": format!("{} 소개 → 현황 → 사례 → 과제 → 결론", topic),
        "slides": [
            {
                "slide_type": "title",
                "order": 5,
                "title": topic,
                "body": ["핵심 동향 한눈에 보기"],
                "key_message": "오늘 다룰 주제 소개",
                "notes": "인사와 함께 주제를 소개합니다.",
                "reasoning": "청중의 관심을 유도하는 도입"
            },
            {
                "slide_type": "content",
                "order": 4,
                "title": "현황 개요",
                "body": ["최근 변화", "주요 플레이어", "확산 속도"],
                "key_message": "변화가 빠르게 진행 중",
                "notes": "현황 수치를 짚어 줍니다.",
                "reasoning": "배경 지식 정렬"
            },
            {
                "slide_type": "two_column",
                "order": 3,
                "title": "주요 사례",
                "body": ["기업 사례", "공공 사례", "성과 비교"],
                "key_message": "사례가 가능성을 증명",
                "notes": "좌우 비교로 설명합니다.",
                "reasoning": "구체 사례로 설득"
            },
            {
                "slide_type": "timeline",
                "order": 2,
                "title": "과제와 리스크",
                "body": ["규제", "비용", "인력"],
                "key_message": "과제 해결이 확산의 전제",
                "notes": "리스크를 균형 있게 다룹니다.",
                "reasoning": "균형 잡힌 시각"
            },
            {
                "slide_type": "conclusion",
                "order": 1,
                "title": "결론 및 제언",
                "body": ["지금 준비할 것", "단계적 도입", "지속 모니터링"],
                "key_message": "작게 시작해 빠르게 검증",
                "notes": "행동 제안으로 마무리합니다.",
                "reasoning": "Call to Action"
            }
        ],
        "structure_reasoning": "기-승-전-결 구조로 5장 구성"
    })
}

fn design_fixture() -> Value {
    json!({
        "options": [
            {
                "name": "Corporate Blue",
                "description": "신뢰감 있는 블루 계열",
                "primary_color": "#1E3A8A",
                "secondary_color": "#3B82F6",
                "accent_color": "#F59E0B",
                "background_color": "#FFFFFF",
                "text_color": "#1F2937",
                "font_title": "맑은 고딕",
                "font_body": "맑은 고딕",
                "font_size_title": 44,
                "font_size_body": 18,
                "style_keywords": ["trust", "clean"],
                "reasoning": "비즈니스 청중에게 익숙한 안정적 배색"
            },
            {
                "name": "Modern Navy",
                "description": "차분한 네이비와 시안 포인트",
                "primary_color": "#0F172A",
                "secondary_color": "#334155",
                "accent_color": "#22D3EE",
                "background_color": "#F8FAFC",
                "text_color": "#0F172A",
                "font_title": "나눔스퀘어",
                "font_body": "나눔고딕",
                "font_size_title": 40,
                "font_size_body": 18,
                "style_keywords": ["modern", "tech"],
                "reasoning": "기술 주제에 어울리는 현대적 느낌"
            },
            {
                "name": "Tech Gradient",
                "description": "보라 계열 그라디언트",
                "primary_color": "#4F46E5",
                "secondary_color": "#7C3AED",
                "accent_color": "#06B6D4",
                "background_color": "#FFFFFF",
                "text_color": "#1E293B",
                "font_title": "나눔스퀘어",
                "font_body": "나눔고딕",
                "font_size_title": 44,
                "font_size_body": 20,
                "style_keywords": ["vivid", "future"],
                "reasoning": "미래지향적 메시지 강조"
            }
        ],
        "recommendation": 0,
        "recommendation_reason": "청중이 일반 비즈니스 환경이므로 가장 무난한 배색"
    })
}

fn palette_fixture() -> Value {
    json!({
        "primary": "#4F46E5",
        "secondary": "#7C3AED",
        "accent": "#06B6D4",
        "background": "#FFFFFF",
        "text": "#1E293B",
        "reasoning": "Indigo conveys innovation while keeping strong text contrast"
    })
}

/// 按特征字段匹配固定响应；None 表示按文本回显
fn fixture_for(prompt: &str) -> Option<Value> {
    if prompt.contains("design system option") {
        Some(design_fixture())
    } else if prompt.contains("color palette") {
        Some(palette_fixture())
    } else if prompt.contains("slide_count_suggestion") {
        Some(analysis_fixture(prompt))
    } else if prompt.contains("\"slides\"") {
        Some(structure_fixture(prompt))
    } else if prompt.contains("research_strategy") {
        Some(research_fixture(prompt))
    } else {
        None
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> Provider {
        Provider::Mock
    }

    fn model(&self) -> &str {
        MOCK_MODEL
    }

    async fn complete(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        let content = match self.fixed.clone().or_else(|| fixture_for(last_user)) {
            Some(value) => format!("```json\n{}\n```", serde_json::to_string_pretty(&value)?),
            None => format!(
                "Mock 응답: {}",
                last_user.lines().next().unwrap_or_default()
            ),
        };
        Ok(LlmResponse::new(content, MOCK_MODEL))
    }
}
