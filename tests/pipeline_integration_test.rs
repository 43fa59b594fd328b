//! 流水线集成测试（Mock 模式，输出写到临时目录）

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use ppt_agent::config::AppConfig;
use ppt_agent::core::orchestrator::{STAGE_CONFIRM, STAGE_RESEARCH, STAGE_STRUCTURE};
use ppt_agent::core::{AutoApprove, HitlResponder, ScriptedResponder, TodoStatus};
use ppt_agent::llm::{LlmClient, LlmResponse, Message, MockLlmClient, Provider, Role, TaskRouter};
use ppt_agent::models::{ConfidenceLevel, SlideType};
use ppt_agent::{AgentError, PipelineOptions, PptAgent};

const TOPIC: &str = "AI 기술 트렌드 2024";

fn mock_config(output_dir: &Path, max_hitl: usize) -> AppConfig {
    let mut cfg = AppConfig::mock();
    cfg.agent.output_dir = output_dir.to_path_buf();
    cfg.agent.max_hitl_interactions = max_hitl;
    cfg
}

/// 对指定后端一律返回生成失败
struct FailingClient(Provider);

#[async_trait]
impl LlmClient for FailingClient {
    fn provider(&self) -> Provider {
        self.0
    }

    fn model(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _messages: &[Message]) -> Result<LlmResponse, AgentError> {
        Err(AgentError::generation(self.0, "connection refused"))
    }
}

/// 结构生成请求失败，其余交给 Mock
struct FailOnStructure(MockLlmClient);

#[async_trait]
impl LlmClient for FailOnStructure {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    fn model(&self) -> &str {
        "flaky"
    }

    async fn complete(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let is_structure = messages
            .iter()
            .any(|m| matches!(m.role, Role::User) && m.content.contains("\"slides\""));
        if is_structure {
            return Err(AgentError::generation(Provider::Claude, "quota exceeded"));
        }
        self.0.complete(messages).await
    }
}

#[tokio::test]
async fn test_end_to_end_mock_run() {
    let dir = tempfile::tempdir().unwrap();
    let responder = Arc::new(ScriptedResponder::new(["1", "2", "1"]));
    let mut agent = PptAgent::new(
        mock_config(dir.path(), 4),
        responder.clone(),
        PipelineOptions::default(),
    )
    .unwrap();

    let report = agent.run(TOPIC, None).await.unwrap();

    let slides = &report.presentation.slides;
    assert_eq!(slides.len(), 5);
    assert_eq!(slides[0].slide_type, SlideType::Title);
    assert_eq!(slides[4].slide_type, SlideType::Conclusion);
    assert_eq!(
        slides.iter().map(|s| s.order).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );

    let research = &report.presentation.research_results;
    assert_eq!(research.len(), 5);
    assert!(research.iter().any(|r| r.confidence == ConfidenceLevel::High));
    assert_eq!(report.research_evaluation.total_results, 5);

    // 第二个回答选择 Modern Navy
    assert_eq!(report.presentation.design.primary_color, "#0F172A");
    assert!(report.visual_evaluation.as_ref().unwrap().overall_pass);

    assert_eq!(responder.asked().len(), 3);
    assert_eq!(agent.orchestrator().hitl_count(), 3);
    assert!(report.todos.iter().all(|t| t.status == TodoStatus::Completed));

    assert!(report.output_path.starts_with(dir.path()));
    assert_eq!(report.output_path.extension().unwrap(), "json");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report.output_path).unwrap()).unwrap();
    assert_eq!(written["topic"], TOPIC);
    assert_eq!(written["slides"].as_array().unwrap().len(), 5);

    let trail = agent.decision_trail();
    assert!(!trail.is_empty());
    assert!(trail.iter().all(|d| !d.rationale.is_empty()));
    assert!(trail.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_zero_hitl_budget_auto_proceeds() {
    let dir = tempfile::tempdir().unwrap();
    let responder = Arc::new(ScriptedResponder::new(["2", "2", "2"]));
    let mut agent = PptAgent::new(
        mock_config(dir.path(), 0),
        responder.clone(),
        PipelineOptions::default(),
    )
    .unwrap();

    let report = agent.run(TOPIC, None).await.unwrap();

    assert!(responder.asked().is_empty());
    assert_eq!(agent.orchestrator().hitl_count(), 0);
    // 没有回答时采用推荐方案
    assert_eq!(report.presentation.design.primary_color, "#1E3A8A");
    let skips = agent
        .orchestrator()
        .decisions()
        .iter()
        .filter(|d| d.action == "HITL 스킵")
        .count();
    assert_eq!(skips, 3);
}

#[tokio::test]
async fn test_hitl_budget_caps_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let responder = Arc::new(ScriptedResponder::new(["아니요", "사례 중심으로", "2"]));
    let mut agent = PptAgent::new(
        mock_config(dir.path(), 2),
        responder.clone(),
        PipelineOptions::default(),
    )
    .unwrap();

    agent.run(TOPIC, None).await.unwrap();

    assert_eq!(responder.asked().len(), 2);
    assert_eq!(agent.orchestrator().hitl_count(), 2);
    let ctx = agent.context().unwrap();
    assert!(ctx.requirements.iter().any(|r| r == "사례 중심으로"));
}

#[tokio::test]
async fn test_structure_regeneration() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLlmClient::new());
    let router = TaskRouter::new(&AppConfig::mock());
    router.install(Provider::Mock, mock.clone());

    let responder: Arc<dyn HitlResponder> =
        Arc::new(ScriptedResponder::new(["1", "1", "다시 만들어주세요"]));
    let mut agent = PptAgent::with_router(
        mock_config(dir.path(), 4),
        Arc::new(router),
        responder,
        PipelineOptions::default(),
    );

    let report = agent.run(TOPIC, None).await.unwrap();
    assert_eq!(report.presentation.slides.len(), 5);
    // analyze + research + design + structure × 2
    assert_eq!(mock.call_count(), 5);
    assert!(agent
        .orchestrator()
        .decisions()
        .iter()
        .any(|d| d.action == "구조 재생성" && d.rationale == "다시 만들어주세요"));
}

#[tokio::test]
async fn test_design_fallback_on_provider_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.agent.output_dir = dir.path().to_path_buf();

    let router = TaskRouter::new(&cfg);
    router.install(Provider::Claude, Arc::new(MockLlmClient::new()));
    router.install(Provider::Gemini, Arc::new(FailingClient(Provider::Gemini)));

    let mut agent = PptAgent::with_router(
        cfg,
        Arc::new(router),
        Arc::new(AutoApprove),
        PipelineOptions::default(),
    );

    let report = agent
        .run(&format!("{}\n톤: casual", TOPIC), None)
        .await
        .unwrap();

    assert_eq!(report.presentation.tone, "casual");
    assert_eq!(report.presentation.design.primary_color, "#7C3AED");
    let ctx = agent.context().unwrap();
    assert_eq!(ctx.artifacts.design_options.len(), 1);
    assert!(agent
        .decision_trail()
        .iter()
        .any(|d| d.action == "디자인 폴백" && (d.confidence - 0.6).abs() < f32::EPSILON));
}

#[tokio::test]
async fn test_failure_blocks_active_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.agent.output_dir = dir.path().to_path_buf();

    let router = TaskRouter::new(&cfg);
    router.install(Provider::Claude, Arc::new(FailOnStructure(MockLlmClient::new())));
    router.install(Provider::Gemini, Arc::new(MockLlmClient::new()));

    let mut agent = PptAgent::with_router(
        cfg,
        Arc::new(router),
        Arc::new(AutoApprove),
        PipelineOptions::default(),
    );

    let err = agent.run(TOPIC, None).await.unwrap_err();
    assert!(matches!(
        err,
        AgentError::GenerationFailed { provider: Provider::Claude, .. }
    ));

    let todos = agent.orchestrator().todos();
    assert_eq!(todos.get(STAGE_CONFIRM).unwrap().status, TodoStatus::Completed);
    assert_eq!(todos.get(STAGE_RESEARCH).unwrap().status, TodoStatus::Completed);
    assert_eq!(todos.get(STAGE_STRUCTURE).unwrap().status, TodoStatus::Blocked);
    assert!(agent
        .decision_trail()
        .iter()
        .any(|d| d.action == "리서치 완료"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_analysis_failure_aborts_before_stages() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.agent.output_dir = dir.path().to_path_buf();

    let router = TaskRouter::new(&cfg);
    router.install(Provider::Claude, Arc::new(FailingClient(Provider::Claude)));

    let mut agent = PptAgent::with_router(
        cfg,
        Arc::new(router),
        Arc::new(AutoApprove),
        PipelineOptions::default(),
    );

    assert!(agent.run(TOPIC, None).await.is_err());
    assert!(agent.orchestrator().todos().is_empty());
    assert!(!agent.decision_trail().is_empty());
}

#[test]
fn test_missing_claude_key_fails_before_run() {
    let mut cfg = AppConfig::default();
    cfg.llm.claude.api_key_env = "PPT_AGENT_IT_KEY_NEVER_SET".to_string();
    let err = PptAgent::new(cfg, Arc::new(AutoApprove), PipelineOptions::default())
        .err()
        .unwrap();
    assert!(err.is_config());
}

#[tokio::test]
async fn test_markdown_export_without_optional_stages() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("deck").join("slides.md");
    let mut agent = PptAgent::new(
        mock_config(dir.path(), 0),
        Arc::new(AutoApprove),
        PipelineOptions {
            design: false,
            visual_eval: false,
            format: None,
        },
    )
    .unwrap();

    let report = agent.run(TOPIC, Some(&target)).await.unwrap();
    assert_eq!(report.output_path, target);
    assert!(report.visual_evaluation.is_none());
    assert_eq!(report.todos.len(), 4);
    // 跳过设计阶段时由 Design Skill 请求单一配色，academic 以外的语气使用默认字体
    assert_eq!(report.presentation.design.primary_color, "#4F46E5");
    assert_eq!(report.presentation.design.font_title, "맑은 고딕");

    let text = std::fs::read_to_string(&target).unwrap();
    assert!(text.starts_with(&format!("# {}", TOPIC)));
    assert!(text.contains("## 5. 결론 및 제언"));
}

#[tokio::test]
async fn test_skipped_design_falls_back_to_tone_palette() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.agent.output_dir = dir.path().to_path_buf();

    let router = TaskRouter::new(&cfg);
    router.install(Provider::Claude, Arc::new(MockLlmClient::new()));
    router.install(Provider::Gemini, Arc::new(FailingClient(Provider::Gemini)));

    let mut agent = PptAgent::with_router(
        cfg,
        Arc::new(router),
        Arc::new(AutoApprove),
        PipelineOptions {
            design: false,
            visual_eval: true,
            format: None,
        },
    );

    let report = agent
        .run(&format!("{}\n톤: academic", TOPIC), None)
        .await
        .unwrap();
    // 配色请求失败：academic → modern_navy 预置配色，字体按语气
    assert_eq!(report.presentation.design.primary_color, "#0F172A");
    assert_eq!(report.presentation.design.font_title, "본명조");
    assert!(agent
        .decision_trail()
        .iter()
        .any(|d| d.action == "디자인 단계 생략"));
}

#[tokio::test]
async fn test_agent_runs_twice_with_fresh_state() {
    let dir = tempfile::tempdir().unwrap();
    let responder = Arc::new(ScriptedResponder::new(["1", "2", "1", "1", "3", "1"]));
    let mut agent = PptAgent::new(
        mock_config(dir.path(), 3),
        responder.clone(),
        PipelineOptions::default(),
    )
    .unwrap();

    let first = agent.run(TOPIC, None).await.unwrap();
    let first_trail = agent.decision_trail().len();

    let second = agent.run("클라우드 보안", None).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(second.presentation.topic, "클라우드 보안");
    assert!(second.todos.iter().all(|t| t.status == TodoStatus::Completed));
    assert_eq!(second.todos.len(), first.todos.len());
    // 每次运行各自拥有完整的 HITL 预算
    assert_eq!(responder.asked().len(), 6);
    assert_eq!(agent.orchestrator().hitl_count(), 3);
    assert!(agent
        .orchestrator()
        .decisions()
        .iter()
        .all(|d| d.action != "HITL 스킵"));
    assert_eq!(agent.decision_trail().len(), first_trail);
    assert_eq!(first.presentation.design.primary_color, "#0F172A");
    assert_ne!(second.presentation.design.primary_color, first.presentation.design.primary_color);
}
