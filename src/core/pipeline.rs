//! 流水线驱动：按固定顺序串联各阶段
//!
//! 分析 → 计划 → HITL 确认 → 调研 → 设计（可选，HITL 选择）→ 结构（HITL 确认，可重生成一次）
//! → 视觉评估（可选）→ 导出。阶段之间没有并行，每个阶段前后都更新对应的清单项。
//! 失败时把进行中的阶段标为 blocked，并输出截至失败点的决策轨迹。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::agents::{Agent, DesignAgent, ResearchAgent, ResearchEvaluation, VisualEvaluation};
use crate::config::AppConfig;
use crate::core::orchestrator::{
    STAGE_CONFIRM, STAGE_DESIGN, STAGE_EXPORT, STAGE_RESEARCH, STAGE_STRUCTURE, STAGE_VISUAL_EVAL,
};
use crate::core::{
    AgentContext, AgentDecision, AgentError, HitlRequest, HitlResponder, OrchestratorAgent,
    TodoItem, TodoStatus,
};
use crate::llm::TaskRouter;
use crate::models::{DesignOption, Presentation};
use crate::skills::{DesignSkill, ExportFormat, StructureSkill};

/// 流水线开关
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 生成设计方案并让用户选择
    pub design: bool,
    /// 导出前做视觉质量评估
    pub visual_eval: bool,
    /// None 时按输出路径扩展名决定，仍无法决定则为 JSON
    pub format: Option<ExportFormat>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            design: true,
            visual_eval: true,
            format: None,
        }
    }
}

/// 一次成功运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub output_path: PathBuf,
    pub presentation: Presentation,
    pub research_evaluation: ResearchEvaluation,
    pub visual_evaluation: Option<VisualEvaluation>,
    pub todos: Vec<TodoItem>,
}

/// PPT 生成 Agent：持有路由器、各 Agent 与 HITL 应答者
pub struct PptAgent {
    config: AppConfig,
    router: Arc<TaskRouter>,
    orchestrator: OrchestratorAgent,
    research: ResearchAgent,
    design: DesignAgent,
    design_skill: DesignSkill,
    structure: StructureSkill,
    responder: Arc<dyn HitlResponder>,
    options: PipelineOptions,
    context: Option<AgentContext>,
}

impl PptAgent {
    /// 先校验配置：缺少必需凭据时在任何阶段开始前返回 ConfigError
    pub fn new(
        config: AppConfig,
        responder: Arc<dyn HitlResponder>,
        options: PipelineOptions,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self::with_router(
            config.clone(),
            Arc::new(TaskRouter::new(&config)),
            responder,
            options,
        ))
    }

    /// 使用外部构造的路由器（可预置客户端）
    pub fn with_router(
        config: AppConfig,
        router: Arc<TaskRouter>,
        responder: Arc<dyn HitlResponder>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            orchestrator: OrchestratorAgent::new(router.clone(), config.agent.max_hitl_interactions),
            research: ResearchAgent::new(router.clone()),
            design: DesignAgent::new(router.clone()),
            design_skill: DesignSkill::new(router.clone()),
            structure: StructureSkill::new(router.clone()),
            config,
            router,
            responder,
            options,
            context: None,
        }
    }

    pub fn router(&self) -> &Arc<TaskRouter> {
        &self.router
    }

    pub fn orchestrator(&self) -> &OrchestratorAgent {
        &self.orchestrator
    }

    /// 最近一次运行的上下文
    pub fn context(&self) -> Option<&AgentContext> {
        self.context.as_ref()
    }

    /// 合并所有 Agent 日志与上下文决策，按时间排序
    pub fn decision_trail(&self) -> Vec<AgentDecision> {
        let mut trail: Vec<AgentDecision> = self
            .orchestrator
            .decisions()
            .iter()
            .chain(self.research.decisions())
            .chain(self.design.decisions())
            .chain(self.context.iter().flat_map(|ctx| ctx.decisions.iter()))
            .cloned()
            .collect();
        trail.sort_by_key(|d| d.timestamp);
        trail
    }

    /// 每次运行使用全新的清单、HITL 计数与 Agent 日志；路由器与已建客户端沿用
    fn reset_for_run(&mut self) {
        self.orchestrator =
            OrchestratorAgent::new(self.router.clone(), self.config.agent.max_hitl_interactions);
        self.research = ResearchAgent::new(self.router.clone());
        self.design = DesignAgent::new(self.router.clone());
        self.context = None;
    }

    /// 运行完整流水线；output 为 None 时写到配置的输出目录
    pub async fn run(&mut self, user_input: &str, output: Option<&Path>) -> Result<RunReport, AgentError> {
        self.reset_for_run();
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, mock = self.router.is_mock(), "Pipeline started");
        let mut ctx = match self.orchestrator.analyze_request(user_input).await {
            Ok(ctx) => ctx,
            Err(e) => {
                self.report_failure(&e);
                return Err(e);
            }
        };

        let result = self.run_stages(run_id, &mut ctx, output).await;
        self.context = Some(ctx);
        match result {
            Ok(report) => {
                let (prompt, completion, total) = self.router.token_usage();
                tracing::info!(%run_id, prompt, completion, total, "Pipeline finished");
                Ok(report)
            }
            Err(e) => {
                self.orchestrator.block_active(&e.to_string());
                self.report_failure(&e);
                Err(e)
            }
        }
    }

    fn report_failure(&self, error: &AgentError) {
        tracing::error!("Pipeline aborted: {}", error);
        for decision in self.decision_trail() {
            tracing::error!(
                action = %decision.action,
                confidence = decision.confidence,
                "{}",
                decision.rationale
            );
        }
    }

    async fn run_stages(
        &mut self,
        run_id: Uuid,
        ctx: &mut AgentContext,
        output: Option<&Path>,
    ) -> Result<RunReport, AgentError> {
        let responder = self.responder.clone();
        self.orchestrator.log_decision(
            "워크플로우 시작",
            format!("주제: {}, 청중: {}", ctx.topic, ctx.audience),
            1.0,
        );
        self.orchestrator.create_plan(&self.options);
        tracing::info!("\n{}", self.orchestrator.render_todos());

        // HITL #1
        self.orchestrator
            .update_todo(STAGE_CONFIRM, TodoStatus::InProgress, None)?;
        let modified = self.orchestrator.confirm_request(ctx, responder.as_ref()).await;
        self.orchestrator.update_todo(
            STAGE_CONFIRM,
            TodoStatus::Completed,
            Some(if modified { "요구사항 수정 반영" } else { "요청 확인 완료" }.to_string()),
        )?;

        // 调研
        self.orchestrator
            .update_todo(STAGE_RESEARCH, TodoStatus::InProgress, None)?;
        let research_results = self.research.execute(ctx).await?;
        let research_evaluation = ResearchEvaluation::from_results(&research_results);
        self.orchestrator.update_todo(
            STAGE_RESEARCH,
            TodoStatus::Completed,
            Some(format!(
                "{}개 정보 수집, 품질 점수 {}",
                research_results.len(),
                research_evaluation.quality_score
            )),
        )?;

        let mut presentation = Presentation::new(ctx.topic.clone(), ctx.audience.clone(), ctx.tone.clone());
        presentation.research_results = research_results.clone();

        // 设计
        if self.options.design {
            self.orchestrator
                .update_todo(STAGE_DESIGN, TodoStatus::InProgress, None)?;
            let options = self.design.execute(ctx).await?;
            let chosen = self.select_design(ctx, &options, responder.as_ref()).await;
            let result = match options.get(chosen) {
                Some(option) => {
                    presentation.design = option.system.clone();
                    format!("{} 적용", option.name)
                }
                None => "기본 디자인 적용".to_string(),
            };
            self.orchestrator
                .update_todo(STAGE_DESIGN, TodoStatus::Completed, Some(result))?;
        } else {
            presentation.design = self
                .design_skill
                .create_design_system(&ctx.topic, &ctx.tone, &ctx.audience)
                .await;
            self.orchestrator.log_decision(
                "디자인 단계 생략",
                format!(
                    "디자인 옵션 선택 없이 단일 팔레트({})와 톤 '{}'의 글꼴 사용",
                    presentation.design.primary_color, ctx.tone
                ),
                0.8,
            );
        }

        // 结构
        self.orchestrator
            .update_todo(STAGE_STRUCTURE, TodoStatus::InProgress, None)?;
        let slides = self
            .structure
            .generate_structure(&presentation, &research_results, ctx, None)
            .await?;
        presentation.replace_slides(slides);
        if let Some(feedback) = self
            .review_structure(&presentation, responder.as_ref())
            .await
        {
            let slides = self
                .structure
                .generate_structure(&presentation, &research_results, ctx, Some(&feedback))
                .await?;
            presentation.replace_slides(slides);
        }
        self.orchestrator.update_todo(
            STAGE_STRUCTURE,
            TodoStatus::Completed,
            Some(format!("{}개 슬라이드", presentation.slides.len())),
        )?;

        // 视觉评估
        let visual_evaluation = if self.options.visual_eval {
            self.orchestrator
                .update_todo(STAGE_VISUAL_EVAL, TodoStatus::InProgress, None)?;
            let evaluation = self.design.evaluate_visual_quality(&presentation)?;
            ctx.add_decision(
                "시각 품질 평가",
                format!(
                    "전체 통과: {}, 대비율: {}, WCAG {:.2}:1",
                    evaluation.overall_pass, evaluation.contrast_ratio, evaluation.wcag_ratio
                ),
                if evaluation.overall_pass { 1.0 } else { 0.6 },
            );
            self.orchestrator.update_todo(
                STAGE_VISUAL_EVAL,
                TodoStatus::Completed,
                Some(if evaluation.overall_pass { "통과" } else { "개선 필요" }.to_string()),
            )?;
            Some(evaluation)
        } else {
            None
        };

        // 导出
        self.orchestrator
            .update_todo(STAGE_EXPORT, TodoStatus::InProgress, None)?;
        let format = self
            .options
            .format
            .or_else(|| output.map(ExportFormat::from_path))
            .unwrap_or_default();
        let exporter = format.exporter(self.config.agent.output_dir.clone());
        let output_path = exporter.export(&presentation, output)?;
        self.orchestrator.update_todo(
            STAGE_EXPORT,
            TodoStatus::Completed,
            Some(output_path.display().to_string()),
        )?;
        ctx.add_decision(
            "파일 생성 완료",
            format!("{}개 슬라이드를 {}에 저장", presentation.slides.len(), output_path.display()),
            1.0,
        );
        tracing::info!("\n{}", self.orchestrator.render_todos());

        Ok(RunReport {
            run_id,
            output_path,
            presentation,
            research_evaluation,
            visual_evaluation,
            todos: self.orchestrator.todos().items().to_vec(),
        })
    }

    /// HITL：选择设计方案；无回答或无法识别时采用推荐方案
    async fn select_design(
        &mut self,
        ctx: &mut AgentContext,
        options: &[DesignOption],
        responder: &dyn HitlResponder,
    ) -> usize {
        let recommended = ctx
            .artifacts
            .design_recommendation
            .filter(|i| *i < options.len())
            .unwrap_or(0);
        if options.len() <= 1 {
            return 0;
        }

        let request = HitlRequest::new("디자인 스타일을 선택하세요")
            .with_context(
                options
                    .iter()
                    .enumerate()
                    .map(|(i, o)| {
                        let mark = if i == recommended { " (추천)" } else { "" };
                        format!("{}. {}{}: {}", i + 1, o.name, mark, o.description)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
            .with_options(options.iter().map(|o| o.name.clone()));

        let answer = self.orchestrator.ask(request.clone(), responder).await;
        let chosen = answer
            .as_deref()
            .and_then(|a| request.selected_index(a))
            .unwrap_or(recommended);
        ctx.add_decision(
            format!("디자인 선택: {}", options[chosen].name),
            match answer {
                Some(a) if request.selected_index(&a).is_some() => format!("사용자 선택 ({})", a),
                _ => "사용자 선택이 없어 추천 옵션 적용".to_string(),
            },
            1.0,
        );
        chosen
    }

    /// HITL：确认结构；要求重做时返回审阅意见
    async fn review_structure(
        &mut self,
        presentation: &Presentation,
        responder: &dyn HitlResponder,
    ) -> Option<String> {
        let outline = presentation
            .slides
            .iter()
            .map(|s| format!("{}. [{}] {}", s.order, s.slide_type, s.content.title))
            .collect::<Vec<_>>()
            .join("\n");
        let request = HitlRequest::new("슬라이드 구조를 확인해주세요")
            .with_context(outline)
            .with_options(["예, 좋습니다", "다시 생성해주세요"]);

        let answer = self.orchestrator.ask(request, responder).await?;
        let trimmed = answer.trim();
        if trimmed == "2" || trimmed.contains("다시") {
            let feedback = if trimmed == "2" {
                "다른 구성으로 다시 생성".to_string()
            } else {
                trimmed.to_string()
            };
            self.orchestrator
                .log_decision("구조 재생성", feedback.clone(), 1.0);
            Some(feedback)
        } else {
            None
        }
    }
}

/// 把 CLI 参数拼成请求文本：听众 / 语气与默认值不同时追加到主题后
pub fn compose_user_input(topic: &str, audience: &str, tone: &str) -> String {
    let mut input = topic.trim().to_string();
    if audience != crate::core::DEFAULT_AUDIENCE {
        input.push_str(&format!("\n대상 청중: {}", audience));
    }
    if tone != crate::core::DEFAULT_TONE {
        input.push_str(&format!("\n톤: {}", tone));
    }
    input
}
