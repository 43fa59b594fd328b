//! PPT Agent - 命令行入口
//!
//! 解析参数、初始化日志与配置，构造流水线并在终端中运行（HITL 走 stdin）。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use console::{style, Term};

use ppt_agent::agents::{ResearchEvaluation, VisualEvaluation};
use ppt_agent::config::load_config;
use ppt_agent::core::{
    compose_user_input, AutoApprove, ConsoleResponder, HitlResponder, DEFAULT_AUDIENCE,
};
use ppt_agent::observability;
use ppt_agent::skills::ExportFormat;
use ppt_agent::{PipelineOptions, PptAgent, RunReport};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tone {
    Professional,
    Casual,
    Academic,
}

impl Tone {
    fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Academic => "academic",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => ExportFormat::Json,
            Format::Markdown => ExportFormat::Markdown,
        }
    }
}

/// 多模型 PPT 生成 Agent
///
/// 逻辑类任务走 Claude，设计类任务走 Gemini；每个决定都附带理由。
#[derive(Parser, Debug)]
#[command(name = "ppt-agent")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 발표 주제 (생략하면 입력을 요청합니다)
    topic: Option<String>,

    /// 출력 파일 경로 (.json / .md)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 대상 청중
    #[arg(long, default_value = DEFAULT_AUDIENCE)]
    audience: String,

    /// 발표 톤
    #[arg(long, value_enum, default_value_t = Tone::Professional)]
    tone: Tone,

    /// 출력 형식 (기본: 출력 경로 확장자, 없으면 json)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// HITL 비활성화 (상호작용 횟수 0)
    #[arg(long)]
    no_hitl: bool,

    /// Mock 모드 (API 호출 없이 고정 응답 사용, PPT_AGENT_MOCK=1 과 동일)
    #[arg(long)]
    mock: bool,

    /// 디자인 시스템 생성 단계 생략
    #[arg(long)]
    skip_design: bool,

    /// 시각 품질 평가 단계 생략
    #[arg(long)]
    skip_visual_eval: bool,

    /// 설정 파일 경로
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 로그 상세도 (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_topic() -> anyhow::Result<String> {
    let term = Term::stdout();
    term.write_str("PPT 주제를 입력하세요: ")?;
    let topic = term.read_line().context("Failed to read topic")?;
    let topic = topic.trim().to_string();
    anyhow::ensure!(!topic.is_empty(), "topic must not be empty");
    Ok(topic)
}

fn print_research(eval: &ResearchEvaluation) {
    println!(
        "  {}: {}개 (high {}, medium {}, low {}) · 품질 {} {}",
        style("리서치").dim(),
        eval.total_results,
        eval.high_confidence,
        eval.medium_confidence,
        eval.low_confidence,
        eval.quality_score,
        if eval.pass { style("통과").green() } else { style("재검토 필요").yellow() }
    );
}

fn print_visual(eval: &VisualEvaluation) {
    println!(
        "  {}: 대비 {} · WCAG {:.2}:1 · 본문 글꼴 {} · 타이틀 {} {}",
        style("시각 평가").dim(),
        eval.contrast_ratio,
        eval.wcag_ratio,
        if eval.font_size_pass { "OK" } else { "작음" },
        if eval.has_title_slide { "있음" } else { "없음" },
        if eval.overall_pass { style("통과").green() } else { style("개선 필요").yellow() }
    );
}

fn print_report(report: &RunReport, agent: &PptAgent) {
    println!("\n{}", style("PPT 생성 완료").green().bold());
    println!("  {}: {}", style("파일").dim(), report.output_path.display());
    println!("  {}: {}", style("주제").dim(), report.presentation.topic);
    for slide in &report.presentation.slides {
        println!(
            "    {}. [{}] {}",
            slide.order, slide.slide_type, slide.content.title
        );
    }
    print_research(&report.research_evaluation);
    if let Some(visual) = &report.visual_evaluation {
        print_visual(visual);
    }
    let (prompt, completion, total) = agent.router().token_usage();
    println!(
        "  {}: {}개 · 토큰 {} (입력 {}, 출력 {})",
        style("결정 기록").dim(),
        agent.decision_trail().len(),
        total,
        prompt,
        completion
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    observability::init(cli.verbose);

    let mut cfg = load_config(cli.config.clone()).context("Failed to load configuration")?;
    if cli.mock {
        cfg.agent.mock_mode = true;
    }
    if cli.no_hitl {
        cfg.agent.max_hitl_interactions = 0;
    }

    let topic = match cli.topic.clone() {
        Some(topic) if !topic.trim().is_empty() => topic,
        _ => read_topic()?,
    };
    let user_input = compose_user_input(&topic, &cli.audience, cli.tone.as_str());

    let responder: Arc<dyn HitlResponder> = if cli.no_hitl {
        Arc::new(AutoApprove)
    } else {
        Arc::new(ConsoleResponder::new())
    };
    let options = PipelineOptions {
        design: !cli.skip_design,
        visual_eval: !cli.skip_visual_eval,
        format: cli.format.map(Into::into),
    };

    let mut agent = PptAgent::new(cfg, responder, options).context("Configuration check failed")?;

    println!(
        "{} {}{}",
        style("PPT Agent").cyan().bold(),
        topic,
        if agent.router().is_mock() {
            style(" (mock)").yellow().to_string()
        } else {
            String::new()
        }
    );

    match agent.run(&user_input, cli.output.as_deref()).await {
        Ok(report) => {
            println!("\n{}", agent.orchestrator().render_todos());
            print_report(&report, &agent);
            Ok(())
        }
        // 决策轨迹已由流水线以 error 级别输出
        Err(e) => {
            eprintln!("\n{}", agent.orchestrator().render_todos());
            Err(e).context("PPT generation failed")
        }
    }
}
