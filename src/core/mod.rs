//! 核心编排层：错误、共享上下文与决策记录、进度清单、HITL、Orchestrator 与流水线驱动

pub mod context;
pub mod error;
pub mod hitl;
pub mod orchestrator;
pub mod pipeline;
pub mod todo;

pub use context::{
    AgentContext, AgentDecision, DecisionLog, RunArtifacts, DEFAULT_AUDIENCE, DEFAULT_TONE,
    MISSING_RATIONALE, rationale_or_placeholder,
};
pub use error::AgentError;
pub use hitl::{
    AutoApprove, ConsoleResponder, HitlRequest, HitlResponder, HitlStep, PendingHitl,
    ScriptedResponder,
};
pub use orchestrator::{OrchestratorAgent, RequestAnalysis};
pub use pipeline::{compose_user_input, PipelineOptions, PptAgent, RunReport};
pub use todo::{TodoItem, TodoList, TodoStatus};
