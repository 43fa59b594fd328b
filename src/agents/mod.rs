//! Agent 层：公共能力（AgentCore / Agent trait）与 Research、Design 两个具体 Agent

pub mod base;
pub mod design;
pub mod research;

pub use base::{Agent, AgentCore};
pub use design::{tone_default, DesignAgent, VisualEvaluation};
pub use research::{ResearchAgent, ResearchEvaluation};
