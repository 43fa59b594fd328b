//! PPT Agent - 多模型演示文稿生成智能体
//!
//! 模块划分：
//! - **agents**: Agent 能力抽象与 Research / Design Agent
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、共享上下文与决策日志、进度清单、HITL、Orchestrator、流水线驱动
//! - **llm**: LLM 客户端抽象与实现（Claude / Gemini 走 OpenAI 兼容端点，Mock）与任务路由
//! - **models**: 幻灯片、调研结果、设计系统、演示文稿
//! - **observability**: tracing 初始化
//! - **skills**: 结构生成、设计规范、文件导出

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod models;
pub mod observability;
pub mod skills;

pub use crate::core::{AgentError, PipelineOptions, PptAgent, RunReport};
