//! LLM 层：客户端抽象与实现（Claude / Gemini 走 OpenAI 兼容端点，Mock 用于离线测试）与任务路由

pub mod json;
pub mod message;
pub mod mock;
pub mod openai;
pub mod providers;
pub mod router;
pub mod traits;

pub use json::{
    lenient, lenient_seq, parse_json_response, strip_code_fence, with_json_instruction,
    JSON_ONLY_INSTRUCTION,
};
pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use providers::{create_claude_client, create_gemini_client, CLAUDE_BASE_URL, GEMINI_BASE_URL};
pub use router::{Provider, TaskRouter, TaskType, ROUTING_TABLE};
pub use traits::{LlmClient, LlmResponse};
