//! Human-in-the-Loop：请求、挂起点与应答者
//!
//! Orchestrator 不直接阻塞读取输入：request_hitl 返回 HitlStep::AwaitingInput，
//! 调用方通过 HitlResponder 取得回答后再交回 resolve_hitl。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use console::style;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

/// 人工确认请求
#[derive(Debug, Clone, Serialize)]
pub struct HitlRequest {
    pub question: String,
    pub options: Vec<String>,
    pub context: String,
    pub required: bool,
}

impl HitlRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options: Vec::new(),
            context: String::new(),
            required: true,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// 把回答解析为选项下标：支持 1 起始的编号或与选项原文完全一致
    pub fn selected_index(&self, answer: &str) -> Option<usize> {
        let answer = answer.trim();
        if let Ok(n) = answer.parse::<usize>() {
            return (1..=self.options.len()).contains(&n).then(|| n - 1);
        }
        self.options.iter().position(|o| o == answer)
    }
}

/// 等待回答的挂起请求
#[derive(Debug, Clone)]
pub struct PendingHitl {
    /// 第几次交互（从 1 开始）
    pub seq: usize,
    pub request: HitlRequest,
}

/// request_hitl 的结果
#[derive(Debug, Clone)]
pub enum HitlStep {
    /// 交互次数已用完，自动通过
    AutoProceed,
    /// 需要外部提供回答
    AwaitingInput(PendingHitl),
}

/// 回答 HITL 请求的一方；返回 None 表示不作回答（视为同意）
#[async_trait]
pub trait HitlResponder: Send + Sync {
    async fn respond(&self, pending: &PendingHitl) -> Option<String>;
}

/// 终端交互：打印问题与选项，从 stdin 读取一行（无超时）
pub struct ConsoleResponder {
    stdin: tokio::sync::Mutex<BufReader<Stdin>>,
}

impl ConsoleResponder {
    pub fn new() -> Self {
        Self {
            stdin: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for ConsoleResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HitlResponder for ConsoleResponder {
    async fn respond(&self, pending: &PendingHitl) -> Option<String> {
        let request = &pending.request;
        println!(
            "\n{} {}",
            style(format!("[HITL #{}]", pending.seq)).magenta().bold(),
            style(&request.question).bold()
        );
        if !request.context.is_empty() {
            println!("{} {}", style("컨텍스트:").dim(), request.context);
        }
        for (i, option) in request.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        print!("응답: ");
        let _ = std::io::Write::flush(&mut std::io::stdout());

        let mut line = String::new();
        let mut stdin = self.stdin.lock().await;
        match stdin.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read HITL answer: {}", e);
                None
            }
        }
    }
}

/// 预置回答队列（测试 / 批处理）；队列耗尽后返回 None
#[derive(Debug, Default)]
pub struct ScriptedResponder {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedResponder {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// 已被问到的问题
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HitlResponder for ScriptedResponder {
    async fn respond(&self, pending: &PendingHitl) -> Option<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(pending.request.question.clone());
        }
        self.answers.lock().ok().and_then(|mut q| q.pop_front())
    }
}

/// 一律不作回答（等同于全部同意）
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl HitlResponder for AutoApprove {
    async fn respond(&self, _pending: &PendingHitl) -> Option<String> {
        None
    }
}
