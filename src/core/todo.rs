//! 进度清单（todo.md 模式）
//!
//! 状态只能前进：pending → in_progress → completed，或 pending / in_progress → blocked。

use std::fmt;

use serde::Serialize;

use crate::core::AgentError;

/// 清单项状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TodoStatus {
    fn rank(&self) -> u8 {
        match self {
            TodoStatus::Pending => 0,
            TodoStatus::InProgress => 1,
            TodoStatus::Completed | TodoStatus::Blocked => 2,
        }
    }

    /// 相同状态视为合法（幂等）
    pub fn can_transition_to(&self, next: TodoStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            TodoStatus::Completed | TodoStatus::Blocked => false,
            _ => next.rank() > self.rank(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "⬜",
            TodoStatus::InProgress => "🔄",
            TodoStatus::Completed => "✅",
            TodoStatus::Blocked => "❌",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoStatus::Pending => write!(f, "pending"),
            TodoStatus::InProgress => write!(f, "in_progress"),
            TodoStatus::Completed => write!(f, "completed"),
            TodoStatus::Blocked => write!(f, "blocked"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TodoItem {
    pub task: String,
    pub status: TodoStatus,
    pub agent: String,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: impl Into<String>, agent: impl Into<String>) -> &TodoItem {
        self.items.push(TodoItem {
            task: task.into(),
            status: TodoStatus::Pending,
            agent: agent.into(),
            result: None,
        });
        &self.items[self.items.len() - 1]
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn get(&self, task: &str) -> Option<&TodoItem> {
        self.items.iter().find(|t| t.task == task)
    }

    /// 更新状态；未知任务或倒退的状态转换返回 ValidationError
    pub fn update(
        &mut self,
        task: &str,
        status: TodoStatus,
        result: Option<String>,
    ) -> Result<(), AgentError> {
        let item = self
            .items
            .iter_mut()
            .find(|t| t.task == task)
            .ok_or_else(|| AgentError::ValidationError(format!("unknown todo: {}", task)))?;

        if !item.status.can_transition_to(status) {
            return Err(AgentError::ValidationError(format!(
                "todo '{}' cannot move from {} to {}",
                task, item.status, status
            )));
        }
        item.status = status;
        if result.is_some() {
            item.result = result;
        }
        Ok(())
    }

    /// 当前处于 in_progress 的第一项
    pub fn active(&self) -> Option<&TodoItem> {
        self.items
            .iter()
            .find(|t| t.status == TodoStatus::InProgress)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// todo.md 风格的进度文本
    pub fn render(&self) -> String {
        let mut out = String::from("## 진행 상황\n");
        for item in &self.items {
            out.push_str(&format!("- {} {}\n", item.status.icon(), item.task));
            if let Some(result) = &item.result {
                let preview: String = result.chars().take(50).collect();
                let ellipsis = if result.chars().count() > 50 { "..." } else { "" };
                out.push_str(&format!("  → {}{}\n", preview, ellipsis));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let mut list = TodoList::new();
        list.add("주제 리서치", "Research Agent");
        list.update("주제 리서치", TodoStatus::InProgress, None).unwrap();
        assert_eq!(list.active().unwrap().task, "주제 리서치");
        list.update("주제 리서치", TodoStatus::Completed, Some("5개 정보 수집".into()))
            .unwrap();
        let item = list.get("주제 리서치").unwrap();
        assert_eq!(item.status, TodoStatus::Completed);
        assert_eq!(item.result.as_deref(), Some("5개 정보 수집"));
        assert!(list.active().is_none());
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut list = TodoList::new();
        list.add("PPT 파일 생성", "Export Skill");
        list.update("PPT 파일 생성", TodoStatus::Completed, None).unwrap();
        let err = list
            .update("PPT 파일 생성", TodoStatus::InProgress, None)
            .unwrap_err();
        assert!(matches!(err, AgentError::ValidationError(_)));
        // 相同状态幂等
        list.update("PPT 파일 생성", TodoStatus::Completed, None).unwrap();
    }

    #[test]
    fn test_blocked_is_terminal() {
        assert!(TodoStatus::Pending.can_transition_to(TodoStatus::Blocked));
        assert!(TodoStatus::InProgress.can_transition_to(TodoStatus::Blocked));
        assert!(!TodoStatus::Blocked.can_transition_to(TodoStatus::Completed));
        assert!(!TodoStatus::Completed.can_transition_to(TodoStatus::Blocked));
    }

    #[test]
    fn test_unknown_task() {
        let mut list = TodoList::new();
        assert!(list.update("없는 작업", TodoStatus::Completed, None).is_err());
    }

    #[test]
    fn test_render() {
        let mut list = TodoList::new();
        list.add("주제 리서치", "Research Agent");
        list.add("슬라이드 구조 생성", "Structure Skill");
        list.update("주제 리서치", TodoStatus::Completed, Some("5개 정보 수집".into()))
            .unwrap();
        let text = list.render();
        assert!(text.contains("- ✅ 주제 리서치"));
        assert!(text.contains("  → 5개 정보 수집"));
        assert!(text.contains("- ⬜ 슬라이드 구조 생성"));
    }
}
