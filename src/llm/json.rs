//! JSON-only 响应约定
//!
//! system prompt 末尾追加「只输出 JSON」指令；响应可能被 ```json ... ``` 包裹，解析前剥离。
//! 解析失败直接返回 JsonParseError（携带原文），不重试也不修正。
//! 合法 JSON 中字段为 null 或类型不符时，由 `lenient` / `lenient_seq` 退回默认值。

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::AgentError;

/// 追加到 system prompt 的 JSON-only 指令
pub const JSON_ONLY_INSTRUCTION: &str =
    "IMPORTANT: 반드시 유효한 JSON만 출력하세요. 다른 텍스트 없이 JSON만 출력하세요.";

fn json_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid regex"))
}

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid regex"))
}

/// 在 system prompt 后追加 JSON-only 指令
pub fn with_json_instruction(system: Option<&str>) -> String {
    format!("{}\n\n{}", system.unwrap_or_default(), JSON_ONLY_INSTRUCTION)
}

/// 剥离 Markdown 代码块：优先 ```json，其次任意 ```；无代码块时返回 trim 后原文（幂等）
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let captured = json_fence()
        .captures(trimmed)
        .or_else(|| any_fence().captures(trimmed))
        .and_then(|c| c.get(1));
    match captured {
        Some(m) => m.as_str().trim(),
        None => trimmed,
    }
}

/// 剥离代码块后解析为 JSON；失败时错误中保留剥离后的原文
pub fn parse_json_response(content: &str) -> Result<Value, AgentError> {
    let body = strip_code_fence(content);
    serde_json::from_str(body).map_err(|e| AgentError::JsonParseError {
        message: e.to_string(),
        raw: body.to_string(),
    })
}

/// 字段宽松解码：null 或类型不符时取 `T::default()`
///
/// 与 `#[serde(default)]` 配合使用，缺失字段同样得到默认值。
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// 列表宽松解码：逐项解码并丢弃无法解码的元素；单个标量视为只有一项的列表，null 为空列表
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        single => serde_json::from_value(single).map(|v| vec![v]).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let raw = "여기 결과입니다\n```json\n{\"a\": 1}\n```\n끝";
        assert_eq!(strip_code_fence(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_bare_fence() {
        assert_eq!(strip_code_fence("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_strip_unclosed_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": true}"), "{\"a\": true}");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let plain = "{\"topic\": \"AI\"}";
        assert_eq!(strip_code_fence(plain), plain);

        let fenced = "```json\n{\"topic\": \"AI\"}\n```";
        let once = strip_code_fence(fenced);
        assert_eq!(strip_code_fence(once), once);
    }

    #[test]
    fn test_parse_error_carries_raw_text() {
        let err = parse_json_response("```json\nnot json at all\n```").unwrap_err();
        match err {
            AgentError::JsonParseError { raw, .. } => assert_eq!(raw, "not json at all"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_instruction_appended() {
        let system = with_json_instruction(Some("당신은 리서치 Agent입니다."));
        assert!(system.starts_with("당신은 리서치 Agent입니다."));
        assert!(system.ends_with(JSON_ONLY_INSTRUCTION));
        assert!(with_json_instruction(None).contains(JSON_ONLY_INSTRUCTION));
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Item {
        #[serde(deserialize_with = "lenient")]
        label: Option<String>,
        #[serde(deserialize_with = "lenient")]
        note: String,
        #[serde(deserialize_with = "lenient")]
        size: Option<u32>,
        #[serde(deserialize_with = "lenient_seq")]
        tags: Vec<String>,
    }

    #[test]
    fn test_lenient_fields_fall_back_to_default() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "label": 0.9,
            "note": null,
            "size": "big",
            "tags": null
        }))
        .unwrap();
        assert_eq!(item.label, None);
        assert_eq!(item.note, "");
        assert_eq!(item.size, None);
        assert!(item.tags.is_empty());
    }

    #[test]
    fn test_lenient_keeps_valid_values() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "label": "high",
            "note": "메모",
            "size": 18
        }))
        .unwrap();
        assert_eq!(item.label.as_deref(), Some("high"));
        assert_eq!(item.note, "메모");
        assert_eq!(item.size, Some(18));
        assert!(item.tags.is_empty());
    }

    #[test]
    fn test_lenient_seq_shapes() {
        let item: Item =
            serde_json::from_value(serde_json::json!({ "tags": "단일 항목" })).unwrap();
        assert_eq!(item.tags, vec!["단일 항목"]);

        let item: Item =
            serde_json::from_value(serde_json::json!({ "tags": ["a", 1, null, "b"] })).unwrap();
        assert_eq!(item.tags, vec!["a", "b"]);
    }
}
