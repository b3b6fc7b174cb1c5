//! 从模型返回的自由文本中提取结构化JSON
//!
//! 只负责解析，不生成任何业务数据，失败时由调用方提供各自的兜底结果。

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is empty")]
    Empty,
    #[error("response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected {expected}, got {actual}")]
    UnexpectedShape {
        expected: &'static str,
        actual: &'static str,
    },
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 选出需要解析的文本片段：优先```json代码块，其次任意代码块，否则整段文本
pub fn extract_payload(response: &str) -> &str {
    let response = response.trim();

    if let Some(start) = response.find("```json") {
        let body = &response[start + "```json".len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }

    if let Some(start) = response.find("```") {
        let body = &response[start + 3..];
        let end = body.find("```").unwrap_or(body.len());
        let block = &body[..end];
        // 跳过形如```yaml的语言标记行
        let block = match block.split_once('\n') {
            Some((info, rest)) if is_info_string(info) => rest,
            _ => block,
        };
        return block.trim();
    }

    response
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 文本中最外层`open`..`close`之间的片段，用于处理夹杂说明文字的JSON
fn widest_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// 解析为任意JSON值
pub fn parse_value(response: &str) -> Result<Value, ParseError> {
    let payload = extract_payload(response);
    if payload.is_empty() {
        return Err(ParseError::Empty);
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Ok(value),
        Err(err) => {
            for (open, close) in [('{', '}'), ('[', ']')] {
                if let Some(span) = widest_span(payload, open, close)
                    && let Ok(value) = serde_json::from_str::<Value>(span)
                {
                    return Ok(value);
                }
            }
            Err(ParseError::Malformed(err))
        }
    }
}

/// 解析为JSON对象
pub fn parse_object(response: &str) -> Result<Map<String, Value>, ParseError> {
    match parse_value(response)? {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::UnexpectedShape {
            expected: "object",
            actual: shape_name(&other),
        }),
    }
}

/// 解析为列表：接受`{key: [...]}`、裸数组，单个对象会被包装成一个元素的列表
pub fn parse_list(response: &str, key: &str) -> Result<Vec<Value>, ParseError> {
    match parse_value(response)? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(other @ Value::Object(_)) => Ok(vec![other]),
            Some(other) => Err(ParseError::UnexpectedShape {
                expected: "array",
                actual: shape_name(&other),
            }),
            None => Ok(vec![Value::Object(map)]),
        },
        other => Err(ParseError::UnexpectedShape {
            expected: "array or object",
            actual: shape_name(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_fence_wins() {
        let response = "Here you go:\n```json\n{\"a\": 1}\n```\nand ```\n{\"b\": 2}\n```";
        assert_eq!(parse_value(response).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_plain_fence_with_info_string() {
        let response = "```javascript\n[1, 2, 3]\n```";
        assert_eq!(parse_value(response).unwrap(), json!([1, 2, 3]));
        let response = "```\n{\"ok\": true}\n```";
        assert_eq!(parse_value(response).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_unfenced_text_is_trimmed() {
        assert_eq!(parse_value("  \n{\"x\": \"y\"}\n ").unwrap(), json!({"x": "y"}));
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let response = "Sure! The plan is {\"tasks\": []} - let me know.";
        assert_eq!(parse_object(response).unwrap()["tasks"], json!([]));
    }

    #[test]
    fn test_malformed_and_empty() {
        assert!(matches!(
            parse_value("Mock response generated successfully."),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(parse_value("   "), Err(ParseError::Empty)));
        assert!(matches!(parse_value("```json\n```"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parse_object_rejects_arrays() {
        assert!(matches!(
            parse_object("[1]"),
            Err(ParseError::UnexpectedShape { expected: "object", actual: "array" })
        ));
    }

    #[test]
    fn test_parse_list_shapes() {
        assert_eq!(
            parse_list(r#"{"creatives": [{"a": 1}, {"a": 2}]}"#, "creatives").unwrap().len(),
            2
        );
        assert_eq!(parse_list(r#"[{"a": 1}]"#, "creatives").unwrap().len(), 1);

        let wrapped = parse_list(r#"{"headline": "h"}"#, "creatives").unwrap();
        assert_eq!(wrapped, vec![json!({"headline": "h"})]);

        let single = parse_list(r#"{"creatives": {"headline": "h"}}"#, "creatives").unwrap();
        assert_eq!(single, vec![json!({"headline": "h"})]);

        assert!(parse_list("42", "creatives").is_err());
    }
}
