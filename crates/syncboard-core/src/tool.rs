use serde::{Deserialize, Serialize};

/// Argument field carrying the free-text instruction for a tool.
pub const INPUT_FIELD: &str = "input";
/// Accepted alias for [`INPUT_FIELD`].
pub const QUERY_FIELD: &str = "query";

/// A request from the model to invoke a named tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Builds a call whose arguments are `{"input": <input>}`.
    pub fn with_input(
        id: impl Into<String>,
        name: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        let input: String = input.into();
        Self {
            id: id.into(),
            name: name.into(),
            arguments: serde_json::json!({ INPUT_FIELD: input }),
        }
    }

    /// Extracts the free-text instruction from the arguments.
    ///
    /// Looks at `input`, then `query`. A bare JSON string is taken as-is and
    /// anything else is passed through as its JSON text so that nothing the
    /// model sent is silently dropped.
    pub fn input_text(&self) -> String {
        match &self.arguments {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            serde_json::Value::Object(map) => map
                .get(INPUT_FIELD)
                .or_else(|| map.get(QUERY_FIELD))
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default(),
            other => other.to_string(),
        }
    }
}

/// Terminal outcome of a tool invocation.
///
/// Both variants are valid results; a tool never surfaces failures as an
/// `Err` to its caller. Serializes to the raw result value or to
/// `{"error": "..."}`.
///
/// A successful value may itself look like `{"error": ...}`, so the wire form
/// does not identify the variant. Use [`ToolOutput::is_error`] or
/// [`ToolOutput::into_result`] instead of re-parsing serialized output; the
/// type is serialize-only for that reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Error { error: String },
    Value(serde_json::Value),
}

impl ToolOutput {
    pub fn value(value: impl Into<serde_json::Value>) -> Self {
        ToolOutput::Value(value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolOutput::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutput::Error { .. })
    }

    /// Renders the output as text for an LLM tool-result message.
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Value(serde_json::Value::String(s)) => s.clone(),
            ToolOutput::Value(v) => v.to_string(),
            ToolOutput::Error { error } => error.clone(),
        }
    }

    /// Pairs this output with the originating call id.
    pub fn into_result(self, call_id: impl Into<String>) -> ToolResult {
        if self.is_error() {
            ToolResult::error(call_id, self.to_text())
        } else {
            ToolResult::success(call_id, self.to_text())
        }
    }
}

/// The result sent back to the model after executing a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_text_prefers_input_field() {
        let call = ToolCall {
            id: "c1".to_string(),
            name: "ping".to_string(),
            arguments: serde_json::json!({"input": "hello", "query": "ignored"}),
        };
        assert_eq!(call.input_text(), "hello");
    }

    #[test]
    fn test_input_text_query_alias() {
        let call = ToolCall {
            id: "c1".to_string(),
            name: "search".to_string(),
            arguments: serde_json::json!({"query": "rust"}),
        };
        assert_eq!(call.input_text(), "rust");
    }

    #[test]
    fn test_input_text_bare_string_and_missing() {
        let mut call = ToolCall {
            id: "c1".to_string(),
            name: "x".to_string(),
            arguments: serde_json::json!("plain"),
        };
        assert_eq!(call.input_text(), "plain");

        call.arguments = serde_json::json!({});
        assert_eq!(call.input_text(), "");
    }

    #[test]
    fn test_error_output_shape() {
        let out = ToolOutput::error("host not permitted");
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            serde_json::json!({"error": "host not permitted"})
        );
        assert!(out.is_error());
    }

    #[test]
    fn test_value_output_shape() {
        let out = ToolOutput::value("pong");
        assert_eq!(serde_json::to_value(&out).unwrap(), serde_json::json!("pong"));
        assert_eq!(out.to_text(), "pong");
    }

    #[test]
    fn test_into_result() {
        let result = ToolOutput::error("boom").into_result("call_1");
        assert!(result.is_error);
        assert_eq!(result.content, "boom");

        let result = ToolOutput::value(serde_json::json!({"n": 1})).into_result("call_2");
        assert!(!result.is_error);
        assert_eq!(result.content, r#"{"n":1}"#);
    }
}
