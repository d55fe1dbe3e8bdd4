/// Chat client: the single point of entry for all generative-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All completions for chat, resume review and skill-gap analysis go through here.
///
/// Model: gemini-1.5-flash, fixed in code.
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::gateway::error::{ClassifiedError, ErrorKind};
use crate::gateway::provider::{AuthStyle, ProviderConfig};
use crate::gateway::{kind_from_code, Gateway};

pub const PROVIDER: ProviderConfig = ProviderConfig {
    name: "gemini",
    base_url: "https://generativelanguage.googleapis.com/v1beta",
    api_key_env_var: "GEMINI_API_KEY",
    auth_style: AuthStyle::QueryParam("key"),
    // Every completion is unique; nothing to reuse.
    cache_window: None,
    // 404: the model name is not served.
    status_overrides: &[(404, ErrorKind::BadParameters)],
    embedded_error: detect_error,
};

/// The model used for all completions.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-1.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 2048;
const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Clone)]
pub struct ChatClient {
    gateway: Arc<Gateway>,
}

impl ChatClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Sends the conversation and returns the model's reply text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ClassifiedError> {
        let body = build_request_body(messages)?;
        let path = format!("/models/{MODEL}:generateContent");
        let payload = self.gateway.post_json(&path, body, "generate_content").await?;

        if let Some(usage) = payload.get("usageMetadata") {
            let prompt_tokens = usage.get("promptTokenCount").cloned().unwrap_or_default();
            let output_tokens = usage.get("candidatesTokenCount").cloned().unwrap_or_default();
            debug!(
                "Completion succeeded: prompt_tokens={}, output_tokens={}",
                prompt_tokens, output_tokens
            );
        }

        shape_completion(&payload)
    }

    /// Calls the model and deserializes its reply as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        messages: &[ChatMessage],
    ) -> Result<T, ClassifiedError> {
        let text = self.complete(messages).await?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(&text);

        serde_json::from_str(text).map_err(|e| {
            ClassifiedError::unknown(format!("gemini reply is not the expected JSON: {e}"))
        })
    }
}

/// Builds a `generateContent` body. System messages become the system
/// instruction; `assistant` turns use the provider's `model` role.
pub fn build_request_body(messages: &[ChatMessage]) -> Result<Value, ClassifiedError> {
    let mut system = Vec::new();
    let mut contents = Vec::new();

    for message in messages {
        if message.content.trim().is_empty() {
            return Err(ClassifiedError::bad_parameters("chat messages must not be empty"));
        }
        match message.role {
            ChatRole::System => system.push(json!({ "text": message.content })),
            ChatRole::User => contents.push(json!({
                "role": "user",
                "parts": [{ "text": message.content }]
            })),
            ChatRole::Assistant => contents.push(json!({
                "role": "model",
                "parts": [{ "text": message.content }]
            })),
        }
    }

    match messages.iter().rev().find(|m| m.role != ChatRole::System) {
        Some(last) if last.role == ChatRole::User => {}
        Some(_) => {
            return Err(ClassifiedError::bad_parameters(
                "conversation must end with a user message",
            ))
        }
        None => {
            return Err(ClassifiedError::bad_parameters(
                "conversation has no user message",
            ))
        }
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
            "temperature": TEMPERATURE
        }
    });
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": system });
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompletion {
    #[serde(default)]
    candidates: Vec<RawCandidate>,
    prompt_feedback: Option<RawPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPromptFeedback {
    block_reason: Option<String>,
}

/// Joins the text parts of the first candidate.
pub fn shape_completion(payload: &Value) -> Result<String, ClassifiedError> {
    let raw = RawCompletion::deserialize(payload)
        .map_err(|e| ClassifiedError::unknown(format!("unexpected gemini payload: {e}")))?;

    if let Some(reason) = raw.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ClassifiedError::bad_parameters(format!(
            "gemini blocked the prompt: {reason}"
        )));
    }

    let text: String = raw
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ClassifiedError::unknown("gemini returned empty content"));
    }
    Ok(text)
}

/// Gemini embeds `{"error":{"code","message","status"}}` in some responses.
fn detect_error(payload: &Value) -> Option<ClassifiedError> {
    let error = payload.get("error")?;
    let code = error.get("code").and_then(Value::as_u64);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("gemini reported an error");
    Some(ClassifiedError::new(kind_from_code(code), format!("gemini: {message}")))
}

/// Returns the body of the first fenced block in a reply, or the trimmed reply
/// when it has no fence. Gemini sometimes puts a sentence before the block.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let body = &text[open + 3..];
    let body = body
        .strip_prefix("json")
        .or_else(|| body.strip_prefix("JSON"))
        .unwrap_or(body);
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{test_gateway, ScriptedTransport};

    fn completion(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 30}
        })
    }

    #[test]
    fn test_fenced_reply_with_tag_and_trailing_newline() {
        let reply = "```json\n{\"score\": 81}\n```\n";
        assert_eq!(strip_json_fences(reply), "{\"score\": 81}");
    }

    #[test]
    fn test_fenced_reply_after_leading_prose() {
        let reply = "Here is the skill gap analysis:\n\n```\n{\"required_skills\": []}\n```";
        assert_eq!(strip_json_fences(reply), "{\"required_skills\": []}");
    }

    #[test]
    fn test_unterminated_fence_keeps_body() {
        assert_eq!(strip_json_fences("```JSON\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_unfenced_reply_is_trimmed() {
        assert_eq!(strip_json_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_request_body_maps_roles() {
        let messages = vec![
            ChatMessage::system("You are a career coach."),
            ChatMessage::user("Hi"),
            ChatMessage {
                role: ChatRole::Assistant,
                content: "Hello!".into(),
            },
            ChatMessage::user("How do I become an SRE?"),
        ];
        let body = build_request_body(&messages).unwrap();

        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a career coach."
        );
    }

    #[test]
    fn test_request_body_rejects_bad_conversations() {
        let cases = [
            vec![],
            vec![ChatMessage::system("only system")],
            vec![
                ChatMessage::user("q"),
                ChatMessage {
                    role: ChatRole::Assistant,
                    content: "a".into(),
                },
            ],
            vec![ChatMessage::user("   ")],
        ];
        for messages in cases {
            let err = build_request_body(&messages).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadParameters, "{messages:?}");
        }
    }

    #[test]
    fn test_shape_completion_joins_parts() {
        let payload = json!({
            "candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}}]
        });
        assert_eq!(shape_completion(&payload).unwrap(), "Hello, world");
    }

    #[test]
    fn test_shape_completion_blocked_and_empty() {
        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(
            shape_completion(&blocked).unwrap_err().kind(),
            ErrorKind::BadParameters
        );

        let empty = json!({"candidates": [{"finishReason": "MAX_TOKENS"}]});
        assert_eq!(shape_completion(&empty).unwrap_err().kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_detect_error_uses_structured_code() {
        let payload = json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        });
        assert_eq!(detect_error(&payload).map(|e| e.kind()), Some(ErrorKind::RateLimited));

        let payload = json!({"error": {"message": "odd"}});
        assert_eq!(detect_error(&payload).map(|e| e.kind()), Some(ErrorKind::Unknown));

        assert!(detect_error(&completion("hi")).is_none());
    }

    #[tokio::test]
    async fn test_complete_posts_to_model_with_query_key() {
        let transport = Arc::new(
            ScriptedTransport::new().on(
                ":generateContent",
                200,
                completion("Learn Kubernetes.").to_string(),
            ),
        );
        let (gateway, _clock) = test_gateway(PROVIDER, transport.clone());
        let client = ChatClient::new(Arc::new(gateway));

        let reply = client.complete(&[ChatMessage::user("Next step?")]).await.unwrap();
        assert_eq!(reply, "Learn Kubernetes.");

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, reqwest::Method::POST);
        assert!(request.url.path().ends_with("/models/gemini-1.5-flash:generateContent"));
        assert!(request.body.is_some());
        assert!(!request.redacted_url().contains("test-key"));
    }

    #[tokio::test]
    async fn test_completions_are_never_cached() {
        let transport = Arc::new(
            ScriptedTransport::new().on(":generateContent", 200, completion("ok").to_string()),
        );
        let (gateway, _clock) = test_gateway(PROVIDER, transport.clone());
        let client = ChatClient::new(Arc::new(gateway));

        client.complete(&[ChatMessage::user("a")]).await.unwrap();
        client.complete(&[ChatMessage::user("a")]).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_complete_json_parses_fenced_reply() {
        let reply = "Here is the review:\n```json\n{\"score\": 72}\n```\n";
        let transport = Arc::new(
            ScriptedTransport::new().on(":generateContent", 200, completion(reply).to_string()),
        );
        let (gateway, _clock) = test_gateway(PROVIDER, transport);
        let client = ChatClient::new(Arc::new(gateway));

        let value: Value = client.complete_json(&[ChatMessage::user("rate")]).await.unwrap();
        assert_eq!(value["score"], 72);
    }

    #[tokio::test]
    async fn test_complete_json_rejects_prose() {
        let transport = Arc::new(
            ScriptedTransport::new().on(
                ":generateContent",
                200,
                completion("Sure! Here you go").to_string(),
            ),
        );
        let (gateway, _clock) = test_gateway(PROVIDER, transport);
        let client = ChatClient::new(Arc::new(gateway));

        let err = client
            .complete_json::<Value>(&[ChatMessage::user("rate")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }
}
