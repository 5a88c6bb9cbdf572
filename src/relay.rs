use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::Error;

/// Gateway error code signalling a content-policy rejection.
pub const POLICY_BLOCK_CODE: &str = "900514";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 100;

pub const UNKNOWN_ERROR_TEXT: &str = "Unknown error.";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

/// Outcome of one relay call that reached the gateway and got a response.
///
/// Transport failures do not produce an outcome; they surface as
/// [`Error::Http`] from [`relay`] and are mapped by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Success { text: String },
    Failure { text: String },
}

/// Forwards a prompt to the gateway as a chat-completion request and folds
/// the response into display text.
pub async fn relay(
    http: &Client,
    gateway_url: &str,
    token: &str,
    prompt: &str,
    model: &str,
) -> Result<RelayOutcome, Error> {
    let payload = ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: prompt.to_string(),
        }],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };

    debug!(gateway_url, model, "relaying prompt to gateway");
    let response = http
        .post(gateway_url)
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), %body, "gateway responded");

    if status.is_success() {
        Ok(RelayOutcome::Success {
            text: success_text(&body),
        })
    } else {
        warn!(status = status.as_u16(), "gateway call failed");
        Ok(RelayOutcome::Failure {
            text: failure_text(&body),
        })
    }
}

/// On 200: `choices[0].message.content` if present, the stringified JSON
/// otherwise, the raw body when it is not JSON at all.
fn success_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => chat_content(&value).unwrap_or_else(|| value.to_string()),
        Err(_) => body.to_string(),
    }
}

fn chat_content(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn failure_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) if is_policy_block(&value) => block_reason(&value),
        Ok(_) => body.to_string(),
        Err(_) => UNKNOWN_ERROR_TEXT.to_string(),
    }
}

/// The gateway reports the block code as either a JSON string or a number.
fn is_policy_block(value: &Value) -> bool {
    match value.get("code") {
        Some(Value::String(code)) => code == POLICY_BLOCK_CODE,
        Some(Value::Number(code)) => code.to_string() == POLICY_BLOCK_CODE,
        _ => false,
    }
}

pub type ReasonExtractor = fn(&Value) -> Option<String>;

/// Ordered extraction strategies for a policy-block reason; the first strategy
/// that yields a value wins. The order is part of the contract.
pub const BLOCK_REASON_EXTRACTORS: &[(&str, ReasonExtractor)] = &[
    ("assessments.invalidUrls", invalid_urls_reason),
    ("assessments", assessments_text_reason),
    ("actionReason", action_reason),
    ("message + description", message_with_description_reason),
    ("message", message_reason),
];

/// Extracts a human-readable reason from a policy-block error body, falling
/// back to the stringified object when no strategy applies.
pub fn block_reason(value: &Value) -> String {
    for (_, extract) in BLOCK_REASON_EXTRACTORS {
        if let Some(reason) = extract(value) {
            return reason;
        }
    }
    value.to_string()
}

fn invalid_urls_reason(value: &Value) -> Option<String> {
    let urls = value.get("message")?.get("assessments")?.get("invalidUrls")?;
    let joined = urls
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "Response blocked due to invalid or inaccessible URL: {joined}"
    ))
}

fn assessments_text_reason(value: &Value) -> Option<String> {
    value
        .get("message")?
        .get("assessments")?
        .as_str()
        .map(str::to_string)
}

fn action_reason(value: &Value) -> Option<String> {
    value
        .get("message")?
        .get("actionReason")?
        .as_str()
        .map(str::to_string)
}

fn message_with_description_reason(value: &Value) -> Option<String> {
    let message = value.get("message")?.as_str()?;
    let description = value.get("description")?.as_str()?;
    Some(format!("{message} : {description}"))
}

fn message_reason(value: &Value) -> Option<String> {
    let message = value.get("message")?;
    Some(match message.as_str() {
        Some(text) => text.to_string(),
        None => message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn invalid_urls_win_over_everything() {
        let body = json!({
            "code": "900514",
            "message": {
                "assessments": {"invalidUrls": ["http://x", "http://y"]},
                "actionReason": "ignored"
            }
        });
        assert_eq!(
            block_reason(&body),
            "Response blocked due to invalid or inaccessible URL: http://x, http://y"
        );
    }

    #[test]
    fn assessments_string_is_second_priority() {
        let body = json!({"code": "900514", "message": {"assessments": "too spicy"}});
        assert_eq!(block_reason(&body), "too spicy");
    }

    #[test]
    fn action_reason_is_third_priority() {
        let body = json!({"code": "900514", "message": {"actionReason": "policy violation"}});
        assert_eq!(block_reason(&body), "policy violation");
    }

    #[test]
    fn message_and_description_are_concatenated() {
        let body = json!({"code": "900514", "message": "blocked", "description": "bad prompt"});
        assert_eq!(block_reason(&body), "blocked : bad prompt");
    }

    #[test]
    fn bare_message_falls_through() {
        let body = json!({"code": "900514", "message": "blocked"});
        assert_eq!(block_reason(&body), "blocked");
    }

    #[test]
    fn stringifies_object_when_nothing_matches() {
        let body = json!({"code": "900514"});
        assert_eq!(block_reason(&body), body.to_string());
    }

    #[test]
    fn numeric_block_code_is_recognized() {
        assert!(is_policy_block(&json!({"code": 900514})));
        assert!(is_policy_block(&json!({"code": "900514"})));
        assert!(!is_policy_block(&json!({"code": "500"})));
        assert!(!is_policy_block(&json!({})));
    }

    #[test]
    fn success_text_prefers_chat_content() {
        let body = json!({"choices": [{"message": {"content": "hi there"}}]});
        assert_eq!(success_text(&body.to_string()), "hi there");
    }

    #[test]
    fn success_text_falls_back_to_json_then_raw() {
        let body = json!({"unexpected": true});
        assert_eq!(success_text(&body.to_string()), body.to_string());
        assert_eq!(success_text("plain text"), "plain text");
    }

    #[test]
    fn failure_text_handles_non_json_bodies() {
        assert_eq!(failure_text("<html>boom</html>"), UNKNOWN_ERROR_TEXT);
        assert_eq!(
            failure_text(r#"{"code":"500","message":"x"}"#),
            r#"{"code":"500","message":"x"}"#
        );
    }

    #[tokio::test]
    async fn relay_sends_bearer_token_and_parses_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [{"role": "user", "content": "Who are you?"}],
                "temperature": 0.7,
                "max_tokens": 100
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "An assistant."}}]
            })))
            .mount(&server)
            .await;

        let outcome = relay(
            &Client::new(),
            &format!("{}/chat", server.uri()),
            "tok",
            "Who are you?",
            "gpt-test",
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Success {
                text: "An assistant.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn relay_maps_policy_block_to_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "900514",
                "message": {"assessments": {"invalidUrls": ["http://x"]}}
            })))
            .mount(&server)
            .await;

        let outcome = relay(
            &Client::new(),
            &format!("{}/chat", server.uri()),
            "tok",
            "prompt",
            "model",
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Failure {
                text: "Response blocked due to invalid or inaccessible URL: http://x".to_string()
            }
        );
    }
}
