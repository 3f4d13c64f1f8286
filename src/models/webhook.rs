use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Inbound webhook payload
// ============================================================================

/// Webhook request sent by the dialogue platform.
///
/// Only the fields the service reads are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub fulfillment_info: Option<FulfillmentInfo>,
    #[serde(default)]
    pub intent_info: Option<IntentInfo>,
    #[serde(default)]
    pub session_info: Option<SessionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentInfo {
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentInfo {
    #[serde(default)]
    pub parameters: HashMap<String, IntentParameter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentParameter {
    #[serde(default)]
    pub original_value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub session: Option<String>,
}

impl WebhookRequest {
    /// The fulfillment tag, if any
    pub fn tag(&self) -> Option<&str> {
        self.fulfillment_info.as_ref()?.tag.as_deref()
    }

    /// The session identifier supplied by the platform, if any
    pub fn session(&self) -> Option<&str> {
        self.session_info.as_ref()?.session.as_deref()
    }

    /// Text the user originally typed for an intent parameter.
    ///
    /// Numbers are accepted too, since the platform may send a single rating
    /// as a JSON number.
    pub fn original_value(&self, parameter: &str) -> Option<String> {
        let value = self
            .intent_info
            .as_ref()?
            .parameters
            .get(parameter)?
            .original_value
            .as_ref()?;

        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// Outbound fulfillment envelope
// ============================================================================

/// Response envelope expected by the dialogue platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookResponse {
    pub fulfillment_response: FulfillmentResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FulfillmentResponse {
    pub messages: Vec<ResponseMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMessage {
    pub text: TextMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextMessage {
    pub text: Vec<String>,
}

impl WebhookResponse {
    /// Wraps a single text message in the envelope
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            fulfillment_response: FulfillmentResponse {
                messages: vec![ResponseMessage {
                    text: TextMessage {
                        text: vec![message.into()],
                    },
                }],
            },
        }
    }

    /// First text of the first message
    pub fn first_text(&self) -> Option<&str> {
        self.fulfillment_response
            .messages
            .first()?
            .text
            .text
            .first()
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let response = WebhookResponse::text("X");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"fulfillment_response":{"messages":[{"text":{"text":["X"]}}]}}"#
        );
    }

    #[test]
    fn test_reads_ratings_and_session() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "sessionInfo": { "session": "projects/p/sessions/abc" },
            "intentInfo": {
                "parameters": {
                    "user_ratings": { "originalValue": "5,4,3,2,1", "resolvedValue": "5,4,3,2,1" }
                }
            }
        }))
        .unwrap();

        assert_eq!(request.session(), Some("projects/p/sessions/abc"));
        assert_eq!(
            request.original_value("user_ratings"),
            Some("5,4,3,2,1".to_string())
        );
        assert_eq!(request.tag(), None);
    }

    #[test]
    fn test_numeric_original_value() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "intentInfo": { "parameters": { "user_ratings": { "originalValue": 4 } } }
        }))
        .unwrap();
        assert_eq!(request.original_value("user_ratings"), Some("4".to_string()));
    }
}
