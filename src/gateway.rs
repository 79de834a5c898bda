use serde::{Deserialize, Serialize};

use crate::services::extraction::{GatewayError, VisionGateway, VisionRequest};

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum ChatMessage<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart<'a>> },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn chat_request(request: &VisionRequest) -> ChatRequest<'_> {
    ChatRequest {
        model: &request.model,
        messages: vec![
            ChatMessage::System {
                content: &request.system_prompt,
            },
            ChatMessage::User {
                content: vec![
                    ContentPart::Text {
                        text: &request.instruction,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &request.image_url,
                        },
                    },
                ],
            },
        ],
    }
}

/// OpenAI-compatible chat completions client for image-to-JSON extraction.
#[derive(Clone)]
pub struct ChatGateway {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl ChatGateway {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl VisionGateway for ChatGateway {
    async fn complete(&self, request: VisionRequest) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::NotConfigured)?;

        tracing::info!(model = %request.model, "sending image to AI gateway");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&chat_request(&request))
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(GatewayError::RateLimited);
        }
        if status.as_u16() == 402 {
            return Err(GatewayError::PaymentRequired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("AI gateway error: {status} - {body}");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyContent)?;

        tracing::debug!("AI gateway answered with {} bytes", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_text_and_image_parts() {
        let request = VisionRequest {
            model: "google/gemini-2.5-pro".to_string(),
            system_prompt: "system".to_string(),
            instruction: "extract".to_string(),
            image_url: "data:image/png;base64,AAAA".to_string(),
        };

        let json = serde_json::to_value(chat_request(&request)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "google/gemini-2.5-pro",
                "messages": [
                    { "role": "system", "content": "system" },
                    { "role": "user", "content": [
                        { "type": "text", "text": "extract" },
                        { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
                    ]}
                ]
            })
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let gateway = ChatGateway::new(DEFAULT_GATEWAY_URL.to_string(), Some(String::new()));
        assert!(!gateway.is_enabled());

        let request = VisionRequest {
            model: "m".to_string(),
            system_prompt: String::new(),
            instruction: String::new(),
            image_url: String::new(),
        };
        let result = gateway.complete(request).await;
        assert!(matches!(result, Err(GatewayError::NotConfigured)));
    }
}
