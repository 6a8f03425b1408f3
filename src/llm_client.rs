//! Chat-completions client shared by the merge and scoring steps.

use crate::error::ChatError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize, Debug)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Send a system+user chat completion to an OpenAI-compatible API and return
/// the assistant text.
///
/// Docs: https://platform.openai.com/docs/api-reference/chat/create
pub async fn send_chat_completion(
    base_url: &str,
    api_key: &str,
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
    temperature: f32,
    max_tokens: u32,
) -> Result<String, ChatError> {
    if api_key.trim().is_empty() {
        return Err(ChatError::MissingApiKey);
    }

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!(
        "Sending chat completion to {} (model: {}, user prompt: {} chars)",
        url,
        model,
        user_prompt.len()
    );

    let request_body = ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ],
        temperature,
        max_tokens,
    };

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error response".to_string());
        return Err(ChatError::Api { status, body });
    }

    let completion: ChatCompletionResponse = response.json().await?;
    let content = completion
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or(ChatError::NoChoices)?;

    debug!("Chat completion returned {} chars", content.len());
    Ok(content.trim().to_string())
}
