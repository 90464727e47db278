use crate::config::{Config, API_KEY_ENV};
use crate::prompt;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct LlmClient;

impl LlmClient {
    /// Shared HTTP client honouring the `[http]` timeouts.
    pub fn http_client(config: &Config) -> Result<Client> {
        Client::builder()
            .connect_timeout(Duration::from_secs(config.http.connect_timeout_secs))
            .timeout(Duration::from_secs(config.http.read_timeout_secs))
            .user_agent(config.http.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")
    }

    /// Sends the extracted terms to the model and returns its raw reply text.
    pub async fn analyze(client: &Client, text: &str, config: &Config) -> Result<String> {
        let prompt = prompt::build_prompt(text, config.model.max_input_chars);
        Self::query(client, &prompt, config).await
    }

    pub async fn query(client: &Client, prompt: &str, config: &Config) -> Result<String> {
        if config.model.api_key.trim().is_empty() {
            anyhow::bail!(
                "No API key configured. Set model.api_key in config.toml or {}",
                API_KEY_ENV
            );
        }

        let url = format!(
            "{}/models/{}:generateContent",
            config.model.endpoint.trim_end_matches('/'),
            config.model.model_id
        );

        log::info!(
            "[LLM] Sending {} chars to {}",
            prompt.chars().count(),
            config.model.model_id
        );

        let res = client
            .post(&url)
            .query(&[("key", config.model.api_key.as_str())])
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error contacting the model API: {}", e))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            log::error!("[LLM] API error {}: {}", status, body);
            if body.is_empty() {
                anyhow::bail!("API request failed with status {}", status.as_u16());
            }
            anyhow::bail!(
                "API request failed with status {}: {}",
                status.as_u16(),
                body.chars().take(500).collect::<String>()
            );
        }

        let json: Value = res
            .json()
            .await
            .context("Model API returned a non-JSON response")?;

        candidate_text(&json)
    }
}

pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ]
    })
}

/// Pulls `candidates[0].content.parts[0].text` out of a reply.
pub fn candidate_text(json: &Value) -> Result<String> {
    let text = json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .context("Unexpected response format from the model API")?;

    if text.trim().is_empty() {
        anyhow::bail!("Model API returned an empty analysis");
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_extraction() {
        let reply = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "**1. SUMMARY:**\n* ok" } ] } }
            ]
        });
        assert_eq!(candidate_text(&reply).unwrap(), "**1. SUMMARY:**\n* ok");
    }

    #[test]
    fn test_missing_text_is_an_error() {
        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(candidate_text(&blocked).is_err());

        let empty = json!({ "candidates": [ { "content": { "parts": [ { "text": "  " } ] } } ] });
        assert!(candidate_text(&empty).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let mut config = Config::default();
        config.model.api_key = String::new();
        let client = Client::new();

        let err = LlmClient::query(&client, "x", &config).await.unwrap_err();
        assert!(err.to_string().contains("No API key"));
    }
}
