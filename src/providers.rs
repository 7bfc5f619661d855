use crate::config::{Config, GenerationConfig};
use crate::logging::{get_logger, LogCategory, LogContext};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Text generation backend
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send one prompt and return the model's reply text
    async fn generate(&self, prompt: &str, generation: &GenerationConfig) -> Result<String>;

    /// Provider name for logging/display purposes
    fn name(&self) -> &'static str;
}

/// Google Gemini over the `generateContent` REST endpoint
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.api_base_url,
            &config.model,
            config.api_key.clone(),
            Duration::from_millis(config.ai_timeout),
        )
    }

    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base_url, self.model_path())
    }

    fn build_request_body(prompt: &str, generation: &GenerationConfig) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": generation.temperature,
                "topP": generation.top_p,
                "topK": generation.top_k,
                "maxOutputTokens": generation.max_output_tokens,
                "candidateCount": generation.candidate_count
            }
        })
    }

    /// Text parts of the first candidate, joined with newlines
    fn extract_text(body: &Value) -> Result<String> {
        if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
            return Err(anyhow!("Gemini blocked the prompt: {}", reason));
        }

        let text = body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(anyhow!("No response from Gemini"));
        }

        Ok(text)
    }

    /// The `error.message` field of an error body, or the raw body
    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string())
    }

    async fn call_api(&self, prompt: &str, generation: &GenerationConfig) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Gemini API key is missing. Set GOOGLE_API_KEY."))?;

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&Self::build_request_body(prompt, generation))
            .send()
            .await
            .map_err(|e| anyhow!("Gemini request failed: {}", e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error ({}): {}", status, Self::error_message(&error_text)));
        }

        let body: Value = response.json().await?;
        Self::extract_text(&body)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiProvider {
    async fn generate(&self, prompt: &str, generation: &GenerationConfig) -> Result<String> {
        crate::log_debug!(LogCategory::Provider, format!("Using model {}", self.model));

        let start = Instant::now();
        let result = self.call_api(prompt, generation).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Ok(logger) = get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_provider_call(self.name(), duration_ms, result.is_ok());
                if let Err(e) = &result {
                    let context = LogContext::new()
                        .with_provider(self.name())
                        .with_operation("generate")
                        .with_duration_ms(duration_ms);
                    let _ = logger_guard.log_error(LogCategory::Provider, e.to_string(), Some(context));
                }
            }
        }

        result
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: Option<&str>) -> GeminiProvider {
        GeminiProvider::new(
            "https://example.invalid/v1beta/",
            "gemini-1.5-flash",
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            provider(None).endpoint(),
            "https://example.invalid/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_carries_generation_config() {
        let body = GeminiProvider::build_request_body("hello", &GenerationConfig::default());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");

        let config = &body["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 8192);
        assert_eq!(config["candidateCount"], 1);
        assert!((config["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((config["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "first" }, { "text": "second" }] }
            }]
        });
        assert_eq!(GeminiProvider::extract_text(&body).unwrap(), "first\nsecond");
    }

    #[test]
    fn test_extract_text_errors() {
        let empty = json!({ "candidates": [] });
        assert!(GeminiProvider::extract_text(&empty).is_err());

        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = GeminiProvider::extract_text(&blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid."}}"#;
        assert_eq!(GeminiProvider::error_message(body), "API key not valid.");
        assert_eq!(GeminiProvider::error_message("plain failure\n"), "plain failure");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let err = provider(None)
            .generate("hi", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key is missing"));
    }
}
