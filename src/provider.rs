use serde_json::Value;

use crate::config::ProviderConfig;

/// Typed failure taxonomy for the text-completion service. Every variant
/// degrades to fallback text at the flavor boundary; none is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    NetworkError(String),
    RateLimited,
    InvalidKey,
    BlockedContent(String),
    MalformedResponse(String),
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::NetworkError(detail) => write!(f, "network error: {}", detail),
            CompletionError::RateLimited => write!(f, "rate limited"),
            CompletionError::InvalidKey => write!(f, "invalid API key"),
            CompletionError::BlockedContent(reason) => write!(f, "content blocked: {}", reason),
            CompletionError::MalformedResponse(detail) => {
                write!(f, "malformed response: {}", detail)
            }
        }
    }
}

impl std::error::Error for CompletionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One prior turn of conversational context.
#[derive(Debug, Clone)]
pub struct ContextTurn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub context: Vec<ContextTurn>,
}

impl CompletionRequest {
    pub fn bare(prompt: String) -> Self {
        CompletionRequest {
            prompt,
            context: Vec::new(),
        }
    }
}

/// Client for the external generative-language API.
#[derive(Clone)]
pub struct TextCompletionClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
}

impl TextCompletionClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        TextCompletionClient {
            http_client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Issues one completion call. Best-effort: callers must treat any
    /// error as "use fallback text", never as a user-facing failure.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(CompletionError::InvalidKey)?;

        let mut contents: Vec<Value> = request
            .context
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role.as_str(),
                    "parts": [{ "text": turn.text }]
                })
            })
            .collect();
        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }));

        let request_body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "topP": 0.95,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            api_key
        );

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| CompletionError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 if body.contains("API key not valid") => CompletionError::InvalidKey,
                400 => CompletionError::MalformedResponse(format!("HTTP 400: {}", body)),
                401 | 403 => CompletionError::InvalidKey,
                429 => CompletionError::RateLimited,
                _ => CompletionError::NetworkError(format!("HTTP {}", status)),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        Self::extract_text(&data)
    }

    fn extract_text(data: &Value) -> Result<String, CompletionError> {
        if let Some(reason) = data["promptFeedback"]["blockReason"].as_str() {
            return Err(CompletionError::BlockedContent(reason.to_string()));
        }

        let candidate = &data["candidates"][0];
        if candidate["finishReason"].as_str() == Some("SAFETY") {
            return Err(CompletionError::BlockedContent("SAFETY".to_string()));
        }

        candidate["content"]["parts"][0]["text"]
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .map(|text| text.to_string())
            .ok_or_else(|| {
                CompletionError::MalformedResponse("no candidate text in response".to_string())
            })
    }
}
