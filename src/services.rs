use crate::config::Config;
use crate::errors::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Number of search results requested per query.
const SEARCH_RESULT_COUNT: &str = "5";

/// Client for the OpenAI chat-completions API.
///
/// The pipeline treats the model as an opaque `complete(system, user)`
/// collaborator expected to return a JSON-parseable payload; any transport or
/// format failure is a recoverable error for the caller, never a crash.
pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create OpenAI client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        })
    }

    /// Request a single JSON-object completion from the model.
    ///
    /// # Arguments
    ///
    /// * `system_prompt` - The system role instruction.
    /// * `user_prompt` - The user message.
    /// * `temperature` - Sampling temperature (0.0 for extraction, higher for
    ///   generative recommendations).
    ///
    /// # Returns
    ///
    /// * `Result<String, AppError>` - The raw message content of the first choice.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, AppError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "response_format": {"type": "json_object"},
            "temperature": temperature
        });

        tracing::debug!("Requesting completion from model '{}'", self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "OpenAI returned status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::ExternalApiError("OpenAI response contained no choices".to_string())
            })?;

        Ok(content)
    }
}

/// A single web search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Client for the Google Custom Search API.
pub struct GoogleSearchService {
    client: Client,
    base_url: String,
    api_key: String,
    cx: String,
}

impl GoogleSearchService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create search client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.google_cse_base_url.clone(),
            api_key: config.google_cse_api_key.clone(),
            cx: config.google_cse_cx.clone(),
        })
    }

    /// Perform a Custom Search and return (title, link) candidates.
    ///
    /// Items missing either field are dropped. Callers treat a transport or
    /// format failure as "no candidates for this query".
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!("{}/customsearch/v1", self.base_url),
            &[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("num", SEARCH_RESULT_COUNT),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Performing Google search for: {}", query);
        // Redact key from logs to prevent credential exposure
        tracing::debug!(
            "Search URL: {}/customsearch/v1?key=[REDACTED]&cx={}&q={}",
            self.base_url,
            self.cx,
            query
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Google Search request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Google Search returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Google Search returned status {}: {}",
                status, error_text
            )));
        }

        let result: CustomSearchResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse search response: {}", e))
        })?;

        let hits: Vec<SearchHit> = result
            .items
            .into_iter()
            .filter_map(|item| match (item.title, item.link) {
                (Some(title), Some(link)) => Some(SearchHit { title, link }),
                _ => None,
            })
            .collect();

        if hits.is_empty() {
            tracing::warn!("No usable items in search results for: {}", query);
        } else {
            tracing::info!("Found {} search results", hits.len());
        }

        Ok(hits)
    }
}
