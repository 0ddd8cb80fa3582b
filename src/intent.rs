//! Query intent extraction (the "perceive" stage).
//!
//! Sends the raw query to the language-model collaborator with a fixed
//! instruction template and worked examples, then validates and coerces the
//! JSON reply into a [`ParsedIntent`]. Extraction failure is a soft failure:
//! the pipeline continues with an all-absent intent and the handler rejects
//! the request as a client error when no trade direction was found.

use crate::models::{ParsedIntent, TradeIntent};
use crate::services::OpenAiService;
use regex::Regex;
use serde::Deserialize;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant designed to extract structured information from user queries.";

const EXTRACTION_TEMPLATE: &str = r#"Analyze the following user query and extract the HSN code, product name, country, and the user's intent (import or export).
If an entity is not explicitly mentioned, return null for that field.
Return the output as a JSON object with the following keys: hsn_code, product_name, country, intent, keywords.
Keywords should be a list of additional relevant terms that could be used for searching.

Examples:
"What countries are importing HSN 8419 in high volume?"
{
    "hsn_code": "8419",
    "product_name": null,
    "country": null,
    "intent": "import",
    "keywords": ["high volume"]
}

"Where can we export gas compressors from India?"
{
    "hsn_code": null,
    "product_name": "gas compressors",
    "country": "India",
    "intent": "export",
    "keywords": []
}

"HSN 9021 imports to Germany, trends?"
{
    "hsn_code": "9021",
    "product_name": null,
    "country": "Germany",
    "intent": "import",
    "keywords": ["trends"]
}

User query: "#;

/// Result of an extraction attempt.
///
/// `Failed` carries the reason so callers can distinguish "the model found
/// nothing" from "the extraction itself broke"; both degrade to an all-absent
/// intent for downstream processing.
#[derive(Debug, Clone)]
pub enum IntentOutcome {
    Parsed(ParsedIntent),
    Failed { reason: String },
}

impl IntentOutcome {
    /// Collapse the outcome into a usable intent, substituting the all-absent
    /// default on failure.
    pub fn into_intent(self) -> ParsedIntent {
        match self {
            IntentOutcome::Parsed(parsed) => parsed,
            IntentOutcome::Failed { .. } => ParsedIntent::default(),
        }
    }
}

/// Raw wire shape of the model reply, before coercion.
#[derive(Debug, Deserialize)]
struct IntentPayload {
    #[serde(default)]
    hsn_code: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Parse a natural-language query into structured intent.
pub async fn parse_query(llm: &OpenAiService, query: &str) -> IntentOutcome {
    tracing::info!("Parsing query - '{}'", query);

    let user_prompt = format!("{}\"{}\"", EXTRACTION_TEMPLATE, query);

    let raw = match llm.complete(SYSTEM_PROMPT, &user_prompt, 0.0).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Model call failed during query parsing: {}", e);
            return IntentOutcome::Failed {
                reason: format!("model call failed: {}", e),
            };
        }
    };

    match coerce_reply(&raw) {
        Ok(parsed) => {
            tracing::info!("Parsed query: {:?}", parsed);
            IntentOutcome::Parsed(parsed)
        }
        Err(reason) => {
            tracing::error!(
                "Failed to decode structured intent: {}. Raw response: {}",
                reason,
                raw
            );
            IntentOutcome::Failed { reason }
        }
    }
}

/// Validate and coerce a raw model reply into a [`ParsedIntent`].
///
/// Accepts replies wrapped in markdown code fences. An unrecognized intent
/// value coerces to absent rather than failing the whole extraction; empty
/// strings coerce to absent.
pub fn coerce_reply(raw: &str) -> Result<ParsedIntent, String> {
    let body = strip_code_fences(raw);

    let payload: IntentPayload =
        serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;

    let intent = match payload.intent.as_deref().map(str::trim) {
        Some("import") => Some(TradeIntent::Import),
        Some("export") => Some(TradeIntent::Export),
        Some("") | None => None,
        Some(other) => {
            tracing::warn!("Unrecognized intent value '{}', treating as absent", other);
            None
        }
    };

    Ok(ParsedIntent {
        hsn_code: non_empty(payload.hsn_code),
        product_name: non_empty(payload.product_name),
        country: non_empty(payload.country),
        intent,
        keywords: payload.keywords,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Strip a surrounding markdown code fence, if any.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let fence = Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").expect("valid fence regex");
    match fence.captures(trimmed) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(trimmed),
        None => trimmed,
    }
}
