use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::path::PathBuf;

/// Application settings loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub google_cse_api_key: String,
    pub google_cse_cx: String,
    pub google_cse_base_url: String,
    /// Directory where generated spreadsheets are written and served from.
    pub output_dir: PathBuf,
    /// Year stamped on synthesized trade records.
    pub reference_year: i32,
    /// Optional seed pinning the field-availability sampler. Unset in
    /// production so simulated data keeps its variability.
    pub synthesis_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("OPENAI_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            google_cse_api_key: std::env::var("GOOGLE_CSE_API_KEY")
                .map_err(|_| anyhow::anyhow!("GOOGLE_CSE_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("GOOGLE_CSE_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            google_cse_cx: std::env::var("GOOGLE_CSE_CX")
                .map_err(|_| anyhow::anyhow!("GOOGLE_CSE_CX environment variable required"))
                .and_then(|cx| {
                    if cx.trim().is_empty() {
                        anyhow::bail!("GOOGLE_CSE_CX cannot be empty");
                    }
                    Ok(cx)
                })?,
            google_cse_base_url: std::env::var("GOOGLE_CSE_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
            reference_year: match std::env::var("TRADE_DATA_YEAR") {
                Ok(year) => year
                    .parse()
                    .map_err(|_| anyhow::anyhow!("TRADE_DATA_YEAR must be a valid year"))?,
                Err(_) => Utc::now().year(),
            },
            synthesis_seed: match std::env::var("SYNTHESIS_SEED") {
                Ok(seed) => Some(
                    seed.parse()
                        .map_err(|_| anyhow::anyhow!("SYNTHESIS_SEED must be a u64"))?,
                ),
                Err(_) => None,
            },
        };

        for (name, url) in [
            ("OPENAI_BASE_URL", &config.openai_base_url),
            ("GOOGLE_CSE_BASE_URL", &config.google_cse_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("OpenAI base URL: {}", config.openai_base_url);
        tracing::debug!("OpenAI model: {}", config.openai_model);
        tracing::debug!("Google CSE base URL: {}", config.google_cse_base_url);
        tracing::debug!("Output directory: {}", config.output_dir.display());
        tracing::debug!("Reference year: {}", config.reference_year);
        tracing::debug!("Server Port: {}", config.port);
        if let Some(seed) = config.synthesis_seed {
            tracing::info!("Synthesis sampler pinned to seed {}", seed);
        }

        Ok(config)
    }
}
