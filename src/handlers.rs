use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::export;
use crate::intent;
use crate::models::{IntelligenceOutput, ParsedIntent, QueryInput};
use crate::recommend;
use crate::services::{GoogleSearchService, OpenAiService};
use crate::strategy;
use crate::synthesis::{self, FieldSampler, SynthesisContext};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Language-model collaborator (intent extraction, recommendations).
    pub llm: OpenAiService,
    /// Web-lookup collaborator (record synthesis).
    pub search: GoogleSearchService,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "trade-intel-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /
///
/// Static welcome payload.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to the Import/Export Intelligence Module! Use /docs for API documentation."
    }))
}

/// POST /analyze-trade
///
/// Runs the full perceive -> decide -> act pipeline for one query: extract
/// structured intent, plan search queries, synthesize partner-country trade
/// records, aggregate recommendations, and export the spreadsheet artifact.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `input` - JSON body containing the natural-language query.
///
/// # Returns
///
/// * `Result<Json<IntelligenceOutput>, AppError>` - The analysis response, a
///   400 when no trade direction could be determined, or a 500 on an
///   unhandled internal fault.
pub async fn analyze_trade(
    State(state): State<Arc<AppState>>,
    Json(input): Json<QueryInput>,
) -> Result<Json<IntelligenceOutput>, AppError> {
    tracing::info!("Received request for analysis: '{}'", input.query);

    // 1. Perceive: parse the natural language query. Extraction failure
    //    degrades to an all-absent intent, rejected just below.
    let parsed = intent::parse_query(&state.llm, &input.query).await.into_intent();
    if parsed.intent.is_none() {
        return Err(AppError::BadRequest(
            "Could not determine import/export intent from query.".to_string(),
        ));
    }

    // 2. Decide: expand the intent into an ordered search strategy.
    let search_queries = strategy::plan_search_queries(&parsed);

    // 3. Act: synthesize records, aggregate recommendations, export.
    let mut ctx = SynthesisContext::new();
    let mut sampler = match state.config.synthesis_seed {
        Some(seed) => FieldSampler::from_seed(seed),
        None => FieldSampler::from_entropy(),
    };
    let trade_data = synthesis::fetch_trade_data(
        &state.search,
        &search_queries,
        &parsed,
        &mut ctx,
        &mut sampler,
        state.config.reference_year,
    )
    .await;

    let recommendations =
        recommend::generate_recommendations(&state.llm, &trade_data, &parsed).await;

    let excel_filename = export_filename(&parsed);
    let excel_path = state.config.output_dir.join(&excel_filename);
    export::export_records(&trade_data, &excel_path).context("exporting trade data")?;

    tracing::info!("Successfully processed query: '{}'", input.query);

    Ok(Json(IntelligenceOutput {
        query: input.query,
        parsed_query: parsed,
        trade_data,
        recommendations,
        download_link: Some(format!("/download/{}", excel_filename)),
    }))
}

/// GET /download/:filename
///
/// Serves a previously generated spreadsheet from the managed output
/// directory.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `filename` - The artifact name as returned in `download_link`.
///
/// # Returns
///
/// * `Result<Response, AppError>` - The spreadsheet bytes, a 400 for unsafe
///   names, or a 404 when the artifact does not exist.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    // Reject anything that could escape the managed output directory.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::BadRequest("Invalid filename.".to_string()));
    }

    let file_path = state.config.output_dir.join(&filename);
    let contents = tokio::fs::read(&file_path)
        .await
        .map_err(|_| AppError::NotFound("File not found.".to_string()))?;

    tracing::info!("Serving file for download: {}", file_path.display());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        contents,
    )
        .into_response())
}

/// Build the artifact filename for a parsed intent.
///
/// Identifier precedence: HSN code, then product name, then `general`;
/// spaces and path separators are sanitized so the name is filesystem- and
/// URL-safe.
pub fn export_filename(parsed: &ParsedIntent) -> String {
    let identifier = parsed
        .hsn_code
        .as_deref()
        .or(parsed.product_name.as_deref())
        .unwrap_or("general");
    let intent = parsed.intent.map(|i| i.as_str()).unwrap_or("trade");
    format!("trade_data_{}_{}.xlsx", sanitize_identifier(identifier), intent)
}

fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' => '-',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeIntent;

    #[test]
    fn filename_uses_hsn_code_and_intent() {
        let parsed = ParsedIntent {
            hsn_code: Some("8419".to_string()),
            intent: Some(TradeIntent::Import),
            ..Default::default()
        };
        assert_eq!(export_filename(&parsed), "trade_data_8419_import.xlsx");
    }

    #[test]
    fn filename_falls_back_to_product_then_general() {
        let parsed = ParsedIntent {
            product_name: Some("gas compressors".to_string()),
            intent: Some(TradeIntent::Export),
            ..Default::default()
        };
        assert_eq!(
            export_filename(&parsed),
            "trade_data_gas_compressors_export.xlsx"
        );

        assert_eq!(
            export_filename(&ParsedIntent::default()),
            "trade_data_general_trade.xlsx"
        );
    }

    #[test]
    fn sanitizer_strips_path_separators() {
        assert_eq!(sanitize_identifier("a/b\\c d"), "a-b-c_d");
    }
}
