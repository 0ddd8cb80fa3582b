/// Integration tests with mocked external APIs
/// Tests the collaborator clients and degrade paths without hitting real services
use trade_intel_api::config::Config;
use trade_intel_api::intent::{parse_query, IntentOutcome};
use trade_intel_api::models::{ParsedIntent, TradeIntent, TradeRecord};
use trade_intel_api::recommend::generate_recommendations;
use trade_intel_api::services::{GoogleSearchService, OpenAiService};
use trade_intel_api::synthesis::{fetch_trade_data, FieldSampler, SynthesisContext};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config pointing both collaborators at mocks
fn create_test_config(openai_base_url: String, google_base_url: String) -> Config {
    Config {
        port: 8080,
        openai_api_key: "test_key".to_string(),
        openai_base_url,
        openai_model: "gpt-4o".to_string(),
        google_cse_api_key: "test_key".to_string(),
        google_cse_cx: "test_cx".to_string(),
        google_cse_base_url: google_base_url,
        output_dir: std::env::temp_dir(),
        reference_year: 2023,
        synthesis_seed: Some(42),
    }
}

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

async fn mount_chat_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(content)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_intent_extraction_success() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(
        &mock_server,
        r#"{"hsn_code": "8419", "product_name": null, "country": null, "intent": "import", "keywords": ["high volume"]}"#,
    )
    .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let outcome = parse_query(&llm, "What countries are importing HSN 8419 in high volume?").await;
    let parsed = match outcome {
        IntentOutcome::Parsed(parsed) => parsed,
        IntentOutcome::Failed { reason } => panic!("extraction failed: {}", reason),
    };

    assert_eq!(parsed.hsn_code.as_deref(), Some("8419"));
    assert_eq!(parsed.intent, Some(TradeIntent::Import));
    assert_eq!(parsed.keywords, vec!["high volume".to_string()]);
}

#[tokio::test]
async fn test_intent_extraction_accepts_fenced_reply() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(
        &mock_server,
        "```json\n{\"intent\": \"export\", \"country\": \"India\", \"keywords\": []}\n```",
    )
    .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let outcome = parse_query(&llm, "Where can we export gas compressors from India?").await;
    let parsed = outcome.into_intent();
    assert_eq!(parsed.intent, Some(TradeIntent::Export));
    assert_eq!(parsed.country.as_deref(), Some("India"));
}

#[tokio::test]
async fn test_intent_extraction_malformed_reply_soft_fails() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(&mock_server, "I could not find anything useful.").await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let outcome = parse_query(&llm, "anything").await;
    assert!(matches!(outcome, IntentOutcome::Failed { .. }));
    // Soft failure degrades to the all-absent intent, never a crash.
    assert_eq!(outcome.into_intent(), ParsedIntent::default());
}

#[tokio::test]
async fn test_intent_extraction_transport_failure_soft_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let outcome = parse_query(&llm, "anything").await;
    assert!(matches!(outcome, IntentOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_search_returns_title_link_pairs() {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({
        "items": [
            {"title": "UN Comtrade", "link": "https://comtrade.un.org/data"},
            {"title": "Broken item"},
            {"title": "Eurostat", "link": "https://ec.europa.eu/eurostat"}
        ]
    });

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "UN Comtrade HSN 8419"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let search = GoogleSearchService::new(&config).unwrap();

    let hits = search.search("UN Comtrade HSN 8419").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].link, "https://comtrade.un.org/data");
}

#[tokio::test]
async fn test_search_without_items_is_empty() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let search = GoogleSearchService::new(&config).unwrap();

    let hits = search.search("anything").await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_fetch_skips_documents_and_dedups_links_across_queries() {
    let mock_server = MockServer::start().await;
    // Same result set for every query: one HTML page, one PDF, one Excel file.
    let body = serde_json::json!({
        "items": [
            {"title": "Stats page", "link": "https://trade.example.com/stats"},
            {"title": "Report PDF", "link": "https://trade.example.com/report.pdf"},
            {"title": "Raw sheet", "link": "https://trade.example.com/data-EXCEL-dump"}
        ]
    });

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let search = GoogleSearchService::new(&config).unwrap();

    let parsed = ParsedIntent {
        intent: Some(TradeIntent::Import),
        ..Default::default()
    };
    let queries = vec!["first query".to_string(), "second query".to_string()];
    let mut ctx = SynthesisContext::new();
    let mut sampler = FieldSampler::from_seed(42);

    let records = fetch_trade_data(&search, &queries, &parsed, &mut ctx, &mut sampler, 2023).await;

    // Only the HTML link produces records, and only once despite appearing
    // in both query results: 9 partners, no reporting country to exclude.
    assert_eq!(records.len(), 9);
    assert!(records
        .iter()
        .all(|r| r.source.as_deref() == Some("trade.example.com")));
}

#[tokio::test]
async fn test_fetch_degrades_to_empty_on_search_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let search = GoogleSearchService::new(&config).unwrap();

    let parsed = ParsedIntent {
        intent: Some(TradeIntent::Import),
        ..Default::default()
    };
    let queries = vec!["only query".to_string()];
    let mut ctx = SynthesisContext::new();
    let mut sampler = FieldSampler::from_seed(42);

    let records = fetch_trade_data(&search, &queries, &parsed, &mut ctx, &mut sampler, 2023).await;
    assert!(records.is_empty());
}

fn sample_records() -> Vec<TradeRecord> {
    vec![
        TradeRecord {
            country: Some("USA".to_string()),
            volume_usd: Some(150000.0),
            freight_term: Some("FOB".to_string()),
            ..Default::default()
        },
        TradeRecord {
            country: Some("Germany".to_string()),
            volume_usd: Some(120000.0),
            freight_term: Some("FOB".to_string()),
            ..Default::default()
        },
    ]
}

#[tokio::test]
async fn test_recommendations_append_model_entries_after_deterministic_ones() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(
        &mock_server,
        r#"{"recommendations": [{"title": "Explore CIF", "description": "Most terms are FOB; CIF offers more control."}]}"#,
    )
    .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let parsed = ParsedIntent {
        intent: Some(TradeIntent::Import),
        ..Default::default()
    };
    let recs = generate_recommendations(&llm, &sample_records(), &parsed).await;

    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].title, "Top 3 Importing Markets by Volume");
    assert_eq!(recs[1].title, "Common Freight Terms");
    assert_eq!(recs[2].title, "Explore CIF");
}

#[tokio::test]
async fn test_recommendation_model_failure_keeps_deterministic_entries() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let parsed = ParsedIntent {
        intent: Some(TradeIntent::Import),
        ..Default::default()
    };
    let recs = generate_recommendations(&llm, &sample_records(), &parsed).await;

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].title, "Top 3 Importing Markets by Volume");
    assert_eq!(recs[1].title, "Common Freight Terms");
}

#[tokio::test]
async fn test_recommendation_malformed_model_reply_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(&mock_server, "strategic advice in prose, no JSON").await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let parsed = ParsedIntent {
        intent: Some(TradeIntent::Export),
        ..Default::default()
    };
    let recs = generate_recommendations(&llm, &sample_records(), &parsed).await;

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].title, "Top 3 Exporting Markets by Volume");
}

#[tokio::test]
async fn test_empty_records_yield_exactly_the_insufficient_data_entry() {
    // The model is never consulted for an empty record set; the mock stays idle.
    let mock_server = MockServer::start().await;

    let config = create_test_config(mock_server.uri(), mock_server.uri());
    let llm = OpenAiService::new(&config).unwrap();

    let parsed = ParsedIntent {
        intent: Some(TradeIntent::Import),
        ..Default::default()
    };
    let recs = generate_recommendations(&llm, &[], &parsed).await;

    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "No Data");
}
