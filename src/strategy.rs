//! Search strategy planning (the "decide" stage).
//!
//! Pure and deterministic: expands a parsed intent into an ordered list of
//! search queries. The first element is the general free-text query; the rest
//! are source-targeted refinements. Order is significant because the
//! synthesizer dedups links in processing order.

use crate::country::normalize_country_name;
use crate::models::{ParsedIntent, TradeIntent};

/// Build the ordered search-query list for a parsed intent.
pub fn plan_search_queries(parsed: &ParsedIntent) -> Vec<String> {
    let mut base_query = String::new();

    if let Some(code) = &parsed.hsn_code {
        base_query.push_str(&format!("HSN {} ", code));
    }
    if let Some(name) = &parsed.product_name {
        base_query.push_str(&format!("{} ", name));
    }

    base_query.push_str(match parsed.intent {
        Some(TradeIntent::Import) => "import data ",
        Some(TradeIntent::Export) => "export data ",
        None => "trade data ",
    });

    if let Some(country) = &parsed.country {
        if parsed.intent == Some(TradeIntent::Export) {
            base_query.push_str(&format!("from {} ", country));
        } else {
            base_query.push_str(&format!("to {} ", country));
        }
    }

    base_query.push_str("open source statistics");

    let mut search_queries = vec![base_query];

    // Source-targeted refinements only make sense with a concrete HS code.
    if let Some(code) = &parsed.hsn_code {
        let intent_word = intent_word(parsed.intent);
        search_queries.push(format!("UN Comtrade HSN {}", code));
        search_queries.push(format!("EU Eurostat HSN {} {} data", code, intent_word));
        search_queries.push(format!(
            "US Census Bureau HSN {} {} statistics",
            code, intent_word
        ));
        if parsed
            .country
            .as_deref()
            .map(normalize_country_name)
            .as_deref()
            == Some("India")
        {
            search_queries.push(format!("DGFT India HSN {} {} data", code, intent_word));
        }
    }

    tracing::info!("Generated search queries: {:?}", search_queries);
    search_queries
}

fn intent_word(intent: Option<TradeIntent>) -> &'static str {
    match intent {
        Some(TradeIntent::Import) => "import",
        Some(TradeIntent::Export) => "export",
        None => "trade",
    }
}
