//! Recommendation aggregation (the "act" stage, analysis half).
//!
//! Two deterministic computations (top markets by summed volume, modal
//! categorical fields) run first, then a best-effort language-model pass adds
//! 1-2 strategic entries. Model failures never disturb the deterministic
//! entries, and the returned list is never empty.

use crate::intent::strip_code_fences;
use crate::models::{ParsedIntent, Recommendation, TradeIntent, TradeRecord};
use crate::services::OpenAiService;
use serde_json::Value;
use std::collections::HashMap;

const ADVISOR_SYSTEM_PROMPT: &str = "You are an expert trade analyst providing concise, actionable recommendations based on provided data and user query context. Do not make up data, focus on strategic advice.";

/// Columns included in the model prompt sample.
const SAMPLE_COLUMNS: [&str; 7] = [
    "country",
    "volume_usd",
    "Product Description",
    "Freight Term",
    "Package Type",
    "Shipper Name",
    "Consignee Name",
];

/// Maximum records rendered into the model prompt.
const SAMPLE_ROWS: usize = 5;

/// Generate the full recommendation list for a record set.
///
/// Never returns an empty list: an empty record set yields the single
/// insufficient-data entry, and an otherwise-empty result gains a generic
/// fallback.
pub async fn generate_recommendations(
    llm: &OpenAiService,
    trade_data: &[TradeRecord],
    parsed: &ParsedIntent,
) -> Vec<Recommendation> {
    tracing::info!("Generating recommendations for {} records", trade_data.len());

    if trade_data.is_empty() {
        return vec![Recommendation {
            title: "No Data".to_string(),
            description: "No sufficient trade data found to generate specific recommendations."
                .to_string(),
        }];
    }

    let mut recommendations = deterministic_recommendations(trade_data, parsed);

    let user_prompt = build_advisory_prompt(trade_data, parsed);
    match llm.complete(ADVISOR_SYSTEM_PROMPT, &user_prompt, 0.7).await {
        Ok(raw) => {
            let extra = parse_llm_recommendations(&raw);
            if extra.is_empty() {
                tracing::warn!("Model returned no usable recommendations: {}", raw);
            }
            recommendations.extend(extra);
        }
        Err(e) => {
            tracing::warn!("Failed to generate model recommendations: {}", e);
        }
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            title: "General Advice".to_string(),
            description: "Further detailed analysis is required for specific recommendations."
                .to_string(),
        });
    }

    recommendations
}

/// The deterministic statistics: top markets and modal categorical fields.
pub fn deterministic_recommendations(
    trade_data: &[TradeRecord],
    parsed: &ParsedIntent,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(rec) = top_markets_recommendation(trade_data, parsed.intent) {
        recommendations.push(rec);
    }

    if let Some(term) = modal_value(trade_data.iter().filter_map(|r| r.freight_term.as_deref())) {
        recommendations.push(Recommendation {
            title: "Common Freight Terms".to_string(),
            description: format!("Most frequently observed freight term: {}.", term),
        });
    }

    if let Some(package) = modal_value(trade_data.iter().filter_map(|r| r.package_type.as_deref()))
    {
        recommendations.push(Recommendation {
            title: "Typical Packaging".to_string(),
            description: format!("Common packaging type: {}.", package),
        });
    }

    recommendations
}

/// Sum volumes per partner country and keep the top 3.
///
/// Groups preserve first-seen order and the descending sort is stable, so
/// equal sums tie-break on first appearance.
pub fn top_markets(trade_data: &[TradeRecord]) -> Vec<(String, f64)> {
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, f64> = HashMap::new();

    for record in trade_data {
        let Some(country) = &record.country else {
            continue;
        };
        if !sums.contains_key(country) {
            order.push(country.clone());
        }
        // Missing volumes count as zero rather than excluding the record.
        *sums.entry(country.clone()).or_insert(0.0) += record.volume_usd.unwrap_or(0.0);
    }

    let mut grouped: Vec<(String, f64)> = order
        .into_iter()
        .map(|country| {
            let sum = sums[&country];
            (country, sum)
        })
        .collect();
    grouped.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    grouped.truncate(3);
    grouped
}

fn top_markets_recommendation(
    trade_data: &[TradeRecord],
    intent: Option<TradeIntent>,
) -> Option<Recommendation> {
    // Requires at least one record carrying a volume.
    if trade_data.iter().all(|r| r.volume_usd.is_none()) {
        return None;
    }

    let top = top_markets(trade_data);
    if top.is_empty() {
        return None;
    }

    let intent_phrase = match intent {
        Some(TradeIntent::Import) => "Importing",
        Some(TradeIntent::Export) => "Exporting",
        None => "Trading",
    };

    let description = top
        .iter()
        .map(|(country, volume)| format!("{}: ${}", country, format_usd(*volume)))
        .collect::<Vec<_>>()
        .join(", ");

    Some(Recommendation {
        title: format!("Top 3 {} Markets by Volume", intent_phrase),
        description,
    })
}

/// Most frequent value, ties broken by first encounter.
pub fn modal_value<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for value in values {
        if !counts.contains_key(value) {
            order.push(value);
        }
        *counts.entry(value).or_insert(0) += 1;
    }

    // Strictly-greater comparison keeps the first-seen value on ties.
    order
        .into_iter()
        .reduce(|best, candidate| {
            if counts[candidate] > counts[best] {
                candidate
            } else {
                best
            }
        })
}

/// Format an amount with thousands separators and two decimals.
pub fn format_usd(amount: f64) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

/// Render the bounded record sample plus intent context into the model prompt.
fn build_advisory_prompt(trade_data: &[TradeRecord], parsed: &ParsedIntent) -> String {
    let sample = trade_data
        .iter()
        .take(SAMPLE_ROWS)
        .map(render_sample_row)
        .collect::<Vec<_>>()
        .join("\n");

    let parsed_json = serde_json::to_string(parsed).unwrap_or_else(|_| "{}".to_string());
    let intent = parsed
        .intent
        .map(|i| i.as_str())
        .unwrap_or("unknown")
        .to_string();
    let product = parsed
        .product_name
        .as_deref()
        .or(parsed.hsn_code.as_deref())
        .unwrap_or("unspecified");
    let country = parsed.country.as_deref().unwrap_or("unspecified");

    format!(
        "Based on the following sample trade data (showing first {} rows and selected columns: {}):\n{}\n\n\
         And the parsed user query:\n{}\n\n\
         Considering the intent '{}' and specific product/HSN '{}' (if available)\n\
         and country '{}' (if available),\n\
         Provide 1-2 concise, actionable recommendations for import/export strategy specific to this context.\n\
         Focus on insights derived from the provided data or common trade strategies.\n\
         For example, if freight terms are mostly FOB, suggest exploring CIF for more control.\n\
         Format as a JSON list of objects, each with 'title' and 'description' keys.",
        SAMPLE_ROWS,
        SAMPLE_COLUMNS.join(", "),
        sample,
        parsed_json,
        intent,
        product,
        country
    )
}

fn render_sample_row(record: &TradeRecord) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    format!(
        "country: {} | volume_usd: {} | product: {} | freight_term: {} | package_type: {} | shipper: {} | consignee: {}",
        text(&record.country),
        record
            .volume_usd
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string()),
        text(&record.product_description),
        text(&record.freight_term),
        text(&record.package_type),
        text(&record.shipper_name),
        text(&record.consignee_name),
    )
}

/// Parse the model's advisory reply.
///
/// Accepts either a bare JSON list or an object carrying a `recommendations`
/// list; entries must have both `title` and `description`. Anything else
/// yields an empty list for the caller to log.
pub fn parse_llm_recommendations(raw: &str) -> Vec<Recommendation> {
    let body = strip_code_fences(raw);
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to decode model recommendations: {}", e);
            return Vec::new();
        }
    };

    let entries = match &parsed {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get("recommendations").and_then(Value::as_array) {
            Some(entries) => entries.as_slice(),
            None => {
                tracing::warn!("Model returned unexpected recommendation format: {}", parsed);
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("Model returned unexpected recommendation format: {}", parsed);
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| {
            let title = entry.get("title").and_then(Value::as_str)?;
            let description = entry.get("description").and_then(Value::as_str)?;
            Some(Recommendation {
                title: title.to_string(),
                description: description.to_string(),
            })
        })
        .collect()
}
