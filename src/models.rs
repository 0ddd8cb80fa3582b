use serde::{Deserialize, Serialize};

// ============ API Request Models ============

/// Request payload carrying the user's natural-language query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryInput {
    /// e.g. "What countries are importing HSN 8419 in high volume?"
    pub query: String,
}

// ============ Parsed Intent ============

/// Trade direction extracted from the query.
///
/// Only the two literal wire values `"import"` and `"export"` are valid;
/// anything else coerces to an absent intent during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeIntent {
    Import,
    Export,
}

impl TradeIntent {
    /// Lowercase wire form, also used in generated filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeIntent::Import => "import",
            TradeIntent::Export => "export",
        }
    }
}

/// Structured intent produced by the Query Intent Extractor.
///
/// Immutable once produced; consumed by the planner and the synthesizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// Extracted HSN code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsn_code: Option<String>,
    /// Extracted product name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Extracted reporting country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Import or export intent; absent means the request is not actionable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<TradeIntent>,
    /// Additional relevant search terms.
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ============ Trade Records ============

/// A single synthesized trade record.
///
/// Every field is independently optional: absence means the field was not
/// available from the (simulated) source and is omitted from JSON and from
/// exported spreadsheets. `country` always denotes the trade partner, never
/// the reporting country named in the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // Core trade data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_unit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    // Shipment detail, serialized under external alias labels
    #[serde(rename = "HS Code", skip_serializing_if = "Option::is_none")]
    pub hscode: Option<String>,
    #[serde(rename = "Product Description", skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
    #[serde(rename = "HS Product Description", skip_serializing_if = "Option::is_none")]
    pub hs_product_description: Option<String>,
    #[serde(rename = "Shipper Name", skip_serializing_if = "Option::is_none")]
    pub shipper_name: Option<String>,
    #[serde(rename = "Consignee Name", skip_serializing_if = "Option::is_none")]
    pub consignee_name: Option<String>,
    #[serde(rename = "Standard Quantity", skip_serializing_if = "Option::is_none")]
    pub std_quantity: Option<f64>,
    #[serde(rename = "Standard Unit", skip_serializing_if = "Option::is_none")]
    pub std_unit: Option<String>,
    #[serde(rename = "Country of Destination", skip_serializing_if = "Option::is_none")]
    pub country_of_destination: Option<String>,
    #[serde(rename = "Package Type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(rename = "Country of Origin", skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
    #[serde(rename = "Quantity", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(rename = "Bill of Lading No", skip_serializing_if = "Option::is_none")]
    pub bill_of_lading_no: Option<String>,
    #[serde(rename = "Consignee Address", skip_serializing_if = "Option::is_none")]
    pub consignee_address: Option<String>,
    #[serde(rename = "Supplier Address", skip_serializing_if = "Option::is_none")]
    pub supplier_address: Option<String>,
    #[serde(rename = "Container TEU", skip_serializing_if = "Option::is_none")]
    pub container_teu: Option<f64>,
    #[serde(rename = "Port of Origin", skip_serializing_if = "Option::is_none")]
    pub port_of_origin: Option<String>,
    #[serde(rename = "Port of Destination", skip_serializing_if = "Option::is_none")]
    pub port_of_destination: Option<String>,
    #[serde(rename = "Port of Delivery", skip_serializing_if = "Option::is_none")]
    pub port_of_delivery: Option<String>,
    #[serde(rename = "Gross Weight", skip_serializing_if = "Option::is_none")]
    pub gross_weight: Option<f64>,
    /// e.g. "10 CBM"
    #[serde(rename = "Measurement", skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
    /// e.g. "FOB", "CIF"
    #[serde(rename = "Freight Term", skip_serializing_if = "Option::is_none")]
    pub freight_term: Option<String>,
    #[serde(rename = "Forwarder Name", skip_serializing_if = "Option::is_none")]
    pub forwarder_name: Option<String>,
    #[serde(rename = "Declarant Name", skip_serializing_if = "Option::is_none")]
    pub declarant_name: Option<String>,
    #[serde(rename = "Notify Party Address", skip_serializing_if = "Option::is_none")]
    pub notify_party_address: Option<String>,
    #[serde(rename = "Declarant Name 2", skip_serializing_if = "Option::is_none")]
    pub declarant_name_2: Option<String>,
    #[serde(rename = "Marks Number", skip_serializing_if = "Option::is_none")]
    pub marks_number: Option<String>,
    #[serde(rename = "Contact Number Booking", skip_serializing_if = "Option::is_none")]
    pub contact_number_booking: Option<String>,
    #[serde(rename = "Contact Email Booking", skip_serializing_if = "Option::is_none")]
    pub contact_email_booking: Option<String>,
}

impl TradeRecord {
    /// External column labels in field-declaration order. The exporter uses
    /// this both to order columns and as the full header set for the
    /// degenerate all-fields-absent case.
    pub const FIELD_LABELS: [&'static str; 34] = [
        "country",
        "volume_usd",
        "volume_unit",
        "unit",
        "year",
        "source",
        "HS Code",
        "Product Description",
        "HS Product Description",
        "Shipper Name",
        "Consignee Name",
        "Standard Quantity",
        "Standard Unit",
        "Country of Destination",
        "Package Type",
        "Country of Origin",
        "Quantity",
        "Bill of Lading No",
        "Consignee Address",
        "Supplier Address",
        "Container TEU",
        "Port of Origin",
        "Port of Destination",
        "Port of Delivery",
        "Gross Weight",
        "Measurement",
        "Freight Term",
        "Forwarder Name",
        "Declarant Name",
        "Notify Party Address",
        "Declarant Name 2",
        "Marks Number",
        "Contact Number Booking",
        "Contact Email Booking",
    ];
}

// ============ Recommendations & Response ============

/// A single recommendation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

/// Final response body for `/analyze-trade`.
///
/// Serialized with absent fields omitted entirely, mirroring the
/// "show only available data parameters" contract.
#[derive(Debug, Clone, Serialize)]
pub struct IntelligenceOutput {
    pub query: String,
    pub parsed_query: ParsedIntent,
    pub trade_data: Vec<TradeRecord>,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}
