//! Spreadsheet export.
//!
//! Writes the synthesized record set to an xlsx workbook. Columns are the
//! union of field labels carrying at least one value across all records, in
//! field-declaration order; a field absent everywhere is dropped entirely.
//! Rows render absent fields as empty cells.

use crate::errors::AppError;
use crate::models::TradeRecord;
use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value};
use std::path::Path;

/// Column labels that would appear in an export of `trade_data`.
///
/// Empty input and the degenerate all-fields-absent case both fall back to
/// the full label set: the file keeps a complete header row so it stays
/// inspectable.
pub fn present_columns(trade_data: &[TradeRecord]) -> Vec<&'static str> {
    if trade_data.is_empty() {
        return TradeRecord::FIELD_LABELS.to_vec();
    }
    let rows = match rows_for(trade_data) {
        Ok(rows) => rows,
        Err(_) => return TradeRecord::FIELD_LABELS.to_vec(),
    };
    columns_for(&rows)
}

/// Export the record set to an xlsx file at `path`.
pub fn export_records(trade_data: &[TradeRecord], path: &Path) -> Result<(), AppError> {
    tracing::debug!("Saving spreadsheet to: {}", path.display());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    if trade_data.is_empty() {
        tracing::warn!("No trade data to export. Creating a header-only file.");
        for (col, label) in TradeRecord::FIELD_LABELS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *label)?;
        }
        workbook.save(path)?;
        return Ok(());
    }

    let rows = rows_for(trade_data)?;
    let columns = columns_for(&rows);

    for (col, label) in columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, *label)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        for (col, label) in columns.iter().enumerate() {
            let (row_num, col_num) = ((row_idx + 1) as u32, col as u16);
            match row.get(*label) {
                Some(Value::Number(n)) => {
                    if let Some(value) = n.as_f64() {
                        worksheet.write_number(row_num, col_num, value)?;
                    }
                }
                Some(Value::String(s)) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Some(other) => {
                    worksheet.write_string(row_num, col_num, other.to_string())?;
                }
                // Absent field: leave the cell empty.
                None => {}
            }
        }
    }

    workbook.save(path)?;
    tracing::info!("Data exported to spreadsheet: {}", path.display());
    Ok(())
}

/// Serialize records to alias-keyed maps with absent fields omitted.
fn rows_for(trade_data: &[TradeRecord]) -> Result<Vec<Map<String, Value>>, AppError> {
    trade_data
        .iter()
        .map(|record| {
            let value = serde_json::to_value(record).map_err(|e| {
                AppError::InternalError(format!("Failed to serialize trade record: {}", e))
            })?;
            match value {
                Value::Object(map) => Ok(map),
                _ => Err(AppError::InternalError(
                    "Trade record did not serialize to an object".to_string(),
                )),
            }
        })
        .collect()
}

fn columns_for(rows: &[Map<String, Value>]) -> Vec<&'static str> {
    let present: Vec<&'static str> = TradeRecord::FIELD_LABELS
        .iter()
        .copied()
        .filter(|label| rows.iter().any(|row| row.contains_key(*label)))
        .collect();

    if present.is_empty() {
        // Degenerate case: records exist but every field is absent. Emit the
        // full header set rather than an empty table.
        TradeRecord::FIELD_LABELS.to_vec()
    } else {
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, volume: Option<f64>, freight: Option<&str>) -> TradeRecord {
        TradeRecord {
            country: Some(country.to_string()),
            volume_usd: volume,
            freight_term: freight.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn columns_are_the_union_of_present_fields_in_declaration_order() {
        let records = vec![
            record("USA", Some(100.0), None),
            record("Germany", None, Some("FOB")),
        ];

        let columns = present_columns(&records);
        assert_eq!(columns, vec!["country", "volume_usd", "Freight Term"]);
    }

    #[test]
    fn field_absent_everywhere_never_appears() {
        let records = vec![record("USA", Some(100.0), None)];
        let columns = present_columns(&records);
        assert!(!columns.contains(&"Shipper Name"));
        assert!(!columns.contains(&"Freight Term"));
    }

    #[test]
    fn all_absent_records_fall_back_to_full_header() {
        let records = vec![TradeRecord::default(), TradeRecord::default()];
        let columns = present_columns(&records);
        assert_eq!(columns.len(), TradeRecord::FIELD_LABELS.len());
    }

    #[test]
    fn empty_input_keeps_the_full_header() {
        assert_eq!(present_columns(&[]).len(), TradeRecord::FIELD_LABELS.len());
    }

    #[test]
    fn export_writes_a_file_for_empty_and_populated_input() {
        let dir = tempfile::tempdir().unwrap();

        let empty_path = dir.path().join("empty.xlsx");
        export_records(&[], &empty_path).unwrap();
        assert!(empty_path.is_file());

        let data_path = dir.path().join("data.xlsx");
        let records = vec![record("USA", Some(120000.55), Some("CIF"))];
        export_records(&records, &data_path).unwrap();
        assert!(data_path.is_file());
        assert!(std::fs::metadata(&data_path).unwrap().len() > 0);
    }
}
