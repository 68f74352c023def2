use super::{Record, UploadError, UploadFile};
use serde_json::{Number, Value};
use std::future::Future;
use tracing::debug;

/// Turns an accepted file into ordered row records.
pub trait RowExtractor: Send + Sync {
    fn extract(
        &self,
        file: &UploadFile,
    ) -> impl Future<Output = Result<Vec<Record>, UploadError>> + Send;
}

/// Reads the header row and every data row of a CSV file. Cells are trimmed;
/// empty cells become `null` and numeric cells become numbers.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvExtractor;

impl RowExtractor for CsvExtractor {
    async fn extract(&self, file: &UploadFile) -> Result<Vec<Record>, UploadError> {
        let records = parse_csv(&file.bytes)?;
        debug!(file = %file.name, rows = records.len(), "csv extracted");
        Ok(records)
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>, UploadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(index, header)| (header.to_string(), cell_value(row.get(index).unwrap_or(""))))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    // Identifiers such as "007" keep their leading zeros.
    let leading_zero = cell.len() > 1 && cell.starts_with('0') && !cell.starts_with("0.");
    if !leading_zero && cell.bytes().any(|byte| byte.is_ascii_digit()) {
        if let Ok(int) = cell.parse::<i64>() {
            return Value::Number(int.into());
        }
        if let Some(number) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }
    Value::String(cell.to_string())
}
