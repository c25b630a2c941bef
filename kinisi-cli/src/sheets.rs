//! Sheet writer: append transaction rows to the bookkeeping spreadsheet.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use kinisi_core::ServiceError;
use kinisi_ingest::TransactionRecord;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[async_trait]
pub trait SheetWriter {
    /// Append rows to the named sheet tab. The tab must already exist;
    /// it is never created here.
    async fn append_rows(
        &self,
        sheet_name: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<(), ServiceError>;
}

/// One spreadsheet row per transaction, fixed 8-column order: date, date,
/// description, blank, type label, signed amount, forex fees, cash
/// withdrawal fees.
pub fn transaction_row(record: &TransactionRecord) -> Vec<Value> {
    vec![
        json!(record.date),
        json!(record.date),
        json!(record.description),
        json!(""),
        json!(record.kind.sheet_label()),
        json!(record.amount),
        json!(record.forex_fees),
        json!(record.cash_withdrawal_fees),
    ]
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    sheets: Option<Vec<SheetEntry>>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Sheets REST API v4 implementation of [`SheetWriter`].
pub struct SheetsWriter {
    client: reqwest::Client,
    token: String,
    spreadsheet_id: String,
}

impl SheetsWriter {
    pub fn new(token: String, spreadsheet_id: &str) -> SheetsWriter {
        SheetsWriter {
            client: reqwest::Client::new(),
            token,
            spreadsheet_id: spreadsheet_id.to_string(),
        }
    }

    async fn sheet_exists(&self, sheet_name: &str) -> Result<bool, ServiceError> {
        let url = format!("{SHEETS_API_BASE}/{}", self.spreadsheet_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .map_err(|e| ServiceError::Sheets(format!("fetch spreadsheet: {e}")))?;
        if !response.status().is_success() {
            return Err(ServiceError::Sheets(format!(
                "fetch spreadsheet: status {}",
                response.status()
            )));
        }
        let spreadsheet: SpreadsheetResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Sheets(format!("fetch spreadsheet: {e}")))?;
        Ok(spreadsheet
            .sheets
            .unwrap_or_default()
            .iter()
            .any(|sheet| sheet.properties.title == sheet_name))
    }
}

#[async_trait]
impl SheetWriter for SheetsWriter {
    async fn append_rows(
        &self,
        sheet_name: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<(), ServiceError> {
        if rows.is_empty() {
            return Ok(());
        }
        if !self.sheet_exists(sheet_name).await? {
            return Err(ServiceError::SheetNotFound(sheet_name.to_string()));
        }

        // The A1 range goes in the URL path; parse so the sheet name gets
        // percent-encoded.
        let url = reqwest::Url::parse(&format!(
            "{SHEETS_API_BASE}/{}/values/'{sheet_name}'!A1:append",
            self.spreadsheet_id
        ))
        .map_err(|e| ServiceError::Sheets(format!("append range for {sheet_name}: {e}")))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": rows }))
            .send()
            .await
            .map_err(|e| ServiceError::Sheets(format!("append to {sheet_name}: {e}")))?;
        if !response.status().is_success() {
            return Err(ServiceError::Sheets(format!(
                "append to {sheet_name}: status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
