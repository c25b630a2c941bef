use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Gmail label that marks report emails as eligible for processing.
pub const LABEL_PRIMARY: &str = "cc_transactions_report";

/// Gmail label attached once every message in a thread has been booked.
pub const LABEL_PROCESSED: &str = "auto_cc_report_processed";

/// One configured payment card: identity plus destination sheet tab.
///
/// `last_four_digits` should be unique across the configuration; if two
/// cards share it, the earlier-configured one wins during identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSpec {
    pub name: String,
    pub last_four_digits: String,
    pub sheet_name: String,
}

/// User configuration, stored as camelCase JSON under `~/.kinisi/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub cards: Vec<CardSpec>,
    pub spreadsheet_id: String,
    pub locale: String,
}

impl UserConfig {
    /// Reject a bad configuration before anything talks to Gmail or Sheets.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.cards.is_empty() {
            return Err(ServiceError::Config(
                "cards must be a non-empty array".to_string(),
            ));
        }
        for (index, card) in self.cards.iter().enumerate() {
            if card.name.is_empty()
                || card.last_four_digits.is_empty()
                || card.sheet_name.is_empty()
            {
                return Err(ServiceError::Config(format!(
                    "invalid card configuration at index {index}"
                )));
            }
        }
        if self.spreadsheet_id.is_empty() {
            return Err(ServiceError::Config("spreadsheetId is required".to_string()));
        }
        if self.locale.is_empty() {
            return Err(ServiceError::Config("locale is required".to_string()));
        }
        Ok(())
    }

    /// Skeleton configuration written by `kinisi init`.
    pub fn example() -> Self {
        UserConfig {
            cards: vec![
                CardSpec {
                    name: "Example Visa Card".to_string(),
                    last_four_digits: "1234".to_string(),
                    sheet_name: "Example Visa Card".to_string(),
                },
                CardSpec {
                    name: "Example Mastercard".to_string(),
                    last_four_digits: "5678".to_string(),
                    sheet_name: "Example Mastercard".to_string(),
                },
            ],
            spreadsheet_id: "your_spreadsheet_id_here".to_string(),
            locale: "el-GR".to_string(),
        }
    }
}
