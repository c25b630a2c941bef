use thiserror::Error;

/// Failure kinds across the whole pipeline.
///
/// Every variant renders with the component it came from, so a scan log
/// reads like `sheets: sheet "Gold" not found`. Per-message failures park
/// the whole thread for the next scan; only `Config` is fatal to a run.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad user configuration. Raised before any external call is made.
    #[error("config: {0}")]
    Config(String),

    /// Malformed number or structure while extracting transactions.
    #[error("parse: {0}")]
    Parse(String),

    /// Mail service failure (search, fetch, body decode, labeling).
    #[error("mail: {0}")]
    Mail(String),

    /// The destination sheet tab does not exist. Never auto-created.
    #[error("sheets: sheet {0:?} not found")]
    SheetNotFound(String),

    /// Spreadsheet service failure other than a missing tab.
    #[error("sheets: {0}")]
    Sheets(String),

    /// The email body matches no configured card's marker.
    #[error("workflow: no configured card matches this email")]
    NoCardIdentified,

    /// A card matched but the body held zero transaction blocks.
    #[error("workflow: card matched but no transactions found")]
    NoTransactionsFound,
}
