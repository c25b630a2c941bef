use serde::{Deserialize, Serialize};

/// The two movement types a card report distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// A "ΧΡΕΩΣΗ" row.
    Charge,
    /// A "ΠΙΣΤΩΣΗ" row (card payment / refund).
    Credit,
}

impl TransactionKind {
    pub fn from_token(token: &str) -> Option<TransactionKind> {
        match token {
            "ΧΡΕΩΣΗ" => Some(TransactionKind::Charge),
            "ΠΙΣΤΩΣΗ" => Some(TransactionKind::Credit),
            _ => None,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            TransactionKind::Charge => "ΧΡΕΩΣΗ",
            TransactionKind::Credit => "ΠΙΣΤΩΣΗ",
        }
    }

    /// Sign applied when booking the amount. ΠΙΣΤΩΣΗ rows are negated;
    /// this matches the destination sheet's convention, which is inverted
    /// relative to the tokens' literal meaning (see DESIGN.md).
    pub fn signed(self, magnitude: f64) -> f64 {
        match self {
            TransactionKind::Charge => magnitude,
            TransactionKind::Credit => -magnitude,
        }
    }

    /// Type label written to the spreadsheet row.
    pub const fn sheet_label(self) -> &'static str {
        match self {
            TransactionKind::Charge => "ΑΓΟΡΑ",
            TransactionKind::Credit => "ΠΛΗΡΩΜΗ",
        }
    }
}

/// One transaction line item parsed out of a report email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Display name of the card the email was attributed to.
    pub card: String,
    /// Signed amount: ΧΡΕΩΣΗ positive, ΠΙΣΤΩΣΗ negative.
    pub amount: f64,
    pub kind: TransactionKind,
    /// DD/MM/YYYY, passed through verbatim.
    pub date: String,
    pub description: String,
    /// Locale-formatted, passed through verbatim.
    pub forex_fees: String,
    /// Locale-formatted, passed through verbatim.
    pub cash_withdrawal_fees: String,
}
