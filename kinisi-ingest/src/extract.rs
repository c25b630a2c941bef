//! Pull individual transactions out of a report email body.
//!
//! Report bodies carry zero or more fixed-format lines:
//!
//!   ΧΡΕΩΣΗ 50,00 Ημ/νία: 01/01/2024 Αιτιολογία: Test Purchase Έξοδα Συναλλάγματος: 0,00 Έξοδα Ανάληψης Μετρητών: 0,00
//!
//! One compiled pattern with named capture groups is walked over the whole
//! body, producing one record per match in order of appearance.

use regex::Regex;

use kinisi_core::ServiceError;

use crate::locale::{self, LocaleSeparators};
use crate::types::{TransactionKind, TransactionRecord};

pub struct TransactionExtractor {
    pattern: Regex,
    separators: LocaleSeparators,
}

impl TransactionExtractor {
    /// Compile the transaction pattern and resolve the locale's separator
    /// pair. Both are built once and reused for every email in the run.
    pub fn new(locale_tag: &str) -> Result<TransactionExtractor, ServiceError> {
        let kinds = format!(
            "(?P<kind>{}|{})",
            TransactionKind::Charge.token(),
            TransactionKind::Credit.token()
        );
        let pattern = Regex::new(&(kinds
            + concat!(
                r"\s(?P<amount>[\d,\.]+)\s",
                r"Ημ/νία:\s(?P<date>\d{2}/\d{2}/\d{4})\s",
                r"Αιτιολογία:\s(?P<description>.+?)\s",
                r"Έξοδα[\s\n]+?Συναλλάγματος:\s(?P<forex>[\d,\.]+)\s",
                r"Έξοδα\sΑνάληψης\sΜετρητών:\s(?P<cash>[\d,\.]+)"
            )))
        .map_err(|e| ServiceError::Parse(format!("transaction pattern: {e}")))?;
        let separators = LocaleSeparators::for_tag(locale_tag)?;
        Ok(TransactionExtractor { pattern, separators })
    }

    /// All transactions found in the body, in textual order.
    ///
    /// An empty result is not an error here; whether "card matched but no
    /// transactions" is a failure is the caller's decision. A malformed
    /// amount aborts the whole email's extraction.
    pub fn extract(
        &self,
        body: &str,
        card_name: &str,
    ) -> Result<Vec<TransactionRecord>, ServiceError> {
        let mut records = Vec::new();
        for caps in self.pattern.captures_iter(body) {
            let kind = TransactionKind::from_token(&caps["kind"]).ok_or_else(|| {
                ServiceError::Parse(format!("unknown transaction token: {}", &caps["kind"]))
            })?;
            let magnitude = locale::normalize(&caps["amount"], &self.separators)?;
            records.push(TransactionRecord {
                card: card_name.to_string(),
                amount: kind.signed(magnitude),
                kind,
                date: caps["date"].to_string(),
                description: caps["description"].to_string(),
                forex_fees: caps["forex"].to_string(),
                cash_withdrawal_fees: caps["cash"].to_string(),
            });
        }
        Ok(records)
    }
}
