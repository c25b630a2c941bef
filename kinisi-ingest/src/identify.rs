//! Attribute a report email to one configured card.

use regex::Regex;

use kinisi_core::{CardSpec, ServiceError};

/// Fixed phrase the bank prints immediately before the card's last four
/// digits in the transaction-summary block.
const MARKER_PREFIX: &str = r"Σύνολο Κινήσεων Κάρτας \*\*";

/// Per-card marker patterns, compiled once per configuration and reused
/// for every email in the run.
pub struct CardIdentifier {
    cards: Vec<(CardSpec, Regex)>,
}

impl CardIdentifier {
    pub fn new(cards: &[CardSpec]) -> Result<CardIdentifier, ServiceError> {
        let mut compiled = Vec::with_capacity(cards.len());
        for card in cards {
            let pattern = format!("{MARKER_PREFIX}{}", regex::escape(&card.last_four_digits));
            let marker = Regex::new(&pattern).map_err(|e| {
                ServiceError::Config(format!("marker pattern for card {}: {e}", card.name))
            })?;
            compiled.push((card.clone(), marker));
        }
        Ok(CardIdentifier { cards: compiled })
    }

    /// First configured card whose marker appears in the body, if any.
    ///
    /// A body mentioning several cards' digits resolves to the
    /// earliest-configured one; `None` means the email is not a
    /// transaction report for any known card.
    pub fn identify(&self, body: &str) -> Option<&CardSpec> {
        self.cards
            .iter()
            .find(|(_, marker)| marker.is_match(body))
            .map(|(card, _)| card)
    }
}
