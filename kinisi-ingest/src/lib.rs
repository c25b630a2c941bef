//! kinisi-ingest: card report parsing (card attribution, transaction
//! extraction, locale-aware number normalization).

pub mod extract;
pub mod identify;
pub mod locale;
pub mod types;

pub use extract::TransactionExtractor;
pub use identify::CardIdentifier;
pub use locale::{normalize, LocaleSeparators};
pub use types::{TransactionKind, TransactionRecord};
