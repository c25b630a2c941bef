//! kinisi-core: configuration model and shared error type for the kinisi pipeline.

pub mod config;
pub mod error;

pub use config::{CardSpec, UserConfig, LABEL_PRIMARY, LABEL_PROCESSED};
pub use error::ServiceError;
