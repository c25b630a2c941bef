//! Locale-aware number normalization.
//!
//! Report amounts arrive formatted for the user's locale ("1.600,00" under
//! el-GR). The separator pair is looked up once per run from CLDR data and
//! reused for every amount in the scan.

use num_format::Locale;

use kinisi_core::ServiceError;

/// Group/decimal separator pair for one locale tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSeparators {
    pub group: String,
    pub decimal: String,
}

impl LocaleSeparators {
    /// Resolve the separators for a BCP 47 tag like "el-GR".
    ///
    /// CLDR locale names use underscores, and region-default locales are
    /// folded into the bare language ("el-GR" resolves via "el").
    pub fn for_tag(tag: &str) -> Result<LocaleSeparators, ServiceError> {
        let underscored = tag.replace('-', "_");
        let language = tag.split(['-', '_']).next().unwrap_or(tag);
        let locale = Locale::from_name(tag)
            .or_else(|_| Locale::from_name(&underscored))
            .or_else(|_| Locale::from_name(language))
            .map_err(|_| ServiceError::Config(format!("unknown locale tag: {tag}")))?;
        Ok(LocaleSeparators {
            group: locale.separator().to_string(),
            decimal: locale.decimal().to_string(),
        })
    }
}

/// Convert a locale-formatted amount into a float.
///
/// Every group separator is stripped, the first decimal separator becomes
/// ".", and the remainder must parse as a base-10 number. Anything else is
/// a parse error; a silent zero would corrupt the books downstream.
pub fn normalize(text: &str, separators: &LocaleSeparators) -> Result<f64, ServiceError> {
    let stripped = if separators.group.is_empty() {
        text.to_string()
    } else {
        text.replace(&separators.group, "")
    };
    let normalized = stripped.replacen(&separators.decimal, ".", 1);
    normalized
        .parse::<f64>()
        .map_err(|_| ServiceError::Parse(format!("not a valid amount: {text:?}")))
}
