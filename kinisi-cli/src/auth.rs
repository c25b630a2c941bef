use anyhow::{bail, Context, Result};
use std::fs;

use crate::state::kinisi_home;

const TOKEN_ENV: &str = "KINISI_GOOGLE_TOKEN";

/// OAuth bearer token used for both the Gmail and the Sheets API.
///
/// Checked in order: the `KINISI_GOOGLE_TOKEN` environment variable, then
/// `~/.kinisi/token`. The token needs the gmail.modify and spreadsheets
/// scopes.
pub fn access_token() -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let p = kinisi_home()?.join("token");
    if !p.exists() {
        bail!(
            "No Google access token found. Set {TOKEN_ENV} or write the token to {}",
            p.display()
        );
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let token = s.trim().to_string();
    if token.is_empty() {
        bail!("Token file {} is empty", p.display());
    }
    Ok(token)
}
