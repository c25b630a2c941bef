use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use kinisi_core::UserConfig;

use crate::state::ensure_kinisi_home;

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_kinisi_home()?.join("config.json"))
}

/// Load and validate the user configuration.
///
/// Validation failures are fatal here, before anything talks to Gmail or
/// Sheets.
pub fn load_user_config(path: Option<&Path>) -> Result<UserConfig> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let config: UserConfig =
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    config.validate()?;
    Ok(config)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let config = UserConfig::example();
    let json = serde_json::to_string_pretty(&config).context("serialize config")?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    println!("Wrote {}", p.display());
    println!("Fill in your cards and spreadsheet id, then set KINISI_GOOGLE_TOKEN or write the token to ~/.kinisi/token.");
    Ok(())
}
