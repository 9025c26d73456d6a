use std::env;

use anyhow::Result;

pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => parse_bool(key, &raw),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(error) => anyhow::bail!("{key} is not valid unicode: {error}"),
    }
}

pub(crate) fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be a boolean, got '{raw}'"),
    }
}
