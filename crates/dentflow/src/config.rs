//! Shop configuration used by notification templates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// Branding and contact details substituted into notification templates.
///
/// Every field has a default so templates referencing `{{company_name}}`,
/// `{{phone_number}}`, or `{{portal_url}}` always resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub company_name: String,
    pub phone_number: String,
    pub portal_url: String,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            company_name: "Dentflow PDR".to_string(),
            phone_number: String::new(),
            portal_url: String::new(),
        }
    }
}

/// Loads a `CompanyConfig` from a JSON file. Missing fields fall back to
/// their defaults.
pub fn load_config(path: &Path) -> Result<CompanyConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: CompanyConfig = serde_json::from_str(&contents)?;
    Ok(config)
}
