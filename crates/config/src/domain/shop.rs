//! Shop domain configuration: honorifics, nicknames, GST rate defaults
//!
//! Loaded from an optional YAML overlay (`config/shop.yaml`) on top of
//! built-in defaults, mirroring the teacher's `FullVocabularyConfig::load`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopDomainConfigError {
    #[error("shop domain config file not found: {0}: {1}")]
    FileNotFound(String, String),
    #[error("failed to parse shop domain config: {0}")]
    ParseError(String),
}

/// A nickname-table entry: one canonical first name mapped to its common
/// variants").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicknameTable(pub HashMap<String, Vec<String>>);

/// Default GST rate and HSN code for a product category, applied when an
/// auto-created placeholder product needs a sensible starting point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GstDefault {
    pub category: String,
    pub hsn_code: String,
    pub gst_rate: String,
    #[serde(default)]
    pub cess_rate: String,
}

/// The full set of shop-editable domain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopDomainConfig {
    /// Honorifics stripped from either side of a name comparison.
    #[serde(default = "default_honorifics")]
    pub honorifics: Vec<String>,

    /// Canonical name -> nicknames, e.g. "rahul" -> ["raju", "rahu"].
    #[serde(default = "default_nicknames")]
    pub nicknames: HashMap<String, Vec<String>>,

    /// Per-category GST defaults for placeholder products.
    #[serde(default)]
    pub gst_defaults: Vec<GstDefault>,
}

fn default_honorifics() -> Vec<String> {
    [
        "ji", "bhai", "bhaiya", "bhaisahab", "sa", "saab", "sahib", "didi", "bhayya", "anna",
        "akka",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_nicknames() -> HashMap<String, Vec<String>> {
    let pairs: &[(&str, &[&str])] = &[
        ("rahul", &["raju", "rahu"]),
        ("deepak", &["dipak", "deepu"]),
        ("sandeep", &["sandy", "sandi"]),
        ("pradeep", &["pradip", "prads"]),
        ("suresh", &["sures"]),
        ("ramesh", &["ramu"]),
        ("lakshmi", &["laxmi", "lucky"]),
        ("krishna", &["krishn", "kishan"]),
        ("vikram", &["vikas"]),
        ("vivek", &["vicky"]),
        ("saurabh", &["sonu"]),
        ("abhishek", &["abhi"]),
        ("pooja", &["puja"]),
    ];
    pairs
        .iter()
        .map(|(canon, aliases)| {
            (
                canon.to_string(),
                aliases.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for ShopDomainConfig {
    fn default() -> Self {
        Self {
            honorifics: default_honorifics(),
            nicknames: default_nicknames(),
            gst_defaults: Vec::new(),
        }
    }
}

impl ShopDomainConfig {
    /// Load from a YAML file, falling back to built-in defaults for any
    /// field the file omits.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ShopDomainConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ShopDomainConfigError::FileNotFound(path.as_ref().display().to_string(), e.to_string())
        })?;
        serde_yaml::from_str(&content).map_err(|e| ShopDomainConfigError::ParseError(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        if path.as_ref().exists() {
            match Self::load(&path) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to parse shop domain config, using defaults");
                }
            }
        }
        Self::default()
    }

    pub fn all_nicknames_for(&self, canonical: &str) -> &[String] {
        self.nicknames
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_honorifics_include_bhai() {
        let cfg = ShopDomainConfig::default();
        assert!(cfg.honorifics.iter().any(|h| h == "bhai"));
    }

    #[test]
    fn default_nicknames_cover_rahul() {
        let cfg = ShopDomainConfig::default();
        assert!(cfg.all_nicknames_for("rahul").contains(&"raju".to_string()));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ShopDomainConfig::load_or_default("/nonexistent/shop.yaml");
        assert!(!cfg.honorifics.is_empty());
    }
}
