//! Export options, optionally loaded from a `tilemap-export.yaml` file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::Origin;
use crate::error::{ExportError, Result};
use crate::properties::{Coercion, DEFAULT_LIST_KEY, DEFAULT_LIST_SEPARATOR};

/// The name of the options file looked up next to an input map.
pub const CONFIG_FILENAME: &str = "tilemap-export.yaml";

/// Options controlling a single export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExportOptions {
    /// Property key exported as a list of strings.
    pub list_key: String,

    /// Separator between list entries.
    pub list_separator: char,

    /// Origin of exported positions.
    pub origin: Origin,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            list_key: DEFAULT_LIST_KEY.to_string(),
            list_separator: DEFAULT_LIST_SEPARATOR,
            origin: Origin::default(),
        }
    }
}

impl ExportOptions {
    /// Load options from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExportError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read options: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse options from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ExportError::Config {
            message: format!("Invalid options: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
        })
    }

    /// Property coercion rules implied by these options.
    pub fn coercion(&self) -> Coercion {
        Coercion {
            list_key: self.list_key.clone(),
            list_separator: self.list_separator,
        }
    }
}
