//! Formatter configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Zero-width space used as the editable placeholder next to block media.
pub const DEFAULT_PLACEHOLDER: &str = "\u{200B}";

/// Options for a formatting pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Run the syntax highlighter over code blocks.
    pub highlight: bool,
    /// Restrict the recognized languages. `None` uses everything the
    /// highlighter knows.
    pub languages: Option<Vec<String>>,
    /// Text inserted around block media that would otherwise touch a block
    /// boundary.
    pub placeholder: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            languages: None,
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
        }
    }
}

impl FormatConfig {
    /// Load a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FormatError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            _ => Err(FormatError::UnsupportedConfig(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, FormatError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Placeholder text, falling back to the default when configured empty.
    ///
    /// An empty placeholder would itself count as an empty sibling and be
    /// padded again on the next pass.
    pub fn placeholder(&self) -> &str {
        if self.placeholder.is_empty() {
            DEFAULT_PLACEHOLDER
        } else {
            &self.placeholder
        }
    }
}
