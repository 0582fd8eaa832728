//! Error types for formatting passes.

use std::path::PathBuf;

use miette::Diagnostic;
use quire_editor_core::TreeError;
use thiserror::Error;

/// Errors that can escape a formatting pass or config load.
///
/// Content problems (odd spans, bad list numbers, highlighter output) are
/// recovered inside the rules and never show up here.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum FormatError {
    /// Invalid tree reference passed by the caller.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),

    /// Config file could not be read.
    #[error("failed to read config {}", .path.display())]
    #[diagnostic(code(quire::config::io))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file extension is neither `.toml` nor `.json`.
    #[error("unsupported config format: {}", .0.display())]
    #[diagnostic(
        code(quire::config::format),
        help("use a .toml or .json file")
    )]
    UnsupportedConfig(PathBuf),

    /// TOML deserialization error.
    #[error("invalid TOML config: {0}")]
    #[diagnostic(code(quire::config::toml))]
    Toml(#[from] toml::de::Error),

    /// JSON deserialization error.
    #[error("invalid JSON config: {0}")]
    #[diagnostic(code(quire::config::json))]
    Json(#[from] serde_json::Error),
}
