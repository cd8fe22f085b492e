use miette::Diagnostic;
use thiserror::Error;

/// Main error type for map export operations
#[derive(Error, Diagnostic, Debug)]
pub enum ExportError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tilemap_export::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(tilemap_export::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Serialization error: {message}")]
    #[diagnostic(code(tilemap_export::serialize))]
    Serialize { message: String },

    #[error("Config error: {message}")]
    #[diagnostic(code(tilemap_export::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;
