// CLI module for vgmeta
//
// Command-line front end over the library: argument parsing, command
// implementations and output formatting.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config, OutputFormat};
pub use output::OutputFormatter;

// Error type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    FileNotFound(String),
    InvalidFormat(String),
    IoError(std::io::Error),
    ParseError(vgmeta::ParseError),
    Other(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::FileNotFound(path) => write!(f, "File not found: {}", path),
            CliError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            CliError::IoError(e) => write!(f, "I/O error: {}", e),
            CliError::ParseError(e) => write!(f, "Parse error: {}", e),
            CliError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::IoError(e) => Some(e),
            CliError::ParseError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::IoError(e)
    }
}

impl From<vgmeta::ParseError> for CliError {
    fn from(e: vgmeta::ParseError) -> Self {
        match e {
            vgmeta::ParseError::FormatMismatch(_) => CliError::InvalidFormat(e.to_string()),
            other => CliError::ParseError(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Other(format!("JSON error: {}", e))
    }
}
