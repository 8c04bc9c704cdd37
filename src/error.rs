use thiserror::Error;

/// Main error type for the anaglyph overlay library
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("{label} file not found: {name}")]
    InputNotFound { label: String, name: String },

    #[error("{label} file not readable: {name}")]
    InputUnreadable { label: String, name: String },

    #[error("Failed to create output directory: {reason}")]
    OutputDirectoryCreation { path: String, reason: String },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while driving the external media engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("FFmpeg binary not available: {binary}")]
    NotAvailable { binary: String },

    #[error("FFmpeg failed: {message}")]
    Failed { message: String },

    #[error("Operation cancelled.")]
    Cancelled,

    #[error("Overlay outcome is no longer available")]
    ChannelClosed,
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using OverlayError
pub type Result<T> = std::result::Result<T, OverlayError>;

impl OverlayError {
    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::OutputDirectoryCreation { .. } => true,
            Self::Engine(EngineError::Failed { .. }) => true,
            Self::Engine(EngineError::Cancelled) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::InputNotFound { label, name } => {
                format!("{} file '{}' was not found. Please check the path.", label, name)
            }
            Self::OutputDirectoryCreation { path, reason } => {
                format!("Could not create output directory '{}': {}", path, reason)
            }
            Self::Engine(EngineError::NotAvailable { binary }) => {
                format!("FFmpeg binary '{}' could not be run. Please install FFmpeg or pass --ffmpeg.", binary)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
