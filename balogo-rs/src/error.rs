//! Error types for balogo-rs.

use thiserror::Error;

/// Result type alias using LogoError.
pub type LogoResult<T> = Result<T, LogoError>;

/// Errors that can occur while resolving parameters or rendering.
#[derive(Debug, Error)]
pub enum LogoError {
    /// A request or configuration value failed enum validation.
    #[error("invalid {field}: {value}")]
    InvalidParam { field: &'static str, value: String },

    /// Invalid canvas dimensions (must be positive and within limits).
    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Failed to parse a color value.
    #[error("failed to parse color: {0}")]
    ColorParse(String),

    /// Font registration or resolution error.
    #[error("font error: {0}")]
    Font(String),

    /// Glyph template parse or rasterization error.
    #[error("glyph template error: {0}")]
    Glyph(String),

    /// Background image decode error.
    #[error("failed to decode background image: {0}")]
    ImageDecode(String),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    Png(String),
}

impl LogoError {
    /// Whether the error is the caller's fault (validation) rather than a
    /// render failure. Drives the client/server split of response codes.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LogoError::InvalidParam { .. })
    }
}

impl From<png::EncodingError> for LogoError {
    fn from(err: png::EncodingError) -> Self {
        LogoError::Png(err.to_string())
    }
}
