//! Error types for the display client.

use thiserror::Error;

use crate::wifi::LinkStatus;

/// Errors that can occur while booting, polling or rendering.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings are missing or invalid (fatal, raised before bring-up)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network bring-up failed
    #[error(transparent)]
    Wifi(#[from] WifiError),

    /// Image payload was rejected by the image pipeline
    #[error(transparent)]
    Image(#[from] ImageError),

    /// HTTP request failed (network error, connection reset, etc.)
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Response body could not be parsed
    #[error("JSON serialization error: {0}")]
    Serialization(String),

    /// Panel driver failed; no software retry can fix this
    #[error(transparent)]
    Panel(#[from] PanelError),
}

/// Reasons the image pipeline rejects a payload.
///
/// The `Display` strings are what the operator sees on the panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Payload is not a structurally valid PNG (or not valid base64)
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Image uses RGB or a palette
    #[error("not a greyscale image")]
    NotGreyscale,

    /// Image carries an alpha channel
    #[error("alpha not supported")]
    AlphaNotSupported,

    /// Samples are wider than one bit
    #[error("bitdepth is not 1")]
    BitDepth,
}

/// Network bring-up failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WifiError {
    /// Radio reported a terminal non-IP status
    #[error("Wi-Fi connection failed. status={0}")]
    LinkFailed(LinkStatus),

    /// Status never settled within the polling bound
    #[error("Wi-Fi connection timed out")]
    Timeout,

    /// Every attempt failed; the device should reset
    #[error("Wi-Fi retry expired after {attempts} attempts")]
    Aborted {
        /// Number of attempts made
        attempts: u32,
    },

    /// Radio driver rejected a command (not retried)
    #[error("radio error: {0}")]
    Radio(String),
}

impl WifiError {
    /// Whether the outer retry policy should run another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WifiError::LinkFailed(_) | WifiError::Timeout)
    }
}

/// Peripheral-level failure reported by a panel driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panel I/O failed: {0}")]
pub struct PanelError(pub String);

impl PanelError {
    /// Create a new panel error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(format!("Invalid settings YAML: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::Config(format!("Invalid header value: {}", err))
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_error_messages() {
        assert_eq!(ImageError::NotGreyscale.to_string(), "not a greyscale image");
        assert_eq!(ImageError::AlphaNotSupported.to_string(), "alpha not supported");
        assert_eq!(ImageError::BitDepth.to_string(), "bitdepth is not 1");
        assert_eq!(
            ImageError::InvalidData("bad signature".to_string()).to_string(),
            "Invalid image data: bad signature"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::from(WifiError::LinkFailed(LinkStatus::BadAuth));
        assert!(err.to_string().contains("status=-3"));

        let err = Error::from(WifiError::Aborted { attempts: 5 });
        assert!(err.to_string().contains("5 attempts"));

        let err = Error::from(PanelError::new("i2c nack"));
        assert!(err.to_string().contains("i2c nack"));
    }

    #[test]
    fn test_retryable() {
        assert!(WifiError::Timeout.is_retryable());
        assert!(WifiError::LinkFailed(LinkStatus::NoNet).is_retryable());
        assert!(!WifiError::Aborted { attempts: 5 }.is_retryable());
        assert!(!WifiError::Radio("dead".to_string()).is_retryable());
    }
}
