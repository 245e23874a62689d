//! Central error types for the photobooth.
//!
//! Camera failures carry a plain-text `user_message()` suitable for a
//! blocking alert. All errors implement `Serialize` so a UI bridge can
//! forward them as strings.

use serde::Serialize;
use thiserror::Error;

/// Main error type for photobooth operations.
#[derive(Error, Debug)]
pub enum PhotoboothError {
    /// Camera access is blocked at the OS/browser level.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// The user declined the permission prompt.
    #[error("Camera permission request was declined")]
    PermissionRequestDenied,

    /// No camera could be found or acquired
    #[error("No camera available: {0}")]
    DeviceUnavailable(String),

    /// Requested device is not in the enumeration
    #[error("Camera not found with ID {id}")]
    DeviceNotFound { id: String },

    /// Stream acquisition or frame capture failed
    #[error("Camera stream error: {0}")]
    StreamError(String),

    /// An operation needs a live stream but none is open
    #[error("No active camera stream")]
    NoActiveStream,

    /// The stream has not produced a frame yet
    #[error("Camera has not produced a frame yet")]
    NoFrame,

    /// Nothing has been captured yet
    #[error("No photo has been captured yet")]
    NothingCaptured,

    /// Overlay image failed to load or decode
    #[error("Failed to load overlay '{id}': {reason}")]
    AssetLoad { id: String, reason: String },

    /// Overlay identifier escapes the asset directory or is empty
    #[error("Invalid asset identifier: {0}")]
    InvalidAssetId(String),

    /// Overlay identifier is not part of the frame catalog
    #[error("Unknown overlay: {0}")]
    UnknownOverlay(String),

    /// Image encoding failed
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Image processing error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl PhotoboothError {
    /// Whether this error comes from camera acquisition.
    pub fn is_camera_error(&self) -> bool {
        matches!(
            self,
            PhotoboothError::PermissionDenied
                | PhotoboothError::PermissionRequestDenied
                | PhotoboothError::DeviceUnavailable(_)
                | PhotoboothError::DeviceNotFound { .. }
                | PhotoboothError::StreamError(_)
        )
    }

    /// Plain-text message for a blocking user alert.
    pub fn user_message(&self) -> String {
        match self {
            PhotoboothError::PermissionDenied => {
                "Camera access is blocked. Please enable camera access in your browser or system settings, then reopen the photobooth.".to_string()
            },
            PhotoboothError::PermissionRequestDenied => {
                "Camera access was denied. Please allow camera access to use the photobooth.".to_string()
            },
            PhotoboothError::DeviceUnavailable(_)
            | PhotoboothError::DeviceNotFound { .. }
            | PhotoboothError::StreamError(_) => {
                "Unable to access the camera. Please check that a camera is connected and not in use by another application.".to_string()
            },
            other => other.to_string(),
        }
    }
}

/// Serialize as the error message string for UI bridges.
impl Serialize for PhotoboothError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<image::ImageError> for PhotoboothError {
    fn from(err: image::ImageError) -> Self {
        PhotoboothError::ImageError(err.to_string())
    }
}

impl From<String> for PhotoboothError {
    fn from(msg: String) -> Self {
        PhotoboothError::Other(msg)
    }
}

impl From<&str> for PhotoboothError {
    fn from(msg: &str) -> Self {
        PhotoboothError::Other(msg.to_string())
    }
}

/// Extension trait for adding context to Results.
///
/// Similar to anyhow's `Context` trait, this allows chaining context
/// information onto errors for better debugging.
pub trait ResultExt<T> {
    /// Add context to an error, converting it to PhotoboothError::Other.
    fn context(self, msg: &str) -> PhotoboothResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> PhotoboothResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> PhotoboothResult<T> {
        self.map_err(|e| PhotoboothError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> PhotoboothResult<T> {
        self.map_err(|e| PhotoboothError::Other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types.
pub trait OptionExt<T> {
    /// Convert None to PhotoboothError::Other with the given message.
    fn context(self, msg: &str) -> PhotoboothResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, msg: &str) -> PhotoboothResult<T> {
        self.ok_or_else(|| PhotoboothError::Other(msg.to_string()))
    }
}

/// Type alias for Results using PhotoboothError.
pub type PhotoboothResult<T> = Result<T, PhotoboothError>;
