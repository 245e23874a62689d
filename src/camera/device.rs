//! Capture device description and permission state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Information about an available camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CaptureDevice {
    /// Backend-specific identifier used to reopen the device.
    pub id: String,
    /// Human-readable device name.
    pub label: String,
    /// Device description (if available).
    pub description: Option<String>,
}

impl CaptureDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
        }
    }
}

/// Camera permission state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PermissionStatus {
    /// Never asked.
    #[default]
    Unknown,
    /// A prompt was shown but no decision has been reported.
    Prompted,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}
