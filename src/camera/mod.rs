//! Camera acquisition.
//!
//! `CameraBackend` is the seam to the platform camera API. `MediaSource`
//! sits on top of it: it checks permission, picks a device, and owns the
//! single live stream.
//!
//! Backends:
//! - `SyntheticCamera`: deterministic test-pattern frames (always available)
//! - `NativeCamera`: real hardware via nokhwa (feature `native-camera`)

mod device;
#[cfg(feature = "native-camera")]
mod native;
mod source;
mod stream;
mod synthetic;

pub use device::{CaptureDevice, PermissionStatus};
#[cfg(feature = "native-camera")]
pub use native::NativeCamera;
pub use source::MediaSource;
pub use stream::{FrameSource, LiveStream, MediaTrack};
pub use synthetic::{test_pattern, SyntheticCamera};

use std::sync::Arc;

use image::RgbaImage;

use crate::error::PhotoboothResult;

/// A single decoded frame from a live stream.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic frame counter within the stream.
    pub sequence: u64,
    /// RGBA pixels.
    pub image: RgbaImage,
}

impl VideoFrame {
    pub fn new(sequence: u64, image: RgbaImage) -> Self {
        Self { sequence, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Platform camera API.
pub trait CameraBackend: Send {
    /// Current permission state, without prompting.
    fn permission_status(&self) -> PermissionStatus;

    /// Prompt the user for camera access and return the resulting state.
    fn request_permission(&mut self) -> PermissionStatus;

    /// List the capture devices currently present.
    fn enumerate(&self) -> PhotoboothResult<Vec<CaptureDevice>>;

    /// Create a frame source for `device`. The source is not started yet.
    fn open_stream(&mut self, device: &CaptureDevice) -> PhotoboothResult<Box<dyn FrameSource>>;
}

/// Shared, cheaply clonable frame handle.
pub type SharedFrame = Arc<VideoFrame>;
