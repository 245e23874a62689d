//! Synthetic camera producing deterministic test-pattern frames.
//!
//! Used by the demos and tests, and as a stand-in when no hardware backend
//! is compiled in. Permission outcomes are scriptable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::{
    CameraBackend, CaptureDevice, FrameSource, PermissionStatus, SharedFrame, VideoFrame,
};
use crate::error::{PhotoboothError, PhotoboothResult};

/// Scriptable in-memory camera backend.
pub struct SyntheticCamera {
    devices: Vec<CaptureDevice>,
    frames: HashMap<String, Arc<VideoFrame>>,
    failing: Vec<String>,
    permission: PermissionStatus,
    prompt_outcome: PermissionStatus,
    prompts: usize,
    live: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    /// No devices, permission already granted.
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            frames: HashMap::new(),
            failing: Vec::new(),
            permission: PermissionStatus::Granted,
            prompt_outcome: PermissionStatus::Granted,
            prompts: 0,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a device that streams a `width`×`height` test pattern.
    pub fn with_device(self, device: CaptureDevice, width: u32, height: u32) -> Self {
        let pattern = test_pattern(width, height);
        self.with_frame(device, pattern)
    }

    /// Add a device that streams the given image.
    pub fn with_frame(mut self, device: CaptureDevice, image: RgbaImage) -> Self {
        self.frames
            .insert(device.id.clone(), Arc::new(VideoFrame::new(1, image)));
        self.devices.push(device);
        self
    }

    /// Make opening `device_id` fail as if the hardware were busy.
    pub fn with_failing_device(mut self, device_id: &str) -> Self {
        self.failing.push(device_id.to_string());
        self
    }

    pub fn with_permission(mut self, status: PermissionStatus) -> Self {
        self.permission = status;
        self
    }

    /// What the user answers when prompted.
    pub fn with_prompt_outcome(mut self, status: PermissionStatus) -> Self {
        self.prompt_outcome = status;
        self
    }

    /// Change the answer to future prompts.
    pub fn set_prompt_outcome(&mut self, status: PermissionStatus) {
        self.prompt_outcome = status;
    }

    /// Number of permission prompts shown so far.
    pub fn prompt_count(&self) -> usize {
        self.prompts
    }

    /// Number of sources currently producing frames.
    pub fn live_sources(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCamera {
    fn permission_status(&self) -> PermissionStatus {
        self.permission
    }

    fn request_permission(&mut self) -> PermissionStatus {
        self.prompts += 1;
        self.permission = self.prompt_outcome;
        self.permission
    }

    fn enumerate(&self) -> PhotoboothResult<Vec<CaptureDevice>> {
        Ok(self.devices.clone())
    }

    fn open_stream(&mut self, device: &CaptureDevice) -> PhotoboothResult<Box<dyn FrameSource>> {
        if self.failing.contains(&device.id) {
            return Err(PhotoboothError::DeviceUnavailable(format!(
                "'{}' is in use by another application",
                device.label
            )));
        }
        let frame = self
            .frames
            .get(&device.id)
            .cloned()
            .ok_or_else(|| PhotoboothError::DeviceNotFound {
                id: device.id.clone(),
            })?;
        Ok(Box::new(SyntheticSource {
            frame,
            running: false,
            live: Arc::clone(&self.live),
        }))
    }
}

struct SyntheticSource {
    frame: SharedFrame,
    running: bool,
    live: Arc<AtomicUsize>,
}

impl FrameSource for SyntheticSource {
    fn start(&mut self) -> PhotoboothResult<()> {
        if !self.running {
            self.running = true;
            self.live.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn latest_frame(&self) -> Option<SharedFrame> {
        self.running.then(|| Arc::clone(&self.frame))
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Opaque horizontal/vertical gradient.
pub fn test_pattern(width: u32, height: u32) -> RgbaImage {
    let w = width.max(1);
    let h = height.max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / w) as u8, (y * 255 / h) as u8, 128, 255])
    })
}
