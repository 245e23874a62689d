//! Booth session state and its transitions.
//!
//! All mutable session data lives in `BoothState`. The controller feeds it
//! countdown events and capture results; the transition methods decide
//! what is current and what is stale.

use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::compositor::EncodedImage;
use crate::overlay::FrameCatalog;

/// What the booth is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BoothPhase {
    Idle,
    Countdown { remaining: u32 },
    Capturing,
}

/// Result of feeding a countdown event to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Event belongs to a cancelled or replaced run.
    Stale,
    Running(u32),
    /// The countdown reached zero; capture now.
    Elapsed,
}

/// A composited photo held for the session.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    id: String,
    overlay_id: String,
    captured_at: String,
    digest: String,
    image: EncodedImage,
}

impl CapturedImage {
    pub fn new(image: EncodedImage, overlay_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            overlay_id: overlay_id.into(),
            captured_at: chrono::Local::now().to_rfc3339(),
            digest: image.digest(),
            image,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn overlay_id(&self) -> &str {
        &self.overlay_id
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// Hex SHA-256 of the PNG bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            id: self.id.clone(),
            overlay_id: self.overlay_id.clone(),
            width: self.image.width,
            height: self.image.height,
            size_bytes: self.image.png.len(),
            digest: self.digest.clone(),
            captured_at: self.captured_at.clone(),
        }
    }
}

/// Lightweight description of a capture, for events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CaptureSummary {
    pub id: String,
    pub overlay_id: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub digest: String,
    pub captured_at: String,
}

/// Session state.
#[derive(Debug)]
pub struct BoothState {
    phase: BoothPhase,
    selected_device: Option<String>,
    catalog: FrameCatalog,
    countdown_generation: Option<u64>,
    captured: Option<CapturedImage>,
    last_error: Option<String>,
}

impl BoothState {
    pub fn new(catalog: FrameCatalog) -> Self {
        Self {
            phase: BoothPhase::Idle,
            selected_device: None,
            catalog,
            countdown_generation: None,
            captured: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> BoothPhase {
        self.phase
    }

    /// Remaining countdown seconds; 0 when not counting down.
    pub fn countdown(&self) -> u32 {
        match self.phase {
            BoothPhase::Countdown { remaining } => remaining,
            _ => 0,
        }
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self.phase, BoothPhase::Countdown { .. })
    }

    pub fn selected_device(&self) -> Option<&str> {
        self.selected_device.as_deref()
    }

    pub fn catalog(&self) -> &FrameCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut FrameCatalog {
        &mut self.catalog
    }

    /// Latest successful capture.
    pub fn captured(&self) -> Option<&CapturedImage> {
        self.captured.as_ref()
    }

    /// User-facing message of the last failure, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn select_device(&mut self, device_id: impl Into<String>) {
        self.selected_device = Some(device_id.into());
        self.last_error = None;
    }

    /// No camera is open any more.
    pub fn clear_device(&mut self) {
        self.selected_device = None;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// A new countdown run replaces whatever run was current.
    pub fn begin_countdown(&mut self, generation: u64, duration_secs: u32) {
        self.countdown_generation = Some(generation);
        self.phase = BoothPhase::Countdown {
            remaining: duration_secs,
        };
    }

    pub fn apply_tick(&mut self, generation: u64, remaining: u32) -> TickOutcome {
        if !self.is_current(generation) {
            return TickOutcome::Stale;
        }
        self.phase = BoothPhase::Countdown { remaining };
        TickOutcome::Running(remaining)
    }

    /// 1 → 0 transition. Fires at most once per run.
    pub fn apply_elapsed(&mut self, generation: u64) -> TickOutcome {
        if !self.is_current(generation) {
            return TickOutcome::Stale;
        }
        self.countdown_generation = None;
        self.phase = BoothPhase::Capturing;
        TickOutcome::Elapsed
    }

    pub fn cancel_countdown(&mut self) {
        self.countdown_generation = None;
        if self.is_counting_down() {
            self.phase = BoothPhase::Idle;
        }
    }

    /// Manual capture; supersedes any countdown.
    pub fn begin_capture(&mut self) {
        self.countdown_generation = None;
        self.phase = BoothPhase::Capturing;
    }

    /// Replace the previous capture.
    pub fn finish_capture(&mut self, captured: CapturedImage) {
        self.captured = Some(captured);
        self.phase = BoothPhase::Idle;
        self.last_error = None;
    }

    /// Keep the previous capture and remember why this one failed.
    pub fn fail_capture(&mut self, message: impl Into<String>) {
        self.phase = BoothPhase::Idle;
        self.last_error = Some(message.into());
    }

    fn is_current(&self, generation: u64) -> bool {
        self.countdown_generation == Some(generation) && self.is_counting_down()
    }
}
