//! Photobooth controller.
//!
//! Ties the camera, countdown, overlay catalog and compositor together:
//!
//! 1. `open_camera` gates on permission and starts the live stream.
//! 2. `start_countdown` arms the timer; `next_event` forwards ticks.
//! 3. When the current run elapses the latest frame is composited with
//!    the selected overlay and kept as the session's capture.
//! 4. `preview_source` and `download` export the capture.
//!
//! Events of a cancelled or replaced countdown are dropped here, so a
//! capture happens exactly once per completed run.

mod state;

#[cfg(test)]
mod tests;

pub use state::{BoothPhase, BoothState, CaptureSummary, CapturedImage, TickOutcome};

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::mpsc;
use ts_rs::TS;

use crate::camera::{CameraBackend, CaptureDevice, MediaSource};
use crate::compositor::{CompositeOptions, Compositor};
use crate::config::booth::get_booth_config;
use crate::config::BoothConfig;
use crate::countdown::{Countdown, CountdownEvent};
use crate::error::{PhotoboothError, PhotoboothResult};
use crate::export;
use crate::overlay::{FrameCatalog, OverlayStore};

/// Events surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BoothEvent {
    /// Seconds left before the shot.
    CountdownTick { remaining: u32 },
    /// A new photo replaced the previous one.
    Captured { capture: CaptureSummary },
    /// The shot failed; the previous photo (if any) is kept.
    CaptureFailed { message: String },
}

/// A photobooth session over camera backend `B`.
pub struct Photobooth<B: CameraBackend> {
    config: BoothConfig,
    state: BoothState,
    media: MediaSource<B>,
    compositor: Compositor,
    countdown: Countdown,
    countdown_rx: mpsc::UnboundedReceiver<CountdownEvent>,
}

impl<B: CameraBackend> Photobooth<B> {
    /// Create a session. The config is validated first.
    pub fn new(backend: B, mut config: BoothConfig) -> PhotoboothResult<Self> {
        config.validate();
        let catalog = FrameCatalog::new(config.overlays.iter().cloned())?;
        let compositor = Compositor::new(OverlayStore::new(&config.asset_dir));
        let (countdown, countdown_rx) = Countdown::new();

        log::info!(
            "[BOOTH] Session created: {}s countdown, {:?} output, {} overlays",
            config.countdown_secs,
            config.output,
            catalog.len()
        );

        Ok(Self {
            config,
            state: BoothState::new(catalog),
            media: MediaSource::new(backend),
            compositor,
            countdown,
            countdown_rx,
        })
    }

    /// Create a session from the global configuration.
    pub fn from_global(backend: B) -> PhotoboothResult<Self> {
        Self::new(backend, get_booth_config())
    }

    pub fn state(&self) -> &BoothState {
        &self.state
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    pub fn media(&self) -> &MediaSource<B> {
        &self.media
    }

    /// Overlay store, e.g. for registering built-in frames.
    pub fn overlays_mut(&mut self) -> &mut OverlayStore {
        self.compositor.overlays_mut()
    }

    // ========== Camera ==========

    pub fn devices(&mut self) -> PhotoboothResult<Vec<CaptureDevice>> {
        self.media.devices()
    }

    /// Open `device_id`, or the first camera. Replaces the current stream.
    ///
    /// On failure the user-facing message is kept in `state().last_error()`.
    pub fn open_camera(&mut self, device_id: Option<&str>) -> PhotoboothResult<CaptureDevice> {
        match self.media.open(device_id) {
            Ok(stream) => {
                let device = stream.device().clone();
                self.state.select_device(device.id.clone());
                Ok(device)
            },
            Err(e) => {
                log::error!("[BOOTH] Camera unavailable: {}", e);
                // The previous stream is closed before the new one opens
                if self.media.active().is_none() {
                    self.state.clear_device();
                }
                self.state.record_error(e.user_message());
                Err(e)
            },
        }
    }

    /// Switch to another camera mid-session.
    pub fn switch_camera(&mut self, device_id: &str) -> PhotoboothResult<CaptureDevice> {
        log::info!("[BOOTH] Switching camera to {}", device_id);
        self.open_camera(Some(device_id))
    }

    // ========== Overlays ==========

    pub fn select_overlay(&mut self, id: &str) -> PhotoboothResult<()> {
        self.state.catalog_mut().select(id)
    }

    /// Cycle to the next overlay. Returns its id.
    pub fn next_overlay(&mut self) -> String {
        self.state.catalog_mut().next().to_string()
    }

    pub fn previous_overlay(&mut self) -> String {
        self.state.catalog_mut().previous().to_string()
    }

    // ========== Countdown ==========

    /// Start (or restart) the countdown for a photo.
    pub fn start_countdown(&mut self) -> PhotoboothResult<u64> {
        if self.media.active().is_none() {
            return Err(PhotoboothError::NoActiveStream);
        }
        let secs = self.config.countdown_secs;
        let generation = self.countdown.start(secs);
        self.state.begin_countdown(generation, secs);
        log::info!("[BOOTH] Countdown {} started ({}s)", generation, secs);
        Ok(generation)
    }

    pub fn cancel_countdown(&mut self) {
        self.countdown.cancel();
        self.state.cancel_countdown();
    }

    /// Wait for the next event of the current countdown run.
    ///
    /// Stale events are skipped. When the run elapses the photo is taken
    /// before this returns. Yields `None` right away when no countdown is
    /// running, so it is safe to loop on after a capture or a cancel.
    pub async fn next_event(&mut self) -> Option<BoothEvent> {
        loop {
            if !self.state.is_counting_down() {
                return None;
            }
            let event = self.countdown_rx.recv().await?;
            match event {
                CountdownEvent::Tick {
                    generation,
                    remaining,
                } => match self.state.apply_tick(generation, remaining) {
                    TickOutcome::Running(remaining) => {
                        return Some(BoothEvent::CountdownTick { remaining })
                    },
                    _ => log::trace!("[BOOTH] Dropped stale tick of run {}", generation),
                },
                CountdownEvent::Elapsed { generation } => {
                    match self.state.apply_elapsed(generation) {
                        TickOutcome::Elapsed => return Some(self.capture().await),
                        _ => log::debug!("[BOOTH] Dropped stale elapse of run {}", generation),
                    }
                },
            }
        }
    }

    // ========== Capture & export ==========

    /// Take a photo right away, superseding any countdown.
    pub async fn capture_now(&mut self) -> PhotoboothResult<CaptureSummary> {
        self.countdown.cancel();
        self.state.begin_capture();
        match self.compose_current().await {
            Ok(captured) => Ok(self.keep(captured)),
            Err(e) => {
                log::error!("[BOOTH] Capture failed: {}", e);
                self.state.fail_capture(e.user_message());
                Err(e)
            },
        }
    }

    /// Latest capture.
    pub fn captured(&self) -> Option<&CapturedImage> {
        self.state.captured()
    }

    /// Data URI of the latest capture for display.
    pub fn preview_source(&self) -> Option<String> {
        self.state
            .captured()
            .map(|c| export::to_preview_source(c.image()))
    }

    /// Save the latest capture into `dir` (default: the download directory).
    pub fn download(&self, dir: Option<&Path>) -> PhotoboothResult<PathBuf> {
        let captured = self
            .state
            .captured()
            .ok_or(PhotoboothError::NothingCaptured)?;
        let dir = dir
            .map(Path::to_path_buf)
            .unwrap_or_else(export::default_download_dir);
        export::to_download(captured.image(), &dir, &self.config.download_filename)
    }

    /// Stop the countdown and release the camera.
    pub fn shutdown(&mut self) {
        self.cancel_countdown();
        self.media.close();
        log::info!("[BOOTH] Session shut down");
    }

    async fn capture(&mut self) -> BoothEvent {
        match self.compose_current().await {
            Ok(captured) => BoothEvent::Captured {
                capture: self.keep(captured),
            },
            Err(e) => {
                log::error!("[BOOTH] Capture failed: {}", e);
                let message = e.user_message();
                self.state.fail_capture(message.clone());
                BoothEvent::CaptureFailed { message }
            },
        }
    }

    async fn compose_current(&mut self) -> PhotoboothResult<CapturedImage> {
        let frame = self
            .media
            .active()
            .ok_or(PhotoboothError::NoActiveStream)?
            .latest_frame()?;
        let overlay_id = self.state.catalog().selected().to_string();
        let options = CompositeOptions {
            output: self.config.output,
            mirror: self.config.mirror,
        };

        let image = self.compositor.compose(&frame, &overlay_id, options).await?;
        Ok(CapturedImage::new(image, overlay_id))
    }

    fn keep(&mut self, captured: CapturedImage) -> CaptureSummary {
        let summary = captured.summary();
        log::info!(
            "[BOOTH] Captured {} ({}x{}, '{}', {} bytes)",
            summary.id,
            summary.width,
            summary.height,
            summary.overlay_id,
            summary.size_bytes
        );
        self.state.finish_capture(captured);
        summary
    }
}
