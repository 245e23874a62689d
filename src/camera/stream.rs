//! Live stream handle and its tracks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use super::{CaptureDevice, SharedFrame};
use crate::error::{PhotoboothError, PhotoboothResult};

/// Producer of frames for one opened device.
pub trait FrameSource: Send {
    /// Begin producing frames. Called once before the first `latest_frame`.
    fn start(&mut self) -> PhotoboothResult<()>;

    /// Most recent frame, if any has been produced.
    fn latest_frame(&self) -> Option<SharedFrame>;

    /// Stop producing frames and release the hardware.
    fn stop(&mut self);
}

/// One track of a live stream.
///
/// Clones share the same liveness flag, so a handle kept after the stream
/// is gone still reports whether the track was stopped.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    label: String,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    fn new(label: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Always `"video"`; audio is never requested.
    pub fn kind(&self) -> &'static str {
        "video"
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// An open camera stream.
///
/// Dropping the stream stops it.
pub struct LiveStream {
    id: String,
    device: CaptureDevice,
    tracks: Vec<MediaTrack>,
    source: Box<dyn FrameSource>,
    playing: bool,
}

impl LiveStream {
    pub fn new(device: CaptureDevice, source: Box<dyn FrameSource>) -> Self {
        let tracks = vec![MediaTrack::new(&device.label)];
        Self {
            id: Uuid::new_v4().to_string(),
            device,
            tracks,
            source,
            playing: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn device(&self) -> &CaptureDevice {
        &self.device
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start frame delivery.
    pub fn play(&mut self) -> PhotoboothResult<()> {
        if self.playing {
            return Ok(());
        }
        if self.tracks.iter().all(|t| !t.is_live()) {
            return Err(PhotoboothError::StreamError(format!(
                "stream {} was already stopped",
                self.id
            )));
        }
        self.source.start()?;
        self.playing = true;
        log::debug!(
            "[STREAM] {} playing from '{}'",
            self.id,
            self.device.label
        );
        Ok(())
    }

    /// Latest frame from the camera.
    pub fn latest_frame(&self) -> PhotoboothResult<SharedFrame> {
        if !self.playing {
            return Err(PhotoboothError::NoActiveStream);
        }
        self.source.latest_frame().ok_or(PhotoboothError::NoFrame)
    }

    /// Stop every track and release the device.
    pub fn stop(&mut self) {
        if self.tracks.iter().all(|t| !t.is_live()) {
            return;
        }
        self.source.stop();
        for track in &self.tracks {
            track.stop();
        }
        self.playing = false;
        log::info!(
            "[STREAM] {} stopped ({} track(s), device '{}')",
            self.id,
            self.tracks.len(),
            self.device.label
        );
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.stop();
    }
}
