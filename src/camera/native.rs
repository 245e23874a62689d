//! Hardware camera backend using nokhwa.
//!
//! Each opened stream owns a capture thread. The thread opens the camera,
//! reports the outcome back to the opener, then keeps decoding frames into
//! a single "latest frame" slot until stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use image::RgbaImage;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::RwLock;

use super::{
    CameraBackend, CaptureDevice, FrameSource, PermissionStatus, SharedFrame, VideoFrame,
};
use crate::error::{PhotoboothError, PhotoboothResult};

/// Maximum consecutive frame capture errors before giving up.
const MAX_CONSECUTIVE_ERRORS: u32 = 30;

/// Delay between retry attempts when recovering from errors.
const ERROR_RETRY_DELAY_MS: u64 = 100;

/// How long to wait for the OS permission prompt to be answered.
const PERMISSION_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long to wait for the capture thread to open the device.
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Cameras reachable through the platform's native API.
pub struct NativeCamera {
    permission: PermissionStatus,
}

impl NativeCamera {
    pub fn new() -> Self {
        Self {
            permission: PermissionStatus::Unknown,
        }
    }
}

impl Default for NativeCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for NativeCamera {
    fn permission_status(&self) -> PermissionStatus {
        if nokhwa::nokhwa_check() {
            PermissionStatus::Granted
        } else {
            self.permission
        }
    }

    fn request_permission(&mut self) -> PermissionStatus {
        let (tx, rx) = flume::bounded::<bool>(1);
        nokhwa::nokhwa_initialize(move |granted| {
            let _ = tx.try_send(granted);
        });

        self.permission = match rx.recv_timeout(PERMISSION_PROMPT_TIMEOUT) {
            Ok(true) => PermissionStatus::Granted,
            Ok(false) => PermissionStatus::Denied,
            Err(_) => PermissionStatus::Prompted,
        };
        log::info!("[CAMERA] Permission prompt result: {:?}", self.permission);
        self.permission
    }

    fn enumerate(&self) -> PhotoboothResult<Vec<CaptureDevice>> {
        let cameras = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| PhotoboothError::DeviceUnavailable(e.to_string()))?;

        let devices: Vec<CaptureDevice> = cameras
            .into_iter()
            .map(|info| CaptureDevice {
                id: info.index().to_string(),
                label: info.human_name(),
                description: Some(info.description().to_string()).filter(|d| !d.is_empty()),
            })
            .collect();

        log::debug!("[CAMERA] Enumerated {} device(s)", devices.len());
        Ok(devices)
    }

    fn open_stream(&mut self, device: &CaptureDevice) -> PhotoboothResult<Box<dyn FrameSource>> {
        Ok(Box::new(NativeFrameSource::new(device.clone())))
    }
}

/// Map a device id back to a nokhwa index.
fn camera_index(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(index) => CameraIndex::Index(index),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}

/// Frame source backed by a capture thread.
struct NativeFrameSource {
    device: CaptureDevice,
    latest: Arc<RwLock<Option<SharedFrame>>>,
    stop_signal: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl NativeFrameSource {
    fn new(device: CaptureDevice) -> Self {
        Self {
            device,
            latest: Arc::new(RwLock::new(None)),
            stop_signal: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl FrameSource for NativeFrameSource {
    fn start(&mut self) -> PhotoboothResult<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        self.stop_signal.store(false, Ordering::SeqCst);
        let (ready_tx, ready_rx) = flume::bounded::<Result<(u32, u32), String>>(1);
        let index = camera_index(&self.device.id);
        let latest = Arc::clone(&self.latest);
        let stop_signal = Arc::clone(&self.stop_signal);

        let thread = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || run_capture_loop(index, latest, stop_signal, ready_tx))
            .map_err(|e| {
                PhotoboothError::StreamError(format!("Failed to spawn capture thread: {}", e))
            })?;
        self.thread = Some(thread);

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok((width, height))) => {
                log::info!(
                    "[CAMERA] '{}' streaming at {}x{}",
                    self.device.label,
                    width,
                    height
                );
                Ok(())
            },
            Ok(Err(message)) => {
                self.stop();
                Err(PhotoboothError::StreamError(message))
            },
            Err(_) => {
                self.stop();
                Err(PhotoboothError::StreamError(format!(
                    "'{}' did not open within {:?}",
                    self.device.label, OPEN_TIMEOUT
                )))
            },
        }
    }

    fn latest_frame(&self) -> Option<SharedFrame> {
        self.latest.read().clone()
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        *self.latest.write() = None;
    }
}

impl Drop for NativeFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open the camera and decode frames until `stop_signal` is raised.
fn run_capture_loop(
    index: CameraIndex,
    latest: Arc<RwLock<Option<SharedFrame>>>,
    stop_signal: Arc<AtomicBool>,
    ready: flume::Sender<Result<(u32, u32), String>>,
) {
    let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestResolution);

    let mut camera = match Camera::new(index, requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(format!("Failed to open camera: {}", e)));
            return;
        },
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(format!("Failed to open camera stream: {}", e)));
        return;
    }

    let resolution = camera.resolution();
    let _ = ready.send(Ok((resolution.width(), resolution.height())));

    let mut sequence: u64 = 0;
    let mut consecutive_errors: u32 = 0;

    while !stop_signal.load(Ordering::Relaxed) {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbAFormat>());

        match decoded {
            Ok(decoded) => {
                consecutive_errors = 0;
                let (width, height) = (decoded.width(), decoded.height());
                let Some(image) = RgbaImage::from_raw(width, height, decoded.into_raw()) else {
                    log::warn!("[CAMERA] Dropping malformed {}x{} frame", width, height);
                    continue;
                };
                sequence += 1;
                if sequence <= 3 || sequence % 300 == 0 {
                    log::debug!("[CAMERA] Frame {}: {}x{}", sequence, width, height);
                }
                *latest.write() = Some(Arc::new(VideoFrame::new(sequence, image)));
            },
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    log::error!(
                        "[CAMERA] Capture failed after {} consecutive errors. Last error: {}",
                        consecutive_errors,
                        e
                    );
                    break;
                } else if consecutive_errors == 1 || consecutive_errors % 10 == 0 {
                    log::warn!(
                        "[CAMERA] Frame capture error ({}/{}): {}",
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS,
                        e
                    );
                }
                std::thread::sleep(Duration::from_millis(ERROR_RETRY_DELAY_MS));
            },
        }
    }

    let _ = camera.stop_stream();
    log::info!("[CAMERA] Capture stopped after {} frames", sequence);
}
