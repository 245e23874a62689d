//! Media source adapter: permission gate, device choice and the single
//! active stream.

use super::{CameraBackend, CaptureDevice, LiveStream, PermissionStatus};
use crate::error::{PhotoboothError, PhotoboothResult};

/// Owns the camera backend and at most one live stream.
pub struct MediaSource<B: CameraBackend> {
    backend: B,
    active: Option<LiveStream>,
}

impl<B: CameraBackend> MediaSource<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Currently open stream, if any.
    pub fn active(&self) -> Option<&LiveStream> {
        self.active.as_ref()
    }

    /// Make sure camera access is granted, prompting once if undecided.
    pub fn ensure_permission(&mut self) -> PhotoboothResult<()> {
        match self.backend.permission_status() {
            PermissionStatus::Granted => Ok(()),
            PermissionStatus::Denied => {
                log::warn!("[MEDIA] Camera permission is blocked");
                Err(PhotoboothError::PermissionDenied)
            },
            PermissionStatus::Unknown | PermissionStatus::Prompted => {
                log::info!("[MEDIA] Requesting camera permission");
                match self.backend.request_permission() {
                    PermissionStatus::Granted => {
                        log::info!("[MEDIA] Camera permission granted");
                        Ok(())
                    },
                    status => {
                        log::warn!("[MEDIA] Camera permission not granted ({:?})", status);
                        Err(PhotoboothError::PermissionRequestDenied)
                    },
                }
            },
        }
    }

    /// Enumerate capture devices. Requires permission.
    pub fn devices(&mut self) -> PhotoboothResult<Vec<CaptureDevice>> {
        self.ensure_permission()?;
        self.backend.enumerate()
    }

    /// Open a stream on `device_id`, or on the first camera when `None`.
    ///
    /// Any previously open stream is stopped before the new one is acquired.
    pub fn open(&mut self, device_id: Option<&str>) -> PhotoboothResult<&LiveStream> {
        let devices = self.devices()?;
        let device = match device_id {
            Some(id) => devices
                .into_iter()
                .find(|d| d.id == id)
                .ok_or_else(|| PhotoboothError::DeviceNotFound { id: id.to_string() })?,
            None => devices.into_iter().next().ok_or_else(|| {
                PhotoboothError::DeviceUnavailable("no cameras detected".to_string())
            })?,
        };

        self.close();

        let source = self.backend.open_stream(&device)?;
        let mut stream = LiveStream::new(device, source);
        stream.play()?;

        log::info!(
            "[MEDIA] Opened stream {} on '{}' ({})",
            stream.id(),
            stream.device().label,
            stream.device().id
        );
        Ok(self.active.insert(stream))
    }

    /// Stop and drop the active stream.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.active.take() {
            stream.stop();
        }
    }
}

impl<B: CameraBackend> Drop for MediaSource<B> {
    fn drop(&mut self) {
        self.close();
    }
}
