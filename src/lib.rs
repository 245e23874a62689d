//! Photobooth capture flow.
//!
//! Opens a camera, counts down, composites the live frame with a decorative
//! overlay into a fixed-size PNG, and exports it for preview or download.
//!
//! ```no_run
//! use photobooth::{BoothConfig, BoothEvent, Photobooth, SyntheticCamera, CaptureDevice};
//!
//! # async fn demo() -> photobooth::PhotoboothResult<()> {
//! let camera = SyntheticCamera::new()
//!     .with_device(CaptureDevice::new("cam0", "Built-in Camera"), 1280, 720);
//! let mut booth = Photobooth::new(camera, BoothConfig::default())?;
//! booth.open_camera(None)?;
//! booth.start_countdown()?;
//! while let Some(event) = booth.next_event().await {
//!     if let BoothEvent::Captured { .. } = event {
//!         booth.download(None)?;
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod booth;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod countdown;
pub mod error;
pub mod export;
pub mod logging;
pub mod overlay;

pub use booth::{BoothEvent, BoothPhase, CaptureSummary, CapturedImage, Photobooth};
#[cfg(feature = "native-camera")]
pub use camera::NativeCamera;
pub use camera::{CameraBackend, CaptureDevice, MediaSource, PermissionStatus, SyntheticCamera};
pub use compositor::{fit_rect, CompositeOptions, Compositor, EncodedImage, FitRect, OutputSize};
pub use config::BoothConfig;
pub use countdown::{Countdown, CountdownEvent};
pub use error::{PhotoboothError, PhotoboothResult};
pub use logging::{init_logging, LogTarget};
pub use overlay::{FrameCatalog, OverlayStore};
