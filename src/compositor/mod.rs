//! Photo compositing.
//!
//! Renders a live frame and the selected overlay into a fixed-size surface
//! and encodes the result as PNG:
//!
//! 1. Clear a `width`×`height` RGBA surface to transparent.
//! 2. Fit the frame without distortion (letterbox or pillarbox).
//! 3. Draw the frame.
//! 4. Wait for the overlay to decode, draw it full-surface on top.
//! 5. Encode losslessly.

mod blend;
mod fit;

pub use fit::{fit_rect, FitRect};

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ts_rs::TS;

use crate::camera::VideoFrame;
use crate::error::{PhotoboothError, PhotoboothResult};
use crate::overlay::OverlayStore;

/// Largest accepted output edge.
pub const MAX_OUTPUT_DIMENSION: u32 = 8192;

/// Output surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum OutputSize {
    /// 640×480
    Vga,
    /// 1920×1080
    #[default]
    FullHd,
    Custom { width: u32, height: u32 },
}

impl OutputSize {
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            OutputSize::Vga => (640, 480),
            OutputSize::FullHd => (1920, 1080),
            OutputSize::Custom { width, height } => (width, height),
        }
    }

    /// Clamp custom sizes into `1..=MAX_OUTPUT_DIMENSION`.
    pub fn clamped(self) -> Self {
        match self {
            OutputSize::Custom { width, height } => OutputSize::Custom {
                width: width.clamp(1, MAX_OUTPUT_DIMENSION),
                height: height.clamp(1, MAX_OUTPUT_DIMENSION),
            },
            preset => preset,
        }
    }
}

/// Per-capture rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeOptions {
    pub output: OutputSize,
    /// Flip the live frame horizontally (selfie view).
    pub mirror: bool,
}

/// A lossless encoded still.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
}

impl EncodedImage {
    pub const MIME_TYPE: &'static str = "image/png";

    /// Hex SHA-256 of the PNG bytes.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.png))
    }

    /// Decode back to pixels.
    pub fn decode(&self) -> PhotoboothResult<RgbaImage> {
        Ok(image::load_from_memory(&self.png)?.to_rgba8())
    }
}

/// Renders frames and overlays into encoded stills.
pub struct Compositor {
    overlays: OverlayStore,
}

impl Compositor {
    pub fn new(overlays: OverlayStore) -> Self {
        Self { overlays }
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayStore {
        &mut self.overlays
    }

    /// Composite `frame` with overlay `overlay_id` and encode as PNG.
    ///
    /// Fails with `AssetLoad` if the overlay cannot be decoded; a frame-only
    /// image is never produced.
    pub async fn compose(
        &mut self,
        frame: &VideoFrame,
        overlay_id: &str,
        options: CompositeOptions,
    ) -> PhotoboothResult<EncodedImage> {
        let (width, height) = options.output.clamped().dimensions();
        if frame.width() == 0 || frame.height() == 0 {
            return Err(PhotoboothError::NoFrame);
        }

        let mut surface = RgbaImage::new(width, height);
        let rect = fit_rect(frame.width(), frame.height(), width, height);
        blend::draw_frame(&mut surface, &frame.image, rect, options.mirror);

        let overlay = match self.overlays.load_scaled(overlay_id, width, height).await {
            Ok(overlay) => overlay,
            Err(e) => {
                log::error!("[COMPOSITOR] Overlay '{}' unavailable: {}", overlay_id, e);
                return Err(e);
            },
        };
        blend::composite_overlay(&mut surface, &overlay);

        let png = encode_png(&surface)?;
        log::info!(
            "[COMPOSITOR] Composed frame {} ({}x{}) at {:?} with '{}' -> {} bytes",
            frame.sequence,
            frame.width(),
            frame.height(),
            rect,
            overlay_id,
            png.len()
        );

        Ok(EncodedImage { width, height, png })
    }
}

/// Encode an RGBA surface as PNG.
pub fn encode_png(surface: &RgbaImage) -> PhotoboothResult<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| PhotoboothError::EncodingError(e.to_string()))?;
    Ok(png)
}
