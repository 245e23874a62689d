//! Pixel-level drawing onto the output surface.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

use super::fit::FitRect;

/// Scale `frame` into `rect` and copy it onto the surface.
///
/// Pixels are copied as-is (no blending); the live frame is the bottom
/// layer.
pub fn draw_frame(surface: &mut RgbaImage, frame: &RgbaImage, rect: FitRect, mirror: bool) {
    if rect.is_empty() || frame.width() == 0 || frame.height() == 0 {
        return;
    }

    let mut scaled = if frame.dimensions() == (rect.width, rect.height) {
        frame.clone()
    } else {
        image::imageops::resize(frame, rect.width, rect.height, FilterType::Triangle)
    };
    if mirror {
        image::imageops::flip_horizontal_in_place(&mut scaled);
    }

    image::imageops::replace(surface, &scaled, rect.x as i64, rect.y as i64);
}

/// Draw `overlay` over the whole surface with source-over alpha blending.
///
/// The overlay must already match the surface dimensions.
pub fn composite_overlay(surface: &mut RgbaImage, overlay: &RgbaImage) {
    debug_assert_eq!(surface.dimensions(), overlay.dimensions());
    for (dst, src) in surface.pixels_mut().zip(overlay.pixels()) {
        blend_pixel(dst, src);
    }
}

/// Source-over blend of `src` onto `dst` with straight (non-premultiplied)
/// alpha, in integer arithmetic.
fn blend_pixel(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    let src_a = src.0[3] as u32;
    if src_a == 255 {
        *dst = *src;
        return;
    }
    if src_a == 0 {
        return;
    }

    let dst_a = dst.0[3] as u32;
    // Destination contribution scaled to 0..=255*255
    let dst_weight = dst_a * (255 - src_a);
    let out_a_scaled = src_a * 255 + dst_weight;
    if out_a_scaled == 0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for c in 0..3 {
        let numerator = src.0[c] as u32 * src_a * 255 + dst.0[c] as u32 * dst_weight;
        dst.0[c] = ((numerator + out_a_scaled / 2) / out_a_scaled) as u8;
    }
    dst.0[3] = ((out_a_scaled + 127) / 255) as u8;
}
