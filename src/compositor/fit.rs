//! Aspect-preserving placement of the live frame on the output surface.

use serde::Serialize;

/// Placement of the scaled frame on the surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FitRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FitRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Fit a `src_w`×`src_h` frame into `dst_w`×`dst_h` without distortion.
///
/// A frame relatively wider than the surface spans the full width and is
/// centered vertically (letterbox); otherwise it spans the full height and
/// is centered horizontally (pillarbox). Any zero dimension yields an empty
/// rect.
pub fn fit_rect(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> FitRect {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return FitRect {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let (sw, sh, dw, dh) = (src_w as u64, src_h as u64, dst_w as u64, dst_h as u64);

    // sw/sh > dw/dh, compared exactly
    if sw * dh > dw * sh {
        let height = round_div(dw * sh, sw).clamp(1, dh) as u32;
        FitRect {
            x: 0,
            y: (dst_h - height) / 2,
            width: dst_w,
            height,
        }
    } else {
        let width = round_div(dh * sw, sh).clamp(1, dw) as u32;
        FitRect {
            x: (dst_w - width) / 2,
            y: 0,
            width,
            height: dst_h,
        }
    }
}

fn round_div(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator / 2) / denominator
}
