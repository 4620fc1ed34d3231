//! Blending the rendered cloud with a softened copy of its mask.

use std::str::FromStr;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mask::MaskImage;

/// Channel-wise compositing operators, all clamped to `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    Difference,
    Add,
    Subtract,
    Multiply,
    Screen,
}

impl BlendMode {
    pub fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            BlendMode::Difference => a.abs_diff(b),
            BlendMode::Add => a.saturating_add(b),
            BlendMode::Subtract => a.saturating_sub(b),
            BlendMode::Multiply => mul_div255(u16::from(a), u16::from(b)),
            BlendMode::Screen => 255 - mul_div255(255 - u16::from(a), 255 - u16::from(b)),
        }
    }

    pub fn apply_rgb(self, a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
        [
            self.apply(a[0], b[0]),
            self.apply(a[1], b[1]),
            self.apply(a[2], b[2]),
        ]
    }
}

impl FromStr for BlendMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "difference" => Ok(BlendMode::Difference),
            "add" | "additive" => Ok(BlendMode::Add),
            "subtract" | "subtractive" => Ok(BlendMode::Subtract),
            "multiply" => Ok(BlendMode::Multiply),
            "screen" => Ok(BlendMode::Screen),
            _ => Err(Error::config(format!(
                "unsupported overlay mode '{s}' (expected Difference, Add, Subtract, Multiply or Screen)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayOptions {
    /// Opacity applied to the mask copy before blurring.
    pub mask_opacity: f32,
    /// Gaussian sigma in pixels; 0 disables the blur.
    pub blur_radius: f32,
    /// Strength of the blended result over the plain render.
    pub overlay_alpha: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            mask_opacity: 0.2,
            blur_radius: 1.0,
            overlay_alpha: 0.6,
        }
    }
}

/// The mask at `width`x`height` with alpha scaled by `opacity` and blurred.
pub fn softened_mask(
    mask: &MaskImage,
    width: u32,
    height: u32,
    opacity: f32,
    blur_radius: f32,
) -> RgbaImage {
    let mut soft = image::imageops::resize(mask.pixels(), width, height, FilterType::Triangle);
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    for p in soft.pixels_mut() {
        p.0[3] = mul_div255(u16::from(p.0[3]), op);
    }
    if blur_radius > 0.0 {
        soft = image::imageops::blur(&soft, blur_radius);
    }
    soft
}

/// Blends `rendered` with the softened mask under `mode`.
pub fn blend_overlay(
    rendered: &RgbaImage,
    mask: &MaskImage,
    mode: BlendMode,
    opts: &OverlayOptions,
) -> Result<RgbaImage> {
    let (width, height) = rendered.dimensions();
    let soft = softened_mask(mask, width, height, opts.mask_opacity, opts.blur_radius);
    if soft.dimensions() != rendered.dimensions() {
        return Err(Error::Render(
            "overlay expects the mask resized to the render".into(),
        ));
    }
    debug!(?mode, width, height, "blending overlay");

    let t = (opts.overlay_alpha.clamp(0.0, 1.0) * 255.0).round() as u16;
    let mut out = RgbaImage::new(width, height);
    for ((dst, r), m) in out.pixels_mut().zip(rendered.pixels()).zip(soft.pixels()) {
        let [rr, rg, rb, ra] = r.0;
        let [mr, mg, mb, ma] = m.0;
        // Mask composited over black by its own alpha.
        let m_rgb = [
            mul_div255(u16::from(mr), u16::from(ma)),
            mul_div255(u16::from(mg), u16::from(ma)),
            mul_div255(u16::from(mb), u16::from(ma)),
        ];
        let blended = mode.apply_rgb([rr, rg, rb], m_rgb);
        *dst = Rgba([
            lerp_u8(rr, blended[0], t),
            lerp_u8(rg, blended[1], t),
            lerp_u8(rb, blended[2], t),
            ra,
        ]);
    }
    Ok(out)
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn lerp_u8(a: u8, b: u8, t: u16) -> u8 {
    let it = 255 - t;
    ((u32::from(a) * u32::from(it) + u32::from(b) * u32::from(t) + 127) / 255) as u8
}
