//! Silhouette masks.
//!
//! Near-white or transparent pixels are background: nothing may be drawn
//! there. Everything else is the silhouette the words fill.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use tiny_skia::{Pixmap, Transform};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct MaskImage {
    pixels: RgbaImage,
}

/// 1. alpha < 128 (transparent) is background.
/// 2. r + g + b >= 750 (near white) is background.
pub fn is_background(p: &Rgba<u8>) -> bool {
    let [r, g, b, a] = p.0;
    let sum = r as u16 + g as u16 + b as u16;
    a < 128 || sum >= 750
}

impl MaskImage {
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            pixels: image.to_rgba8(),
        }
    }

    /// A fully drawable mask: every pixel is silhouette.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    /// Decodes raster formats the `image` crate recognizes, otherwise SVG.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if image::guess_format(bytes).is_ok() {
            let img = image::load_from_memory(bytes)?;
            return Ok(Self::from_image(img));
        }
        Self::from_svg(bytes)
    }

    fn from_svg(bytes: &[u8]) -> Result<Self> {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_data(bytes, &opt)
            .map_err(|e| Error::Svg(format!("mask is neither a raster image nor SVG: {e}")))?;
        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or(Error::Render("Failed to create mask buffer".into()))?;

        // Opaque white underlay so transparent SVG regions read as background.
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        let pixels = RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
            .ok_or_else(|| Error::Image("SVG mask buffer has unexpected size".into()))?;
        Ok(Self { pixels })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let mask = Self::from_bytes(&bytes)?;
        debug!(
            path = %path.display(),
            width = mask.width(),
            height = mask.height(),
            "loaded mask"
        );
        Ok(mask)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_blocked(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_none_or(is_background)
    }

    /// Nearest-neighbour resize, keeping the silhouette hard-edged.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if (width, height) == (self.width(), self.height()) {
            return self.clone();
        }
        Self {
            pixels: image::imageops::resize(&self.pixels, width, height, FilterType::Nearest),
        }
    }

    /// Background as 255, silhouette as 0, at the given size.
    pub fn silhouette(&self, width: u32, height: u32) -> GrayImage {
        let mask = self.resized(width, height);
        GrayImage::from_fn(width, height, |x, y| {
            Luma([if mask.is_blocked(x, y) { 255 } else { 0 }])
        })
    }

    /// Number of silhouette pixels.
    pub fn drawable_area(&self) -> usize {
        self.pixels.pixels().filter(|p| !is_background(p)).count()
    }
}
