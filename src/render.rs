//! Raster output.

use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, Pixmap, Transform};

use crate::cloud::{Contour, WordCloud};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::layout::PlacedWord;
use crate::mask::MaskImage;

/// Maps a word's baseline-origin outline into output pixels.
pub(crate) fn word_transform(word: &PlacedWord, scale: f32) -> Transform {
    Transform::from_scale(scale, scale)
        .pre_concat(Transform::from_translate(word.x, word.y))
        .pre_concat(Transform::from_rotate(word.rotation))
}

/// Every word's outline in output coordinates, in drawing order.
pub(crate) fn word_paths(cloud: &WordCloud) -> Result<Vec<(Path, Color)>> {
    let mut paths = Vec::with_capacity(cloud.words.len());
    for word in &cloud.words {
        let Some(outline) = cloud.font.outline(&word.run, word.font_size)? else {
            continue;
        };
        let path = outline
            .transform(word_transform(word, cloud.scale))
            .ok_or_else(|| Error::Render(format!("cannot transform outline of '{}'", word.text)))?;
        paths.push((path, word.color));
    }
    Ok(paths)
}

impl WordCloud {
    /// Rasterizes the cloud, contour included, at output size.
    pub fn to_image(&self) -> Result<RgbaImage> {
        let (width, height) = self.output_size();
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::Render("Failed to create pixel buffer".into()))?;
        pixmap.fill(self.background.to_skia());

        for (path, color) in word_paths(self)? {
            let mut paint = Paint::default();
            paint.set_color(color.to_skia());
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        let mut img = pixmap_to_image(&pixmap)?;
        if let (Some(contour), Some(mask)) = (self.contour, self.mask.as_ref()) {
            draw_contour(&mut img, mask, contour);
        }
        Ok(img)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.to_image()?)
    }
}

pub(crate) fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn pixmap_to_image(pixmap: &Pixmap) -> Result<RgbaImage> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| Error::Render("pixel buffer has unexpected size".into()))
}

/// Edge pixels of the mask background: background cells touching the
/// silhouette. The one-pixel image border never counts.
pub(crate) fn mask_edges(silhouette: &GrayImage) -> GrayImage {
    let (w, h) = silhouette.dimensions();
    let mut edges = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return edges;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if silhouette.get_pixel(x, y).0[0] != 255 {
                continue;
            }
            let touches = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                .any(|(nx, ny)| silhouette.get_pixel(nx, ny).0[0] == 0);
            if touches {
                edges.put_pixel(x, y, Luma([255]));
            }
        }
    }
    edges
}

/// Paints the mask boundary, softened by a Gaussian of sigma `width / 10`.
pub fn draw_contour(img: &mut RgbaImage, mask: &MaskImage, contour: Contour) {
    let (w, h) = img.dimensions();
    let edges = mask_edges(&mask.silhouette(w, h));
    let sigma = contour.width / 10.0;
    let soft = if sigma > 0.0 {
        image::imageops::blur(&edges, sigma)
    } else {
        edges
    };

    let a = contour.color.a as u16;
    for (x, y, p) in soft.enumerate_pixels() {
        if p.0[0] == 0 {
            continue;
        }
        let dst = img.get_pixel_mut(x, y);
        let src = contour.color.to_rgba();
        let mix = |s: u8, d: u8| ((s as u16 * a + d as u16 * (255 - a) + 127) / 255) as u8;
        *dst = Rgba([
            mix(src[0], dst.0[0]),
            mix(src[1], dst.0[1]),
            mix(src[2], dst.0[2]),
            dst.0[3].max(src[3]),
        ]);
    }
}
