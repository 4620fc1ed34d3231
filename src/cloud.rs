use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::color::{Color, Palette};
use crate::error::{Error, Result};
use crate::font::CloudFont;
use crate::frequency::WordFrequencies;
use crate::layout::{Layout, LayoutOptions, PlacedWord};
use crate::mask::MaskImage;

/// Outline traced along the mask boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contour {
    pub width: f32,
    pub color: Color,
}

// =============================================================================
// Builder
// =============================================================================

pub struct WordCloudBuilder {
    layout: LayoutOptions,
    size_set: bool,
    background: Color,
    palette: Palette,
    font: Option<CloudFont>,
    mask: Option<MaskImage>,
    contour: Option<Contour>,
    scale: f32,
    seed: Option<u64>,
}

impl Default for WordCloudBuilder {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            size_set: false,
            background: Color::BLACK,
            palette: Palette::default(),
            font: None,
            mask: None,
            contour: None,
            scale: 1.0,
            seed: None,
        }
    }
}

impl WordCloudBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas size. Without this, a mask's own size is used.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.layout.width = width.max(1);
        self.layout.height = height.max(1);
        self.size_set = true;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn font(mut self, font: CloudFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn mask(mut self, mask: MaskImage) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn contour(mut self, width: f32, color: Color) -> Self {
        self.contour = (width > 0.0).then_some(Contour { width, color });
        self
    }

    pub fn margin(mut self, margin: u32) -> Self {
        self.layout.margin = margin;
        self
    }

    pub fn font_size_range(mut self, min: f32, max: Option<f32>) -> Self {
        self.layout.min_font_size = min.max(1.0);
        self.layout.max_font_size = max.map(|m| m.max(self.layout.min_font_size));
        self
    }

    pub fn font_step(mut self, step: f32) -> Self {
        self.layout.font_step = step.max(1.0);
        self
    }

    pub fn prefer_horizontal(mut self, p: f32) -> Self {
        self.layout.prefer_horizontal = p.clamp(0.0, 1.0);
        self
    }

    pub fn relative_scaling(mut self, rs: f32) -> Self {
        self.layout.relative_scaling = rs.clamp(0.0, 1.0);
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(mut self, words: &WordFrequencies) -> Result<WordCloud> {
        let font = self
            .font
            .take()
            .ok_or_else(|| Error::Input("a font is required to shape the words".into()))?;

        if let (Some(mask), false) = (&self.mask, self.size_set) {
            self.layout.width = mask.width();
            self.layout.height = mask.height();
        }
        let mask = self
            .mask
            .take()
            .map(|m| m.resized(self.layout.width, self.layout.height));

        let mut rng = match self.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };

        let layout = Layout {
            font: &font,
            options: &self.layout,
            palette: &self.palette,
        };
        let placed = layout.run(words, mask.as_ref(), &mut rng)?;

        Ok(WordCloud {
            width: self.layout.width,
            height: self.layout.height,
            scale: self.scale,
            background: self.background,
            words: placed,
            contour: self.contour,
            mask,
            font,
        })
    }
}

// =============================================================================
// Output
// =============================================================================

/// A finished layout. Rendering lives in [`crate::render`] and
/// [`crate::export`].
#[derive(Debug, Clone)]
pub struct WordCloud {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub background: Color,
    pub words: Vec<PlacedWord>,
    pub contour: Option<Contour>,
    pub(crate) mask: Option<MaskImage>,
    pub(crate) font: CloudFont,
}

impl WordCloud {
    /// Output size in pixels after scaling.
    pub fn output_size(&self) -> (u32, u32) {
        (
            ((self.width as f32 * self.scale).round() as u32).max(1),
            ((self.height as f32 * self.scale).round() as u32).max(1),
        )
    }

    pub fn mask(&self) -> Option<&MaskImage> {
        self.mask.as_ref()
    }

    pub fn font(&self) -> &CloudFont {
        &self.font
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn font() -> CloudFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        CloudFont::load(&path).unwrap()
    }

    fn words() -> WordFrequencies {
        WordFrequencies::from_counts(vec![("cloud".into(), 4), ("word".into(), 2)], 10)
    }

    #[test]
    fn build_without_font_is_input_error() {
        let err = WordCloudBuilder::new().build(&words()).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn mask_defines_canvas_size() {
        let cloud = WordCloudBuilder::new()
            .font(font())
            .mask(MaskImage::solid(240, 130))
            .seed(1)
            .build(&words())
            .unwrap();
        assert_eq!((cloud.width, cloud.height), (240, 130));
        assert_eq!(cloud.mask().unwrap().width(), 240);
    }

    #[test]
    fn explicit_size_resizes_mask() {
        let cloud = WordCloudBuilder::new()
            .font(font())
            .mask(MaskImage::solid(100, 100))
            .size(300, 150)
            .seed(1)
            .build(&words())
            .unwrap();
        assert_eq!((cloud.width, cloud.height), (300, 150));
        assert_eq!(cloud.mask().unwrap().height(), 150);
    }

    #[test]
    fn zero_contour_width_disables_contour() {
        let cloud = WordCloudBuilder::new()
            .font(font())
            .contour(0.0, Color::WHITE)
            .seed(1)
            .build(&words())
            .unwrap();
        assert!(cloud.contour.is_none());
    }

    #[test]
    fn scale_multiplies_output_size() {
        let cloud = WordCloudBuilder::new()
            .font(font())
            .size(200, 100)
            .scale(1.5)
            .seed(1)
            .build(&words())
            .unwrap();
        assert_eq!(cloud.output_size(), (300, 150));
    }
}
