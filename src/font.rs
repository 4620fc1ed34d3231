//! Font loading, shaping and glyph outlines.
//!
//! Words are shaped with rustybuzz so Arabic letters take their contextual
//! forms and runs come out in visual (left-to-right) order. The shaped run is
//! then used twice: fontdue rasterizes it into collision sprites, and the
//! glyph outlines become the paths that are actually drawn.

use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings, LineMetrics};
use rustybuzz::ttf_parser::{GlyphId, OutlineBuilder};
use rustybuzz::{Face, UnicodeBuffer};
use tiny_skia::{Path as SkPath, PathBuilder};
use tracing::debug;

use crate::error::{Error, Result};

/// One shaped glyph, positions in font units relative to the run origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    pub id: u16,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRun {
    pub glyphs: Vec<ShapedGlyph>,
    /// Total advance in font units.
    pub advance: f32,
}

/// A parsed font file, cheap to clone.
#[derive(Clone)]
pub struct CloudFont {
    data: Arc<Vec<u8>>,
    raster: Arc<Font>,
    units_per_em: f32,
    family_name: String,
}

impl std::fmt::Debug for CloudFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudFont")
            .field("family_name", &self.family_name)
            .field("units_per_em", &self.units_per_em)
            .finish_non_exhaustive()
    }
}

fn extract_font_family_name(font_data: &[u8]) -> Option<String> {
    let mut db = usvg::fontdb::Database::new();
    db.load_font_source(usvg::fontdb::Source::Binary(Arc::new(font_data.to_vec())));
    let name = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
    name
}

impl CloudFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let units_per_em = Face::from_slice(&data, 0)
            .ok_or_else(|| Error::Font("unsupported or corrupt font data".into()))?
            .units_per_em() as f32;
        let raster = Font::from_bytes(data.as_slice(), FontSettings::default())
            .map_err(|e| Error::Font(e.to_string()))?;
        let family_name =
            extract_font_family_name(&data).unwrap_or_else(|| "Unknown".to_string());
        debug!(family = %family_name, units_per_em, "loaded font");
        Ok(Self {
            data: Arc::new(data),
            raster: Arc::new(raster),
            units_per_em,
            family_name,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_bytes(data)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub(crate) fn raster(&self) -> &Font {
        &self.raster
    }

    fn face(&self) -> Result<Face<'_>> {
        Face::from_slice(&self.data, 0).ok_or_else(|| Error::Font("font face vanished".into()))
    }

    /// Pixels per font unit at `size`.
    pub fn scale(&self, size: f32) -> f32 {
        size / self.units_per_em
    }

    pub fn line_metrics(&self, size: f32) -> LineMetrics {
        self.raster
            .horizontal_line_metrics(size)
            .unwrap_or(LineMetrics {
                ascent: size * 0.8,
                descent: size * -0.2,
                line_gap: 0.0,
                new_line_size: size,
            })
    }

    /// Shapes `text` with direction and script guessed from its contents.
    pub fn shape(&self, text: &str) -> Result<ShapedRun> {
        let face = self.face()?;
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let shaped = rustybuzz::shape(&face, &[], buffer);

        let mut glyphs = Vec::with_capacity(shaped.len());
        let mut pen_x = 0.0f32;
        let mut pen_y = 0.0f32;
        for (info, pos) in shaped.glyph_infos().iter().zip(shaped.glyph_positions()) {
            glyphs.push(ShapedGlyph {
                id: info.glyph_id as u16,
                x: pen_x + pos.x_offset as f32,
                y: pen_y + pos.y_offset as f32,
            });
            pen_x += pos.x_advance as f32;
            pen_y += pos.y_advance as f32;
        }
        Ok(ShapedRun {
            glyphs,
            advance: pen_x,
        })
    }

    /// Outline of a shaped run at `size` px with the baseline origin at
    /// (0, 0), y pointing down. `None` when the run has no ink.
    pub fn outline(&self, run: &ShapedRun, size: f32) -> Result<Option<SkPath>> {
        let face = self.face()?;
        let scale = self.scale(size);
        let mut sink = SkiaOutline {
            builder: PathBuilder::new(),
            scale,
            dx: 0.0,
            dy: 0.0,
        };
        for glyph in &run.glyphs {
            sink.dx = glyph.x * scale;
            sink.dy = -glyph.y * scale;
            face.outline_glyph(GlyphId(glyph.id), &mut sink);
        }
        Ok(sink.builder.finish())
    }
}

struct SkiaOutline {
    builder: PathBuilder,
    scale: f32,
    dx: f32,
    dy: f32,
}

impl SkiaOutline {
    fn pt(&self, x: f32, y: f32) -> (f32, f32) {
        (self.dx + x * self.scale, self.dy - y * self.scale)
    }
}

impl OutlineBuilder for SkiaOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x, y) = self.pt(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x2, y2) = self.pt(x2, y2);
        let (x, y) = self.pt(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> CloudFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        CloudFont::load(&path).unwrap()
    }

    #[test]
    fn rejects_non_font_bytes() {
        let err = CloudFont::from_bytes(b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn reads_family_name() {
        assert_eq!(fixture().family_name(), "DejaVu Sans");
    }

    #[test]
    fn latin_run_advances_left_to_right() {
        let run = fixture().shape("abc").unwrap();
        assert_eq!(run.glyphs.len(), 3);
        assert!(run.glyphs[0].x < run.glyphs[1].x);
        assert!(run.glyphs[1].x < run.glyphs[2].x);
        assert!(run.advance > 0.0);
    }

    #[test]
    fn arabic_letters_take_contextual_forms() {
        let font = fixture();
        // The same letter isolated and joined shapes to different glyphs.
        let isolated = font.shape("ب").unwrap();
        let joined = font.shape("ببب").unwrap();
        assert_eq!(isolated.glyphs.len(), 1);
        assert_eq!(joined.glyphs.len(), 3);
        assert!(joined.glyphs.iter().all(|g| g.id != isolated.glyphs[0].id));
    }

    #[test]
    fn outline_sits_on_baseline() {
        let font = fixture();
        let run = font.shape("H").unwrap();
        let path = font.outline(&run, 100.0).unwrap().unwrap();
        let b = path.bounds();
        assert!(b.bottom() <= 1.0);
        assert!(b.top() < -50.0);
    }

    #[test]
    fn whitespace_has_no_outline() {
        let font = fixture();
        let run = font.shape(" ").unwrap();
        assert!(font.outline(&run, 40.0).unwrap().is_none());
    }
}
