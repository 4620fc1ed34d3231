//! Configuration values passed into [`crate::pipeline::generate`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{Color, Palette};
use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::frequency::TokenizerOptions;
use crate::overlay::{BlendMode, OverlayOptions};

/// Directory conventions. Relative names in a [`CloudJob`] resolve against
/// `root/<kind>_dir`; absolute paths are used as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub root: PathBuf,
    pub fonts_dir: PathBuf,
    pub masks_dir: PathBuf,
    pub texts_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub stopwords_file: PathBuf,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            fonts_dir: PathBuf::from("Fonts"),
            masks_dir: PathBuf::from("Masks"),
            texts_dir: PathBuf::from("Texts"),
            outputs_dir: PathBuf::from("Outputs"),
            stopwords_file: PathBuf::from("stopwords.txt"),
        }
    }
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    fn dir(&self, dir: &Path) -> PathBuf {
        self.root.join(dir)
    }

    pub fn text_path(&self, name: &Path) -> PathBuf {
        self.dir(&self.texts_dir).join(name)
    }

    pub fn font_path(&self, name: &Path) -> PathBuf {
        self.dir(&self.fonts_dir).join(name)
    }

    pub fn mask_path(&self, name: &Path) -> PathBuf {
        self.dir(&self.masks_dir).join(name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir(&self.outputs_dir)
    }

    pub fn stopwords_path(&self) -> PathBuf {
        self.root.join(&self.stopwords_file)
    }

    /// `<output_dir>/<title><suffix>.<extension>`
    pub fn output_path(&self, title: &str, suffix: &str, extension: &str) -> PathBuf {
        self.output_dir()
            .join(format!("{title}{suffix}.{extension}"))
    }
}

/// The three inputs of one word cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudJob {
    pub text: PathBuf,
    pub font: PathBuf,
    pub mask: PathBuf,
}

impl CloudJob {
    pub fn new(
        text: impl Into<PathBuf>,
        font: impl Into<PathBuf>,
        mask: impl Into<PathBuf>,
    ) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            mask: mask.into(),
        }
    }
}

/// Styling and layout knobs. String-valued fields are parsed when used, so a
/// bad `overlay_mode` only fails at the overlay step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    pub background_color: String,
    pub contour_color: Option<String>,
    pub contour_width: f32,
    pub color_palette: String,
    pub max_words: usize,
    pub export_format: String,
    pub overlay_mode: Option<String>,
    /// Strength of the blended image over the plain render.
    pub overlay_alpha: f32,
    pub blur_radius: f32,
    pub mask_opacity: f32,
    pub margin: u32,
    pub min_font_size: f32,
    pub max_font_size: Option<f32>,
    pub font_step: f32,
    pub prefer_horizontal: f32,
    pub relative_scaling: f32,
    pub scale: f32,
    pub seed: Option<u64>,
    pub include_numbers: bool,
    pub normalize_plurals: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            background_color: "black".into(),
            contour_color: None,
            contour_width: 3.0,
            color_palette: "viridis".into(),
            max_words: 1000,
            export_format: "png".into(),
            overlay_mode: None,
            overlay_alpha: 0.6,
            blur_radius: 1.0,
            mask_opacity: 0.2,
            margin: 2,
            min_font_size: 4.0,
            max_font_size: None,
            font_step: 1.0,
            prefer_horizontal: 0.9,
            relative_scaling: 0.5,
            scale: 1.0,
            seed: None,
            include_numbers: false,
            normalize_plurals: true,
        }
    }
}

fn unit_range(name: &str, v: f32) -> Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be within 0..=1, got {v}")))
    }
}

impl StyleOptions {
    pub fn export_format(&self) -> Result<ExportFormat> {
        self.export_format.parse()
    }

    /// `None` when no overlay is requested.
    pub fn overlay_mode(&self) -> Option<Result<BlendMode>> {
        self.overlay_mode.as_deref().map(str::parse)
    }

    pub fn background(&self) -> Result<Color> {
        Color::parse(&self.background_color)
    }

    pub fn contour(&self) -> Result<Option<Color>> {
        self.contour_color.as_deref().map(Color::parse).transpose()
    }

    pub fn palette(&self) -> Result<Palette> {
        Palette::from_name(&self.color_palette)
    }

    pub fn tokenizer(&self) -> TokenizerOptions {
        TokenizerOptions {
            include_numbers: self.include_numbers,
            normalize_plurals: self.normalize_plurals,
        }
    }

    pub fn overlay(&self) -> OverlayOptions {
        OverlayOptions {
            mask_opacity: self.mask_opacity,
            blur_radius: self.blur_radius,
            overlay_alpha: self.overlay_alpha,
        }
    }

    /// Checks everything except `overlay_mode`.
    pub fn validate(&self) -> Result<()> {
        self.export_format()?;
        self.background()?;
        self.contour()?;
        self.palette()?;
        if self.max_words == 0 {
            return Err(Error::config("max_words must be at least 1"));
        }
        unit_range("overlay_alpha", self.overlay_alpha)?;
        unit_range("mask_opacity", self.mask_opacity)?;
        unit_range("prefer_horizontal", self.prefer_horizontal)?;
        unit_range("relative_scaling", self.relative_scaling)?;
        if !(self.blur_radius.is_finite() && self.blur_radius >= 0.0) {
            return Err(Error::config(format!(
                "blur_radius must be a non-negative number, got {}",
                self.blur_radius
            )));
        }
        if !(self.contour_width.is_finite() && self.contour_width >= 0.0) {
            return Err(Error::config("contour_width must be non-negative"));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::config("scale must be positive"));
        }
        if !(self.min_font_size >= 1.0 && self.font_step >= 1.0) {
            return Err(Error::config("min_font_size and font_step must be at least 1"));
        }
        if let Some(max) = self.max_font_size {
            if max < self.min_font_size {
                return Err(Error::config("max_font_size is below min_font_size"));
            }
        }
        Ok(())
    }
}

/// A JSON configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub workspace: Workspace,
    pub job: CloudJob,
    #[serde(default)]
    pub style: StyleOptions,
}

impl CloudConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::config(format!("invalid configuration: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }
}
