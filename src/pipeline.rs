//! Text file in, image files out.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::cloud::{WordCloud, WordCloudBuilder};
use crate::config::{CloudJob, StyleOptions, Workspace};
use crate::error::{Error, Result};
use crate::font::CloudFont;
use crate::frequency::WordFrequencies;
use crate::mask::MaskImage;
use crate::normalize::TextDocument;
use crate::overlay::blend_overlay;
use crate::stopwords::StopWords;

/// Paths written by [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub primary: PathBuf,
    pub blended: Option<PathBuf>,
}

/// Lays out already-normalized `text` inside `mask`.
pub fn render(
    text: &str,
    font: &CloudFont,
    mask: &MaskImage,
    style: &StyleOptions,
    stopwords: &StopWords,
) -> Result<WordCloud> {
    style.validate()?;
    let words = WordFrequencies::from_text(text, stopwords, style.tokenizer(), style.max_words);
    info!(distinct = words.len(), "counted words");
    if words.is_empty() {
        return Err(Error::Input(
            "need at least one word to plot a word cloud, got 0".into(),
        ));
    }

    let mut builder = WordCloudBuilder::new()
        .font(font.clone())
        .mask(mask.clone())
        .background(style.background()?)
        .palette(style.palette()?)
        .margin(style.margin)
        .font_size_range(style.min_font_size, style.max_font_size)
        .font_step(style.font_step)
        .prefer_horizontal(style.prefer_horizontal)
        .relative_scaling(style.relative_scaling)
        .scale(style.scale);
    if let Some(color) = style.contour()? {
        builder = builder.contour(style.contour_width, color);
    }
    if let Some(seed) = style.seed {
        builder = builder.seed(seed);
    }
    builder.build(&words)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

/// Generates the cloud for `job`, using the stop-word file from the
/// workspace when present.
pub fn generate(workspace: &Workspace, job: &CloudJob, style: &StyleOptions) -> Result<GeneratedFiles> {
    generate_with_stopwords(workspace, job, style, None)
}

/// Writes `<title>.<format>` and, with an overlay mode, `<title>_blended.png`.
///
/// Configuration errors surface before any file is read, except an unknown
/// overlay mode, which fails after the primary image is on disk.
#[instrument(skip_all, fields(text = %job.text.display()))]
pub fn generate_with_stopwords(
    workspace: &Workspace,
    job: &CloudJob,
    style: &StyleOptions,
    stopwords: Option<StopWords>,
) -> Result<GeneratedFiles> {
    let format = style.export_format()?;
    style.validate()?;

    let doc = TextDocument::load(&workspace.text_path(&job.text))?;
    info!(title = doc.title(), "processing text, this may take a while");

    let stopwords = StopWords::resolve(stopwords, &workspace.stopwords_path())?;
    let font = CloudFont::load(&workspace.font_path(&job.font))?;
    info!(family = font.family_name(), "using font");
    let mask = MaskImage::load(&workspace.mask_path(&job.mask))?;

    let cloud = render(doc.normalized(), &font, &mask, style, &stopwords)?;
    let bytes = cloud.export(format)?;

    let out_dir = workspace.output_dir();
    std::fs::create_dir_all(&out_dir).map_err(|e| Error::io(&out_dir, e))?;
    let primary = workspace.output_path(doc.title(), "", format.extension());
    write_file(&primary, &bytes)?;

    let Some(mode) = style.overlay_mode() else {
        return Ok(GeneratedFiles {
            primary,
            blended: None,
        });
    };
    let mode = mode?;
    let rendered = cloud.to_image()?;
    let blended = blend_overlay(&rendered, &mask, mode, &style.overlay())?;
    let blended_path = workspace.output_path(doc.title(), "_blended", "png");
    write_file(&blended_path, &crate::render::encode_png(&blended)?)?;

    Ok(GeneratedFiles {
        primary,
        blended: Some(blended_path),
    })
}
