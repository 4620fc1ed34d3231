use std::path::PathBuf;

use anyhow::Context as _;
use arabic_wordcloud::{CloudConfig, CloudJob, StopWords, StyleOptions, Workspace};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Generate a masked word cloud from an Arabic text file.
#[derive(Parser, Debug)]
#[command(name = "arabic-wordcloud", version)]
struct Cli {
    /// JSON configuration file ({ workspace, job, style }).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workspace root holding Fonts/, Masks/, Texts/ and Outputs/.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Text file, relative to Texts/ or absolute.
    #[arg(long)]
    text: Option<PathBuf>,

    /// Font file, relative to Fonts/ or absolute.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Mask image, relative to Masks/ or absolute.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Output directory, relative to the root or absolute.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Stop-word file (one word per line); overrides <root>/stopwords.txt.
    #[arg(long)]
    stopwords: Option<PathBuf>,

    #[arg(long)]
    background: Option<String>,

    #[arg(long)]
    contour_color: Option<String>,

    #[arg(long)]
    contour_width: Option<f32>,

    /// Colormap or scheme name (viridis, plasma, magma, ocean, ...).
    #[arg(long)]
    palette: Option<String>,

    #[arg(long)]
    max_words: Option<usize>,

    /// png, svg or pdf.
    #[arg(long)]
    format: Option<String>,

    /// Difference, Add, Subtract, Multiply or Screen.
    #[arg(long)]
    overlay: Option<String>,

    #[arg(long)]
    overlay_alpha: Option<f32>,

    #[arg(long)]
    blur_radius: Option<f32>,

    #[arg(long)]
    mask_opacity: Option<f32>,

    #[arg(long)]
    max_font_size: Option<f32>,

    #[arg(long)]
    scale: Option<f32>,

    /// Fixed seed for a reproducible layout.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(CloudConfig, Option<PathBuf>)> {
        let mut cfg = match &self.config {
            Some(path) => CloudConfig::from_path(path)?,
            None => {
                let (Some(text), Some(font), Some(mask)) =
                    (self.text.clone(), self.font.clone(), self.mask.clone())
                else {
                    anyhow::bail!("either --config or all of --text, --font and --mask are required");
                };
                CloudConfig {
                    workspace: Workspace::default(),
                    job: CloudJob::new(text, font, mask),
                    style: StyleOptions::default(),
                }
            }
        };

        let ws = &mut cfg.workspace;
        if let Some(root) = self.root {
            ws.root = root;
        }
        if let Some(dir) = self.out_dir {
            ws.outputs_dir = dir;
        }

        let job = &mut cfg.job;
        if let Some(text) = self.text {
            job.text = text;
        }
        if let Some(font) = self.font {
            job.font = font;
        }
        if let Some(mask) = self.mask {
            job.mask = mask;
        }

        let style = &mut cfg.style;
        if let Some(v) = self.background {
            style.background_color = v;
        }
        if let Some(v) = self.contour_color {
            style.contour_color = Some(v);
        }
        if let Some(v) = self.contour_width {
            style.contour_width = v;
        }
        if let Some(v) = self.palette {
            style.color_palette = v;
        }
        if let Some(v) = self.max_words {
            style.max_words = v;
        }
        if let Some(v) = self.format {
            style.export_format = v;
        }
        if let Some(v) = self.overlay {
            style.overlay_mode = Some(v);
        }
        if let Some(v) = self.overlay_alpha {
            style.overlay_alpha = v;
        }
        if let Some(v) = self.blur_radius {
            style.blur_radius = v;
        }
        if let Some(v) = self.mask_opacity {
            style.mask_opacity = v;
        }
        if let Some(v) = self.max_font_size {
            style.max_font_size = Some(v);
        }
        if let Some(v) = self.scale {
            style.scale = v;
        }
        if let Some(v) = self.seed {
            style.seed = Some(v);
        }
        Ok((cfg, self.stopwords))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (cfg, stopwords_path) = Cli::parse().into_config()?;
    let stopwords = stopwords_path
        .map(|p| {
            StopWords::load(&p).with_context(|| format!("load stop words '{}'", p.display()))
        })
        .transpose()?;

    let files = arabic_wordcloud::generate_with_stopwords(
        &cfg.workspace,
        &cfg.job,
        &cfg.style,
        stopwords,
    )
    .with_context(|| format!("generate word cloud for '{}'", cfg.job.text.display()))?;

    eprintln!("wrote {}", files.primary.display());
    if let Some(blended) = files.blended {
        eprintln!("wrote {}", blended.display());
    }
    Ok(())
}
