/*!
 * Arabic WordCloud
 *
 * Masked word clouds for Arabic text in pure Rust: diacritic normalization,
 * OpenType shaping, spiral layout inside a silhouette, PNG/SVG/PDF export
 * and blend-mode overlays.
 *
 * ```no_run
 * use arabic_wordcloud::{generate, CloudJob, StyleOptions, Workspace};
 *
 * let workspace = Workspace::new("/home/me/Arabic_word_cloud");
 * let job = CloudJob::new("Al-Atlal.txt", "KacstPen.ttf", "Oum_Kalthoum.png");
 * let style = StyleOptions {
 *     contour_color: Some("white".into()),
 *     ..StyleOptions::default()
 * };
 * let files = generate(&workspace, &job, &style)?;
 * println!("{}", files.primary.display());
 * # Ok::<(), arabic_wordcloud::Error>(())
 * ```
 */

pub mod cloud;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod font;
pub mod frequency;
pub mod layout;
pub mod mask;
pub mod normalize;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod stopwords;

pub use cloud::{Contour, WordCloud, WordCloudBuilder};
pub use color::{Color, ColorScheme, Palette};
pub use config::{CloudConfig, CloudJob, StyleOptions, Workspace};
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use font::CloudFont;
pub use frequency::{TokenizerOptions, WordFrequencies, WordFrequency};
pub use layout::PlacedWord;
pub use mask::MaskImage;
pub use normalize::{normalize, TextDocument};
pub use overlay::{blend_overlay, BlendMode, OverlayOptions};
pub use pipeline::{generate, generate_with_stopwords, render, GeneratedFiles};
pub use stopwords::StopWords;
