use arabic_wordcloud::{
    normalize, CloudFont, Color, MaskImage, Palette, StopWords, TokenizerOptions,
    WordCloudBuilder, WordFrequencies,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::fs;
use std::path::Path;

const TEXT: &str = "قِفا نَبْكِ مِنْ ذِكْرَى حَبِيبٍ وَمَنْزِلِ بِسِقْطِ اللِّوَى بَيْنَ الدَّخُولِ فَحَوْمَلِ \
    فَتُوضِحَ فَالمِقْراةِ لَمْ يَعْفُ رَسْمُها لِما نَسَجَتْها مِنْ جَنُوبٍ وَشَمْأَلِ \
    حَبِيبٍ حَبِيبٍ مَنْزِلِ ذِكْرَى ذِكْرَى ذِكْرَى";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = "output_masked_arabic.png";
    let font_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/DejaVuSans.ttf".to_string());

    let font = CloudFont::load(Path::new(&font_path))?;
    println!("Using font {}", font.family_name());

    // Circle silhouette on white.
    let (w, h) = (600u32, 600u32);
    let circle = RgbaImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - w as f32 / 2.0;
        let dy = y as f32 - h as f32 / 2.0;
        if dx * dx + dy * dy < (w as f32 * 0.45).powi(2) {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });

    let words = WordFrequencies::from_text(
        &normalize(TEXT),
        &StopWords::empty(),
        TokenizerOptions::default(),
        200,
    );
    println!("Counted {} distinct words", words.len());

    let cloud = WordCloudBuilder::new()
        .font(font)
        .mask(MaskImage::from_image(DynamicImage::ImageRgba8(circle)))
        .palette(Palette::from_name("magma")?)
        .background(Color::parse("#050948")?)
        .contour(3.0, Color::WHITE)
        .seed(42)
        .build(&words)?;

    fs::write(output_path, cloud.to_png()?)?;
    println!("Done! Check {}", output_path);
    Ok(())
}
