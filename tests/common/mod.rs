#![allow(dead_code)]

use std::path::{Path, PathBuf};

use arabic_wordcloud::{CloudJob, Workspace};
use image::{Rgba, RgbaImage};

pub const FONT_NAME: &str = "DejaVuSans.ttf";
pub const MASK_NAME: &str = "rect.png";

pub fn fixture_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(FONT_NAME)
}

/// White canvas with a black rectangle inset by `inset` pixels.
pub fn rect_mask(width: u32, height: u32, inset: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= inset && x < width - inset && y >= inset && y < height - inset;
        if inside {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

/// Lays out Texts/, Fonts/ and Masks/ under `root` and returns the job for
/// `text_name`.
pub fn workspace(root: &Path, text_name: &str, text: &str) -> (Workspace, CloudJob) {
    let ws = Workspace::new(root);
    for dir in ["Texts", "Fonts", "Masks"] {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }
    std::fs::write(root.join("Texts").join(text_name), text).unwrap();
    std::fs::copy(fixture_font(), root.join("Fonts").join(FONT_NAME)).unwrap();
    rect_mask(240, 140, 10)
        .save(root.join("Masks").join(MASK_NAME))
        .unwrap();
    (ws, CloudJob::new(text_name, FONT_NAME, MASK_NAME))
}

/// Twenty ASCII words: "rust" ten times plus ten singletons.
pub fn twenty_words() -> String {
    let mut words = vec!["rust"; 10];
    words.extend([
        "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    ]);
    words.join(" ")
}

pub fn count_non_background(img: &RgbaImage, background: [u8; 4]) -> usize {
    img.pixels().filter(|p| p.0 != background).count()
}
