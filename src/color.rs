//! Colors and word palettes.

use std::str::FromStr;

use rand::Rng;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Accepts CSS color syntax: names, `#rgb`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb(..)` and `rgba(..)`.
    pub fn parse(s: &str) -> Result<Self> {
        let c = svgtypes::Color::from_str(s.trim())
            .map_err(|e| Error::config(format!("invalid color '{s}': {e}")))?;
        Ok(Self {
            r: c.red,
            g: c.green,
            b: c.blue,
            a: c.alpha,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    fn lerp(self, other: Color, t: f32) -> Color {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

const fn hex(v: u32) -> Color {
    Color::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

const VIRIDIS: &[Color] = &[
    hex(0x440154), hex(0x472c7a), hex(0x3b518b), hex(0x2c718e), hex(0x21908d),
    hex(0x27ad81), hex(0x5cc863), hex(0xaadc32), hex(0xfde725),
];
const PLASMA: &[Color] = &[
    hex(0x0d0887), hex(0x46039f), hex(0x7201a8), hex(0x9c179e), hex(0xbd3786),
    hex(0xd8576b), hex(0xed7953), hex(0xfb9f3a), hex(0xfdca26), hex(0xf0f921),
];
const INFERNO: &[Color] = &[
    hex(0x000004), hex(0x1b0c41), hex(0x4a0c6b), hex(0x781c6d), hex(0xa52c60),
    hex(0xcf4446), hex(0xed6925), hex(0xfb9b06), hex(0xf7d13d), hex(0xfcffa4),
];
const MAGMA: &[Color] = &[
    hex(0x000004), hex(0x180f3d), hex(0x440f76), hex(0x721f81), hex(0x9e2f7f),
    hex(0xcd4071), hex(0xf1605d), hex(0xfd9668), hex(0xfeca8d), hex(0xfcfdbf),
];
const CIVIDIS: &[Color] = &[
    hex(0x00224e), hex(0x123570), hex(0x3b496c), hex(0x575d6d), hex(0x707173),
    hex(0x8a8678), hex(0xa59c74), hex(0xc3b369), hex(0xe1cc55), hex(0xfee838),
];
const GRAY: &[Color] = &[hex(0x000000), hex(0xffffff)];

/// Preset discrete schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Ocean,
    Sunset,
    Forest,
    Berry,
    Monochrome,
    Rainbow,
}

impl ColorScheme {
    pub fn colors(&self) -> Vec<Color> {
        let hexes: &[u32] = match self {
            ColorScheme::Ocean => &[0x264653, 0x287271, 0x2a9d8f, 0x8ab17d, 0xe9c46a],
            ColorScheme::Sunset => &[0xf94144, 0xf3722c, 0xf8961e, 0xf9844a, 0xf9c74f],
            ColorScheme::Forest => &[0x2d6a4f, 0x40916c, 0x52b788, 0x74c69d, 0x95d5b2],
            ColorScheme::Berry => &[0x7b2cbf, 0x9d4edd, 0xc77dff, 0xe0aaff, 0xff6d00],
            ColorScheme::Monochrome => &[0x212529, 0x495057, 0x6c757d, 0xadb5bd, 0xced4da],
            ColorScheme::Rainbow => &[0xe63946, 0xf4a261, 0xe9c46a, 0x2a9d8f, 0x457b9d, 0x7b2cbf],
        };
        hexes.iter().map(|&v| hex(v)).collect()
    }
}

/// Maps each word to a color: continuous colormaps are sampled at a random
/// position, discrete palettes pick a random entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Palette {
    Continuous(&'static [Color]),
    Discrete(Vec<Color>),
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Continuous(VIRIDIS)
    }
}

impl Palette {
    pub fn from_name(name: &str) -> Result<Self> {
        let palette = match name.trim().to_ascii_lowercase().as_str() {
            "viridis" => Palette::Continuous(VIRIDIS),
            "plasma" => Palette::Continuous(PLASMA),
            "inferno" => Palette::Continuous(INFERNO),
            "magma" => Palette::Continuous(MAGMA),
            "cividis" => Palette::Continuous(CIVIDIS),
            "gray" | "grey" => Palette::Continuous(GRAY),
            "ocean" => Palette::Discrete(ColorScheme::Ocean.colors()),
            "sunset" => Palette::Discrete(ColorScheme::Sunset.colors()),
            "forest" => Palette::Discrete(ColorScheme::Forest.colors()),
            "berry" => Palette::Discrete(ColorScheme::Berry.colors()),
            "monochrome" => Palette::Discrete(ColorScheme::Monochrome.colors()),
            "rainbow" => Palette::Discrete(ColorScheme::Rainbow.colors()),
            other => return Err(Error::config(format!("unknown color palette '{other}'"))),
        };
        Ok(palette)
    }

    pub fn colors(colors: impl IntoIterator<Item = Color>) -> Self {
        let colors: Vec<Color> = colors.into_iter().collect();
        if colors.is_empty() {
            Palette::default()
        } else {
            Palette::Discrete(colors)
        }
    }

    /// Color at `t` in `[0, 1]`.
    pub fn sample(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        match self {
            Palette::Continuous(stops) => {
                let scaled = t * (stops.len() - 1) as f32;
                let i = (scaled.floor() as usize).min(stops.len() - 2);
                stops[i].lerp(stops[i + 1], scaled - i as f32)
            }
            Palette::Discrete(colors) => {
                let i = ((t * colors.len() as f32) as usize).min(colors.len() - 1);
                colors[i]
            }
        }
    }

    pub fn pick<R: Rng>(&self, rng: &mut R) -> Color {
        match self {
            Palette::Continuous(_) => self.sample(rng.random::<f32>()),
            Palette::Discrete(colors) => colors[rng.random_range(0..colors.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn parses_names_and_hex_forms() {
        assert_eq!(Color::parse("black").unwrap(), Color::BLACK);
        assert_eq!(Color::parse("white").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#f00").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(
            Color::parse("#050948ff").unwrap(),
            Color::rgb(0x05, 0x09, 0x48)
        );
        assert_eq!(Color::parse("#f6f2b8").unwrap().to_hex(), "#f6f2b8");
    }

    #[test]
    fn rejects_garbage_as_config_error() {
        let err = Color::parse("not-a-color").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn viridis_endpoints() {
        let p = Palette::from_name("viridis").unwrap();
        assert_eq!(p.sample(0.0), hex(0x440154));
        assert_eq!(p.sample(1.0), hex(0xfde725));
    }

    #[test]
    fn palette_names_are_case_insensitive() {
        assert_eq!(
            Palette::from_name("Viridis").unwrap(),
            Palette::from_name("viridis").unwrap()
        );
        assert!(Palette::from_name("Sunset").is_ok());
    }

    #[test]
    fn unknown_palette_is_config_error() {
        assert!(Palette::from_name("jet9000").unwrap_err().is_config());
    }

    #[test]
    fn discrete_pick_stays_in_palette() {
        let colors = ColorScheme::Forest.colors();
        let p = Palette::colors(colors.clone());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(colors.contains(&p.pick(&mut rng)));
        }
    }

    #[test]
    fn empty_custom_palette_falls_back_to_default() {
        assert_eq!(Palette::colors(Vec::new()), Palette::default());
    }
}
