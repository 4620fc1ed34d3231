//! Word placement.
//!
//! Words are laid out most frequent first. Each word is rasterized into a
//! bit-packed sprite and slid along an Archimedean spiral from the canvas
//! centre until it lands on free cells of the collision map. The mask's
//! background is pre-filled into the map, so words only land inside the
//! silhouette.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::color::{Color, Palette};
use crate::error::{Error, Result};
use crate::font::{CloudFont, ShapedRun};
use crate::frequency::WordFrequencies;
use crate::mask::MaskImage;

/// Rotation used for vertical words, counter-clockwise.
pub const VERTICAL: f32 = -90.0;

/// A word with its final position. `(x, y)` is the start of the baseline in
/// canvas pixels; the word is rotated by `rotation` degrees around it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub color: Color,
    pub run: ShapedRun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub min_font_size: f32,
    /// `None` derives the starting size from a two-word trial layout.
    pub max_font_size: Option<f32>,
    pub font_step: f32,
    pub prefer_horizontal: f32,
    pub relative_scaling: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            margin: 2,
            min_font_size: 4.0,
            max_font_size: None,
            font_step: 1.0,
            prefer_horizontal: 0.9,
            relative_scaling: 0.5,
        }
    }
}

/// Work counters for one layout run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutStats {
    /// Sprites rasterized and searched for a spot.
    pub attempts: usize,
    /// Spiral positions visited.
    pub positions: usize,
    /// Positions whose box had enough free cells to be checked bit by bit.
    pub collision_checks: usize,
}

pub(crate) struct Layout<'a> {
    pub font: &'a CloudFont,
    pub options: &'a LayoutOptions,
    pub palette: &'a Palette,
}

impl Layout<'_> {
    pub fn run(
        &self,
        words: &WordFrequencies,
        mask: Option<&MaskImage>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<PlacedWord>> {
        self.run_counted(words, mask, rng).map(|(placed, _)| placed)
    }

    pub fn run_counted(
        &self,
        words: &WordFrequencies,
        mask: Option<&MaskImage>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(Vec<PlacedWord>, LayoutStats)> {
        if words.is_empty() {
            return Err(Error::Input(
                "need at least one word to plot a word cloud".into(),
            ));
        }
        let blank = self.collision_map(mask);
        let mut stats = LayoutStats::default();

        let start_size = match self.options.max_font_size {
            Some(size) => size,
            None if words.len() == 1 => self.options.height as f32,
            None => {
                let trial = self.place_all(
                    &words.truncated(2),
                    self.options.height as f32,
                    &mut blank.clone(),
                    rng,
                    &mut stats,
                )?;
                match trial.as_slice() {
                    [a, b, ..] => (2.0 * a.font_size * b.font_size / (a.font_size + b.font_size))
                        .floor(),
                    [a] => a.font_size,
                    [] => {
                        return Err(Error::Render(
                            "couldn't find space to draw; the mask may be empty or too small"
                                .into(),
                        ))
                    }
                }
            }
        };
        debug!(start_size, words = words.len(), "laying out words");

        let placed = self.place_all(words, start_size, &mut blank.clone(), rng, &mut stats)?;
        if placed.is_empty() {
            return Err(Error::Render("Could not place any words".into()));
        }
        debug!(
            placed = placed.len(),
            dropped = words.len() - placed.len(),
            attempts = stats.attempts,
            positions = stats.positions,
            collision_checks = stats.collision_checks,
            "layout finished"
        );
        Ok((placed, stats))
    }

    fn collision_map(&self, mask: Option<&MaskImage>) -> CollisionMap {
        let (width, height) = (self.options.width, self.options.height);
        let mut map = CollisionMap::new(width, height);
        if let Some(mask) = mask {
            let mask = mask.resized(width, height);
            for y in 0..height {
                for x in 0..width {
                    if mask.is_blocked(x, y) {
                        map.set(x as i32, y as i32);
                    }
                }
            }
        }
        map
    }

    fn place_all(
        &self,
        words: &WordFrequencies,
        start_size: f32,
        map: &mut CollisionMap,
        rng: &mut ChaCha8Rng,
        stats: &mut LayoutStats,
    ) -> Result<Vec<PlacedWord>> {
        let opts = self.options;
        let rs = opts.relative_scaling;
        let mut font_size = start_size;
        let mut last_weight = 1.0f32;
        let mut placed = Vec::with_capacity(words.len());

        for word in words.iter() {
            if rs != 0.0 {
                font_size = ((rs * (word.weight / last_weight) + (1.0 - rs)) * font_size).round();
            }
            let run = self.font.shape(&word.word)?;
            if run.glyphs.is_empty() {
                continue;
            }

            let mut angle = if rng.random::<f32>() < opts.prefer_horizontal {
                0.0
            } else {
                VERTICAL
            };
            let mut tried_other_orientation = false;
            let padding = opts.margin / 2;
            // Built on the first sprite that fits the canvas; the map only
            // changes once this word is placed.
            let mut table: Option<OccupancyTable> = None;

            let position = loop {
                if font_size < opts.min_font_size {
                    break None;
                }
                if fits_canvas(&run, font_size, angle, self.font, padding, map) {
                    let sprite = rasterize_run(&run, font_size, angle, self.font, padding);
                    let table = table.get_or_insert_with(|| OccupancyTable::new(map));
                    stats.attempts += 1;
                    if let Some(pos) = try_place(&sprite, map, table, rng, stats) {
                        break Some(pos);
                    }
                }
                if !tried_other_orientation && opts.prefer_horizontal < 1.0 {
                    angle = if angle == 0.0 { VERTICAL } else { 0.0 };
                    tried_other_orientation = true;
                } else {
                    font_size -= opts.font_step;
                    angle = 0.0;
                }
            };

            // Every later word would be at most this small: stop.
            let Some((x, y)) = position else {
                break;
            };
            placed.push(PlacedWord {
                text: word.word.clone(),
                font_size,
                x,
                y,
                rotation: angle,
                color: self.palette.pick(rng),
                run,
            });
            last_weight = word.weight;
        }
        Ok(placed)
    }
}

fn try_place(
    sprite: &TextSprite,
    map: &mut CollisionMap,
    table: &OccupancyTable,
    rng: &mut ChaCha8Rng,
    stats: &mut LayoutStats,
) -> Option<(f32, f32)> {
    if sprite.ink == 0
        || sprite.bbox_width > map.width
        || sprite.bbox_height > map.height
        || sprite.ink > map.free()
    {
        return None;
    }

    // Centre
    let start_x = map.width as i32 / 2;
    let start_y = map.height as i32 / 2;

    // Random initial direction
    let dt = if rng.random_bool(0.5) { 1 } else { -1 };

    let area = sprite.bbox_width as usize * sprite.bbox_height as usize;

    for (dx, dy) in spiral_walk(map.width, map.height, dt) {
        stats.positions += 1;
        // Top-left corner of the sprite
        let current_x = start_x + dx - (sprite.bbox_width as i32 / 2);
        let current_y = start_y + dy - (sprite.bbox_height as i32 / 2);

        let occupied =
            table.occupied(current_x, current_y, sprite.bbox_width, sprite.bbox_height);
        if sprite.ink + occupied > area {
            continue;
        }
        stats.collision_checks += 1;
        if !map.check_collision(sprite, current_x, current_y) {
            map.write_sprite(sprite, current_x, current_y);
            return Some((
                current_x as f32 + sprite.anchor_x,
                current_y as f32 + sprite.anchor_y,
            ));
        }
    }

    None
}

// =============================================================================
// Collision Detection
// =============================================================================

#[derive(Clone)]
pub(crate) struct CollisionMap {
    width: u32,
    height: u32,
    stride: usize, // u32 words per row
    data: Vec<u32>,
    filled: usize,
}

impl CollisionMap {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = ((width + 31) >> 5) as usize;
        Self {
            width,
            height,
            stride,
            data: vec![0; stride * height as usize],
            filled: 0,
        }
    }

    pub fn free(&self) -> usize {
        self.width as usize * self.height as usize - self.filled
    }

    /// Marks one cell as occupied (mask initialisation).
    pub fn set(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
            let row_idx = y as usize * self.stride;
            let col_idx = (x as usize) >> 5;
            let bit = 1u32 << (31 - (x & 31));
            let cell = &mut self.data[row_idx + col_idx];
            if *cell & bit == 0 {
                *cell |= bit;
                self.filled += 1;
            }
        }
    }

    fn get(&self, x: i32, y: i32) -> bool {
        let row_idx = y as usize * self.stride;
        let col_idx = (x as usize) >> 5;
        self.data[row_idx + col_idx] & (1 << (31 - (x & 31))) != 0
    }

    /// Anything outside the canvas counts as a collision.
    pub fn check_collision(&self, sprite: &TextSprite, start_x: i32, start_y: i32) -> bool {
        let sprite_w32 = sprite.width_u32;
        // start_x & 31 is non-negative even for negative start_x
        let shift = (start_x & 31) as u32;
        let r_shift = 32 - shift;
        let grid_col_start = (start_x >> 5) as isize;

        for sy in 0..sprite.bbox_height {
            let gy = start_y + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                return true;
            }
            let grid_row_idx = gy as usize * self.stride;
            let mut carry = 0u32;

            for sx in 0..=sprite_w32 {
                let s_val = if sx < sprite_w32 {
                    sprite.data[sy as usize * sprite_w32 + sx]
                } else {
                    0
                };
                // Previous block's spill | current block shifted; shift == 0
                // would overflow `carry << 32`.
                let mask = if shift == 0 {
                    s_val
                } else {
                    (carry << r_shift) | (s_val >> shift)
                };
                let gx = grid_col_start + sx as isize;

                if mask != 0 {
                    if gx < 0 || gx >= self.stride as isize {
                        return true;
                    }
                    if (self.data[grid_row_idx + gx as usize] & mask) != 0 {
                        return true;
                    }
                    // Padding bits of the last block lie past the right edge.
                    if gx as usize == self.stride - 1 && mask & self.tail_mask() != 0 {
                        return true;
                    }
                }
                carry = s_val;
            }
        }
        false
    }

    /// Bits of the last block that lie beyond `width`.
    fn tail_mask(&self) -> u32 {
        let used = self.width & 31;
        if used == 0 {
            0
        } else {
            u32::MAX >> used
        }
    }

    pub fn write_sprite(&mut self, sprite: &TextSprite, start_x: i32, start_y: i32) {
        let sprite_w32 = sprite.width_u32;
        let shift = (start_x & 31) as u32;
        let r_shift = 32 - shift;
        let grid_col_start = (start_x >> 5) as isize;

        for sy in 0..sprite.bbox_height {
            let gy = start_y + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                continue;
            }
            let grid_row_idx = gy as usize * self.stride;
            let mut carry = 0u32;

            for sx in 0..=sprite_w32 {
                let s_val = if sx < sprite_w32 {
                    sprite.data[sy as usize * sprite_w32 + sx]
                } else {
                    0
                };
                let mask = if shift == 0 {
                    s_val
                } else {
                    (carry << r_shift) | (s_val >> shift)
                };
                let gx = grid_col_start + sx as isize;
                if mask != 0 && gx >= 0 && gx < self.stride as isize {
                    let cell = &mut self.data[grid_row_idx + gx as usize];
                    self.filled += (mask & !*cell).count_ones() as usize;
                    *cell |= mask;
                }
                carry = s_val;
            }
        }
    }
}

/// Summed-area table of the occupied cells of a [`CollisionMap`].
pub(crate) struct OccupancyTable {
    width: i32,
    height: i32,
    stride: usize,
    sums: Vec<u32>,
}

impl OccupancyTable {
    pub fn new(map: &CollisionMap) -> Self {
        let (w, h) = (map.width as usize, map.height as usize);
        let stride = w + 1;
        let mut sums = vec![0u32; stride * (h + 1)];
        for y in 0..h {
            let mut row = 0u32;
            for x in 0..w {
                row += u32::from(map.get(x as i32, y as i32));
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self {
            width: map.width as i32,
            height: map.height as i32,
            stride,
            sums,
        }
    }

    fn at(&self, x: i32, y: i32) -> usize {
        self.sums[y as usize * self.stride + x as usize] as usize
    }

    /// Occupied cells in the `width` x `height` box at (`x`, `y`). Cells off
    /// the canvas count as occupied.
    pub fn occupied(&self, x: i32, y: i32, width: u32, height: u32) -> usize {
        let x0 = x.clamp(0, self.width);
        let y0 = y.clamp(0, self.height);
        let x1 = x.saturating_add(width as i32).clamp(0, self.width);
        let y1 = y.saturating_add(height as i32).clamp(0, self.height);
        let inside = (x1 - x0) as usize * (y1 - y0) as usize;
        let outside = width as usize * height as usize - inside;
        outside + self.at(x1, y1) + self.at(x0, y0) - self.at(x0, y1) - self.at(x1, y0)
    }
}

pub(crate) struct TextSprite {
    data: Vec<u32>,   // row-major bitmap
    width_u32: usize, // u32 words per row
    bbox_width: u32,
    bbox_height: u32,
    anchor_x: f32, // baseline origin inside the sprite
    anchor_y: f32,
    ink: usize,
}

/// Unrotated sprite box of `run` at `size`, padding included.
fn run_box(run: &ShapedRun, size: f32, font: &CloudFont, padding: u32) -> (f32, f32) {
    let pad = padding as f32 * 2.0;
    (
        (run.advance * font.scale(size)).ceil() + pad,
        font.line_metrics(size).new_line_size.ceil() + pad,
    )
}

/// Whether the sprite's box can fit the canvas at all, checked before
/// rasterizing.
fn fits_canvas(
    run: &ShapedRun,
    size: f32,
    angle: f32,
    font: &CloudFont,
    padding: u32,
    map: &CollisionMap,
) -> bool {
    let (w, h) = run_box(run, size, font, padding);
    let (w, h) = if angle == 0.0 { (w, h) } else { (h, w) };
    w <= map.width as f32 && h <= map.height as f32
}

/// Rasterizes a shaped run at `size`, rotated by `angle_deg` and dilated by
/// `padding` pixels.
pub(crate) fn rasterize_run(
    run: &ShapedRun,
    size: f32,
    angle_deg: f32,
    font: &CloudFont,
    padding: u32,
) -> TextSprite {
    let metrics = font.line_metrics(size);
    let scale = font.scale(size);
    let (unrotated_w, unrotated_h) = run_box(run, size, font, padding);

    // 1. Rasterize glyphs at their shaped offsets
    let glyphs: Vec<_> = run
        .glyphs
        .iter()
        .map(|g| {
            let (m, bitmap) = font.raster().rasterize_indexed(g.id, size);
            (g.x * scale, -g.y * scale, m, bitmap)
        })
        .collect();

    // 2. Rotation about the centre of the unrotated box
    let padding_f = padding as f32;

    let cx = unrotated_w / 2.0;
    let cy = unrotated_h / 2.0;
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    let transform = |x: f32, y: f32| -> (f32, f32) {
        let dx = x - cx;
        let dy = y - cy;
        (dx * cos - dy * sin + cx, dx * sin + dy * cos + cy)
    };

    // 3. Rotated bounding box
    let corners = [
        transform(0.0, 0.0),
        transform(unrotated_w, 0.0),
        transform(0.0, unrotated_h),
        transform(unrotated_w, unrotated_h),
    ];
    let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

    let bbox_width = (max_x - min_x).ceil() as u32;
    let bbox_height = (max_y - min_y).ceil() as u32;
    let width_u32 = ((bbox_width + 31) >> 5) as usize;

    // 4. Bitmap
    let mut data = vec![0u32; width_u32 * bbox_height as usize];

    let base_x = padding_f;
    let base_y = padding_f + metrics.ascent;
    let (rot_base_x, rot_base_y) = transform(base_x, base_y);
    let anchor_x = rot_base_x - min_x;
    let anchor_y = rot_base_y - min_y;

    let pad = padding as i32;
    for (offset_x, offset_y, m, bitmap) in &glyphs {
        let char_left = base_x + offset_x + m.xmin as f32;
        let char_top = base_y + offset_y - m.height as f32 - m.ymin as f32;

        for y in 0..m.height {
            for x in 0..m.width {
                if bitmap[y * m.width + x] <= 10 {
                    continue;
                }
                let (rx, ry) = transform(char_left + x as f32, char_top + y as f32);
                let fx = (rx - min_x).round() as i32;
                let fy = (ry - min_y).round() as i32;

                // Dilate by padding
                for py in -pad..=pad {
                    for px in -pad..=pad {
                        let dx = fx + px;
                        let dy = fy + py;
                        if dx >= 0 && dy >= 0 && dx < bbox_width as i32 && dy < bbox_height as i32
                        {
                            let row_idx = dy as usize * width_u32;
                            let col_idx = (dx as usize) >> 5;
                            data[row_idx + col_idx] |= 1 << (31 - (dx & 31));
                        }
                    }
                }
            }
        }
    }

    let ink = data.iter().map(|w| w.count_ones() as usize).sum();
    TextSprite {
        data,
        width_u32,
        bbox_width,
        bbox_height,
        anchor_x,
        anchor_y,
        ink,
    }
}

// =============================================================================
// Archimedean Spiral
// =============================================================================

/// Spiral offsets from the canvas centre, ending once the spiral has passed
/// every edge of a `width` x `height` canvas. Each later ring lies wholly
/// off the canvas.
fn spiral_walk(width: u32, height: u32, dt: i32) -> impl Iterator<Item = (i32, i32)> {
    let (w, h) = (width as i32, height as i32);
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (0, 0, 0, 0);
    let mut enclosed = false;
    ArchimedeanSpiral::new(w, h, dt).take_while(move |&(dx, dy)| {
        if enclosed {
            return false;
        }
        min_x = min_x.min(dx);
        max_x = max_x.max(dx);
        min_y = min_y.min(dy);
        max_y = max_y.max(dy);
        enclosed = min_x < -w && max_x > w && min_y < -h && max_y > h;
        true
    })
}

struct ArchimedeanSpiral {
    t: i32,
    dt: i32,
    dx: f64,
    dy: f64,
    ratio: f64,
    e: f64,
}

impl ArchimedeanSpiral {
    fn new(width: i32, height: i32, dt: i32) -> Self {
        let e = 4.0;
        let ratio = e * width as f64 / height as f64;
        Self {
            t: 0,
            dt,
            dx: 0.0,
            dy: 0.0,
            ratio,
            e,
        }
    }
}

impl Iterator for ArchimedeanSpiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.t += self.dt;
        let sign = if self.t < 0 { -1.0 } else { 1.0 };
        let idx = ((1.0 + 4.0 * sign * self.t as f64).sqrt() - sign) as i32 & 3;
        match idx {
            0 => self.dx += self.ratio,
            1 => self.dy += self.e,
            2 => self.dx -= self.ratio,
            _ => self.dy -= self.e,
        }
        Some((self.dx as i32, self.dy as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::path::Path;

    fn font() -> CloudFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        CloudFont::load(&path).unwrap()
    }

    fn sprite_for(text: &str, size: f32, angle: f32) -> TextSprite {
        let f = font();
        let run = f.shape(text).unwrap();
        rasterize_run(&run, size, angle, &f, 1)
    }

    #[test]
    fn map_set_counts_each_cell_once() {
        let mut map = CollisionMap::new(40, 10);
        assert_eq!(map.free(), 400);
        map.set(3, 3);
        map.set(3, 3);
        map.set(-1, 0);
        map.set(40, 0);
        assert_eq!(map.free(), 399);
        assert!(map.get(3, 3));
    }

    #[test]
    fn sprite_has_ink_and_fits_its_box() {
        let s = sprite_for("word", 30.0, 0.0);
        assert!(s.ink > 0);
        assert!(s.bbox_width > s.bbox_height);
        assert!(s.anchor_y > 0.0 && s.anchor_y < s.bbox_height as f32);
    }

    #[test]
    fn vertical_sprite_swaps_box() {
        let h = sprite_for("word", 30.0, 0.0);
        let v = sprite_for("word", 30.0, VERTICAL);
        assert!(v.bbox_height > v.bbox_width);
        assert!(v.bbox_width.abs_diff(h.bbox_height) <= 1);
    }

    #[test]
    fn written_sprite_collides_with_itself() {
        let s = sprite_for("ab", 20.0, 0.0);
        let mut map = CollisionMap::new(100, 60);
        assert!(!map.check_collision(&s, 13, 7));
        map.write_sprite(&s, 13, 7);
        assert!(map.check_collision(&s, 13, 7));
        assert_eq!(map.free(), 100 * 60 - s.ink);
    }

    #[test]
    fn out_of_bounds_counts_as_collision() {
        let s = sprite_for("ab", 20.0, 0.0);
        let map = CollisionMap::new(100, 60);
        assert!(map.check_collision(&s, -50, 5));
        assert!(map.check_collision(&s, 5, -50));
        assert!(map.check_collision(&s, 95, 5));
        assert!(map.check_collision(&s, 5, 55));
    }

    #[test]
    fn fully_blocked_map_rejects_sprite() {
        let s = sprite_for("ab", 10.0, 0.0);
        let mut map = CollisionMap::new(50, 50);
        for y in 0..50 {
            for x in 0..50 {
                map.set(x, y);
            }
        }
        let table = OccupancyTable::new(&map);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut stats = LayoutStats::default();
        assert!(try_place(&s, &mut map, &table, &mut rng, &mut stats).is_none());
    }

    #[test]
    fn occupancy_table_counts_boxes() {
        let mut map = CollisionMap::new(10, 8);
        map.set(2, 3);
        map.set(5, 5);
        map.set(9, 7);
        let table = OccupancyTable::new(&map);
        assert_eq!(table.occupied(0, 0, 10, 8), 3);
        assert_eq!(table.occupied(2, 3, 1, 1), 1);
        assert_eq!(table.occupied(3, 3, 2, 2), 0);
        assert_eq!(table.occupied(2, 3, 4, 3), 2);
        // Two columns hang off the right edge.
        assert_eq!(table.occupied(9, 6, 3, 2), 1 + 4);
        assert_eq!(table.occupied(-5, -5, 2, 2), 4);
    }

    #[test]
    fn spiral_walk_stops_once_canvas_is_surrounded() {
        let (w, h) = (600u32, 600u32);
        let pts: Vec<_> = spiral_walk(w, h, 1).collect();
        assert!(pts.len() <= (w * h / 3) as usize, "{} positions", pts.len());
        assert!(pts.iter().any(|&(x, _)| x < -(w as i32)));
        assert!(pts.iter().any(|&(x, _)| x > w as i32));
        assert!(pts.iter().any(|&(_, y)| y < -(h as i32)));
        assert!(pts.iter().any(|&(_, y)| y > h as i32));
        let (x, y) = pts[pts.len() - 1];
        assert!(x.abs() > w as i32 || y.abs() > h as i32);
    }

    #[test]
    fn scattered_free_cells_skip_bitwise_checks() {
        let s = sprite_for("ab", 20.0, 0.0);
        // One free cell in every 4x4 block.
        let mut map = CollisionMap::new(200, 200);
        for y in 0..200 {
            for x in 0..200 {
                if x % 4 != 0 || y % 4 != 0 {
                    map.set(x, y);
                }
            }
        }
        let most_free_in_box = ((s.bbox_width / 4 + 1) * (s.bbox_height / 4 + 1)) as usize;
        assert!(s.ink <= map.free());
        assert!(s.ink > most_free_in_box);

        let table = OccupancyTable::new(&map);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut stats = LayoutStats::default();
        assert!(try_place(&s, &mut map, &table, &mut rng, &mut stats).is_none());
        assert!(stats.positions > 0);
        assert_eq!(stats.collision_checks, 0);
    }

    #[test]
    fn few_hundred_words_stay_within_walk_budget() {
        let f = font();
        let side = 300u32;
        let r = side as f32 * 0.45;
        let img = image::RgbaImage::from_fn(side, side, |x, y| {
            let dx = x as f32 - side as f32 / 2.0;
            let dy = y as f32 - side as f32 / 2.0;
            if dx * dx + dy * dy < r * r {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let mask = MaskImage::from_image(image::DynamicImage::ImageRgba8(img));
        let opts = LayoutOptions {
            width: side,
            height: side,
            ..LayoutOptions::default()
        };
        let palette = Palette::default();
        let layout = Layout {
            font: &f,
            options: &opts,
            palette: &palette,
        };
        let counts = (0..300)
            .map(|i| (format!("w{i:03}"), 3000 / (i + 1)))
            .collect();
        let words = WordFrequencies::from_counts(counts, 300);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (placed, stats) = layout.run_counted(&words, Some(&mask), &mut rng).unwrap();

        assert!(placed.len() > 20, "placed {}", placed.len());
        let per_walk = (side * side / 3) as usize;
        assert!(stats.positions <= stats.attempts * per_walk);
        assert!(stats.collision_checks < stats.positions);
    }

    #[test]
    fn spiral_starts_near_origin_and_moves_outward() {
        let pts: Vec<_> = ArchimedeanSpiral::new(100, 100, 1).take(200).collect();
        assert!(pts[0].0.abs() <= 4 && pts[0].1.abs() <= 4);
        let far = pts.iter().map(|(x, y)| x.abs().max(y.abs())).max().unwrap();
        assert!(far > 10);
    }

    #[test]
    fn larger_weight_gets_larger_font() {
        let f = font();
        let opts = LayoutOptions {
            width: 300,
            height: 150,
            max_font_size: Some(60.0),
            prefer_horizontal: 1.0,
            ..LayoutOptions::default()
        };
        let palette = Palette::default();
        let layout = Layout {
            font: &f,
            options: &opts,
            palette: &palette,
        };
        let words = WordFrequencies::from_counts(
            vec![("big".into(), 10), ("small".into(), 1), ("tiny".into(), 1)],
            10,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let placed = layout.run(&words, None, &mut rng).unwrap();
        assert_eq!(placed[0].text, "big");
        assert_eq!(placed[0].font_size, 60.0);
        assert!(placed.iter().skip(1).all(|w| w.font_size < placed[0].font_size));
        assert!(placed.iter().all(|w| w.rotation == 0.0));
    }

    #[test]
    fn words_stay_inside_mask() {
        let f = font();
        // Left half silhouette, right half background.
        let mut img = image::RgbaImage::from_pixel(200, 100, image::Rgba([255, 255, 255, 255]));
        for y in 0..100 {
            for x in 0..100 {
                img.put_pixel(x, y, image::Rgba([0, 0, 0, 255]));
            }
        }
        let mask = MaskImage::from_image(image::DynamicImage::ImageRgba8(img));
        let opts = LayoutOptions {
            width: 200,
            height: 100,
            prefer_horizontal: 1.0,
            ..LayoutOptions::default()
        };
        let palette = Palette::default();
        let layout = Layout {
            font: &f,
            options: &opts,
            palette: &palette,
        };
        let words = WordFrequencies::from_counts(
            vec![("alpha".into(), 3), ("beta".into(), 2), ("gamma".into(), 1)],
            10,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let placed = layout.run(&words, Some(&mask), &mut rng).unwrap();
        assert!(!placed.is_empty());
        for w in &placed {
            assert!(w.x < 100.0, "{} placed at x={}", w.text, w.x);
        }
    }

    #[test]
    fn empty_word_list_is_input_error() {
        let f = font();
        let opts = LayoutOptions::default();
        let palette = Palette::default();
        let layout = Layout {
            font: &f,
            options: &opts,
            palette: &palette,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = layout
            .run(&WordFrequencies::default(), None, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn same_seed_same_layout() {
        let f = font();
        let opts = LayoutOptions::default();
        let palette = Palette::default();
        let layout = Layout {
            font: &f,
            options: &opts,
            palette: &palette,
        };
        let words = WordFrequencies::from_counts(
            vec![("one".into(), 5), ("two".into(), 3), ("three".into(), 2)],
            10,
        );
        let a = layout
            .run(&words, None, &mut ChaCha8Rng::seed_from_u64(42))
            .unwrap();
        let b = layout
            .run(&words, None, &mut ChaCha8Rng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }
}
