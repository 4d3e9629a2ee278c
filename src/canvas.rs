//! Bounds-checked drawing surface.
//!
//! The renderer only ever draws through the [`Canvas`] trait. Coordinates are
//! signed and anything outside the surface is silently clipped, so geometry
//! mistakes can at worst lose pixels.

use bytemuck::{Pod, Zeroable};
use ndarray::Array2;

use crate::font::{self, ADVANCE};
use crate::palette::Palette;

/// An 8-bit RGB pixel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self::gray(0);
    /// White.
    pub const WHITE: Self = Self::gray(255);

    /// A color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Equal channels.
    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Packed as `0xAARRGGBB` with the given alpha.
    pub const fn to_argb(self, alpha: u8) -> u32 {
        (alpha as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// Direction in which text advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextOrientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom, glyphs transposed.
    Vertical,
}

/// Drawing primitives over a clipped pixel surface.
///
/// Implementors provide the size and checked access to single pixels; every
/// other primitive is built on top of those.
pub trait Canvas {
    /// Width in pixels.
    fn width(&self) -> usize;

    /// Height in pixels.
    fn height(&self) -> usize;

    /// Mutable access to the pixel at `(x, y)`, `None` when outside.
    fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut Rgb>;

    /// The pixel at `(x, y)`, `None` when outside.
    fn pixel(&self, x: i32, y: i32) -> Option<Rgb>;

    /// Set the pixel at `(x, y)` if it is inside the surface.
    fn put_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(pixel) = self.pixel_mut(x, y) {
            *pixel = color;
        }
    }

    /// Set the pixel at `(x, y)` to a gray level.
    fn set_gray(&mut self, x: i32, y: i32, level: u8) {
        self.put_pixel(x, y, Rgb::gray(level));
    }

    /// Set the pixel at `(x, y)` to entry `index` of `palette`.
    fn set_indexed(&mut self, x: i32, y: i32, palette: &Palette, index: usize) {
        self.put_pixel(x, y, palette.color(index));
    }

    /// Horizontal run of `len` pixels starting at `(x, y)`.
    fn hline(&mut self, x: i32, y: i32, len: i32, color: Rgb) {
        for dx in 0..len {
            self.put_pixel(x + dx, y, color);
        }
    }

    /// Vertical run of `len` pixels starting at `(x, y)`.
    fn vline(&mut self, x: i32, y: i32, len: i32, color: Rgb) {
        for dy in 0..len {
            self.put_pixel(x, y + dy, color);
        }
    }

    /// Fill a rectangle; empty or negative sizes draw nothing.
    fn fill_rect(&mut self, left: i32, top: i32, width: i32, height: i32, color: Rgb) {
        for dy in 0..height {
            self.hline(left, top + dy, width, color);
        }
    }

    /// Draw `text` with its first glyph's top-left corner at `(x, y)`.
    ///
    /// Characters outside printable ASCII are drawn as a box.
    fn draw_text(&mut self, x: i32, y: i32, color: Rgb, text: &str, orientation: TextOrientation) {
        let (mut x, mut y) = (x, y);
        for ch in text.chars() {
            for (col, row) in font::glyph_pixels(ch) {
                match orientation {
                    TextOrientation::Horizontal => self.put_pixel(x + col, y + row, color),
                    TextOrientation::Vertical => self.put_pixel(x + row, y + col, color),
                }
            }
            match orientation {
                TextOrientation::Horizontal => x += ADVANCE,
                TextOrientation::Vertical => y += ADVANCE,
            }
        }
    }
}

/// An owned RGB image, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelCanvas {
    pixels: Array2<Rgb>,
}

impl PixelCanvas {
    /// A black canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    /// A canvas filled with `color`.
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            pixels: Array2::from_elem((height, width), color),
        }
    }

    /// Pixels as a `(height, width)` array.
    pub const fn pixels(&self) -> &Array2<Rgb> {
        &self.pixels
    }

    /// Row-major `RGBRGB..` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels
            .as_slice()
            .map(|pixels| bytemuck::cast_slice::<Rgb, u8>(pixels))
            .unwrap_or_default()
    }

    /// The image turned 90 degrees clockwise.
    pub fn rotated_clockwise(&self) -> Self {
        let (height, width) = self.pixels.dim();
        Self {
            pixels: Array2::from_shape_fn((width, height), |(y, x)| {
                self.pixels[[height - 1 - x, y]]
            }),
        }
    }

    /// Copy into caller-owned packed `0xFFRRGGBB` pixels with row pitch
    /// `width`, clipping to the smaller of both sizes.
    pub fn write_argb(&self, out: &mut [u32], width: usize, height: usize) {
        for (y, row) in self.pixels.outer_iter().enumerate().take(height) {
            let Some(line) = out.get_mut(y * width..(y + 1) * width) else {
                break;
            };
            for (dst, src) in line.iter_mut().zip(row.iter()) {
                *dst = src.to_argb(0xff);
            }
        }
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> usize {
        self.pixels.ncols()
    }

    fn height(&self) -> usize {
        self.pixels.nrows()
    }

    fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut Rgb> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.pixels.get_mut((y, x))
    }

    fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.pixels.get((y, x)).copied()
    }
}
