//! Render configuration and the pixel geometry derived from it.

use serde::{Deserialize, Serialize};

use crate::canvas::Rgb;
use crate::error::{ParameterError, SpectrogramResult};
use crate::font::GLYPH_HEIGHT;
use crate::format::SampleFormat;
use crate::palette::Colormap;
use crate::spectral::DEFAULT_GAIN_DB;
use crate::window::WindowType;

/// Plots at most this wide are drawn without decorations by default.
pub const DECORATION_THRESHOLD: u32 = 256;

/// Largest accepted gain magnitude, in dB.
pub const MAX_GAIN_DB: f32 = 200.0;

/// Orientation of the time axis in the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    /// Time runs left to right.
    #[default]
    Horizontal,
    /// Time runs top to bottom; the horizontal image turned clockwise.
    Vertical,
}

impl LayoutDirection {
    /// Numeric id, `0` for horizontal and `1` for vertical.
    pub const fn id(self) -> u8 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    /// Inverse of [`LayoutDirection::id`].
    pub fn from_id(id: u8) -> SpectrogramResult<Self> {
        match id {
            0 => Ok(Self::Horizontal),
            1 => Ok(Self::Vertical),
            _ => Err(ParameterError::out_of_range("direction", id, "0..=1").into()),
        }
    }
}

/// Every knob of a render.
///
/// Missing fields deserialize to their defaults, so partial configuration
/// files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Plot width in columns.
    pub width: u32,
    /// FFT size, which is also the plot height in rows.
    pub fft_size: u32,
    /// Margin above the plot when decorated.
    pub top: u32,
    /// Margin left of the plot when decorated.
    pub left: u32,
    /// Gain added to every level, in dB.
    pub gain_db: f32,
    /// Displayed range in dB; `None` uses the format default.
    pub db_range: Option<f32>,
    /// Colormap of the plot body and legend.
    pub colormap: Colormap,
    /// Window applied before each FFT.
    pub window: WindowType,
    /// Force decorations on or off; `None` decides by width.
    pub decorations: Option<bool>,
    /// Light decorations on black instead of dark ones on white.
    pub dark_theme: bool,
    /// First sample shown.
    pub origin: u64,
    /// Show `1/zoom` of the samples after `origin`.
    pub zoom: u32,
    /// Orientation of the final image.
    pub direction: LayoutDirection,
    /// Number of stacked strips the visible samples are split across.
    pub plot_across: u32,
    /// Length of the longest histogram bar.
    pub histo_width: u32,
    /// Height of the per-column level gauge.
    pub deci_height: u32,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            fft_size: 512,
            top: 16,
            left: 60,
            gain_db: DEFAULT_GAIN_DB,
            db_range: None,
            colormap: Colormap::default(),
            window: WindowType::default(),
            decorations: None,
            dark_theme: false,
            origin: 0,
            zoom: 1,
            direction: LayoutDirection::default(),
            plot_across: 1,
            histo_width: 100,
            deci_height: 16,
        }
    }
}

impl SpectrogramConfig {
    /// Check every value that would make a render meaningless.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.width < 2 {
            return Err(ParameterError::out_of_range("width", self.width, ">= 2"));
        }
        if self.fft_size < 2 {
            return Err(ParameterError::out_of_range("fft_size", self.fft_size, ">= 2"));
        }
        if !self.gain_db.is_finite() {
            return Err(ParameterError::invalid_value("db_gain", "must be finite"));
        }
        if self.gain_db.abs() > MAX_GAIN_DB {
            return Err(ParameterError::out_of_range(
                "db_gain",
                self.gain_db,
                format!("-{MAX_GAIN_DB}..={MAX_GAIN_DB}"),
            ));
        }
        if let Some(range) = self.db_range {
            if !range.is_finite() || range <= 0.0 {
                return Err(ParameterError::out_of_range("db_range", range, "> 0"));
            }
        }
        if self.zoom == 0 {
            return Err(ParameterError::out_of_range("zoom", self.zoom, ">= 1"));
        }
        if self.plot_across == 0 {
            return Err(ParameterError::out_of_range("plot_across", self.plot_across, ">= 1"));
        }
        Ok(())
    }

    /// Whether axes, legend and histograms are drawn.
    pub fn decorations_enabled(&self) -> bool {
        self.decorations.unwrap_or(self.width > DECORATION_THRESHOLD)
    }

    /// The configured range, or the default for `format`.
    pub fn effective_db_range(&self, format: SampleFormat) -> f32 {
        self.db_range.unwrap_or_else(|| format.default_db_range())
    }

    /// Colors of the decorations.
    pub const fn theme(&self) -> Theme {
        Theme {
            dark: self.dark_theme,
        }
    }

    /// Pixel geometry of the plot and its decorations.
    pub fn geometry(&self) -> PlotGeometry {
        PlotGeometry::from_config(self)
    }
}

/// Decoration colors.
///
/// Gray levels are given for a dark background and inverted for a light one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    dark: bool,
}

/// Color channel of a histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
}

impl Theme {
    /// Fill color of the whole image.
    pub const fn background(self) -> Rgb {
        if self.dark { Rgb::BLACK } else { Rgb::WHITE }
    }

    /// A gray level as seen on this background.
    pub const fn gray(self, level: u8) -> Rgb {
        if self.dark {
            Rgb::gray(level)
        } else {
            Rgb::gray(255 - level)
        }
    }

    /// Tint `pixel` with a bar of intensity `level` in `channel`.
    ///
    /// On dark backgrounds the channel is set; on light ones the other two
    /// channels are darkened, so bars keep their hue.
    pub fn tint(self, pixel: &mut Rgb, channel: Channel, level: u8) {
        match (self.dark, channel) {
            (true, Channel::Red) => pixel.r = level,
            (true, Channel::Green) => pixel.g = level,
            (false, Channel::Red) => {
                pixel.g = pixel.g.min(255 - level);
                pixel.b = pixel.b.min(255 - level);
            }
            (false, Channel::Green) => {
                pixel.r = pixel.r.min(255 - level);
                pixel.b = pixel.b.min(255 - level);
            }
        }
    }
}

/// Pixel positions of every plot element.
///
/// All coordinates are relative to strip 0; strip `s` is shifted down by
/// `s * strip_pitch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotGeometry {
    /// Plot width in columns.
    pub width: i32,
    /// Plot height in rows.
    pub height: i32,
    /// Top margin.
    pub top: i32,
    /// Left margin.
    pub left: i32,
    /// Length of the longest histogram bar.
    pub histo_width: i32,
    /// Height of the level gauge.
    pub deci_height: i32,
    /// Number of stacked strips.
    pub strips: i32,
    /// Whether decorations are drawn.
    pub decorated: bool,
}

impl PlotGeometry {
    /// Geometry for `config`; margins collapse to zero without decorations.
    pub fn from_config(config: &SpectrogramConfig) -> Self {
        let decorated = config.decorations_enabled();
        let px = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        Self {
            width: px(config.width),
            height: px(config.fft_size),
            top: if decorated { px(config.top) } else { 0 },
            left: if decorated { px(config.left) } else { 0 },
            histo_width: px(config.histo_width),
            deci_height: px(config.deci_height),
            strips: px(config.plot_across.max(1)),
            decorated,
        }
    }

    /// Vertical distance between stacked strips.
    pub const fn strip_pitch(&self) -> i32 {
        if self.decorated {
            self.gauge_top() + self.deci_height + 2
        } else {
            self.height
        }
    }

    /// First row of strip `strip`.
    pub const fn strip_offset(&self, strip: i32) -> i32 {
        strip * self.strip_pitch()
    }

    /// First row of the level gauge, below the time labels.
    pub const fn gauge_top(&self) -> i32 {
        self.top + self.height + GLYPH_HEIGHT + 2
    }

    /// Left edge of the color ramp.
    pub const fn ramp_left(&self) -> i32 {
        self.left + self.width + 8
    }

    /// Width of the color ramp.
    pub const fn ramp_width(&self) -> i32 {
        16
    }

    /// Left edge of the dBFS labels.
    pub const fn db_label_left(&self) -> i32 {
        self.left + self.width + 24
    }

    /// Left edge of the histogram bars.
    pub const fn histogram_left(&self) -> i32 {
        self.left + self.width + 40
    }

    /// Top-left corner of the title.
    pub const fn title_position(&self) -> (i32, i32) {
        (self.left + self.width / 2 - 40, 1)
    }

    /// Size of the image holding every strip and decoration.
    pub const fn canvas_size(&self) -> (usize, usize) {
        let width = if self.decorated {
            self.histogram_left() + self.histo_width
        } else {
            self.width
        };
        let height = self.strips * self.strip_pitch();
        (width as usize, height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpectrogramConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.decorations_enabled());
        assert_eq!(config.effective_db_range(SampleFormat::Cu8), 30.0);
        assert_eq!(config.effective_db_range(SampleFormat::Cf64), 60.0);
        assert_eq!(config.window, WindowType::BlackmanHarris);
    }

    #[test]
    fn test_validation() {
        let mut config = SpectrogramConfig {
            width: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.width = 2;
        config.db_range = Some(0.0);
        assert!(config.validate().is_err());
        config.db_range = Some(45.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_db_range(SampleFormat::Cu8), 45.0);
        config.zoom = 0;
        assert!(config.validate().is_err());
        config.zoom = 1;
        config.fft_size = 1;
        assert!(config.validate().is_err());
        config.fft_size = 512;

        config.gain_db = -1e8;
        assert!(matches!(
            config.validate(),
            Err(ParameterError::OutOfRange { ref parameter, .. }) if parameter == "db_gain"
        ));
        config.gain_db = f32::NAN;
        assert!(config.validate().is_err());
        config.gain_db = -MAX_GAIN_DB;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decorations_threshold() {
        let mut config = SpectrogramConfig {
            width: 256,
            ..Default::default()
        };
        assert!(!config.decorations_enabled());
        config.width = 257;
        assert!(config.decorations_enabled());
        config.decorations = Some(false);
        assert!(!config.decorations_enabled());
    }

    #[test]
    fn test_geometry() {
        let geometry = SpectrogramConfig::default().geometry();
        assert_eq!(geometry.ramp_left(), 60 + 1024 + 8);
        assert_eq!(geometry.db_label_left(), 60 + 1024 + 24);
        assert_eq!(geometry.histogram_left(), 60 + 1024 + 40);
        assert_eq!(geometry.gauge_top(), 16 + 512 + 9);
        assert_eq!(geometry.title_position(), (60 + 512 - 40, 1));
        assert_eq!(geometry.canvas_size(), (1224, 16 + 512 + 9 + 16 + 2));

        let bare = SpectrogramConfig {
            width: 200,
            fft_size: 64,
            plot_across: 3,
            ..Default::default()
        }
        .geometry();
        assert!(!bare.decorated);
        assert_eq!((bare.top, bare.left), (0, 0));
        assert_eq!(bare.canvas_size(), (200, 192));
        assert_eq!(bare.strip_offset(2), 128);
    }

    #[test]
    fn test_direction_ids() {
        for direction in [LayoutDirection::Horizontal, LayoutDirection::Vertical] {
            assert_eq!(LayoutDirection::from_id(direction.id()).unwrap(), direction);
        }
        assert!(LayoutDirection::from_id(2).is_err());
    }

    #[test]
    fn test_theme() {
        let dark = Theme { dark: true };
        let light = Theme { dark: false };
        assert_eq!(dark.gray(191), Rgb::gray(191));
        assert_eq!(light.gray(191), Rgb::gray(64));
        assert_eq!(light.background(), Rgb::WHITE);

        let mut pixel = dark.background();
        dark.tint(&mut pixel, Channel::Red, 63);
        assert_eq!(pixel, Rgb::new(63, 0, 0));

        let mut pixel = light.background();
        light.tint(&mut pixel, Channel::Green, 63);
        assert_eq!(pixel, Rgb::new(192, 255, 192));
    }

    #[test]
    fn test_serde_partial() {
        let config: SpectrogramConfig =
            serde_json::from_str(r#"{"width": 640, "window": "hann", "colormap": "fire"}"#).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.window, WindowType::Hann);
        assert_eq!(config.colormap, Colormap::Fire);
        assert_eq!(config.fft_size, 512);

        let json = serde_json::to_string(&config).unwrap();
        let back: SpectrogramConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
