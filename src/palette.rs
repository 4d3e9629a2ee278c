//! 256-entry colormaps for the spectrogram body and the legend ramp.
//!
//! Palettes are built once from a few color stops and shared immutably.
//! Index 0 is the quietest level, index 255 the loudest.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::canvas::Rgb;
use crate::colorize::COLOR_MAX;
use crate::error::{ParameterError, SpectrogramResult};

/// Number of palette entries.
pub const PALETTE_SIZE: usize = COLOR_MAX + 1;

/// Available colormaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Perceptual rainbow from purple through blue and green to orange.
    #[default]
    Cube1,
    /// Black to white.
    Gray,
    /// Black through purple and orange to white.
    Fire,
}

type Stops = &'static [(f32, [u8; 3])];

const CUBE1_STOPS: Stops = &[
    (0.0, [120, 0, 133]),
    (0.2, [72, 54, 234]),
    (0.4, [44, 146, 187]),
    (0.6, [67, 199, 71]),
    (0.8, [190, 221, 53]),
    (1.0, [249, 150, 34]),
];

const GRAY_STOPS: Stops = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const FIRE_STOPS: Stops = &[
    (0.0, [0, 0, 0]),
    (0.25, [128, 0, 128]),
    (0.5, [255, 165, 0]),
    (0.75, [255, 255, 0]),
    (1.0, [255, 255, 255]),
];

static PALETTES: LazyLock<[Palette; 3]> = LazyLock::new(|| {
    [
        Palette::from_stops(CUBE1_STOPS),
        Palette::from_stops(GRAY_STOPS),
        Palette::from_stops(FIRE_STOPS),
    ]
});

impl Colormap {
    /// Every colormap, ordered by id.
    pub const ALL: [Self; 3] = [Self::Cube1, Self::Gray, Self::Fire];

    /// Numeric id.
    pub const fn id(self) -> u32 {
        match self {
            Self::Cube1 => 0,
            Self::Gray => 1,
            Self::Fire => 2,
        }
    }

    /// Inverse of [`Colormap::id`].
    pub fn from_id(id: u32) -> SpectrogramResult<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|id| Self::ALL.get(id).copied())
            .ok_or_else(|| ParameterError::out_of_range("cmap", id, "0..=2").into())
    }

    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cube1 => "cube1",
            Self::Gray => "gray",
            Self::Fire => "fire",
        }
    }

    /// The shared palette of this colormap.
    pub fn palette(self) -> &'static Palette {
        &PALETTES[self.id() as usize]
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmap| cmap.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParameterError::invalid_value("cmap", format!("unknown colormap '{s}'")))
    }
}

/// A 256-entry color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; PALETTE_SIZE],
}

impl Palette {
    /// Linear interpolation between `stops`, sorted by position in `[0, 1]`.
    fn from_stops(stops: &[(f32, [u8; 3])]) -> Self {
        let mut colors = [Rgb::BLACK; PALETTE_SIZE];
        for (i, color) in colors.iter_mut().enumerate() {
            let t = i as f32 / COLOR_MAX as f32;
            let (start, end) = stops
                .windows(2)
                .find(|w| t >= w[0].0 && t <= w[1].0)
                .map_or((stops[0], stops[stops.len() - 1]), |w| (w[0], w[1]));
            let local = if end.0 > start.0 {
                (t - start.0) / (end.0 - start.0)
            } else {
                0.0
            };
            *color = Rgb::new(
                lerp(start.1[0], end.1[0], local),
                lerp(start.1[1], end.1[1], local),
                lerp(start.1[2], end.1[2], local),
            );
        }
        Self { colors }
    }

    /// Entry `index`, clamped to the last entry.
    pub fn color(&self, index: usize) -> Rgb {
        self.colors[index.min(COLOR_MAX)]
    }

    /// All entries.
    pub const fn colors(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.colors
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_match_stops() {
        let gray = Colormap::Gray.palette();
        assert_eq!(gray.color(0), Rgb::BLACK);
        assert_eq!(gray.color(255), Rgb::WHITE);
        assert_eq!(gray.color(128), Rgb::gray(128));
        assert_eq!(gray.color(10_000), Rgb::WHITE);

        let cube1 = Colormap::Cube1.palette();
        assert_eq!(cube1.color(0), Rgb::new(120, 0, 133));
        assert_eq!(cube1.color(255), Rgb::new(249, 150, 34));

        let fire = Colormap::Fire.palette();
        assert_eq!(fire.color(0), Rgb::BLACK);
        assert_eq!(fire.color(255), Rgb::WHITE);
    }

    #[test]
    fn test_ids_and_names() {
        for cmap in Colormap::ALL {
            assert_eq!(Colormap::from_id(cmap.id()).unwrap(), cmap);
            assert_eq!(cmap.to_string().parse::<Colormap>(), Ok(cmap));
        }
        assert!(Colormap::from_id(3).is_err());
        assert!("jet".parse::<Colormap>().is_err());
        assert_eq!(Colormap::default(), Colormap::Cube1);
    }
}
