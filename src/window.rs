//! Window functions applied to each column before the FFT.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ParameterError, SpectrogramResult};

/// Window function types for spectral analysis.
///
/// Each variant has a stable numeric id (see [`WindowType::id`]) used by
/// integer based configuration surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowType {
    /// Rectangular window (no windowing) - best frequency resolution but high leakage.
    Rectangular,
    /// Bartlett (triangular) window.
    Bartlett,
    /// Hamming window - raised cosine that does not reach zero at the edges.
    Hamming,
    /// Hann window - good general-purpose window with moderate leakage.
    Hann,
    /// Blackman window - low leakage but wider main lobe.
    Blackman,
    /// 4-term Blackman-Harris window - very low sidelobes.
    #[default]
    BlackmanHarris,
}

impl WindowType {
    /// Every window type, ordered by id.
    pub const ALL: [Self; 6] = [
        Self::Rectangular,
        Self::Bartlett,
        Self::Hamming,
        Self::Hann,
        Self::Blackman,
        Self::BlackmanHarris,
    ];

    /// Canonical lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rectangular => "rectangular",
            Self::Bartlett => "bartlett",
            Self::Hamming => "hamming",
            Self::Hann => "hann",
            Self::Blackman => "blackman",
            Self::BlackmanHarris => "blackman-harris",
        }
    }

    /// Numeric id in `0..=5`.
    pub const fn id(self) -> u8 {
        match self {
            Self::Rectangular => 0,
            Self::Bartlett => 1,
            Self::Hamming => 2,
            Self::Hann => 3,
            Self::Blackman => 4,
            Self::BlackmanHarris => 5,
        }
    }

    /// Inverse of [`WindowType::id`].
    pub fn from_id(id: u8) -> SpectrogramResult<Self> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or_else(|| ParameterError::out_of_range("fft_window", id, "0..=5").into())
    }

    /// Coefficient `i` of a window of length `n`, evaluated in `f32`.
    ///
    /// `n` must be at least 2, callers go through [`WindowType::generate`].
    fn coefficient(self, i: usize, n: usize) -> f32 {
        let i = i as f32;
        let m = (n - 1) as f32;
        match self {
            Self::Rectangular => 1.0,
            Self::Bartlett => 1.0 - ((i - 0.5 * m) / (0.5 * m)).abs(),
            Self::Hamming => 0.54 - 0.46 * (2.0 * PI * i / m).cos(),
            Self::Hann => 0.5 * (1.0 - (2.0 * PI * i / m).cos()),
            Self::Blackman => {
                0.42 - 0.5 * (2.0 * PI * i / m).cos() + 0.08 * (4.0 * PI * i / m).cos()
            }
            Self::BlackmanHarris => {
                0.35875 - 0.48829 * (2.0 * PI * i / m).cos() + 0.14128 * (4.0 * PI * i / m).cos()
                    - 0.01168 * (6.0 * PI * i / m).cos()
            }
        }
    }

    /// Generate a window of `size` coefficients.
    ///
    /// # Errors
    ///
    /// Returns a parameter error when `size < 2`, as every taper divides by
    /// `size - 1`, and when the coefficients do not sum to a positive value.
    /// The latter happens at `size == 2` for the tapers that vanish at both
    /// ends (Bartlett, Hann and Blackman), which need at least 3 points.
    pub fn generate(self, size: usize) -> SpectrogramResult<Window> {
        if size < 2 {
            return Err(ParameterError::out_of_range("fft_size", size, ">= 2").into());
        }

        let coefficients: Vec<f32> = (0..size).map(|i| self.coefficient(i, size)).collect();
        let sum: f32 = coefficients.iter().sum();
        if sum.is_nan() || sum <= 0.0 {
            return Err(ParameterError::out_of_range(
                "fft_size",
                size,
                format!(">= 3 for the {self} window"),
            )
            .into());
        }
        Ok(Window {
            window_type: self,
            coefficients,
            sum,
        })
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = ParameterError;

    /// Case-insensitive lookup by name. Unknown and empty names are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|window| window.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParameterError::invalid_value("fft_window", format!("unknown window '{s}'")))
    }
}

/// A generated taper and the sum of its coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    window_type: WindowType,
    coefficients: Vec<f32>,
    sum: f32,
}

impl Window {
    /// The window type this taper was generated from.
    pub const fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// The coefficients, one per FFT input sample.
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Sum of all coefficients, used to normalize the spectrum.
    pub const fn sum(&self) -> f32 {
        self.sum
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Always false for a generated window.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}
