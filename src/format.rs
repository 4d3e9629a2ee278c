//! Sample encodings of raw I/Q capture files.
//!
//! The encoding of a capture is never stored inside the file; it is derived
//! from the file name extension. The extension table is part of the public
//! contract, consumers relying on auto-detection must agree with it exactly.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Numeric kind of one I/Q component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Unsigned integer with a mid-scale bias.
    Unsigned,
    /// Two's complement signed integer.
    Signed,
    /// IEEE 754 floating point, already normalized.
    Float,
}

/// One of the 14 complex sample encodings.
///
/// Each variant describes one complex sample (an I and a Q component).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Two unsigned 4-bit nibbles in one byte.
    Cu4,
    /// Two signed 4-bit nibbles in one byte.
    Cs4,
    /// Two unsigned bytes, the rtl_sdr native format.
    #[default]
    Cu8,
    /// Two signed bytes.
    Cs8,
    /// Two unsigned 12-bit values packed in three bytes.
    Cu12,
    /// Two signed 12-bit values packed in three bytes.
    Cs12,
    /// Two unsigned little-endian 16-bit integers.
    Cu16,
    /// Two signed little-endian 16-bit integers.
    Cs16,
    /// Two unsigned little-endian 32-bit integers.
    Cu32,
    /// Two signed little-endian 32-bit integers.
    Cs32,
    /// Two unsigned little-endian 64-bit integers.
    Cu64,
    /// Two signed little-endian 64-bit integers.
    Cs64,
    /// Two little-endian `f32` values.
    Cf32,
    /// Two little-endian `f64` values.
    Cf64,
}

impl SampleFormat {
    /// Every supported format, in table order.
    pub const ALL: [Self; 14] = [
        Self::Cu4,
        Self::Cs4,
        Self::Cu8,
        Self::Cs8,
        Self::Cu12,
        Self::Cs12,
        Self::Cu16,
        Self::Cs16,
        Self::Cu32,
        Self::Cs32,
        Self::Cu64,
        Self::Cs64,
        Self::Cf32,
        Self::Cf64,
    ];

    /// Bytes occupied by one complex sample.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Cu4 | Self::Cs4 => 1,
            Self::Cu8 | Self::Cs8 => 2,
            Self::Cu12 | Self::Cs12 => 3,
            Self::Cu16 | Self::Cs16 => 4,
            Self::Cu32 | Self::Cs32 | Self::Cf32 => 8,
            Self::Cu64 | Self::Cs64 | Self::Cf64 => 16,
        }
    }

    /// Bit depth of a single component.
    pub const fn bits_per_component(self) -> u32 {
        match self {
            Self::Cu4 | Self::Cs4 => 4,
            Self::Cu8 | Self::Cs8 => 8,
            Self::Cu12 | Self::Cs12 => 12,
            Self::Cu16 | Self::Cs16 => 16,
            Self::Cu32 | Self::Cs32 | Self::Cf32 => 32,
            Self::Cu64 | Self::Cs64 | Self::Cf64 => 64,
        }
    }

    /// Numeric kind of a single component.
    pub const fn kind(self) -> SampleKind {
        match self {
            Self::Cu4 | Self::Cu8 | Self::Cu12 | Self::Cu16 | Self::Cu32 | Self::Cu64 => {
                SampleKind::Unsigned
            }
            Self::Cs4 | Self::Cs8 | Self::Cs12 | Self::Cs16 | Self::Cs32 | Self::Cs64 => {
                SampleKind::Signed
            }
            Self::Cf32 | Self::Cf64 => SampleKind::Float,
        }
    }

    /// Displayed dynamic range in dB when the user does not override it.
    ///
    /// Wider components can resolve weaker signals, so the displayed span grows
    /// with the bit depth.
    pub const fn default_db_range(self) -> f32 {
        match self.bits_per_component() {
            32 => 40.0,
            64 => 60.0,
            _ => 30.0,
        }
    }

    /// Lower-case name, identical to the canonical file extension.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cu4 => "cu4",
            Self::Cs4 => "cs4",
            Self::Cu8 => "cu8",
            Self::Cs8 => "cs8",
            Self::Cu12 => "cu12",
            Self::Cs12 => "cs12",
            Self::Cu16 => "cu16",
            Self::Cs16 => "cs16",
            Self::Cu32 => "cu32",
            Self::Cs32 => "cs32",
            Self::Cu64 => "cu64",
            Self::Cs64 => "cs64",
            Self::Cf32 => "cf32",
            Self::Cf64 => "cf64",
        }
    }

    /// Look up a file extension (without the leading dot).
    ///
    /// Matching is case-sensitive. Besides the canonical names the legacy
    /// aliases `data`, `complex16u`, `complex16s`, `cfile` and `complex`
    /// are recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext {
            "cu4" => Self::Cu4,
            "cs4" => Self::Cs4,
            "cu8" | "data" | "complex16u" => Self::Cu8,
            "cs8" | "complex16s" => Self::Cs8,
            "cu12" => Self::Cu12,
            "cs12" => Self::Cs12,
            "cu16" => Self::Cu16,
            "cs16" => Self::Cs16,
            "cu32" => Self::Cu32,
            "cs32" => Self::Cs32,
            "cu64" => Self::Cu64,
            "cs64" => Self::Cs64,
            "cf32" | "cfile" | "complex" => Self::Cf32,
            "cf64" => Self::Cf64,
            _ => return None,
        };
        Some(format)
    }

    /// Detect the format from the text after the last `.` of a path.
    ///
    /// Unknown or missing extensions fall back to [`SampleFormat::Cu8`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_string_lossy();
        let detected = path
            .rfind('.')
            .and_then(|dot| Self::from_extension(&path[dot + 1..]));

        match detected {
            Some(format) => {
                tracing::debug!(path = %path, format = %format, "detected sample format");
                format
            }
            None => {
                tracing::debug!(path = %path, "unknown extension, assuming cu8");
                Self::default()
            }
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ParameterError::invalid_value("sample_format", format!("unknown format '{s}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        let cases = [
            ("a.cu4", SampleFormat::Cu4),
            ("a.cs4", SampleFormat::Cs4),
            ("a.cu8", SampleFormat::Cu8),
            ("a.data", SampleFormat::Cu8),
            ("a.complex16u", SampleFormat::Cu8),
            ("a.cs8", SampleFormat::Cs8),
            ("a.complex16s", SampleFormat::Cs8),
            ("a.cu12", SampleFormat::Cu12),
            ("a.cs12", SampleFormat::Cs12),
            ("a.cu16", SampleFormat::Cu16),
            ("a.cs16", SampleFormat::Cs16),
            ("a.cu32", SampleFormat::Cu32),
            ("a.cs32", SampleFormat::Cs32),
            ("a.cu64", SampleFormat::Cu64),
            ("a.cs64", SampleFormat::Cs64),
            ("a.cf32", SampleFormat::Cf32),
            ("a.cfile", SampleFormat::Cf32),
            ("a.complex", SampleFormat::Cf32),
            ("a.cf64", SampleFormat::Cf64),
        ];
        for (path, expected) in cases {
            assert_eq!(SampleFormat::from_path(path), expected, "{path}");
        }
    }

    #[test]
    fn test_unknown_extension_falls_back_to_cu8() {
        assert_eq!(SampleFormat::from_path("capture"), SampleFormat::Cu8);
        assert_eq!(SampleFormat::from_path("capture.wav"), SampleFormat::Cu8);
        assert_eq!(SampleFormat::from_path("capture.CS16"), SampleFormat::Cu8);
        assert_eq!(SampleFormat::from_path(""), SampleFormat::Cu8);
    }

    #[test]
    fn test_last_dot_wins() {
        assert_eq!(
            SampleFormat::from_path("/tmp/dir.cs16/g001_433.92M_1000k.cf32"),
            SampleFormat::Cf32
        );
        // The last dot belongs to the directory, not the file.
        assert_eq!(
            SampleFormat::from_path("/tmp/dir.cs16/capture"),
            SampleFormat::Cu8
        );
    }

    #[test]
    fn test_sizes_and_ranges() {
        for format in SampleFormat::ALL {
            let bits = format.bits_per_component() as usize;
            assert_eq!(format.bytes_per_sample(), (2 * bits).div_ceil(8));
        }
        assert_eq!(SampleFormat::Cu8.default_db_range(), 30.0);
        assert_eq!(SampleFormat::Cs16.default_db_range(), 30.0);
        assert_eq!(SampleFormat::Cf32.default_db_range(), 40.0);
        assert_eq!(SampleFormat::Cs32.default_db_range(), 40.0);
        assert_eq!(SampleFormat::Cf64.default_db_range(), 60.0);
        assert_eq!(SampleFormat::Cu64.kind(), SampleKind::Unsigned);
        assert_eq!(SampleFormat::Cs12.kind(), SampleKind::Signed);
        assert_eq!(SampleFormat::Cf64.kind(), SampleKind::Float);
    }

    #[test]
    fn test_parse_and_display() {
        for format in SampleFormat::ALL {
            assert_eq!(format.to_string().parse::<SampleFormat>(), Ok(format));
        }
        assert_eq!("CS8".parse::<SampleFormat>(), Ok(SampleFormat::Cs8));
        assert!("cu7".parse::<SampleFormat>().is_err());
    }
}
