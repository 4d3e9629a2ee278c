//! Capture metadata encoded in file names.
//!
//! Recording tools commonly name captures like `g001_433.92M_250k.cu8`: the
//! token suffixed with `M` is the center frequency in MHz and the token
//! suffixed with `k` is the sample rate in kHz.

use std::path::Path;

/// Sample rate assumed when the file name does not carry one.
pub const DEFAULT_SAMPLE_RATE: f64 = 250_000.0;

/// Center frequency and sample rate of a capture, in whole Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureMetadata {
    /// Tuner center frequency in Hz, `0` if unknown.
    pub center_frequency: f64,
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

impl Default for CaptureMetadata {
    fn default() -> Self {
        Self {
            center_frequency: 0.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl CaptureMetadata {
    /// Parse the metadata embedded in the base name of `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::parse(&path.as_ref().to_string_lossy())
    }

    /// Parse the metadata embedded in a file name.
    ///
    /// Everything up to the last `/` is ignored. At every separator
    /// (`_`, `-`, space or `.`) a decimal number is tried; a number followed
    /// by `M`/`m` and a separator (or the end) sets the center frequency, one
    /// followed by `k`/`K` and a separator sets the sample rate. Later tokens
    /// override earlier ones. Malformed tokens, and values too large to
    /// represent, are skipped.
    pub fn parse(name: &str) -> Self {
        let base = name.rfind('/').map_or(name, |slash| &name[slash + 1..]);
        let bytes = base.as_bytes();

        let mut center = 0.0_f64;
        let mut rate = 0.0_f64;

        let mut p = 0;
        while p < bytes.len() {
            if is_separator(bytes[p]) {
                p += 1;
                if let Some((value, len)) = parse_leading_f64(&bytes[p..]) {
                    let e = p + len;
                    let suffix = bytes.get(e).copied();
                    let terminated = bytes.get(e + 1).is_none_or(|&b| is_separator(b));
                    match suffix {
                        Some(b'M' | b'm') if terminated && (value * 1e6).is_finite() => {
                            p = e;
                            center = value * 1e6;
                        }
                        Some(b'k' | b'K') if terminated && (value * 1e3).is_finite() => {
                            p = e;
                            rate = value * 1e3;
                        }
                        _ => {}
                    }
                }
            }
            p += 1;
        }

        // Whole Hz, truncated toward zero.
        let metadata = Self {
            center_frequency: center.trunc(),
            sample_rate: if rate.trunc() != 0.0 {
                rate.trunc()
            } else {
                DEFAULT_SAMPLE_RATE
            },
        };
        tracing::debug!(
            name = base,
            center_frequency = metadata.center_frequency,
            sample_rate = metadata.sample_rate,
            "parsed capture metadata"
        );
        metadata
    }
}

const fn is_separator(b: u8) -> bool {
    matches!(b, b'_' | b'-' | b' ' | b'.')
}

/// Parse a decimal floating-point prefix of `bytes`.
///
/// Accepts leading whitespace, an optional sign, digits with an optional
/// fraction and an optional exponent. Returns the value and the number of
/// bytes consumed, or `None` when no digits were found.
fn parse_leading_f64(bytes: &[u8]) -> Option<(f64, usize)> {
    let mut i = 0;
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    let start = i;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_digits = count_digits(&bytes[i..]);
    i += int_digits;
    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        frac_digits = count_digits(&bytes[i + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = count_digits(&bytes[j..]);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }

    let text = std::str::from_utf8(&bytes[start..i]).ok()?;
    let value = text.parse::<f64>().ok()?;
    Some((value, i))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
