//! Raw capture bytes and per-format sample decoding.
//!
//! A [`SampleBuffer`] is a read-only byte view over a whole capture, either
//! memory-mapped from disk or owned in memory. Decoding happens one FFT
//! column at a time: [`SampleBuffer::decode_column`] validates the requested
//! sample range against the buffer, decodes every complex sample into the
//! normalized `[-1, 1)` range and multiplies it by the window.

use std::fs::File;
use std::path::Path;

use bytemuck::Pod;
use memmap2::Mmap;
use num_complex::Complex;
use num_traits::{AsPrimitive, PrimInt};

use crate::error::{DecodeError, ParameterError, SpectrogramError, SpectrogramResult};
use crate::format::SampleFormat;
use crate::window::Window;

const CU8_BIAS: f32 = 127.5;
const NIBBLE_SCALE: f32 = 7.5;

enum Storage {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// Read-only view over the bytes of a capture.
///
/// The mapping is released when the buffer is dropped.
pub struct SampleBuffer {
    storage: Storage,
}

impl std::fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.storage {
            Storage::Mapped(_) => "mapped",
            Storage::Owned(_) => "owned",
        };
        f.debug_struct("SampleBuffer")
            .field("storage", &kind)
            .field("len", &self.len())
            .finish()
    }
}

impl SampleBuffer {
    /// Memory-map the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> SpectrogramResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SpectrogramError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let len = file
            .metadata()
            .map_err(|source| SpectrogramError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        if len == 0 {
            return Ok(Self::from_bytes(Vec::new()));
        }

        // SAFETY: the map is read-only and private to this buffer. Captures
        // are not expected to be truncated while being rendered.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| SpectrogramError::Map {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = map.len(), "mapped capture");

        Ok(Self {
            storage: Storage::Mapped(map),
        })
    }

    /// Wrap bytes that are already in memory.
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            storage: Storage::Owned(bytes),
        }
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Mapped(map) => map,
            Storage::Owned(bytes) => bytes,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True if the capture holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Number of whole complex samples of `format` in the buffer.
    ///
    /// Trailing bytes that do not form a whole sample are ignored.
    pub fn sample_count(&self, format: SampleFormat) -> usize {
        let bps = format.bytes_per_sample();
        let trailing = self.len() % bps;
        if trailing != 0 {
            tracing::warn!(
                format = %format,
                trailing,
                "capture length is not a multiple of the sample size"
            );
        }
        self.len() / bps
    }

    /// Decode `window.len()` samples starting at sample `offset` into `out`.
    ///
    /// `out[k] = window[k] * sample(offset + k)` with each component
    /// normalized to full scale. Arithmetic is single precision except for
    /// [`SampleFormat::Cf64`].
    ///
    /// # Errors
    ///
    /// [`DecodeError::LengthMismatch`] if `out` and `window` differ in length,
    /// [`DecodeError::OutOfBounds`] if the sample range is not fully inside the
    /// buffer. Nothing is read in either case.
    pub fn decode_column(
        &self,
        format: SampleFormat,
        offset: usize,
        window: &Window,
        out: &mut [Complex<f64>],
    ) -> Result<(), DecodeError> {
        let n = window.len();
        if out.len() != n {
            return Err(DecodeError::LengthMismatch {
                expected: n,
                actual: out.len(),
            });
        }

        let bps = format.bytes_per_sample();
        let available = self.len() / bps;
        let out_of_bounds = DecodeError::OutOfBounds {
            start: offset,
            end: offset.saturating_add(n),
            available,
        };
        let end = offset.checked_add(n).ok_or_else(|| out_of_bounds.clone())?;
        if end > available {
            return Err(out_of_bounds);
        }
        let bytes = self
            .as_bytes()
            .get(offset * bps..end * bps)
            .ok_or(out_of_bounds)?;

        let coefficients = window.coefficients();
        match format {
            SampleFormat::Cu4 => fill(out, coefficients, bytes, bps, |s| {
                (
                    f32::from(s[0] >> 4) / NIBBLE_SCALE - 1.0,
                    f32::from(s[0] & 0x0f) / NIBBLE_SCALE - 1.0,
                )
            }),
            SampleFormat::Cs4 => fill(out, coefficients, bytes, bps, |s| {
                (
                    signed((s[0] & 0xf0) as i8, 7),
                    signed(((s[0] & 0x0f) << 4) as i8, 7),
                )
            }),
            SampleFormat::Cu8 => fill(out, coefficients, bytes, bps, |s| {
                (
                    (f32::from(s[0]) - CU8_BIAS) / CU8_BIAS,
                    (f32::from(s[1]) - CU8_BIAS) / CU8_BIAS,
                )
            }),
            SampleFormat::Cs8 => fill(out, coefficients, bytes, bps, |s| {
                (signed(s[0] as i8, 7), signed(s[1] as i8, 7))
            }),
            SampleFormat::Cu12 => fill(out, coefficients, bytes, bps, |s| {
                let (i, q) = unpack_12bit(s);
                (unsigned(i, 15), unsigned(q, 15))
            }),
            SampleFormat::Cs12 => fill(out, coefficients, bytes, bps, |s| {
                let (i, q) = unpack_12bit(s);
                (signed(i as i16, 15), signed(q as i16, 15))
            }),
            SampleFormat::Cu16 => fill(out, coefficients, bytes, bps, |s| {
                (unsigned(read_le::<u16>(s), 15), unsigned(read_le::<u16>(&s[2..]), 15))
            }),
            SampleFormat::Cs16 => fill(out, coefficients, bytes, bps, |s| {
                (signed(read_le::<i16>(s), 15), signed(read_le::<i16>(&s[2..]), 15))
            }),
            SampleFormat::Cu32 => fill(out, coefficients, bytes, bps, |s| {
                (unsigned(read_le::<u32>(s), 31), unsigned(read_le::<u32>(&s[4..]), 31))
            }),
            SampleFormat::Cs32 => fill(out, coefficients, bytes, bps, |s| {
                (signed(read_le::<i32>(s), 31), signed(read_le::<i32>(&s[4..]), 31))
            }),
            SampleFormat::Cu64 => fill(out, coefficients, bytes, bps, |s| {
                (unsigned(read_le::<u64>(s), 63), unsigned(read_le::<u64>(&s[8..]), 63))
            }),
            SampleFormat::Cs64 => fill(out, coefficients, bytes, bps, |s| {
                (signed(read_le::<i64>(s), 63), signed(read_le::<i64>(&s[8..]), 63))
            }),
            SampleFormat::Cf32 => fill(out, coefficients, bytes, bps, |s| {
                (
                    f32::from_bits(read_le::<u32>(s)),
                    f32::from_bits(read_le::<u32>(&s[4..])),
                )
            }),
            SampleFormat::Cf64 => {
                for ((slot, &w), s) in out.iter_mut().zip(coefficients).zip(bytes.chunks_exact(bps)) {
                    let w = f64::from(w);
                    *slot = Complex::new(
                        w * f64::from_bits(read_le::<u64>(s)),
                        w * f64::from_bits(read_le::<u64>(&s[8..])),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Decode every sample of `bytes` in single precision and apply the window.
fn fill<F>(out: &mut [Complex<f64>], coefficients: &[f32], bytes: &[u8], bps: usize, decode: F)
where
    F: Fn(&[u8]) -> (f32, f32),
{
    for ((slot, &w), sample) in out.iter_mut().zip(coefficients).zip(bytes.chunks_exact(bps)) {
        let (i, q) = decode(sample);
        *slot = Complex::new(f64::from(w * i), f64::from(w * q));
    }
}

/// Read a little-endian integer from the front of `bytes`.
fn read_le<T: PrimInt + Pod>(bytes: &[u8]) -> T {
    T::from_le(bytemuck::pod_read_unaligned(&bytes[..size_of::<T>()]))
}

/// Two 12-bit components packed as `iiqIQQ`, each MSB aligned into 16 bits.
fn unpack_12bit(s: &[u8]) -> (u16, u16) {
    let (b0, b1, b2) = (u16::from(s[0]), u16::from(s[1]), u16::from(s[2]));
    ((b1 << 12) | (b0 << 4), (b2 << 8) | (b1 & 0xf0))
}

/// Unsigned integer to `[-1, 1)` around the mid-scale bias `2^scale_bits`.
fn unsigned<T: AsPrimitive<f32>>(value: T, scale_bits: i32) -> f32 {
    value.as_() / 2f32.powi(scale_bits) - 1.0
}

/// Signed integer to `[-1, 1)` with full scale `2^scale_bits`.
fn signed<T: AsPrimitive<f32>>(value: T, scale_bits: i32) -> f32 {
    value.as_() / 2f32.powi(scale_bits)
}

/// Sample offsets of the output columns.
///
/// Columns are spread evenly over `span` samples starting at `start`; the
/// offset of the last column is clamped so that a full FFT window always fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnLayout {
    start: usize,
    span: usize,
    fft_size: usize,
    columns: usize,
    stride: f64,
}

impl ColumnLayout {
    /// Lay out `columns` FFT windows of `fft_size` samples over a capture of
    /// `sample_count` samples.
    ///
    /// `origin` skips samples at the start of the capture and `zoom` shrinks
    /// the visible span to `1/zoom` of what remains.
    ///
    /// # Errors
    ///
    /// A parameter error if `columns < 2`, `zoom == 0` or `origin` lies past
    /// the end of the capture; [`DecodeError::InsufficientSamples`] if fewer
    /// than `fft_size` samples are visible.
    pub fn new(
        sample_count: usize,
        fft_size: usize,
        columns: usize,
        origin: usize,
        zoom: usize,
    ) -> SpectrogramResult<Self> {
        if columns < 2 {
            return Err(ParameterError::out_of_range("width", columns, ">= 2").into());
        }
        if zoom == 0 {
            return Err(ParameterError::out_of_range("zoom", zoom, ">= 1").into());
        }
        if origin > 0 && origin >= sample_count {
            return Err(ParameterError::out_of_range(
                "origin",
                origin,
                format!("< {sample_count} samples"),
            )
            .into());
        }

        let remaining = sample_count - origin;
        let span = (remaining / zoom).max(fft_size.min(remaining));
        if span < fft_size {
            return Err(DecodeError::InsufficientSamples {
                needed: fft_size,
                available: span,
            }
            .into());
        }

        let stride = (span - fft_size) as f64 / (columns - 1) as f64;
        tracing::debug!(start = origin, span, columns, stride, "column layout");

        Ok(Self {
            start: origin,
            span,
            fft_size,
            columns,
            stride,
        })
    }

    /// First sample of column `x`.
    pub fn offset(&self, x: usize) -> usize {
        let step = (x as f64 * self.stride).floor() as usize;
        self.start + step.min(self.span - self.fft_size)
    }

    /// Fractional sample advance between adjacent columns.
    pub const fn stride(&self) -> f64 {
        self.stride
    }

    /// Number of columns.
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// First visible sample.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Number of visible samples.
    pub const fn span(&self) -> usize {
        self.span
    }
}
