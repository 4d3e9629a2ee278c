//! Per-column FFT and conversion of spectral power to dBFS.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::decode::SampleBuffer;
use crate::error::{ParameterError, SpectrogramResult};
use crate::format::SampleFormat;
use crate::window::Window;

/// Lowest displayed level, standing in for negative infinity.
pub const SILENCE_FLOOR_DB: f32 = -99.9;

/// Linear power below which a bin is treated as silent.
pub const POWER_CUTOFF: f32 = 1e-20;

/// Default gain added to every level, in dB.
pub const DEFAULT_GAIN_DB: f32 = 6.0;

/// Display row of FFT bin `k` for an FFT of size `n`.
///
/// Zero frequency lands on row `n/2`; positive frequencies are drawn above
/// it and negative frequencies below, with the Nyquist bin on row 0.
pub const fn bin_to_row(k: usize, n: usize) -> usize {
    let half = n / 2;
    let row = if k <= half { half - k } else { half + n - k };
    if row < n { row } else { n - 1 }
}

/// Convert linear power to dBFS.
///
/// `offset_db` is the block normalization plus gain. Powers below
/// [`POWER_CUTOFF`], levels below [`SILENCE_FLOOR_DB`] and NaN all map to the
/// floor.
pub fn power_to_dbfs(power: f32, offset_db: f32) -> f32 {
    if power.is_nan() || power < POWER_CUTOFF {
        return SILENCE_FLOOR_DB;
    }
    let db = 5.0 * power.log10() + offset_db;
    if db >= SILENCE_FLOOR_DB {
        db
    } else {
        SILENCE_FLOOR_DB
    }
}

/// Level range seen in one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    /// Lowest level, never above 0 dBFS.
    pub min_db: f32,
    /// Highest level, `-200` before any bin was seen.
    pub max_db: f32,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            min_db: 0.0,
            max_db: -200.0,
        }
    }
}

impl ColumnStats {
    fn update(&mut self, db: f32) {
        if db < self.min_db {
            self.min_db = db;
        }
        if db > self.max_db {
            self.max_db = db;
        }
    }
}

/// Runs the forward FFT for each column and keeps the centered dBFS levels.
///
/// The plan, input buffer and scratch space are allocated once and reused
/// for every column.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    rows: Vec<f32>,
    offset_db: f32,
    gain_db: f32,
    totals: ColumnStats,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("fft_size", &self.buffer.len())
            .field("offset_db", &self.offset_db)
            .field("gain_db", &self.gain_db)
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Plan an FFT of `window.len()` points.
    ///
    /// # Errors
    ///
    /// A parameter error if the window sums to zero or less, which would make
    /// the block normalization undefined.
    pub fn new(window: &Window, gain_db: f32) -> SpectrogramResult<Self> {
        let size = window.len();
        let window_sum = window.sum();
        if window_sum.is_nan() || window_sum <= 0.0 {
            return Err(ParameterError::invalid_value(
                "fft_window",
                format!("window sum must be positive, got {window_sum}"),
            )
            .into());
        }

        let block_norm_db = 10.0 * (1.0 / window_sum).log10();
        tracing::debug!(size, window_sum, block_norm_db, "planned spectral analyzer");

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            rows: vec![SILENCE_FLOOR_DB; size],
            offset_db: block_norm_db + gain_db,
            gain_db,
            totals: ColumnStats {
                min_db: 0.0,
                max_db: SILENCE_FLOOR_DB,
            },
        })
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Gain added to every level.
    pub const fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Input buffer for the next column.
    pub fn input_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.buffer
    }

    /// Transform the input buffer and convert it to row-ordered dBFS levels.
    pub fn process(&mut self) -> ColumnStats {
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let n = self.buffer.len();
        let mut stats = ColumnStats::default();
        for (k, bin) in self.buffer.iter().enumerate() {
            let power = bin.norm_sqr() as f32;
            let db = power_to_dbfs(power, self.offset_db);
            self.rows[bin_to_row(k, n)] = db;
            stats.update(db);
        }

        self.totals.update(stats.min_db);
        self.totals.update(stats.max_db);
        stats
    }

    /// Decode the column at sample `offset` and analyze it.
    pub fn analyze_column(
        &mut self,
        samples: &SampleBuffer,
        format: SampleFormat,
        offset: usize,
        window: &Window,
    ) -> SpectrogramResult<ColumnStats> {
        samples.decode_column(format, offset, window, &mut self.buffer)?;
        Ok(self.process())
    }

    /// Levels of the last processed column, indexed by display row.
    pub fn rows(&self) -> &[f32] {
        &self.rows
    }

    /// Lowest level seen so far, starting from 0 dBFS.
    pub const fn min_db(&self) -> f32 {
        self.totals.min_db
    }

    /// Highest level seen so far, starting from the silence floor.
    pub const fn max_db(&self) -> f32 {
        self.totals.max_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowType;
    use std::f64::consts::PI;

    #[test]
    fn test_bin_to_row_is_bijective() {
        for n in [2, 5, 8, 64, 511, 512] {
            let mut seen = vec![false; n];
            for k in 0..n {
                let row = bin_to_row(k, n);
                assert!(row < n);
                assert!(!seen[row], "row {row} hit twice for n={n}");
                seen[row] = true;
            }
        }
        assert_eq!(bin_to_row(0, 8), 4);
        assert_eq!(bin_to_row(4, 8), 0);
        assert_eq!(bin_to_row(5, 8), 7);
        assert_eq!(bin_to_row(7, 8), 5);
    }

    #[test]
    fn test_silence_floor() {
        assert_eq!(power_to_dbfs(1e-21, 0.0), SILENCE_FLOOR_DB);
        assert_eq!(power_to_dbfs(0.0, 6.0), SILENCE_FLOOR_DB);
        assert_eq!(power_to_dbfs(f32::NAN, 6.0), SILENCE_FLOOR_DB);
        assert_eq!(power_to_dbfs(1e-10, -60.0), SILENCE_FLOOR_DB);
        assert_eq!(power_to_dbfs(1.0, 6.0), 6.0);
        assert!((power_to_dbfs(100.0, 0.0) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_pure_tone_lands_on_expected_row() {
        let n = 64;
        let sample_rate = 250_000.0;
        let tone = 31_250.0;
        let window = WindowType::BlackmanHarris.generate(n).unwrap();
        let mut analyzer = SpectralAnalyzer::new(&window, DEFAULT_GAIN_DB).unwrap();

        for (i, (slot, &w)) in analyzer
            .input_mut()
            .iter_mut()
            .zip(window.coefficients())
            .enumerate()
        {
            let phase = 2.0 * PI * tone * i as f64 / sample_rate;
            *slot = Complex::new(phase.cos(), phase.sin()) * f64::from(w);
        }
        let stats = analyzer.process();

        let rows = analyzer.rows();
        let peak = (0..n)
            .max_by(|&a, &b| rows[a].total_cmp(&rows[b]))
            .unwrap();
        let expected = n / 2 - (tone / sample_rate * n as f64) as usize;
        assert!(peak.abs_diff(expected) <= 1, "peak {peak}, expected {expected}");

        // A full-scale tone reads 0 dBFS before gain.
        assert!((stats.max_db - DEFAULT_GAIN_DB).abs() < 0.1);
        assert_eq!(analyzer.max_db(), stats.max_db);
    }

    #[test]
    fn test_silence_column() {
        let window = WindowType::Hann.generate(16).unwrap();
        let mut analyzer = SpectralAnalyzer::new(&window, DEFAULT_GAIN_DB).unwrap();
        let stats = analyzer.process();
        assert!(analyzer.rows().iter().all(|&db| db == SILENCE_FLOOR_DB));
        assert_eq!(stats.min_db, SILENCE_FLOOR_DB);
        assert_eq!(stats.max_db, SILENCE_FLOOR_DB);
        assert_eq!(analyzer.min_db(), SILENCE_FLOOR_DB);
    }

    #[test]
    fn test_analyze_column_decodes_first() {
        let window = WindowType::Rectangular.generate(4).unwrap();
        let mut analyzer = SpectralAnalyzer::new(&window, 0.0).unwrap();
        // Constant full-scale I, zero Q: all power in bin 0.
        let samples = SampleBuffer::from_bytes(vec![255, 127, 255, 127, 255, 127, 255, 127]);
        analyzer
            .analyze_column(&samples, SampleFormat::Cu8, 0, &window)
            .unwrap();
        let rows = analyzer.rows();
        assert!(rows[2] > -1.0, "dc row {}", rows[2]);

        assert!(
            analyzer
                .analyze_column(&samples, SampleFormat::Cu8, 1, &window)
                .is_err()
        );
    }
}
