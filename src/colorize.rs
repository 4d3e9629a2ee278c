//! Mapping of dBFS levels to palette indices, with level histograms.

use crate::spectral::SILENCE_FLOOR_DB;

/// Highest palette index.
pub const COLOR_MAX: usize = 255;

/// Number of 0.1 dB buckets between 0 dB and the silence floor.
pub const DB_HIST_SIZE: usize = (-10.0 * SILENCE_FLOOR_DB + 1.0) as usize;

/// Counts of palette indices and of 0.1 dB level buckets over a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histograms {
    color: Vec<u64>,
    db: Vec<u64>,
}

impl Default for Histograms {
    fn default() -> Self {
        Self {
            color: vec![0; COLOR_MAX + 1],
            db: vec![0; DB_HIST_SIZE],
        }
    }
}

impl Histograms {
    /// Empty histograms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one cell.
    pub fn record(&mut self, color_index: usize, db_bucket: usize) {
        self.color[color_index.min(COLOR_MAX)] += 1;
        self.db[db_bucket.min(DB_HIST_SIZE - 1)] += 1;
    }

    /// Counts per palette index.
    pub fn color(&self) -> &[u64] {
        &self.color
    }

    /// Counts per 0.1 dB bucket below the gain.
    pub fn db(&self) -> &[u64] {
        &self.db
    }

    /// Largest palette index count.
    pub fn color_peak(&self) -> u64 {
        self.color.iter().copied().max().unwrap_or(0)
    }

    /// Largest level bucket count.
    pub fn db_peak(&self) -> u64 {
        self.db.iter().copied().max().unwrap_or(0)
    }

    /// Number of recorded cells.
    pub fn total(&self) -> u64 {
        self.color.iter().sum()
    }

    /// Mean count per level bucket.
    pub fn db_mean(&self) -> f64 {
        self.db.iter().sum::<u64>() as f64 / DB_HIST_SIZE as f64
    }
}

/// Maps levels to palette indices for a fixed gain and displayed range.
///
/// Levels are dBFS with the gain already applied. Levels at or above 0 dBFS
/// map to [`COLOR_MAX`]; `-db_range` and below map to 0. The gain only shifts
/// the 0.1 dB histogram buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colorizer {
    color_norm: f32,
    gain_db: f32,
    db_range: f32,
}

impl Colorizer {
    /// Colorizer for levels offset by `gain_db`, spanning `db_range` dB.
    ///
    /// `db_range` must be non-zero; callers validate it up front.
    pub fn new(gain_db: f32, db_range: f32) -> Self {
        Self {
            color_norm: COLOR_MAX as f32 / -db_range,
            gain_db,
            db_range,
        }
    }

    /// Gain in dB.
    pub const fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Displayed range in dB.
    pub const fn db_range(&self) -> f32 {
        self.db_range
    }

    /// Palette index for `db`, always within `0..=COLOR_MAX`.
    ///
    /// NaN is treated as the silence floor; infinities saturate.
    pub fn color_index(&self, db: f32) -> usize {
        let db = if db.is_nan() { SILENCE_FLOOR_DB } else { db };
        let level = (0.5 + db * self.color_norm).clamp(0.0, COLOR_MAX as f32);
        COLOR_MAX - level as usize
    }

    /// Histogram bucket for `db`, in 0.1 dB steps below the gain.
    pub fn db_bucket(&self, db: f32) -> usize {
        let db = if db.is_nan() { SILENCE_FLOOR_DB } else { db };
        let bucket = (0.5 + (db - self.gain_db) * -10.0).clamp(0.0, (DB_HIST_SIZE - 1) as f32);
        bucket as usize
    }

    /// Palette index for `db`, recording the cell in `histograms`.
    pub fn colorize(&self, db: f32, histograms: &mut Histograms) -> usize {
        let index = self.color_index(db);
        histograms.record(index, self.db_bucket(db));
        index
    }
}
