//! Tick placement and SI-prefixed labels for the plot axes and title.
//!
//! Everything here is pure layout: the functions return tick positions and
//! label strings, and the renderer draws them.

use crate::font::{GLYPH_HEIGHT, text_width};

/// A scale factor and its SI prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRange {
    /// Divisor applied to the value.
    pub scale: f64,
    /// SI prefix of the scaled unit.
    pub prefix: &'static str,
}

const fn range(scale: f64, prefix: &'static str) -> AutoRange {
    AutoRange { scale, prefix }
}

/// SI prefixes from yotta down to yocto.
pub const AUTORANGES: [AutoRange; 17] = [
    range(1e24, "Y"),
    range(1e21, "Z"),
    range(1e18, "E"),
    range(1e15, "P"),
    range(1e12, "T"),
    range(1e9, "G"),
    range(1e6, "M"),
    range(1e3, "k"),
    range(1e0, ""),
    range(1e-3, "m"),
    range(1e-6, "u"),
    range(1e-9, "n"),
    range(1e-12, "p"),
    range(1e-15, "f"),
    range(1e-18, "a"),
    range(1e-21, "z"),
    range(1e-24, "y"),
];

const UNSCALED: AutoRange = AUTORANGES[8];
const AUTOSTEPS: [f64; 4] = [0.1, 0.2, 0.5, 1.0];

/// Pick a "nice" tick step so that at most `max_ticks` ticks cover `range`.
///
/// The step is 1, 2 or 5 times a power of ten. Non-positive or non-finite
/// ranges yield a step of 1.
pub fn autostep(range: f64, max_ticks: i32) -> f64 {
    if !range.is_finite() || range <= 0.0 {
        return 1.0;
    }
    // Truncated toward zero, not floored.
    let magnitude = range.log10() as i32;
    let scale = 10f64.powi(magnitude);
    let norm = range / scale;
    AUTOSTEPS
        .iter()
        .find(|&&step| f64::from(max_ticks + 1) * step > norm)
        .map_or(scale, |step| step * scale)
}

/// Largest SI prefix such that `value / min_int` is at least one unit.
///
/// A `value` of zero is unscaled and a `min_int` of zero means 10.
pub fn autorange(value: f64, min_int: f64) -> AutoRange {
    if value == 0.0 {
        return UNSCALED;
    }
    let min_int = if min_int == 0.0 { 10.0 } else { min_int };
    let value = value / min_int;
    AUTORANGES
        .iter()
        .find(|entry| value >= entry.scale)
        .copied()
        .unwrap_or(AUTORANGES[AUTORANGES.len() - 1])
}

/// Format like C's `%g`: six significant digits, trailing zeros removed,
/// exponent notation below `1e-4` and from `1e6` on.
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            strip_trailing_zeros(mantissa),
            exponent.abs()
        )
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        strip_trailing_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn strip_trailing_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// A labeled tick on the dBFS legend.
#[derive(Debug, Clone, PartialEq)]
pub struct DbTick {
    /// Level below full scale, including the gain.
    pub db: f32,
    /// Row the level corresponds to.
    pub y: i32,
    /// Top row of the label.
    pub label_y: i32,
    /// Label text, e.g. `-36`.
    pub label: String,
}

/// Ticks for the dBFS legend next to the color ramp.
///
/// About one label every 50 rows, steps rounded to multiples of 3 dB, the
/// last tick snapped to the bottom of the range. Never more than `height`
/// ticks.
pub fn db_ticks(gain: f32, db_range: f32, top: i32, height: i32) -> Vec<DbTick> {
    let markers = (height / 50) as f32;
    let step = ((gain + db_range) / markers / 3.0).round() * 3.0;
    // Fewer than one marker leaves a single tick at the bottom.
    let step = if step.is_finite() { step.max(1.0) } else { f32::MAX };
    let limit = usize::try_from(height).unwrap_or(0).max(1);

    snapped_steps(db_range, step, step, limit)
        .into_iter()
        .map(|offset| {
            let d = gain + offset;
            let y = (top as f32 + height as f32 * offset / db_range) as i32;
            let label_y = if offset <= 0.0 {
                y + GLYPH_HEIGHT / 2
            } else if offset >= db_range {
                y - GLYPH_HEIGHT
            } else {
                y - GLYPH_HEIGHT / 2
            };
            DbTick {
                db: d,
                y,
                label_y,
                label: format!("{:.0}", -d),
            }
        })
        .collect()
}

/// A major tick on the frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTick {
    /// Row of the tick.
    pub y: i32,
    /// Frequency at the tick, in Hz.
    pub frequency: f64,
    /// Scaled, right-aligned label.
    pub label: String,
}

/// Layout of the vertical frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    /// Unit caption, e.g. `f[MHz]`.
    pub unit_label: String,
    /// Scale shared by all labels.
    pub scale: AutoRange,
    /// Rows of the unlabeled minor ticks.
    pub minor_ticks: Vec<i32>,
    /// Labeled major ticks, symmetric around the center row.
    pub ticks: Vec<FrequencyTick>,
}

/// Frequency ticks for a plot of `height` rows spanning `sample_rate` Hz
/// around `center_frequency`.
///
/// Labels are absolute frequencies (`%8.3f`) when the center is known and
/// signed offsets (`%+8.2f`) otherwise.
pub fn frequency_axis(center_frequency: f64, sample_rate: f64, top: i32, height: i32) -> FrequencyAxis {
    const MIN_SPACING: i32 = 16;
    // Whole Hz throughout, as rates are integral.
    let center = center_frequency.trunc();
    let half_rate = (sample_rate / 2.0).trunc();

    let max_ticks = height / 2 / MIN_SPACING;
    let step = autostep(half_rate, max_ticks);
    // No more ticks per side than fit at the minimum spacing.
    let step_count = ((0.5 + half_rate / step) as i64 - 1).min(i64::from(max_ticks.max(0)));

    let scale = autorange(center + sample_rate, 10.0);
    let minor_ticks = (8..height).step_by(8).map(|j| top + j).collect();

    let pixel_per_hz = f64::from(height / 2) / half_rate;
    let ticks = (-step_count..=step_count)
        .map(|j| {
            let offset = j as f64 * step;
            let y = (f64::from(top + height / 2) - offset * pixel_per_hz) as i32;
            let frequency = center + offset;
            let scaled = frequency / scale.scale;
            let label = if center != 0.0 {
                format!("{scaled:8.3}")
            } else {
                format!("{scaled:+8.2}")
            };
            FrequencyTick {
                y,
                frequency,
                label,
            }
        })
        .collect();

    FrequencyAxis {
        unit_label: format!("f[{}Hz]", scale.prefix),
        scale,
        minor_ticks,
        ticks,
    }
}

/// A major tick on the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTick {
    /// Column of the tick.
    pub x: i32,
    /// Left edge of the label; the last label ends at its tick.
    pub label_x: i32,
    /// Label text, e.g. `250ms`.
    pub label: String,
}

/// Layout of the horizontal time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    /// Unit caption, e.g. `t[ms]`.
    pub unit_label: String,
    /// Scale shared by all labels.
    pub scale: AutoRange,
    /// Columns of the unlabeled minor ticks.
    pub minor_ticks: Vec<i32>,
    /// Labeled major ticks.
    pub ticks: Vec<TimeTick>,
}

/// Time ticks for `width` columns covering `duration` seconds.
///
/// Labels start at `start` seconds. About one label every 85 columns, steps
/// rounded to multiples of 5 units with minor ticks at a fifth of the step;
/// the last tick is snapped to the right edge.
pub fn time_axis(duration: f32, start: f32, left: i32, width: i32) -> TimeAxis {
    let scale = autorange(f64::from(duration), 10.0);
    let unit_label = format!("t[{}s]", scale.prefix);
    let total = (f64::from(duration) / scale.scale) as f32;
    let origin = (f64::from(start) / scale.scale) as f32;

    let mut axis = TimeAxis {
        unit_label,
        scale,
        minor_ticks: Vec::new(),
        ticks: Vec::new(),
    };
    if !total.is_finite() || total <= 0.0 {
        return axis;
    }

    let markers = (width / 85) as f32;
    let mut step = (total / markers / 5.0).round() * 5.0;
    if step < 1.0 {
        step = 1.0;
    }
    let pixels_per_unit = width as f32 / total;
    let column = |t: f32| left + (t * pixels_per_unit) as i32;
    let limit = usize::try_from(width).unwrap_or(0).max(1);

    for t in snapped_steps(total, step / 5.0, step, limit) {
        axis.minor_ticks.push(column(t));
    }
    for t in snapped_steps(total, step, step, limit) {
        let x = column(t);
        let label = format!("{:.0}{}s", origin + t, scale.prefix);
        let label_x = if t >= total {
            x - text_width(&label)
        } else {
            x + 3
        };
        axis.ticks.push(TimeTick { x, label_x, label });
    }
    axis
}

/// `0, increment, 2*increment, ..` below `total`, at most `limit` of them,
/// where a value within `snap` of the end is replaced by `total` itself.
fn snapped_steps(total: f32, increment: f32, snap: f32, limit: usize) -> Vec<f32> {
    let mut steps = Vec::new();
    for i in 0..limit {
        let t = i as f32 * increment;
        if t >= total {
            break;
        }
        if t >= total - snap {
            steps.push(total);
            break;
        }
        steps.push(t);
    }
    steps
}

/// Plot title: center frequency, sample rate, level range, decimation and
/// FFT size, each scaled on its own.
///
/// ```
/// use iq_spectrogram::axis::title;
/// assert_eq!(
///     title(433_920_000.0, 250_000.0, 30.0, 6.0, 1, 512),
///     "433.92MHz @250kHz -30+6dBFS /1 :512"
/// );
/// ```
pub fn title(
    center_frequency: f64,
    sample_rate: f64,
    db_range: f32,
    gain: f32,
    decimation: u32,
    fft_size: usize,
) -> String {
    let base = autorange(center_frequency, 10.0);
    let rate = autorange(sample_rate, 10.0);
    format!(
        "{}{}Hz @{:.0}{}Hz -{}+{}dBFS /{} :{}",
        format_g(center_frequency / base.scale),
        base.prefix,
        sample_rate / rate.scale,
        rate.prefix,
        format_g(f64::from(db_range)),
        format_g(f64::from(gain)),
        decimation,
        fft_size
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autorange() {
        assert_eq!(autorange(0.0, 10.0).prefix, "");
        assert_eq!(autorange(0.0, 0.0).scale, 1.0);
        // At least ten whole units: 1.5 GHz reads as 1500 MHz.
        assert_eq!(autorange(1.5e9, 10.0).prefix, "M");
        assert_eq!(autorange(1.5e9, 10.0).scale, 1e6);
        assert_eq!(autorange(1.5e9, 1.0).prefix, "G");
        assert_eq!(autorange(1.5e10, 10.0).prefix, "G");
        assert_eq!(autorange(250_000.0, 10.0).prefix, "k");
        assert_eq!(autorange(9_999.0, 10.0).prefix, "");
        assert_eq!(autorange(0.5, 10.0).prefix, "m");
        assert_eq!(autorange(1e6, 0.0).prefix, "k");
        assert_eq!(autorange(1e-40, 10.0).prefix, "y");
        assert_eq!(autorange(-5.0, 10.0).prefix, "y");
    }

    #[test]
    fn test_autostep() {
        assert_eq!(autostep(125_000.0, 8), 20_000.0);
        assert_eq!(autostep(125_000.0, 16), 10_000.0);
        assert_eq!(autostep(1_000_000.0, 4), 500_000.0);
        assert_eq!(autostep(9.0, 0), 1.0);
        assert_eq!(autostep(0.0, 4), 1.0);
        assert_eq!(autostep(f64::NAN, 4), 1.0);
    }

    #[test]
    fn test_format_g() {
        assert_eq!(format_g(433.92), "433.92");
        assert_eq!(format_g(30.0), "30");
        assert_eq!(format_g(6.5), "6.5");
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1e6), "1e+06");
        assert_eq!(format_g(123_456_789.0), "1.23457e+08");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001234), "1.234e-05");
        assert_eq!(format_g(-2.5), "-2.5");
        assert_eq!(format_g(999_999.5), "1e+06");
    }

    #[test]
    fn test_db_ticks() {
        let ticks = db_ticks(6.0, 30.0, 16, 512);
        // 10 markers: (36 / 10 / 3).round() * 3 = 3 dB steps.
        assert_eq!(ticks.first().map(|t| t.label.as_str()), Some("-6"));
        assert_eq!(ticks.last().map(|t| t.label.as_str()), Some("-36"));
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks[0].y, 16);
        assert_eq!(ticks[0].label_y, 16 + GLYPH_HEIGHT / 2);
        let last = &ticks[ticks.len() - 1];
        assert_eq!(last.y, 16 + 512);
        assert_eq!(last.label_y, last.y - GLYPH_HEIGHT);
        assert!(ticks.windows(2).all(|w| w[0].y < w[1].y));
    }

    #[test]
    fn test_db_ticks_short_plot() {
        // Fewer than 50 rows: only the bottom label remains.
        let ticks = db_ticks(6.0, 30.0, 0, 32);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].label, "-36");
    }

    #[test]
    fn test_db_ticks_extreme_gain() {
        let ticks = db_ticks(-1e8, 30.0, 0, 512);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 512);
        assert_eq!(ticks.last().map(|t| t.y), Some(512));

        let ticks = db_ticks(1e8, 30.0, 0, 512);
        assert!(ticks.len() <= 512);
    }

    #[test]
    fn test_frequency_axis_oversized_metadata() {
        let axis = frequency_axis(1e19, 250_000.0, 16, 512);
        assert_eq!(axis.unit_label, "f[EHz]");
        assert_eq!(axis.ticks.len(), 25);

        let axis = frequency_axis(1e300, f64::INFINITY, 16, 512);
        assert!(axis.ticks.len() <= 2 * 16 + 1);

        let axis = frequency_axis(-1e19, 1.0, 0, 64);
        assert!(axis.ticks.len() <= 5);
    }

    #[test]
    fn test_frequency_axis_with_center() {
        let axis = frequency_axis(433_920_000.0, 250_000.0, 16, 512);
        assert_eq!(axis.unit_label, "f[MHz]");
        // 125 kHz half band, 16 ticks max: 10 kHz steps, 12 each side.
        assert_eq!(axis.ticks.len(), 25);
        let center = &axis.ticks[12];
        assert_eq!(center.y, 16 + 256);
        assert_eq!(center.label, " 433.920");
        assert_eq!(axis.ticks[0].frequency, 433_800_000.0);
        assert!(axis.ticks.windows(2).all(|w| w[0].y > w[1].y));
        assert_eq!(axis.minor_ticks.first(), Some(&24));
        assert_eq!(axis.minor_ticks.len(), 63);
    }

    #[test]
    fn test_frequency_axis_without_center() {
        let axis = frequency_axis(0.0, 250_000.0, 0, 64);
        assert_eq!(axis.unit_label, "f[kHz]");
        // 2 ticks max: 50 kHz steps.
        let labels: Vec<_> = axis.ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            [" -100.00", "  -50.00", "   +0.00", "  +50.00", " +100.00"]
        );
    }

    #[test]
    fn test_time_axis() {
        // 1 second, 1024 columns: 12 markers, scaled to 1000 ms.
        let axis = time_axis(1.0, 0.0, 60, 1024);
        assert_eq!(axis.unit_label, "t[ms]");
        assert_eq!(axis.ticks.first().map(|t| t.label.as_str()), Some("0ms"));
        let last = axis.ticks.last().unwrap();
        assert_eq!(last.label, "1000ms");
        assert_eq!(last.x, 60 + 1024);
        assert_eq!(last.label_x, last.x - 36);
        assert!(axis.minor_ticks.len() > axis.ticks.len());
        assert!(axis.ticks.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn test_time_axis_offset_labels() {
        let axis = time_axis(1.0, 2.0, 0, 1024);
        assert_eq!(axis.ticks[0].label, "2000ms");
    }

    #[test]
    fn test_time_axis_degenerate() {
        let axis = time_axis(0.0, 0.0, 0, 1024);
        assert!(axis.ticks.is_empty());
        assert!(axis.minor_ticks.is_empty());
    }

    #[test]
    fn test_title() {
        assert_eq!(
            title(0.0, 2_048_000.0, 40.0, 6.0, 1, 256),
            "0Hz @2048kHz -40+6dBFS /1 :256"
        );
        assert_eq!(
            title(868_300_000.0, 1_000_000.0, 60.0, 6.0, 1, 1024),
            "868.3MHz @1000kHz -60+6dBFS /1 :1024"
        );
    }
}
