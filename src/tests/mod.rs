//! End-to-end renders of captures written to disk.

use std::f64::consts::PI;
use std::io::Write;
use std::path::{Path, PathBuf};

use approx_eq::assert_approx_eq;

use crate::colorize::COLOR_MAX;
use crate::spectral::bin_to_row;
use crate::{
    Canvas, Colormap, LayoutDirection, PixelCanvas, SampleFormat, Spectrogram, SpectrogramConfig,
    SpectrogramError,
};

fn write_capture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

/// `samples` CU8 samples of a complex tone at `frequency` Hz.
fn tone_cu8(samples: usize, frequency: f64, sample_rate: f64) -> Vec<u8> {
    (0..samples)
        .flat_map(|n| {
            let phase = 2.0 * PI * frequency * n as f64 / sample_rate;
            let i = 127.5 + 100.0 * phase.cos();
            let q = 127.5 + 100.0 * phase.sin();
            [i.round() as u8, q.round() as u8]
        })
        .collect()
}

#[test]
fn test_named_capture_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_capture(
        dir.path(),
        "capture_433.920M_250k.cu8",
        &tone_cu8(32_768, 10_000.0, 250_000.0),
    );

    let mut spectrogram = Spectrogram::open(&path).unwrap();
    assert_eq!(spectrogram.format(), SampleFormat::Cu8);
    assert_eq!(spectrogram.metadata().center_frequency, 433_920_000.0);
    assert_eq!(spectrogram.metadata().sample_rate, 250_000.0);

    spectrogram.set_layout_size(512, 128);
    assert!(spectrogram.decorations());
    let (width, height) = spectrogram.canvas_size();
    let rendering = spectrogram.render().unwrap();
    assert_eq!(rendering.canvas.width(), width);
    assert_eq!(rendering.canvas.height(), height);
    assert_eq!(width, 60 + 512 + 40 + 100);

    let histograms = &rendering.stats.histograms;
    assert_eq!(histograms.color().len(), COLOR_MAX + 1);
    assert_eq!(histograms.total(), 512 * 128);
    assert_eq!(histograms.db().iter().sum::<u64>(), 512 * 128);
    assert!(rendering.stats.max_db > rendering.stats.min_db);
}

#[test]
fn test_tone_lands_on_expected_row() {
    let fft_size = 64;
    let sample_rate = 250_000.0;
    // Bin 8 of 64.
    let frequency = 8.0 * sample_rate / fft_size as f64;
    let mut spectrogram = Spectrogram::from_bytes(
        "tone_250k.cu8",
        tone_cu8(8192, frequency, sample_rate),
    );
    spectrogram.set_layout_size(16, fft_size as u32);
    spectrogram.set_colormap(Colormap::Gray);
    // Keep the main lobe below full scale so its peak does not saturate.
    spectrogram.set_db_gain(-6.0);

    let rendering = spectrogram.render().unwrap();
    let expected_row = bin_to_row(8, fft_size) as i32;
    for x in 0..16 {
        let loudest = (0..fft_size as i32)
            .max_by_key(|&y| rendering.canvas.pixel(x, y).map_or(0, |p| p.r))
            .unwrap();
        assert!(
            (loudest - expected_row).abs() <= 1,
            "column {x}: loudest row {loudest}, expected {expected_row}"
        );
    }
}

#[test]
fn test_full_scale_tone_reaches_gain() {
    let mut spectrogram = Spectrogram::from_bytes(
        "tone.cf32",
        (0..4096)
            .flat_map(|n| {
                let phase = 2.0 * PI * 4.0 * f64::from(n) / 64.0;
                [phase.cos() as f32, phase.sin() as f32]
            })
            .flat_map(f32::to_le_bytes)
            .collect(),
    );
    spectrogram.set_layout_size(8, 64);
    spectrogram.set_window_type(crate::WindowType::Rectangular);
    let stats = spectrogram.render().unwrap().stats;
    // A full-scale tone in one bin of a rectangular window sits at the gain.
    assert_approx_eq!(f64::from(stats.max_db), 6.0, 1e-2);
    assert_eq!(stats.db_range, 40.0);
}

#[test]
fn test_config_round_trip_drives_render() {
    let config = SpectrogramConfig {
        width: 300,
        fft_size: 32,
        colormap: Colormap::Fire,
        dark_theme: true,
        decorations: Some(false),
        direction: LayoutDirection::Vertical,
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let config: SpectrogramConfig = serde_json::from_str(&json).unwrap();

    let spectrogram = Spectrogram::from_bytes("noise.cu8", vec![0x5a; 4096])
        .with_config(config)
        .unwrap();
    let rendering = spectrogram.render().unwrap();
    assert_eq!((rendering.canvas.width(), rendering.canvas.height()), (32, 300));
}

#[test]
fn test_draw_onto_larger_canvas_clips() {
    let mut spectrogram = Spectrogram::from_bytes("noise.cs8", vec![3; 4096]);
    spectrogram.set_layout_size(300, 64);
    let mut canvas = PixelCanvas::new(100, 40);
    let stats = spectrogram.draw(&mut canvas).unwrap();
    assert_eq!(stats.histograms.total(), 300 * 64);
    assert_eq!(canvas.width(), 100);
}

#[test]
fn test_packed_output_matches_canvas() {
    let mut spectrogram = Spectrogram::from_bytes("noise.cu8", vec![17; 2048]);
    spectrogram.set_layout_size(40, 16);
    let rendering = spectrogram.render().unwrap();

    let mut pixels = vec![0u32; 40 * 16];
    spectrogram.draw_into(&mut pixels, 40, 16).unwrap();
    for (i, &packed) in pixels.iter().enumerate() {
        let pixel = rendering.canvas.pixel((i % 40) as i32, (i / 40) as i32).unwrap();
        assert_eq!(packed, pixel.to_argb(0xff));
    }
}

#[test]
fn test_open_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = Spectrogram::open(dir.path().join("absent.cu8")).unwrap_err();
    assert!(matches!(err, SpectrogramError::Io { .. }));

    let path = write_capture(dir.path(), "empty.cu8", &[]);
    let spectrogram = Spectrogram::open(&path).unwrap();
    assert_eq!(spectrogram.sample_count(), 0);
    assert!(matches!(
        spectrogram.render(),
        Err(SpectrogramError::Decode(_))
    ));
}

#[test]
fn test_origin_and_zoom_narrow_the_view() {
    let mut spectrogram = Spectrogram::from_bytes("noise.cu8", vec![200; 20_000]);
    spectrogram.set_layout_size(32, 16);
    let full = spectrogram.render().unwrap().stats;

    spectrogram.set_zoom(4);
    let zoomed = spectrogram.render().unwrap().stats;
    assert!(zoomed.stride < full.stride);

    spectrogram.set_origin(20_000);
    assert!(spectrogram.render().is_err());
}
