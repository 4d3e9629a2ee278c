//! Timing of full spectrogram renders across sample formats and FFT sizes.
//!
//! Run with `cargo bench --bench render_benchmark`.

use iq_spectrogram::{SampleFormat, Spectrogram};
use std::time::Instant;

/// Interleaved CU8 bytes of a chirp sweeping the whole band.
fn generate_capture(samples: usize) -> Vec<u8> {
    (0..samples)
        .flat_map(|n| {
            let t = n as f64 / samples as f64;
            let phase = std::f64::consts::PI * samples as f64 * t * t;
            [
                (127.5 + 100.0 * phase.cos()) as u8,
                (127.5 + 100.0 * phase.sin()) as u8,
            ]
        })
        .collect()
}

fn benchmark_render(format: SampleFormat, fft_size: u32, width: u32, label: &str) {
    let samples = 1 << 20;
    let mut spectrogram =
        Spectrogram::from_bytes(format!("bench_100M_2048k.{format}"), generate_capture(samples));
    spectrogram.set_layout_size(width, fft_size);

    println!(
        "Benchmarking {}: {} samples as {}, {}x{}",
        label,
        spectrogram.sample_count(),
        format,
        width,
        fft_size
    );

    // Warm up
    for _ in 0..2 {
        let _ = spectrogram.render();
    }

    let num_runs = 10;
    let mut times = Vec::with_capacity(num_runs);
    for _ in 0..num_runs {
        let start = Instant::now();
        let result = spectrogram.render();
        let elapsed = start.elapsed();

        assert!(result.is_ok(), "render failed: {:?}", result.err());
        times.push(elapsed.as_secs_f64() * 1000.0);
    }

    times.sort_by(f64::total_cmp);
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    let std_dev = (times.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / times.len() as f64).sqrt();
    println!(
        "Results: {:.2}ms ± {:.2}ms (median: {:.2}ms, range: {:.2}-{:.2}ms)",
        mean,
        std_dev,
        times[times.len() / 2],
        times[0],
        times[times.len() - 1]
    );
    println!();
}

fn main() {
    println!("I/Q Spectrogram Render Benchmark");
    println!("================================");
    println!();

    let cases = [
        (SampleFormat::Cu8, 256, 1024, "Small FFT"),
        (SampleFormat::Cu8, 512, 1024, "Default"),
        (SampleFormat::Cu8, 2048, 1024, "Large FFT"),
        (SampleFormat::Cs16, 512, 2048, "Wide 16-bit"),
        (SampleFormat::Cf32, 512, 1024, "Float"),
    ];
    for (format, fft_size, width, label) in cases {
        benchmark_render(format, fft_size, width, label);
    }

    println!("Benchmark Complete!");
}
