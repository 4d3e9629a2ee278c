// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![allow(clippy::too_many_arguments)]
#![deny(missing_docs)] // Documentation is a must for release

//! # iq_spectrogram
//!
//! Spectrogram images from raw complex (I/Q) radio captures.
//!
//! A capture is a flat file of interleaved I/Q samples. Its encoding is taken
//! from the file extension (`.cu8`, `.cs16`, `.cf32`, ...) and its center
//! frequency and sample rate from tokens in the file name
//! (`capture_433.920M_250k.cu8`). Each output column is one windowed FFT;
//! levels are mapped to a 256-entry colormap and the plot is decorated with
//! frequency and time axes, a dBFS legend, level histograms and a title.
//!
//! ## Quick Start
//!
//! ```rust
//! use iq_spectrogram::Spectrogram;
//!
//! // Silence, 8-bit unsigned, 4096 samples.
//! let mut spectrogram = Spectrogram::from_bytes("capture_433.920M_250k.cu8", vec![128; 8192]);
//! spectrogram.set_layout_size(128, 64);
//!
//! let rendering = spectrogram.render().unwrap();
//! assert_eq!(spectrogram.metadata().sample_rate, 250_000.0);
//! assert_eq!(rendering.stats.histograms.total(), 128 * 64);
//! ```
//!
//! ## Features
//!
//! - `parallel-processing`: render many captures concurrently with `rayon`
//!   (see the `batch` module).
//!
//! ## Error Handling
//!
//! Errors are hierarchical: configuration problems are [`ParameterError`]s,
//! unusable sample data is a [`DecodeError`], and both are wrapped by
//! [`SpectrogramError`] next to I/O and mapping failures.
//!
//! ```rust
//! use iq_spectrogram::{ParameterError, SpectrogramError, SpectrogramResult};
//!
//! let result: SpectrogramResult<()> = Err(SpectrogramError::Parameter(
//!     ParameterError::invalid_value("fft_window", "unknown window 'kaiser'"),
//! ));
//! match result {
//!     Ok(()) => {}
//!     Err(SpectrogramError::Parameter(err)) => eprintln!("Invalid parameter: {err}"),
//!     Err(other) => eprintln!("Render failed: {other}"),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (detected format and metadata, column
//! layout, level range) and never installs a subscriber itself.

pub mod axis;
#[cfg(feature = "parallel-processing")]
pub mod batch;
pub mod canvas;
pub mod colorize;
pub mod config;
pub mod decode;
mod error;
pub mod font;
pub mod format;
pub mod metadata;
pub mod palette;
pub mod render;
pub mod spectral;
pub mod window;

#[cfg(test)]
mod tests;

pub use crate::canvas::{Canvas, PixelCanvas, Rgb, TextOrientation};
pub use crate::colorize::{Colorizer, Histograms};
pub use crate::config::{LayoutDirection, PlotGeometry, SpectrogramConfig};
pub use crate::decode::{ColumnLayout, SampleBuffer};
pub use crate::error::{DecodeError, ParameterError, SpectrogramError, SpectrogramResult};
pub use crate::format::{SampleFormat, SampleKind};
pub use crate::metadata::CaptureMetadata;
pub use crate::palette::{Colormap, Palette};
pub use crate::render::{RenderStats, Rendering, Spectrogram};
pub use crate::spectral::SpectralAnalyzer;
pub use crate::window::{Window, WindowType};

#[cfg(feature = "parallel-processing")]
pub use crate::batch::{BatchItem, BatchRenderer};
