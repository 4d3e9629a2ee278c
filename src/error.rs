//! Error types and result utilities for spectrogram rendering.
//!
//! Errors are hierarchical: [`SpectrogramError`] is what every public
//! operation returns, and it wraps the more specific [`ParameterError`] and
//! [`DecodeError`] families so callers can match on exactly the failure they
//! care about.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type alias for results that may contain a [`SpectrogramError`].
pub type SpectrogramResult<T> = Result<T, SpectrogramError>;

/// Error types that can occur while loading, decoding or rendering a capture.
#[derive(Error, Debug)]
pub enum SpectrogramError {
    /// The capture file could not be opened or its metadata could not be read.
    #[error("Failed to open capture '{}': {source}", path.display())]
    Io {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The capture file was opened but could not be memory-mapped.
    #[error("Failed to map capture '{}': {source}", path.display())]
    Map {
        /// Path that was being mapped.
        path: PathBuf,
        /// Underlying mapping failure.
        #[source]
        source: std::io::Error,
    },

    /// A configuration value or argument was rejected.
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// The sample data could not be decoded for the requested column.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl SpectrogramError {
    /// Returns true if the error was caused by the capture file itself
    /// (unreadable, unmappable or too short) rather than by the configuration.
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Map { .. } | Self::Decode(_))
    }
}

/// Errors raised when a parameter fails validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// The value is not acceptable for this parameter.
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        /// Name of the offending parameter.
        parameter: String,
        /// Human readable reason.
        reason: String,
    },

    /// The value lies outside the accepted range.
    #[error("Parameter '{parameter}' out of range: got {value}, expected {expected}")]
    OutOfRange {
        /// Name of the offending parameter.
        parameter: String,
        /// The rejected value, rendered as text.
        value: String,
        /// Description of the accepted range.
        expected: String,
    },
}

impl ParameterError {
    /// Create an [`ParameterError::InvalidValue`] error.
    pub fn invalid_value(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create an [`ParameterError::OutOfRange`] error.
    pub fn out_of_range(
        parameter: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::OutOfRange {
            parameter: parameter.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Errors raised while decoding raw sample bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The requested sample range reaches past the end of the capture.
    #[error("Samples {start}..{end} exceed the capture length of {available} samples")]
    OutOfBounds {
        /// First sample index requested.
        start: usize,
        /// One past the last sample index requested.
        end: usize,
        /// Number of whole samples in the capture.
        available: usize,
    },

    /// The capture does not hold enough samples to fill a single FFT column.
    #[error("Capture holds {available} samples but at least {needed} are required")]
    InsufficientSamples {
        /// Samples required.
        needed: usize,
        /// Samples present.
        available: usize,
    },

    /// The output buffer and the window disagree in length.
    #[error("Output buffer holds {actual} values but the window has {expected}")]
    LengthMismatch {
        /// Window length.
        expected: usize,
        /// Output buffer length.
        actual: usize,
    },
}
