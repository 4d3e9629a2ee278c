//! Parallel rendering of many captures.
//!
//! Each capture is opened, analyzed and drawn on its own rayon task with its
//! own mapping, FFT plan and histograms; nothing mutable is shared.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::SpectrogramConfig;
use crate::error::SpectrogramResult;
use crate::render::{Rendering, Spectrogram};

/// Renders batches of captures with one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct BatchRenderer {
    config: SpectrogramConfig,
}

/// Outcome of rendering one capture of a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Capture path.
    pub path: PathBuf,
    /// Rendered image or the error that stopped it.
    pub result: SpectrogramResult<Rendering>,
}

impl BatchRenderer {
    /// A batch renderer using `config` for every capture.
    ///
    /// # Errors
    ///
    /// The first invalid setting of `config`.
    pub fn new(config: SpectrogramConfig) -> SpectrogramResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration applied to every capture.
    pub const fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    /// Render one capture.
    ///
    /// # Errors
    ///
    /// As for [`Spectrogram::open`] and [`Spectrogram::render`].
    pub fn render_one<P: AsRef<Path>>(&self, path: P) -> SpectrogramResult<Rendering> {
        Spectrogram::open(path)?
            .with_config(self.config.clone())?
            .render()
    }

    /// Render every capture in parallel, stopping at the first failure.
    ///
    /// Results are in input order.
    ///
    /// # Errors
    ///
    /// The error of a failed capture; which one is reported when several
    /// fail is unspecified.
    pub fn render_all<P>(&self, paths: &[P]) -> SpectrogramResult<Vec<Rendering>>
    where
        P: AsRef<Path> + Sync,
    {
        tracing::debug!(captures = paths.len(), "rendering batch");
        paths.par_iter().map(|path| self.render_one(path)).collect()
    }

    /// Render every capture in parallel, keeping each outcome.
    pub fn render_each<P>(&self, paths: &[P]) -> Vec<BatchItem>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| {
                let result = self.render_one(path);
                if let Err(err) = &result {
                    tracing::warn!(path = %path.as_ref().display(), %err, "capture failed");
                }
                BatchItem {
                    path: path.as_ref().to_path_buf(),
                    result,
                }
            })
            .collect()
    }
}
