//! Spectrogram handle and the renderer that composes every stage onto a
//! [`Canvas`].
//!
//! A [`Spectrogram`] owns the sample buffer and the configuration. Each call
//! to [`Spectrogram::draw`] or [`Spectrogram::render`] plans its own FFT,
//! allocates its own histograms and releases them on return, so a handle can
//! be rendered any number of times with different settings.

use std::path::Path;

use crate::axis::{self, db_ticks, frequency_axis, time_axis};
use crate::canvas::{Canvas, PixelCanvas, TextOrientation};
use crate::colorize::{COLOR_MAX, Colorizer, DB_HIST_SIZE, Histograms};
use crate::config::{Channel, LayoutDirection, PlotGeometry, SpectrogramConfig, Theme};
use crate::decode::{ColumnLayout, SampleBuffer};
use crate::error::{ParameterError, SpectrogramResult};
use crate::font::GLYPH_HEIGHT;
use crate::format::SampleFormat;
use crate::metadata::CaptureMetadata;
use crate::palette::{Colormap, Palette};
use crate::spectral::{ColumnStats, SpectralAnalyzer};
use crate::window::WindowType;

/// Decimation factor shown in the title. Every column is one FFT.
const DECIMATION: u32 = 1;

/// An opened capture plus the settings to render it with.
#[derive(Debug)]
pub struct Spectrogram {
    name: String,
    samples: SampleBuffer,
    format: SampleFormat,
    metadata: CaptureMetadata,
    config: SpectrogramConfig,
}

/// Summary of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    /// Palette index and level histograms over every plotted cell.
    pub histograms: Histograms,
    /// Lowest level seen, starting from 0 dBFS.
    pub min_db: f32,
    /// Highest level seen, starting from the silence floor.
    pub max_db: f32,
    /// Fractional sample advance between adjacent columns.
    pub stride: f64,
    /// Number of analyzed columns over all strips.
    pub columns: usize,
    /// Displayed range in dB.
    pub db_range: f32,
    /// Gain in dB.
    pub gain_db: f32,
}

/// An owned image and the statistics of the render that produced it.
#[derive(Debug, Clone)]
pub struct Rendering {
    /// The final image, already turned for vertical layouts.
    pub canvas: PixelCanvas,
    /// Render statistics.
    pub stats: RenderStats,
}

impl Spectrogram {
    /// Map the capture at `path`, detecting format and metadata from its name.
    ///
    /// # Errors
    ///
    /// I/O or mapping errors; nothing is returned on failure.
    pub fn open<P: AsRef<Path>>(path: P) -> SpectrogramResult<Self> {
        let path = path.as_ref();
        let _span = tracing::debug_span!("open", path = %path.display()).entered();

        let samples = SampleBuffer::open(path)?;
        let format = SampleFormat::from_path(path);
        let metadata = CaptureMetadata::from_path(path);
        tracing::debug!(
            %format,
            center_frequency = metadata.center_frequency,
            sample_rate = metadata.sample_rate,
            bytes = samples.len(),
            "opened capture"
        );

        Ok(Self {
            name: path.to_string_lossy().into_owned(),
            samples,
            format,
            metadata,
            config: SpectrogramConfig::default(),
        })
    }

    /// In-memory capture; `name` is used for format and metadata detection.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            format: SampleFormat::from_path(&name),
            metadata: CaptureMetadata::parse(&name),
            samples: SampleBuffer::from_bytes(bytes),
            config: SpectrogramConfig::default(),
            name,
        }
    }

    /// Replace the whole configuration.
    ///
    /// # Errors
    ///
    /// The first invalid setting, leaving the handle unchanged.
    pub fn with_config(mut self, config: SpectrogramConfig) -> SpectrogramResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Name the capture was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detected sample encoding.
    pub const fn format(&self) -> SampleFormat {
        self.format
    }

    /// Override the detected sample encoding.
    pub fn set_format(&mut self, format: SampleFormat) {
        self.format = format;
    }

    /// Detected center frequency and sample rate.
    pub const fn metadata(&self) -> &CaptureMetadata {
        &self.metadata
    }

    /// Current configuration.
    pub const fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    /// Number of whole samples in the capture.
    pub fn sample_count(&self) -> usize {
        self.samples.sample_count(self.format)
    }

    /// Plot width and height; the height is the FFT size.
    pub const fn layout_size(&self) -> (u32, u32) {
        (self.config.width, self.config.fft_size)
    }

    /// Set plot width and height.
    pub fn set_layout_size(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.fft_size = height;
    }

    /// Whether decorations are drawn light on black.
    pub const fn dark_theme(&self) -> bool {
        self.config.dark_theme
    }

    /// Choose the dark or light theme.
    pub fn set_dark_theme(&mut self, dark: bool) {
        self.config.dark_theme = dark;
    }

    /// First visible sample.
    pub const fn origin(&self) -> u64 {
        self.config.origin
    }

    /// Skip `origin` samples at the start of the capture.
    pub fn set_origin(&mut self, origin: u64) {
        self.config.origin = origin;
    }

    /// Zoom factor.
    pub const fn zoom(&self) -> u32 {
        self.config.zoom
    }

    /// Show `1/zoom` of the samples after the origin.
    pub fn set_zoom(&mut self, zoom: u32) {
        self.config.zoom = zoom;
    }

    /// Gain in dB.
    pub const fn db_gain(&self) -> f32 {
        self.config.gain_db
    }

    /// Set the gain in dB.
    pub fn set_db_gain(&mut self, gain_db: f32) {
        self.config.gain_db = gain_db;
    }

    /// Displayed range in dB, the format default unless overridden.
    pub fn db_range(&self) -> f32 {
        self.config.effective_db_range(self.format)
    }

    /// Override the displayed range; `None` restores the format default.
    pub fn set_db_range(&mut self, db_range: Option<f32>) {
        self.config.db_range = db_range;
    }

    /// Colormap id.
    pub const fn cmap(&self) -> u32 {
        self.config.colormap.id()
    }

    /// Select a colormap by id.
    ///
    /// # Errors
    ///
    /// A parameter error for unknown ids.
    pub fn set_cmap(&mut self, id: u32) -> SpectrogramResult<()> {
        self.config.colormap = Colormap::from_id(id)?;
        Ok(())
    }

    /// Select a colormap.
    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.config.colormap = colormap;
    }

    /// FFT size.
    pub const fn fft_size(&self) -> u32 {
        self.config.fft_size
    }

    /// Set the FFT size, which is also the plot height.
    pub fn set_fft_size(&mut self, fft_size: u32) {
        self.config.fft_size = fft_size;
    }

    /// Window id.
    pub const fn fft_window(&self) -> u8 {
        self.config.window.id()
    }

    /// Select a window by id.
    ///
    /// # Errors
    ///
    /// A parameter error for unknown ids.
    pub fn set_fft_window(&mut self, id: u8) -> SpectrogramResult<()> {
        self.config.window = WindowType::from_id(id)?;
        Ok(())
    }

    /// Window applied before each FFT.
    pub const fn window_type(&self) -> WindowType {
        self.config.window
    }

    /// Select a window.
    pub fn set_window_type(&mut self, window: WindowType) {
        self.config.window = window;
    }

    /// Orientation of the final image.
    pub const fn layout_direction(&self) -> LayoutDirection {
        self.config.direction
    }

    /// Set the orientation of the final image.
    pub fn set_layout_direction(&mut self, direction: LayoutDirection) {
        self.config.direction = direction;
    }

    /// Number of stacked strips.
    pub const fn plot_across(&self) -> u32 {
        self.config.plot_across
    }

    /// Split the visible samples across `strips` stacked plots.
    pub fn set_plot_across(&mut self, strips: u32) {
        self.config.plot_across = strips;
    }

    /// Length of the longest histogram bar.
    pub const fn histo_width(&self) -> u32 {
        self.config.histo_width
    }

    /// Set the length of the longest histogram bar.
    pub fn set_histo_width(&mut self, width: u32) {
        self.config.histo_width = width;
    }

    /// Height of the level gauge.
    pub const fn deci_height(&self) -> u32 {
        self.config.deci_height
    }

    /// Set the height of the level gauge.
    pub fn set_deci_height(&mut self, height: u32) {
        self.config.deci_height = height;
    }

    /// Whether decorations will be drawn.
    pub fn decorations(&self) -> bool {
        self.config.decorations_enabled()
    }

    /// Force decorations on or off; `None` decides by plot width.
    pub fn set_decorations(&mut self, decorations: Option<bool>) {
        self.config.decorations = decorations;
    }

    /// Size of the final image, turned for vertical layouts.
    pub fn canvas_size(&self) -> (usize, usize) {
        let (width, height) = self.config.geometry().canvas_size();
        match self.config.direction {
            LayoutDirection::Horizontal => (width, height),
            LayoutDirection::Vertical => (height, width),
        }
    }

    /// Render into a new image of [`Spectrogram::canvas_size`].
    ///
    /// # Errors
    ///
    /// Invalid settings, a capture too short for one FFT, or a column that
    /// cannot be decoded.
    pub fn render(&self) -> SpectrogramResult<Rendering> {
        let (width, height) = self.config.geometry().canvas_size();
        let mut canvas = PixelCanvas::new(width, height);
        let stats = self.draw(&mut canvas)?;
        if self.config.direction == LayoutDirection::Vertical {
            canvas = canvas.rotated_clockwise();
        }
        Ok(Rendering { canvas, stats })
    }

    /// Draw the horizontal layout onto `canvas`, clipping anything outside.
    ///
    /// The layout direction is not applied; see [`Spectrogram::render`].
    ///
    /// # Errors
    ///
    /// As for [`Spectrogram::render`].
    pub fn draw<C: Canvas>(&self, canvas: &mut C) -> SpectrogramResult<RenderStats> {
        let _span = tracing::debug_span!("render", name = %self.name).entered();
        self.config.validate()?;

        let geometry = self.config.geometry();
        let theme = self.config.theme();
        let fft_size = self.config.fft_size as usize;
        let window = self.config.window.generate(fft_size)?;
        let mut analyzer = SpectralAnalyzer::new(&window, self.config.gain_db)?;
        let db_range = self.db_range();
        let colorizer = Colorizer::new(self.config.gain_db, db_range);

        let strips = geometry.strips as usize;
        let width = geometry.width as usize;
        let origin = usize::try_from(self.config.origin).unwrap_or(usize::MAX);
        let layout = ColumnLayout::new(
            self.sample_count(),
            fft_size,
            width * strips,
            origin,
            self.config.zoom as usize,
        )?;

        let renderer = Renderer {
            geometry,
            theme,
            palette: self.config.colormap.palette(),
        };
        let (canvas_width, canvas_height) = (canvas.width() as i32, canvas.height() as i32);
        canvas.fill_rect(0, 0, canvas_width, canvas_height, theme.background());

        let mut histograms = Histograms::new();
        for column in 0..layout.columns() {
            let strip = (column / width) as i32;
            let x = (column % width) as i32;
            let stats =
                analyzer.analyze_column(&self.samples, self.format, layout.offset(column), &window)?;
            renderer.plot_column(canvas, strip, x, analyzer.rows(), &colorizer, &mut histograms);
            if geometry.decorated {
                renderer.gauge(canvas, strip, x, stats, db_range);
            }
        }
        tracing::debug!(
            min_db = analyzer.min_db(),
            max_db = analyzer.max_db(),
            db_hist_mean = histograms.db_mean(),
            stride = layout.stride(),
            "analyzed columns"
        );

        if geometry.decorated {
            let strip_duration =
                layout.span() as f64 / strips as f64 / self.metadata.sample_rate;
            for strip in 0..geometry.strips {
                let strip_start = (layout.start() as f64
                    + f64::from(strip) * layout.span() as f64 / strips as f64)
                    / self.metadata.sample_rate;
                renderer.histograms(canvas, strip, &histograms);
                renderer.frame(canvas, strip);
                renderer.legend(canvas, strip, self.config.gain_db, db_range);
                renderer.frequency_axis(canvas, strip, &self.metadata);
                renderer.time_axis(canvas, strip, strip_duration as f32, strip_start as f32);
            }
            let text = axis::title(
                self.metadata.center_frequency,
                self.metadata.sample_rate,
                db_range,
                self.config.gain_db,
                DECIMATION,
                fft_size,
            );
            let (x, y) = geometry.title_position();
            canvas.draw_text(x, y, theme.gray(255), &text, TextOrientation::Horizontal);
        }

        Ok(RenderStats {
            histograms,
            min_db: analyzer.min_db(),
            max_db: analyzer.max_db(),
            stride: layout.stride(),
            columns: layout.columns(),
            db_range,
            gain_db: analyzer.gain_db(),
        })
    }

    /// Render and copy into caller-owned packed `0xFFRRGGBB` pixels with row
    /// pitch `width`; the image is clipped to `width` x `height`.
    ///
    /// # Errors
    ///
    /// A parameter error if `pixels` holds fewer than `width * height`
    /// entries, otherwise as for [`Spectrogram::render`].
    pub fn draw_into(
        &self,
        pixels: &mut [u32],
        width: usize,
        height: usize,
    ) -> SpectrogramResult<RenderStats> {
        let needed = width.saturating_mul(height);
        if pixels.len() < needed {
            return Err(ParameterError::invalid_value(
                "pixels",
                format!("buffer holds {} pixels, {width}x{height} needs {needed}", pixels.len()),
            )
            .into());
        }
        let rendering = self.render()?;
        rendering.canvas.write_argb(pixels, width, height);
        Ok(rendering.stats)
    }
}

/// Drawing of one render's plot body and decorations.
struct Renderer {
    geometry: PlotGeometry,
    theme: Theme,
    palette: &'static Palette,
}

impl Renderer {
    /// Top row of the plot body in `strip`.
    const fn top(&self, strip: i32) -> i32 {
        self.geometry.strip_offset(strip) + self.geometry.top
    }

    fn plot_column<C: Canvas>(
        &self,
        canvas: &mut C,
        strip: i32,
        x: i32,
        rows: &[f32],
        colorizer: &Colorizer,
        histograms: &mut Histograms,
    ) {
        let top = self.top(strip);
        let left = self.geometry.left + x;
        for (y, &db) in rows.iter().enumerate() {
            let index = colorizer.colorize(db, histograms);
            canvas.set_indexed(left, top + y as i32, self.palette, index);
        }
    }

    /// Vertical bar below column `x` spanning its quietest to loudest level.
    fn gauge<C: Canvas>(&self, canvas: &mut C, strip: i32, x: i32, stats: ColumnStats, db_range: f32) {
        let level = |db: f32| ((db_range + db) * 256.0 / db_range).clamp(0.0, 255.0) as i32;
        let (min_g, max_g) = (level(stats.min_db), level(stats.max_db));
        let depth = self.geometry.deci_height;
        let top = self.geometry.strip_offset(strip) + self.geometry.gauge_top();
        canvas.fill_rect(
            self.geometry.left + x,
            top + min_g * depth / 256,
            1,
            max_g * depth / 256 - min_g * depth / 256,
            self.theme.gray(max_g as u8),
        );
    }

    fn histograms<C: Canvas>(&self, canvas: &mut C, strip: i32, histograms: &Histograms) {
        let height = self.geometry.height;
        let top = self.top(strip);
        let last = i64::from(height - 1).max(1);

        let color_peak = histograms.color_peak();
        if color_peak > 0 {
            for y in 0..height {
                let i = (i64::from(y) * COLOR_MAX as i64 / last) as usize;
                let count = histograms.color().get(i).copied().unwrap_or(0);
                self.bar(canvas, top + height - y, count, color_peak, Channel::Red);
            }
        }

        let db_peak = histograms.db_peak();
        if db_peak > 0 {
            for y in 0..height {
                let i = (i64::from(y) * (DB_HIST_SIZE - 1) as i64 / last) as usize;
                let count = histograms.db().get(i).copied().unwrap_or(0);
                self.bar(canvas, top + y, count, db_peak, Channel::Green);
            }
        }
    }

    /// One histogram bar, brightening over its last ten pixels.
    fn bar<C: Canvas>(&self, canvas: &mut C, y: i32, count: u64, peak: u64, channel: Channel) {
        let length = (self.geometry.histo_width as u64).saturating_mul(count) / peak;
        let length = i64::try_from(length).unwrap_or(i64::MAX);
        let left = self.geometry.histogram_left();
        for x in 0..length {
            let level = if x > length - 10 {
                55 + 20 * (10 - length + x)
            } else {
                63
            };
            if let Some(pixel) = canvas.pixel_mut(left + x as i32, y) {
                self.theme.tint(pixel, channel, level.clamp(0, 255) as u8);
            }
        }
    }

    /// One pixel box around the plot body.
    fn frame<C: Canvas>(&self, canvas: &mut C, strip: i32) {
        let PlotGeometry {
            width, height, left, ..
        } = self.geometry;
        let top = self.top(strip);
        let color = self.theme.gray(127);
        canvas.fill_rect(left - 1, top - 1, width + 2, 1, color);
        canvas.fill_rect(left - 1, top + height, width + 2, 1, color);
        canvas.fill_rect(left - 1, top - 1, 1, height + 2, color);
        canvas.fill_rect(left + width, top - 1, 1, height + 2, color);
    }

    /// Color ramp with its dBFS labels.
    fn legend<C: Canvas>(&self, canvas: &mut C, strip: i32, gain_db: f32, db_range: f32) {
        let height = self.geometry.height;
        let top = self.top(strip);
        let last = (height - 1).max(1) as usize;
        let ramp_left = self.geometry.ramp_left();
        for y in 0..height {
            let index = COLOR_MAX - y as usize * COLOR_MAX / last;
            for x in ramp_left..ramp_left + self.geometry.ramp_width() {
                canvas.set_indexed(x, top + y, self.palette, index);
            }
        }

        let color = self.theme.gray(191);
        for tick in db_ticks(gain_db, db_range, top, height) {
            canvas.draw_text(
                self.geometry.db_label_left(),
                tick.label_y,
                color,
                &tick.label,
                TextOrientation::Horizontal,
            );
        }
    }

    fn frequency_axis<C: Canvas>(&self, canvas: &mut C, strip: i32, metadata: &CaptureMetadata) {
        let top = self.top(strip);
        let left = self.geometry.left;
        let axis = frequency_axis(
            metadata.center_frequency,
            metadata.sample_rate,
            top,
            self.geometry.height,
        );

        canvas.draw_text(
            16,
            top - 4,
            self.theme.gray(255),
            &axis.unit_label,
            TextOrientation::Horizontal,
        );
        for y in axis.minor_ticks {
            canvas.fill_rect(left - 3, y, 3, 1, self.theme.gray(95));
        }
        for tick in axis.ticks {
            canvas.fill_rect(left - 4, tick.y, 4, 1, self.theme.gray(127));
            canvas.draw_text(
                0,
                tick.y - GLYPH_HEIGHT / 2,
                self.theme.gray(191),
                &tick.label,
                TextOrientation::Horizontal,
            );
        }
    }

    fn time_axis<C: Canvas>(&self, canvas: &mut C, strip: i32, duration: f32, start: f32) {
        let top = self.top(strip);
        let bottom = top + self.geometry.height;
        let axis = time_axis(duration, start, self.geometry.left, self.geometry.width);

        canvas.draw_text(
            16,
            bottom + 1,
            self.theme.gray(255),
            &axis.unit_label,
            TextOrientation::Horizontal,
        );
        for x in axis.minor_ticks {
            canvas.fill_rect(x, bottom, 1, 4, self.theme.gray(95));
        }
        for tick in axis.ticks {
            canvas.fill_rect(tick.x, bottom, 1, 6, self.theme.gray(127));
            canvas.draw_text(
                tick.label_x,
                bottom + 2,
                self.theme.gray(191),
                &tick.label,
                TextOrientation::Horizontal,
            );
        }
    }
}
