use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::SlideReelResult;
use crate::layout::text_engine::{TextBrushRgba8, TextLayoutEngine, line_extent};

/// Font file shared by measurement and rendering.
#[derive(Clone, Debug)]
pub struct FontDescriptor {
    path: PathBuf,
    bytes: Arc<Vec<u8>>,
}

impl FontDescriptor {
    pub fn load(path: &Path) -> SlideReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file '{}'", path.display()))?;
        Ok(Self::from_bytes(path, bytes))
    }

    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }
}

/// Geometry of one line at one font size, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMetrics {
    pub width: f32,
    /// Same for every line at a given size, blank lines included.
    pub line_height: f32,
}

/// The single source of text geometry for a run.
///
/// Implementations must be deterministic, and both quantities must be non-decreasing in `size`.
pub trait TextMeasurer {
    fn measure_line(
        &mut self,
        font: &FontDescriptor,
        size: u32,
        line: &str,
    ) -> SlideReelResult<LineMetrics>;
}

/// Creates one measurer per worker thread.
pub trait MeasurerFactory: Sync {
    fn create(&self) -> Box<dyn TextMeasurer>;
}

impl<F> MeasurerFactory for F
where
    F: Fn() -> Box<dyn TextMeasurer> + Sync,
{
    fn create(&self) -> Box<dyn TextMeasurer> {
        self()
    }
}

/// Line height is measured on this string so that it does not depend on a line's content.
const LINE_HEIGHT_PROBE: &str = "Hg";

/// Measures with parley shaping, the same shaper the rasterizer draws with.
#[derive(Default)]
pub struct ParleyMeasurer {
    engine: TextLayoutEngine,
    line_heights: HashMap<(PathBuf, u32), f32>,
}

impl ParleyMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    fn line_height(&mut self, font: &FontDescriptor, size: u32) -> SlideReelResult<f32> {
        let key = (font.path().to_path_buf(), size);
        if let Some(h) = self.line_heights.get(&key) {
            return Ok(*h);
        }
        let layout = self.engine.layout_line(
            font,
            LINE_HEIGHT_PROBE,
            size as f32,
            TextBrushRgba8::default(),
        )?;
        let (_, h) = line_extent(&layout);
        self.line_heights.insert(key, h);
        Ok(h)
    }
}

impl TextMeasurer for ParleyMeasurer {
    fn measure_line(
        &mut self,
        font: &FontDescriptor,
        size: u32,
        line: &str,
    ) -> SlideReelResult<LineMetrics> {
        let line_height = self.line_height(font, size)?;
        if line.is_empty() {
            return Ok(LineMetrics {
                width: 0.0,
                line_height,
            });
        }
        let layout =
            self.engine
                .layout_line(font, line, size as f32, TextBrushRgba8::default())?;
        let (width, _) = line_extent(&layout);
        Ok(LineMetrics { width, line_height })
    }
}

/// Font-free measurer: every character advances `size * advance_ratio` pixels.
///
/// Deterministic across platforms, used for dry runs and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMeasurer {
    pub advance_ratio: f32,
    pub line_height_ratio: f32,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            line_height_ratio: 1.2,
        }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure_line(
        &mut self,
        _font: &FontDescriptor,
        size: u32,
        line: &str,
    ) -> SlideReelResult<LineMetrics> {
        let size = size as f32;
        Ok(LineMetrics {
            width: line.chars().count() as f32 * size * self.advance_ratio,
            line_height: size * self.line_height_ratio,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/measure.rs"]
mod tests;
