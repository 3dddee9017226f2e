use crate::foundation::core::Canvas;
use crate::foundation::error::{LayoutBound, SlideReelError, SlideReelResult};
use crate::layout::measure::{FontDescriptor, TextMeasurer};

/// Fitted geometry of one slide's text. `font_size` is passed verbatim to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    pub slide_index: usize,
    pub font_size: u32,
    pub line_height: f32,
    /// `line_count * line_height`.
    pub block_height: f32,
    pub max_line_width: f32,
    pub line_count: usize,
    /// The widest line is wider than the canvas even at size 1.
    pub width_overflow: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BlockMetrics {
    line_height: f32,
    max_line_width: f32,
    block_height: f32,
}

impl BlockMetrics {
    fn fits_width(&self, canvas: &Canvas) -> bool {
        self.max_line_width <= canvas.width
    }

    fn fits_height(&self, canvas: &Canvas) -> bool {
        self.block_height <= canvas.height
    }
}

/// Largest font size in `[1, cap]` at which a slide's literal lines fit the canvas.
///
/// Lines are never wrapped. The width bound is the widest line; the height bound is
/// `line_count * line_height`, blank lines included. Both are monotone in the size, so the
/// engine binary-searches the range against the measurer.
#[derive(Clone, Debug)]
pub struct FontFitEngine {
    font: FontDescriptor,
    cap: u32,
    canvas: Canvas,
    strict_width: bool,
}

impl FontFitEngine {
    pub fn new(font: FontDescriptor, cap: u32, canvas: Canvas, strict_width: bool) -> Self {
        Self {
            font,
            cap: cap.max(1),
            canvas,
            strict_width,
        }
    }

    #[tracing::instrument(skip(self, lines, measurer), fields(lines = lines.len()))]
    pub fn fit(
        &self,
        slide_index: usize,
        lines: &[String],
        measurer: &mut dyn TextMeasurer,
    ) -> SlideReelResult<LayoutResult> {
        if lines.iter().all(|l| l.trim().is_empty()) {
            let line_height = measurer
                .measure_line(&self.font, self.cap, "")?
                .line_height;
            return Ok(LayoutResult {
                slide_index,
                font_size: self.cap,
                line_height,
                block_height: 0.0,
                max_line_width: 0.0,
                line_count: 0,
                width_overflow: false,
            });
        }

        let smallest = self.measure(1, lines, measurer)?;
        if !smallest.fits_height(&self.canvas) {
            return Err(SlideReelError::layout(
                slide_index,
                LayoutBound::Height,
                format!(
                    "{} lines need {:.1}px at size 1, canvas height is {:.1}px",
                    lines.len(),
                    smallest.block_height,
                    self.canvas.height
                ),
            ));
        }
        if !smallest.fits_width(&self.canvas) {
            let detail = format!(
                "widest line is {:.1}px at size 1, canvas width is {:.1}px",
                smallest.max_line_width, self.canvas.width
            );
            if self.strict_width {
                return Err(SlideReelError::layout(slide_index, LayoutBound::Width, detail));
            }
            tracing::warn!(slide = slide_index, "text overflows the canvas: {detail}");
            return Ok(self.result(slide_index, 1, lines.len(), smallest, true));
        }

        let (mut lo, mut lo_metrics) = (1u32, smallest);
        let mut hi = self.cap;
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            let m = self.measure(mid, lines, measurer)?;
            if m.fits_width(&self.canvas) && m.fits_height(&self.canvas) {
                lo = mid;
                lo_metrics = m;
            } else {
                hi = mid - 1;
            }
        }

        tracing::debug!(
            slide = slide_index,
            font_size = lo,
            width = lo_metrics.max_line_width,
            height = lo_metrics.block_height,
            "fitted"
        );
        Ok(self.result(slide_index, lo, lines.len(), lo_metrics, false))
    }

    /// Exhaustive scan over `[1, cap]`; same answer as [`fit`](Self::fit) for monotone
    /// measurers, at `cap` times the cost.
    pub fn fit_linear(
        &self,
        slide_index: usize,
        lines: &[String],
        measurer: &mut dyn TextMeasurer,
    ) -> SlideReelResult<LayoutResult> {
        if lines.iter().all(|l| l.trim().is_empty()) {
            return self.fit(slide_index, lines, measurer);
        }
        let mut best = None;
        for size in 1..=self.cap {
            let m = self.measure(size, lines, measurer)?;
            // No monotonicity assumed: the largest fitting size wins.
            if m.fits_width(&self.canvas) && m.fits_height(&self.canvas) {
                best = Some((size, m));
            }
        }
        match best {
            Some((size, m)) => Ok(self.result(slide_index, size, lines.len(), m, false)),
            None => self.fit(slide_index, lines, measurer),
        }
    }

    fn measure(
        &self,
        size: u32,
        lines: &[String],
        measurer: &mut dyn TextMeasurer,
    ) -> SlideReelResult<BlockMetrics> {
        let mut max_line_width = 0.0f32;
        let mut line_height = 0.0f32;
        for line in lines {
            let m = measurer.measure_line(&self.font, size, line)?;
            max_line_width = max_line_width.max(m.width);
            line_height = line_height.max(m.line_height);
        }
        Ok(BlockMetrics {
            line_height,
            max_line_width,
            block_height: lines.len() as f32 * line_height,
        })
    }

    fn result(
        &self,
        slide_index: usize,
        font_size: u32,
        line_count: usize,
        m: BlockMetrics,
        width_overflow: bool,
    ) -> LayoutResult {
        LayoutResult {
            slide_index,
            font_size,
            line_height: m.line_height,
            block_height: m.block_height,
            max_line_width: m.max_line_width,
            line_count,
            width_overflow,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;
