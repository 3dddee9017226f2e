use std::borrow::Cow;
use std::path::PathBuf;

use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::layout::measure::FontDescriptor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Stateful helper for shaping single lines with one registered font file.
///
/// Shared by [`ParleyMeasurer`](crate::layout::measure::ParleyMeasurer) and the slide
/// rasterizer, so glyph advances used for sizing and for drawing come from the same shaper.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    /// Font file registered last and its family name.
    family: Option<(PathBuf, String)>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family: None,
        }
    }

    fn family_for(&mut self, font: &FontDescriptor) -> SlideReelResult<String> {
        if let Some((path, name)) = &self.family
            && path == font.path()
        {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            SlideReelError::validation(format!(
                "no font families found in '{}'",
                font.path().display()
            ))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                SlideReelError::validation(format!(
                    "font family in '{}' has no name",
                    font.path().display()
                ))
            })?
            .to_string();

        self.family = Some((font.path().to_path_buf(), family_name.clone()));
        Ok(family_name)
    }

    /// Shape one line without any width constraint; the result has exactly one line.
    pub(crate) fn layout_line(
        &mut self,
        font: &FontDescriptor,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> SlideReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(SlideReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Advance width and line height of a single-line layout.
pub(crate) fn line_extent(layout: &parley::Layout<TextBrushRgba8>) -> (f32, f32) {
    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for line in layout.lines() {
        let m = line.metrics();
        width = width.max(m.advance);
        height += m.ascent + m.descent + m.leading;
    }
    (width, height)
}
