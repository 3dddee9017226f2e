use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::config::{Background, RunConfig, TextAlign, VerticalAlign};
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::layout::fit::LayoutResult;
use crate::layout::measure::FontDescriptor;
use crate::layout::text_engine::{TextBrushRgba8, TextLayoutEngine, line_extent};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub fn decode_image(bytes: &[u8]) -> SlideReelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[derive(Clone, Debug)]
enum BackgroundFill {
    Color(Rgba8),
    Image(PreparedImage),
}

/// Everything about a slide's look that is fixed for the whole run.
#[derive(Clone, Debug)]
pub struct SlideStyle {
    width: u16,
    height: u16,
    canvas: Canvas,
    background: BackgroundFill,
    text_color: Rgba8,
    text_align: TextAlign,
    vertical_align: VerticalAlign,
}

impl SlideStyle {
    /// Decodes the background image, if any, once for the run.
    pub fn from_config(config: &RunConfig) -> SlideReelResult<Self> {
        let to_u16 = |v: u32| {
            u16::try_from(v).map_err(|_| {
                SlideReelError::validation(format!("resolution {} exceeds u16", config.resolution))
            })
        };
        let background = match &config.background {
            Background::Color(c) => BackgroundFill::Color(*c),
            Background::Image(path) => BackgroundFill::Image(load_image(path)?),
        };
        Ok(Self {
            width: to_u16(config.resolution.width)?,
            height: to_u16(config.resolution.height)?,
            canvas: config.resolution.canvas(config.margin),
            background,
            text_color: config.text_color,
            text_align: config.text_align,
            vertical_align: config.vertical_align,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }
}

fn load_image(path: &Path) -> SlideReelResult<PreparedImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read background image '{}'", path.display()))?;
    decode_image(&bytes)
        .map_err(|e| SlideReelError::validation(format!("'{}': {e}", path.display())))
}

/// Opaque RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaFrame {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn write_png(&self, path: &Path) -> SlideReelResult<()> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| SlideReelError::validation("frame buffer size mismatch"))?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        Ok(())
    }
}

/// Draws slide frames on the CPU. One per worker thread.
///
/// Text is shaped at the fitted `font_size` and placed one line every `line_height` pixels;
/// nothing is re-measured or re-wrapped here.
pub struct SlideRasterizer {
    engine: TextLayoutEngine,
    font: Option<(PathBuf, vello_cpu::peniko::FontData)>,
}

impl Default for SlideRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideRasterizer {
    pub fn new() -> Self {
        Self {
            engine: TextLayoutEngine::new(),
            font: None,
        }
    }

    pub fn rasterize_text(
        &mut self,
        style: &SlideStyle,
        font: &FontDescriptor,
        lines: &[String],
        layout: &LayoutResult,
    ) -> SlideReelResult<RgbaFrame> {
        let font_data = self.font_data(font);
        let brush = TextBrushRgba8 {
            r: style.text_color.r,
            g: style.text_color.g,
            b: style.text_color.b,
            a: style.text_color.a,
        };
        let canvas = style.canvas;
        let top = match style.vertical_align {
            VerticalAlign::Top => canvas.y,
            VerticalAlign::Center => {
                canvas.y + ((canvas.height - layout.block_height) / 2.0).max(0.0)
            }
        };

        let mut shaped = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let text_layout =
                self.engine
                    .layout_line(font, line, layout.font_size as f32, brush)?;
            let (width, _) = line_extent(&text_layout);
            let x = match style.text_align {
                TextAlign::Left => canvas.x,
                TextAlign::Center => canvas.x + ((canvas.width - width) / 2.0).max(0.0),
            };
            let y = top + i as f32 * layout.line_height;
            shaped.push((x, y, text_layout));
        }

        render_frame(style, |ctx| {
            paint_background(ctx, style)?;
            for (x, y, text_layout) in &shaped {
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                    f64::from(*x),
                    f64::from(*y),
                )));
                for line in text_layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));
                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font_data)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
            }
            Ok(())
        })
    }

    /// Page image scaled to fit inside the frame, centered over the background.
    pub fn rasterize_image(
        &mut self,
        style: &SlideStyle,
        encoded: &[u8],
    ) -> SlideReelResult<RgbaFrame> {
        let page = decode_image(encoded)?;
        render_frame(style, |ctx| {
            paint_background(ctx, style)?;
            paint_image(ctx, style, &page, Fit::Contain)
        })
    }

    fn font_data(&mut self, font: &FontDescriptor) -> vello_cpu::peniko::FontData {
        if let Some((path, data)) = &self.font
            && path == font.path()
        {
            return data.clone();
        }
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes().to_vec()),
            0,
        );
        self.font = Some((font.path().to_path_buf(), data.clone()));
        data
    }
}

fn render_frame(
    style: &SlideStyle,
    f: impl FnOnce(&mut vello_cpu::RenderContext) -> SlideReelResult<()>,
) -> SlideReelResult<RgbaFrame> {
    let (width, height) = (style.width, style.height);
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    f(&mut ctx)?;
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(RgbaFrame {
        width: u32::from(width),
        height: u32::from(height),
        data: pixmap.data_as_u8_slice().to_vec(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fit {
    Cover,
    Contain,
}

fn paint_background(
    ctx: &mut vello_cpu::RenderContext,
    style: &SlideStyle,
) -> SlideReelResult<()> {
    let full =
        vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(style.width), f64::from(style.height));
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    // Frames are always opaque.
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
    ctx.fill_rect(&full);
    match &style.background {
        BackgroundFill::Color(c) => {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
            ctx.fill_rect(&full);
            Ok(())
        }
        BackgroundFill::Image(img) => paint_image(ctx, style, img, Fit::Cover),
    }
}

fn paint_image(
    ctx: &mut vello_cpu::RenderContext,
    style: &SlideStyle,
    img: &PreparedImage,
    fit: Fit,
) -> SlideReelResult<()> {
    let (fw, fh) = (f64::from(style.width), f64::from(style.height));
    let (iw, ih) = (f64::from(img.width.max(1)), f64::from(img.height.max(1)));
    let scale = match fit {
        Fit::Cover => (fw / iw).max(fh / ih),
        Fit::Contain => (fw / iw).min(fh / ih),
    };
    let dx = (fw - iw * scale) / 2.0;
    let dy = (fh - ih * scale) / 2.0;

    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    ctx.set_transform(
        vello_cpu::kurbo::Affine::translate((dx, dy)) * vello_cpu::kurbo::Affine::scale(scale),
    );
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    Ok(())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> SlideReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SlideReelError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SlideReelError::validation("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(SlideReelError::validation("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
