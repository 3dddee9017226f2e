use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::RunConfig;
use crate::content::slides::{Slide, SlideContent};
use crate::foundation::core::{AudioDescriptor, Fps};
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::layout::fit::LayoutResult;
use crate::layout::measure::FontDescriptor;
use crate::media::probe::probe_media;
use crate::media::process::{CancelHandle, run_tool};
use crate::plan::{PlannedAudio, Segment, SegmentPlan};
use crate::render::raster::{SlideRasterizer, SlideStyle};

/// Inputs for one slide's segment.
#[derive(Clone, Copy, Debug)]
pub struct RenderJob<'a> {
    pub slide: &'a Slide,
    /// Fitted layout; `None` for image slides.
    pub layout: Option<&'a LayoutResult>,
    pub plan: &'a SegmentPlan,
    /// Directory owned by this slide for intermediates and the segment file.
    pub slide_dir: &'a Path,
}

/// Produces one media segment per slide.
pub trait SegmentRenderer: Sync {
    /// Per-worker state (shaping contexts, raster buffers).
    type Scratch;

    fn scratch(&self) -> Self::Scratch;

    fn render(
        &self,
        scratch: &mut Self::Scratch,
        job: &RenderJob<'_>,
        cancel: &CancelHandle,
    ) -> SlideReelResult<Segment>;

    /// External programs the renderer needs on `PATH`.
    fn required_tools(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Rasterizes the slide with vello_cpu and encodes a still-image H.264/AAC segment with `ffmpeg`.
pub struct FfmpegSegmentRenderer {
    style: SlideStyle,
    font: FontDescriptor,
    fps: Fps,
    audio: AudioDescriptor,
}

impl FfmpegSegmentRenderer {
    pub fn new(config: &RunConfig, font: FontDescriptor) -> SlideReelResult<Self> {
        Ok(Self {
            style: SlideStyle::from_config(config)?,
            font,
            fps: config.fps,
            audio: config.audio.clone(),
        })
    }

    fn encode(
        &self,
        image_path: &Path,
        plan: &SegmentPlan,
        out_path: &Path,
    ) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-loop", "1", "-framerate"])
            .arg(format!("{}/{}", self.fps.num, self.fps.den))
            .arg("-i")
            .arg(image_path);

        let audio_filter = match &plan.audio {
            PlannedAudio::Narration {
                path,
                delay_seconds,
                ..
            } => {
                cmd.arg("-i").arg(path);
                narration_filter(*delay_seconds, &self.audio)
            }
            PlannedAudio::Silence => {
                cmd.args(["-f", "lavfi", "-i"]).arg(format!(
                    "anullsrc=channel_layout={}:sample_rate={}",
                    self.audio.channel_layout(),
                    self.audio.sample_rate
                ));
                format!("aformat=sample_rates={}", self.audio.sample_rate)
            }
        };

        cmd.args(["-map", "0:v:0", "-map", "1:a:0", "-af"])
            .arg(audio_filter)
            .args(["-frames:v"])
            .arg(plan.frame_count.to_string())
            .args(["-c:v", "libx264", "-tune", "stillimage", "-pix_fmt", "yuv420p", "-r"])
            .arg(format!("{}/{}", self.fps.num, self.fps.den))
            .args(["-c:a"])
            .arg(&self.audio.codec)
            .args(["-ar"])
            .arg(self.audio.sample_rate.to_string())
            .args(["-ac"])
            .arg(self.audio.channels.to_string())
            .args(["-t"])
            .arg(format!("{:.6}", plan.rendered_seconds(self.fps)))
            .args(["-movflags", "+faststart"])
            .arg(out_path);
        cmd
    }
}

/// Leading silence, then speech, then silence padding up to the segment length (bounded by `-t`).
fn narration_filter(delay_seconds: f64, audio: &AudioDescriptor) -> String {
    let mut chain = vec![format!(
        "aresample={},aformat=channel_layouts={}",
        audio.sample_rate,
        audio.channel_layout()
    )];
    let delay_ms = (delay_seconds * 1000.0).round() as u64;
    if delay_ms > 0 {
        chain.push(format!("adelay={delay_ms}:all=1"));
    }
    chain.push("apad".to_owned());
    chain.join(",")
}

impl SegmentRenderer for FfmpegSegmentRenderer {
    type Scratch = SlideRasterizer;

    fn scratch(&self) -> SlideRasterizer {
        SlideRasterizer::new()
    }

    fn required_tools(&self) -> Vec<&'static str> {
        vec!["ffmpeg", "ffprobe"]
    }

    #[tracing::instrument(skip_all, fields(slide = job.slide.index))]
    fn render(
        &self,
        scratch: &mut SlideRasterizer,
        job: &RenderJob<'_>,
        cancel: &CancelHandle,
    ) -> SlideReelResult<Segment> {
        let index = job.slide.index;
        let frame = match (&job.slide.content, job.layout) {
            (SlideContent::Lines(lines), Some(layout)) => {
                scratch.rasterize_text(&self.style, &self.font, lines, layout)?
            }
            (SlideContent::Lines(_), None) => {
                return Err(SlideReelError::render(index, "text slide has no layout"));
            }
            (SlideContent::Image(bytes), _) => scratch
                .rasterize_image(&self.style, bytes)
                .map_err(|e| SlideReelError::input(Some(index), e.to_string()))?,
        };
        let image_path = job.slide_dir.join("slide.png");
        frame.write_png(&image_path)?;

        let out_path = segment_path(job.slide_dir);
        run_tool(&mut self.encode(&image_path, job.plan, &out_path), cancel)
            .map_err(|e| SlideReelError::render(index, e.to_string()))?;

        let probe = probe_media(&out_path, cancel)
            .map_err(|e| SlideReelError::render(index, e.to_string()))?;
        let audio_descriptor = probe
            .audio
            .ok_or_else(|| SlideReelError::render(index, "encoded segment has no audio stream"))?;
        tracing::debug!(
            duration = probe.duration_seconds,
            frames = job.plan.frame_count,
            "segment encoded"
        );

        Ok(Segment {
            slide_index: index,
            duration_seconds: job.plan.duration_seconds,
            video_path: out_path,
            audio_descriptor,
        })
    }
}

/// Where a slide's encoded segment lives inside its directory.
pub fn segment_path(slide_dir: &Path) -> PathBuf {
    slide_dir.join("segment.mp4")
}

#[cfg(test)]
#[path = "../../tests/unit/render/segment.rs"]
mod tests;
