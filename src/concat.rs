//! Stream normalization and ordered concatenation of segments into the final file.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{AudioDescriptor, Fps};
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::media::probe::MediaProbe;
use crate::media::process::CancelHandle;
use crate::media::tools::ensure_parent_dir;
use crate::plan::{VideoPlan, segment_tolerance_secs};

pub mod ffmpeg;

pub use ffmpeg::FfmpegConcatBackend;

/// Media operations the concatenator is built on.
pub trait ConcatBackend {
    /// Copy `input` to `output` with its audio re-encoded to `canonical`.
    fn normalize(
        &self,
        input: &Path,
        output: &Path,
        canonical: &AudioDescriptor,
        cancel: &CancelHandle,
    ) -> SlideReelResult<()>;

    fn probe(&self, path: &Path, cancel: &CancelHandle) -> SlideReelResult<MediaProbe>;

    /// Join `inputs` in order into `output`. `work_dir` may hold scratch files.
    fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        work_dir: &Path,
        cancel: &CancelHandle,
    ) -> SlideReelResult<()>;

    /// External programs the backend needs on `PATH`.
    fn required_tools(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Summary of a finished concatenation.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcatReport {
    pub output: PathBuf,
    pub segment_count: usize,
    /// Sum of planned segment durations.
    pub planned_seconds: f64,
    /// Duration of the written file.
    pub encoded_seconds: f64,
}

/// Normalizes every segment to one audio format, validates, and joins them in slide order.
///
/// The output is written under a temporary name next to the target and renamed into place only
/// after every check passed, so a failed run never leaves a partial file behind.
pub struct Concatenator<'a> {
    backend: &'a dyn ConcatBackend,
    canonical: AudioDescriptor,
    fps: Fps,
}

impl<'a> Concatenator<'a> {
    pub fn new(backend: &'a dyn ConcatBackend, canonical: AudioDescriptor, fps: Fps) -> Self {
        Self {
            backend,
            canonical,
            fps,
        }
    }

    pub fn segment_tolerance(&self) -> f64 {
        segment_tolerance_secs(self.fps, &self.canonical)
    }

    #[tracing::instrument(skip_all, fields(segments = plan.len(), output = %output.display()))]
    pub fn run(
        &self,
        plan: &VideoPlan,
        slide_count: usize,
        work_dir: &Path,
        output: &Path,
        cancel: &CancelHandle,
    ) -> SlideReelResult<ConcatReport> {
        if plan.len() != slide_count {
            return Err(SlideReelError::concatenation(
                None,
                format!("{} segments for {slide_count} slides", plan.len()),
            ));
        }
        for segment in plan.segments() {
            if !segment.video_path.is_file() {
                return Err(SlideReelError::concatenation(
                    Some(segment.slide_index),
                    format!("segment file '{}' is missing", segment.video_path.display()),
                ));
            }
        }

        let norm_dir = work_dir.join("normalized");
        std::fs::create_dir_all(&norm_dir)
            .with_context(|| format!("failed to create '{}'", norm_dir.display()))?;

        let tolerance = self.segment_tolerance();
        let mut normalized = Vec::with_capacity(plan.len());
        for segment in plan.segments() {
            let index = segment.slide_index;
            let out = norm_dir.join(format!("slide_{index:04}.mp4"));
            self.backend
                .normalize(&segment.video_path, &out, &self.canonical, cancel)
                .map_err(|e| e.at_slide(index))?;

            let probe = self.backend.probe(&out, cancel).map_err(|e| e.at_slide(index))?;
            self.check_stream(Some(index), &probe)?;
            let drift = (probe.duration_seconds - segment.duration_seconds).abs();
            if drift > tolerance {
                return Err(SlideReelError::concatenation(
                    Some(index),
                    format!(
                        "duration {:.3}s differs from planned {:.3}s by more than {tolerance:.3}s",
                        probe.duration_seconds, segment.duration_seconds
                    ),
                ));
            }
            normalized.push(out);
        }

        ensure_parent_dir(output)?;
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let staging = tempfile::Builder::new()
            .prefix(".slidereel-")
            .suffix(".mp4")
            .tempfile_in(dir)
            .with_context(|| format!("failed to create a temporary file in '{}'", dir.display()))?;

        self.backend
            .concat(&normalized, staging.path(), work_dir, cancel)?;

        let probe = self.backend.probe(staging.path(), cancel)?;
        self.check_stream(None, &probe)?;
        let total_tolerance = tolerance * plan.len() as f64;
        let drift = (probe.duration_seconds - plan.total_duration()).abs();
        if drift > total_tolerance {
            return Err(SlideReelError::concatenation(
                None,
                format!(
                    "output lasts {:.3}s, planned {:.3}s (tolerance {total_tolerance:.3}s)",
                    probe.duration_seconds,
                    plan.total_duration()
                ),
            ));
        }

        staging
            .persist(output)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to move output into '{}'", output.display()))?;

        Ok(ConcatReport {
            output: output.to_path_buf(),
            segment_count: plan.len(),
            planned_seconds: plan.total_duration(),
            encoded_seconds: probe.duration_seconds,
        })
    }

    fn check_stream(&self, slide_index: Option<usize>, probe: &MediaProbe) -> SlideReelResult<()> {
        let Some(audio) = &probe.audio else {
            return Err(SlideReelError::concatenation(
                slide_index,
                "no audio stream after normalization",
            ));
        };
        if let Some(field) = audio.first_mismatch(&self.canonical) {
            return Err(SlideReelError::concatenation(
                slide_index,
                format!(
                    "audio {field} mismatch after normalization: got {audio}, expected {}",
                    self.canonical
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/concat.rs"]
mod tests;
