//! Per-slide timing: how long each segment lasts and what it sounds like.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::content::narration::NarrationBlock;
use crate::foundation::core::{AudioDescriptor, Fps};
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::media::process::CancelHandle;
use crate::speech::NarrationSynthesizer;

/// Audio track of a planned segment.
#[derive(Clone, Debug, PartialEq)]
pub enum PlannedAudio {
    /// Synthesized speech, preceded by `delay_seconds` of silence.
    Narration {
        path: PathBuf,
        delay_seconds: f64,
        audio_seconds: f64,
    },
    /// Silence for the whole segment.
    Silence,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentPlan {
    pub slide_index: usize,
    /// `narration_delay + D` for narrated slides, `silent_duration` otherwise. Not rounded.
    pub duration_seconds: f64,
    /// Whole frames the segment is rendered with: `ceil(duration_seconds * fps)`, at least 1.
    pub frame_count: u64,
    pub audio: PlannedAudio,
}

impl SegmentPlan {
    pub fn is_narrated(&self) -> bool {
        matches!(self.audio, PlannedAudio::Narration { .. })
    }

    /// Length of the encoded segment, `frame_count / fps`.
    pub fn rendered_seconds(&self, fps: Fps) -> f64 {
        fps.frames_to_secs(self.frame_count)
    }
}

/// Resolves each slide's duration and audio from its narration, if any.
pub struct SegmentPlanner<'a> {
    synthesizer: &'a dyn NarrationSynthesizer,
    voice: String,
    fps: Fps,
    silent_duration: f64,
    narration_delay: f64,
}

impl<'a> SegmentPlanner<'a> {
    pub fn new(config: &RunConfig, synthesizer: &'a dyn NarrationSynthesizer) -> Self {
        Self {
            synthesizer,
            voice: config.voice.clone(),
            fps: config.fps,
            silent_duration: config.silent_duration,
            narration_delay: config.narration_delay,
        }
    }

    /// Plan one slide. Narration is synthesized into `slide_dir`.
    pub fn plan(
        &self,
        slide_index: usize,
        narration: Option<&NarrationBlock>,
        slide_dir: &Path,
        cancel: &CancelHandle,
    ) -> SlideReelResult<SegmentPlan> {
        let Some(block) = narration else {
            return Ok(self.silent(slide_index));
        };
        if block.text.trim().is_empty() {
            return Err(SlideReelError::input(
                Some(slide_index),
                "narration block is present but empty",
            ));
        }

        let path = slide_dir.join(format!(
            "narration.{}",
            self.synthesizer.audio_extension()
        ));
        let audio_seconds = self
            .synthesizer
            .synthesize(&block.text, &self.voice, &path, cancel)
            .map_err(|e| e.at_slide(slide_index))?;
        if !audio_seconds.is_finite() || audio_seconds <= 0.0 {
            return Err(SlideReelError::synthesis(
                Some(slide_index),
                format!("synthesizer reported a duration of {audio_seconds}s"),
            ));
        }
        tracing::debug!(slide = slide_index, audio_seconds, "narration synthesized");
        Ok(self.narrated(slide_index, path, audio_seconds))
    }

    pub fn silent(&self, slide_index: usize) -> SegmentPlan {
        SegmentPlan {
            slide_index,
            duration_seconds: self.silent_duration,
            frame_count: self.fps.secs_to_frames_ceil(self.silent_duration),
            audio: PlannedAudio::Silence,
        }
    }

    pub fn narrated(&self, slide_index: usize, path: PathBuf, audio_seconds: f64) -> SegmentPlan {
        let duration_seconds = self.narration_delay + audio_seconds;
        SegmentPlan {
            slide_index,
            duration_seconds,
            frame_count: self.fps.secs_to_frames_ceil(duration_seconds),
            audio: PlannedAudio::Narration {
                path,
                delay_seconds: self.narration_delay,
                audio_seconds,
            },
        }
    }
}

/// One rendered slide clip.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub slide_index: usize,
    /// Planned duration (see [`SegmentPlan::duration_seconds`]).
    pub duration_seconds: f64,
    pub video_path: PathBuf,
    pub audio_descriptor: AudioDescriptor,
}

/// Ordered segments of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoPlan {
    segments: Vec<Segment>,
    total_duration: f64,
}

impl VideoPlan {
    /// Order `segments` by slide index and check there is exactly one per slide `1..=slide_count`.
    pub fn assemble(mut segments: Vec<Segment>, slide_count: usize) -> SlideReelResult<Self> {
        segments.sort_by_key(|s| s.slide_index);
        for (i, s) in segments.iter().enumerate() {
            let expected = i + 1;
            if s.slide_index != expected {
                let missing = if s.slide_index > expected {
                    expected
                } else {
                    s.slide_index
                };
                return Err(SlideReelError::concatenation(
                    Some(missing),
                    if s.slide_index > expected {
                        "segment is missing".to_owned()
                    } else {
                        "more than one segment for this slide".to_owned()
                    },
                ));
            }
        }
        match segments.len().cmp(&slide_count) {
            Ordering::Less => {
                return Err(SlideReelError::concatenation(
                    Some(segments.len() + 1),
                    format!(
                        "segment is missing ({} segments for {slide_count} slides)",
                        segments.len()
                    ),
                ));
            }
            Ordering::Greater => {
                return Err(SlideReelError::concatenation(
                    Some(slide_count + 1),
                    format!("segment has no slide (deck has {slide_count} slides)"),
                ));
            }
            Ordering::Equal => {}
        }
        let total_duration = segments.iter().map(|s| s.duration_seconds).sum();
        Ok(Self {
            segments,
            total_duration,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Allowed drift between a segment's planned and encoded duration: one video frame for the
/// round-up to a frame boundary plus one AAC frame (1024 samples) of encoder padding.
pub fn segment_tolerance_secs(fps: Fps, audio: &AudioDescriptor) -> f64 {
    fps.frame_duration_secs() + 1024.0 / f64::from(audio.sample_rate.max(1))
}

#[cfg(test)]
#[path = "../tests/unit/plan.rs"]
mod tests;
