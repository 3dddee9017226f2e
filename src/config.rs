//! Immutable run configuration.
//!
//! A [`RunConfig`] is built once (defaults, then an optional JSON file, then CLI overrides),
//! validated once, and passed by reference to every stage of a run.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::content::narration::LanguageSelection;
use crate::foundation::core::{AudioDescriptor, Fps, Resolution, Rgba8};
use crate::foundation::error::{SlideReelError, SlideReelResult};

/// Slide background.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    /// Solid fill.
    Color(Rgba8),
    /// Image scaled to cover the whole frame.
    Image(PathBuf),
}

/// Speech engine used for narrated slides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechEngine {
    /// macOS `say`.
    Say,
    /// `espeak-ng`.
    EspeakNg,
}

/// Horizontal placement of each text line inside the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// Vertical placement of the text block inside the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Final MP4 path.
    pub output: PathBuf,
    pub resolution: Resolution,
    pub fps: Fps,
    pub background: Background,
    pub text_color: Rgba8,
    pub speech_engine: SpeechEngine,
    pub voice: String,
    /// `.ttf`/`.otf`/`.ttc` file used for both measurement and rendering.
    pub font_file: PathBuf,
    /// Upper bound for the fitted font size, in pixels.
    pub max_font_size: u32,
    /// Symmetric margin in pixels on every side of the frame.
    pub margin: u32,
    /// Duration of slides without narration, in seconds.
    pub silent_duration: f64,
    /// Silence before narration starts on narrated slides, in seconds.
    pub narration_delay: f64,
    /// Upper bound for concurrently processed slides.
    pub concurrency: usize,
    pub languages: LanguageSelection,
    /// Stream format every segment's audio is normalized to before concatenation.
    pub audio: AudioDescriptor,
    /// Extra attempts for crashed render/synthesis processes.
    pub max_retries: u32,
    /// Treat a line wider than the canvas at size 1 as a layout error.
    pub strict_width: bool,
    /// Render the `## ` heading of markdown slides.
    pub show_titles: bool,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    /// Keep intermediate files instead of removing them at the end of the run.
    pub keep_work_dir: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("output.mp4"),
            resolution: Resolution::new(1920, 1080),
            fps: Fps { num: 30, den: 1 },
            background: Background::Color(Rgba8::BLACK),
            text_color: Rgba8::WHITE,
            speech_engine: SpeechEngine::Say,
            voice: "Ting-Ting".to_owned(),
            font_file: PathBuf::from("/System/Library/Fonts/PingFang.ttc"),
            max_font_size: 72,
            margin: 100,
            silent_duration: 3.0,
            narration_delay: 0.0,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            languages: LanguageSelection::default(),
            audio: AudioDescriptor::canonical_default(),
            max_retries: 2,
            strict_width: false,
            show_titles: false,
            text_align: TextAlign::default(),
            vertical_align: VerticalAlign::default(),
            keep_work_dir: false,
        }
    }
}

impl RunConfig {
    /// Load a config file; fields missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> SlideReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            SlideReelError::validation(format!("config '{}': {e}", path.display()))
        })
    }

    pub fn validate(&self) -> SlideReelResult<()> {
        let Resolution { width, height } = self.resolution;
        if width == 0 || height == 0 {
            return Err(SlideReelError::validation(
                "resolution width/height must be non-zero",
            ));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            // yuv420p output needs even dimensions.
            return Err(SlideReelError::validation(
                "resolution width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(SlideReelError::validation(format!(
                "resolution {} exceeds the rasterizer limit of {}",
                self.resolution,
                u16::MAX
            )));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.max_font_size == 0 {
            return Err(SlideReelError::validation("max_font_size must be >= 1"));
        }
        if self.resolution.canvas(self.margin).is_empty() {
            return Err(SlideReelError::validation(format!(
                "margin {} leaves no canvas inside {}",
                self.margin, self.resolution
            )));
        }
        if !self.silent_duration.is_finite() || self.silent_duration <= 0.0 {
            return Err(SlideReelError::validation(
                "silent_duration must be finite and > 0",
            ));
        }
        if !self.narration_delay.is_finite() || self.narration_delay < 0.0 {
            return Err(SlideReelError::validation(
                "narration_delay must be finite and >= 0",
            ));
        }
        if self.concurrency == 0 {
            return Err(SlideReelError::validation("concurrency must be >= 1"));
        }
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(SlideReelError::validation(
                "canonical audio sample_rate and channels must be non-zero",
            ));
        }
        if self.audio.known_channel_layout().is_none() {
            return Err(SlideReelError::validation(format!(
                "canonical audio has {} channels; supported counts are 1 to 8",
                self.audio.channels
            )));
        }
        if self.audio.codec.trim().is_empty() {
            return Err(SlideReelError::validation(
                "canonical audio codec must be set",
            ));
        }
        if self.voice.trim().is_empty() {
            return Err(SlideReelError::validation("voice must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
