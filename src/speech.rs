//! Narration synthesis: text in, audio file and its duration out.

use std::path::Path;
use std::process::Command;

use anyhow::Context as _;

use crate::config::SpeechEngine;
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::media::probe::probe_media;
use crate::media::process::{CancelHandle, ToolError, run_tool};

/// Text-to-speech collaborator.
///
/// Implementations are shared by all workers of a run.
pub trait NarrationSynthesizer: Sync {
    /// Fail with `VoiceNotFound` when `voice` is not offered. Called once per run.
    fn validate_voice(&self, voice: &str, cancel: &CancelHandle) -> SlideReelResult<()>;

    /// Speak `text` with `voice` into `out_path` and return the audio duration in seconds.
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        out_path: &Path,
        cancel: &CancelHandle,
    ) -> SlideReelResult<f64>;

    /// Extension of the files [`synthesize`](Self::synthesize) writes.
    fn audio_extension(&self) -> &'static str;

    /// External programs the synthesizer needs on `PATH`.
    fn required_tools(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

impl SpeechEngine {
    pub fn program(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::EspeakNg => "espeak-ng",
        }
    }

    fn audio_extension(self) -> &'static str {
        match self {
            Self::Say => "aiff",
            Self::EspeakNg => "wav",
        }
    }
}

/// Synthesizer backed by a speech command: macOS `say` or `espeak-ng`.
///
/// Narration is handed over through a text file next to the output to stay clear of argument
/// length limits. Durations come from `ffprobe`.
#[derive(Clone, Copy, Debug)]
pub struct CommandSynthesizer {
    engine: SpeechEngine,
}

impl CommandSynthesizer {
    pub fn new(engine: SpeechEngine) -> Self {
        Self { engine }
    }

    pub fn voices(&self, cancel: &CancelHandle) -> SlideReelResult<Vec<String>> {
        let mut cmd = Command::new(self.engine.program());
        match self.engine {
            SpeechEngine::Say => cmd.args(["-v", "?"]),
            SpeechEngine::EspeakNg => cmd.arg("--voices"),
        };
        let out = run_tool(&mut cmd, cancel).map_err(engine_failure)?;
        let text = out.stdout_text();
        Ok(match self.engine {
            SpeechEngine::Say => parse_say_voices(&text),
            SpeechEngine::EspeakNg => parse_espeak_voices(&text),
        })
    }
}

impl NarrationSynthesizer for CommandSynthesizer {
    fn validate_voice(&self, voice: &str, cancel: &CancelHandle) -> SlideReelResult<()> {
        let voices = self.voices(cancel)?;
        if voices.iter().any(|v| v.eq_ignore_ascii_case(voice.trim())) {
            return Ok(());
        }
        tracing::debug!(available = voices.len(), "voice lookup failed");
        Err(SlideReelError::voice_not_found(voice))
    }

    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        out_path: &Path,
        cancel: &CancelHandle,
    ) -> SlideReelResult<f64> {
        let text_path = out_path.with_extension("txt");
        std::fs::write(&text_path, text)
            .with_context(|| format!("failed to write narration '{}'", text_path.display()))?;

        let mut cmd = Command::new(self.engine.program());
        match self.engine {
            SpeechEngine::Say => cmd
                .args(["-v", voice, "-o"])
                .arg(out_path)
                .arg("--file-format=AIFF")
                .arg("-f")
                .arg(&text_path),
            SpeechEngine::EspeakNg => cmd
                .args(["-v", voice, "-w"])
                .arg(out_path)
                .arg("-f")
                .arg(&text_path),
        };
        run_tool(&mut cmd, cancel).map_err(engine_failure)?;

        let probe = probe_media(out_path, cancel).map_err(engine_failure)?;
        let duration = probe
            .audio_duration_seconds
            .unwrap_or(probe.duration_seconds);
        if duration <= 0.0 {
            return Err(SlideReelError::synthesis(
                None,
                format!("'{}' produced empty audio", self.engine.program()),
            ));
        }
        Ok(duration)
    }

    fn audio_extension(&self) -> &'static str {
        self.engine.audio_extension()
    }

    fn required_tools(&self) -> Vec<&'static str> {
        vec![self.engine.program()]
    }
}

fn engine_failure(e: ToolError) -> SlideReelError {
    SlideReelError::synthesis(None, e.to_string())
}

/// Voice names from `say -v ?`: `Name   locale   # sample sentence`.
pub fn parse_say_voices(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next().unwrap_or_default().trim();
            let (name, _locale) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_owned())
        })
        .collect()
}

/// Language, voice name and voice file columns from `espeak-ng --voices`.
pub fn parse_espeak_voices(listing: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in listing.lines().skip(1) {
        let cols = line.split_whitespace().collect::<Vec<_>>();
        for i in [1, 3, 4] {
            if let Some(c) = cols.get(i) {
                out.push((*c).to_owned());
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/speech.rs"]
mod tests;
