use std::path::Path;
use std::process::Command;

use crate::foundation::core::AudioDescriptor;
use crate::media::process::{CancelHandle, ToolError, run_tool};

/// Stream layout and duration of a media file as reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProbe {
    /// Container duration in seconds.
    pub duration_seconds: f64,
    /// First audio stream, if any.
    pub audio: Option<AudioDescriptor>,
    /// Duration of the first audio stream, when the container reports one.
    pub audio_duration_seconds: Option<f64>,
    pub has_video: bool,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe `path` through `ffprobe`.
pub fn probe_media(path: &Path, cancel: &CancelHandle) -> Result<MediaProbe, ToolError> {
    let out = run_tool(
        Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path),
        cancel,
    )?;
    parse_probe_json(&out.stdout).map_err(|reason| ToolError::Parse {
        tool: "ffprobe".to_owned(),
        reason: format!("'{}': {reason}", path.display()),
    })
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(bytes: &[u8]) -> Result<MediaProbe, String> {
    let parsed: ProbeOut =
        serde_json::from_slice(bytes).map_err(|e| format!("ffprobe json parse failed: {e}"))?;

    let audio_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));
    let audio = match audio_stream {
        Some(s) => Some(AudioDescriptor {
            sample_rate: s
                .sample_rate
                .as_deref()
                .and_then(|v| v.parse().ok())
                .ok_or("audio stream has no sample_rate")?,
            channels: s.channels.ok_or("audio stream has no channel count")?,
            codec: s
                .codec_name
                .clone()
                .ok_or("audio stream has no codec_name")?,
        }),
        None => None,
    };
    let audio_duration_seconds = audio_stream.and_then(|s| parse_secs(s.duration.as_deref()));
    let has_video = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("video"));

    let duration_seconds = parsed
        .format
        .as_ref()
        .and_then(|f| parse_secs(f.duration.as_deref()))
        .or(audio_duration_seconds)
        .ok_or("no duration reported")?;

    Ok(MediaProbe {
        duration_seconds,
        audio,
        audio_duration_seconds,
        has_video,
    })
}

fn parse_secs(v: Option<&str>) -> Option<f64> {
    v.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
