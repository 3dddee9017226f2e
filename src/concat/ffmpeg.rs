use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;

use crate::concat::ConcatBackend;
use crate::foundation::core::AudioDescriptor;
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::media::probe::{MediaProbe, probe_media};
use crate::media::process::{CancelHandle, ToolError, run_tool};

/// `ffmpeg` audio re-encode per segment, `ffprobe` checks and the concat demuxer for the join.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegConcatBackend;

impl FfmpegConcatBackend {
    fn normalize_command(input: &Path, output: &Path, canonical: &AudioDescriptor) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-map", "0:v:0", "-map", "0:a:0", "-c:v", "copy", "-af"])
            .arg(format!(
                "aresample={},aformat=channel_layouts={}",
                canonical.sample_rate,
                canonical.channel_layout()
            ))
            .args(["-c:a"])
            .arg(&canonical.codec)
            .args(["-ar"])
            .arg(canonical.sample_rate.to_string())
            .args(["-ac"])
            .arg(canonical.channels.to_string())
            .args(["-movflags", "+faststart"])
            .arg(output);
        cmd
    }
}

fn failure(e: ToolError) -> SlideReelError {
    SlideReelError::concatenation(None, e.to_string())
}

/// Concat demuxer list: one `file '<path>'` line per input, single quotes escaped.
pub fn concat_list(inputs: &[PathBuf]) -> String {
    let mut out = String::new();
    for path in inputs {
        let escaped = path.to_string_lossy().replace('\'', r"'\''");
        let _ = writeln!(out, "file '{escaped}'");
    }
    out
}

impl ConcatBackend for FfmpegConcatBackend {
    fn normalize(
        &self,
        input: &Path,
        output: &Path,
        canonical: &AudioDescriptor,
        cancel: &CancelHandle,
    ) -> SlideReelResult<()> {
        run_tool(&mut Self::normalize_command(input, output, canonical), cancel)
            .map_err(failure)?;
        Ok(())
    }

    fn probe(&self, path: &Path, cancel: &CancelHandle) -> SlideReelResult<MediaProbe> {
        probe_media(path, cancel).map_err(failure)
    }

    fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        work_dir: &Path,
        cancel: &CancelHandle,
    ) -> SlideReelResult<()> {
        let absolute = inputs
            .iter()
            .map(|p| std::path::absolute(p).with_context(|| format!("'{}'", p.display())))
            .collect::<Result<Vec<_>, _>>()?;
        let list_path = work_dir.join("concat_list.txt");
        std::fs::write(&list_path, concat_list(&absolute))
            .with_context(|| format!("failed to write '{}'", list_path.display()))?;

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(output);
        run_tool(&mut cmd, cancel).map_err(failure)?;
        Ok(())
    }

    fn required_tools(&self) -> Vec<&'static str> {
        vec!["ffmpeg", "ffprobe"]
    }
}
