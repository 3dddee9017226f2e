use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{SlideReelError, SlideReelResult};

/// Resolve `tool` on `PATH`.
pub fn require_tool(tool: &str) -> SlideReelResult<PathBuf> {
    which::which(tool)
        .map_err(|e| SlideReelError::dependency(tool, format!("not found on PATH ({e})")))
}

/// Fail with the first of `tools` that is missing from `PATH`.
pub fn require_tools(tools: &[&str]) -> SlideReelResult<()> {
    for tool in tools {
        let path = require_tool(tool)?;
        tracing::debug!(tool, path = %path.display(), "found");
    }
    Ok(())
}

/// Return `true` when `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SlideReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
