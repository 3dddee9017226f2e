use std::fmt;

/// Result alias used across the crate.
pub type SlideReelResult<T> = Result<T, SlideReelError>;

/// Which layout bound a slide violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutBound {
    /// Widest line exceeds the canvas width.
    Width,
    /// `line_count * line_height` exceeds the canvas height.
    Height,
}

impl fmt::Display for LayoutBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => f.write_str("width"),
            Self::Height => f.write_str("height"),
        }
    }
}

/// Failure reported by a narration synthesizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthesisFailure {
    /// The configured voice is not offered by the engine.
    VoiceNotFound {
        /// Voice identifier as configured.
        voice: String,
    },
    /// The engine ran but did not produce usable audio.
    EngineFailed(String),
}

impl fmt::Display for SynthesisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VoiceNotFound { voice } => write!(f, "voice '{voice}' not found"),
            Self::EngineFailed(msg) => f.write_str(msg),
        }
    }
}

fn slide_prefix(slide_index: &Option<usize>) -> String {
    match slide_index {
        Some(i) => format!("slide {i}: "),
        None => String::new(),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SlideReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("input error: {}{reason}", slide_prefix(.slide_index))]
    Input {
        slide_index: Option<usize>,
        reason: String,
    },

    #[error("layout error: slide {slide_index}: {bound} bound violated: {detail}")]
    Layout {
        slide_index: usize,
        bound: LayoutBound,
        detail: String,
    },

    #[error("synthesis error: {}{failure}", slide_prefix(.slide_index))]
    Synthesis {
        slide_index: Option<usize>,
        failure: SynthesisFailure,
    },

    #[error("render error: slide {slide_index}: {reason}")]
    Render { slide_index: usize, reason: String },

    #[error("concatenation error: {}{reason}", slide_prefix(.slide_index))]
    Concatenation {
        slide_index: Option<usize>,
        reason: String,
    },

    #[error("dependency error: '{tool}': {reason}")]
    Dependency { tool: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlideReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn input(slide_index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::Input {
            slide_index,
            reason: reason.into(),
        }
    }

    pub fn layout(slide_index: usize, bound: LayoutBound, detail: impl Into<String>) -> Self {
        Self::Layout {
            slide_index,
            bound,
            detail: detail.into(),
        }
    }

    pub fn voice_not_found(voice: impl Into<String>) -> Self {
        Self::Synthesis {
            slide_index: None,
            failure: SynthesisFailure::VoiceNotFound {
                voice: voice.into(),
            },
        }
    }

    pub fn synthesis(slide_index: Option<usize>, msg: impl Into<String>) -> Self {
        Self::Synthesis {
            slide_index,
            failure: SynthesisFailure::EngineFailed(msg.into()),
        }
    }

    pub fn render(slide_index: usize, reason: impl Into<String>) -> Self {
        Self::Render {
            slide_index,
            reason: reason.into(),
        }
    }

    pub fn concatenation(slide_index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::Concatenation {
            slide_index,
            reason: reason.into(),
        }
    }

    pub fn dependency(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dependency {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Slide the error is attributed to, when there is one.
    pub fn slide_index(&self) -> Option<usize> {
        match self {
            Self::Input { slide_index, .. }
            | Self::Synthesis { slide_index, .. }
            | Self::Concatenation { slide_index, .. } => *slide_index,
            Self::Layout { slide_index, .. } | Self::Render { slide_index, .. } => {
                Some(*slide_index)
            }
            Self::Validation(_) | Self::Dependency { .. } | Self::Other(_) => None,
        }
    }

    /// Attach a slide index to errors raised by collaborators that do not know it.
    pub fn at_slide(self, index: usize) -> Self {
        match self {
            Self::Input {
                slide_index: None,
                reason,
            } => Self::Input {
                slide_index: Some(index),
                reason,
            },
            Self::Synthesis {
                slide_index: None,
                failure,
            } => Self::Synthesis {
                slide_index: Some(index),
                failure,
            },
            Self::Concatenation {
                slide_index: None,
                reason,
            } => Self::Concatenation {
                slide_index: Some(index),
                reason,
            },
            other => other,
        }
    }

    /// Crashed external processes may succeed on a second attempt; everything else is
    /// deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Render { .. }
                | Self::Synthesis {
                    failure: SynthesisFailure::EngineFailed(_),
                    ..
                }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
