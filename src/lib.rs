//! slidereel turns a deck of literal text slides and a per-slide narration script into one
//! narrated MP4.
//!
//! A run goes through four stages:
//!
//! - Fit each text slide to the largest font size that keeps every line inside the canvas
//! - Plan each slide's segment: narration length plus delay, or the silent duration
//! - Render every segment on a bounded worker pool
//! - Normalize the segments' audio, validate them, and concatenate them in slide order
//!
//! [`run`] wires these together; every stage takes its collaborators as trait objects so that it
//! can be driven without external tools.
#![forbid(unsafe_code)]

mod foundation;

pub mod concat;
/// Run configuration.
pub mod config;
pub mod content;
pub mod layout;
pub mod media;
pub mod pipeline;
pub mod plan;
pub mod render;
/// Narration synthesis with external speech engines.
pub mod speech;

pub use crate::foundation::core::{AudioDescriptor, Canvas, Fps, Resolution, Rgba8};
pub use crate::foundation::error::{
    LayoutBound, SlideReelError, SlideReelResult, SynthesisFailure,
};

pub use crate::concat::{ConcatBackend, ConcatReport, Concatenator, FfmpegConcatBackend};
pub use crate::config::{Background, RunConfig, SpeechEngine, TextAlign, VerticalAlign};
pub use crate::content::narration::{
    LanguageSelection, MarkdownScriptSource, NarrationBlock, NarrationMap, NarrationSource,
};
pub use crate::content::slides::{
    ImageSlideSource, MarkdownSlideSource, Slide, SlideContent, SlideContentSource,
};
pub use crate::layout::fit::{FontFitEngine, LayoutResult};
pub use crate::layout::measure::{
    FixedAdvanceMeasurer, FontDescriptor, LineMetrics, MeasurerFactory, ParleyMeasurer,
    TextMeasurer,
};
pub use crate::media::process::CancelHandle;
pub use crate::pipeline::{Collaborators, RunReport, SlideOutcome, run};
pub use crate::plan::{PlannedAudio, Segment, SegmentPlan, SegmentPlanner, VideoPlan};
pub use crate::render::segment::{FfmpegSegmentRenderer, RenderJob, SegmentRenderer};
pub use crate::speech::{CommandSynthesizer, NarrationSynthesizer};
