//! One run: fit, plan and render every slide on a bounded worker pool, then concatenate.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use rayon::prelude::*;

use crate::concat::{ConcatBackend, Concatenator};
use crate::config::RunConfig;
use crate::content::narration::{NarrationMap, NarrationSource};
use crate::content::slides::{Slide, SlideContent, SlideContentSource};
use crate::foundation::error::{SlideReelError, SlideReelResult};
use crate::layout::fit::{FontFitEngine, LayoutResult};
use crate::layout::measure::{FontDescriptor, MeasurerFactory, TextMeasurer};
use crate::media::process::CancelHandle;
use crate::media::tools::require_tools;
use crate::plan::{Segment, SegmentPlan, SegmentPlanner, VideoPlan};
use crate::render::segment::{RenderJob, SegmentRenderer};
use crate::speech::NarrationSynthesizer;

/// The collaborators a run is wired with.
pub struct Collaborators<'a, R: SegmentRenderer> {
    pub slides: &'a dyn SlideContentSource,
    /// `None` renders every slide silent.
    pub narration: Option<&'a dyn NarrationSource>,
    pub measurers: &'a dyn MeasurerFactory,
    pub synthesizer: &'a dyn NarrationSynthesizer,
    pub renderer: &'a R,
    pub concat: &'a dyn ConcatBackend,
}

/// What one slide produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SlideOutcome {
    pub layout: Option<LayoutResult>,
    pub plan: SegmentPlan,
    pub segment: Segment,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub output: PathBuf,
    pub slide_count: usize,
    pub narrated_count: usize,
    /// Sum of planned segment durations.
    pub planned_seconds: f64,
    /// Duration of the written file.
    pub encoded_seconds: f64,
    /// Per-slide outcomes in slide order.
    pub slides: Vec<SlideOutcome>,
    /// Intermediates directory, when it was kept.
    pub work_dir: Option<PathBuf>,
}

/// Produce `config.output` from the collaborators. Nothing is written to the output path unless
/// every slide succeeded and the concatenated file passed validation.
#[tracing::instrument(skip_all, fields(output = %config.output.display()))]
pub fn run<R: SegmentRenderer>(
    config: &RunConfig,
    font: &FontDescriptor,
    c: Collaborators<'_, R>,
) -> SlideReelResult<RunReport> {
    config.validate()?;
    let slides = c.slides.slides()?;
    let narration = match c.narration {
        Some(source) => source.narration(&slides)?,
        None => NarrationMap::new(),
    };
    tracing::info!(
        slides = slides.len(),
        narrated = narration.len(),
        "starting run"
    );

    let mut tools = c.renderer.required_tools();
    tools.extend(c.concat.required_tools());
    if !narration.is_empty() {
        tools.extend(c.synthesizer.required_tools());
    }
    tools.sort_unstable();
    tools.dedup();
    require_tools(&tools)?;

    let cancel = CancelHandle::new();
    if !narration.is_empty() {
        c.synthesizer.validate_voice(&config.voice, &cancel)?;
    }

    let work = tempfile::Builder::new()
        .prefix("slidereel-")
        .tempdir()
        .context("failed to create the work directory")?;
    tracing::debug!(work_dir = %work.path().display(), "work directory");

    let engine = FontFitEngine::new(
        font.clone(),
        config.max_font_size,
        config.resolution.canvas(config.margin),
        config.strict_width,
    );
    let planner = SegmentPlanner::new(config, c.synthesizer);
    let worker = SlideWorker {
        engine: &engine,
        planner: &planner,
        renderer: c.renderer,
        narration: &narration,
        work_dir: work.path(),
        max_retries: config.max_retries,
        cancel: &cancel,
    };

    let pool = build_thread_pool(config.concurrency.min(slides.len()).max(1))?;
    let failure = Mutex::new(None::<SlideReelError>);
    let outcomes = pool.install(|| {
        slides
            .par_iter()
            .map_init(
                || (c.measurers.create(), c.renderer.scratch()),
                |(measurer, scratch), slide| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    match worker.process(slide, measurer.as_mut(), scratch) {
                        Ok(outcome) => Some(outcome),
                        Err(e) => {
                            record_failure(&failure, &cancel, e);
                            None
                        }
                    }
                },
            )
            .collect::<Vec<_>>()
    });

    let failure = failure.into_inner().unwrap_or_else(|p| p.into_inner());
    if let Some(e) = failure {
        tracing::error!(slide = e.slide_index(), "run aborted: {e}");
        return Err(e);
    }
    let outcomes = outcomes
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SlideReelError::concatenation(None, "a slide finished without a segment"))?;

    let plan = VideoPlan::assemble(
        outcomes.iter().map(|o| o.segment.clone()).collect(),
        slides.len(),
    )?;
    let report = Concatenator::new(c.concat, config.audio.clone(), config.fps).run(
        &plan,
        slides.len(),
        work.path(),
        &config.output,
        &cancel,
    )?;

    let work_dir = if config.keep_work_dir {
        Some(work.keep())
    } else {
        None
    };
    let narrated_count = outcomes.iter().filter(|o| o.plan.is_narrated()).count();
    tracing::info!(
        slides = slides.len(),
        narrated = narrated_count,
        duration_secs = report.encoded_seconds,
        output = %report.output.display(),
        "video written"
    );

    Ok(RunReport {
        output: report.output,
        slide_count: slides.len(),
        narrated_count,
        planned_seconds: report.planned_seconds,
        encoded_seconds: report.encoded_seconds,
        slides: outcomes,
        work_dir,
    })
}

/// Keep the first failure and stop the run. Failures after the stop are fallout and dropped.
fn record_failure(slot: &Mutex<Option<SlideReelError>>, cancel: &CancelHandle, e: SlideReelError) {
    let Ok(mut slot) = slot.lock() else {
        cancel.cancel();
        return;
    };
    if slot.is_none() && !cancel.is_cancelled() {
        *slot = Some(e);
    } else {
        tracing::debug!("discarding error after abort: {e}");
    }
    cancel.cancel();
}

/// Everything a worker needs for one slide; shared read-only by all workers.
struct SlideWorker<'a, R: SegmentRenderer> {
    engine: &'a FontFitEngine,
    planner: &'a SegmentPlanner<'a>,
    renderer: &'a R,
    narration: &'a NarrationMap,
    work_dir: &'a Path,
    max_retries: u32,
    cancel: &'a CancelHandle,
}

impl<R: SegmentRenderer> SlideWorker<'_, R> {
    fn process(
        &self,
        slide: &Slide,
        measurer: &mut dyn TextMeasurer,
        scratch: &mut R::Scratch,
    ) -> SlideReelResult<SlideOutcome> {
        let index = slide.index;
        let slide_dir = self.work_dir.join(format!("slide_{index:04}"));
        std::fs::create_dir_all(&slide_dir)
            .with_context(|| format!("failed to create '{}'", slide_dir.display()))?;

        let layout = match &slide.content {
            SlideContent::Lines(lines) => Some(self.engine.fit(index, lines, measurer)?),
            SlideContent::Image(_) => None,
        };

        let plan = self.retrying(index, "synthesis", || {
            self.planner
                .plan(index, self.narration.get(index), &slide_dir, self.cancel)
        })?;

        let job = RenderJob {
            slide,
            layout: layout.as_ref(),
            plan: &plan,
            slide_dir: &slide_dir,
        };
        let segment = self.retrying(index, "render", || {
            self.renderer.render(scratch, &job, self.cancel)
        })?;

        tracing::debug!(
            slide = index,
            font_size = layout.as_ref().map(|l| l.font_size),
            duration = plan.duration_seconds,
            narrated = plan.is_narrated(),
            "slide done"
        );
        Ok(SlideOutcome {
            layout,
            plan,
            segment,
        })
    }

    /// Retry transient failures up to `max_retries` extra times.
    fn retrying<T>(
        &self,
        index: usize,
        stage: &str,
        mut f: impl FnMut() -> SlideReelResult<T>,
    ) -> SlideReelResult<T> {
        let mut attempt = 0u32;
        loop {
            match f() {
                Ok(v) => return Ok(v),
                Err(e)
                    if e.is_transient()
                        && attempt < self.max_retries
                        && !self.cancel.is_cancelled() =>
                {
                    attempt += 1;
                    tracing::warn!(slide = index, attempt, "{stage} failed, retrying: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn build_thread_pool(threads: usize) -> SlideReelResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(SlideReelError::validation("worker count must be >= 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("slidereel-worker-{i}"))
        .build()
        .map_err(|e| SlideReelError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
