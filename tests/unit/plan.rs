use std::collections::HashMap;
use std::sync::Mutex;

use super::*;

/// Reports a fixed duration per text and records every call.
struct Stub {
    durations: HashMap<&'static str, f64>,
    calls: Mutex<Vec<PathBuf>>,
}

impl Stub {
    fn new(durations: &[(&'static str, f64)]) -> Self {
        Self {
            durations: durations.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl NarrationSynthesizer for Stub {
    fn validate_voice(&self, _voice: &str, _cancel: &CancelHandle) -> SlideReelResult<()> {
        Ok(())
    }

    fn synthesize(
        &self,
        text: &str,
        _voice: &str,
        out_path: &Path,
        _cancel: &CancelHandle,
    ) -> SlideReelResult<f64> {
        self.calls.lock().unwrap().push(out_path.to_path_buf());
        self.durations
            .get(text)
            .copied()
            .ok_or_else(|| SlideReelError::synthesis(None, "engine crashed"))
    }

    fn audio_extension(&self) -> &'static str {
        "wav"
    }
}

fn config(delay: f64, silent: f64) -> RunConfig {
    RunConfig {
        narration_delay: delay,
        silent_duration: silent,
        ..RunConfig::default()
    }
}

fn block(slide_index: usize, text: &str) -> NarrationBlock {
    NarrationBlock {
        slide_index,
        text: text.to_owned(),
    }
}

fn segment(slide_index: usize, duration_seconds: f64) -> Segment {
    Segment {
        slide_index,
        duration_seconds,
        video_path: PathBuf::from(format!("{slide_index}.mp4")),
        audio_descriptor: AudioDescriptor::canonical_default(),
    }
}

#[test]
fn silent_slide_lasts_exactly_silent_duration() {
    let stub = Stub::new(&[]);
    let cfg = config(0.5, 3.0);
    let planner = SegmentPlanner::new(&cfg, &stub);
    let p = planner
        .plan(2, None, Path::new("/tmp"), &CancelHandle::new())
        .unwrap();
    assert_eq!(p.duration_seconds, 3.0);
    assert_eq!(p.frame_count, 90);
    assert_eq!(p.audio, PlannedAudio::Silence);
    assert!(stub.calls.lock().unwrap().is_empty());
}

#[test]
fn narrated_slide_lasts_delay_plus_audio() {
    let stub = Stub::new(&[("short", 1.2345), ("a much longer narration text", 1.2345)]);
    let cfg = config(0.5, 3.0);
    let planner = SegmentPlanner::new(&cfg, &stub);
    let dir = Path::new("/work/slide_0001");

    let p = planner
        .plan(1, Some(&block(1, "short")), dir, &CancelHandle::new())
        .unwrap();
    assert_eq!(p.duration_seconds, 0.5 + 1.2345);
    // 1.7345 s at 30 fps = 52.035 frames
    assert_eq!(p.frame_count, 53);
    assert_eq!(
        p.audio,
        PlannedAudio::Narration {
            path: dir.join("narration.wav"),
            delay_seconds: 0.5,
            audio_seconds: 1.2345,
        }
    );

    // Text length does not matter, only the measured audio.
    let q = planner
        .plan(
            1,
            Some(&block(1, "a much longer narration text")),
            dir,
            &CancelHandle::new(),
        )
        .unwrap();
    assert_eq!(p.duration_seconds, q.duration_seconds);
}

#[test]
fn frame_count_never_truncates_audio() {
    let stub = Stub::new(&[]);
    let cfg = RunConfig {
        fps: Fps { num: 30000, den: 1001 },
        ..config(0.0, 3.0)
    };
    let planner = SegmentPlanner::new(&cfg, &stub);
    for secs in [0.001, 0.5, 1.0, 2.9999, 3.0, 7.123_456, 61.0] {
        let p = planner.narrated(1, PathBuf::from("a.wav"), secs);
        assert!(p.rendered_seconds(cfg.fps) + 1e-9 >= secs, "{secs}");
        assert!(p.rendered_seconds(cfg.fps) - secs < cfg.fps.frame_duration_secs());
    }
}

#[test]
fn synthesis_failure_is_attributed_to_the_slide() {
    let stub = Stub::new(&[]);
    let cfg = config(0.0, 3.0);
    let err = SegmentPlanner::new(&cfg, &stub)
        .plan(
            3,
            Some(&block(3, "unknown")),
            Path::new("/tmp"),
            &CancelHandle::new(),
        )
        .unwrap_err();
    assert_eq!(err.slide_index(), Some(3));
    assert!(err.is_transient());
}

#[test]
fn empty_narration_is_rejected() {
    let stub = Stub::new(&[]);
    let cfg = config(0.0, 3.0);
    let err = SegmentPlanner::new(&cfg, &stub)
        .plan(1, Some(&block(1, "  ")), Path::new("/tmp"), &CancelHandle::new())
        .unwrap_err();
    assert!(matches!(err, SlideReelError::Input { .. }));
}

#[test]
fn video_plan_orders_segments_and_sums_durations() {
    let plan =
        VideoPlan::assemble(vec![segment(3, 2.0), segment(1, 1.5), segment(2, 3.0)], 3).unwrap();
    assert_eq!(
        plan.segments()
            .iter()
            .map(|s| s.slide_index)
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(plan.total_duration(), 6.5);
}

#[test]
fn video_plan_rejects_gaps_duplicates_and_short_lists() {
    let gap = VideoPlan::assemble(vec![segment(1, 1.0), segment(3, 1.0)], 3).unwrap_err();
    assert_eq!(gap.slide_index(), Some(2));

    let dup = VideoPlan::assemble(vec![segment(1, 1.0), segment(1, 1.0)], 2).unwrap_err();
    assert_eq!(dup.slide_index(), Some(1));

    let short = VideoPlan::assemble(vec![segment(1, 1.0)], 2).unwrap_err();
    assert!(matches!(
        short,
        SlideReelError::Concatenation {
            slide_index: Some(2),
            ..
        }
    ));
}

#[test]
fn tolerance_is_one_video_frame_plus_one_aac_frame() {
    let t = segment_tolerance_secs(Fps { num: 25, den: 1 }, &AudioDescriptor::canonical_default());
    assert!((t - (0.04 + 1024.0 / 48_000.0)).abs() < 1e-12);
}
