use super::*;
use crate::foundation::core::Resolution;
use crate::layout::measure::FixedAdvanceMeasurer;

fn font() -> FontDescriptor {
    FontDescriptor::from_bytes("fixed.ttf", Vec::new())
}

fn engine(cap: u32, canvas: Canvas) -> FontFitEngine {
    FontFitEngine::new(font(), cap, canvas, false)
}

fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| (*s).to_owned()).collect()
}

/// Counts oracle calls.
#[derive(Default)]
struct Counting {
    inner: FixedAdvanceMeasurer,
    calls: usize,
}

impl TextMeasurer for Counting {
    fn measure_line(
        &mut self,
        font: &FontDescriptor,
        size: u32,
        line: &str,
    ) -> SlideReelResult<crate::layout::measure::LineMetrics> {
        self.calls += 1;
        self.inner.measure_line(font, size, line)
    }
}

#[test]
fn cap_wins_when_everything_fits() {
    let canvas = Resolution::new(1920, 1080).canvas(100);
    let r = engine(72, canvas)
        .fit(1, &lines(&["Hello"]), &mut FixedAdvanceMeasurer::default())
        .unwrap();
    assert_eq!(r.font_size, 72);
    assert_eq!(r.line_count, 1);
    assert!(!r.width_overflow);
}

#[test]
fn width_bound_limits_size() {
    // 5 chars * 0.6 * size <= 1720  =>  size <= 573
    let canvas = Resolution::new(1920, 1080).canvas(100);
    let r = engine(1000, canvas)
        .fit(1, &lines(&["Hello"]), &mut FixedAdvanceMeasurer::default())
        .unwrap();
    assert_eq!(r.font_size, 573);
    assert!(r.max_line_width <= canvas.width);
}

#[test]
fn height_bound_limits_size() {
    // 10 lines * 1.2 * size <= 880  =>  size <= 73
    let canvas = Resolution::new(1920, 1080).canvas(100);
    let ten = vec!["x".to_owned(); 10];
    let r = engine(1000, canvas)
        .fit(2, &ten, &mut FixedAdvanceMeasurer::default())
        .unwrap();
    assert_eq!(r.font_size, 73);
    assert!(r.block_height <= canvas.height);
    assert_eq!(r.slide_index, 2);
}

#[test]
fn interior_blank_lines_count_towards_height() {
    let canvas = Canvas {
        x: 0.0,
        y: 0.0,
        width: 10_000.0,
        height: 121.0,
    };
    let mut m = FixedAdvanceMeasurer::default();
    let dense = engine(1000, canvas).fit(1, &lines(&["a", "b"]), &mut m).unwrap();
    let spaced = engine(1000, canvas)
        .fit(1, &lines(&["a", "", "b"]), &mut m)
        .unwrap();
    assert_eq!(spaced.line_count, 3);
    assert_eq!(dense.font_size, 50);
    assert_eq!(spaced.font_size, 33);
    assert!((spaced.block_height - 3.0 * spaced.line_height).abs() < 1e-3);
}

#[test]
fn empty_text_returns_cap() {
    let canvas = Resolution::new(640, 480).canvas(20);
    let mut m = FixedAdvanceMeasurer::default();
    let r = engine(64, canvas).fit(3, &[], &mut m).unwrap();
    assert_eq!(r.font_size, 64);
    assert_eq!(r.line_count, 0);
    let r = engine(64, canvas).fit(3, &lines(&["", "  "]), &mut m).unwrap();
    assert_eq!(r.font_size, 64);
}

#[test]
fn too_many_lines_is_a_height_layout_error() {
    let canvas = Canvas {
        x: 0.0,
        y: 0.0,
        width: 1000.0,
        height: 10.0,
    };
    let many = vec!["x".to_owned(); 20];
    let err = engine(72, canvas)
        .fit(4, &many, &mut FixedAdvanceMeasurer::default())
        .unwrap_err();
    assert!(matches!(
        err,
        SlideReelError::Layout {
            slide_index: 4,
            bound: LayoutBound::Height,
            ..
        }
    ));
}

#[test]
fn overlong_line_is_reported_not_clipped() {
    let canvas = Canvas {
        x: 0.0,
        y: 0.0,
        width: 10.0,
        height: 1000.0,
    };
    let long = lines(&["this line is far too long"]);
    let r = engine(72, canvas)
        .fit(1, &long, &mut FixedAdvanceMeasurer::default())
        .unwrap();
    assert_eq!(r.font_size, 1);
    assert!(r.width_overflow);
    assert!(r.max_line_width > canvas.width);

    let strict = FontFitEngine::new(font(), 72, canvas, true);
    let err = strict
        .fit(1, &long, &mut FixedAdvanceMeasurer::default())
        .unwrap_err();
    assert!(matches!(
        err,
        SlideReelError::Layout {
            bound: LayoutBound::Width,
            ..
        }
    ));
}

#[test]
fn binary_search_uses_logarithmic_probes() {
    let canvas = Resolution::new(1920, 1080).canvas(100);
    let text = lines(&["one", "two", "three"]);
    let mut m = Counting::default();
    engine(1024, canvas).fit(1, &text, &mut m).unwrap();
    // size 1 plus at most ceil(log2(1024)) probes, each measuring every line.
    assert!(m.calls <= 11 * text.len(), "calls = {}", m.calls);
}

#[test]
fn linear_scan_agrees_with_binary_search() {
    let canvas = Resolution::new(1280, 720).canvas(40);
    let text = lines(&["Quarterly results", "", "  revenue up", "costs down"]);
    let e = engine(200, canvas);
    let mut m = FixedAdvanceMeasurer::default();
    assert_eq!(
        e.fit(1, &text, &mut m).unwrap(),
        e.fit_linear(1, &text, &mut m).unwrap()
    );
}

/// Reports every line as too wide for sizes in `wide`.
struct WideBand {
    inner: FixedAdvanceMeasurer,
    wide: std::ops::RangeInclusive<u32>,
}

impl TextMeasurer for WideBand {
    fn measure_line(
        &mut self,
        font: &FontDescriptor,
        size: u32,
        line: &str,
    ) -> SlideReelResult<crate::layout::measure::LineMetrics> {
        let mut m = self.inner.measure_line(font, size, line)?;
        if self.wide.contains(&size) {
            m.width = f32::MAX;
        }
        Ok(m)
    }
}

#[test]
fn linear_scan_keeps_largest_fit_past_a_failing_band() {
    let canvas = Resolution::new(1920, 1080).canvas(100);
    let mut m = WideBand {
        inner: FixedAdvanceMeasurer::default(),
        wide: 40..=49,
    };
    let r = engine(100, canvas)
        .fit_linear(1, &lines(&["Hello"]), &mut m)
        .unwrap();
    assert_eq!(r.font_size, 100);
    assert!(!r.width_overflow);
}
