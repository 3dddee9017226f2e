use super::*;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

fn system_font() -> Option<FontDescriptor> {
    SYSTEM_FONTS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .and_then(|p| FontDescriptor::load(p).ok())
}

fn dummy_font() -> FontDescriptor {
    FontDescriptor::from_bytes("none.ttf", Vec::new())
}

#[test]
fn fixed_advance_counts_chars_not_bytes() {
    let mut m = FixedAdvanceMeasurer::default();
    let font = dummy_font();
    let ascii = m.measure_line(&font, 10, "abcd").unwrap();
    let cjk = m.measure_line(&font, 10, "你好世界").unwrap();
    assert_eq!(ascii, cjk);
    assert!((ascii.width - 24.0).abs() < 1e-4);
    assert!((ascii.line_height - 12.0).abs() < 1e-4);
}

#[test]
fn fixed_advance_blank_line_still_has_height() {
    let mut m = FixedAdvanceMeasurer::default();
    let blank = m.measure_line(&dummy_font(), 20, "").unwrap();
    assert_eq!(blank.width, 0.0);
    assert!(blank.line_height > 0.0);
}

#[test]
fn closures_are_measurer_factories() {
    let factory = || Box::new(FixedAdvanceMeasurer::default()) as Box<dyn TextMeasurer>;
    let mut m = MeasurerFactory::create(&factory);
    assert!(m.measure_line(&dummy_font(), 5, "x").is_ok());
}

#[test]
fn missing_font_file_is_reported_with_path() {
    let err = FontDescriptor::load(Path::new("/definitely/not/here.ttf")).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.ttf"));
}

#[test]
fn parley_measurements_grow_with_size_and_length() {
    let Some(font) = system_font() else {
        return;
    };
    let mut m = ParleyMeasurer::new();
    let small = m.measure_line(&font, 12, "Hello").unwrap();
    let large = m.measure_line(&font, 48, "Hello").unwrap();
    let longer = m.measure_line(&font, 12, "Hello, world").unwrap();
    assert!(small.width > 0.0);
    assert!(large.width > small.width);
    assert!(large.line_height > small.line_height);
    assert!(longer.width > small.width);
    // Line height does not depend on content.
    assert_eq!(small.line_height, longer.line_height);
    assert_eq!(m.measure_line(&font, 12, "").unwrap().line_height, small.line_height);
}

#[test]
fn parley_measurements_are_deterministic() {
    let Some(font) = system_font() else {
        return;
    };
    let a = ParleyMeasurer::new()
        .measure_line(&font, 31, "  indented text")
        .unwrap();
    let b = ParleyMeasurer::new()
        .measure_line(&font, 31, "  indented text")
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn line_height_follows_the_font_not_the_call_history() {
    let Some(first) = system_font() else {
        return;
    };
    let other = Path::new("/usr/share/fonts/truetype/dejavu/DejaVuMathTeXGyre.ttf");
    if !other.exists() {
        return;
    }
    let second = FontDescriptor::load(other).unwrap();

    let fresh = ParleyMeasurer::new()
        .measure_line(&second, 40, "x")
        .unwrap();
    let mut warm = ParleyMeasurer::new();
    warm.measure_line(&first, 40, "x").unwrap();
    let after_switch = warm.measure_line(&second, 40, "x").unwrap();

    assert_eq!(fresh, after_switch);
}
