use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SlideReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SlideReelError::input(Some(2), "x")
            .to_string()
            .contains("input error: slide 2: x")
    );
    assert!(
        SlideReelError::layout(3, LayoutBound::Height, "x")
            .to_string()
            .contains("slide 3: height bound violated")
    );
    assert!(
        SlideReelError::voice_not_found("Nobody")
            .to_string()
            .contains("voice 'Nobody' not found")
    );
    assert!(
        SlideReelError::concatenation(None, "x")
            .to_string()
            .starts_with("concatenation error: x")
    );
}

#[test]
fn at_slide_fills_missing_index_only() {
    let e = SlideReelError::synthesis(None, "crash").at_slide(4);
    assert_eq!(e.slide_index(), Some(4));

    let e = SlideReelError::input(Some(1), "x").at_slide(9);
    assert_eq!(e.slide_index(), Some(1));
}

#[test]
fn only_process_failures_are_transient() {
    assert!(SlideReelError::render(1, "ffmpeg crashed").is_transient());
    assert!(SlideReelError::synthesis(Some(1), "say crashed").is_transient());
    assert!(!SlideReelError::voice_not_found("x").is_transient());
    assert!(!SlideReelError::layout(1, LayoutBound::Height, "x").is_transient());
    assert!(!SlideReelError::input(None, "x").is_transient());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SlideReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
