use super::*;

const DECK: &str = "\
## Welcome
Hello there

  indented line
---

## Second
one
two
---
---
no heading here
";

fn lines_of(slide: &Slide) -> Vec<&str> {
    match &slide.content {
        SlideContent::Lines(lines) => lines.iter().map(String::as_str).collect(),
        SlideContent::Image(_) => panic!("slide {} is an image", slide.index),
    }
}

#[test]
fn markdown_splits_on_rules_and_drops_empty_blocks() {
    let slides = MarkdownSlideSource::new(DECK, false).slides().unwrap();
    assert_eq!(slides.len(), 3);
    assert_eq!(
        slides.iter().map(|s| s.index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(slides[0].title.as_deref(), Some("Welcome"));
    assert_eq!(slides[2].title, None);
}

#[test]
fn markdown_keeps_interior_blank_lines_and_indentation() {
    let slides = MarkdownSlideSource::new(DECK, false).slides().unwrap();
    assert_eq!(lines_of(&slides[0]), vec!["Hello there", "", "  indented line"]);
    assert_eq!(lines_of(&slides[2]), vec!["no heading here"]);
}

#[test]
fn markdown_titles_render_only_when_requested() {
    let slides = MarkdownSlideSource::new(DECK, true).slides().unwrap();
    assert_eq!(lines_of(&slides[1]), vec!["## Second", "one", "two"]);
}

#[test]
fn crlf_input_is_normalized() {
    let slides = MarkdownSlideSource::new("a\r\nb\r\n---\r\nc\r\n", false)
        .slides()
        .unwrap();
    assert_eq!(slides.len(), 2);
    assert_eq!(lines_of(&slides[0]), vec!["a", "b"]);
}

#[test]
fn empty_deck_is_an_input_error() {
    let err = MarkdownSlideSource::new("\n---\n\n", false)
        .slides()
        .unwrap_err();
    assert!(matches!(err, SlideReelError::Input { .. }));
}

#[test]
fn image_pages_are_sorted_by_name() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["p02.png", "p01.png", "notes.txt", "p10.PNG"] {
        std::fs::write(tmp.path().join(name), [0u8, 1, 2]).unwrap();
    }
    let source = ImageSlideSource::from_dir(tmp.path()).unwrap();
    let slides = source.slides().unwrap();
    assert_eq!(slides.len(), 3);
    assert!(slides.iter().all(|s| matches!(s.content, SlideContent::Image(_))));
    assert_eq!(slides[2].index, 3);
}
