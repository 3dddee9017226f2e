use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{SlideReelError, SlideReelResult};

/// What a slide shows.
#[derive(Clone, Debug, PartialEq)]
pub enum SlideContent {
    /// Literal lines, rendered exactly as written. Blank lines are kept.
    Lines(Vec<String>),
    /// Encoded raster image (PNG, JPEG, ...), one page of a pre-rendered deck.
    Image(Arc<Vec<u8>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slide {
    /// 1-based position in the deck.
    pub index: usize,
    /// `## ` heading of a markdown slide; narration blocks reference slides by it.
    pub title: Option<String>,
    pub content: SlideContent,
}

/// Yields the ordered slides of one deck.
pub trait SlideContentSource {
    /// Slides in display order with dense 1-based indices.
    fn slides(&self) -> SlideReelResult<Vec<Slide>>;
}

/// Markdown deck: slides are separated by lines containing only `---`.
#[derive(Clone, Debug)]
pub struct MarkdownSlideSource {
    text: String,
    show_titles: bool,
}

impl MarkdownSlideSource {
    pub fn new(text: impl Into<String>, show_titles: bool) -> Self {
        Self {
            text: text.into(),
            show_titles,
        }
    }

    pub fn from_path(path: &Path, show_titles: bool) -> SlideReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read presentation '{}'", path.display()))?;
        Ok(Self::new(text, show_titles))
    }
}

impl SlideContentSource for MarkdownSlideSource {
    fn slides(&self) -> SlideReelResult<Vec<Slide>> {
        let slides = split_blocks(&self.text)
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                let title = block
                    .iter()
                    .find_map(|l| l.strip_prefix("## "))
                    .map(|t| t.replace("**", "").trim().to_owned());

                let mut lines = block;
                if !self.show_titles && lines.first().is_some_and(|l| l.starts_with("## ")) {
                    lines.remove(0);
                    trim_blank_edges(&mut lines);
                }

                Slide {
                    index: i + 1,
                    title,
                    content: SlideContent::Lines(lines),
                }
            })
            .collect::<Vec<_>>();

        if slides.is_empty() {
            return Err(SlideReelError::input(None, "presentation contains no slides"));
        }
        Ok(slides)
    }
}

/// Split `text` on `---` separator lines into trimmed, non-empty blocks of lines.
///
/// Leading and trailing blank lines of a block are dropped; interior blank lines and the
/// author's line breaks are kept verbatim (trailing whitespace and `\r` removed).
pub(crate) fn split_blocks(text: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current = Vec::<String>::new();

    for raw in text.lines() {
        let line = raw.trim_end();
        if line == "---" {
            trim_blank_edges(&mut current);
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line.to_owned());
    }
    trim_blank_edges(&mut current);
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let lead = lines.iter().take_while(|l| l.trim().is_empty()).count();
    lines.drain(..lead);
}

/// Pre-rendered pages (for example a PDF exported to PNG), one slide per image file.
#[derive(Clone, Debug)]
pub struct ImageSlideSource {
    pages: Vec<PathBuf>,
}

const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

impl ImageSlideSource {
    pub fn new(pages: Vec<PathBuf>) -> Self {
        Self { pages }
    }

    /// Every image in `dir`, ordered by file name.
    pub fn from_dir(dir: &Path) -> SlideReelResult<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list pages in '{}'", dir.display()))?;
        let mut pages = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list pages in '{}'", dir.display()))?
                .path();
            let is_page = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| PAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_page {
                pages.push(path);
            }
        }
        pages.sort();
        Ok(Self::new(pages))
    }
}

impl SlideContentSource for ImageSlideSource {
    fn slides(&self) -> SlideReelResult<Vec<Slide>> {
        if self.pages.is_empty() {
            return Err(SlideReelError::input(None, "no page images found"));
        }
        self.pages
            .iter()
            .enumerate()
            .map(|(i, path)| -> SlideReelResult<Slide> {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read page '{}'", path.display()))?;
                Ok(Slide {
                    index: i + 1,
                    title: None,
                    content: SlideContent::Image(Arc::new(bytes)),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/slides.rs"]
mod tests;
