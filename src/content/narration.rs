use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::content::slides::{Slide, split_blocks};
use crate::foundation::error::{SlideReelError, SlideReelResult};

/// Narration resolved to one language for one slide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrationBlock {
    pub slide_index: usize,
    pub text: String,
}

/// Narration per slide. A slide with no entry is silent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NarrationMap {
    blocks: BTreeMap<usize, NarrationBlock>,
}

impl NarrationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block; a second block for the same slide is an input error.
    pub fn insert(&mut self, block: NarrationBlock) -> SlideReelResult<()> {
        let idx = block.slide_index;
        if self.blocks.insert(idx, block).is_some() {
            return Err(SlideReelError::input(
                Some(idx),
                "more than one narration block references this slide",
            ));
        }
        Ok(())
    }

    pub fn get(&self, slide_index: usize) -> Option<&NarrationBlock> {
        self.blocks.get(&slide_index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Resolves narration to one text per slide for the configured slide deck.
pub trait NarrationSource {
    fn narration(&self, slides: &[Slide]) -> SlideReelResult<NarrationMap>;
}

/// Language tag → text for one raw narration block.
///
/// Text before the first `#### <tag>` heading is untagged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NarrationVariants {
    pub untagged: Option<String>,
    /// Tagged variants in the order they appear. Tags are lower-case with `-` separators.
    pub tagged: Vec<(String, String)>,
}

impl NarrationVariants {
    pub fn parse(lines: &[String]) -> Self {
        let mut out = Self::default();
        let mut tag: Option<String> = None;
        let mut buf = Vec::<&str>::new();

        for line in lines {
            if let Some(next) = language_heading(line) {
                out.push(tag.take(), &buf);
                buf.clear();
                tag = Some(next);
                continue;
            }
            buf.push(line.as_str());
        }
        out.push(tag, &buf);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.untagged.is_none() && self.tagged.is_empty()
    }

    fn push(&mut self, tag: Option<String>, buf: &[&str]) {
        let text = buf.join("\n").trim().to_owned();
        match tag {
            Some(t) => self.tagged.push((t, text)),
            None if !text.is_empty() => self.untagged = Some(text),
            None => {}
        }
    }
}

/// `#### en`, `#### zh-CN` or `#### **fr**` → normalized tag.
fn language_heading(line: &str) -> Option<String> {
    let rest = line.strip_prefix("####")?;
    if rest.starts_with('#') {
        return None;
    }
    let tag = rest.trim().trim_matches('*').trim();
    is_language_tag(tag).then(|| tag.to_ascii_lowercase().replace('_', "-"))
}

fn is_language_tag(tag: &str) -> bool {
    let mut parts = tag.split(['-', '_']);
    let Some(primary) = parts.next() else {
        return false;
    };
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Which language variant of a block is spoken.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageSelection {
    /// Tags tried in order; `en` also matches `en-us`.
    pub preferred: Vec<String>,
    /// Use the first tagged variant when no preferred tag is present.
    pub fallback_to_first: bool,
}

impl Default for LanguageSelection {
    fn default() -> Self {
        Self {
            preferred: Vec::new(),
            fallback_to_first: true,
        }
    }
}

impl LanguageSelection {
    pub fn resolve<'a>(&self, variants: &'a NarrationVariants) -> Option<&'a str> {
        for want in &self.preferred {
            let want = want.to_ascii_lowercase().replace('_', "-");
            let hit = variants.tagged.iter().find(|(tag, _)| {
                *tag == want
                    || tag
                        .strip_prefix(want.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            });
            if let Some((_, text)) = hit {
                return Some(text.as_str());
            }
        }
        if variants.tagged.is_empty() {
            return variants.untagged.as_deref();
        }
        if self.fallback_to_first {
            return variants.tagged.first().map(|(_, text)| text.as_str());
        }
        None
    }
}

/// Slides named by a script heading: every slide with that title, else `3` or `Slide 3`.
fn resolve_heading(heading: &str, slides: &[Slide]) -> Vec<usize> {
    let titled = slides
        .iter()
        .filter(|s| s.title.as_deref() == Some(heading))
        .map(|s| s.index)
        .collect::<Vec<_>>();
    if !titled.is_empty() {
        return titled;
    }
    let number = heading
        .strip_prefix("Slide ")
        .or_else(|| heading.strip_prefix("slide "))
        .unwrap_or(heading);
    let Ok(n) = number.trim().parse::<usize>() else {
        return Vec::new();
    };
    slides
        .iter()
        .filter(|s| s.index == n)
        .map(|s| s.index)
        .collect()
}

/// One `### Title` block of a narration script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Heading text with `###` and `**` removed.
    pub heading: String,
    pub variants: NarrationVariants,
}

/// Narration script in markdown: `### Slide title` blocks separated by `---` lines.
///
/// A first block that does not start with `###` is a document header and is skipped.
#[derive(Clone, Debug)]
pub struct MarkdownScriptSource {
    entries: Vec<ScriptEntry>,
    selection: LanguageSelection,
}

impl MarkdownScriptSource {
    pub fn parse(text: &str, selection: LanguageSelection) -> SlideReelResult<Self> {
        let mut blocks = split_blocks(text);
        if blocks
            .first()
            .is_some_and(|b| !b.first().is_some_and(|l| l.starts_with("###")))
        {
            blocks.remove(0);
        }

        let mut entries = Vec::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            let Some((head, body)) = block.split_first() else {
                continue;
            };
            if !head.starts_with("###") || head.starts_with("####") {
                return Err(SlideReelError::input(
                    None,
                    format!("script block {} does not start with a '### ' heading", i + 1),
                ));
            }
            let title = head.replace("###", "").replace("**", "").trim().to_owned();
            if title.is_empty() {
                return Err(SlideReelError::input(
                    None,
                    format!("script block {} has an empty heading", i + 1),
                ));
            }
            entries.push(ScriptEntry {
                heading: title,
                variants: NarrationVariants::parse(body),
            });
        }

        Ok(Self { entries, selection })
    }

    pub fn from_path(path: &Path, selection: LanguageSelection) -> SlideReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script '{}'", path.display()))?;
        Self::parse(&text, selection)
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }
}

impl NarrationSource for MarkdownScriptSource {
    fn narration(&self, slides: &[Slide]) -> SlideReelResult<NarrationMap> {
        let mut map = NarrationMap::new();
        for entry in &self.entries {
            let title = &entry.heading;
            let targets = resolve_heading(title, slides);
            let Some(&first) = targets.first() else {
                return Err(SlideReelError::input(
                    None,
                    format!("narration '{title}' matches no slide"),
                ));
            };
            let empty = || {
                SlideReelError::input(
                    Some(first),
                    format!("narration '{title}' is empty; remove the block for a silent slide"),
                )
            };
            if entry.variants.is_empty() {
                return Err(empty());
            }
            let text = self.selection.resolve(&entry.variants).ok_or_else(|| {
                SlideReelError::input(
                    Some(first),
                    format!(
                        "narration '{title}' has no variant for languages {:?}",
                        self.selection.preferred
                    ),
                )
            })?;
            if text.trim().is_empty() {
                return Err(empty());
            }
            // Slides sharing a title all speak the block.
            for slide_index in targets {
                map.insert(NarrationBlock {
                    slide_index,
                    text: text.to_owned(),
                })?;
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/content/narration.rs"]
mod tests;
