//! Outline generator for Markdown documents
//!
//! Line-scanning extraction of ATX headings (`#` through `######`), with
//! fenced code blocks skipped so commented-out shell lines never show up as
//! entries. Each heading carries its source line and a GitHub-style anchor
//! slug in its extras.

use anyhow::{Result, anyhow};
use hashbrown::HashMap;
use serde_json::Value;

use super::{GeneratorOptions, OutlineGenerator, SectionNumbering};
use crate::documents::{DocumentHandle, TextBuffer};
use crate::heading::Heading;

/// Generator for Markdown text documents.
#[derive(Debug, Default)]
pub struct MarkdownGenerator {
    options: GeneratorOptions,
}

impl MarkdownGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GeneratorOptions) -> Self {
        Self { options }
    }
}

impl OutlineGenerator for MarkdownGenerator {
    fn generate(
        &self,
        document: &DocumentHandle,
        options: &GeneratorOptions,
    ) -> Result<Vec<Heading>> {
        let buffer = document
            .payload::<TextBuffer>()
            .ok_or_else(|| anyhow!("document '{}' has no text payload", document.label()))?;
        let text = buffer.read().unwrap();
        Ok(scan_markdown(&text, options))
    }

    fn options(&self) -> GeneratorOptions {
        self.options.clone()
    }
}

fn scan_markdown(content: &str, options: &GeneratorOptions) -> Vec<Heading> {
    let mut entries: Vec<(usize, u8, &str)> = Vec::new();
    let mut fence: Option<(char, usize)> = None;

    for (line_idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();

        if let Some((marker, open_len)) = fence {
            if is_fence_close(trimmed, marker, open_len) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = fence_open(trimmed) {
            fence = Some(open);
            continue;
        }

        let Some((level, raw)) = parse_atx_heading(trimmed) else {
            continue;
        };
        if level > options.max_depth {
            continue;
        }
        entries.push((line_idx, level, raw));
    }

    // Numbering is relative to the shallowest heading, so a file of
    // second-level sections counts "1", "2" rather than "0.1".
    let base = entries.iter().map(|&(_, level, _)| level).min().unwrap_or(1);

    let mut headings = Vec::new();
    let mut slugs: HashMap<String, u32> = HashMap::new();
    let mut numbering = SectionNumbering::new();
    for (line_idx, level, raw) in entries {
        let text = if options.numbered {
            format!("{} {raw}", numbering.advance(level - base + 1))
        } else {
            raw.to_string()
        };
        let slug = unique_slug(raw, &mut slugs);
        headings.push(
            Heading::new(text, level)
                .with_extra("line", Value::from(line_idx as u64))
                .with_extra("slug", Value::from(slug)),
        );
    }

    headings
}

/// Parse an ATX heading line into (level, text), already trimmed of the
/// optional closing hash run.
fn parse_atx_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    // "#hashtag" is not a heading; the marker needs a space or line end
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some((hashes as u8, strip_closing_hashes(rest.trim())))
}

/// Drop a trailing closing sequence ("Intro ###" -> "Intro"). A hash run
/// glued to the text ("C#") belongs to the text.
fn strip_closing_hashes(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.len() == text.len() {
        return text;
    }
    if without.is_empty() {
        return "";
    }
    if without.ends_with(' ') || without.ends_with('\t') {
        without.trim_end()
    } else {
        text
    }
}

fn fence_open(line: &str) -> Option<(char, usize)> {
    for marker in ['`', '~'] {
        let len = line.chars().take_while(|&c| c == marker).count();
        if len >= 3 {
            return Some((marker, len));
        }
    }
    None
}

/// A closing fence repeats the opening marker at least as long, with
/// nothing but whitespace after it.
fn is_fence_close(line: &str, marker: char, open_len: usize) -> bool {
    let len = line.chars().take_while(|&c| c == marker).count();
    len >= open_len && line.chars().skip(len).all(|c| c == ' ' || c == '\t')
}

/// GitHub-style anchor slug: lowercase, spaces to hyphens, punctuation
/// dropped.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            slug.push('-');
        }
    }
    slug
}

/// Deduplicate repeated headings the way GitHub anchors do: "usage",
/// "usage-1", "usage-2".
fn unique_slug(text: &str, seen: &mut HashMap<String, u32>) -> String {
    let base = slugify(text);
    match seen.get_mut(&base) {
        Some(count) => {
            *count += 1;
            format!("{base}-{count}")
        }
        None => {
            seen.insert(base.clone(), 0);
            base
        }
    }
}
