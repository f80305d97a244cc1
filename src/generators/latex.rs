//! Outline generator for LaTeX documents
//!
//! Scans for the standard sectioning commands (`\part` through
//! `\subparagraph`), honoring comments, starred variants and optional
//! short-title arguments. Titles are kept raw, math included; the engine
//! runs the math typesetter after rendering because this generator reports
//! `uses_latex`.

use anyhow::{Result, anyhow};
use serde_json::Value;

use super::{GeneratorOptions, OutlineGenerator, SectionNumbering};
use crate::documents::{DocumentHandle, TextBuffer};
use crate::heading::Heading;

/// Sectioning commands in hierarchy order; the level is the 1-based rank.
const SECTIONING: &[(&str, u8)] = &[
    ("part", 1),
    ("chapter", 2),
    ("section", 3),
    ("subsection", 4),
    ("subsubsection", 5),
    ("paragraph", 6),
    ("subparagraph", 7),
];

/// Generator for LaTeX text documents.
#[derive(Debug, Default)]
pub struct LatexGenerator {
    options: GeneratorOptions,
}

impl LatexGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GeneratorOptions) -> Self {
        Self { options }
    }
}

impl OutlineGenerator for LatexGenerator {
    fn generate(
        &self,
        document: &DocumentHandle,
        options: &GeneratorOptions,
    ) -> Result<Vec<Heading>> {
        let buffer = document
            .payload::<TextBuffer>()
            .ok_or_else(|| anyhow!("document '{}' has no text payload", document.label()))?;
        let text = buffer.read().unwrap();
        Ok(scan_latex(&text, options))
    }

    fn options(&self) -> GeneratorOptions {
        self.options.clone()
    }

    fn uses_latex(&self) -> bool {
        true
    }
}

fn scan_latex(content: &str, options: &GeneratorOptions) -> Vec<Heading> {
    let mut entries: Vec<(usize, &'static str, u8, Argument)> = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let code = strip_comment(line);
        let mut cursor = 0;
        while let Some(offset) = code[cursor..].find('\\') {
            let command_start = cursor + offset + 1;
            let rest = &code[command_start..];
            let Some((name, level)) = match_sectioning(rest) else {
                cursor = command_start;
                continue;
            };
            let Some(argument) = parse_argument(&rest[name.len()..]) else {
                cursor = command_start + name.len();
                continue;
            };
            cursor = command_start + name.len() + argument.consumed;
            if level > options.max_depth {
                continue;
            }
            entries.push((line_idx, name, level, argument));
        }
    }

    // Numbering is relative to the shallowest numbered command, so a
    // sections-only file counts "1", "2" rather than "0.0.1".
    let base = entries
        .iter()
        .filter(|(_, _, _, argument)| !argument.starred)
        .map(|&(_, _, level, _)| level)
        .min()
        .unwrap_or(1);

    let mut headings = Vec::new();
    let mut numbering = SectionNumbering::new();
    for (line_idx, name, level, argument) in entries {
        // Starred commands are unnumbered in LaTeX output too.
        let text = if options.numbered && !argument.starred {
            format!("{} {}", numbering.advance(level - base + 1), argument.title)
        } else {
            argument.title
        };
        headings.push(
            Heading::new(text, level)
                .with_extra("line", Value::from(line_idx as u64))
                .with_extra("command", Value::from(name)),
        );
    }

    headings
}

fn match_sectioning(rest: &str) -> Option<(&'static str, u8)> {
    for &(name, level) in SECTIONING {
        if let Some(after) = rest.strip_prefix(name)
            && !after.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        {
            return Some((name, level));
        }
    }
    None
}

struct Argument {
    title: String,
    consumed: usize,
    starred: bool,
}

/// Parse `*`, `[short]` and `{title}` following a sectioning command.
/// Braces nest, so math like `$e^{x}$` survives intact.
fn parse_argument(after: &str) -> Option<Argument> {
    let bytes = after.as_bytes();
    let mut idx = skip_blanks(after, 0);
    let mut starred = false;
    if bytes.get(idx) == Some(&b'*') {
        starred = true;
        idx = skip_blanks(after, idx + 1);
    }
    if bytes.get(idx) == Some(&b'[') {
        let close = after[idx..].find(']')?;
        idx = skip_blanks(after, idx + close + 1);
    }
    if bytes.get(idx) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    for (pos, b) in after[idx..].bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(Argument {
                        title: after[idx + 1..idx + pos].trim().to_string(),
                        consumed: idx + pos + 1,
                        starred,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

fn skip_blanks(s: &str, mut idx: usize) -> usize {
    let bytes = s.as_bytes();
    while matches!(bytes.get(idx), Some(b' ') | Some(b'\t')) {
        idx += 1;
    }
    idx
}

/// Cut the line at the first unescaped `%`.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b == b'%' && (idx == 0 || bytes[idx - 1] != b'\\') {
            return &line[..idx];
        }
    }
    line
}
