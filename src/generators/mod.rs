//! Outline generators for document formats
//!
//! A generator is the per-format extraction strategy: it turns one document
//! into an ordered heading sequence and optionally contributes an item
//! renderer and a toolbar. The engine treats every generator as opaque and
//! never inspects how it derives structure.

use serde::{Deserialize, Serialize};

use crate::documents::DocumentHandle;
use crate::heading::Heading;
use crate::render::{ItemRenderer, Toolbar};

/// Deepest heading level included by default.
pub const DEFAULT_MAX_DEPTH: u8 = 6;

/// Options bag handed to a generator on every extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Deepest heading level to include
    pub max_depth: u8,
    /// Prefix entries with hierarchical section numbers
    pub numbered: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            numbered: false,
        }
    }
}

/// Document-type-specific outline extraction strategy.
pub trait OutlineGenerator: Send + Sync {
    /// Extract the ordered heading sequence from the document.
    fn generate(
        &self,
        document: &DocumentHandle,
        options: &GeneratorOptions,
    ) -> anyhow::Result<Vec<Heading>>;

    /// Options for this generator; passed back into
    /// [`OutlineGenerator::generate`] unchanged.
    fn options(&self) -> GeneratorOptions {
        GeneratorOptions::default()
    }

    /// Custom per-entry renderer, if the format needs one.
    fn item_renderer(&self) -> Option<ItemRenderer> {
        None
    }

    /// Toolbar factory; the engine invokes it once per bind.
    fn toolbar(&self) -> Option<Toolbar> {
        None
    }

    /// Whether rendered entries need a math typesetting pass.
    fn uses_latex(&self) -> bool {
        false
    }
}

/// Hierarchical section counter ("1", "1.1", "1.2", "2").
///
/// Shared by the bundled generators for their `numbered` option.
#[derive(Debug, Default)]
pub struct SectionNumbering {
    counters: Vec<u32>,
}

impl SectionNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a heading at `level` (1-based) and return its section number.
    pub fn advance(&mut self, level: u8) -> String {
        let depth = level.max(1) as usize;
        if self.counters.len() < depth {
            self.counters.resize(depth, 0);
        }
        self.counters.truncate(depth);
        self.counters[depth - 1] += 1;
        self.counters
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

pub mod latex;
pub mod markdown;
