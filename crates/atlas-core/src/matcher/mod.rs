//! Module membership matching.
//!
//! Each [`Matcher`] answers "does item X belong to module M?" with a definite
//! yes/no plus the rule that said yes. The [`MatcherPipeline`] runs them in a
//! configured priority order and memoizes every answer for the run.
//!
//! ## Matchers
//!
//! - [`StaticListMatcher`] - exact membership in a module's `items` list
//! - [`FilesystemMatcher`] - regex over each line of globbed files
//! - [`StructuralMatcher`] - tree-sitter query over globbed files
//! - [`DirectiveMatcher`] - module annotation applied in the schema itself

mod directive;
mod error;
mod files;
mod filesystem;
mod languages;
mod pipeline;
mod static_list;
mod structural;

pub use directive::DirectiveMatcher;
pub use error::MatcherError;
pub use files::{CompiledGlob, SourceFiles};
pub use filesystem::FilesystemMatcher;
pub use languages::GrammarRegistry;
pub use pipeline::{Classification, MatchCache, MatchedItem, MatcherPipeline, ModuleMatches};
pub use static_list::StaticListMatcher;
pub use structural::StructuralMatcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::item::Item;

/// The closed set of matching strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Static,
    Filesystem,
    Structural,
    Directive,
}

impl MatcherKind {
    /// Priority used when the configuration does not give one.
    pub fn default_order() -> Vec<MatcherKind> {
        vec![
            MatcherKind::Static,
            MatcherKind::Filesystem,
            MatcherKind::Structural,
            MatcherKind::Directive,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::Static => "static",
            MatcherKind::Filesystem => "filesystem",
            MatcherKind::Structural => "structural",
            MatcherKind::Directive => "directive",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule satisfied a match, and where.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub matcher: MatcherKind,
    /// Human-readable rule description, e.g. `filesystem[0] src/users/*.ts`.
    pub rule: String,
    /// File that satisfied the rule, relative to the base directory.
    pub file: Option<String>,
    /// 1-based line of the match in `file`.
    pub line: Option<u32>,
}

/// Answer of one matcher for one (module, item) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    pub provenance: Option<Provenance>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            matched: false,
            provenance: None,
        }
    }

    pub fn matched(provenance: Provenance) -> Self {
        Self {
            matched: true,
            provenance: Some(provenance),
        }
    }
}

/// A membership strategy.
///
/// Implementations must be deterministic for a given run: the pipeline caches
/// the first answer per (module, item) and never asks again. Problems such as
/// unreadable files are reported as diagnostics and answered with "no match".
#[async_trait]
pub trait Matcher: Send + Sync {
    fn kind(&self) -> MatcherKind;

    async fn matches(&self, module: &str, item: &Item) -> MatchResult;
}

/// One name captured by a filesystem or structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Capture {
    pub name: String,
    pub kind: Option<String>,
    pub file: String,
    pub line: u32,
}

/// Every capture of one rule, in file then line order.
#[derive(Debug, Default)]
pub(crate) struct CaptureIndex {
    captures: Vec<Capture>,
}

impl CaptureIndex {
    pub fn push(&mut self, capture: Capture) {
        self.captures.push(capture);
    }

    /// First capture naming `item`. A captured kind, when present, must
    /// equal the item kind.
    pub fn find(&self, item: &Item) -> Option<&Capture> {
        self.captures.iter().find(|c| {
            c.name == item.name
                && c.kind.as_deref().map_or(true, |k| k == item.kind.as_str())
        })
    }
}
