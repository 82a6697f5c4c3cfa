//! Glob expansion and file contents, cached for the lifetime of a run.

use dashmap::DashMap;
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{MatcherError, MatcherKind};
use crate::config::{Config, ConfigError, ModuleRule, Placeholder, Template, TemplateContext};
use crate::diagnostics::Diagnostics;

/// A compiled glob, relative to the base directory.
#[derive(Debug, Clone)]
pub struct CompiledGlob {
    pattern: String,
    matcher: GlobMatcher,
    prefix: PathBuf,
}

impl CompiledGlob {
    pub fn new(pattern: &str) -> Result<Self, globset::Error> {
        let pattern = pattern.trim_start_matches("./");
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            prefix: literal_prefix(pattern),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, relative_path: &str) -> bool {
        self.matcher.is_match(relative_path)
    }

    /// Absolute globs match absolute paths and ignore the root.
    pub fn is_absolute(&self) -> bool {
        self.prefix.is_absolute()
    }

    /// Directory the walk can start from: the components before the first
    /// one containing a glob metacharacter.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }
}

fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = if pattern.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };
    let components: Vec<&str> = pattern.split('/').collect();
    for (i, component) in components.iter().enumerate() {
        let is_last = i + 1 == components.len();
        if is_last || component.contains(['*', '?', '[', '{']) {
            break;
        }
        if !component.is_empty() {
            prefix.push(component);
        }
    }
    prefix
}

/// Expands globs and reads files under a root directory.
///
/// Listings are cached per glob and contents per path, so evaluating many
/// items against the same rule walks and reads each file once.
pub struct SourceFiles {
    root: PathBuf,
    listings: DashMap<String, Arc<Vec<String>>>,
    contents: DashMap<String, Option<Arc<str>>>,
    diagnostics: Arc<Diagnostics>,
}

impl SourceFiles {
    pub fn new(root: impl Into<PathBuf>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            root: root.into(),
            listings: DashMap::new(),
            contents: DashMap::new(),
            diagnostics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files matching `glob`, as sorted `/`-separated paths relative to the
    /// root, or absolute paths for an absolute glob. A missing directory
    /// yields an empty list.
    pub async fn expand(&self, glob: &CompiledGlob) -> Arc<Vec<String>> {
        let cached = self
            .listings
            .get(glob.pattern())
            .map(|entry| Arc::clone(entry.value()));
        if let Some(listing) = cached {
            return listing;
        }

        let root = self.root.clone();
        let walk_glob = glob.clone();
        let listing = match tokio::task::spawn_blocking(move || walk(&root, &walk_glob)).await {
            Ok(paths) => paths,
            Err(e) => {
                self.diagnostics.warn(
                    None,
                    None,
                    format!("Failed to expand glob '{}': {}", glob.pattern(), e),
                );
                Vec::new()
            }
        };

        let listing = Arc::new(listing);
        self.listings
            .insert(glob.pattern().to_string(), Arc::clone(&listing));
        listing
    }

    /// Contents of a file relative to the root; `None` (with a warning) when
    /// it cannot be read as UTF-8.
    pub async fn read(&self, relative_path: &str) -> Option<Arc<str>> {
        let cached = self
            .contents
            .get(relative_path)
            .map(|entry| entry.value().clone());
        if let Some(content) = cached {
            return content;
        }

        let content = match tokio::fs::read_to_string(self.root.join(relative_path)).await {
            Ok(text) => Some(Arc::<str>::from(text)),
            Err(e) => {
                self.diagnostics.warn(
                    None,
                    None,
                    format!("Failed to read {}: {}", relative_path, e),
                );
                None
            }
        };

        self.contents
            .insert(relative_path.to_string(), content.clone());
        content
    }
}

fn walk(root: &Path, glob: &CompiledGlob) -> Vec<String> {
    let start = root.join(glob.prefix());
    if !start.exists() {
        return Vec::new();
    }

    let walker = WalkBuilder::new(&start)
        .hidden(true)
        .git_ignore(true)
        .build();

    let mut paths: Vec<String> = walker
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let path = if glob.is_absolute() {
                entry.path().to_string_lossy().into_owned()
            } else {
                entry
                    .path()
                    .strip_prefix(root)
                    .ok()?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            };
            glob.is_match(&path).then_some(path)
        })
        .collect();

    paths.sort();
    paths.dedup();
    paths
}

/// Substitute `%module%` (and custom placeholders) into a rule's glob or
/// pattern text. Regex patterns get the module name escaped.
pub(crate) fn render_rule_text(
    config: &Config,
    module: &ModuleRule,
    matcher: MatcherKind,
    rule: usize,
    field: &str,
    text: &str,
    escape_module: bool,
) -> Result<String, MatcherError> {
    let template = Template::parse(text, &[Placeholder::Module], &config.placeholders).map_err(
        |source| ConfigError::Template {
            context: format!("module '{}' {} rule {} {}", module.name, matcher, rule, field),
            source,
        },
    )?;

    let name = if escape_module {
        regex::escape(&module.name)
    } else {
        module.name.clone()
    };
    Ok(template.render(&TemplateContext::module(&name)))
}
