use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use streaming_iterator::StreamingIterator;
use tokio::sync::OnceCell;
use tree_sitter::{Language, Query, QueryCursor};

use super::files::render_rule_text;
use super::languages::parse_tree;
use super::{
    Capture, CaptureIndex, CompiledGlob, GrammarRegistry, MatchResult, Matcher, MatcherError,
    MatcherKind, Provenance, SourceFiles,
};
use crate::config::{Config, KIND_CAPTURE, NAME_CAPTURE};
use crate::diagnostics::Diagnostics;
use crate::item::Item;

struct CompiledRule {
    index: usize,
    glob: CompiledGlob,
    language_name: String,
    language: Language,
    query: Arc<Query>,
    name_capture: u32,
    kind_capture: Option<u32>,
}

impl CompiledRule {
    fn describe(&self) -> String {
        format!(
            "structural[{}] {} ({})",
            self.index,
            self.glob.pattern(),
            self.language_name
        )
    }
}

/// A captured name with its kind and 1-based line, from one file.
type FileCaptures = Vec<(String, Option<String>, u32)>;

/// Tree-sitter query over the files a glob selects.
///
/// Like [`super::FilesystemMatcher`] but the `@name` capture comes from a
/// syntax node, so a name inside a comment or an unrelated string does not
/// count unless the query says so.
pub struct StructuralMatcher {
    rules: HashMap<String, Vec<CompiledRule>>,
    files: Arc<SourceFiles>,
    indexes: DashMap<(String, usize), Arc<OnceCell<Arc<CaptureIndex>>>>,
    diagnostics: Arc<Diagnostics>,
}

impl StructuralMatcher {
    pub fn from_config(
        config: &Config,
        files: Arc<SourceFiles>,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<Self, MatcherError> {
        let registry = GrammarRegistry::new();
        let mut rules = HashMap::new();

        for module in &config.modules {
            let mut compiled = Vec::with_capacity(module.structural.len());

            for (index, rule) in module.structural.iter().enumerate() {
                let glob_text = render_rule_text(
                    config,
                    module,
                    MatcherKind::Structural,
                    index,
                    "files",
                    &rule.files,
                    false,
                )?;
                let query_text = render_rule_text(
                    config,
                    module,
                    MatcherKind::Structural,
                    index,
                    "query",
                    &rule.query,
                    false,
                )?;

                let glob = CompiledGlob::new(&glob_text).map_err(|source| {
                    MatcherError::InvalidGlob {
                        module: module.name.clone(),
                        matcher: MatcherKind::Structural,
                        rule: index,
                        glob: glob_text.clone(),
                        source,
                    }
                })?;

                let language = registry.language(&rule.language).ok_or_else(|| {
                    MatcherError::UnknownLanguage {
                        module: module.name.clone(),
                        rule: index,
                        language: rule.language.clone(),
                    }
                })?;

                let query = Query::new(&language, &query_text).map_err(|e| {
                    MatcherError::InvalidQuery {
                        module: module.name.clone(),
                        rule: index,
                        message: e.to_string(),
                    }
                })?;

                let name_capture = query.capture_index_for_name(NAME_CAPTURE).ok_or_else(|| {
                    MatcherError::MissingNameCapture {
                        module: module.name.clone(),
                        rule: index,
                    }
                })?;
                let kind_capture = query.capture_index_for_name(KIND_CAPTURE);

                compiled.push(CompiledRule {
                    index,
                    glob,
                    language_name: rule.language.clone(),
                    language,
                    query: Arc::new(query),
                    name_capture,
                    kind_capture,
                });
            }

            if !compiled.is_empty() {
                rules.insert(module.name.clone(), compiled);
            }
        }

        Ok(Self {
            rules,
            files,
            indexes: DashMap::new(),
            diagnostics,
        })
    }

    /// The capture index of one rule, built once even when many items ask
    /// for it at the same time.
    async fn index_for(&self, module: &str, rule: &CompiledRule) -> Arc<CaptureIndex> {
        let cell = Arc::clone(
            self.indexes
                .entry((module.to_string(), rule.index))
                .or_default()
                .value(),
        );
        let index = cell.get_or_init(|| self.build_index(module, rule)).await;
        Arc::clone(index)
    }

    async fn build_index(&self, module: &str, rule: &CompiledRule) -> Arc<CaptureIndex> {

        let listing = self.files.expand(&rule.glob).await;
        if listing.is_empty() {
            self.diagnostics.warn(
                Some(module),
                None,
                format!("{} matched no files", rule.describe()),
            );
        }

        let mut index = CaptureIndex::default();
        for path in listing.iter() {
            let Some(content) = self.files.read(path).await else {
                continue;
            };

            let language = rule.language.clone();
            let query = Arc::clone(&rule.query);
            let (name_capture, kind_capture) = (rule.name_capture, rule.kind_capture);
            let parsed = tokio::task::spawn_blocking(move || {
                run_query(&language, &query, &content, name_capture, kind_capture)
            })
            .await;

            match parsed {
                Ok(Ok(captures)) => {
                    for (name, kind, line) in captures {
                        index.push(Capture {
                            name,
                            kind,
                            file: path.clone(),
                            line,
                        });
                    }
                }
                Ok(Err(message)) => {
                    self.diagnostics.warn(
                        Some(module),
                        None,
                        format!("{}: {}: {}", rule.describe(), path, message),
                    );
                }
                Err(e) => {
                    self.diagnostics.warn(
                        Some(module),
                        None,
                        format!("{}: {}: parse task failed: {}", rule.describe(), path, e),
                    );
                }
            }
        }

        tracing::debug!(module = module, rule = rule.index, files = listing.len(), "Indexed structural rule");

        Arc::new(index)
    }
}

fn run_query(
    language: &Language,
    query: &Query,
    content: &str,
    name_capture: u32,
    kind_capture: Option<u32>,
) -> Result<FileCaptures, String> {
    let tree = parse_tree(language, content)?;
    let source = content.as_bytes();

    let mut captures = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut name = None;
        let mut kind = None;

        for capture in m.captures {
            let text = capture.node.utf8_text(source).unwrap_or("");
            if capture.index == name_capture {
                name = Some((unquote(text), capture.node.start_position().row as u32 + 1));
            } else if Some(capture.index) == kind_capture {
                kind = Some(unquote(text));
            }
        }

        if let Some((name, line)) = name {
            captures.push((name, kind, line));
        }
    }

    // Matches come back in pattern order; keep provenance in source order.
    captures.sort_by_key(|(_, _, line)| *line);
    Ok(captures)
}

/// Captured string literals keep their quotes in the syntax tree.
fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

#[async_trait]
impl Matcher for StructuralMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Structural
    }

    async fn matches(&self, module: &str, item: &Item) -> MatchResult {
        let Some(rules) = self.rules.get(module) else {
            return MatchResult::no_match();
        };

        for rule in rules {
            let index = self.index_for(module, rule).await;
            if let Some(capture) = index.find(item) {
                return MatchResult::matched(Provenance {
                    matcher: MatcherKind::Structural,
                    rule: rule.describe(),
                    file: Some(capture.file.clone()),
                    line: Some(capture.line),
                });
            }
        }

        MatchResult::no_match()
    }
}
