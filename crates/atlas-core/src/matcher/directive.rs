use async_trait::async_trait;
use std::sync::Arc;

use super::{MatchResult, Matcher, MatcherKind, Provenance};
use crate::config::DirectiveConfig;
use crate::item::{Item, ItemKind};
use crate::schema::{AppliedDirective, SchemaModel};

/// Module annotation applied in the schema, e.g. `type User @module(name: "users")`.
///
/// Types are looked up by name; root fields on their operation type. The
/// argument may be a single string or a list of strings.
pub struct DirectiveMatcher {
    schema: Arc<SchemaModel>,
    directive: String,
    argument: String,
}

impl DirectiveMatcher {
    pub fn new(schema: Arc<SchemaModel>, config: &DirectiveConfig) -> Self {
        Self {
            schema,
            directive: config.name.trim_start_matches('@').to_string(),
            argument: config.argument.clone(),
        }
    }

    fn directives_of<'a>(&'a self, item: &Item) -> &'a [AppliedDirective] {
        match item.kind {
            ItemKind::Type => self
                .schema
                .type_by_name(&item.name)
                .map(|t| t.applied_directives.as_slice())
                .unwrap_or(&[]),
            kind => kind
                .operation()
                .and_then(|op| self.schema.root_field(op, &item.name))
                .map(|f| f.applied_directives.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Module names declared on an item.
    pub fn modules_of(&self, item: &Item) -> Vec<String> {
        self.directives_of(item)
            .iter()
            .filter(|d| d.name == self.directive)
            .filter_map(|d| d.arg(&self.argument))
            .flat_map(parse_module_literal)
            .collect()
    }
}

/// Parse a GraphQL string or list-of-strings literal into module names.
/// Bare words (enum values) are accepted too.
fn parse_module_literal(value: &str) -> Vec<String> {
    let value = value.trim();
    if let Ok(name) = serde_json::from_str::<String>(value) {
        return vec![name];
    }
    if let Ok(names) = serde_json::from_str::<Vec<String>>(value) {
        return names;
    }

    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl Matcher for DirectiveMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Directive
    }

    async fn matches(&self, module: &str, item: &Item) -> MatchResult {
        if self.modules_of(item).iter().any(|m| m == module) {
            MatchResult::matched(Provenance {
                matcher: MatcherKind::Directive,
                rule: format!("@{}({})", self.directive, self.argument),
                file: None,
                line: None,
            })
        } else {
            MatchResult::no_match()
        }
    }
}
