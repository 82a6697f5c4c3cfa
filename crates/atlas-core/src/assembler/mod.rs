//! Module assembly: documentation loading and sealed module records.
//!
//! Assembly runs in two phases. [`load_sources`] reads every module's
//! documentation concurrently and parses its front matter; this is where
//! missing documentation and unknown manual includes stop the run.
//! [`ModuleAssembler::assemble`] then renders the documents with the final
//! link index, fills the records and seals them.

mod error;
mod record;

pub use error::AssemblyError;
pub use record::{DisplayName, ModuleProfile, ModuleRecord};

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{Config, ModuleRule, TemplateContext};
use crate::diagnostics::Diagnostics;
use crate::docs::{render_document, split_front_matter, FrontMatter, LinkIndex};
use crate::item::{Item, ItemKind};
use crate::schema::SchemaModel;

/// A module's documentation, read but not yet rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSource {
    pub module: String,
    /// Path relative to the base directory, as rendered from the template.
    pub docs_path: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

async fn load_source(config: &Config, rule: &ModuleRule) -> Result<ModuleSource, AssemblyError> {
    let templates = config.module_templates(rule)?;
    let docs_path = templates.docs.render(&TemplateContext::module(&rule.name));
    let full_path = config.resolve_path(&docs_path);

    let text = tokio::fs::read_to_string(&full_path)
        .await
        .map_err(|source| AssemblyError::MissingDocumentation {
            module: rule.name.clone(),
            path: full_path.clone(),
            source,
        })?;

    let (front_matter, body) =
        split_front_matter(&text).map_err(|source| AssemblyError::FrontMatter {
            module: rule.name.clone(),
            path: full_path.clone(),
            source,
        })?;

    tracing::debug!(module = %rule.name, path = %docs_path, "Loaded module documentation");

    Ok(ModuleSource {
        module: rule.name.clone(),
        docs_path,
        front_matter,
        body: body.to_string(),
    })
}

/// Read every configured module's documentation, in configuration order.
pub async fn load_sources(config: &Config) -> Result<Vec<ModuleSource>, AssemblyError> {
    stream::iter(config.modules.iter())
        .map(|rule| load_source(config, rule))
        .buffered(config.concurrency.max(1))
        .try_collect()
        .await
}

/// Items named by an include entry: `kind name` selects one item, a bare
/// name selects every item with that name.
fn resolve_include(entry: &str, items: &[Item]) -> Vec<Item> {
    let entry = entry.trim();
    if let Some((kind, name)) = entry.split_once(char::is_whitespace) {
        if let Some(kind) = ItemKind::parse(&kind.to_lowercase()) {
            let item = Item::new(kind, name.trim());
            return if items.contains(&item) {
                vec![item]
            } else {
                Vec::new()
            };
        }
    }
    items.iter().filter(|i| i.name == entry).cloned().collect()
}

/// Validate manual includes against the full item set.
pub fn resolve_includes(
    sources: &[ModuleSource],
    items: &[Item],
) -> Result<BTreeMap<String, Vec<Item>>, AssemblyError> {
    let mut includes = BTreeMap::new();
    for source in sources {
        let mut resolved = Vec::new();
        for entry in &source.front_matter.include {
            let found = resolve_include(entry, items);
            if found.is_empty() {
                return Err(AssemblyError::UnknownInclude {
                    module: source.module.clone(),
                    item: entry.clone(),
                });
            }
            resolved.extend(found);
        }
        if !resolved.is_empty() {
            includes.insert(source.module.clone(), resolved);
        }
    }
    Ok(includes)
}

/// Builds sealed module records from loaded sources and memberships.
pub struct ModuleAssembler<'a> {
    config: &'a Config,
    schema: Arc<SchemaModel>,
    diagnostics: Arc<Diagnostics>,
}

impl<'a> ModuleAssembler<'a> {
    pub fn new(config: &'a Config, schema: Arc<SchemaModel>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            config,
            schema,
            diagnostics,
        }
    }

    /// Build one record per source. Modules with no items are dropped with a
    /// warning; the rest are ordered by rank, then configuration order.
    pub fn assemble(
        &self,
        sources: Vec<ModuleSource>,
        memberships: &BTreeMap<String, Vec<Item>>,
        links: &LinkIndex,
    ) -> Result<Vec<ModuleRecord>, AssemblyError> {
        let mut records = Vec::with_capacity(sources.len());

        for (position, source) in sources.into_iter().enumerate() {
            let Some(rule) = self.config.module(&source.module) else {
                continue;
            };

            let mut record = self.build_record(rule, source, links)?;
            for item in memberships.get(&rule.name).into_iter().flatten() {
                record.add_item(item);
            }

            if record.is_empty() {
                self.diagnostics.warn(
                    Some(&rule.name),
                    None,
                    "Module has no classified items and was dropped",
                );
                continue;
            }

            record.order_types(&self.schema);
            record.seal();
            records.push((position, record));
        }

        records.sort_by_key(|(position, record)| (record.rank().is_none(), record.rank(), *position));

        tracing::info!(modules = records.len(), "Modules assembled");
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    fn build_record(
        &self,
        rule: &ModuleRule,
        source: ModuleSource,
        links: &LinkIndex,
    ) -> Result<ModuleRecord, AssemblyError> {
        let templates = self.config.module_templates(rule)?;
        let rendered = render_document(
            &source.body,
            links,
            self.config.links.short_description_words,
        );

        let request = rule
            .display_name
            .clone()
            .or_else(|| source.front_matter.title.clone())
            .map(DisplayName::Explicit)
            .unwrap_or(DisplayName::FromDocumentationHeading);
        let (display_name, display_name_source) =
            request.resolve(rendered.heading.as_deref(), &rule.name);

        let context = TemplateContext::module(&rule.name).with_path(Some(&source.docs_path));

        let icon = templates.icon.and_then(|template| {
            let icon = template.render(&context);
            if self.config.resolve_path(&icon).is_file() {
                Some(icon)
            } else {
                self.diagnostics.warn(
                    Some(&rule.name),
                    None,
                    format!("Icon {} not found, omitted", icon),
                );
                None
            }
        });

        let mut record = ModuleRecord::new(rule.name.clone());
        record.describe(ModuleProfile {
            display_name,
            display_name_source,
            rendered_docs: rendered.html,
            short_description: rendered.short_description,
            icon,
            contribution_url: templates.contribution_url.map(|t| t.render(&context)),
            rank: source.front_matter.rank,
            metadata: source.front_matter.metadata,
            docs_path: source.docs_path,
        });
        Ok(record)
    }
}
