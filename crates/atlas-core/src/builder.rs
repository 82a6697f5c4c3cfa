//! One catalog build, from configuration and schema to [`BuildReport`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::assembler::{load_sources, resolve_includes, ModuleAssembler};
use crate::augment::{default_reference_path, AugmentationEngine, ReferencePathFn, ReferenceResolver};
use crate::catalog::{BuildReport, Catalog};
use crate::config::{Config, Template};
use crate::diagnostics::Diagnostics;
use crate::error::AtlasError;
use crate::item::{Item, ItemKind};
use crate::matcher::{Classification, MatcherPipeline, Provenance};
use crate::schema::{SchemaDocument, SchemaModel};
use crate::special::SpecialTypeResolver;

/// Builds a [`Catalog`] from a configuration and a schema.
///
/// Fatal problems (bad rules, missing documentation, unknown includes, a
/// schema without a query type) are returned as errors before any partial
/// result exists. Everything else ends up in the report's diagnostics.
pub struct CatalogBuilder {
    config: Config,
    schema: SchemaDocument,
    reference_path: Option<ReferencePathFn>,
}

impl CatalogBuilder {
    pub fn new(config: Config, schema: SchemaDocument) -> Self {
        Self {
            config,
            schema,
            reference_path: None,
        }
    }

    /// Replace the `links.reference_path` template with a function of
    /// (module, item name).
    pub fn with_reference_path<F>(mut self, path: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.reference_path = Some(Arc::new(path));
        self
    }

    /// Run the whole pipeline.
    pub async fn build(self) -> Result<BuildReport, AtlasError> {
        let config = self.config;

        // 1. Validate configuration and index the schema
        config.validate()?;
        let diagnostics = Arc::new(Diagnostics::new());
        let schema = Arc::new(SchemaModel::new(self.schema)?);

        // 2. Derive items; the limit truncates before any fan-out
        let all_items = Item::collect(&schema);
        let items: Vec<Item> = match config.item_limit {
            Some(limit) => all_items.iter().take(limit).cloned().collect(),
            None => all_items.clone(),
        };
        tracing::info!(items = items.len(), total = all_items.len(), "Items collected");

        // 3. Compile every matcher rule
        let pipeline =
            MatcherPipeline::from_config(&config, Arc::clone(&schema), Arc::clone(&diagnostics))?;

        // 4. Load documentation and validate manual includes
        let sources = load_sources(&config).await?;
        let includes = resolve_includes(&sources, &all_items)?;

        // 5. Classify
        let classification = pipeline.classify(&items).await;

        let mut catalog_items = items;
        for item in includes.values().flatten() {
            if !catalog_items.contains(item) {
                catalog_items.push(item.clone());
            }
        }
        let memberships = memberships(&config, &classification, &includes);
        let item_modules = item_modules(&memberships, &config);

        // 6. Resolve wrappers among the types no module claimed
        let special = SpecialTypeResolver::new(
            Arc::clone(&schema),
            &config.special_types,
            Arc::clone(&diagnostics),
        )?;
        let unclassified = catalog_items
            .iter()
            .filter(|i| i.kind == ItemKind::Type && !item_modules.contains_key(*i))
            .map(|i| i.name.as_str());
        let special = Arc::new(special.resolve_all(unclassified));

        // 7. Reference paths and the link index
        let path = match self.reference_path {
            Some(path) => path,
            None => default_reference_path(config.reference_path_template()?),
        };
        let references = Arc::new(ReferenceResolver::new(item_modules, Arc::clone(&special), path));
        let links = Arc::new(references.link_index(&catalog_items));

        // 8. Assemble and seal modules
        let assembler = ModuleAssembler::new(&config, Arc::clone(&schema), Arc::clone(&diagnostics));
        let modules = assembler.assemble(sources, &memberships, &links)?;

        // 9. Augment every item
        let engine = AugmentationEngine::new(Arc::clone(&schema), references, links, special)
            .with_provenance(first_provenance(&classification))
            .with_source_urls(source_urls(&config)?);
        let augmented = engine
            .augment_all(&catalog_items)?
            .iter()
            .map(|item| item.as_ref().clone())
            .collect();

        let catalog = Catalog::new(modules, augmented, schema.document().clone());
        let diagnostics = diagnostics.snapshot();
        tracing::info!(
            modules = catalog.modules.len(),
            items = catalog.items.len(),
            diagnostics = diagnostics.len(),
            "Catalog built"
        );

        Ok(BuildReport {
            catalog,
            diagnostics,
        })
    }
}

/// Items per module: matched items in item order, then manual includes.
fn memberships(
    config: &Config,
    classification: &Classification,
    includes: &BTreeMap<String, Vec<Item>>,
) -> BTreeMap<String, Vec<Item>> {
    let mut memberships = BTreeMap::new();
    for module in &config.modules {
        let mut items: Vec<Item> = classification
            .module(&module.name)
            .map(|m| m.items.iter().map(|i| i.item.clone()).collect())
            .unwrap_or_default();
        for item in includes.get(&module.name).into_iter().flatten() {
            if !items.contains(item) {
                items.push(item.clone());
            }
        }
        memberships.insert(module.name.clone(), items);
    }
    memberships
}

/// Modules per item, in configuration order.
fn item_modules(
    memberships: &BTreeMap<String, Vec<Item>>,
    config: &Config,
) -> HashMap<Item, Vec<String>> {
    let mut modules: HashMap<Item, Vec<String>> = HashMap::new();
    for module in &config.modules {
        for item in memberships.get(&module.name).into_iter().flatten() {
            modules
                .entry(item.clone())
                .or_default()
                .push(module.name.clone());
        }
    }
    modules
}

/// Provenance from the first module (in configuration order) per item.
fn first_provenance(classification: &Classification) -> HashMap<Item, Provenance> {
    let mut provenance = HashMap::new();
    for module in &classification.modules {
        for matched in &module.items {
            provenance
                .entry(matched.item.clone())
                .or_insert_with(|| matched.provenance.clone());
        }
    }
    provenance
}

fn source_urls(config: &Config) -> Result<HashMap<String, Template>, AtlasError> {
    let mut urls = HashMap::new();
    for module in &config.modules {
        if let Some(template) = config.module_templates(module)?.source_url {
            urls.insert(module.name.clone(), template);
        }
    }
    Ok(urls)
}
