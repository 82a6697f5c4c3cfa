use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    DirectiveMatcher, FilesystemMatcher, MatchResult, Matcher, MatcherError, MatcherKind,
    Provenance, SourceFiles, StaticListMatcher, StructuralMatcher,
};
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::item::Item;
use crate::schema::SchemaModel;

/// Memoized matcher answers for one run, keyed by (module, item).
///
/// Concurrent evaluations of the same key may both compute and both write;
/// answers are deterministic so the last write is as good as the first.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: DashMap<(String, Item), MatchResult>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &str, item: &Item) -> Option<MatchResult> {
        self.entries
            .get(&(module.to_string(), item.clone()))
            .map(|e| e.value().clone())
    }

    pub fn insert(&self, module: &str, item: &Item, result: MatchResult) {
        self.entries.insert((module.to_string(), item.clone()), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An item placed in a module, with the rule that placed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedItem {
    pub item: Item,
    pub provenance: Provenance,
}

/// Items matched for one module, in item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMatches {
    pub module: String,
    pub items: Vec<MatchedItem>,
}

/// Result of one classification pass, in module configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub modules: Vec<ModuleMatches>,
}

impl Classification {
    pub fn module(&self, name: &str) -> Option<&ModuleMatches> {
        self.modules.iter().find(|m| m.module == name)
    }

    /// Every module an item was placed in, in configuration order.
    pub fn modules_of(&self, item: &Item) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|m| m.items.iter().any(|i| &i.item == item))
            .map(|m| m.module.as_str())
            .collect()
    }

    pub fn is_classified(&self, item: &Item) -> bool {
        self.modules
            .iter()
            .any(|m| m.items.iter().any(|i| &i.item == item))
    }

    /// Provenance of the first module (in configuration order) holding `item`.
    pub fn provenance(&self, item: &Item) -> Option<&Provenance> {
        self.modules
            .iter()
            .flat_map(|m| m.items.iter())
            .find(|i| &i.item == item)
            .map(|i| &i.provenance)
    }
}

/// Runs matchers in priority order per module and memoizes the answers.
pub struct MatcherPipeline {
    matchers: HashMap<MatcherKind, Arc<dyn Matcher>>,
    default_order: Vec<MatcherKind>,
    orders: HashMap<String, Vec<MatcherKind>>,
    modules: Vec<String>,
    cache: MatchCache,
    concurrency: usize,
}

impl MatcherPipeline {
    /// Build all matchers from configuration. Every rule is compiled here, so
    /// configuration errors surface before any item is classified.
    pub fn from_config(
        config: &Config,
        schema: Arc<SchemaModel>,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<Self, MatcherError> {
        let files = Arc::new(SourceFiles::new(&config.base_dir, Arc::clone(&diagnostics)));

        let matchers: Vec<Arc<dyn Matcher>> = vec![
            Arc::new(StaticListMatcher::from_config(config)),
            Arc::new(FilesystemMatcher::from_config(
                config,
                Arc::clone(&files),
                Arc::clone(&diagnostics),
            )?),
            Arc::new(StructuralMatcher::from_config(
                config,
                Arc::clone(&files),
                Arc::clone(&diagnostics),
            )?),
            Arc::new(DirectiveMatcher::new(schema, &config.directive)),
        ];

        let mut pipeline = Self::new(matchers, config.matcher_order.clone(), config.concurrency);
        for module in &config.modules {
            pipeline.add_module(&module.name, config.matcher_order_for(module).to_vec());
        }
        Ok(pipeline)
    }

    /// A pipeline over explicit matchers, without modules.
    pub fn new(
        matchers: Vec<Arc<dyn Matcher>>,
        default_order: Vec<MatcherKind>,
        concurrency: usize,
    ) -> Self {
        Self {
            matchers: matchers.into_iter().map(|m| (m.kind(), m)).collect(),
            default_order,
            orders: HashMap::new(),
            modules: Vec::new(),
            cache: MatchCache::new(),
            concurrency: concurrency.max(1),
        }
    }

    /// Register a module with its matcher priority.
    pub fn add_module(&mut self, name: &str, order: Vec<MatcherKind>) {
        if !self.orders.contains_key(name) {
            self.modules.push(name.to_string());
        }
        self.orders.insert(name.to_string(), order);
    }

    /// Registered module names, in registration order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    fn order_for(&self, module: &str) -> &[MatcherKind] {
        self.orders
            .get(module)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_order)
    }

    /// Cached answer for (module, item), computing it on first use.
    pub async fn evaluate(&self, module: &str, item: &Item) -> MatchResult {
        if let Some(result) = self.cache.get(module, item) {
            return result;
        }

        let result = self.evaluate_fresh(module, item).await;
        self.cache.insert(module, item, result.clone());
        result
    }

    /// Ask each matcher in priority order, bypassing the cache. The first
    /// match wins.
    pub async fn evaluate_fresh(&self, module: &str, item: &Item) -> MatchResult {
        for kind in self.order_for(module) {
            let Some(matcher) = self.matchers.get(kind) else {
                continue;
            };
            let result = matcher.matches(module, item).await;
            if result.matched {
                return result;
            }
        }
        MatchResult::no_match()
    }

    /// Evaluate every (module, item) pair, at most `concurrency` at a time.
    pub async fn classify(&self, items: &[Item]) -> Classification {
        let units: Vec<(usize, usize)> = (0..self.modules.len())
            .flat_map(|m| (0..items.len()).map(move |i| (m, i)))
            .collect();

        let mut answers: Vec<(usize, usize, MatchResult)> = stream::iter(units)
            .map(|(m, i)| async move {
                let result = self.evaluate(&self.modules[m], &items[i]).await;
                (m, i, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        answers.sort_by_key(|(m, i, _)| (*m, *i));

        let mut modules: Vec<ModuleMatches> = self
            .modules
            .iter()
            .map(|name| ModuleMatches {
                module: name.clone(),
                items: Vec::new(),
            })
            .collect();

        for (m, i, result) in answers {
            if let (true, Some(provenance)) = (result.matched, result.provenance) {
                modules[m].items.push(MatchedItem {
                    item: items[i].clone(),
                    provenance,
                });
            }
        }

        let matched: usize = modules.iter().map(|m| m.items.len()).sum();
        tracing::info!(
            modules = modules.len(),
            items = items.len(),
            matched = matched,
            "Classification finished"
        );

        Classification { modules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Matches items whose name starts with the module name, counting calls.
    struct PrefixMatcher {
        kind: MatcherKind,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Matcher for PrefixMatcher {
        fn kind(&self) -> MatcherKind {
            self.kind
        }

        async fn matches(&self, module: &str, item: &Item) -> MatchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if item.name.to_lowercase().starts_with(module) {
                MatchResult::matched(Provenance {
                    matcher: self.kind,
                    rule: "prefix".to_string(),
                    file: None,
                    line: None,
                })
            } else {
                MatchResult::no_match()
            }
        }
    }

    fn pipeline() -> (MatcherPipeline, Arc<PrefixMatcher>) {
        let matcher = Arc::new(PrefixMatcher {
            kind: MatcherKind::Filesystem,
            calls: AtomicUsize::new(0),
        });
        let mut pipeline = MatcherPipeline::new(
            vec![matcher.clone() as Arc<dyn Matcher>],
            MatcherKind::default_order(),
            4,
        );
        pipeline.add_module("user", MatcherKind::default_order());
        pipeline.add_module("invoice", MatcherKind::default_order());
        (pipeline, matcher)
    }

    fn items() -> Vec<Item> {
        vec![
            Item::new(ItemKind::Type, "User"),
            Item::new(ItemKind::Type, "Invoice"),
            Item::new(ItemKind::Query, "userInvoices"),
            Item::new(ItemKind::Type, "PageInfo"),
        ]
    }

    #[tokio::test]
    async fn test_classify_is_ordered_and_cached() {
        let (pipeline, matcher) = pipeline();
        let items = items();

        let classification = pipeline.classify(&items).await;
        let users: Vec<&str> = classification
            .module("user")
            .unwrap()
            .items
            .iter()
            .map(|i| i.item.name.as_str())
            .collect();
        assert_eq!(users, vec!["User", "userInvoices"]);
        assert!(!classification.is_classified(&items[3]));
        assert_eq!(classification.modules_of(&items[1]), vec!["invoice"]);

        let calls = matcher.calls.load(Ordering::SeqCst);
        assert_eq!(calls, 8);

        let again = pipeline.classify(&items).await;
        assert_eq!(again, classification);
        assert_eq!(matcher.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_cache_equals_fresh_evaluation() {
        let (pipeline, _) = pipeline();
        let items = items();
        pipeline.classify(&items).await;

        for module in pipeline.modules().to_vec() {
            for item in &items {
                let cached = pipeline.cache().get(&module, item).unwrap();
                assert_eq!(cached, pipeline.evaluate_fresh(&module, item).await);
            }
        }
    }

    #[tokio::test]
    async fn test_module_order_excluding_matcher() {
        let (mut pipeline, _) = pipeline();
        pipeline.add_module("user", vec![MatcherKind::Static]);

        let result = pipeline
            .evaluate("user", &Item::new(ItemKind::Type, "User"))
            .await;
        assert!(!result.matched);
        assert_eq!(pipeline.modules().len(), 2);
    }
}
