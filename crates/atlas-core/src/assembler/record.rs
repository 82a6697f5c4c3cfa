use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::item::{Item, ItemKind};
use crate::order::sort_types;
use crate::schema::SchemaModel;

/// Where a module's display name comes from.
///
/// Configured as `Explicit` or `FromDocumentationHeading`; after resolution
/// a heading request without a heading becomes `FallbackToName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayName {
    Explicit(String),
    FromDocumentationHeading,
    FallbackToName,
}

impl DisplayName {
    /// Resolve to a name plus the source actually used.
    pub fn resolve(self, heading: Option<&str>, module: &str) -> (String, DisplayName) {
        match self {
            DisplayName::Explicit(name) => (name.clone(), DisplayName::Explicit(name)),
            DisplayName::FromDocumentationHeading => match heading {
                Some(heading) => (heading.to_string(), DisplayName::FromDocumentationHeading),
                None => (module.to_string(), DisplayName::FallbackToName),
            },
            DisplayName::FallbackToName => (module.to_string(), DisplayName::FallbackToName),
        }
    }
}

fn sealed() -> bool {
    true
}

/// Everything about a module except its items.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleProfile {
    pub display_name: String,
    pub display_name_source: DisplayName,
    pub rendered_docs: String,
    pub short_description: Option<String>,
    /// Documentation source, relative to the base directory.
    pub docs_path: String,
    pub icon: Option<String>,
    pub contribution_url: Option<String>,
    pub rank: Option<i64>,
    pub metadata: BTreeMap<String, Value>,
}

/// One module of the catalog.
///
/// The profile and item lists can only change until [`ModuleRecord::seal`];
/// afterwards every mutation is ignored. Records read back from JSON are
/// sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    name: String,
    display_name: String,
    display_name_source: DisplayName,
    rendered_docs: String,
    short_description: Option<String>,
    docs_path: String,
    icon: Option<String>,
    contribution_url: Option<String>,
    rank: Option<i64>,
    metadata: BTreeMap<String, Value>,
    types: Vec<String>,
    queries: Vec<String>,
    mutations: Vec<String>,
    subscriptions: Vec<String>,
    #[serde(skip, default = "sealed")]
    sealed: bool,
}

impl ModuleRecord {
    /// An empty, unsealed record.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            display_name_source: DisplayName::FallbackToName,
            rendered_docs: String::new(),
            short_description: None,
            docs_path: String::new(),
            icon: None,
            contribution_url: None,
            rank: None,
            metadata: BTreeMap::new(),
            types: Vec::new(),
            queries: Vec::new(),
            mutations: Vec::new(),
            subscriptions: Vec::new(),
            sealed: false,
        }
    }

    /// Replace the profile. Returns false when sealed.
    pub fn describe(&mut self, profile: ModuleProfile) -> bool {
        if self.sealed {
            return false;
        }
        let ModuleProfile {
            display_name,
            display_name_source,
            rendered_docs,
            short_description,
            docs_path,
            icon,
            contribution_url,
            rank,
            metadata,
        } = profile;
        self.display_name = display_name;
        self.display_name_source = display_name_source;
        self.rendered_docs = rendered_docs;
        self.short_description = short_description;
        self.docs_path = docs_path;
        self.icon = icon;
        self.contribution_url = contribution_url;
        self.rank = rank;
        self.metadata = metadata;
        true
    }

    fn list_mut(&mut self, kind: ItemKind) -> &mut Vec<String> {
        match kind {
            ItemKind::Type => &mut self.types,
            ItemKind::Query => &mut self.queries,
            ItemKind::Mutation => &mut self.mutations,
            ItemKind::Subscription => &mut self.subscriptions,
        }
    }

    pub fn list(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Type => &self.types,
            ItemKind::Query => &self.queries,
            ItemKind::Mutation => &self.mutations,
            ItemKind::Subscription => &self.subscriptions,
        }
    }

    /// Add an item. Returns false when sealed or already present.
    pub fn add_item(&mut self, item: &Item) -> bool {
        if self.sealed {
            return false;
        }
        let list = self.list_mut(item.kind);
        if list.contains(&item.name) {
            return false;
        }
        list.push(item.name.clone());
        true
    }

    /// Order the type list so types come before their users.
    pub fn order_types(&mut self, schema: &SchemaModel) {
        if !self.sealed {
            sort_types(schema, &mut self.types);
        }
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn display_name_source(&self) -> &DisplayName {
        &self.display_name_source
    }

    /// Rendered HTML of the documentation body.
    pub fn rendered_docs(&self) -> &str {
        &self.rendered_docs
    }

    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    /// Documentation source, relative to the base directory.
    pub fn docs_path(&self) -> &str {
        &self.docs_path
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn contribution_url(&self) -> Option<&str> {
        self.contribution_url.as_deref()
    }

    pub fn rank(&self) -> Option<i64> {
        self.rank
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn mutations(&self) -> &[String] {
        &self.mutations
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.list(item.kind).contains(&item.name)
    }

    /// All items, types first.
    pub fn items(&self) -> Vec<Item> {
        [ItemKind::Type, ItemKind::Query, ItemKind::Mutation, ItemKind::Subscription]
            .into_iter()
            .flat_map(|kind| {
                self.list(kind)
                    .iter()
                    .map(move |name| Item::new(kind, name.clone()))
            })
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.types.len() + self.queries.len() + self.mutations.len() + self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}
