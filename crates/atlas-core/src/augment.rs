//! Render-ready item metadata.
//!
//! Every item gets its description rendered through the same auto-linking
//! pass as module docs, a display type, a reference path and, when a file
//! matcher placed it, a source location. Results are cached per item, so
//! augmenting twice returns the same value.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Template, TemplateContext};
use crate::docs::{render_markdown, LinkIndex};
use crate::item::{Item, ItemKind};
use crate::matcher::Provenance;
use crate::schema::{
    EnumValue, Field, InputValue, SchemaError, SchemaModel, TypeKind, TypeReference,
    BUILTIN_SCALARS,
};
use crate::special::{special_for_reference, ConnectionInfo, ResultInfo, SpecialTypes};

/// Maps (module, item name) to a reference path.
pub type ReferencePathFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// File and line that placed an item in its module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<u32>,
}

/// A field, argument, input field or enum value of an augmented item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentedField {
    pub name: String,
    pub rendered_description: Option<String>,
    /// `[User!]!` style type; absent for enum values.
    pub display_type: Option<String>,
    /// Reference path of the named type, when it has one.
    pub type_reference_path: Option<String>,
    pub default_value: Option<String>,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<AugmentedField>,
    /// `Connection<Node>` / `Result<Data, Error>` when the type is a wrapper.
    pub signature: Option<String>,
    pub connection_info: Option<ConnectionInfo>,
    pub result_info: Option<ResultInfo>,
}

/// An item with everything a page needs to show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentedItem {
    pub name: String,
    pub kind: ItemKind,
    /// GraphQL kind for type items.
    pub type_kind: Option<TypeKind>,
    /// Modules holding the item, in configuration order.
    pub modules: Vec<String>,
    pub rendered_description: Option<String>,
    pub display_type: String,
    pub reference_path: Option<String>,
    pub source_location: Option<SourceLocation>,
    pub source_url: Option<String>,
    pub signature: Option<String>,
    pub connection_info: Option<ConnectionInfo>,
    pub result_info: Option<ResultInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AugmentedField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<AugmentedField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_fields: Vec<AugmentedField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<AugmentedField>,
    /// Union members or interface implementations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
}

/// Default reference path: `/{module}#{name}`.
pub fn default_reference_path(template: Template) -> ReferencePathFn {
    Arc::new(move |module: &str, name: &str| {
        template.render(&TemplateContext::module(module).with_name(name))
    })
}

/// Answers "which module is this item documented in, and at what path".
pub struct ReferenceResolver {
    memberships: HashMap<Item, Vec<String>>,
    special: Arc<SpecialTypes>,
    path: ReferencePathFn,
}

impl ReferenceResolver {
    pub fn new(
        memberships: HashMap<Item, Vec<String>>,
        special: Arc<SpecialTypes>,
        path: ReferencePathFn,
    ) -> Self {
        Self {
            memberships,
            special,
            path,
        }
    }

    pub fn modules_of(&self, item: &Item) -> &[String] {
        self.memberships
            .get(item)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First module of the item. An unclassified wrapper type lives in the
    /// module of the type it wraps.
    pub fn home_module(&self, item: &Item) -> Option<&str> {
        if let Some(module) = self.modules_of(item).first() {
            return Some(module);
        }
        if item.kind != ItemKind::Type {
            return None;
        }
        let wrapped = self.special.get(&item.name)?.wrapped_type();
        self.modules_of(&Item::new(ItemKind::Type, wrapped))
            .first()
            .map(String::as_str)
    }

    pub fn reference_path(&self, item: &Item) -> Option<String> {
        self.home_module(item)
            .map(|module| (self.path)(module, &item.name))
    }

    /// Link index over every item that has a reference path.
    pub fn link_index<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> LinkIndex {
        let mut links = LinkIndex::new();
        for item in items {
            if let Some(path) = self.reference_path(item) {
                links.insert(item, path);
            }
        }
        links
    }
}

/// Builds and caches [`AugmentedItem`]s.
pub struct AugmentationEngine {
    schema: Arc<SchemaModel>,
    resolver: Arc<ReferenceResolver>,
    links: Arc<LinkIndex>,
    special: Arc<SpecialTypes>,
    provenance: HashMap<Item, Provenance>,
    source_urls: HashMap<String, Template>,
    cache: DashMap<Item, Arc<AugmentedItem>>,
}

impl AugmentationEngine {
    pub fn new(
        schema: Arc<SchemaModel>,
        resolver: Arc<ReferenceResolver>,
        links: Arc<LinkIndex>,
        special: Arc<SpecialTypes>,
    ) -> Self {
        Self {
            schema,
            resolver,
            links,
            special,
            provenance: HashMap::new(),
            source_urls: HashMap::new(),
            cache: DashMap::new(),
        }
    }

    /// Provenance of the first matching module, per item.
    pub fn with_provenance(mut self, provenance: HashMap<Item, Provenance>) -> Self {
        self.provenance = provenance;
        self
    }

    /// `source_url` template per module.
    pub fn with_source_urls(mut self, source_urls: HashMap<String, Template>) -> Self {
        self.source_urls = source_urls;
        self
    }

    /// Cached augmentation of `item`.
    pub fn augment(&self, item: &Item) -> Result<Arc<AugmentedItem>, SchemaError> {
        let cached = self.cache.get(item).map(|e| Arc::clone(e.value()));
        if let Some(augmented) = cached {
            return Ok(augmented);
        }

        let augmented = Arc::new(self.augment_fresh(item)?);
        self.cache.insert(item.clone(), Arc::clone(&augmented));
        Ok(augmented)
    }

    /// Augment without consulting the cache.
    pub fn augment_fresh(&self, item: &Item) -> Result<AugmentedItem, SchemaError> {
        let mut augmented = match item.kind.operation() {
            None => self.augment_type(item)?,
            Some(operation) => {
                let field = self.schema.root_field(operation, &item.name).ok_or_else(|| {
                    SchemaError::UnknownItem {
                        kind: item.kind.to_string(),
                        name: item.name.clone(),
                    }
                })?;
                self.augment_root_field(item, field)?
            }
        };

        augmented.modules = self.resolver.modules_of(item).to_vec();
        augmented.reference_path = self.resolver.reference_path(item);

        let location = self
            .provenance
            .get(item)
            .and_then(|p| {
                p.file.as_ref().map(|file| SourceLocation {
                    file: file.clone(),
                    line: p.line,
                })
            });
        augmented.source_url = self.source_url(item, location.as_ref());
        augmented.source_location = location;

        Ok(augmented)
    }

    fn source_url(&self, item: &Item, location: Option<&SourceLocation>) -> Option<String> {
        let module = self.resolver.modules_of(item).first()?;
        let template = self.source_urls.get(module)?;
        if location.is_none() && template.uses(crate::config::Placeholder::Path) {
            return None;
        }
        let context = TemplateContext::module(module)
            .with_name(&item.name)
            .with_path(location.map(|l| l.file.as_str()));
        Some(template.render(&context))
    }

    fn describe(&self, text: Option<&str>, current: &Item) -> Option<String> {
        text.filter(|t| !t.trim().is_empty())
            .map(|t| render_markdown(t, &self.links, Some(current)))
    }

    fn type_reference_path(&self, reference: &TypeReference) -> Option<String> {
        let name = reference.named_type().ok()?;
        if BUILTIN_SCALARS.contains(&name) {
            return None;
        }
        self.resolver
            .reference_path(&Item::new(ItemKind::Type, name))
    }

    fn augment_input(&self, value: &InputValue, owner: &Item) -> Result<AugmentedField, SchemaError> {
        Ok(AugmentedField {
            name: value.name.clone(),
            rendered_description: self.describe(value.description.as_deref(), owner),
            display_type: Some(self.schema.build_display_type(&value.value_type)?),
            type_reference_path: self.type_reference_path(&value.value_type),
            default_value: value.default_value.clone(),
            is_deprecated: false,
            deprecation_reason: None,
            arguments: Vec::new(),
            signature: None,
            connection_info: None,
            result_info: None,
        })
    }

    fn augment_field(&self, field: &Field, owner: &Item) -> Result<AugmentedField, SchemaError> {
        let special = special_for_reference(&self.special, &field.field_type);
        Ok(AugmentedField {
            name: field.name.clone(),
            rendered_description: self.describe(field.description.as_deref(), owner),
            display_type: Some(self.schema.build_display_type(&field.field_type)?),
            type_reference_path: self.type_reference_path(&field.field_type),
            default_value: None,
            is_deprecated: field.is_deprecated,
            deprecation_reason: field.deprecation_reason.clone(),
            arguments: field
                .args
                .iter()
                .map(|arg| self.augment_input(arg, owner))
                .collect::<Result<_, _>>()?,
            signature: special.map(|s| s.signature()),
            connection_info: special.and_then(|s| s.connection()).cloned(),
            result_info: special.and_then(|s| s.result()).cloned(),
        })
    }

    fn augment_enum_value(&self, value: &EnumValue, owner: &Item) -> AugmentedField {
        AugmentedField {
            name: value.name.clone(),
            rendered_description: self.describe(value.description.as_deref(), owner),
            display_type: None,
            type_reference_path: None,
            default_value: None,
            is_deprecated: value.is_deprecated,
            deprecation_reason: value.deprecation_reason.clone(),
            arguments: Vec::new(),
            signature: None,
            connection_info: None,
            result_info: None,
        }
    }

    fn augment_root_field(&self, item: &Item, field: &Field) -> Result<AugmentedItem, SchemaError> {
        let augmented = self.augment_field(field, item)?;
        Ok(AugmentedItem {
            name: item.name.clone(),
            kind: item.kind,
            type_kind: None,
            modules: Vec::new(),
            rendered_description: augmented.rendered_description,
            display_type: augmented.display_type.unwrap_or_default(),
            reference_path: None,
            source_location: None,
            source_url: None,
            signature: augmented.signature,
            connection_info: augmented.connection_info,
            result_info: augmented.result_info,
            fields: Vec::new(),
            arguments: augmented.arguments,
            input_fields: Vec::new(),
            enum_values: Vec::new(),
            members: Vec::new(),
            interfaces: Vec::new(),
        })
    }

    fn augment_type(&self, item: &Item) -> Result<AugmentedItem, SchemaError> {
        let descriptor = self
            .schema
            .type_by_name(&item.name)
            .ok_or_else(|| SchemaError::UnknownItem {
                kind: item.kind.to_string(),
                name: item.name.clone(),
            })?;
        let special = self.special.get(&item.name);

        Ok(AugmentedItem {
            name: item.name.clone(),
            kind: item.kind,
            type_kind: Some(descriptor.kind),
            modules: Vec::new(),
            rendered_description: self.describe(descriptor.description.as_deref(), item),
            display_type: descriptor.name.clone(),
            reference_path: None,
            source_location: None,
            source_url: None,
            signature: special.map(|s| s.signature()),
            connection_info: special.and_then(|s| s.connection()).cloned(),
            result_info: special.and_then(|s| s.result()).cloned(),
            fields: descriptor
                .fields
                .iter()
                .flatten()
                .map(|f| self.augment_field(f, item))
                .collect::<Result<_, _>>()?,
            arguments: Vec::new(),
            input_fields: descriptor
                .input_fields
                .iter()
                .flatten()
                .map(|f| self.augment_input(f, item))
                .collect::<Result<_, _>>()?,
            enum_values: descriptor
                .enum_values
                .iter()
                .flatten()
                .map(|v| self.augment_enum_value(v, item))
                .collect(),
            members: descriptor
                .possible_type_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            interfaces: descriptor
                .interface_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Augment every item, in order.
    pub fn augment_all(&self, items: &[Item]) -> Result<Vec<Arc<AugmentedItem>>, SchemaError> {
        items.iter().map(|item| self.augment(item)).collect()
    }
}
