//! The finished, serializable snapshot handed to site builders.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::assembler::ModuleRecord;
use crate::augment::AugmentedItem;
use crate::diagnostics::Diagnostic;
use crate::item::ItemKind;
use crate::schema::SchemaDocument;

/// Catalog format version, bumped on incompatible changes.
pub const CATALOG_VERSION: u32 = 1;

fn catalog_version() -> u32 {
    CATALOG_VERSION
}

/// Classified and augmented schema.
///
/// Pure data: it can be written out, read back and compared without
/// re-running classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default = "catalog_version")]
    pub version: u32,
    /// Sealed modules in presentation order.
    pub modules: Vec<ModuleRecord>,
    /// Every item, classified or not, in item order.
    pub items: Vec<AugmentedItem>,
    pub schema: SchemaDocument,
    /// Printable form of `schema`.
    pub schema_sdl: String,
}

impl Catalog {
    pub fn new(
        modules: Vec<ModuleRecord>,
        items: Vec<AugmentedItem>,
        schema: SchemaDocument,
    ) -> Self {
        let schema_sdl = schema.to_sdl();
        Self {
            version: CATALOG_VERSION,
            modules,
            items,
            schema,
            schema_sdl,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// First item with this name; types come before operation fields.
    pub fn augmented_item(&self, name: &str) -> Option<&AugmentedItem> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn augmented_item_of(&self, kind: ItemKind, name: &str) -> Option<&AugmentedItem> {
        self.items.iter().find(|i| i.kind == kind && i.name == name)
    }

    /// SHA-256 of the compact JSON form; equal catalogs have equal
    /// fingerprints.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = self.to_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub catalog: Catalog,
    /// Warnings and inference misses, sorted.
    pub diagnostics: Vec<Diagnostic>,
}
