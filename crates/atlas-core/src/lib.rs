pub mod assembler;
pub mod augment;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod docs;
pub mod error;
pub mod item;
pub mod matcher;
pub mod order;
pub mod schema;
pub mod special;

pub use assembler::{ModuleProfile, ModuleRecord};
pub use augment::{AugmentedItem, ReferencePathFn};
pub use builder::CatalogBuilder;
pub use catalog::{BuildReport, Catalog};
pub use config::Config;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::AtlasError;
pub use item::{Item, ItemKind};
pub use schema::{SchemaDocument, SchemaModel};
pub use special::SpecialType;
