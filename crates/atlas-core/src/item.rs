use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{OperationKind, SchemaModel, BUILTIN_SCALARS};

/// What kind of schema element an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Type,
    Query,
    Mutation,
    Subscription,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Type => "type",
            ItemKind::Query => "query",
            ItemKind::Mutation => "mutation",
            ItemKind::Subscription => "subscription",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "type" => Some(ItemKind::Type),
            "query" => Some(ItemKind::Query),
            "mutation" => Some(ItemKind::Mutation),
            "subscription" => Some(ItemKind::Subscription),
            _ => None,
        }
    }

    /// The root operation for field items, `None` for types.
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            ItemKind::Type => None,
            ItemKind::Query => Some(OperationKind::Query),
            ItemKind::Mutation => Some(OperationKind::Mutation),
            ItemKind::Subscription => Some(OperationKind::Subscription),
        }
    }
}

impl From<OperationKind> for ItemKind {
    fn from(operation: OperationKind) -> Self {
        match operation {
            OperationKind::Query => ItemKind::Query,
            OperationKind::Mutation => ItemKind::Mutation,
            OperationKind::Subscription => ItemKind::Subscription,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classifiable schema element: a type or a root operation field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Derive all items of a schema: types first, then query, mutation and
    /// subscription fields in declaration order.
    ///
    /// Introspection types, root operation types and built-in scalars are
    /// not items.
    pub fn collect(schema: &SchemaModel) -> Vec<Item> {
        let mut items: Vec<Item> = schema
            .types()
            .iter()
            .filter(|t| {
                !t.name.starts_with("__")
                    && !schema.is_root_type(&t.name)
                    && !BUILTIN_SCALARS.contains(&t.name.as_str())
            })
            .map(|t| Item::new(ItemKind::Type, t.name.clone()))
            .collect();

        for operation in OperationKind::ALL {
            items.extend(
                schema
                    .root_fields(operation)
                    .iter()
                    .map(|f| Item::new(operation.into(), f.name.clone())),
            );
        }

        items
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
