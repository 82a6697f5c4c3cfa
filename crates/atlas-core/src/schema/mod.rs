//! Queryable view over a GraphQL introspection result.
//!
//! [`SchemaDocument`] is the immutable data; [`SchemaModel`] indexes it by
//! type name and answers the lookups every later stage needs.

mod error;
mod introspection;
mod printer;
mod types;

pub use error::SchemaError;
pub use introspection::{INTROSPECTION_QUERY, INTROSPECTION_QUERY_VERSION};
pub use types::{
    AppliedDirective, DirectiveArgument, DirectiveDefinition, EnumValue, Field, InputValue,
    OperationKind, RefKind, SchemaDocument, TypeDescriptor, TypeKind, TypeReference,
};

use std::collections::HashMap;
use std::sync::Arc;

/// Scalars every GraphQL schema has.
pub const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

/// Indexed, read-only schema shared by a run.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    document: Arc<SchemaDocument>,
    index: HashMap<String, usize>,
}

impl SchemaModel {
    /// Index a document. Fails when the query root type is not defined, or a
    /// declared mutation/subscription root is missing.
    pub fn new(document: SchemaDocument) -> Result<Self, SchemaError> {
        let index = document
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect::<HashMap<_, _>>();

        if document.query_type.is_empty() || !index.contains_key(&document.query_type) {
            return Err(SchemaError::MissingQueryType);
        }

        for operation in [OperationKind::Mutation, OperationKind::Subscription] {
            if let Some(name) = document.root_type_name(operation) {
                if !index.contains_key(name) {
                    return Err(SchemaError::UnknownRootType {
                        operation: operation.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            document: Arc::new(document),
            index,
        })
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.document.types
    }

    pub fn type_by_name(&self, name: &str) -> Option<&TypeDescriptor> {
        self.index.get(name).map(|&i| &self.document.types[i])
    }

    /// Fields of a type; empty for scalars, enums, unions and unknown names.
    pub fn fields_of_type(&self, name: &str) -> &[Field] {
        self.type_by_name(name)
            .and_then(|t| t.fields.as_deref())
            .unwrap_or(&[])
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&Field> {
        self.fields_of_type(type_name)
            .iter()
            .find(|f| f.name == field_name)
    }

    pub fn root_type_name(&self, operation: OperationKind) -> Option<&str> {
        self.document.root_type_name(operation)
    }

    /// Fields of an operation root; empty when the root is absent.
    pub fn root_fields(&self, operation: OperationKind) -> &[Field] {
        self.root_type_name(operation)
            .map(|name| self.fields_of_type(name))
            .unwrap_or(&[])
    }

    pub fn root_field(&self, operation: OperationKind, name: &str) -> Option<&Field> {
        self.root_fields(operation).iter().find(|f| f.name == name)
    }

    /// Whether `name` is one of the operation root types.
    pub fn is_root_type(&self, name: &str) -> bool {
        OperationKind::ALL
            .iter()
            .any(|op| self.root_type_name(*op) == Some(name))
    }

    pub fn drill_to_named_type<'r>(&self, reference: &'r TypeReference) -> Result<&'r str, SchemaError> {
        reference.named_type()
    }

    pub fn build_display_type(&self, reference: &TypeReference) -> Result<String, SchemaError> {
        reference.display()
    }
}
