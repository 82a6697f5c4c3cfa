//! Normalized GraphQL schema data model.
//!
//! Field names follow the introspection result so a `__schema.types` entry
//! deserializes straight into a [`TypeDescriptor`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::SchemaError;

/// The three root operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Query,
        OperationKind::Mutation,
        OperationKind::Subscription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable schema snapshot shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: Vec<TypeDescriptor>,
    #[serde(default)]
    pub directives: Vec<DirectiveDefinition>,
}

impl SchemaDocument {
    /// Root type name of an operation, if the schema defines it.
    pub fn root_type_name(&self, operation: OperationKind) -> Option<&str> {
        match operation {
            OperationKind::Query => Some(self.query_type.as_str()),
            OperationKind::Mutation => self.mutation_type.as_deref(),
            OperationKind::Subscription => self.subscription_type.as_deref(),
        }
    }
}

/// Kind of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

/// One named type of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<TypeReference>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<TypeReference>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_directives: Vec<AppliedDirective>,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            fields: None,
            input_fields: None,
            interfaces: None,
            enum_values: None,
            possible_types: None,
            applied_directives: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_input_fields(mut self, fields: Vec<InputValue>) -> Self {
        self.input_fields = Some(fields);
        self
    }

    pub fn with_interfaces(mut self, names: &[&str]) -> Self {
        self.interfaces = Some(names.iter().map(|n| TypeReference::named(*n)).collect());
        self
    }

    pub fn with_possible_types(mut self, names: &[&str]) -> Self {
        self.possible_types = Some(names.iter().map(|n| TypeReference::named(*n)).collect());
        self
    }

    pub fn with_enum_values(mut self, names: &[&str]) -> Self {
        self.enum_values = Some(names.iter().map(|n| EnumValue::new(*n)).collect());
        self
    }

    pub fn with_directive(mut self, directive: AppliedDirective) -> Self {
        self.applied_directives.push(directive);
        self
    }

    /// Names of the union/interface members.
    pub fn possible_type_names(&self) -> Vec<&str> {
        self.possible_types
            .iter()
            .flatten()
            .filter_map(|r| r.named_type().ok())
            .collect()
    }

    /// Names of the declared interfaces.
    pub fn interface_names(&self) -> Vec<&str> {
        self.interfaces
            .iter()
            .flatten()
            .filter_map(|r| r.named_type().ok())
            .collect()
    }
}

/// An output field (or a root operation field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub field_type: TypeReference,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_directives: Vec<AppliedDirective>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: TypeReference) -> Self {
        Self {
            name: name.into(),
            description: None,
            args: Vec::new(),
            field_type,
            is_deprecated: false,
            deprecation_reason: None,
            applied_directives: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_arg(mut self, arg: InputValue) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_directive(mut self, directive: AppliedDirective) -> Self {
        self.applied_directives.push(directive);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.is_deprecated = true;
        self.deprecation_reason = Some(reason.into());
        self
    }
}

/// An argument or input object field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub value_type: TypeReference,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, value_type: TypeReference) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_type,
            default_value: None,
        }
    }
}

/// A member of an enum type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_deprecated: false,
            deprecation_reason: None,
        }
    }
}

/// A directive definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
}

/// A directive applied to a type or field, with literal argument values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDirective {
    pub name: String,
    #[serde(default)]
    pub args: Vec<DirectiveArgument>,
}

impl AppliedDirective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument; `value` is a GraphQL literal such as `"users"`.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push(DirectiveArgument {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveArgument {
    pub name: String,
    pub value: String,
}

/// Wrapper kind of a type reference.
///
/// Introspection reports the named type's kind (`OBJECT`, `SCALAR`, …) on the
/// innermost node; all of those collapse to `Named`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    #[serde(rename = "LIST")]
    List,
    #[serde(rename = "NON_NULL")]
    NonNull,
    #[serde(rename = "NAMED", other)]
    Named,
}

/// A possibly wrapped reference to a named type.
///
/// Wrappers nest through `of_type` and always end in one `Named` node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeReference {
    pub kind: RefKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeReference>>,
}

impl TypeReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Named,
            name: Some(name.into()),
            of_type: None,
        }
    }

    pub fn list(inner: TypeReference) -> Self {
        Self {
            kind: RefKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn non_null(inner: TypeReference) -> Self {
        Self {
            kind: RefKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// Follow LIST/NON_NULL wrappers down to the named type.
    pub fn named_type(&self) -> Result<&str, SchemaError> {
        let mut current = self;
        loop {
            match current.kind {
                RefKind::Named => {
                    return match current.name.as_deref() {
                        Some(name) if !name.is_empty() => Ok(name),
                        _ => Err(SchemaError::InvalidTypeReference(
                            "named type reference without a name".to_string(),
                        )),
                    };
                }
                RefKind::List | RefKind::NonNull => {
                    current = current.of_type.as_deref().ok_or_else(|| {
                        SchemaError::InvalidTypeReference(format!(
                            "{:?} wrapper without an inner type",
                            current.kind
                        ))
                    })?;
                }
            }
        }
    }

    /// Render in GraphQL notation, e.g. `[User!]!`.
    pub fn display(&self) -> Result<String, SchemaError> {
        match self.kind {
            RefKind::Named => Ok(self.named_type()?.to_string()),
            RefKind::List => Ok(format!("[{}]", self.inner()?.display()?)),
            RefKind::NonNull => Ok(format!("{}!", self.inner()?.display()?)),
        }
    }

    fn inner(&self) -> Result<&TypeReference, SchemaError> {
        self.of_type.as_deref().ok_or_else(|| {
            SchemaError::InvalidTypeReference(format!("{:?} wrapper without an inner type", self.kind))
        })
    }
}
