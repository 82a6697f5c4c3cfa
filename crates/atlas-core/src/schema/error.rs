use thiserror::Error;

/// Errors raised while loading or querying a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to parse schema document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Schema document has no __schema object")]
    MissingSchema,

    #[error("Schema has no query root type")]
    MissingQueryType,

    #[error("{operation} root type '{name}' is not defined in the schema")]
    UnknownRootType { operation: String, name: String },

    #[error("Invalid type reference: {0}")]
    InvalidTypeReference(String),

    #[error("No {kind} named '{name}' in the schema")]
    UnknownItem { kind: String, name: String },
}
