use thiserror::Error;

use crate::assembler::AssemblyError;
use crate::config::ConfigError;
use crate::matcher::MatcherError;
use crate::schema::SchemaError;

/// Fatal errors that stop a catalog build.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Matcher error: {0}")]
    Matcher(#[from] MatcherError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),
}
