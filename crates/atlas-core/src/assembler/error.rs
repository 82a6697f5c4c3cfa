use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::docs::FrontMatterError;

/// Fatal problems while loading or assembling module documentation.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No documentation for module '{module}' at {path}: {source}")]
    MissingDocumentation {
        module: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid front matter for module '{module}' in {path}: {source}")]
    FrontMatter {
        module: String,
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("Module '{module}' includes unknown item '{item}'")]
    UnknownInclude { module: String, item: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
