use thiserror::Error;

use super::MatcherKind;
use crate::config::ConfigError;

/// Configuration problems found while compiling matcher rules.
///
/// All of these are raised before classification starts.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("Module '{module}' filesystem rule {rule}: invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        module: String,
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Module '{module}' filesystem rule {rule}: pattern '{pattern}' has no (?P<name>...) group")]
    MissingNameGroup {
        module: String,
        rule: usize,
        pattern: String,
    },

    #[error("Module '{module}' {matcher} rule {rule}: invalid glob '{glob}': {source}")]
    InvalidGlob {
        module: String,
        matcher: MatcherKind,
        rule: usize,
        glob: String,
        #[source]
        source: globset::Error,
    },

    #[error("Module '{module}' structural rule {rule}: unknown language '{language}'")]
    UnknownLanguage {
        module: String,
        rule: usize,
        language: String,
    },

    #[error("Module '{module}' structural rule {rule}: invalid query: {message}")]
    InvalidQuery {
        module: String,
        rule: usize,
        message: String,
    },

    #[error("Module '{module}' structural rule {rule}: query has no @name capture")]
    MissingNameCapture { module: String, rule: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
