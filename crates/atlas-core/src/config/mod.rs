//! Configuration management for Atlas.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `atlas.toml` file
//! 3. User config `~/.config/atlas/config.toml`
//! 4. Built-in defaults (lowest priority)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;
mod template;

pub use defaults::*;
pub use template::{Placeholder, Template, TemplateContext, TemplateError};

use crate::matcher::MatcherKind;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid template for {context}: {source}")]
    Template {
        context: String,
        #[source]
        source: TemplateError,
    },

    #[error("Invalid pattern for {context}: {source}")]
    Pattern {
        context: String,
        #[source]
        source: regex::Error,
    },
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that globs and documentation paths are relative to.
    pub base_dir: PathBuf,

    /// Only classify the first N items (pre-filter, not a cancellation).
    pub item_limit: Option<usize>,

    /// Maximum number of matcher evaluations in flight.
    pub concurrency: usize,

    /// Priority order of matchers, unless a module overrides it.
    pub matcher_order: Vec<MatcherKind>,

    /// One rule per module, in presentation order.
    pub modules: Vec<ModuleRule>,

    /// Schema directive matcher configuration.
    pub directive: DirectiveConfig,

    /// Pagination and result wrapper detection.
    pub special_types: SpecialTypesConfig,

    /// Reference paths and descriptions.
    pub links: LinksConfig,

    /// Custom `%token%` values usable in every template.
    pub placeholders: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            item_limit: None,
            concurrency: DEFAULT_CONCURRENCY,
            matcher_order: MatcherKind::default_order(),
            modules: Vec::new(),
            directive: DirectiveConfig::default(),
            special_types: SpecialTypesConfig::default(),
            links: LinksConfig::default(),
            placeholders: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./atlas.toml` (project local)
    /// 2. `~/.config/atlas/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(DEFAULT_USER_CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML text, without environment overrides.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("ATLAS_BASE_DIR") {
            self.base_dir = PathBuf::from(dir);
        }
        if let Ok(limit) = std::env::var("ATLAS_ITEM_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.item_limit = Some(n);
            }
        }
        if let Ok(concurrency) = std::env::var("ATLAS_CONCURRENCY") {
            if let Ok(n) = concurrency.parse() {
                self.concurrency = n;
            }
        }
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Look up a module rule by name.
    pub fn module(&self, name: &str) -> Option<&ModuleRule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Names of all configured modules, in configuration order.
    pub fn module_names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }

    /// Resolve a path relative to `base_dir`.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Matcher priority for a module.
    pub fn matcher_order_for<'a>(&'a self, module: &'a ModuleRule) -> &'a [MatcherKind] {
        module
            .matcher_order
            .as_deref()
            .unwrap_or(&self.matcher_order)
    }

    /// Parse the templates of one module.
    pub fn module_templates(&self, module: &ModuleRule) -> Result<ModuleTemplates, ConfigError> {
        let parse = |field: &str, source: &str, allowed: &[Placeholder]| {
            Template::parse(source, allowed, &self.placeholders).map_err(|source| {
                ConfigError::Template {
                    context: format!("module '{}' {}", module.name, field),
                    source,
                }
            })
        };
        let urls = [Placeholder::Module, Placeholder::Name, Placeholder::Path];

        Ok(ModuleTemplates {
            docs: parse(
                "docs",
                module.docs.as_deref().unwrap_or(DEFAULT_DOCS_TEMPLATE),
                &[Placeholder::Module],
            )?,
            icon: module
                .icon
                .as_deref()
                .map(|s| parse("icon", s, &[Placeholder::Module]))
                .transpose()?,
            source_url: module
                .source_url
                .as_deref()
                .map(|s| parse("source_url", s, &urls))
                .transpose()?,
            contribution_url: module
                .contribution_url
                .as_deref()
                .map(|s| parse("contribution_url", s, &urls))
                .transpose()?,
        })
    }

    /// Parse the reference path template.
    pub fn reference_path_template(&self) -> Result<Template, ConfigError> {
        Template::parse(
            &self.links.reference_path,
            &[Placeholder::Module, Placeholder::Name],
            &self.placeholders,
        )
        .map_err(|source| ConfigError::Template {
            context: "links.reference_path".to_string(),
            source,
        })
    }

    /// Check everything that can be checked before a run starts.
    ///
    /// Matcher rules (globs, regexes, structural queries) are compiled and
    /// validated by the matchers themselves when the pipeline is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()));
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(ConfigError::Invalid("module with an empty name".to_string()));
            }
            if !seen.insert(module.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "module '{}' is configured twice",
                    module.name
                )));
            }
            self.module_templates(module)?;
        }

        self.reference_path_template()?;
        self.special_types.compile()?;

        Ok(())
    }
}

/// Configuration for one module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleRule {
    /// Module name, used in paths and templates.
    pub name: String,

    /// Explicit display name; otherwise taken from the documentation heading.
    pub display_name: Option<String>,

    /// Documentation source template (default `docs/%module%.md`).
    pub docs: Option<String>,

    /// Icon file template.
    pub icon: Option<String>,

    /// Source code URL template.
    pub source_url: Option<String>,

    /// "Edit this page" URL template.
    pub contribution_url: Option<String>,

    /// Static allow-list of item names.
    pub items: Vec<String>,

    /// File-glob + regex rules, tried in order.
    pub filesystem: Vec<FilesystemRule>,

    /// File-glob + tree-sitter query rules, tried in order.
    pub structural: Vec<StructuralRule>,

    /// Matcher priority override for this module.
    pub matcher_order: Option<Vec<MatcherKind>>,
}

impl ModuleRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Parsed templates of a module.
#[derive(Debug, Clone)]
pub struct ModuleTemplates {
    pub docs: Template,
    pub icon: Option<Template>,
    pub source_url: Option<Template>,
    pub contribution_url: Option<Template>,
}

/// Regex rule applied to each line of the files matched by a glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemRule {
    /// Glob relative to `base_dir`; `%module%` is substituted.
    pub files: String,

    /// Regex with a `(?P<name>…)` group; `%module%` is substituted.
    pub pattern: String,
}

/// Tree-sitter query rule applied to the files matched by a glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralRule {
    /// Glob relative to `base_dir`; `%module%` is substituted.
    pub files: String,

    /// Grammar name, e.g. "typescript" or "python".
    pub language: String,

    /// Tree-sitter query declaring a `@name` capture.
    pub query: String,
}

/// Schema directive matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    /// Directive name, without the `@`.
    pub name: String,

    /// Argument holding the module name or list of names.
    pub argument: String,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DIRECTIVE_NAME.to_string(),
            argument: DEFAULT_DIRECTIVE_ARGUMENT.to_string(),
        }
    }
}

/// Special type detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialTypesConfig {
    pub pagination: PaginationConfig,
    pub result: ResultConfig,
}

impl SpecialTypesConfig {
    /// Compile all name patterns.
    pub fn compile(&self) -> Result<SpecialTypePatterns, ConfigError> {
        let compile = |context: &str, pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                context: context.to_string(),
                source,
            })
        };

        Ok(SpecialTypePatterns {
            connection: compile("special_types.pagination.type_pattern", &self.pagination.type_pattern)?,
            result: compile("special_types.result.type_pattern", &self.result.type_pattern)?,
            success: compile("special_types.result.success_pattern", &self.result.success_pattern)?,
        })
    }
}

/// Compiled special type name patterns.
#[derive(Debug, Clone)]
pub struct SpecialTypePatterns {
    pub connection: Regex,
    pub result: Regex,
    pub success: Regex,
}

/// Pagination wrapper detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Regex a connection type name must match.
    pub type_pattern: String,

    /// Dotted field path from the connection to the node type.
    pub node_path: String,

    /// Dotted field path from the connection to the edge type.
    pub edge_path: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            type_pattern: format!("{}$", regex::escape(DEFAULT_CONNECTION_SUFFIX)),
            node_path: DEFAULT_NODE_PATH.to_string(),
            edge_path: DEFAULT_EDGE_PATH.to_string(),
        }
    }
}

/// Result wrapper detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultConfig {
    /// Regex a result union name must match.
    pub type_pattern: String,

    /// Regex the success member name must match.
    pub success_pattern: String,

    /// Payload field on the success member.
    pub payload_field: String,
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            type_pattern: DEFAULT_RESULT_PATTERN.to_string(),
            success_pattern: DEFAULT_SUCCESS_PATTERN.to_string(),
            payload_field: DEFAULT_PAYLOAD_FIELD.to_string(),
        }
    }
}

/// Links and descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Reference path template; `%module%` and `%name%` are available.
    pub reference_path: String,

    /// Maximum words in a module short description.
    pub short_description_words: usize,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            reference_path: DEFAULT_REFERENCE_PATH.to_string(),
            short_description_words: DEFAULT_SHORT_DESCRIPTION_WORDS,
        }
    }
}
