//! Default values for Atlas configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Run Defaults
// ============================================================================

/// Directory that globs and documentation paths are resolved against.
pub const DEFAULT_BASE_DIR: &str = ".";

/// Number of matcher evaluations allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Project-local config file name.
pub const DEFAULT_CONFIG_FILE: &str = "atlas.toml";

/// Subdirectory of the user config dir holding `config.toml`.
pub const DEFAULT_USER_CONFIG_DIR: &str = "atlas";

// ============================================================================
// Module Defaults
// ============================================================================

/// Documentation source used when a module does not declare one.
pub const DEFAULT_DOCS_TEMPLATE: &str = "docs/%module%.md";

/// Named capture group every filesystem regex must declare.
pub const NAME_CAPTURE: &str = "name";

/// Optional capture group restricting a match to one item kind.
pub const KIND_CAPTURE: &str = "kind";

// ============================================================================
// Directive Defaults
// ============================================================================

/// Directive that carries a module annotation in the schema.
pub const DEFAULT_DIRECTIVE_NAME: &str = "module";

/// Directive argument holding the module name(s).
pub const DEFAULT_DIRECTIVE_ARGUMENT: &str = "name";

// ============================================================================
// Special Type Defaults
// ============================================================================

/// Suffix that marks a pagination wrapper type.
pub const DEFAULT_CONNECTION_SUFFIX: &str = "Connection";

/// Field path from a connection type to its node type.
pub const DEFAULT_NODE_PATH: &str = "edges.node";

/// Field path from a connection type to its edge type.
pub const DEFAULT_EDGE_PATH: &str = "edges";

/// Name pattern of result wrapper unions.
pub const DEFAULT_RESULT_PATTERN: &str = r"^(Query|Mutation|Subscription)\w+Result$";

/// Name pattern of the success member of a result union.
pub const DEFAULT_SUCCESS_PATTERN: &str = r"Success$";

/// Field on the success member that carries the payload.
pub const DEFAULT_PAYLOAD_FIELD: &str = "data";

// ============================================================================
// Link Defaults
// ============================================================================

/// Reference path of an item inside its module page.
pub const DEFAULT_REFERENCE_PATH: &str = "/%module%#%name%";

/// Word limit of a module short description.
pub const DEFAULT_SHORT_DESCRIPTION_WORDS: usize = 30;

/// Appended to a short description that was cut.
pub const ELLIPSIS: &str = "…";
