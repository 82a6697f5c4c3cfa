use atlas_core::config::{
    ConfigError, Placeholder, TemplateContext, DEFAULT_CONCURRENCY, DEFAULT_DOCS_TEMPLATE,
    DEFAULT_REFERENCE_PATH, DEFAULT_SHORT_DESCRIPTION_WORDS,
};
use atlas_core::matcher::MatcherKind;
use atlas_core::Config;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(config.links.reference_path, DEFAULT_REFERENCE_PATH);
    assert_eq!(config.links.short_description_words, DEFAULT_SHORT_DESCRIPTION_WORDS);
    assert!(config.modules.is_empty());
    assert!(config.item_limit.is_none());
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
item_limit = 200
concurrency = 4
matcher_order = ["directive", "static"]

[placeholders]
repo = "https://git.example.com/api"

[directive]
name = "@owner"
argument = "team"

[links]
reference_path = "/reference/%module%/%name%"
short_description_words = 12

[[modules]]
name = "users"
display_name = "Users"
docs = "guides/%module%/index.md"
source_url = "%repo%/blob/main/%path%"
contribution_url = "%repo%/edit/main/%path%"
items = ["User", "Role"]
matcher_order = ["filesystem"]

[[modules.filesystem]]
files = "src/%module%/**/*.ts"
pattern = 'query\.(?P<name>\w+)'

[[modules.structural]]
files = "services/**/*.py"
language = "python"
query = "(call function: (identifier) @name)"
"#;
    let config = Config::from_toml_str(toml_str).unwrap();
    assert!(config.validate().is_ok());

    assert_eq!(config.item_limit, Some(200));
    assert_eq!(config.matcher_order, vec![MatcherKind::Directive, MatcherKind::Static]);
    assert_eq!(config.directive.argument, "team");
    assert_eq!(config.module_names(), vec!["users".to_string()]);

    let users = config.module("users").unwrap();
    assert_eq!(users.filesystem.len(), 1);
    assert_eq!(users.structural[0].language, "python");
    assert_eq!(config.matcher_order_for(users), &[MatcherKind::Filesystem]);

    let templates = config.module_templates(users).unwrap();
    let context = TemplateContext::module("users")
        .with_name("User")
        .with_path(Some("src/users/api.ts"));
    assert_eq!(
        templates.source_url.unwrap().render(&context),
        "https://git.example.com/api/blob/main/src/users/api.ts"
    );
    assert_eq!(
        templates.docs.render(&TemplateContext::module("users")),
        "guides/users/index.md"
    );
    assert!(templates.contribution_url.unwrap().uses(Placeholder::Path));

    let reference = config.reference_path_template().unwrap();
    assert_eq!(
        reference.render(&TemplateContext::module("users").with_name("User")),
        "/reference/users/User"
    );
}

#[test]
fn test_default_docs_template() {
    let config = Config::from_toml_str("[[modules]]\nname = \"billing\"\n").unwrap();
    let billing = config.module("billing").unwrap();
    let templates = config.module_templates(billing).unwrap();

    assert_eq!(templates.docs.source(), DEFAULT_DOCS_TEMPLATE);
    assert_eq!(
        templates.docs.render(&TemplateContext::module("billing")),
        "docs/billing.md"
    );
    assert!(templates.icon.is_none());
}

#[test]
fn test_placeholder_not_allowed_in_docs() {
    let config = Config::from_toml_str(
        "[[modules]]\nname = \"billing\"\ndocs = \"docs/%name%.md\"\n",
    )
    .unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Template { .. })));
}

#[test]
fn test_invalid_special_type_pattern() {
    let config = Config::from_toml_str("[special_types.pagination]\ntype_pattern = \"(\"\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Pattern { .. })));
}

#[test]
fn test_unknown_matcher_kind_is_a_parse_error() {
    let err = Config::from_toml_str("matcher_order = [\"guess\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("atlas.toml");
    fs::write(&path, "[[modules]]\nname = \"users\"\nitems = [\"User\"]\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.module("users").unwrap().items, vec!["User".to_string()]);
}

#[test]
fn test_missing_file_is_a_read_error() {
    let temp = TempDir::new().unwrap();
    let err = Config::from_file(temp.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError(_)));
}
