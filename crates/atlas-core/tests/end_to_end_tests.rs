use atlas_core::assembler::DisplayName;
use atlas_core::diagnostics::Severity;
use atlas_core::{AtlasError, Catalog, CatalogBuilder, Config, ItemKind, SchemaDocument};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA: &str = r#"{
  "data": {
    "__schema": {
      "queryType": { "name": "Query" },
      "mutationType": { "name": "Mutation" },
      "subscriptionType": null,
      "types": [
        { "kind": "OBJECT", "name": "Query", "fields": [
          { "name": "user", "description": "Find one User by id.", "args": [
              { "name": "id", "type": { "kind": "NON_NULL", "name": null,
                "ofType": { "kind": "SCALAR", "name": "ID", "ofType": null } } } ],
            "type": { "kind": "OBJECT", "name": "User", "ofType": null } },
          { "name": "invoices", "args": [],
            "type": { "kind": "NON_NULL", "name": null,
              "ofType": { "kind": "LIST", "name": null,
                "ofType": { "kind": "OBJECT", "name": "Invoice", "ofType": null } } } }
        ] },
        { "kind": "OBJECT", "name": "Mutation", "fields": [
          { "name": "createUser", "args": [],
            "type": { "kind": "UNION", "name": "CreateUserResult", "ofType": null } }
        ] },
        { "kind": "OBJECT", "name": "User", "description": "A person with an account.", "fields": [
          { "name": "id", "args": [], "type": { "kind": "NON_NULL", "name": null,
              "ofType": { "kind": "SCALAR", "name": "ID", "ofType": null } } },
          { "name": "friends", "args": [],
            "type": { "kind": "OBJECT", "name": "UserConnection", "ofType": null } }
        ] },
        { "kind": "OBJECT", "name": "UserConnection", "fields": [
          { "name": "edges", "args": [], "type": { "kind": "LIST", "name": null,
              "ofType": { "kind": "OBJECT", "name": "UserEdge", "ofType": null } } }
        ] },
        { "kind": "OBJECT", "name": "UserEdge", "fields": [
          { "name": "node", "args": [], "type": { "kind": "OBJECT", "name": "User", "ofType": null } }
        ] },
        { "kind": "UNION", "name": "CreateUserResult",
          "possibleTypes": [
            { "kind": "OBJECT", "name": "CreateUserSuccess", "ofType": null },
            { "kind": "OBJECT", "name": "UserError", "ofType": null } ] },
        { "kind": "OBJECT", "name": "CreateUserSuccess", "fields": [
          { "name": "data", "args": [], "type": { "kind": "OBJECT", "name": "User", "ofType": null } }
        ] },
        { "kind": "OBJECT", "name": "UserError", "fields": [
          { "name": "message", "args": [], "type": { "kind": "SCALAR", "name": "String", "ofType": null } }
        ] },
        { "kind": "OBJECT", "name": "Invoice",
          "appliedDirectives": [ { "name": "module", "args": [ { "name": "name", "value": "\"billing\"" } ] } ],
          "fields": [
            { "name": "total", "args": [], "type": { "kind": "SCALAR", "name": "Int", "ofType": null } }
          ] },
        { "kind": "SCALAR", "name": "ID" },
        { "kind": "SCALAR", "name": "String" },
        { "kind": "SCALAR", "name": "Int" }
      ],
      "directives": []
    }
  }
}"#;

const CONFIG: &str = r#"
[[modules]]
name = "users"
items = ["User"]
source_url = "https://code.example.com/%path%"

[[modules.filesystem]]
files = "src/**/*.ts"
pattern = 'query\.(?P<name>\w+)'

[[modules]]
name = "billing"
display_name = "Billing & Invoices"

[special_types.result]
type_pattern = "Result$"
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "docs/users.md",
        "# Users\n\nEverything about the User type and the query user field.\n",
    );
    write(
        temp.path(),
        "docs/billing.md",
        "---\nrank: 1\n---\n# Money\n\nInvoices for every User.\n",
    );
    write(
        temp.path(),
        "src/users/api.ts",
        "import { client } from './client';\nconst load = () => query.user({ id });\n",
    );

    let mut config = Config::from_toml_str(CONFIG).unwrap();
    config.base_dir = temp.path().to_path_buf();
    (temp, config)
}

async fn build(config: Config) -> Result<atlas_core::BuildReport, AtlasError> {
    let schema = SchemaDocument::from_introspection_json(SCHEMA).unwrap();
    CatalogBuilder::new(config, schema).build().await
}

#[tokio::test]
async fn test_query_matched_from_source_file() {
    let (_temp, config) = project();
    let report = build(config).await.unwrap();
    let catalog = &report.catalog;

    let users = catalog.module("users").unwrap();
    assert_eq!(users.queries(), &["user".to_string()]);
    assert!(users.types().contains(&"User".to_string()));

    let user = catalog.augmented_item_of(ItemKind::Query, "user").unwrap();
    assert_eq!(user.display_type, "User");
    assert_eq!(user.modules, vec!["users".to_string()]);
    assert_eq!(user.reference_path.as_deref(), Some("/users#user"));
    assert_eq!(user.arguments[0].display_type.as_deref(), Some("ID!"));

    let location = user.source_location.as_ref().unwrap();
    assert_eq!(location.file, "src/users/api.ts");
    assert_eq!(location.line, Some(2));
    assert_eq!(
        user.source_url.as_deref(),
        Some("https://code.example.com/src/users/api.ts")
    );

    // Description links to the User type, but not to itself.
    let description = user.rendered_description.as_deref().unwrap();
    assert!(description.contains(r#"href="/users#User""#));
}

#[tokio::test]
async fn test_static_match_has_no_source_url_when_path_is_needed() {
    let (_temp, config) = project();
    let report = build(config).await.unwrap();

    let user = report.catalog.augmented_item_of(ItemKind::Type, "User").unwrap();
    assert!(user.source_location.is_none());
    assert!(user.source_url.is_none());
}

#[tokio::test]
async fn test_module_order_and_display_names() {
    let (_temp, config) = project();
    let report = build(config).await.unwrap();
    let catalog = &report.catalog;

    let names: Vec<&str> = catalog.modules.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["billing", "users"]);

    let billing = catalog.module("billing").unwrap();
    assert_eq!(billing.display_name(), "Billing & Invoices");
    assert_eq!(
        billing.display_name_source(),
        &DisplayName::Explicit("Billing & Invoices".to_string())
    );
    assert_eq!(billing.rank(), Some(1));
    assert!(billing.is_sealed());

    let users = catalog.module("users").unwrap();
    assert_eq!(users.display_name(), "Users");
    assert_eq!(users.display_name_source(), &DisplayName::FromDocumentationHeading);
    assert!(users
        .short_description()
        .is_some_and(|s| s.starts_with("Everything about")));
    assert!(!users.rendered_docs().contains("<h1>"));
}

#[tokio::test]
async fn test_schema_directive_classifies_type() {
    let (_temp, config) = project();
    let report = build(config).await.unwrap();

    let billing = report.catalog.module("billing").unwrap();
    assert_eq!(billing.types(), &["Invoice".to_string()]);

    let invoices = report.catalog.augmented_item_of(ItemKind::Query, "invoices").unwrap();
    assert_eq!(invoices.display_type, "[Invoice]!");
    assert!(invoices.modules.is_empty());
}

#[tokio::test]
async fn test_wrappers_live_with_wrapped_type() {
    let (_temp, config) = project();
    let report = build(config).await.unwrap();
    let catalog = &report.catalog;

    let result = catalog.augmented_item("CreateUserResult").unwrap();
    assert_eq!(result.signature.as_deref(), Some("Result<User, UserError>"));
    assert_eq!(result.reference_path.as_deref(), Some("/users#CreateUserResult"));
    assert!(result.modules.is_empty());

    let connection = catalog.augmented_item("UserConnection").unwrap();
    assert_eq!(connection.signature.as_deref(), Some("Connection<User>"));
    let info = connection.connection_info.as_ref().unwrap();
    assert_eq!(info.edge_type.as_deref(), Some("UserEdge"));

    let create = catalog.augmented_item_of(ItemKind::Mutation, "createUser").unwrap();
    assert_eq!(create.signature.as_deref(), Some("Result<User, UserError>"));

    let user = catalog.augmented_item_of(ItemKind::Type, "User").unwrap();
    let friends = user.fields.iter().find(|f| f.name == "friends").unwrap();
    assert_eq!(friends.signature.as_deref(), Some("Connection<User>"));
    assert_eq!(friends.type_reference_path.as_deref(), Some("/users#UserConnection"));
}

#[tokio::test]
async fn test_builds_are_deterministic() {
    let (_temp, config) = project();
    let first = build(config.clone()).await.unwrap();
    let second = build(config).await.unwrap();

    assert_eq!(first.catalog, second.catalog);
    assert_eq!(
        first.catalog.fingerprint().unwrap(),
        second.catalog.fingerprint().unwrap()
    );
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[tokio::test]
async fn test_catalog_survives_json() {
    let (_temp, config) = project();
    let report = build(config).await.unwrap();

    let json = report.catalog.to_json().unwrap();
    let restored = Catalog::from_json(&json).unwrap();
    assert_eq!(restored, report.catalog);
    assert!(restored.module("users").unwrap().is_sealed());
    assert!(restored.schema_sdl.contains("type Query"));
}

#[tokio::test]
async fn test_empty_glob_is_a_warning() {
    let (_temp, mut config) = project();
    config.modules[1].filesystem.push(atlas_core::config::FilesystemRule {
        files: "lib/**/*.py".to_string(),
        pattern: r"(?P<name>\w+)".to_string(),
    });

    let report = build(config).await.unwrap();
    assert!(report.diagnostics.iter().any(|d| {
        d.severity == Severity::Warning
            && d.module.as_deref() == Some("billing")
            && d.message.contains("matched no files")
    }));
}

#[tokio::test]
async fn test_module_without_items_is_dropped() {
    let (temp, mut config) = project();
    write(temp.path(), "docs/empty.md", "# Empty\n");
    config.modules.push(atlas_core::config::ModuleRule::new("empty"));

    let report = build(config).await.unwrap();
    assert!(report.catalog.module("empty").is_none());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.module.as_deref() == Some("empty")));
}

#[tokio::test]
async fn test_manual_include() {
    let (temp, config) = project();
    write(
        temp.path(),
        "docs/billing.md",
        "---\ninclude:\n  - query invoices\n---\n# Billing\n",
    );

    let report = build(config).await.unwrap();
    let billing = report.catalog.module("billing").unwrap();
    assert_eq!(billing.queries(), &["invoices".to_string()]);

    let invoices = report.catalog.augmented_item_of(ItemKind::Query, "invoices").unwrap();
    assert_eq!(invoices.modules, vec!["billing".to_string()]);
}
