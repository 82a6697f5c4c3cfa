use atlas_core::config::SpecialTypesConfig;
use atlas_core::diagnostics::Severity;
use atlas_core::schema::{Field, SchemaDocument, SchemaModel, TypeDescriptor, TypeKind, TypeReference};
use atlas_core::special::{SpecialType, SpecialTypeResolver};
use atlas_core::Diagnostics;
use std::sync::Arc;

fn object(name: &str, fields: Vec<Field>) -> TypeDescriptor {
    TypeDescriptor::new(TypeKind::Object, name).with_fields(fields)
}

fn schema() -> Arc<SchemaModel> {
    let non_null_list = |name: &str| {
        TypeReference::non_null(TypeReference::list(TypeReference::non_null(
            TypeReference::named(name),
        )))
    };
    let document = SchemaDocument {
        query_type: "Query".to_string(),
        mutation_type: None,
        subscription_type: None,
        types: vec![
            object("Query", vec![Field::new("ok", TypeReference::named("Boolean"))]),
            object("Order", Vec::new()),
            object("OrderConnection", vec![Field::new("edges", non_null_list("OrderEdge"))]),
            object("OrderEdge", vec![Field::new("node", TypeReference::named("Order"))]),
            object("LegacyConnection", vec![Field::new("items", non_null_list("Order"))]),
            TypeDescriptor::new(TypeKind::Union, "MutationPlaceOrderResult")
                .with_possible_types(&["PlaceOrderSuccess", "OutOfStock", "PaymentDeclined"]),
            object("PlaceOrderSuccess", vec![Field::new("data", TypeReference::named("Order"))]),
            object("OutOfStock", Vec::new()),
            object("PaymentDeclined", Vec::new()),
            TypeDescriptor::new(TypeKind::Union, "QueryAmbiguousResult")
                .with_possible_types(&["FirstSuccess", "SecondSuccess"]),
            object("FirstSuccess", vec![Field::new("data", TypeReference::named("Order"))]),
            object("SecondSuccess", vec![Field::new("data", TypeReference::named("Order"))]),
            object("QueryObjectResult", Vec::new()),
        ],
        directives: Vec::new(),
    };
    Arc::new(SchemaModel::new(document).unwrap())
}

fn resolver(config: &SpecialTypesConfig) -> (SpecialTypeResolver, Arc<Diagnostics>) {
    let diagnostics = Arc::new(Diagnostics::new());
    let resolver = SpecialTypeResolver::new(schema(), config, Arc::clone(&diagnostics)).unwrap();
    (resolver, diagnostics)
}

#[test]
fn test_connection_through_wrappers() {
    let (resolver, diagnostics) = resolver(&SpecialTypesConfig::default());

    let info = resolver.resolve_pagination("OrderConnection").unwrap();
    assert_eq!(info.node_type, "Order");
    assert_eq!(info.edge_type.as_deref(), Some("OrderEdge"));
    assert_eq!(info.signature(), "Connection<Order>");
    assert!(diagnostics.is_empty());
}

#[test]
fn test_connection_name_without_shape_is_an_inference_miss() {
    let (resolver, diagnostics) = resolver(&SpecialTypesConfig::default());

    assert!(resolver.resolve("LegacyConnection").is_none());
    let entries = diagnostics.snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Inference);
    assert_eq!(entries[0].item.as_deref(), Some("LegacyConnection"));
}

#[test]
fn test_custom_node_path() {
    let mut config = SpecialTypesConfig::default();
    config.pagination.node_path = "items".to_string();
    config.pagination.edge_path = String::new();
    let (resolver, _) = resolver(&config);

    let info = resolver.resolve_pagination("LegacyConnection").unwrap();
    assert_eq!(info.node_type, "Order");
}

#[test]
fn test_result_union() {
    let (resolver, _) = resolver(&SpecialTypesConfig::default());

    let special = resolver.resolve("MutationPlaceOrderResult").unwrap();
    assert_eq!(special.wrapped_type(), "Order");
    assert_eq!(special.signature(), "Result<Order, OutOfStock | PaymentDeclined>");
    let info = special.result().unwrap();
    assert_eq!(info.success_type, "PlaceOrderSuccess");
}

#[test]
fn test_result_needs_exactly_one_success() {
    let (resolver, diagnostics) = resolver(&SpecialTypesConfig::default());

    assert!(resolver.resolve_result("QueryAmbiguousResult").is_none());
    assert!(resolver.resolve_result("QueryObjectResult").is_none());
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_names_outside_pattern_are_ignored_silently() {
    let (resolver, diagnostics) = resolver(&SpecialTypesConfig::default());

    assert!(resolver.resolve("Order").is_none());
    assert!(resolver.resolve("PlaceOrderResult").is_none());
    assert!(diagnostics.is_empty());
}

#[test]
fn test_resolve_all_keeps_wrappers_only() {
    let (resolver, _) = resolver(&SpecialTypesConfig::default());

    let resolved = resolver.resolve_all(["Order", "OrderConnection", "MutationPlaceOrderResult"]);
    assert_eq!(resolved.len(), 2);
    assert!(matches!(resolved.get("OrderConnection"), Some(SpecialType::Connection(_))));
    assert!(matches!(resolved.get("MutationPlaceOrderResult"), Some(SpecialType::Result(_))));
}

#[test]
fn test_answers_are_memoized() {
    let (resolver, diagnostics) = resolver(&SpecialTypesConfig::default());

    assert!(resolver.resolve("LegacyConnection").is_none());
    assert!(resolver.resolve("LegacyConnection").is_none());
    assert_eq!(diagnostics.len(), 1);
}
