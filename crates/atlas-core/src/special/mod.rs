//! Pagination and result wrapper detection.
//!
//! Both are inferred from naming conventions plus a structural check. A name
//! that matches the convention but fails the check is simply not a wrapper;
//! the reason is recorded as an inference diagnostic.

mod pagination;
mod result;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ConfigError, PaginationConfig, ResultConfig, SpecialTypePatterns, SpecialTypesConfig};
use crate::diagnostics::Diagnostics;
use crate::schema::{SchemaModel, TypeReference};

/// A paginated list wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub connection_type: String,
    pub node_type: String,
    pub edge_type: Option<String>,
}

impl ConnectionInfo {
    /// `Connection<Node>`
    pub fn signature(&self) -> String {
        format!("Connection<{}>", self.node_type)
    }
}

/// A success/error union wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInfo {
    pub result_type: String,
    pub success_type: String,
    pub success_data_type: String,
    pub error_types: Vec<String>,
}

impl ResultInfo {
    /// `Result<Data, ErrorA | ErrorB>`
    pub fn signature(&self) -> String {
        if self.error_types.is_empty() {
            format!("Result<{}>", self.success_data_type)
        } else {
            format!(
                "Result<{}, {}>",
                self.success_data_type,
                self.error_types.join(" | ")
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SpecialType {
    Connection(ConnectionInfo),
    Result(ResultInfo),
}

impl SpecialType {
    pub fn signature(&self) -> String {
        match self {
            SpecialType::Connection(info) => info.signature(),
            SpecialType::Result(info) => info.signature(),
        }
    }

    /// The type a wrapper stands for: node type or success data type.
    pub fn wrapped_type(&self) -> &str {
        match self {
            SpecialType::Connection(info) => &info.node_type,
            SpecialType::Result(info) => &info.success_data_type,
        }
    }

    pub fn connection(&self) -> Option<&ConnectionInfo> {
        match self {
            SpecialType::Connection(info) => Some(info),
            SpecialType::Result(_) => None,
        }
    }

    pub fn result(&self) -> Option<&ResultInfo> {
        match self {
            SpecialType::Result(info) => Some(info),
            SpecialType::Connection(_) => None,
        }
    }
}

/// Resolved wrappers by type name.
pub type SpecialTypes = BTreeMap<String, SpecialType>;

/// Detects wrapper types, memoizing every answer for the run.
pub struct SpecialTypeResolver {
    schema: Arc<SchemaModel>,
    patterns: SpecialTypePatterns,
    pagination: PaginationConfig,
    result: ResultConfig,
    diagnostics: Arc<Diagnostics>,
    memo: DashMap<String, Option<SpecialType>>,
}

impl SpecialTypeResolver {
    pub fn new(
        schema: Arc<SchemaModel>,
        config: &SpecialTypesConfig,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            schema,
            patterns: config.compile()?,
            pagination: config.pagination.clone(),
            result: config.result.clone(),
            diagnostics,
            memo: DashMap::new(),
        })
    }

    /// Connection info when `name` matches the connection pattern and its
    /// node path resolves.
    pub fn resolve_pagination(&self, name: &str) -> Option<ConnectionInfo> {
        if !self.patterns.connection.is_match(name) {
            return None;
        }
        match pagination::resolve_connection(&self.schema, &self.pagination, name) {
            Ok(info) => Some(info),
            Err(reason) => {
                self.diagnostics
                    .infer(name, format!("Not a pagination wrapper: {}", reason));
                None
            }
        }
    }

    /// Result info when `name` matches the result pattern and is a union with
    /// exactly one success member carrying the payload field.
    pub fn resolve_result(&self, name: &str) -> Option<ResultInfo> {
        if !self.patterns.result.is_match(name) {
            return None;
        }
        match result::resolve_result_union(&self.schema, &self.result, &self.patterns.success, name)
        {
            Ok(info) => Some(info),
            Err(reason) => {
                self.diagnostics
                    .infer(name, format!("Not a result wrapper: {}", reason));
                None
            }
        }
    }

    /// Either kind of wrapper, memoized. Pagination is tried first.
    pub fn resolve(&self, name: &str) -> Option<SpecialType> {
        let cached = self.memo.get(name).map(|e| e.value().clone());
        if let Some(answer) = cached {
            return answer;
        }

        let answer = self
            .resolve_pagination(name)
            .map(SpecialType::Connection)
            .or_else(|| self.resolve_result(name).map(SpecialType::Result));

        self.memo.insert(name.to_string(), answer.clone());
        answer
    }

    /// Resolve every name, keeping the wrappers.
    pub fn resolve_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> SpecialTypes {
        let resolved: SpecialTypes = names
            .into_iter()
            .filter_map(|name| self.resolve(name).map(|s| (name.to_string(), s)))
            .collect();
        tracing::debug!(count = resolved.len(), "Resolved special types");
        resolved
    }
}

/// The wrapper a field's type refers to, among the resolved ones.
pub fn special_for_reference<'a>(
    special: &'a SpecialTypes,
    reference: &TypeReference,
) -> Option<&'a SpecialType> {
    reference
        .named_type()
        .ok()
        .and_then(|name| special.get(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, SchemaDocument, TypeDescriptor, TypeKind};

    fn schema() -> Arc<SchemaModel> {
        let doc = SchemaDocument {
            query_type: "Query".to_string(),
            mutation_type: None,
            subscription_type: None,
            types: vec![
                TypeDescriptor::new(TypeKind::Object, "Query"),
                TypeDescriptor::new(TypeKind::Object, "User"),
                TypeDescriptor::new(TypeKind::Object, "UserConnection").with_fields(vec![
                    Field::new(
                        "edges",
                        TypeReference::list(TypeReference::non_null(TypeReference::named(
                            "UserEdge",
                        ))),
                    ),
                ]),
                TypeDescriptor::new(TypeKind::Object, "UserEdge")
                    .with_fields(vec![Field::new("node", TypeReference::named("User"))]),
                TypeDescriptor::new(TypeKind::Object, "PostConnection"),
                TypeDescriptor::new(TypeKind::Union, "QueryUserResult")
                    .with_possible_types(&["QueryUserSuccess", "NotFound", "Forbidden"]),
                TypeDescriptor::new(TypeKind::Object, "QueryUserSuccess")
                    .with_fields(vec![Field::new("data", TypeReference::named("User"))]),
                TypeDescriptor::new(TypeKind::Object, "NotFound"),
                TypeDescriptor::new(TypeKind::Object, "Forbidden"),
            ],
            directives: Vec::new(),
        };
        Arc::new(SchemaModel::new(doc).unwrap())
    }

    fn resolver() -> (SpecialTypeResolver, Arc<Diagnostics>) {
        let diagnostics = Arc::new(Diagnostics::new());
        let resolver =
            SpecialTypeResolver::new(schema(), &SpecialTypesConfig::default(), Arc::clone(&diagnostics))
                .unwrap();
        (resolver, diagnostics)
    }

    #[test]
    fn test_connection_resolves_node_and_edge() {
        let (resolver, _) = resolver();
        let info = resolver.resolve_pagination("UserConnection").unwrap();
        assert_eq!(info.node_type, "User");
        assert_eq!(info.edge_type.as_deref(), Some("UserEdge"));
        assert_eq!(info.signature(), "Connection<User>");
    }

    #[test]
    fn test_connection_without_edges_is_not_a_wrapper() {
        let (resolver, diagnostics) = resolver();
        assert!(resolver.resolve("PostConnection").is_none());
        assert_eq!(diagnostics.len(), 1);

        // Memoized: no second diagnostic.
        assert!(resolver.resolve("PostConnection").is_none());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_result_union() {
        let (resolver, _) = resolver();
        let special = resolver.resolve("QueryUserResult").unwrap();
        let info = special.result().unwrap();
        assert_eq!(info.success_type, "QueryUserSuccess");
        assert_eq!(info.success_data_type, "User");
        assert_eq!(info.error_types, vec!["NotFound", "Forbidden"]);
        assert_eq!(special.signature(), "Result<User, NotFound | Forbidden>");
        assert_eq!(special.wrapped_type(), "User");
    }

    #[test]
    fn test_names_outside_the_convention_are_ignored() {
        let (resolver, diagnostics) = resolver();
        assert!(resolver.resolve("User").is_none());
        assert!(diagnostics.is_empty());

        let all = resolver.resolve_all(["User", "UserConnection", "QueryUserResult"]);
        assert_eq!(all.len(), 2);
    }
}
