//! Introspection query and result parsing.

use serde::Deserialize;
use serde_json::Value;

use super::error::SchemaError;
use super::types::{DirectiveDefinition, SchemaDocument, TypeDescriptor};

/// Version of [`INTROSPECTION_QUERY`]. Bump when the query shape changes.
pub const INTROSPECTION_QUERY_VERSION: u32 = 1;

/// Introspection query whose result [`SchemaDocument::from_introspection_json`]
/// understands. `appliedDirectives` is an extension some servers support; it
/// feeds the schema directive matcher and may be removed for servers that
/// reject it.
pub const INTROSPECTION_QUERY: &str = r#"query AtlasIntrospection {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  appliedDirectives { ...AppliedDirective }
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
    appliedDirectives { ...AppliedDirective }
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment AppliedDirective on __AppliedDirective {
  name
  args { name value }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType { kind name }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    query_type: Option<RootName>,
    mutation_type: Option<RootName>,
    subscription_type: Option<RootName>,
    #[serde(default)]
    types: Vec<TypeDescriptor>,
    #[serde(default)]
    directives: Vec<DirectiveDefinition>,
}

#[derive(Debug, Deserialize)]
struct RootName {
    name: String,
}

impl SchemaDocument {
    /// Parse an introspection result.
    ///
    /// Accepts a full response (`{"data": {"__schema": …}}`), the data object
    /// (`{"__schema": …}`) or the bare schema object.
    pub fn from_introspection_json(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_introspection_value(value)
    }

    /// Same as [`from_introspection_json`](Self::from_introspection_json) for
    /// an already parsed value.
    pub fn from_introspection_value(value: Value) -> Result<Self, SchemaError> {
        let schema = unwrap_envelope(value).ok_or(SchemaError::MissingSchema)?;
        let raw: RawSchema = serde_json::from_value(schema)?;

        let query_type = raw.query_type.ok_or(SchemaError::MissingQueryType)?.name;

        Ok(SchemaDocument {
            query_type,
            mutation_type: raw.mutation_type.map(|r| r.name),
            subscription_type: raw.subscription_type.map(|r| r.name),
            types: raw.types,
            directives: raw.directives,
        })
    }
}

fn unwrap_envelope(mut value: Value) -> Option<Value> {
    if let Some(data) = value.get_mut("data") {
        value = data.take();
    }
    if let Some(schema) = value.get_mut("__schema") {
        return Some(schema.take());
    }
    if value.get("types").is_some() || value.get("queryType").is_some() {
        return Some(value);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeKind;

    const SAMPLE: &str = r#"{
      "data": {
        "__schema": {
          "queryType": { "name": "Query" },
          "mutationType": null,
          "subscriptionType": null,
          "types": [
            {
              "kind": "OBJECT",
              "name": "Query",
              "description": null,
              "fields": [
                {
                  "name": "user",
                  "description": "Find a user.",
                  "args": [
                    { "name": "id", "description": null, "defaultValue": null,
                      "type": { "kind": "NON_NULL", "name": null, "ofType": { "kind": "SCALAR", "name": "ID", "ofType": null } } }
                  ],
                  "type": { "kind": "OBJECT", "name": "User", "ofType": null },
                  "isDeprecated": false,
                  "deprecationReason": null
                }
              ],
              "inputFields": null,
              "interfaces": [],
              "enumValues": null,
              "possibleTypes": null
            },
            { "kind": "OBJECT", "name": "User", "fields": [], "interfaces": [],
              "appliedDirectives": [ { "name": "module", "args": [ { "name": "name", "value": "\"users\"" } ] } ] },
            { "kind": "SCALAR", "name": "ID" }
          ],
          "directives": []
        }
      }
    }"#;

    #[test]
    fn test_parse_full_response() {
        let doc = SchemaDocument::from_introspection_json(SAMPLE).unwrap();
        assert_eq!(doc.query_type, "Query");
        assert!(doc.mutation_type.is_none());
        assert_eq!(doc.types.len(), 3);
        assert_eq!(doc.types[2].kind, TypeKind::Scalar);
        assert_eq!(doc.types[1].applied_directives[0].arg("name"), Some("\"users\""));
    }

    #[test]
    fn test_parse_bare_schema() {
        let json = r#"{ "queryType": { "name": "Q" }, "types": [] }"#;
        let doc = SchemaDocument::from_introspection_json(json).unwrap();
        assert_eq!(doc.query_type, "Q");
    }

    #[test]
    fn test_missing_query_type() {
        let json = r#"{ "__schema": { "queryType": null, "types": [] } }"#;
        assert!(matches!(
            SchemaDocument::from_introspection_json(json),
            Err(SchemaError::MissingQueryType)
        ));
    }

    #[test]
    fn test_not_a_schema() {
        assert!(matches!(
            SchemaDocument::from_introspection_json(r#"{ "hello": 1 }"#),
            Err(SchemaError::MissingSchema)
        ));
    }
}
