use super::ConnectionInfo;
use crate::config::PaginationConfig;
use crate::schema::SchemaModel;

/// Follow a dotted field path from `start`; every hop must be an existing
/// field whose named type exists.
pub(crate) fn walk_path(schema: &SchemaModel, start: &str, path: &str) -> Result<String, String> {
    let mut current = start.to_string();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let field = schema
            .field(&current, segment)
            .ok_or_else(|| format!("no field '{}' on {}", segment, current))?;
        let next = field
            .field_type
            .named_type()
            .map_err(|e| format!("{}.{}: {}", current, segment, e))?;
        if schema.type_by_name(next).is_none() {
            return Err(format!("{}.{} refers to unknown type {}", current, segment, next));
        }
        current = next.to_string();
    }
    Ok(current)
}

/// Node and edge types of a connection, or why it is not one.
pub(crate) fn resolve_connection(
    schema: &SchemaModel,
    config: &PaginationConfig,
    name: &str,
) -> Result<ConnectionInfo, String> {
    if config.node_path.trim().is_empty() {
        return Err("no node path configured".to_string());
    }

    let node_type = walk_path(schema, name, &config.node_path)?;
    let edge_type = if config.edge_path.trim().is_empty() {
        None
    } else {
        walk_path(schema, name, &config.edge_path).ok()
    };

    Ok(ConnectionInfo {
        connection_type: name.to_string(),
        node_type,
        edge_type,
    })
}
