use regex::Regex;

use super::ResultInfo;
use crate::config::ResultConfig;
use crate::schema::{SchemaModel, TypeKind};

/// Success and error members of a result union, or why it is not one.
pub(crate) fn resolve_result_union(
    schema: &SchemaModel,
    config: &ResultConfig,
    success_pattern: &Regex,
    name: &str,
) -> Result<ResultInfo, String> {
    let descriptor = schema
        .type_by_name(name)
        .ok_or_else(|| format!("unknown type {}", name))?;
    if descriptor.kind != TypeKind::Union {
        return Err(format!("{} is not a union", name));
    }

    let members = descriptor.possible_type_names();
    let successes: Vec<&str> = members
        .iter()
        .copied()
        .filter(|m| success_pattern.is_match(m))
        .collect();

    let success_type = match successes.as_slice() {
        [one] => *one,
        [] => return Err("no member matches the success pattern".to_string()),
        many => {
            return Err(format!(
                "{} members match the success pattern: {}",
                many.len(),
                many.join(", ")
            ))
        }
    };

    let payload = schema
        .field(success_type, &config.payload_field)
        .ok_or_else(|| format!("{} has no '{}' field", success_type, config.payload_field))?;
    let success_data_type = payload
        .field_type
        .named_type()
        .map_err(|e| e.to_string())?
        .to_string();

    let error_types = members
        .iter()
        .filter(|m| **m != success_type)
        .map(|m| m.to_string())
        .collect();

    Ok(ResultInfo {
        result_type: name.to_string(),
        success_type: success_type.to_string(),
        success_data_type,
        error_types,
    })
}
