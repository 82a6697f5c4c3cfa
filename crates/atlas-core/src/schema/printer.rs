//! SDL printer for [`SchemaDocument`].

use super::types::{Field, InputValue, SchemaDocument, TypeDescriptor, TypeKind, TypeReference};
use super::BUILTIN_SCALARS;

impl SchemaDocument {
    /// Print the schema in GraphQL SDL.
    ///
    /// Introspection types and built-in scalars are skipped. Type references
    /// that cannot be rendered are printed as `?`.
    pub fn to_sdl(&self) -> String {
        let mut out = String::new();

        if !self.has_default_root_names() {
            out.push_str("schema {\n");
            out.push_str(&format!("  query: {}\n", self.query_type));
            if let Some(mutation) = &self.mutation_type {
                out.push_str(&format!("  mutation: {}\n", mutation));
            }
            if let Some(subscription) = &self.subscription_type {
                out.push_str(&format!("  subscription: {}\n", subscription));
            }
            out.push_str("}\n\n");
        }

        let printable = self
            .types
            .iter()
            .filter(|t| !t.name.starts_with("__") && !BUILTIN_SCALARS.contains(&t.name.as_str()));

        let blocks: Vec<String> = printable.map(print_type).collect();
        out.push_str(&blocks.join("\n"));
        out
    }

    fn has_default_root_names(&self) -> bool {
        self.query_type == "Query"
            && self.mutation_type.as_deref().map_or(true, |m| m == "Mutation")
            && self.subscription_type.as_deref().map_or(true, |s| s == "Subscription")
    }
}

fn print_type(t: &TypeDescriptor) -> String {
    let mut out = print_description(t.description.as_deref(), "");

    match t.kind {
        TypeKind::Scalar => out.push_str(&format!("scalar {}\n", t.name)),
        TypeKind::Object | TypeKind::Interface => {
            let keyword = if t.kind == TypeKind::Object { "type" } else { "interface" };
            out.push_str(&format!("{} {}", keyword, t.name));
            let interfaces = t.interface_names();
            if !interfaces.is_empty() {
                out.push_str(&format!(" implements {}", interfaces.join(" & ")));
            }
            out.push_str(" {\n");
            for field in t.fields.iter().flatten() {
                out.push_str(&print_field(field));
            }
            out.push_str("}\n");
        }
        TypeKind::Union => {
            out.push_str(&format!(
                "union {} = {}\n",
                t.name,
                t.possible_type_names().join(" | ")
            ));
        }
        TypeKind::Enum => {
            out.push_str(&format!("enum {} {{\n", t.name));
            for value in t.enum_values.iter().flatten() {
                out.push_str(&print_description(value.description.as_deref(), "  "));
                out.push_str(&format!("  {}", value.name));
                out.push_str(&print_deprecated(value.is_deprecated, value.deprecation_reason.as_deref()));
                out.push('\n');
            }
            out.push_str("}\n");
        }
        TypeKind::InputObject => {
            out.push_str(&format!("input {} {{\n", t.name));
            for field in t.input_fields.iter().flatten() {
                out.push_str(&print_description(field.description.as_deref(), "  "));
                out.push_str(&format!("  {}\n", print_input_value(field)));
            }
            out.push_str("}\n");
        }
    }

    out
}

fn print_field(field: &Field) -> String {
    let mut out = print_description(field.description.as_deref(), "  ");
    out.push_str("  ");
    out.push_str(&field.name);

    if !field.args.is_empty() {
        let args: Vec<String> = field.args.iter().map(print_input_value).collect();
        out.push_str(&format!("({})", args.join(", ")));
    }

    out.push_str(&format!(": {}", print_reference(&field.field_type)));
    out.push_str(&print_deprecated(field.is_deprecated, field.deprecation_reason.as_deref()));
    out.push('\n');
    out
}

fn print_input_value(value: &InputValue) -> String {
    let mut out = format!("{}: {}", value.name, print_reference(&value.value_type));
    if let Some(default) = &value.default_value {
        out.push_str(&format!(" = {}", default));
    }
    out
}

fn print_reference(reference: &TypeReference) -> String {
    reference.display().unwrap_or_else(|_| "?".to_string())
}

fn print_deprecated(is_deprecated: bool, reason: Option<&str>) -> String {
    match (is_deprecated, reason) {
        (false, _) => String::new(),
        (true, Some(reason)) => format!(" @deprecated(reason: {})", quote(reason)),
        (true, None) => " @deprecated".to_string(),
    }
}

fn print_description(description: Option<&str>, indent: &str) -> String {
    match description {
        Some(text) if !text.is_empty() => {
            let body = text.replace("\"\"\"", "\\\"\"\"");
            if body.contains('\n') {
                let lines: Vec<String> = body.lines().map(|l| format!("{}{}", indent, l)).collect();
                format!("{indent}\"\"\"\n{}\n{indent}\"\"\"\n", lines.join("\n"))
            } else {
                format!("{indent}\"\"\"{}\"\"\"\n", body)
            }
        }
        _ => String::new(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
