//! Presentation order of types: a type comes before the types that use it.

use std::cmp::Ordering;

use crate::schema::SchemaModel;

/// Whether `holder` refers to `target` through a field, argument, input
/// field, declared interface or union member.
fn references(schema: &SchemaModel, holder: &str, target: &str) -> bool {
    let Some(descriptor) = schema.type_by_name(holder) else {
        return false;
    };

    let named = |reference: &crate::schema::TypeReference| {
        reference.named_type().is_ok_and(|name| name == target)
    };

    descriptor.fields.iter().flatten().any(|f| {
        named(&f.field_type) || f.args.iter().any(|a| named(&a.value_type))
    }) || descriptor
        .input_fields
        .iter()
        .flatten()
        .any(|f| named(&f.value_type))
        || descriptor.interface_names().contains(&target)
        || descriptor.possible_type_names().contains(&target)
}

/// Compare two types: `Less` when `b` references `a`, `Greater` when `a`
/// references `b`, `Equal` for mutual or no reference.
pub fn order(schema: &SchemaModel, a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (references(schema, b, a), references(schema, a, b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Stable sort of type names by [`order`].
///
/// The comparator is not a total order (cycles are allowed), so this is an
/// insertion sort: each name moves in front of the earliest preceding name
/// that uses it, but never past one it uses itself.
pub fn sort_types(schema: &SchemaModel, names: &mut [String]) {
    for i in 1..names.len() {
        let mut target = i;
        for p in (0..i).rev() {
            match order(schema, &names[p], &names[i]) {
                Ordering::Less => break,
                Ordering::Greater => target = p,
                Ordering::Equal => {}
            }
        }
        if target < i {
            names[target..=i].rotate_right(1);
        }
    }
}
