use super::{JsonType, Property, find_property};

/// Whether every value described by `from` is also a valid value of `to`.
///
/// Pure and total: the relation never fails, it only answers. See [`is_type_castable`] for the
/// rules.
pub fn is_castable(from: &Property, to: &Property) -> bool {
    is_type_castable(from.json_type(), to.json_type())
}

/// Castability between two type descriptors.
///
/// - an empty target schema accepts everything;
/// - a union source is castable iff every member is;
/// - a union target accepts iff some member does;
/// - `integer -> number` and `boolean -> integer` widen, never the reverse;
/// - arrays and dicts are covariant in their item/value type;
/// - objects use width subtyping: every field the target requires (has no default) must exist in
///   the source with a castable type, extra source fields are allowed;
/// - primitives otherwise need the same type name, strings are never parsed.
pub fn is_type_castable(from: &JsonType, to: &JsonType) -> bool {
    match (from, to) {
        (_, JsonType::Any) => true,
        (JsonType::Union(members), _) => members.iter().all(|member| is_type_castable(member, to)),
        (_, JsonType::Union(members)) => members.iter().any(|member| is_type_castable(from, member)),
        (JsonType::Integer, JsonType::Number)
        | (JsonType::Boolean, JsonType::Integer)
        | (JsonType::Boolean, JsonType::Number) => true,
        (JsonType::Array(from_item), JsonType::Array(to_item)) => {
            is_type_castable(from_item, to_item)
        }
        (JsonType::Dict(from_value), JsonType::Dict(to_value)) => {
            is_type_castable(from_value, to_value)
        }
        (JsonType::Object(from_fields), JsonType::Object(to_fields)) => {
            to_fields.iter().all(|field| match find_property(from_fields, field.title()) {
                Some(source_field) => is_castable(source_field, field),
                None => field.has_default(),
            })
        }
        (from, to) => from.primitive_name().is_some() && from == to,
    }
}

/// Describes why `from` cannot be cast to `to`, or `None` when it can.
pub fn cast_mismatch(from: &Property, to: &Property) -> Option<(String, String)> {
    if is_castable(from, to) {
        None
    } else {
        Some((to.json_type().to_string(), from.json_type().to_string()))
    }
}
