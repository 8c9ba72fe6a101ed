/// Derives an attribute name from a bean-style accessor name.
///
/// The `get` prefix, or the `is` prefix of a boolean accessor, is stripped
/// and the first remaining letter is lower-cased, unless the first two
/// letters are both upper-case (`getURL` stays `URL`).
pub fn attribute_name_from_accessor(accessor: &str) -> String {
    let property = match accessor.strip_prefix("get") {
        Some(rest) if !rest.is_empty() => rest,
        _ => match accessor.strip_prefix("is") {
            Some(rest) if rest.starts_with(char::is_uppercase) => rest,
            _ => accessor,
        },
    };
    decapitalize(property)
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first
            .to_lowercase()
            .chain(name[first.len_utf8()..].chars())
            .collect(),
        (None, _) => String::new(),
    }
}
