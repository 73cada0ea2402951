//! Synthetic class names and CSS selector escaping.

/// Returns the synthetic class name for a class group.
///
/// Whitespace runs become `_` and colons become `-`, so equal groups always
/// share a name: `"p-2 rtl:ml-2"` becomes `deep_p-2_rtl-ml-2`.
pub fn deep_name(group: &str) -> String {
    let mut name = String::with_capacity(group.len() + 5);
    name.push_str("deep_");
    let mut in_whitespace = false;
    for ch in group.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        name.push(if ch == ':' { '-' } else { ch });
    }
    name
}

/// Backslash-escapes every character outside `[A-Za-z0-9_-]` so the class
/// can be used in a selector.
pub fn escape_class(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len());
    for ch in class.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
