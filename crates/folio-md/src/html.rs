//! Small HTML helpers shared by the rendering stages.

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Opening tag, with a `class` attribute only when `class` is non-empty.
pub fn open_tag(tag: &str, class: &str) -> String {
    if class.is_empty() {
        format!("<{}>", tag)
    } else {
        format!(r#"<{} class="{}">"#, tag, class)
    }
}

/// `content` wrapped in `tag`.
pub fn wrap(tag: &str, class: &str, content: &str) -> String {
    format!("{}{}</{}>", open_tag(tag, class), content, tag)
}
