//! HTML-safe text handling for message bubbles.
//!
//! User text is escaped before it becomes part of a message fragment, so a
//! bubble can never pick up markup it did not come with. The presentation
//! layer goes the other way with [`unescape_html`] when it draws text.

/// Line break marker substituted for `\n` in escaped text.
pub const LINE_BREAK: &str = "<br>";

/// Escape `&`, `<` and `>` to entities, then turn newlines into `<br>`.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped.replace('\n', LINE_BREAK)
}

/// Decode the entities produced by [`escape_html`].
///
/// `&amp;` is decoded last so `&amp;lt;` comes back as the literal `&lt;`.
pub fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Wrap an already-safe fragment in a paragraph.
pub fn paragraph(fragment: &str) -> String {
    format!("<p>{}</p>", fragment)
}
