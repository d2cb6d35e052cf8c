//! Escape functions for interpolated values.

/// Entity for a character that must not appear raw in HTML text or
/// attribute values.
fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters: & < > " '
pub fn escape(input: &str) -> String {
    let Some(first) = input.find(|c: char| entity(c).is_some()) else {
        return input.to_string();
    };

    let mut output = String::with_capacity(input.len() + 8);
    output.push_str(&input[..first]);
    for c in input[first..].chars() {
        match entity(c) {
            Some(escaped) => output.push_str(escaped),
            None => output.push(c),
        }
    }
    output
}

/// Pass text through unchanged, for templates that do not produce HTML.
pub fn verbatim(input: &str) -> String {
    input.to_string()
}
