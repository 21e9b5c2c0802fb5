// ABOUTME: Shared utility functions for Casebook
// ABOUTME: Prefixed ID generation and free-text normalisation

/// Generate an entity ID of the form `<prefix>-<nanoid>`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

/// Trim optional free text, mapping blank input to `None`
pub fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Truncate a string to at most `max_chars` characters, appending an ellipsis when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
