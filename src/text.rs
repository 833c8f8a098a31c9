//! Text normalization shared by extraction, matching, and the paste-box format

/// Separator between answer parts in the paste-box / display format
pub const PART_SEPARATOR: &str = " || ";

/// Bare separator recognised when splitting pasted text
const SPLIT_MARKER: &str = "||";

/// Trim and strip non-breaking and zero-width characters
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{FEFF}'))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// `clean_text` followed by collapsing whitespace runs into single spaces
pub fn clean_collapsed(text: &str) -> String {
    clean_text(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Join parts into the canonical serialization
pub fn join_parts<S: AsRef<str>>(parts: &[S]) -> String {
    parts.iter().map(|p| p.as_ref()).collect::<Vec<_>>().join(PART_SEPARATOR)
}

/// Split pasted text on the part separator, dropping empty pieces
pub fn split_parts(text: &str) -> Vec<String> {
    text.split(SPLIT_MARKER)
        .map(clean_text)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Whether the text contains the part separator
pub fn has_separator(text: &str) -> bool {
    text.contains(SPLIT_MARKER)
}

/// Tokens of pasted drag-drop answers: separator-split when present, else whitespace-split
pub fn answer_tokens(text: &str) -> Vec<String> {
    if has_separator(text) {
        split_parts(text)
    } else {
        text.split_whitespace().map(clean_text).filter(|t| !t.is_empty()).collect()
    }
}

/// Whether the string is a non-empty run of ASCII digits
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Keep only ASCII digits
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
