//! Text helpers shared by the scanners and the completion client.

/// Keep at most `max_chars` characters of `text`.
///
/// Cuts on a character boundary, never inside a multi-byte sequence, and adds
/// no ellipsis: the result is used as a raw excerpt inside prompts.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Mask a credential for log output (`abcd...wxyz`).
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
