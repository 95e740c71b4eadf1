//! Bounded text helpers for report surfaces.

/// First `max_chars` characters of `input`, never splitting a UTF-8 sequence.
pub fn char_prefix(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Indent every line after the first so multi-line messages stay aligned
/// under a list bullet.
pub fn indent_continuation(input: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    input
        .trim_end()
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
