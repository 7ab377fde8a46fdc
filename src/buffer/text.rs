//! Text helpers shared by ingestion and the gate.

/// Strip markup tags, collapse runs of whitespace and trim.
pub fn sanitize(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut tag_start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        match (c, tag_start) {
            ('<', None) => tag_start = Some(idx),
            ('>', Some(_)) => tag_start = None,
            (_, None) => stripped.push(c),
            _ => {}
        }
    }

    // An unterminated '<' is not markup; keep what followed it
    if let Some(start) = tag_start {
        stripped.push_str(&text[start..]);
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of non-empty pieces between `.`, `!` and `?` runs.
///
/// Unterminated trailing text still counts as one sentence.
pub fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|piece| !piece.trim().is_empty())
        .count()
}

/// True when the text ends in `.`, `!` or `?`, optionally followed by one
/// closing quote or bracket.
pub fn ends_sentence(text: &str) -> bool {
    let mut chars = text.chars().rev();
    match chars.next() {
        Some('.' | '!' | '?') => true,
        Some('"' | '\'' | ')' | ']') => matches!(chars.next(), Some('.' | '!' | '?')),
        _ => false,
    }
}
