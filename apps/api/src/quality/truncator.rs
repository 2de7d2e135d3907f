/// Appended whenever text is cut at a word boundary or hard-truncated.
pub const ELLIPSIS: &str = "...";

/// Max title length produced by the fallback path.
pub const FALLBACK_TITLE_CHARS: usize = 80;

/// Returns the first sentence including its terminator, if it has any body.
fn first_sentence(text: &str) -> Option<&str> {
    let end = text.find(['.', '!', '?'])?;
    if end == 0 {
        return None;
    }
    Some(&text[..=end])
}

/// Byte offset of the `n`th char, or the end of the string.
fn char_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(i, _)| i).unwrap_or(text.len())
}

/// Cuts `text` down to a title of at most `max_chars` chars (plus [`ELLIPSIS`]).
///
/// 1. Text that already fits is returned unchanged.
/// 2. A first sentence that fits is returned with its terminator.
/// 3. Otherwise the text is cut at the last whitespace inside the first
///    `max_chars` chars and [`ELLIPSIS`] is appended.
/// 4. With no whitespace to cut at, the text is hard-truncated at `max_chars`
///    and [`ELLIPSIS`] is still appended.
pub fn smart_truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    if let Some(sentence) = first_sentence(text) {
        if sentence.chars().count() <= max_chars {
            return sentence.to_string();
        }
    }

    let head = &text[..char_offset(text, max_chars)];
    let word_cut = head
        .rfind(char::is_whitespace)
        .map(|i| head[..i].trim_end())
        .filter(|cut| !cut.is_empty());

    format!("{}{ELLIPSIS}", word_cut.unwrap_or(head))
}

/// Keeps the first `max_chars` chars of `text`. Reports whether anything was cut.
pub fn take_chars(text: &str, max_chars: usize) -> (&str, bool) {
    let offset = char_offset(text, max_chars);
    (&text[..offset], offset < text.len())
}
