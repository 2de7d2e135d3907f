//! Author-prefix removal for scraped captions.
//!
//! Instagram in particular concatenates the username and the caption
//! ("johndoeCheck this out"), so the prefix is stripped without requiring a
//! word boundary.

/// Characters that may sit between an author prefix and the caption.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | ':' | '·')
}

/// Case-insensitive `strip_prefix`, compared char by char.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }

    let mut chars = text.char_indices();
    for p in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }

    let offset = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[offset..])
}

/// Strips one leading author occurrence (`@handle` or `handle`) from `text`.
fn strip_author_once<'a>(text: &'a str, bare_author: &str) -> Option<&'a str> {
    if bare_author.is_empty() {
        return None;
    }
    let handle = format!("@{bare_author}");
    strip_prefix_ignore_case(text, &handle).or_else(|| strip_prefix_ignore_case(text, bare_author))
}

/// Removes leading author occurrences and separators from `text`.
///
/// Repeats until neither leads the text, so the result is a fixed point:
/// normalizing it again returns it unchanged.
pub fn remove_author_prefix<'a>(text: &'a str, author: &str) -> &'a str {
    let bare = author.trim().trim_start_matches('@');
    let mut rest = text;

    loop {
        let trimmed = rest.trim_start_matches(is_separator);
        match strip_author_once(trimmed, bare) {
            Some(after) => rest = after,
            None => return trimmed,
        }
    }
}

/// True when `text` starts with the author, ignoring case and a leading `@`.
pub fn has_author_prefix(text: &str, author: &str) -> bool {
    let bare = author.trim().trim_start_matches('@');
    strip_author_once(text.trim_start(), bare).is_some()
}
