//! Escaping for Telegram's MarkdownV2 dialect.

/// Characters that MarkdownV2 treats as markup and that must be prefixed with
/// a backslash to appear literally. The backslash itself is included: a raw
/// one would otherwise escape whatever follows it, and before a backtick it
/// ends the code block the alert is sent in.
pub const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Returns `true` if `c` must be escaped.
pub fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

/// Escapes every reserved character in `text` with a leading backslash.
///
/// The input is scanned once, so a backslash inserted for one character can
/// never be picked up again by a later replacement.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if is_reserved(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
