/// Approximate glyph advance as a fraction of the font size, calibrated for a
/// common sans-serif stack.
pub(super) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' | '\'' => 0.321,
        'i' | 'j' | 'l' | 'I' => 0.25,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '@' | '#' | '%' | '&' => 0.946,
        '1' => 0.396,
        '0'..='9' => 0.6,
        'A'..='Z' => 0.68,
        'a'..='z' | '_' | '-' => 0.57,
        ch if ch.is_ascii() => 0.568,
        // CJK and other wide scripts take roughly a full em.
        _ => 1.0,
    }
}

pub(super) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Shortens `text` to at most `max_chars` characters, ending in `...` when cut.
pub(super) fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(2);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
