/// Normalize free text for dictionary lookups: lowercase, `&` read as "and",
/// every other non-alphanumeric run collapsed to one space.
///
/// `"QTY."` → `"qty"`, `"O&P"` → `"o and p"`, `" Roofing  "` → `"roofing"`.
pub fn normalize_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c == '&' {
            push_word(&mut out, "and", &mut pending_space);
        } else if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

fn push_word(out: &mut String, word: &str, pending_space: &mut bool) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(word);
    *pending_space = true;
}

/// Collapse internal whitespace and trim, keeping case and punctuation.
pub fn tidy(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
