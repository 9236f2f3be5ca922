use std::sync::OnceLock;

use regex::Regex;

/// Characters outside Hangul syllables, Latin letters, ASCII digits, and
/// whitespace are stripped before vectorization.
fn filter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^가-힣a-zA-Z0-9\s]").expect("static pattern"))
}

/// Normalize one raw document: drop non-script characters, collapse
/// whitespace runs to single spaces, trim the ends.
///
/// Pure and total — an empty or entirely-filtered input yields an empty
/// string, which downstream stages treat as a zero-information document.
pub fn normalize(text: &str) -> String {
    let cleaned = filter_re().replace_all(text, " ");
    let mut out = String::with_capacity(cleaned.len());
    for word in cleaned.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
