//! Filesystem-safe identifiers for artist and song titles.
//!
//! Identifiers are used verbatim as directory and file stems by the
//! [`LyricsStore`](crate::store::LyricsStore). Two titles that sanitize to
//! the same identifier share one storage slot; the later write wins.

/// Returns `true` for characters allowed in a sanitized identifier.
fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_')
}

/// Reduce `text` to alphanumerics, spaces, hyphens and underscores, with
/// trailing whitespace removed.
///
/// Leading whitespace is kept. The result may be empty when `text` holds
/// nothing but punctuation.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out: String = text.chars().filter(|c| is_allowed(*c)).collect();
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out
}

/// Check whether `text` already satisfies the identifier invariant.
#[must_use]
pub fn is_sanitized(text: &str) -> bool {
    text.chars().all(is_allowed) && text.trim_end().len() == text.len()
}
