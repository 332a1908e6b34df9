//! Small pure text helpers.

use unicode_segmentation::UnicodeSegmentation;

const ELLIPSIS: &str = "...";

/// Shorten `raw` to at most `max` grapheme clusters, ending in `...` when cut.
///
/// Surrounding whitespace is trimmed before measuring. `max` is raised to the
/// ellipsis length. A cut never splits a combining sequence or emoji.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(ELLIPSIS.len());
    let trimmed = raw.trim();
    let mut graphemes = trimmed.grapheme_indices(true);
    match graphemes.nth(max) {
        None => trimmed.to_string(),
        Some(_) => {
            let keep = max - ELLIPSIS.len();
            let end = trimmed
                .grapheme_indices(true)
                .nth(keep)
                .map_or(trimmed.len(), |(idx, _)| idx);
            format!("{}{ELLIPSIS}", trimmed[..end].trim_end())
        }
    }
}
