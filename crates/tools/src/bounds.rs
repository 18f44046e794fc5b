//! Output ceilings shared by the tools.

/// Character ceiling for `read_file` content.
pub const READ_FILE_LIMIT: usize = 50_000;

/// Character ceiling for combined `search_code` output.
pub const SEARCH_OUTPUT_LIMIT: usize = 10_000;

/// Files listed by `get_pr_context` before the overflow line.
pub const PR_CONTEXT_FILE_CAP: usize = 20;

/// The first `limit` characters of `text`, or `None` if it already fits.
///
/// Counts `char`s, not bytes, so the cut never splits a code point.
pub fn clip(text: &str, limit: usize) -> Option<&str> {
    text.char_indices().nth(limit).map(|(idx, _)| &text[..idx])
}
