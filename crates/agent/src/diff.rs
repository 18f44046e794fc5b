//! Diff text for the prompt-chained review modes.

use prbot_core::change::ChangeDescriptor;

/// Whole-PR diff ceiling for the single-shot review.
pub const DIFF_LIMIT: usize = 12_000;
/// Whole-PR diff ceiling for the planning prompt.
pub const PLANNING_DIFF_LIMIT: usize = 8_000;
/// Ceiling for one file's diff in the per-file prompt.
pub const FILE_DIFF_LIMIT: usize = 4_000;

pub const DIFF_TRUNCATED: &str = "\n[... DIFF TRUNCATED ...]\n";
pub const FILE_DIFF_TRUNCATED: &str = "\n[... FILE DIFF TRUNCATED ...]\n";

fn file_chunk(change: &ChangeDescriptor, patch: &str) -> String {
    format!("\n===== FILE: {} ({}) =====\n{patch}\n", change.path, change.kind)
}

/// Concatenate per-file diffs until the next one would exceed `limit` chars.
///
/// Files without a patch are skipped. When a file does not fit, the marker
/// is appended and nothing further is added.
pub fn build_diff(changes: &[ChangeDescriptor], limit: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for change in changes {
        let Some(patch) = change.patch_text() else {
            continue;
        };
        let chunk = file_chunk(change, patch);
        let len = chunk.chars().count();
        if used + len > limit {
            out.push_str(DIFF_TRUNCATED);
            break;
        }
        out.push_str(&chunk);
        used += len;
    }
    out
}

/// One file's diff, cut at `limit` chars. Empty when the file has no patch.
pub fn build_single_file_diff(change: &ChangeDescriptor, limit: usize) -> String {
    let Some(patch) = change.patch_text() else {
        return String::new();
    };
    let chunk = file_chunk(change, patch);
    match chunk.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}{FILE_DIFF_TRUNCATED}", &chunk[..idx]),
        None => chunk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prbot_core::change::ChangeKind;

    fn change(path: &str, patch: Option<&str>) -> ChangeDescriptor {
        let c = ChangeDescriptor::new(path, ChangeKind::Modified);
        match patch {
            Some(p) => c.with_patch(p),
            None => c,
        }
    }

    #[test]
    fn headers_and_skipped_binaries() {
        let diff = build_diff(
            &[change("a.rs", Some("+x")), change("logo.png", None), change("b.rs", Some(""))],
            DIFF_LIMIT,
        );
        assert_eq!(diff, "\n===== FILE: a.rs (modified) =====\n+x\n");
    }

    #[test]
    fn stops_at_limit_with_single_marker() {
        let patch = "+".repeat(60);
        let changes: Vec<_> = (0..10).map(|i| change(&format!("f{i}.rs"), Some(&patch))).collect();
        let diff = build_diff(&changes, 200);

        assert!(diff.chars().count() <= 200 + DIFF_TRUNCATED.len());
        assert_eq!(diff.matches("[... DIFF TRUNCATED ...]").count(), 1);
        assert!(diff.ends_with(DIFF_TRUNCATED));
        assert!(diff.contains("f0.rs"));
        assert!(!diff.contains("f9.rs"));
    }

    #[test]
    fn single_file_diff_truncates() {
        let c = change("big.rs", Some(&"-".repeat(5_000)));
        let diff = build_single_file_diff(&c, FILE_DIFF_LIMIT);
        assert!(diff.ends_with(FILE_DIFF_TRUNCATED));
        assert_eq!(diff.chars().count(), FILE_DIFF_LIMIT + FILE_DIFF_TRUNCATED.len());

        assert_eq!(build_single_file_diff(&change("none.rs", None), FILE_DIFF_LIMIT), "");
    }
}
