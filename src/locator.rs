//! File lookup over the flat listing of the active repository
//!
//! Resolution order:
//! 1. exact, case-insensitive match of the whole path
//! 2. case-insensitive match of a trailing path suffix on a `/` boundary
//!
//! When several entries end with the requested suffix, the shortest path
//! wins and equal lengths keep listing order. Lookups never suspend.

use crate::repo::FileEntry;

/// Resolve `fragment` to an entry of `files`, or `None` when nothing matches.
pub fn find<'a>(files: &'a [FileEntry], fragment: &str) -> Option<&'a FileEntry> {
    let wanted = fragment.trim().trim_start_matches("./").to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    if let Some(exact) = files.iter().find(|f| f.path.to_lowercase() == wanted) {
        return Some(exact);
    }

    let suffix = format!("/{}", wanted);
    files
        .iter()
        .filter(|f| f.path.to_lowercase().ends_with(&suffix))
        // min_by_key keeps the first of equal keys
        .min_by_key(|f| f.path.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(paths: &[&str]) -> Vec<FileEntry> {
        paths
            .iter()
            .map(|p| FileEntry::new(*p, format!("blob:{}", p)))
            .collect()
    }

    #[test]
    fn test_exact_match_beats_suffix_match() {
        let files = listing(&["src/package.json", "package.json"]);
        let hit = find(&files, "package.json").unwrap();
        assert_eq!(hit.path, "package.json");
    }

    #[test]
    fn test_suffix_match_is_case_insensitive() {
        let files = listing(&["README.md", "src/package.json"]);
        let hit = find(&files, "PACKAGE.JSON").unwrap();
        assert_eq!(hit.path, "src/package.json");
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let files = listing(&["docs/Guide.md"]);
        assert_eq!(find(&files, "DOCS/guide.MD").unwrap().path, "docs/Guide.md");
    }

    #[test]
    fn test_suffix_requires_whole_segment() {
        let files = listing(&["src/mypackage.json"]);
        assert!(find(&files, "package.json").is_none());
    }

    #[test]
    fn test_suffix_tie_prefers_shortest_path() {
        let files = listing(&["packages/web/src/index.js", "lib/index.js", "src/index.js"]);
        assert_eq!(find(&files, "index.js").unwrap().path, "lib/index.js");
    }

    #[test]
    fn test_not_found() {
        let files = listing(&["src/app.js"]);
        assert!(find(&files, "main.rs").is_none());
        assert!(find(&files, "   ").is_none());
    }

    #[test]
    fn test_leading_dot_slash_is_ignored() {
        let files = listing(&["src/app.js"]);
        assert_eq!(find(&files, "./src/app.js").unwrap().path, "src/app.js");
    }
}
