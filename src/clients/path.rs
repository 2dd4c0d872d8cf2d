//! Request URL composition.
//!
//! [`compose`] joins a resolved base URL and a caller-supplied relative path
//! into an absolute URL with exactly one separator between the two. The path
//! is canonicalized: redundant separators and `.` segments are collapsed and
//! `..` segments are resolved without climbing above the root. A query string
//! or fragment (as found in pagination cursors) is carried over verbatim.
//!
//! # Example
//!
//! ```rust
//! use cloud_api::clients::compose;
//!
//! assert_eq!(compose("https://api.example.com/", "v2//apps/./"), "https://api.example.com/v2/apps");
//! assert_eq!(compose("https://api.example.com", ""), "https://api.example.com/");
//! assert_eq!(
//!     compose("https://api.example.com", "/v2/apps?page=2&results-per-page=50"),
//!     "https://api.example.com/v2/apps?page=2&results-per-page=50",
//! );
//! ```

/// Joins `base` and `relative` into an absolute URL.
///
/// `relative` may be empty, `/`, or any path; an empty path becomes `/`.
#[must_use]
pub fn compose(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    let (path, suffix) = split_suffix(relative);
    format!("{base}{}{suffix}", clean_path(path))
}

/// Canonicalizes a path, always returning a rooted path.
///
/// ```rust
/// use cloud_api::clients::clean_path;
///
/// assert_eq!(clean_path(""), "/");
/// assert_eq!(clean_path("a//b/./c/"), "/a/b/c");
/// assert_eq!(clean_path("/a/b/../../../c"), "/c");
/// ```
#[must_use]
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Splits off the query string or fragment, whichever comes first.
fn split_suffix(relative: &str) -> (&str, &str) {
    relative
        .find(['?', '#'])
        .map_or((relative, ""), |index| relative.split_at(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.example.com";

    #[test]
    fn test_compose_empty_path_becomes_root() {
        assert_eq!(compose(BASE, ""), "https://api.example.com/");
    }

    #[test]
    fn test_compose_root_path() {
        assert_eq!(compose(BASE, "/"), "https://api.example.com/");
        assert_eq!(compose("https://api.example.com/", "/"), "https://api.example.com/");
    }

    #[test]
    fn test_compose_adds_leading_separator() {
        assert_eq!(compose(BASE, "v2/apps"), "https://api.example.com/v2/apps");
    }

    #[test]
    fn test_compose_collapses_separators_on_both_sides() {
        assert_eq!(
            compose("https://api.example.com///", "///v2///apps"),
            "https://api.example.com/v2/apps"
        );
    }

    #[test]
    fn test_compose_removes_dot_segments() {
        assert_eq!(
            compose(BASE, "/v2/./apps/../spaces/."),
            "https://api.example.com/v2/spaces"
        );
    }

    #[test]
    fn test_compose_keeps_base_path_prefix() {
        assert_eq!(
            compose("https://api.example.com/v2/", "/apps"),
            "https://api.example.com/v2/apps"
        );
    }

    #[test]
    fn test_compose_preserves_query_verbatim() {
        assert_eq!(
            compose(BASE, "/v2/apps?q=name:a/b&page=2"),
            "https://api.example.com/v2/apps?q=name:a/b&page=2"
        );
    }

    #[test]
    fn test_compose_preserves_fragment() {
        assert_eq!(compose(BASE, "docs//#a/b"), "https://api.example.com/docs#a/b");
    }

    #[test]
    fn test_compose_is_deterministic() {
        assert_eq!(compose(BASE, "/x/y"), compose(BASE, "/x/y"));
    }

    #[test]
    fn test_clean_path_does_not_climb_above_root() {
        assert_eq!(clean_path(".."), "/");
        assert_eq!(clean_path("/../../a"), "/a");
    }

    #[test]
    fn test_clean_path_strips_trailing_separator() {
        assert_eq!(clean_path("/v2/apps/"), "/v2/apps");
    }
}
