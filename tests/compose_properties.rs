//! Property-based tests for request URL composition.

use cloud_api::clients::{clean_path, compose};
use proptest::prelude::*;

/// Path segments that carry no special meaning.
fn arb_segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9_-]{1,10}", 0..6)
}

/// A run of one or more separators.
fn arb_separator() -> impl Strategy<Value = String> {
    (1..4usize).prop_map(|n| "/".repeat(n))
}

proptest! {
    #[test]
    fn compose_has_exactly_one_separator_at_the_join(
        host in "[a-z]{1,12}\\.example\\.com",
        trailing in 0..4usize,
        leading in 0..4usize,
        segments in arb_segments(),
    ) {
        let base = format!("https://{host}{}", "/".repeat(trailing));
        let relative = format!("{}{}", "/".repeat(leading), segments.join("/"));

        let url = compose(&base, &relative);
        let expected = format!("https://{host}/{}", segments.join("/"));

        prop_assert_eq!(url, expected);
    }

    #[test]
    fn compose_never_emits_empty_segments(
        segments in arb_segments(),
        separators in prop::collection::vec(arb_separator(), 6),
    ) {
        let mut relative = String::new();
        for (segment, separator) in segments.iter().zip(separators.iter()) {
            relative.push_str(separator);
            relative.push_str(segment);
        }

        let url = compose("https://api.example.com/", &relative);
        let path = url.trim_start_matches("https://api.example.com");

        prop_assert!(path.starts_with('/'));
        prop_assert!(!path.contains("//"));
        prop_assert_eq!(path, clean_path(&segments.join("/")));
    }

    #[test]
    fn clean_path_is_idempotent(path in "[a-z./]{0,24}") {
        let once = clean_path(&path);
        prop_assert_eq!(clean_path(&once), once.clone());
        prop_assert!(once.starts_with('/'));
    }

    #[test]
    fn compose_carries_query_verbatim(
        segments in arb_segments(),
        query in "[a-z0-9=&/:]{0,20}",
    ) {
        let relative = format!("/{}?{query}", segments.join("/"));
        let url = compose("https://api.example.com", &relative);

        let expected_suffix = format!("?{query}");
        prop_assert!(url.ends_with(&expected_suffix));
    }
}
