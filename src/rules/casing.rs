//! Capitalization pattern transfer between a matched word and its
//! replacement.

/// Reapply the capitalization pattern of `matched` to `replacement`.
///
/// In priority order:
/// 1. `matched` entirely upper-case: replacement upper-cased
/// 2. `matched` capitalized (first letter upper, remainder lower):
///    replacement capitalized with the remainder lower-cased
/// 3. anything else: replacement returned unchanged
///
/// Uses simple (non-locale) case mapping.
pub fn apply_case_style(matched: &str, replacement: &str) -> String {
    // Check if the match is all uppercase
    if matched == matched.to_uppercase() {
        return replacement.to_uppercase();
    }

    // Check if the match is capitalized (first letter uppercase only)
    let mut chars = matched.chars();
    if let Some(first) = chars.next() {
        let rest = chars.as_str();
        if first.is_uppercase() && rest == rest.to_lowercase() {
            return capitalize(replacement);
        }
    }

    // Default to the replacement as-is (assume lowercase intent)
    replacement.to_string()
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_uppercase_match() {
        assert_eq!(apply_case_style("JOHN", "sam"), "SAM");
        assert_eq!(apply_case_style("JOHN'S", "sam"), "SAM");
    }

    #[test]
    fn test_capitalized_match() {
        assert_eq!(apply_case_style("John", "sam"), "Sam");
        assert_eq!(apply_case_style("John", "SAM"), "Sam");
    }

    #[test]
    fn test_lowercase_match_keeps_replacement_verbatim() {
        assert_eq!(apply_case_style("john", "Sam"), "Sam");
        assert_eq!(apply_case_style("john", "sAm"), "sAm");
    }

    #[test]
    fn test_mixed_case_match_keeps_replacement_verbatim() {
        assert_eq!(apply_case_style("jOhN", "Sam"), "Sam");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(apply_case_style("", "sam"), "SAM");
        assert_eq!(apply_case_style("John", ""), "");
    }

    proptest! {
        #[test]
        fn prop_all_caps_match_uppercases(matched in "[A-Z]{1,12}", repl in "[A-Za-z]{1,12}") {
            prop_assert_eq!(apply_case_style(&matched, &repl), repl.to_uppercase());
        }

        #[test]
        fn prop_lowercase_match_is_identity(matched in "[a-z]{2,12}", repl in "[A-Za-z]{1,12}") {
            prop_assert_eq!(apply_case_style(&matched, &repl), repl);
        }

        #[test]
        fn prop_capitalized_match_capitalizes(rest in "[a-z]{1,11}", repl in "[A-Za-z]{1,12}") {
            let matched = format!("X{rest}");
            let out = apply_case_style(&matched, &repl);
            prop_assert!(out.chars().next().unwrap().is_uppercase());
            prop_assert_eq!(out.to_lowercase(), repl.to_lowercase());
        }
    }
}
