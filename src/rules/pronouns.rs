//! Pronoun descriptor resolution.
//!
//! A descriptor is either a canonical tag ("he/him", "they/them", ...) or a
//! raw comma-separated custom list. Canonical tags expand to a fixed
//! five-form list in slot order: subject, object, possessive, contraction,
//! reflexive. Custom lists only carry the first three slots; contraction and
//! reflexive forms cannot be derived from free-form input.

/// Maximum number of forms taken from a custom comma-separated descriptor.
pub const CUSTOM_FORM_LIMIT: usize = 3;

/// Canonical pronoun sets, scanned in order. The marker is matched as a
/// substring so descriptors like "she/her/hers" still resolve.
const CANONICAL_SETS: [(&str, [&str; 5]); 4] = [
    ("he/him", ["he", "him", "his", "he's", "himself"]),
    ("she/her", ["she", "her", "hers", "she's", "herself"]),
    ("they/them", ["they", "them", "their", "they're", "themselves"]),
    ("ze/zir", ["ze", "zir", "zirs", "ze's", "zirself"]),
];

/// Resolve a descriptor into an ordered list of word-forms.
///
/// Returns an empty list for an empty or unparseable descriptor; the caller
/// simply compiles no pronoun rules in that case.
pub fn resolve(descriptor: &str) -> Vec<String> {
    for (marker, forms) in CANONICAL_SETS {
        if descriptor.contains(marker) {
            return forms.iter().map(|f| f.to_string()).collect();
        }
    }

    // Custom comma-separated forms: subject, object, possessive
    descriptor
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .take(CUSTOM_FORM_LIMIT)
        .map(str::to_string)
        .collect()
}
