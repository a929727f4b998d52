//! Integration tests for the substitution engine over parsed documents
//!
//! These tests drive the full parse -> sweep -> serialize pipeline and
//! verify the substitution contract: whole-word anchoring, case
//! preservation, rule precedence, positional pronoun pairing, skip-list
//! enforcement and idempotence.

use truename::models::ReplacerConfig;
use truename::parse::{parse_document, write_document};
use truename::{Document, TextEngine};

fn sweep_markup(engine: &TextEngine, markup: &str) -> (String, u64, u64) {
    let mut doc = parse_document(markup.as_bytes()).unwrap();
    let root = doc.root();
    let outcome = engine.sweep(&mut doc, root);
    (write_document(&doc), outcome.names, outcome.pronouns)
}

#[test]
fn test_end_to_end_scenario() {
    let config = ReplacerConfig::new("Alex, Alexander", "Sam", "he/him", "they/them");
    let engine = TextEngine::new(&config);

    let mut doc =
        parse_document(b"<body>Alex said HE forgot his keys. Alexander will return.</body>")
            .unwrap();
    let root = doc.root();
    let outcome = engine.sweep(&mut doc, root);

    assert_eq!(
        doc.text_content(root),
        "Sam said THEY forgot their keys. Sam will return."
    );
    assert_eq!(outcome.names, 2);
    assert_eq!(outcome.pronouns, 2);
}

#[test]
fn test_whole_word_does_not_match_inside_longer_word() {
    let config = ReplacerConfig::new("Al", "Sam", "", "");
    let engine = TextEngine::new(&config);

    let (markup, names, _) = sweep_markup(&engine, "<body><p>Al met Albert</p></body>");

    assert!(markup.contains("Sam met Albert"));
    assert_eq!(names, 1);
}

#[test]
fn test_substring_matching_when_whole_word_disabled() {
    let mut config = ReplacerConfig::new("Al", "Sam", "", "");
    config.whole_word = false;
    let engine = TextEngine::new(&config);

    let (markup, names, _) = sweep_markup(&engine, "<body><p>Al met Albert</p></body>");

    assert!(markup.contains("Sam met Sambert"));
    assert_eq!(names, 2);
}

#[test]
fn test_case_preservation_three_ways() {
    let config = ReplacerConfig::new("john", "sam", "", "");
    let engine = TextEngine::new(&config);

    let (markup, names, _) =
        sweep_markup(&engine, "<body><p>JOHN and John and john</p></body>");

    assert!(markup.contains("SAM and Sam and sam"));
    assert_eq!(names, 3);
}

#[test]
fn test_counts_scale_with_occurrences() {
    let config = ReplacerConfig::new("Alex", "Sam", "", "");
    let engine = TextEngine::new(&config);

    let (_, names, _) = sweep_markup(
        &engine,
        "<body><p>Alex, Alex and Alex</p><p>Alex again</p></body>",
    );

    assert_eq!(names, 4);
}

#[test]
fn test_second_pass_is_a_no_op() {
    let config = ReplacerConfig::new("Alex", "Sam", "he/him", "they/them");
    let engine = TextEngine::new(&config);

    let mut doc = parse_document(b"<body><p>Alex knew he was early.</p></body>").unwrap();
    let root = doc.root();
    let first = engine.sweep(&mut doc, root);
    assert_eq!(first.names + first.pronouns, 2);

    let second = engine.sweep(&mut doc, root);
    assert_eq!(second.names, 0);
    assert_eq!(second.pronouns, 0);
    assert!(second.rewritten.is_empty());
}

#[test]
fn test_positional_pairing_truncated_new_set() {
    // Five old forms, two custom new forms: only the first two positions map
    let config = ReplacerConfig::new("Nobody", "Sam", "he/him", "xe, xem");
    let engine = TextEngine::new(&config);

    let (markup, _, pronouns) =
        sweep_markup(&engine, "<body><p>he him his he's himself</p></body>");

    assert!(markup.contains("xe xem his he's himself"));
    assert_eq!(pronouns, 2);
}

#[test]
fn test_positional_pairing_full_canonical_sets() {
    let config = ReplacerConfig::new("Nobody", "Sam", "he/him", "they/them");
    let engine = TextEngine::new(&config);

    let (markup, _, pronouns) =
        sweep_markup(&engine, "<body><p>he him his he's himself</p></body>");

    assert!(markup.contains("they them their they're themselves"));
    assert_eq!(pronouns, 5);
}

#[test]
fn test_ze_zir_canonical_set() {
    let config = ReplacerConfig::new("Nobody", "Sam", "she/her", "ze/zir");
    let engine = TextEngine::new(&config);

    let (markup, _, pronouns) = sweep_markup(&engine, "<body><p>she saw herself</p></body>");

    assert!(markup.contains("ze saw zirself"));
    assert_eq!(pronouns, 2);
}

#[test]
fn test_name_rules_take_precedence_over_pronoun_rules() {
    // "they" is configured both as a deadname variant and as an old pronoun
    // form; the occurrence is consumed by the name rule only.
    let config = ReplacerConfig::new("they", "Sam", "they/them", "he/him");
    let engine = TextEngine::new(&config);

    let (markup, names, pronouns) = sweep_markup(&engine, "<body><p>they spoke</p></body>");

    assert!(markup.contains("Sam spoke"));
    assert_eq!(names, 1);
    assert_eq!(pronouns, 0);
}

#[test]
fn test_skip_list_enforced_through_parse() {
    let config = ReplacerConfig::new("Alex", "Sam", "", "");
    let engine = TextEngine::new(&config);

    let markup = "<body>\
<script>var who = \"Alex\";</script>\
<style>.alex { color: red; }</style>\
<noscript>Alex needs scripts</noscript>\
<textarea>Dear Alex</textarea>\
<p>Alex is visible</p>\
</body>";

    let (rewritten, names, _) = sweep_markup(&engine, markup);

    assert_eq!(names, 1);
    assert!(rewritten.contains("var who = \"Alex\";"));
    assert!(rewritten.contains("Alex needs scripts"));
    assert!(rewritten.contains("Dear Alex"));
    assert!(rewritten.contains("Sam is visible"));
}

#[test]
fn test_empty_config_rewrites_nothing() {
    let config = ReplacerConfig::new("", "", "", "");
    let engine = TextEngine::new(&config);

    let (markup, names, pronouns) = sweep_markup(&engine, "<body><p>Alex and he</p></body>");

    assert!(markup.contains("Alex and he"));
    assert_eq!(names + pronouns, 0);
}

#[test]
fn test_sweep_plain_document_builder() {
    let config = ReplacerConfig::new("Alex", "Sam", "", "");
    let engine = TextEngine::new(&config);

    let mut doc = Document::new();
    let p = doc.append_element(doc.root(), "p");
    doc.append_text(p, "Alex");
    let root = doc.root();

    let outcome = engine.sweep(&mut doc, root);
    assert_eq!(outcome.names, 1);
    assert_eq!(doc.text_content(root), "Sam");
}
