//! Substitution rule compilation.
//!
//! A [`RuleSet`] is compiled once per activation from a
//! [`ReplacerConfig`](crate::models::ReplacerConfig) and shared immutably by
//! every sweep of that activation:
//!
//! - one name rule per distinct non-empty deadname variant, in first-seen
//!   order, replacing with the preferred name
//! - one pronoun rule per positionally-paired (old form, new form) pair, in
//!   canonical slot order
//!
//! Name rules always precede pronoun rules. A word that is simultaneously a
//! configured name variant and an old pronoun form is consumed by the name
//! rule and never reaches the pronoun rule keyed to the original spelling.
//!
//! Pronoun forms pair strictly by position, not by slot name: with five old
//! forms and a two-form custom new list, only the first two old forms get a
//! mapping and the rest are left untouched.
//!
//! Compilation never fails. A malformed descriptor or an empty preferred
//! name yields a (possibly empty) rule list; an individual pattern that does
//! not compile is skipped with a warning.

pub mod casing;
pub mod pronouns;

pub use casing::apply_case_style;

use crate::models::ReplacerConfig;
use regex::{Regex, RegexBuilder};

/// Which counter a rule's matches feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    Name,
    Pronoun,
}

/// One compiled substitution rule.
///
/// The pattern is a case-insensitive literal match (regex-escaped), wrapped
/// in word-boundary anchors when the config requests whole-word matching.
/// Rules are stateless across calls; match-position advancement is local to
/// a single replace pass.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub replacement: String,
    pub category: RuleCategory,
}

/// Ordered, immutable list of substitution rules for one activation.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile rules from a validated config.
    pub fn compile(config: &ReplacerConfig) -> Self {
        let mut rules = Vec::new();

        // Name rules first: their precedence over pronoun rules is part of
        // the substitution contract.
        for variant in config.distinct_variants() {
            if let Some(rule) = build_rule(
                variant,
                &config.preferred_name,
                config.whole_word,
                RuleCategory::Name,
            ) {
                rules.push(rule);
            }
        }

        // Pronoun rules, paired by position up to the shorter list.
        if !config.old_pronouns.is_empty() && !config.new_pronouns.is_empty() {
            let old_forms = pronouns::resolve(&config.old_pronouns);
            let new_forms = pronouns::resolve(&config.new_pronouns);

            for (old, new) in old_forms.iter().zip(new_forms.iter()) {
                if let Some(rule) =
                    build_rule(old, new, config.whole_word, RuleCategory::Pronoun)
                {
                    rules.push(rule);
                }
            }
        }

        tracing::debug!(
            "Compiled {} substitution rules ({} name, {} pronoun)",
            rules.len(),
            rules
                .iter()
                .filter(|r| r.category == RuleCategory::Name)
                .count(),
            rules
                .iter()
                .filter(|r| r.category == RuleCategory::Pronoun)
                .count(),
        );

        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Build a single case-insensitive literal rule.
///
/// Returns `None` for an empty literal or replacement, or if the pattern
/// fails to compile (logged, never propagated).
fn build_rule(
    literal: &str,
    replacement: &str,
    whole_word: bool,
    category: RuleCategory,
) -> Option<Rule> {
    if literal.is_empty() || replacement.is_empty() {
        return None;
    }

    let escaped = regex::escape(literal);
    let pattern = if whole_word {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => Some(Rule {
            pattern: regex,
            replacement: replacement.to_string(),
            category,
        }),
        Err(e) => {
            tracing::warn!("Skipping unbuildable pattern for {:?}: {}", literal, e);
            None
        }
    }
}
