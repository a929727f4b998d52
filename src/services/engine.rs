use crate::models::{
    Document, NodeId, NodeKind, ReplacerConfig, TraversalPolicy, traversal_policy,
};
use crate::rules::{RuleCategory, RuleSet, apply_case_style};

/// Result of one engine pass over a subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Name substitutions performed.
    pub names: u64,

    /// Pronoun substitutions performed.
    pub pronouns: u64,

    /// Text nodes whose content was actually written back. Used by callers
    /// to broadcast character-data records and highlight parent elements.
    pub rewritten: Vec<NodeId>,
}

impl SweepOutcome {
    pub fn total(&self) -> u64 {
        self.names + self.pronouns
    }

    /// Whether any substitution was counted (written back or not).
    pub fn has_replacements(&self) -> bool {
        self.total() > 0
    }

    /// Fold another outcome into this one.
    pub fn merge(&mut self, other: SweepOutcome) {
        self.names += other.names;
        self.pronouns += other.pronouns;
        self.rewritten.extend(other.rewritten);
    }
}

/// Result of rewriting a single piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub text: String,
    pub names: u64,
    pub pronouns: u64,
}

impl RewriteResult {
    pub fn changed_from(&self, original: &str) -> bool {
        self.text != original
    }
}

/// The text mutation engine: applies a compiled rule set to document
/// subtrees in place.
///
/// Rules are applied per text node, every name rule then every pronoun rule
/// in order, each as one non-overlapping global scan; a span produced by a
/// replacement is not rescanned by the same rule. The node is written back
/// at most once per pass, and only when the text actually changed.
///
/// Sweeps are re-entrant and idempotent: a second pass over converged
/// content counts zero further replacements. This relies on the assumption
/// that a replacement never itself matches a configured pattern; a config
/// whose preferred name is also listed as a name variant oscillates instead
/// of converging, and the engine does not guard against it.
#[derive(Debug, Clone)]
pub struct TextEngine {
    rules: RuleSet,

    /// Reapply each match's capitalization pattern to its replacement.
    /// When false the compiled replacement string is used verbatim.
    preserve_case: bool,
}

impl TextEngine {
    /// Compile a fresh rule set from a validated config.
    pub fn new(config: &ReplacerConfig) -> Self {
        Self {
            rules: RuleSet::compile(config),
            preserve_case: config.preserve_case,
        }
    }

    /// Build an engine over an existing rule set.
    pub fn from_rules(rules: RuleSet, preserve_case: bool) -> Self {
        Self {
            rules,
            preserve_case,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rewrite the subtree rooted at `node` in document order.
    pub fn sweep(&self, doc: &mut Document, node: NodeId) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        if !self.rules.is_empty() {
            self.visit(doc, node, &mut outcome);
        }
        outcome
    }

    fn visit(&self, doc: &mut Document, node: NodeId, outcome: &mut SweepOutcome) {
        enum Step {
            Rewrite(String),
            Recurse(Vec<NodeId>),
            Skip,
        }

        let step = match doc.kind(node) {
            // Whitespace-only text cannot match any rule; skip early.
            NodeKind::Text(content) if content.trim().is_empty() => Step::Skip,
            NodeKind::Text(content) => Step::Rewrite(content.clone()),
            NodeKind::Element(el) => match traversal_policy(&el.tag) {
                TraversalPolicy::SkipSubtree => Step::Skip,
                TraversalPolicy::Recurse => Step::Recurse(doc.children(node).to_vec()),
            },
            // Sub-documents are swept by whoever attached to them, never by
            // an enclosing document's traversal.
            NodeKind::Frame(_) => Step::Skip,
        };

        match step {
            Step::Skip => {}
            Step::Rewrite(original) => {
                let result = self.rewrite_text(&original);
                outcome.names += result.names;
                outcome.pronouns += result.pronouns;
                if result.changed_from(&original) {
                    doc.set_text(node, &result.text);
                    outcome.rewritten.push(node);
                }
            }
            Step::Recurse(children) => {
                for child in children {
                    self.visit(doc, child, outcome);
                }
            }
        }
    }

    /// Apply every rule to a piece of text, counting matches per category.
    pub fn rewrite_text(&self, text: &str) -> RewriteResult {
        let mut names = 0u64;
        let mut pronouns = 0u64;
        let mut current = text.to_string();

        for rule in self.rules.iter() {
            let mut count = 0u64;
            let replaced = rule.pattern.replace_all(&current, |caps: &regex::Captures<'_>| {
                count += 1;
                let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                if self.preserve_case {
                    apply_case_style(matched, &rule.replacement)
                } else {
                    rule.replacement.clone()
                }
            });

            if count > 0 {
                let next = replaced.into_owned();
                current = next;
                match rule.category {
                    RuleCategory::Name => names += count,
                    RuleCategory::Pronoun => pronouns += count,
                }
            }
        }

        RewriteResult {
            text: current,
            names,
            pronouns,
        }
    }
}
