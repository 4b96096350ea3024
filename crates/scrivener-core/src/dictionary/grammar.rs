//! Pattern-based grammar rules for offline analysis.
//!
//! Three rule families run in a fixed order: subject-verb agreement, the
//! `a`/`an` article, and commonly confused homophones. Homophone hits are
//! flagged for review only; their suggestion is the matched text itself.

use std::sync::LazyLock;

use regex::Regex;

use crate::correction::Correction;
use crate::text::{CONTEXT_RADIUS, context_window};

/// Which family a rule belongs to. Determines how the suggestion is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    SubjectVerb,
    Article,
    Homophone,
}

struct GrammarRule {
    kind: RuleKind,
    pattern: Regex,
    /// Matches that also match this pattern are skipped.
    exclude: Option<Regex>,
}

impl GrammarRule {
    fn new(kind: RuleKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("valid regex"),
            exclude: None,
        }
    }

    fn excluding(mut self, pattern: &str) -> Self {
        self.exclude = Some(Regex::new(pattern).expect("valid regex"));
        self
    }
}

/// Rules in evaluation order.
static GRAMMAR_RULES: LazyLock<Vec<GrammarRule>> = LazyLock::new(|| {
    vec![
        GrammarRule::new(RuleKind::SubjectVerb, r"(?i)\b(i|we|they|you|he|she) was\b")
            .excluding(r"(?i)\b(he|she) was\b"),
        GrammarRule::new(RuleKind::Article, r"(?i)\b(a) ([aeiou]\w+)"),
        GrammarRule::new(RuleKind::Homophone, r"(?i)\b(their|there|they're)\b"),
        GrammarRule::new(RuleKind::Homophone, r"(?i)\b(your|you're)\b"),
        GrammarRule::new(RuleKind::Homophone, r"(?i)\b(its|it's)\b"),
        GrammarRule::new(RuleKind::Homophone, r"(?i)\b(affect|effect)\b"),
        GrammarRule::new(RuleKind::Homophone, r"(?i)\b(to|too|two)\b"),
    ]
});

/// Run every grammar rule over `text`, in rule order then match order.
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn check_grammar(text: &str) -> Vec<Correction> {
    let mut corrections = Vec::new();

    for rule in GRAMMAR_RULES.iter() {
        for m in rule.pattern.find_iter(text) {
            let matched = m.as_str();
            if rule
                .exclude
                .as_ref()
                .is_some_and(|exclude| exclude.is_match(matched))
            {
                continue;
            }

            let suggestion = match rule.kind {
                RuleKind::SubjectVerb => replace_was(matched),
                RuleKind::Article => replace_article(matched),
                RuleKind::Homophone => matched.to_string(),
            };

            corrections.push(Correction::grammar(
                matched,
                vec![suggestion],
                context_window(text, m.start(), m.end(), CONTEXT_RADIUS),
            ));
        }
    }

    corrections
}

/// `we was` → `we were`, keeping the capitalization of `was`.
fn replace_was(matched: &str) -> String {
    let split = matched.len() - "was".len();
    let (head, verb) = matched.split_at(split);
    let replacement = if verb == "WAS" {
        "WERE"
    } else if verb.starts_with('W') {
        "Were"
    } else {
        "were"
    };
    format!("{head}{replacement}")
}

/// `a apple` → `an apple`, keeping the capitalization of the article.
fn replace_article(matched: &str) -> String {
    let rest = &matched[1..];
    if matched.starts_with('A') {
        format!("An{rest}")
    } else {
        format!("an{rest}")
    }
}
