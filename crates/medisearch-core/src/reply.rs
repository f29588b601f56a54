//! Tolerant parsing of labeled evaluator replies.
//!
//! Evaluators answer in free text with lines like `CONFIDENCE: 0.8`. Each
//! evaluator declares a rule set `{label -> (kind, default)}`; the parser
//! scans the reply line by line, matches labels case-insensitively, and
//! keeps the default for any field that is missing or malformed. A parse
//! never fails as a whole.
//!
//! Numbered list markers are ignored and a label may carry a qualifier in
//! front of it, so `2. Overall Confidence: 0.9` fills `CONFIDENCE`.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::assessments::ContradictionLevel;
use crate::clamp_unit;

/// Flag attached to an evaluator result when any field fell back to its default.
pub const SOFT_PARSE_FLAG: &str = "soft_parse_failure";

lazy_static! {
    /// Leading decimal number, e.g. "0.85", ".9", "1", "-0.2"
    static ref LEADING_NUMBER: Regex = Regex::new(r"^[-+]?(?:\d+(?:\.\d*)?|\.\d+)").unwrap();

    /// Decorated list marker, e.g. "1. ", "**2) ", "- (3) "
    static ref LIST_MARKER: Regex = Regex::new(r"^[\s*#`_-]*\(?\d+[.)]\s*").unwrap();
}

/// Expected value type of a labeled field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Float clamped to `[0, 1]`
    Score,

    /// One of low / medium / high
    Level,

    /// Free text, kept verbatim
    Text,

    /// "None"-style sentinel means empty, anything else is one entry
    List,
}

/// Value used when a field is missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Score(f64),
    Level(ContradictionLevel),
    Text(&'static str),
    List,
}

/// One declarative parsing rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    /// Upper-case label without the colon
    pub label: &'static str,

    pub kind: FieldKind,

    pub default: FieldDefault,

    /// A missing required field counts as a soft parse failure
    pub required: bool,
}

impl FieldRule {
    pub const fn score(label: &'static str, default: f64) -> Self {
        Self {
            label,
            kind: FieldKind::Score,
            default: FieldDefault::Score(default),
            required: true,
        }
    }

    pub const fn level(label: &'static str, default: ContradictionLevel) -> Self {
        Self {
            label,
            kind: FieldKind::Level,
            default: FieldDefault::Level(default),
            required: true,
        }
    }

    pub const fn text(label: &'static str, default: &'static str) -> Self {
        Self {
            label,
            kind: FieldKind::Text,
            default: FieldDefault::Text(default),
            required: false,
        }
    }

    pub const fn list(label: &'static str) -> Self {
        Self {
            label,
            kind: FieldKind::List,
            default: FieldDefault::List,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Score(f64),
    Level(ContradictionLevel),
    Text(String),
    List(Vec<String>),
}

impl From<FieldDefault> for FieldValue {
    fn from(default: FieldDefault) -> Self {
        match default {
            FieldDefault::Score(v) => FieldValue::Score(clamp_unit(v)),
            FieldDefault::Level(level) => FieldValue::Level(level),
            FieldDefault::Text(text) => FieldValue::Text(text.to_string()),
            FieldDefault::List => FieldValue::List(Vec::new()),
        }
    }
}

/// Result of applying a rule set to a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    values: BTreeMap<&'static str, FieldValue>,
    defaulted: BTreeSet<&'static str>,
}

impl ParsedReply {
    /// Score for `label`, or `0.0` if the label is not part of the rule set.
    pub fn score(&self, label: &str) -> f64 {
        match self.values.get(label) {
            Some(FieldValue::Score(v)) => *v,
            _ => 0.0,
        }
    }

    pub fn level(&self, label: &str) -> ContradictionLevel {
        match self.values.get(label) {
            Some(FieldValue::Level(level)) => *level,
            _ => ContradictionLevel::Unknown,
        }
    }

    pub fn text(&self, label: &str) -> String {
        match self.values.get(label) {
            Some(FieldValue::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }

    pub fn list(&self, label: &str) -> Vec<String> {
        match self.values.get(label) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Labels whose value fell back to the default because of a soft failure.
    pub fn defaulted(&self) -> &BTreeSet<&'static str> {
        &self.defaulted
    }

    /// Whether any field fell back to its default.
    pub fn is_degraded(&self) -> bool {
        !self.defaulted.is_empty()
    }
}

/// Apply `rules` to a free-text reply.
///
/// Later lines override earlier ones for the same label.
pub fn parse_reply(reply: &str, rules: &[FieldRule]) -> ParsedReply {
    let mut parsed: BTreeMap<&'static str, Option<FieldValue>> = BTreeMap::new();

    for line in reply.lines() {
        let Some((label, raw_value)) = split_labeled(line) else {
            continue;
        };
        let Some(rule) = match_rule(rules, &label) else {
            continue;
        };
        // None marks a present-but-malformed field
        parsed.insert(rule.label, parse_value(rule.kind, raw_value));
    }

    let mut values = BTreeMap::new();
    let mut defaulted = BTreeSet::new();

    for rule in rules {
        let value = match parsed.remove(rule.label) {
            Some(Some(value)) => value,
            Some(None) => {
                defaulted.insert(rule.label);
                FieldValue::from(rule.default)
            }
            None => {
                if rule.required {
                    defaulted.insert(rule.label);
                }
                FieldValue::from(rule.default)
            }
        };
        values.insert(rule.label, value);
    }

    ParsedReply { values, defaulted }
}

/// Rule for a normalized label: an exact match, otherwise the longest rule
/// label that ends the line's label as a whole word.
fn match_rule<'r>(rules: &'r [FieldRule], label: &str) -> Option<&'r FieldRule> {
    if let Some(rule) = rules.iter().find(|r| r.label == label) {
        return Some(rule);
    }
    rules
        .iter()
        .filter(|r| {
            label
                .strip_suffix(r.label)
                .is_some_and(|prefix| prefix.ends_with('_'))
        })
        .max_by_key(|r| r.label.len())
}

/// Split "**1. Clinical Relevance:** 0.8" into ("CLINICAL_RELEVANCE", "0.8").
fn split_labeled(line: &str) -> Option<(String, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = LIST_MARKER
        .replace(label, "")
        .trim()
        .trim_matches(|c: char| matches!(c, '*' | '-' | '#' | '_' | '`') || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_uppercase();
    if label.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches(|c: char| matches!(c, '*' | '`')).trim();
    Some((label, value))
}

fn parse_value(kind: FieldKind, raw: &str) -> Option<FieldValue> {
    match kind {
        FieldKind::Score => parse_score(raw).map(FieldValue::Score),
        FieldKind::Level => parse_level(raw).map(FieldValue::Level),
        FieldKind::Text => {
            if raw.is_empty() {
                None
            } else {
                Some(FieldValue::Text(raw.to_string()))
            }
        }
        FieldKind::List => Some(FieldValue::List(parse_list(raw))),
    }
}

fn parse_score(raw: &str) -> Option<f64> {
    let unbracketed = raw.trim_start_matches('[').trim();
    let number = LEADING_NUMBER.find(unbracketed)?;
    let value: f64 = number.as_str().parse().ok()?;
    value.is_finite().then(|| clamp_unit(value))
}

fn parse_level(raw: &str) -> Option<ContradictionLevel> {
    let word = raw
        .trim_matches(|c: char| !c.is_alphabetic())
        .split(|c: char| !c.is_alphabetic())
        .next()?
        .to_lowercase();
    match word.as_str() {
        "low" => Some(ContradictionLevel::Low),
        "medium" => Some(ContradictionLevel::Medium),
        "high" => Some(ContradictionLevel::High),
        _ => None,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    let normalized = raw
        .trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '.') || c.is_whitespace())
        .to_lowercase();
    if matches!(normalized.as_str(), "" | "none" | "none identified" | "n/a") {
        Vec::new()
    } else {
        vec![raw.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[FieldRule] = &[
        FieldRule::score("CLINICAL_RELEVANCE", 0.7),
        FieldRule::score("CONFIDENCE", 0.7),
        FieldRule::level("CONTRADICTION_LEVEL", ContradictionLevel::Low),
        FieldRule::list("SAFETY_CONCERNS"),
        FieldRule::text("REASONING", "Default reasoning."),
    ];

    #[test]
    fn test_well_formed_reply() {
        let reply = "CLINICAL_RELEVANCE: 0.85\n\
                     CONFIDENCE: 0.9\n\
                     CONTRADICTION_LEVEL: medium\n\
                     SAFETY_CONCERNS: Monitor renal function\n\
                     REASONING: Consistent with guidelines: see ADA 2023";
        let parsed = parse_reply(reply, RULES);

        assert_eq!(parsed.score("CLINICAL_RELEVANCE"), 0.85);
        assert_eq!(parsed.score("CONFIDENCE"), 0.9);
        assert_eq!(parsed.level("CONTRADICTION_LEVEL"), ContradictionLevel::Medium);
        assert_eq!(parsed.list("SAFETY_CONCERNS"), vec!["Monitor renal function"]);
        // Text after the first colon is kept whole
        assert_eq!(parsed.text("REASONING"), "Consistent with guidelines: see ADA 2023");
        assert!(!parsed.is_degraded());
    }

    #[test]
    fn test_labels_are_case_insensitive_and_decorated() {
        let reply = "**Clinical Relevance:** [0.6]\n- confidence: 0.75 (moderate)\ncontradiction_level: HIGH.";
        let parsed = parse_reply(reply, RULES);
        assert_eq!(parsed.score("CLINICAL_RELEVANCE"), 0.6);
        assert_eq!(parsed.score("CONFIDENCE"), 0.75);
        assert_eq!(parsed.level("CONTRADICTION_LEVEL"), ContradictionLevel::High);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let parsed = parse_reply("CONFIDENCE: 1.8\nCLINICAL_RELEVANCE: -3", RULES);
        assert_eq!(parsed.score("CONFIDENCE"), 1.0);
        assert_eq!(parsed.score("CLINICAL_RELEVANCE"), 0.0);
    }

    #[test]
    fn test_malformed_fields_keep_defaults_and_are_reported() {
        let reply = "CONFIDENCE: high\nCONTRADICTION_LEVEL: moderate\nCLINICAL_RELEVANCE: 0.5";
        let parsed = parse_reply(reply, RULES);

        assert_eq!(parsed.score("CONFIDENCE"), 0.7);
        assert_eq!(parsed.level("CONTRADICTION_LEVEL"), ContradictionLevel::Low);
        assert_eq!(parsed.score("CLINICAL_RELEVANCE"), 0.5);
        assert!(parsed.defaulted().contains("CONFIDENCE"));
        assert!(parsed.defaulted().contains("CONTRADICTION_LEVEL"));
        assert!(!parsed.defaulted().contains("CLINICAL_RELEVANCE"));
    }

    #[test]
    fn test_garbage_reply_is_all_defaults() {
        let parsed = parse_reply("I cannot evaluate this answer.", RULES);
        assert_eq!(parsed.score("CONFIDENCE"), 0.7);
        assert_eq!(parsed.text("REASONING"), "Default reasoning.");
        assert!(parsed.list("SAFETY_CONCERNS").is_empty());
        // Optional text/list fields do not count as failures when absent
        assert_eq!(parsed.defaulted().len(), 3);
    }

    #[test]
    fn test_none_sentinels_yield_empty_list() {
        for raw in ["None", "None identified", "none.", "[None identified]", ""] {
            let parsed = parse_reply(&format!("SAFETY_CONCERNS: {}", raw), RULES);
            assert!(parsed.list("SAFETY_CONCERNS").is_empty(), "{raw}");
        }
    }

    #[test]
    fn test_numbered_labels() {
        let reply = "Provide:\n\
                     1. CLINICAL_RELEVANCE: 0.95\n\
                     2) SAFETY_CONCERNS: None\n\
                     **3. Confidence:** 0.9\n\
                     (4) REASONING: Well supported.";
        let parsed = parse_reply(reply, RULES);

        assert_eq!(parsed.score("CLINICAL_RELEVANCE"), 0.95);
        assert_eq!(parsed.score("CONFIDENCE"), 0.9);
        assert_eq!(parsed.text("REASONING"), "Well supported.");
        assert!(parsed.list("SAFETY_CONCERNS").is_empty());
        assert_eq!(parsed.defaulted().len(), 1);
        assert!(parsed.defaulted().contains("CONTRADICTION_LEVEL"));
    }

    #[test]
    fn test_qualified_labels() {
        let parsed = parse_reply("Overall Confidence: 0.9\nFinal contradiction level: high", RULES);
        assert_eq!(parsed.score("CONFIDENCE"), 0.9);
        assert_eq!(parsed.level("CONTRADICTION_LEVEL"), ContradictionLevel::High);
        assert!(!parsed.defaulted().contains("CONFIDENCE"));
    }

    #[test]
    fn test_label_suffix_must_be_whole_word() {
        // "NONCONFIDENCE" is not a qualified "CONFIDENCE"
        let parsed = parse_reply("NONCONFIDENCE: 0.1", RULES);
        assert_eq!(parsed.score("CONFIDENCE"), 0.7);
        assert!(parsed.defaulted().contains("CONFIDENCE"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let parsed = parse_reply("CONFIDENCE: 0.2\nCONFIDENCE: 0.4", RULES);
        assert_eq!(parsed.score("CONFIDENCE"), 0.4);
    }
}
