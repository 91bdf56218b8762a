//! Keyword-rule style analyzer for marketing copy.
//!
//! Each signal is scored independently: every matching rule adds its fixed
//! weight, and the total is clamped to [0, 1]. Text is lowercased and split
//! into word tokens (apostrophes kept, so contractions stay whole); phrase
//! rules match whole-token sequences.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use brandmind_types::profile::{
    CallToActionStyle, FocusPreference, PersuasionApproach, StyleGuidelines,
};

/// Scores above this count as a present signal.
pub const SIGNAL_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleSignal {
    Formal,
    Conversational,
    Urgent,
    BenefitFocused,
    FeatureFocused,
    Emotional,
    Logical,
}

impl StyleSignal {
    pub const ALL: [StyleSignal; 7] = [
        StyleSignal::Formal,
        StyleSignal::Conversational,
        StyleSignal::Urgent,
        StyleSignal::BenefitFocused,
        StyleSignal::FeatureFocused,
        StyleSignal::Emotional,
        StyleSignal::Logical,
    ];

    /// Voice-tone dimensions this signal pulls upward.
    pub fn tone_dimensions(self) -> [&'static str; 2] {
        match self {
            StyleSignal::Formal => ["professional", "authoritative"],
            StyleSignal::Conversational => ["friendly", "approachable"],
            StyleSignal::Urgent => ["bold", "energetic"],
            StyleSignal::BenefitFocused => ["customer_centric", "empathetic"],
            StyleSignal::FeatureFocused => ["technical", "informative"],
            StyleSignal::Emotional => ["inspiring", "passionate"],
            StyleSignal::Logical => ["analytical", "trustworthy"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StyleSignal::Formal => "formal",
            StyleSignal::Conversational => "conversational",
            StyleSignal::Urgent => "urgent",
            StyleSignal::BenefitFocused => "benefit_focused",
            StyleSignal::FeatureFocused => "feature_focused",
            StyleSignal::Emotional => "emotional",
            StyleSignal::Logical => "logical",
        }
    }
}

impl fmt::Display for StyleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-signal scores in [0, 1]. Every signal is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StyleScores(BTreeMap<StyleSignal, f32>);

impl StyleScores {
    pub fn get(&self, signal: StyleSignal) -> f32 {
        self.0.get(&signal).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleSignal, f32)> + '_ {
        self.0.iter().map(|(signal, score)| (*signal, *score))
    }

    /// Signals whose score exceeds [`SIGNAL_THRESHOLD`].
    pub fn present(&self) -> impl Iterator<Item = (StyleSignal, f32)> + '_ {
        self.iter().filter(|(_, score)| *score > SIGNAL_THRESHOLD)
    }
}

enum Pattern {
    Words(&'static [&'static str]),
    Phrases(&'static [&'static str]),
    Char(char),
    Digits,
    Contractions,
    NoContractions,
}

struct Rule {
    signal: StyleSignal,
    pattern: Pattern,
    weight: f32,
}

const fn rule(signal: StyleSignal, pattern: Pattern, weight: f32) -> Rule {
    Rule {
        signal,
        pattern,
        weight,
    }
}

static RULES: &[Rule] = &[
    rule(
        StyleSignal::Formal,
        Pattern::Words(&[
            "therefore", "furthermore", "consequently", "moreover", "hence", "thus",
            "accordingly", "nevertheless", "whereas",
        ]),
        0.4,
    ),
    rule(
        StyleSignal::Formal,
        Pattern::Words(&[
            "regarding", "pursuant", "utilize", "facilitate", "comprehensive", "hereby",
            "respectively", "endeavor", "ensure",
        ]),
        0.3,
    ),
    rule(StyleSignal::Formal, Pattern::NoContractions, 0.1),
    rule(StyleSignal::Conversational, Pattern::Contractions, 0.3),
    rule(
        StyleSignal::Conversational,
        Pattern::Words(&[
            "hey", "awesome", "cool", "gonna", "wanna", "totally", "super", "stuff", "guys",
            "folks", "yeah", "honestly", "y'all",
        ]),
        0.4,
    ),
    rule(StyleSignal::Conversational, Pattern::Words(&["you", "your", "you're", "yours"]), 0.2),
    rule(StyleSignal::Conversational, Pattern::Char('?'), 0.1),
    rule(
        StyleSignal::Urgent,
        Pattern::Words(&[
            "now", "today", "hurry", "immediately", "deadline", "urgent", "tonight", "instantly",
        ]),
        0.3,
    ),
    rule(
        StyleSignal::Urgent,
        Pattern::Phrases(&[
            "limited time", "last chance", "act now", "don't miss", "ends soon",
            "while supplies last", "order now", "only a few",
        ]),
        0.4,
    ),
    rule(StyleSignal::Urgent, Pattern::Char('!'), 0.2),
    rule(
        StyleSignal::BenefitFocused,
        Pattern::Words(&[
            "save", "gain", "enjoy", "improve", "boost", "transform", "benefit", "benefits",
            "effortless", "easier", "faster", "you'll",
        ]),
        0.4,
    ),
    rule(
        StyleSignal::BenefitFocused,
        Pattern::Phrases(&["so you can", "helps you", "you get", "without the hassle"]),
        0.3,
    ),
    rule(
        StyleSignal::FeatureFocused,
        Pattern::Words(&[
            "feature", "features", "includes", "including", "specs", "specifications",
            "equipped", "integration", "integrates", "compatible", "technology", "dashboard",
            "api",
        ]),
        0.4,
    ),
    rule(
        StyleSignal::FeatureFocused,
        Pattern::Phrases(&["powered by", "comes with", "built in", "made of", "made from"]),
        0.3,
    ),
    rule(StyleSignal::FeatureFocused, Pattern::Digits, 0.1),
    rule(
        StyleSignal::Emotional,
        Pattern::Words(&[
            "love", "amazing", "incredible", "dream", "imagine", "feel", "passion", "heart",
            "inspire", "beautiful", "joy", "delight", "thrilled",
        ]),
        0.4,
    ),
    rule(StyleSignal::Emotional, Pattern::Words(&["family", "together", "story"]), 0.2),
    rule(StyleSignal::Emotional, Pattern::Char('!'), 0.1),
    rule(
        StyleSignal::Logical,
        Pattern::Words(&[
            "because", "data", "evidence", "proven", "research", "study", "studies", "percent",
            "statistics", "analysis", "results",
        ]),
        0.4,
    ),
    rule(StyleSignal::Logical, Pattern::Char('%'), 0.2),
    rule(StyleSignal::Logical, Pattern::Digits, 0.2),
];

struct Tokens {
    words: HashSet<String>,
    /// Tokens joined by single spaces and padded, for phrase lookups.
    padded: String,
    has_contraction: bool,
    has_digit: bool,
}

impl Tokens {
    fn new(text: &str) -> Self {
        let normalized = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
        let list: Vec<&str> = normalized
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|t| t.trim_matches('\''))
            .filter(|t| !t.is_empty())
            .collect();

        let has_contraction = list.iter().any(|t| is_contraction(t));
        let has_digit = list.iter().any(|t| t.chars().any(|c| c.is_ascii_digit()));
        let padded = format!(" {} ", list.join(" "));
        let words = list.into_iter().map(str::to_string).collect();

        Self {
            words,
            padded,
            has_contraction,
            has_digit,
        }
    }

    fn matches(&self, pattern: &Pattern, raw: &str) -> bool {
        match pattern {
            Pattern::Words(words) => words.iter().any(|w| self.words.contains(*w)),
            Pattern::Phrases(phrases) => phrases
                .iter()
                .any(|p| self.padded.contains(&format!(" {p} "))),
            Pattern::Char(c) => raw.contains(*c),
            Pattern::Digits => self.has_digit,
            Pattern::Contractions => self.has_contraction,
            Pattern::NoContractions => !self.has_contraction,
        }
    }
}

fn is_contraction(token: &str) -> bool {
    token
        .split_once('\'')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
}

/// Score `text` on every style signal.
pub fn analyze_style(text: &str) -> StyleScores {
    let mut scores: BTreeMap<StyleSignal, f32> =
        StyleSignal::ALL.iter().map(|s| (*s, 0.0)).collect();
    if text.trim().is_empty() {
        return StyleScores(scores);
    }

    let tokens = Tokens::new(text);
    for rule in RULES {
        if tokens.matches(&rule.pattern, text) {
            if let Some(score) = scores.get_mut(&rule.signal) {
                *score += rule.weight;
            }
        }
    }
    for score in scores.values_mut() {
        *score = score.clamp(0.0, 1.0);
    }

    StyleScores(scores)
}

/// Update the learned keys of `guidelines` from opposing signal pairs.
///
/// A key is set when the larger side of its pair exceeds
/// [`SIGNAL_THRESHOLD`] and differs from the other side; otherwise the
/// existing value is kept.
pub fn derive_guidelines(scores: &StyleScores, guidelines: &mut StyleGuidelines) {
    if let Some(focus) = pick(
        scores.get(StyleSignal::BenefitFocused),
        scores.get(StyleSignal::FeatureFocused),
        FocusPreference::Benefits,
        FocusPreference::Features,
    ) {
        guidelines.focus_preference = Some(focus);
    }
    if let Some(cta) = pick(
        scores.get(StyleSignal::Urgent),
        scores.get(StyleSignal::Conversational),
        CallToActionStyle::Direct,
        CallToActionStyle::Invitational,
    ) {
        guidelines.call_to_action = Some(cta);
    }
    if let Some(approach) = pick(
        scores.get(StyleSignal::Emotional),
        scores.get(StyleSignal::Logical),
        PersuasionApproach::Emotional,
        PersuasionApproach::Logical,
    ) {
        guidelines.approach = Some(approach);
    }
}

fn pick<T>(a: f32, b: f32, when_a: T, when_b: T) -> Option<T> {
    if a.max(b) <= SIGNAL_THRESHOLD || (a - b).abs() < f32::EPSILON {
        return None;
    }
    Some(if a > b { when_a } else { when_b })
}
