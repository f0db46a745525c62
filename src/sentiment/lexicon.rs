//! Rule-based polarity scorer used when the neural model abstains.
//!
//! Each token is looked up in a valence lexicon (roughly -4..4). Boosters
//! nudge the following word's valence away from zero and a negation within
//! the three preceding tokens flips and dampens it. The summed valences are
//! normalized into positive, neutral and negative proportions.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Polarity;

const BOOSTER_INCREMENT: f64 = 0.293;
const NEGATION_SCALAR: f64 = -0.74;
const NEGATION_WINDOW: usize = 3;

const DEFAULT_VALENCES: &[(&str, f64)] = &[
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("brilliant", 2.8),
    ("congrats", 2.4),
    ("congratulations", 2.9),
    ("cool", 1.3),
    ("cute", 2.0),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("fun", 2.3),
    ("funny", 1.9),
    ("glad", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("incredible", 2.4),
    ("inspiring", 2.4),
    ("like", 1.5),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("proud", 2.1),
    ("support", 1.7),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("win", 2.8),
    ("wonderful", 2.7),
    ("wow", 2.8),
    ("yes", 1.7),
    ("angry", -2.3),
    ("annoying", -1.7),
    ("awful", -2.0),
    ("bad", -2.5),
    ("boring", -1.3),
    ("cringe", -1.8),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("disgusting", -2.4),
    ("dislike", -1.6),
    ("dumb", -2.3),
    ("fake", -2.1),
    ("fail", -2.5),
    ("hate", -2.7),
    ("hated", -3.2),
    ("horrible", -2.5),
    ("idiot", -2.3),
    ("lame", -1.8),
    ("liar", -2.6),
    ("pathetic", -2.2),
    ("poor", -2.1),
    ("sad", -2.1),
    ("scam", -2.8),
    ("stupid", -2.4),
    ("terrible", -2.1),
    ("trash", -2.0),
    ("ugly", -2.3),
    ("useless", -1.8),
    ("worst", -3.1),
    ("wrong", -2.1),
];

const DEFAULT_BOOSTERS: &[&str] = &[
    "absolutely",
    "completely",
    "extremely",
    "incredibly",
    "really",
    "so",
    "super",
    "totally",
    "very",
];

const DEFAULT_NEGATIONS: &[&str] = &[
    "ain't", "aren't", "can't", "cannot", "didn't", "doesn't", "don't", "isn't", "never",
    "no", "nobody", "none", "not", "nothing", "wasn't", "won't",
];

/// Proportions of positive, neutral and negative content in a text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PolarityScores {
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

impl PolarityScores {
    /// Winning label and its score; preference on ties is pos, neu, neg.
    pub fn dominant(&self) -> (Polarity, f64) {
        if self.pos == 0.0 && self.neu == 0.0 && self.neg == 0.0 {
            return (Polarity::Unclassified, 0.0);
        }
        let mut best = (Polarity::Positive, self.pos);
        for candidate in [(Polarity::Neutral, self.neu), (Polarity::Negative, self.neg)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    }
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
    boosters: Vec<String>,
    negations: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            valences: DEFAULT_VALENCES
                .iter()
                .map(|(word, valence)| (word.to_string(), *valence))
                .collect(),
            boosters: DEFAULT_BOOSTERS.iter().map(|word| word.to_string()).collect(),
            negations: DEFAULT_NEGATIONS.iter().map(|word| word.to_string()).collect(),
        }
    }
}

impl Lexicon {
    pub fn scores(&self, text: &str) -> PolarityScores {
        let tokens = tokenize(text);

        let mut positive = 0.0;
        let mut negative = 0.0;
        let mut neutral = 0.0;

        for (index, token) in tokens.iter().enumerate() {
            let valence = match self.valences.get(token.as_str()) {
                Some(valence) => self.adjust(*valence, &tokens[..index]),
                None => 0.0,
            };

            if valence > 0.0 {
                positive += valence + 1.0;
            } else if valence < 0.0 {
                negative += valence - 1.0;
            } else {
                neutral += 1.0;
            }
        }

        let total = positive + negative.abs() + neutral;
        if total == 0.0 {
            return PolarityScores::default();
        }
        PolarityScores {
            pos: round3(positive / total),
            neu: round3(neutral / total),
            neg: round3(negative.abs() / total),
        }
    }

    fn adjust(&self, valence: f64, preceding: &[String]) -> f64 {
        let mut adjusted = valence;

        if let Some(previous) = preceding.last() {
            if self.boosters.iter().any(|booster| booster == previous) {
                adjusted += BOOSTER_INCREMENT * valence.signum();
            }
        }

        let window_start = preceding.len().saturating_sub(NEGATION_WINDOW);
        if preceding[window_start..]
            .iter()
            .any(|token| self.is_negation(token))
        {
            adjusted *= NEGATION_SCALAR;
        }
        adjusted
    }

    fn is_negation(&self, token: &str) -> bool {
        token.ends_with("n't") || self.negations.iter().any(|negation| negation == token)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.replace('\u{2019}', "'")
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
