//! Word-list classifier used when the crate is built without the `bert` feature.

use std::collections::HashMap;

use crate::senti::{ClassificationError, Classifier, RawLabel};

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("love", 0.9),
    ("loved", 0.9),
    ("amazing", 0.9),
    ("excellent", 0.9),
    ("awesome", 0.8),
    ("fantastic", 0.8),
    ("great", 0.7),
    ("best", 0.7),
    ("happy", 0.6),
    ("recommend", 0.6),
    ("nice", 0.5),
    ("good", 0.5),
    ("beautiful", 0.6),
    ("worth", 0.4),
    ("like", 0.3),
    ("fast", 0.3),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("terrible", -0.9),
    ("worst", -0.9),
    ("hate", -0.9),
    ("awful", -0.8),
    ("horrible", -0.8),
    ("useless", -0.8),
    ("waste", -0.7),
    ("bad", -0.6),
    ("poor", -0.6),
    ("broken", -0.6),
    ("disappointed", -0.6),
    ("slow", -0.4),
    ("expensive", -0.3),
    ("problem", -0.4),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "dont", "don't", "isn't", "wasn't", "didn't"];

/// Scores below this magnitude are reported as NEUTRAL.
const NEUTRAL_BAND: f64 = 0.05;

pub struct Lexicon {
    words: HashMap<String, f64>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexicon {
    pub fn new() -> Self {
        Self {
            words: POSITIVE_WORDS
                .iter()
                .chain(NEGATIVE_WORDS.iter())
                .map(|(word, weight)| (word.to_string(), *weight))
                .collect(),
        }
    }

    /// Mean polarity of the sentiment words in `text`, in [-1, 1].
    pub fn score(&self, text: &str) -> Option<f64> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut total = 0.0;
        let mut hits = 0;
        for (i, token) in tokens.iter().enumerate() {
            if let Some(weight) = self.words.get(*token) {
                let negated = i > 0 && NEGATIONS.contains(&tokens[i - 1]);
                total += if negated { -weight } else { *weight };
                hits += 1;
            }
        }
        if hits == 0 {
            None
        } else {
            Some((total / hits as f64).max(-1.0).min(1.0))
        }
    }
}

impl Classifier for Lexicon {
    fn vocabulary(&self) -> Vec<String> {
        vec!["NEGATIVE".into(), "NEUTRAL".into(), "POSITIVE".into()]
    }

    fn predict(&self, text: &str) -> Result<RawLabel, ClassificationError> {
        let raw = match self.score(text) {
            None => RawLabel::new("NEUTRAL", 0.5),
            Some(s) if s > NEUTRAL_BAND => RawLabel::new("POSITIVE", 0.5 + s / 2.0),
            Some(s) if s < -NEUTRAL_BAND => RawLabel::new("NEGATIVE", 0.5 - s / 2.0),
            Some(s) => RawLabel::new("NEUTRAL", 1.0 - s.abs()),
        };
        Ok(raw)
    }
}
