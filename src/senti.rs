use err_derive::Error;
use serde::Deserialize;

use std::fmt;

use log::*;

use crate::lang::{route, Route};

/// Longest input handed to a classifier, in characters.
pub const MAX_INPUT_CHARS: usize = 512;

pub const DEFAULT_GATE: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classes {
    Three,
    Two,
}

impl Classes {
    pub fn categories(self) -> &'static [Sentiment] {
        match self {
            Classes::Three => &[Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative],
            Classes::Two => &[Sentiment::Positive, Sentiment::Negative],
        }
    }
}

/// What a classifier says about one text, in its own vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLabel {
    pub label: String,
    pub score: f64,
}

impl RawLabel {
    pub fn new(label: &str, score: f64) -> Self {
        Self {
            label: label.to_string(),
            score,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error(display = "Model unavailable: {}", _0)]
    Unavailable(String),
    #[error(display = "Model returned no prediction")]
    NoPrediction,
    #[error(display = "Model failed: {}", _0)]
    Model(String),
}

pub trait Classifier {
    /// Every tag `predict` can return.
    fn vocabulary(&self) -> Vec<String>;

    fn predict(&self, text: &str) -> Result<RawLabel, ClassificationError>;
}

const LABEL_TABLE: &[(&str, Sentiment)] = &[
    ("LABEL_0", Sentiment::Negative),
    ("NEGATIVE", Sentiment::Negative),
    ("negative", Sentiment::Negative),
    ("1 star", Sentiment::Negative),
    ("2 stars", Sentiment::Negative),
    ("LABEL_1", Sentiment::Neutral),
    ("NEUTRAL", Sentiment::Neutral),
    ("neutral", Sentiment::Neutral),
    ("3 stars", Sentiment::Neutral),
    ("LABEL_2", Sentiment::Positive),
    ("POSITIVE", Sentiment::Positive),
    ("positive", Sentiment::Positive),
    ("4 stars", Sentiment::Positive),
    ("5 stars", Sentiment::Positive),
];

/// Maps any known tag onto the canonical sentiment; unknown tags are Neutral.
pub fn normalize(label: &str) -> Sentiment {
    LABEL_TABLE
        .iter()
        .find(|(tag, _)| *tag == label)
        .map(|(_, sentiment)| *sentiment)
        .unwrap_or(Sentiment::Neutral)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScheme {
    Indexed,
    Polar,
    PolarLower,
    Stars,
}

impl LabelScheme {
    const ALL: [LabelScheme; 4] = [
        LabelScheme::Indexed,
        LabelScheme::Polar,
        LabelScheme::PolarLower,
        LabelScheme::Stars,
    ];

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            LabelScheme::Indexed => &["LABEL_0", "LABEL_1", "LABEL_2"],
            LabelScheme::Polar => &["NEGATIVE", "NEUTRAL", "POSITIVE"],
            LabelScheme::PolarLower => &["negative", "neutral", "positive"],
            LabelScheme::Stars => &["1 star", "2 stars", "3 stars", "4 stars", "5 stars"],
        }
    }

    /// The scheme containing every label of `vocabulary`, if there is one.
    pub fn identify<S: AsRef<str>>(vocabulary: &[S]) -> Option<LabelScheme> {
        if vocabulary.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|scheme| {
            vocabulary
                .iter()
                .all(|label| scheme.labels().contains(&label.as_ref()))
        })
    }
}

pub fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Policy {
    pub classes: Classes,
    pub fallback: Sentiment,
    pub gate: Option<f64>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            classes: Classes::Three,
            fallback: Sentiment::Neutral,
            gate: None,
        }
    }
}

#[derive(Debug, Error)]
#[error(display = "{} model emits unknown labels {:?}", model, labels)]
pub struct VocabularyError {
    pub model: &'static str,
    pub labels: Vec<String>,
}

pub struct Senti {
    english: Box<dyn Classifier>,
    multilingual: Box<dyn Classifier>,
    policy: Policy,
}

impl Senti {
    pub fn new(
        english: Box<dyn Classifier>,
        multilingual: Box<dyn Classifier>,
        policy: Policy,
    ) -> Result<Self, VocabularyError> {
        check_vocabulary("english", english.as_ref())?;
        check_vocabulary("multilingual", multilingual.as_ref())?;
        Ok(Self {
            english,
            multilingual,
            policy,
        })
    }

    pub fn categories(&self) -> &'static [Sentiment] {
        self.policy.classes.categories()
    }

    pub fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError> {
        if text.trim().is_empty() {
            return Ok(self.collapse(Sentiment::Neutral));
        }
        let classifier = match route(text) {
            Route::English => &self.english,
            Route::Multilingual => &self.multilingual,
        };
        let raw = classifier.predict(truncate(text))?;
        trace!("  {:?} for {:?}", raw, text);
        let sentiment = match self.policy.gate {
            Some(threshold) if raw.score < threshold => Sentiment::Neutral,
            _ => normalize(&raw.label),
        };
        Ok(self.collapse(sentiment))
    }

    /// Never fails: classification errors become the configured fallback.
    pub fn sentiment_of(&self, text: &str) -> Sentiment {
        self.classify(text).unwrap_or_else(|e| {
            debug!("Falling back to {} after: {}", self.policy.fallback, e);
            self.policy.fallback
        })
    }

    fn collapse(&self, sentiment: Sentiment) -> Sentiment {
        match (self.policy.classes, sentiment) {
            (Classes::Two, Sentiment::Neutral) => self.policy.fallback,
            _ => sentiment,
        }
    }
}

fn check_vocabulary(model: &'static str, classifier: &dyn Classifier) -> Result<(), VocabularyError> {
    let vocabulary = classifier.vocabulary();
    match LabelScheme::identify(&vocabulary) {
        Some(scheme) => {
            debug!("{} model speaks {:?}", model, scheme);
            Ok(())
        }
        None => {
            let unknown: Vec<String> = vocabulary
                .iter()
                .filter(|label| !LABEL_TABLE.iter().any(|(tag, _)| tag == label))
                .cloned()
                .collect();
            // Mixed schemes have no single unknown label, report them all.
            let labels = if unknown.is_empty() { vocabulary } else { unknown };
            Err(VocabularyError { model, labels })
        }
    }
}
