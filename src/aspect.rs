use serde::Deserialize;

use std::fmt;

use crate::senti::Sentiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Aspect {
    Price,
    Quality,
    Packaging,
    Delivery,
    Battery,
    Camera,
    Smell,
}

impl Aspect {
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Aspect::Price => &["price", "cost", "expensive", "cheap"],
            Aspect::Quality => &["quality", "pure", "organic", "performance", "good", "bad"],
            Aspect::Packaging => &["packaging", "bottle", "box"],
            Aspect::Delivery => &["delivery", "shipping"],
            Aspect::Battery => &["battery", "charge", "backup", "drain"],
            Aspect::Camera => &["camera", "photo", "video"],
            Aspect::Smell => &["smell", "fragrance", "aroma"],
        }
    }

    /// Matches on lowercased text.
    fn mentioned_in(self, lower: &str) -> bool {
        self.keywords().iter().any(|word| lower.contains(word))
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectSet {
    Basic,
    Extended,
}

impl AspectSet {
    pub fn aspects(self) -> &'static [Aspect] {
        match self {
            AspectSet::Basic => &[Aspect::Price, Aspect::Quality, Aspect::Packaging, Aspect::Delivery],
            AspectSet::Extended => &[
                Aspect::Price,
                Aspect::Quality,
                Aspect::Packaging,
                Aspect::Delivery,
                Aspect::Battery,
                Aspect::Camera,
                Aspect::Smell,
            ],
        }
    }

    /// One pair per aspect the text talks about, in aspect order.
    pub fn tag(self, text: &str, sentiment: Sentiment) -> Vec<(Aspect, Sentiment)> {
        let lower = text.to_lowercase();
        self.aspects()
            .iter()
            .filter(|aspect| aspect.mentioned_in(&lower))
            .map(|aspect| (*aspect, sentiment))
            .collect()
    }
}
