use chrono::{DateTime, Utc};

use std::collections::BTreeMap;

use crate::aspect::Aspect;
use crate::senti::Sentiment;
use crate::youtube::VideoStats;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SentimentCounts {
    counts: BTreeMap<Sentiment, usize>,
}

impl SentimentCounts {
    /// Every category shows up, even at zero. Items outside `categories`
    /// are still counted so the total always matches the input length.
    pub fn tally<I>(categories: &[Sentiment], items: I) -> Self
    where
        I: IntoIterator<Item = Sentiment>,
    {
        let mut counts: BTreeMap<Sentiment, usize> =
            categories.iter().map(|c| (*c, 0)).collect();
        for item in items {
            *counts.entry(item).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, sentiment: Sentiment) -> usize {
        self.counts.get(&sentiment).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Share of `sentiment`, in percent, to one decimal place. Ties go to
    /// the even digit, so 1 in 16 is 6.2.
    pub fn percent(&self, sentiment: Sentiment) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.get(sentiment) as f64 * 1000.0 / total as f64).round_ties_even() / 10.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sentiment, usize)> + '_ {
        self.counts.iter().map(|(s, n)| (*s, *n))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AspectCounts {
    by_aspect: BTreeMap<Aspect, SentimentCounts>,
}

impl AspectCounts {
    pub fn tally<I>(categories: &[Sentiment], pairs: I) -> Self
    where
        I: IntoIterator<Item = (Aspect, Sentiment)>,
    {
        let mut grouped: BTreeMap<Aspect, Vec<Sentiment>> = BTreeMap::new();
        for (aspect, sentiment) in pairs {
            grouped.entry(aspect).or_default().push(sentiment);
        }
        Self {
            by_aspect: grouped
                .into_iter()
                .map(|(aspect, items)| (aspect, SentimentCounts::tally(categories, items)))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn get(&self, aspect: Aspect) -> Option<&SentimentCounts> {
        self.by_aspect.get(&aspect)
    }

    pub fn total(&self) -> usize {
        self.by_aspect.values().map(SentimentCounts::total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_aspect.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Aspect, &SentimentCounts)> + '_ {
        self.by_aspect.iter().map(|(a, c)| (*a, c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthStats {
    pub videos: usize,
    pub views: u64,
    pub likes: u64,
}

/// Video statistics bucketed by publish month, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonthlyTrend {
    months: BTreeMap<String, MonthStats>,
}

impl MonthlyTrend {
    pub fn from_videos(videos: &[VideoStats]) -> Self {
        let mut months: BTreeMap<String, MonthStats> = BTreeMap::new();
        for video in videos {
            let month = months.entry(month_key(&video.published_at)).or_default();
            month.videos += 1;
            month.views += video.views;
            month.likes += video.likes;
        }
        Self { months }
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MonthStats)> + '_ {
        self.months.iter().map(|(m, s)| (m.as_str(), s))
    }
}

fn month_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}
