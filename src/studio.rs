use uuid::Uuid;

use std::path::Path;

use log::*;

use crate::aspect::{Aspect, AspectSet};
use crate::dataset::Dataset;
use crate::senti::{Senti, Sentiment};
use crate::tally::{AspectCounts, MonthlyTrend, SentimentCounts};
use crate::youtube::{collect_comments, CommentSource};
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub text: String,
    pub sentiment: Sentiment,
    pub aspects: Vec<(Aspect, Sentiment)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub videos: usize,
    pub comments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Dataset,
    Topic,
    Channel,
}

/// Everything one analysis produced, ready to render.
#[derive(Debug)]
pub struct Report {
    pub id: Uuid,
    pub source: Source,
    pub subject: String,
    pub rows: Vec<Classified>,
    pub counts: SentimentCounts,
    pub aspects: AspectCounts,
    pub trend: Option<MonthlyTrend>,
    pub table: Option<Dataset>,
}

pub struct Studio<'a> {
    senti: &'a Senti,
    aspects: AspectSet,
}

impl<'a> Studio<'a> {
    pub fn new(senti: &'a Senti, aspects: AspectSet) -> Self {
        Self { senti, aspects }
    }

    /// One text at a time, in input order.
    pub fn classify_all<I, S>(&self, texts: I) -> Vec<Classified>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .map(|text| {
                let text = text.into();
                let sentiment = self.senti.sentiment_of(&text);
                let aspects = self.aspects.tag(&text, sentiment);
                Classified {
                    text,
                    sentiment,
                    aspects,
                }
            })
            .collect()
    }

    fn report(&self, source: Source, subject: &str, rows: Vec<Classified>) -> Report {
        let categories = self.senti.categories();
        let counts = SentimentCounts::tally(categories, rows.iter().map(|r| r.sentiment));
        let aspects = AspectCounts::tally(categories, rows.iter().flat_map(|r| r.aspects.iter().copied()));
        let report = Report {
            id: Uuid::new_v4(),
            source,
            subject: subject.to_string(),
            rows,
            counts,
            aspects,
            trend: None,
            table: None,
        };
        info!(
            "Analysis {} of {:?}: {} texts, {:.1}% positive",
            report.id,
            report.subject,
            report.counts.total(),
            report.counts.percent(Sentiment::Positive)
        );
        report
    }

    pub fn dataset_file<P: AsRef<Path>>(&self, path: P) -> Result<Report, Error> {
        let data = Dataset::from_path(path.as_ref())?;
        self.dataset(&path.as_ref().display().to_string(), data)
    }

    pub fn dataset(&self, subject: &str, data: Dataset) -> Result<Report, Error> {
        let column = data.text_column()?;
        info!(
            "Performing sentiment analysis on {} rows of {:?}",
            data.len(),
            data.headers()[column]
        );
        let rows = self.classify_all(data.column(column));
        let sentiments: Vec<Sentiment> = rows.iter().map(|r| r.sentiment).collect();
        let mut report = self.report(Source::Dataset, subject, rows);
        report.table = Some(data.with_sentiments(&sentiments));
        Ok(report)
    }

    pub fn topic(&self, source: &dyn CommentSource, topic: &str, limits: Limits) -> Result<Report, Error> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::EmptyQuery);
        }
        info!("Fetching YouTube opinions on: {}", topic);
        let videos = source.search_videos(topic, limits.videos).unwrap_or_else(|e| {
            warn!("Search for {:?} failed: {}", topic, e);
            vec![]
        });
        let comments = collect_comments(source, &videos, limits.comments);
        if comments.is_empty() {
            return Err(Error::NoComments(topic.to_string()));
        }
        let rows = self.classify_all(comments);
        Ok(self.report(Source::Topic, topic, rows))
    }

    pub fn channel(&self, source: &dyn CommentSource, name: &str, limits: Limits) -> Result<Report, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let channel_id = match source.find_channel(name) {
            Ok(Some(id)) => id,
            Ok(None) => return Err(Error::ChannelNotFound(name.to_string())),
            Err(e) => {
                warn!("Channel lookup for {:?} failed: {}", name, e);
                return Err(Error::ChannelNotFound(name.to_string()));
            }
        };
        debug!("Channel {:?} is {}", name, channel_id);
        let videos = source.channel_videos(&channel_id, limits.videos).unwrap_or_else(|e| {
            warn!("Listing videos of {} failed: {}", channel_id, e);
            vec![]
        });
        let stats = source.video_stats(&videos).unwrap_or_else(|e| {
            warn!("Video statistics for {} failed: {}", channel_id, e);
            vec![]
        });
        let comments = collect_comments(source, &videos, limits.comments);
        if comments.is_empty() {
            return Err(Error::NoComments(name.to_string()));
        }
        let rows = self.classify_all(comments);
        let mut report = self.report(Source::Channel, name, rows);
        report.trend = Some(MonthlyTrend::from_videos(&stats));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetError;
    use crate::senti::tests::{senti_with, Stub};
    use crate::senti::{Classes, Policy, RawLabel};
    use crate::youtube::tests::FakeTube;
    use crate::youtube::VideoStats;
    use chrono::{TimeZone, Utc};

    use crate::senti::Sentiment::*;

    const LIMITS: Limits = Limits {
        videos: 3,
        comments: 50,
    };

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn love_terrible_and_nothing() {
        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let rows = studio.classify_all(vec!["I love this!", "Terrible experience", ""]);
        let report = studio.report(Source::Topic, "scenario", rows);
        assert_eq!(report.counts.get(Positive), 1);
        assert_eq!(report.counts.get(Negative), 1);
        assert_eq!(report.counts.get(Neutral), 1);
        assert_eq!(report.counts.total(), 3);
    }

    #[test]
    fn capitalised_tweet_column_is_found() -> anyhow::Result<()> {
        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let data = Dataset::from_reader("id,Tweet\n1,I love this phone\n2,Terrible battery\n".as_bytes())?;
        let report = studio.dataset("tweets.csv", data)?;
        let sentiments: Vec<Sentiment> = report.rows.iter().map(|r| r.sentiment).collect();
        assert_eq!(sentiments, vec![Positive, Negative]);

        let table = report.table.expect("dataset reports keep their table");
        assert_eq!(table.headers().last().map(String::as_str), Some("Sentiment"));
        assert_eq!(table.column(2).collect::<Vec<_>>(), vec!["Positive", "Negative"]);
        Ok(())
    }

    #[test]
    fn no_text_column_fails_validation() -> anyhow::Result<()> {
        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let data = Dataset::from_reader("id,score\n1,0.5\n2,0.7\n".as_bytes())?;
        match studio.dataset("numbers.csv", data) {
            Err(Error::Dataset(DatasetError::NoTextColumn(_))) => Ok(()),
            other => panic!("expected a validation failure, got {:?}", other.map(|r| r.subject)),
        }
    }

    #[test]
    fn aspects_break_down_by_sentiment() {
        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let rows = studio.classify_all(vec![
            "I love the price",
            "Terrible price and terrible delivery",
            "Terrible quality",
        ]);
        let report = studio.report(Source::Dataset, "aspects", rows);
        assert_eq!(report.aspects.total(), 4);
        let price = report.aspects.get(Aspect::Price).unwrap();
        assert_eq!((price.get(Positive), price.get(Negative)), (1, 1));
        assert_eq!(report.aspects.get(Aspect::Delivery).unwrap().get(Negative), 1);
    }

    #[test]
    fn topic_search_flattens_comments() -> anyhow::Result<()> {
        let mut tube = FakeTube::default();
        tube.search.insert("phone".into(), strings(&["v1", "v2", "v3", "v4"]));
        tube.comments.insert("v1".into(), strings(&["I love it", "Terrible screen"]));
        tube.comments.insert("v2".into(), strings(&["love love love"]));
        tube.broken.push("v3".into());
        tube.comments.insert("v4".into(), strings(&["never fetched, over the video limit"]));

        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let report = studio.topic(&tube, " phone ", LIMITS)?;
        assert_eq!(report.subject, "phone");
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.counts.percent(Positive), 66.7);
        assert!(report.trend.is_none());
        Ok(())
    }

    #[test]
    fn topic_without_comments_is_reported() {
        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let tube = FakeTube::default();
        assert!(matches!(studio.topic(&tube, "nothing", LIMITS), Err(Error::NoComments(_))));
        assert!(matches!(studio.topic(&tube, "  ", LIMITS), Err(Error::EmptyQuery)));
    }

    #[test]
    fn channel_insights_include_monthly_trend() -> anyhow::Result<()> {
        let mut tube = FakeTube::default();
        tube.channels
            .insert("Gadget Lab".into(), ("UC1".into(), strings(&["v1", "v2"])));
        tube.comments.insert("v1".into(), strings(&["I love this channel"]));
        tube.comments.insert("v2".into(), strings(&["Terrible audio", "A strange video"]));
        tube.stats = vec![
            VideoStats {
                id: "v1".into(),
                title: "Unboxing".into(),
                views: 1000,
                likes: 90,
                published_at: Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap(),
            },
            VideoStats {
                id: "v2".into(),
                title: "Review".into(),
                views: 400,
                likes: 12,
                published_at: Utc.with_ymd_and_hms(2024, 6, 9, 8, 0, 0).unwrap(),
            },
        ];

        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Extended);
        let report = studio.channel(&tube, "Gadget Lab", LIMITS)?;
        assert_eq!(report.counts.total(), 3);
        assert_eq!(report.aspects.get(Aspect::Camera).unwrap().get(Neutral), 1);
        let trend = report.trend.expect("channels carry a trend");
        let months: Vec<&str> = trend.iter().map(|(m, _)| m).collect();
        assert_eq!(months, vec!["2024-05", "2024-06"]);
        Ok(())
    }

    #[test]
    fn unknown_channel_is_a_validation_error() {
        let senti = senti_with(Stub::polar(), Policy::default());
        let studio = Studio::new(&senti, AspectSet::Basic);
        let tube = FakeTube::default();
        match studio.channel(&tube, "Nobody", LIMITS) {
            Err(Error::ChannelNotFound(name)) => assert_eq!(name, "Nobody"),
            other => panic!("expected a missing channel, got {:?}", other.map(|r| r.subject)),
        }
    }

    #[test]
    fn two_class_reports_show_both_bars() {
        let stub = Stub::new(vec![("love", RawLabel::new("POSITIVE", 0.9))]);
        let senti = senti_with(
            stub,
            Policy {
                classes: Classes::Two,
                fallback: Negative,
                gate: None,
            },
        );
        let studio = Studio::new(&senti, AspectSet::Basic);
        let rows = studio.classify_all(vec!["love it", "love that"]);
        let report = studio.report(Source::Topic, "two", rows);
        assert_eq!(report.counts.iter().collect::<Vec<_>>(), vec![(Positive, 2), (Negative, 0)]);
    }
}
