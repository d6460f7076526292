use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};

use std::fmt;

use crate::senti::Sentiment;
use crate::studio::{Report, Source};
use crate::tally::SentimentCounts;

/// Widest bar, drawn at 100%.
const BAR_WIDTH: usize = 40;
const SAMPLE_TEXT_CHARS: usize = 70;

/// A report laid out for the terminal.
pub struct Rendered<'a> {
    report: &'a Report,
    sample_rows: usize,
}

pub fn render(report: &Report, sample_rows: usize) -> Rendered<'_> {
    Rendered { report, sample_rows }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "Analysis completed ({})", report.id)?;

        writeln!(f, "\nSample results")?;
        writeln!(f, "{}", samples(report, self.sample_rows))?;

        writeln!(f, "\nSentiment distribution")?;
        writeln!(f, "{}", distribution(&report.counts))?;

        if !report.aspects.is_empty() {
            writeln!(f, "\nAspects ({} mentions)", report.aspects.total())?;
            writeln!(f, "{}", aspects(report))?;
        }

        if let Some(trend) = report.trend.as_ref().filter(|t| !t.is_empty()) {
            let mut table = new_table(&["Month", "Videos", "Views", "Likes"]);
            for (month, stats) in trend.iter() {
                table.add_row(vec![
                    Cell::new(month),
                    number(stats.videos as u64),
                    number(stats.views),
                    number(stats.likes),
                ]);
            }
            writeln!(f, "\nMonthly trend")?;
            writeln!(f, "{}", table)?;
        }

        write!(f, "\n{}", insight(report))
    }
}

pub fn insight(report: &Report) -> String {
    let pct = report.counts.percent(Sentiment::Positive);
    match report.source {
        Source::Dataset => format!(
            "{:.1}% of the {} rows in {} are positive.",
            pct,
            report.counts.total(),
            report.subject
        ),
        Source::Topic => format!(
            "Public opinion about {} on YouTube is {:.1}% positive, indicating overall audience sentiment.",
            report.subject, pct
        ),
        Source::Channel => format!(
            "Viewers of {} are {:.1}% positive across {} comments.",
            report.subject,
            pct,
            report.counts.total()
        ),
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

fn number(n: u64) -> Cell {
    Cell::new(n).set_alignment(CellAlignment::Right)
}

fn samples(report: &Report, limit: usize) -> Table {
    let mut table = new_table(&["Text", "Sentiment"]);
    for row in report.rows.iter().take(limit) {
        table.add_row(vec![Cell::new(shorten(&row.text)), Cell::new(row.sentiment)]);
    }
    table
}

fn distribution(counts: &SentimentCounts) -> Table {
    let mut table = new_table(&["Sentiment", "Count", "Share", ""]);
    for (sentiment, count) in counts.iter() {
        let pct = counts.percent(sentiment);
        table.add_row(vec![
            Cell::new(sentiment),
            number(count as u64),
            Cell::new(format!("{:.1}%", pct)).set_alignment(CellAlignment::Right),
            Cell::new(bar(pct)),
        ]);
    }
    table
}

fn aspects(report: &Report) -> Table {
    let categories = report.counts.iter().map(|(s, _)| s).collect::<Vec<_>>();
    let mut header = vec!["Aspect".to_string()];
    header.extend(categories.iter().map(|s| s.to_string()));
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    for (aspect, counts) in report.aspects.iter() {
        let mut row = vec![Cell::new(aspect)];
        row.extend(categories.iter().map(|s| number(counts.get(*s) as u64)));
        table.add_row(row);
    }
    table
}

fn bar(pct: f64) -> String {
    let width = ((pct / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width.min(BAR_WIDTH))
}

fn shorten(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > SAMPLE_TEXT_CHARS {
        let cut: String = flat.chars().take(SAMPLE_TEXT_CHARS - 1).collect();
        format!("{}…", cut)
    } else {
        flat
    }
}
