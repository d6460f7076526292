use err_derive::Error;

use std::io::{Read, Write};
use std::path::Path;

use log::*;

use crate::senti::Sentiment;

/// Header names that hold free text, in order of preference.
pub const TEXT_COLUMNS: &[&str] = &["text", "tweet", "review", "comment", "content", "sentence", "message"];

pub const SENTIMENT_COLUMN: &str = "Sentiment";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(display = "Cannot read dataset: {}", _0)]
    Io(#[error(source)] std::io::Error),
    #[error(display = "Malformed CSV: {}", _0)]
    Csv(#[error(source)] csv::Error),
    #[error(display = "The dataset is empty")]
    Empty,
    #[error(display = "No text column found (expected one of {:?}, or any column of plain text)", _0)]
    NoTextColumn(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = vec![];
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() > headers.len() {
                warn!(
                    "Row {} has {} fields but there are {} columns, dropping {:?}",
                    idx + 1,
                    row.len(),
                    headers.len(),
                    &row[headers.len()..]
                );
            }
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        if headers.iter().all(|h| h.trim().is_empty()) || rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        debug!("Read {} rows with columns {:?}", rows.len(), headers);
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Index of the column to classify: a known text header, else the
    /// first column holding plain strings.
    pub fn text_column(&self) -> Result<usize, DatasetError> {
        for name in TEXT_COLUMNS {
            if let Some(idx) = self
                .headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
            {
                return Ok(idx);
            }
        }
        let fallback = (0..self.headers.len()).find(|idx| {
            self.rows
                .iter()
                .any(|row| row.get(*idx).map_or(false, |value| is_plain_text(value)))
        });
        match fallback {
            Some(idx) => {
                info!("No known text column, using {:?}", self.headers[idx]);
                Ok(idx)
            }
            None => Err(DatasetError::NoTextColumn(TEXT_COLUMNS)),
        }
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }

    /// Sets the sentiment column, replacing an existing one.
    pub fn with_sentiments(mut self, sentiments: &[Sentiment]) -> Self {
        let idx = match self.headers.iter().position(|h| h == SENTIMENT_COLUMN) {
            Some(idx) => idx,
            None => {
                self.headers.push(SENTIMENT_COLUMN.to_string());
                for row in self.rows.iter_mut() {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };
        for (row, sentiment) in self.rows.iter_mut().zip(sentiments) {
            row[idx] = sentiment.to_string();
        }
        self
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_to(file)?;
        info!("Saved results to {}", path.as_ref().display());
        Ok(())
    }
}

/// Not blank, not a number, not a boolean.
fn is_plain_text(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.parse::<f64>().is_err()
        && !value.eq_ignore_ascii_case("true")
        && !value.eq_ignore_ascii_case("false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn parse(csv: &str) -> Result<Dataset, DatasetError> {
        Dataset::from_reader(csv.as_bytes())
    }

    #[test]
    fn header_match_ignores_case() -> anyhow::Result<()> {
        let data = parse("id,Tweet,likes\n1,What a day,4\n2,meh,0\n")?;
        assert_eq!(data.text_column()?, 1);
        assert_eq!(data.column(1).collect::<Vec<_>>(), vec!["What a day", "meh"]);
        Ok(())
    }

    #[test]
    fn earlier_names_win() -> anyhow::Result<()> {
        let data = parse("message,review\nhi,great\n")?;
        assert_eq!(data.text_column()?, 1);
        Ok(())
    }

    #[test]
    fn falls_back_to_first_string_column() -> anyhow::Result<()> {
        let data = parse("id,score,body,note\n1,0.5,Nice phone,x\n2,1e3,,y\n")?;
        assert_eq!(data.text_column()?, 2);
        Ok(())
    }

    #[test]
    fn numbers_only_is_a_validation_error() -> anyhow::Result<()> {
        let data = parse("id,score,flag\n1,0.5,true\n2,-3,FALSE\n3,,\n")?;
        match data.text_column() {
            Err(DatasetError::NoTextColumn(names)) => assert_eq!(names, TEXT_COLUMNS),
            other => panic!("expected a missing column error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn empty_uploads_are_rejected() {
        assert!(matches!(parse(""), Err(DatasetError::Empty)));
        assert!(matches!(parse("text\n"), Err(DatasetError::Empty)));
    }

    #[test]
    fn short_rows_are_padded() -> anyhow::Result<()> {
        let data = parse("text,extra\nhello\n")?;
        assert_eq!(data.rows[0], vec!["hello".to_string(), String::new()]);
        Ok(())
    }

    #[test]
    fn fields_past_the_header_are_dropped() -> anyhow::Result<()> {
        let data = parse("text,stars\ngood,5,extra,more\nbad,1\n")?;
        assert_eq!(data.rows[0], vec!["good".to_string(), "5".to_string()]);

        let mut out = vec![];
        data.with_sentiments(&[Sentiment::Positive, Sentiment::Negative])
            .write_to(&mut out)?;
        assert_eq!(String::from_utf8(out)?, "text,stars,Sentiment\ngood,5,Positive\nbad,1,Negative\n");
        Ok(())
    }

    #[test]
    fn sentiment_column_is_appended_then_replaced() -> anyhow::Result<()> {
        let data = parse("text\ngood\nbad\n")?
            .with_sentiments(&[Sentiment::Positive, Sentiment::Negative]);
        assert_eq!(data.headers(), &["text".to_string(), "Sentiment".to_string()]);

        let data = data.with_sentiments(&[Sentiment::Neutral, Sentiment::Neutral]);
        assert_eq!(data.headers().len(), 2);

        let mut out = vec![];
        data.write_to(&mut out)?;
        assert_eq!(String::from_utf8(out)?, "text,Sentiment\ngood,Neutral\nbad,Neutral\n");
        Ok(())
    }

    #[test]
    fn loads_and_saves_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("reviews.csv");
        let mut file = std::fs::File::create(&input)?;
        writeln!(file, "Review,stars")?;
        writeln!(file, "\"Cheap, and it shows\",1")?;
        drop(file);

        let data = Dataset::from_path(&input)?;
        assert_eq!(data.column(data.text_column()?).next(), Some("Cheap, and it shows"));

        let output = dir.path().join("out.csv");
        data.with_sentiments(&[Sentiment::Negative]).save(&output)?;
        let saved = std::fs::read_to_string(&output)?;
        assert_eq!(saved, "Review,stars,Sentiment\n\"Cheap, and it shows\",1,Negative\n");
        Ok(())
    }
}
