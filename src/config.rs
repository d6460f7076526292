use serde::Deserialize;
#[allow(unused_imports)] // Validate is only called from main and the tests.
use validator::{ValidationError, Validate};
use validator_derive::Validate;

use std::path::PathBuf;

const ENGLISH_MODEL_FILES: &[&str] = &["rust_model.ot", "config.json", "vocab.json", "merges.txt"];
const MULTILINGUAL_MODEL_FILES: &[&str] = &["rust_model.ot", "config.json", "sentencepiece.bpe.model"];

use crate::aspect::AspectSet;
use crate::senti::{Classes, Policy, Sentiment, DEFAULT_GATE};

#[derive(Debug, Deserialize, Validate, Clone)]
#[validate(schema(function = "ensure_two_class_fallback"))]
pub struct Config {
    #[serde(default = "default_debug")]
    pub debug: bool,

    #[serde(default = "default_classes")]
    pub classes: Classes,

    #[serde(default = "default_fallback")]
    pub fallback: Sentiment,

    /// Scores below this become Neutral. Absent means no gate.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_gate: Option<f64>,

    #[serde(default = "default_aspects")]
    pub aspects: AspectSet,

    #[serde(default)]
    pub youtube_api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,

    #[serde(default = "default_topic_videos")]
    #[validate(range(min = 1, max = 50))]
    pub topic_videos: usize,

    #[serde(default = "default_topic_comments")]
    #[validate(range(min = 1, max = 100))]
    pub topic_comments: usize,

    #[serde(default = "default_channel_videos")]
    #[validate(range(min = 1, max = 50))]
    pub channel_videos: usize,

    #[serde(default = "default_channel_comments")]
    #[validate(range(min = 1, max = 100))]
    pub channel_comments: usize,

    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Converted three-class english model, `<name>.model/`.
    #[serde(default)]
    #[validate(custom = "ensure_english_model_files")]
    pub english_model: Option<String>,

    /// Converted multilingual model, `<name>.model/`.
    #[serde(default)]
    #[validate(custom = "ensure_multilingual_model_files")]
    pub multilingual_model: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: default_debug(),
            classes: default_classes(),
            fallback: default_fallback(),
            confidence_gate: None,
            aspects: default_aspects(),
            youtube_api_key: None,
            timeout_secs: default_timeout_secs(),
            topic_videos: default_topic_videos(),
            topic_comments: default_topic_comments(),
            channel_videos: default_channel_videos(),
            channel_comments: default_channel_comments(),
            sample_rows: default_sample_rows(),
            english_model: None,
            multilingual_model: None,
        }
    }
}

impl Config {
    pub fn policy(&self) -> Policy {
        Policy {
            classes: self.classes,
            fallback: self.fallback,
            gate: self.confidence_gate,
        }
    }

    /// Turns the gate on at the usual threshold unless one is configured.
    pub fn with_gate(mut self) -> Self {
        self.confidence_gate.get_or_insert(DEFAULT_GATE);
        self
    }
}

fn default_debug() -> bool {
    false
}

fn default_classes() -> Classes {
    Classes::Three
}

fn default_fallback() -> Sentiment {
    Sentiment::Neutral
}

fn default_aspects() -> AspectSet {
    AspectSet::Basic
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_topic_videos() -> usize {
    3
}

fn default_topic_comments() -> usize {
    50
}

fn default_channel_videos() -> usize {
    10
}

fn default_channel_comments() -> usize {
    30
}

fn default_sample_rows() -> usize {
    20
}

fn ensure_two_class_fallback(config: &Config) -> Result<(), ValidationError> {
    if config.classes == Classes::Two && config.fallback == Sentiment::Neutral {
        Err(ValidationError::new("Two classes need a Positive or Negative fallback"))
    } else {
        Ok(())
    }
}

pub fn model_path(model_name: &str, file: &str) -> PathBuf {
    PathBuf::from(format!("{}.model", model_name)).join(file)
}

fn ensure_english_model_files(model_name: &str) -> Result<(), ValidationError> {
    ensure_model_files(model_name, ENGLISH_MODEL_FILES)
}

fn ensure_multilingual_model_files(model_name: &str) -> Result<(), ValidationError> {
    ensure_model_files(model_name, MULTILINGUAL_MODEL_FILES)
}

fn ensure_model_files(model_name: &str, files: &[&str]) -> Result<(), ValidationError> {
    match files.iter().map(|file| model_path(model_name, file)).find(|path| !path.exists()) {
        Some(path) => {
            let mut error = ValidationError::new("Model file missing");
            error.add_param("path".into(), &path);
            Err(error)
        }
        None => Ok(()),
    }
}
