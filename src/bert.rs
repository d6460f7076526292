use rust_bert::pipelines::common::{ModelResource, ModelType};
use rust_bert::pipelines::sentiment::{SentimentModel, SentimentPolarity};
use rust_bert::pipelines::sequence_classification::{
    SequenceClassificationConfig, SequenceClassificationModel,
};
use rust_bert::resources::LocalResource;
use tch::Device;

use log::*;

use crate::config::model_path;
use crate::senti::{ClassificationError, Classifier, LabelScheme, RawLabel};

/// DistilBERT fine-tuned on SST-2, answers POSITIVE or NEGATIVE. Used
/// when no converted model is configured.
pub struct Sst2 {
    model: SentimentModel,
}

impl Sst2 {
    pub fn new() -> Result<Self, ClassificationError> {
        info!("Loading SST-2 sentiment model");
        let model = SentimentModel::new(Default::default())
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;
        Ok(Self { model })
    }
}

impl Classifier for Sst2 {
    fn vocabulary(&self) -> Vec<String> {
        vec!["NEGATIVE".into(), "POSITIVE".into()]
    }

    fn predict(&self, text: &str) -> Result<RawLabel, ClassificationError> {
        let sentiment = self
            .model
            .predict(&[text])
            .pop()
            .ok_or(ClassificationError::NoPrediction)?;
        let label = match sentiment.polarity {
            SentimentPolarity::Positive => "POSITIVE",
            SentimentPolarity::Negative => "NEGATIVE",
        };
        Ok(RawLabel::new(label, sentiment.score))
    }
}

/// A three-class sequence classifier converted to `<name>.model/`.
pub struct LocalBert {
    model: SequenceClassificationModel,
    scheme: LabelScheme,
}

fn local(model_name: &str, file: &str) -> LocalResource {
    LocalResource {
        local_path: model_path(model_name, file),
    }
}

impl LocalBert {
    /// Twitter RoBERTa sentiment model, answers LABEL_0 to LABEL_2.
    pub fn english(model_name: &str) -> Result<Self, ClassificationError> {
        info!("Loading english sentiment model {}", model_name);
        let config = SequenceClassificationConfig::new(
            ModelType::Roberta,
            ModelResource::Torch(Box::new(local(model_name, "rust_model.ot"))),
            local(model_name, "config.json"),
            local(model_name, "vocab.json"),
            Some(local(model_name, "merges.txt")),
            false,
            None,
            None,
        );
        Self::load(config, LabelScheme::Indexed)
    }

    /// XLM-RoBERTa twitter sentiment model, answers negative, neutral or positive.
    pub fn multilingual(model_name: &str) -> Result<Self, ClassificationError> {
        info!("Loading multilingual sentiment model {}", model_name);
        let config = SequenceClassificationConfig::new(
            ModelType::XLMRoberta,
            ModelResource::Torch(Box::new(local(model_name, "rust_model.ot"))),
            local(model_name, "config.json"),
            local(model_name, "sentencepiece.bpe.model"),
            None,
            false,
            None,
            None,
        );
        Self::load(config, LabelScheme::PolarLower)
    }

    fn load(mut config: SequenceClassificationConfig, scheme: LabelScheme) -> Result<Self, ClassificationError> {
        config.device = Device::cuda_if_available();
        let model = SequenceClassificationModel::new(config)
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;
        Ok(Self { model, scheme })
    }
}

impl Classifier for LocalBert {
    fn vocabulary(&self) -> Vec<String> {
        self.scheme.labels().iter().map(|label| label.to_string()).collect()
    }

    fn predict(&self, text: &str) -> Result<RawLabel, ClassificationError> {
        let label = self
            .model
            .predict([text])
            .pop()
            .ok_or(ClassificationError::NoPrediction)?;
        Ok(RawLabel::new(&label.text, label.score))
    }
}
