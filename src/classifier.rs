use std::collections::BTreeMap;

use serde_json::json;
use tracing::debug;
use ureq::Agent;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{EmotionScore, InferenceResponse};

/// Black-box text emotion model returning label/score pairs
#[cfg_attr(test, mockall::automock)]
pub trait EmotionModel {
    fn predict(&self, text: &str) -> Result<Vec<EmotionScore>>;
}

/// Validates input for the model and makes its output deterministic
pub struct EmotionClassifier<M> {
    model: M,
}

impl<M: EmotionModel> EmotionClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Classify free text into emotion scores, highest score first.
    ///
    /// Labels are lowercased and unique; scores are clamped to [0, 1].
    /// Equal scores are ordered by label.
    pub fn classify(&self, text: &str) -> Result<Vec<EmotionScore>> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput(
                "text to classify must not be empty".to_string(),
            ));
        }

        let raw = self.model.predict(text)?;

        let mut best: BTreeMap<String, f32> = BTreeMap::new();
        for EmotionScore { label, score } in raw {
            let label = label.trim().to_lowercase();
            if label.is_empty() {
                continue;
            }
            let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
            let entry = best.entry(label).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }

        let mut scores: Vec<EmotionScore> = best
            .into_iter()
            .map(|(label, score)| EmotionScore { label, score })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
        Ok(scores)
    }

    /// Scores as a label to score map, the shape the predictions file uses
    pub fn to_prediction_map(scores: &[EmotionScore]) -> BTreeMap<String, f32> {
        scores.iter().map(|s| (s.label.clone(), s.score)).collect()
    }
}

/// Text classification through a hosted inference endpoint
pub struct HuggingFaceModel {
    agent: Agent,
    endpoint: String,
    token: Option<String>,
}

impl HuggingFaceModel {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();

        HuggingFaceModel {
            agent,
            endpoint: format!(
                "{}/{}",
                config.inference_url.trim_end_matches('/'),
                config.classifier_model
            ),
            token: config.huggingface_token.clone(),
        }
    }
}

impl EmotionModel for HuggingFaceModel {
    fn predict(&self, text: &str) -> Result<Vec<EmotionScore>> {
        debug!(endpoint = %self.endpoint, "Requesting emotion classification");

        let mut request = self.agent.post(&self.endpoint);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        // top_k = null asks for every label the model knows
        let response = request.send_json(json!({
            "inputs": text,
            "parameters": { "top_k": null },
        }))?;

        let parsed: InferenceResponse = response.into_json().map_err(|e| {
            Error::RemoteService(format!("Failed to parse classifier response: {e}"))
        })?;

        match parsed {
            InferenceResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    Ok(vec![])
                } else {
                    Ok(batches.swap_remove(0))
                }
            }
            InferenceResponse::Flat(scores) => Ok(scores),
            InferenceResponse::Failed { error } => Err(Error::RemoteService(format!(
                "Classifier returned an error: {error}"
            ))),
        }
    }
}

/// Model that answers every text with the same scores
#[derive(Debug, Clone, Default)]
pub struct StaticModel {
    scores: Vec<EmotionScore>,
}

impl StaticModel {
    pub fn new(scores: Vec<EmotionScore>) -> Self {
        Self { scores }
    }

    /// Load a `{label: score}` predictions file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let map: BTreeMap<String, f32> = serde_json::from_str(&content)?;
        Ok(Self::new(
            map.into_iter().map(|(label, score)| EmotionScore { label, score }).collect(),
        ))
    }
}

impl EmotionModel for StaticModel {
    fn predict(&self, _text: &str) -> Result<Vec<EmotionScore>> {
        Ok(self.scores.clone())
    }
}
