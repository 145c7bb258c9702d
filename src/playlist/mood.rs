use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::EngineConfig;
use crate::error::{Error, Result};
use crate::models::EmotionScore;

/// Canonical mood dimensions shared by classifier output and track projections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodDimension {
    Happy,
    Sad,
    Energetic,
    Calm,
    Intense,
}

impl MoodDimension {
    pub const ALL: [MoodDimension; 5] = [
        MoodDimension::Happy,
        MoodDimension::Sad,
        MoodDimension::Energetic,
        MoodDimension::Calm,
        MoodDimension::Intense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodDimension::Happy => "happy",
            MoodDimension::Sad => "sad",
            MoodDimension::Energetic => "energetic",
            MoodDimension::Calm => "calm",
            MoodDimension::Intense => "intense",
        }
    }
}

impl fmt::Display for MoodDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized mood weights. Non-negative, summing to 1, never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodVector {
    weights: BTreeMap<MoodDimension, f32>,
}

impl MoodVector {
    /// Normalize raw weights into a mood vector.
    ///
    /// Negative and non-finite weights count as zero; zero entries are dropped.
    pub fn from_weights(raw: BTreeMap<MoodDimension, f32>) -> Result<Self> {
        let cleaned: BTreeMap<MoodDimension, f32> = raw
            .into_iter()
            .filter(|(_, w)| w.is_finite() && *w > 0.0)
            .collect();
        let total: f32 = cleaned.values().sum();
        if total <= 0.0 {
            return Err(Error::EmptyMood);
        }
        let weights = cleaned.into_iter().map(|(d, w)| (d, w / total)).collect();
        Ok(Self { weights })
    }

    /// Weight of a dimension, zero when absent
    pub fn weight(&self, dimension: MoodDimension) -> f32 {
        self.weights.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoodDimension, f32)> + '_ {
        self.weights.iter().map(|(d, w)| (*d, *w))
    }

    /// Heaviest dimension; the earlier dimension wins a tie
    pub fn dominant(&self) -> MoodDimension {
        let mut best = (MoodDimension::Calm, f32::NEG_INFINITY);
        for (dimension, weight) in self.iter() {
            if weight > best.1 {
                best = (dimension, weight);
            }
        }
        best.0
    }

    pub fn total(&self) -> f32 {
        self.weights.values().sum()
    }
}

/// Builds mood vectors from classifier scores and an optional user hint
pub struct MoodVectorBuilder<'a> {
    config: &'a EngineConfig,
}

impl<'a> MoodVectorBuilder<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Map classifier labels onto mood dimensions and blend in the hint.
    ///
    /// Unmapped labels and unknown hints are skipped with a warning. When both
    /// parts contribute, the hint gets `hint_weight` of the final vector.
    pub fn build(&self, scores: &[EmotionScore], mood_hint: Option<&str>) -> Result<MoodVector> {
        let classifier_part = self.classifier_vector(scores);
        let hint_part = mood_hint.and_then(|hint| self.hint_vector(hint));

        match (classifier_part, hint_part) {
            (Some(classified), Some(hint)) => {
                let hint_weight = self.config.hint_weight;
                let mut blended = BTreeMap::new();
                for dimension in MoodDimension::ALL {
                    let w = (1.0 - hint_weight) * classified.weight(dimension)
                        + hint_weight * hint.weight(dimension);
                    blended.insert(dimension, w);
                }
                MoodVector::from_weights(blended)
            }
            (Some(classified), None) => Ok(classified),
            (None, Some(hint)) => Ok(hint),
            (None, None) => Err(Error::EmptyMood),
        }
    }

    fn classifier_vector(&self, scores: &[EmotionScore]) -> Option<MoodVector> {
        let mut sums: BTreeMap<MoodDimension, f32> = BTreeMap::new();
        for score in scores {
            match self.config.dimension_for(&score.label) {
                Some(dimension) => {
                    if score.score.is_finite() && score.score > 0.0 {
                        *sums.entry(dimension).or_insert(0.0) += score.score;
                    }
                }
                None => warn!(label = %score.label, "Dropping classifier label with no mood dimension"),
            }
        }
        debug!(?sums, "Aggregated classifier scores");
        MoodVector::from_weights(sums).ok()
    }

    /// Canonical vector for a hint, matched case-insensitively
    pub fn hint_vector(&self, hint: &str) -> Option<MoodVector> {
        if hint.trim().is_empty() {
            return None;
        }
        match self.config.hint_weights(hint) {
            Some(weights) => match MoodVector::from_weights(weights.clone()) {
                Ok(vector) => Some(vector),
                Err(_) => {
                    warn!(hint = %hint, "Ignoring mood hint with no positive weight");
                    None
                }
            },
            None => {
                warn!(hint = %hint, "Ignoring unknown mood hint");
                None
            }
        }
    }
}
