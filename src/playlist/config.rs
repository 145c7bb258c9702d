use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MoodDimension;
use crate::error::{Error, Result};

/// Immutable tuning data for the mood-to-playlist engine.
///
/// The tables are plain data so they can be versioned and loaded from JSON
/// independently of the scoring code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Classifier label (lowercase) to canonical mood dimension
    pub label_dimensions: BTreeMap<String, MoodDimension>,
    /// User-facing mood hint (lowercase) to its canonical weights
    pub mood_hints: BTreeMap<String, BTreeMap<MoodDimension, f32>>,
    /// How each mood dimension is read off a track's audio features
    pub projection: BTreeMap<MoodDimension, Vec<FeatureWeight>>,
    /// Share of the final mood vector given to the hint when both parts exist (0.0 to 1.0)
    pub hint_weight: f32,
    /// Maximum tracks per artist in one playlist; None disables the cap
    pub artist_cap: Option<usize>,
    pub similarity: SimilarityMetric,
    /// Playlist length used when a request does not give one
    pub default_length: usize,
}

/// Numeric audio attributes usable in a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Valence,
    Tempo,
    Loudness,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Mode,
}

/// One weighted term of a dimension's projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: AudioFeature,
    pub weight: f32,
    /// Use `1 - value` instead of the value
    #[serde(default)]
    pub inverted: bool,
}

impl FeatureWeight {
    fn new(feature: AudioFeature, weight: f32) -> Self {
        Self {
            feature,
            weight,
            inverted: false,
        }
    }

    fn inverted(feature: AudioFeature, weight: f32) -> Self {
        Self {
            feature,
            weight,
            inverted: true,
        }
    }
}

/// How a mood vector is compared with a track's projected vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Dot,
    Cosine,
}

impl Default for EngineConfig {
    fn default() -> Self {
        use AudioFeature::*;
        use MoodDimension::*;

        let label_groups: [(MoodDimension, &[&str]); 5] = [
            (
                Happy,
                &["admiration", "amusement", "approval", "gratitude", "joy", "love", "optimism", "pride"],
            ),
            (Energetic, &["excitement", "desire", "surprise", "curiosity"]),
            (Calm, &["neutral", "realization", "relief", "caring", "confusion"]),
            (Sad, &["sadness", "grief", "disappointment", "remorse", "embarrassment"]),
            (
                Intense,
                &["anger", "annoyance", "disapproval", "disgust", "fear", "nervousness"],
            ),
        ];
        let label_dimensions = label_groups
            .iter()
            .flat_map(|(dimension, labels)| labels.iter().map(move |l| (l.to_string(), *dimension)))
            .collect();

        let hint_table: [(&str, &[(MoodDimension, f32)]); 12] = [
            ("happy", &[(Happy, 1.0)]),
            ("sad", &[(Sad, 1.0)]),
            ("energetic", &[(Energetic, 1.0)]),
            ("calm", &[(Calm, 1.0)]),
            ("intense", &[(Intense, 1.0)]),
            ("angry", &[(Intense, 1.0)]),
            ("chill", &[(Calm, 0.8), (Happy, 0.2)]),
            ("relaxed", &[(Calm, 0.7), (Happy, 0.3)]),
            ("hype", &[(Energetic, 0.7), (Happy, 0.3)]),
            ("focus", &[(Calm, 0.9), (Energetic, 0.1)]),
            ("dark", &[(Intense, 0.5), (Sad, 0.5)]),
            ("romantic", &[(Happy, 0.5), (Calm, 0.5)]),
        ];
        let mood_hints = hint_table
            .iter()
            .map(|(hint, weights)| (hint.to_string(), weights.iter().copied().collect()))
            .collect();

        let mut projection = BTreeMap::new();
        projection.insert(
            Happy,
            vec![
                FeatureWeight::new(Valence, 0.60),
                FeatureWeight::new(Danceability, 0.25),
                FeatureWeight::new(Mode, 0.15),
            ],
        );
        projection.insert(
            Sad,
            vec![
                FeatureWeight::inverted(Valence, 0.55),
                FeatureWeight::inverted(Energy, 0.25),
                FeatureWeight::new(Acousticness, 0.20),
            ],
        );
        projection.insert(
            Energetic,
            vec![
                FeatureWeight::new(Energy, 0.50),
                FeatureWeight::new(Tempo, 0.25),
                FeatureWeight::new(Loudness, 0.15),
                FeatureWeight::new(Danceability, 0.10),
            ],
        );
        projection.insert(
            Calm,
            vec![
                FeatureWeight::inverted(Energy, 0.45),
                FeatureWeight::new(Acousticness, 0.30),
                FeatureWeight::inverted(Tempo, 0.15),
                FeatureWeight::new(Instrumentalness, 0.10),
            ],
        );
        projection.insert(
            Intense,
            vec![
                FeatureWeight::new(Energy, 0.40),
                FeatureWeight::inverted(Valence, 0.35),
                FeatureWeight::new(Loudness, 0.25),
            ],
        );

        Self {
            label_dimensions,
            mood_hints,
            projection,
            hint_weight: 0.3,
            artist_cap: Some(2),
            similarity: SimilarityMetric::Dot,
            default_length: 20,
        }
    }
}

impl EngineConfig {
    /// Load an engine configuration from a JSON file; missing fields take defaults
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config.normalized_keys())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.hint_weight) {
            return Err(Error::Config(format!(
                "hint_weight must be within 0.0..=1.0, got {}",
                self.hint_weight
            )));
        }
        if self.artist_cap == Some(0) {
            return Err(Error::Config(
                "artist_cap must be at least 1 (omit it to disable the cap)".to_string(),
            ));
        }
        if self.default_length == 0 {
            return Err(Error::Config("default_length must be positive".to_string()));
        }
        if self.label_dimensions.is_empty() {
            return Err(Error::Config("label_dimensions must not be empty".to_string()));
        }
        for (dimension, terms) in &self.projection {
            if let Some(term) = terms.iter().find(|t| !t.weight.is_finite() || t.weight < 0.0) {
                return Err(Error::Config(format!(
                    "projection weight for {dimension}/{:?} must be a non-negative number",
                    term.feature
                )));
            }
            let total: f32 = terms.iter().map(|t| t.weight).sum();
            if total > 1.0 + 1e-4 {
                return Err(Error::Config(format!(
                    "projection weights for {dimension} sum to {total}, expected at most 1.0"
                )));
            }
        }
        for (hint, weights) in &self.mood_hints {
            if weights.values().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(Error::Config(format!(
                    "mood hint '{hint}' has a negative or invalid weight"
                )));
            }
            if weights.values().sum::<f32>() <= 0.0 {
                return Err(Error::Config(format!(
                    "mood hint '{hint}' needs at least one positive weight"
                )));
            }
        }
        Ok(())
    }

    /// Mood dimension for a classifier label, ignoring case and surrounding space
    pub fn dimension_for(&self, label: &str) -> Option<MoodDimension> {
        lookup_folded(&self.label_dimensions, label).copied()
    }

    /// Canonical weights for a mood hint, ignoring case and surrounding space
    pub fn hint_weights(&self, hint: &str) -> Option<&BTreeMap<MoodDimension, f32>> {
        lookup_folded(&self.mood_hints, hint)
    }

    /// Lowercase table keys so lookups can be case-insensitive
    fn normalized_keys(self) -> Self {
        Self {
            label_dimensions: self
                .label_dimensions
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
            mood_hints: self
                .mood_hints
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
            ..self
        }
    }
}

/// Exact lookup on the folded key, then a scan for tables built with mixed-case keys
fn lookup_folded<'a, V>(table: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
    let folded = key.trim().to_lowercase();
    table.get(&folded).or_else(|| {
        table
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == folded)
            .map(|(_, v)| v)
    })
}
