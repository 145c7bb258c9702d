use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{AudioFeature, EngineConfig, MoodDimension, MoodVector, SimilarityMetric};
use crate::error::{Error, Result};
use crate::models::TrackFeatures;

const TEMPO_FLOOR_BPM: f32 = 50.0;
const TEMPO_SPAN_BPM: f32 = 150.0;
const LOUDNESS_FLOOR_DB: f32 = -60.0;

/// A candidate track with its fit against the requested mood
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack<'a> {
    pub track: &'a TrackFeatures,
    pub score: f32,
}

/// Total order for scored tracks: descending score, then ascending track id
pub fn rank_order(a: &ScoredTrack<'_>, b: &ScoredTrack<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.track.track_id.cmp(&b.track.track_id))
}

/// Scoring of candidate tracks against a mood vector.
///
/// Each track is projected into mood-dimension space with the configured
/// feature weights (valence and danceability drive "happy", energy and tempo
/// drive "energetic", and so on). The fit is the dot product of the mood
/// vector with that projection, or their cosine similarity. Both stay within
/// [0, 1] because every coordinate is.
pub struct TrackScoring;

impl TrackScoring {
    /// Score and rank every candidate; one result per candidate
    pub fn score<'a>(
        mood: &MoodVector,
        candidates: &'a [TrackFeatures],
        config: &EngineConfig,
    ) -> Result<Vec<ScoredTrack<'a>>> {
        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }

        let mut scored: Vec<ScoredTrack<'a>> = candidates
            .iter()
            .map(|track| ScoredTrack {
                track,
                score: Self::fit_score(mood, track, config),
            })
            .collect();
        scored.sort_by(rank_order);
        Ok(scored)
    }

    /// Fit of a single track against the mood, within [0, 1]
    pub fn fit_score(mood: &MoodVector, track: &TrackFeatures, config: &EngineConfig) -> f32 {
        let projected = Self::project(track, config);
        let dot: f32 = mood
            .iter()
            .map(|(dimension, weight)| weight * projected.get(&dimension).copied().unwrap_or(0.0))
            .sum();

        let score = match config.similarity {
            SimilarityMetric::Dot => dot,
            SimilarityMetric::Cosine => {
                let mood_norm = mood.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
                let track_norm = projected.values().map(|v| v * v).sum::<f32>().sqrt();
                if mood_norm > 0.0 && track_norm > 0.0 {
                    dot / (mood_norm * track_norm)
                } else {
                    0.0
                }
            }
        };
        if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
    }

    /// Project a track's audio features onto every configured mood dimension
    pub fn project(track: &TrackFeatures, config: &EngineConfig) -> BTreeMap<MoodDimension, f32> {
        config
            .projection
            .iter()
            .map(|(dimension, terms)| {
                let value: f32 = terms
                    .iter()
                    .map(|term| {
                        let v = Self::normalized_feature(track, term.feature);
                        let v = if term.inverted { 1.0 - v } else { v };
                        v * term.weight
                    })
                    .sum();
                (*dimension, value.clamp(0.0, 1.0))
            })
            .collect()
    }

    /// Read an audio feature scaled to [0, 1]
    pub fn normalized_feature(track: &TrackFeatures, feature: AudioFeature) -> f32 {
        let raw = match feature {
            AudioFeature::Danceability => track.danceability,
            AudioFeature::Energy => track.energy,
            AudioFeature::Valence => track.valence,
            AudioFeature::Speechiness => track.speechiness,
            AudioFeature::Acousticness => track.acousticness,
            AudioFeature::Instrumentalness => track.instrumentalness,
            AudioFeature::Liveness => track.liveness,
            AudioFeature::Tempo => (track.tempo - TEMPO_FLOOR_BPM) / TEMPO_SPAN_BPM,
            AudioFeature::Loudness => (track.loudness - LOUDNESS_FLOOR_DB) / -LOUDNESS_FLOOR_DB,
            AudioFeature::Mode => {
                if track.mode == 1 {
                    1.0
                } else {
                    0.0
                }
            }
        };
        if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    pub(crate) fn track(id: &str, artist: &str, valence: f32, energy: f32) -> TrackFeatures {
        TrackFeatures {
            track_id: id.to_string(),
            track_name: format!("Track {id}"),
            artist_name: artist.to_string(),
            album_name: "Album".to_string(),
            uri: None,
            danceability: 0.5,
            energy,
            valence,
            tempo: 120.0,
            loudness: -8.0,
            speechiness: 0.05,
            acousticness: 0.2,
            instrumentalness: 0.0,
            liveness: 0.1,
            key: 0,
            mode: 1,
            duration_ms: 200_000,
            time_signature: 4,
        }
    }

    fn mood(pairs: &[(MoodDimension, f32)]) -> MoodVector {
        MoodVector::from_weights(pairs.iter().copied().collect()).unwrap()
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let config = EngineConfig::default();
        let result = TrackScoring::score(&mood(&[(MoodDimension::Happy, 1.0)]), &[], &config);
        assert!(matches!(result, Err(Error::NoCandidates)));
    }

    #[test]
    fn test_one_result_per_candidate_sorted_descending() {
        let config = EngineConfig::default();
        let candidates = vec![
            track("a", "A", 0.2, 0.3),
            track("b", "B", 0.9, 0.8),
            track("c", "C", 0.5, 0.5),
            track("d", "D", 0.9, 0.8),
        ];
        let scored =
            TrackScoring::score(&mood(&[(MoodDimension::Happy, 1.0)]), &candidates, &config).unwrap();

        assert_eq!(scored.len(), candidates.len());
        for pair in scored.windows(2) {
            assert_ne!(rank_order(&pair[0], &pair[1]), Ordering::Greater);
        }
        let ids: Vec<&str> = scored.iter().map(|s| s.track.track_id.as_str()).collect();
        // b and d tie and fall back to id order
        assert_eq!(ids, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_happy_mood_prefers_high_valence() {
        let config = EngineConfig::default();
        let candidates = vec![track("sad", "X", 0.1, 0.5), track("glad", "Y", 0.95, 0.5)];
        let scored =
            TrackScoring::score(&mood(&[(MoodDimension::Happy, 1.0)]), &candidates, &config).unwrap();
        assert_eq!(scored[0].track.track_id, "glad");

        let scored =
            TrackScoring::score(&mood(&[(MoodDimension::Sad, 1.0)]), &candidates, &config).unwrap();
        assert_eq!(scored[0].track.track_id, "sad");
    }

    #[test]
    fn test_calm_mood_prefers_low_energy() {
        let config = EngineConfig::default();
        let mut quiet = track("quiet", "X", 0.5, 0.1);
        quiet.acousticness = 0.9;
        quiet.tempo = 70.0;
        let loud = track("loud", "Y", 0.5, 0.95);
        let candidates = vec![loud, quiet];
        let scored =
            TrackScoring::score(&mood(&[(MoodDimension::Calm, 1.0)]), &candidates, &config).unwrap();
        assert_eq!(scored[0].track.track_id, "quiet");
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let config = EngineConfig::default();
        let mut extreme = track("x", "X", 1.0, 1.0);
        extreme.tempo = 400.0;
        extreme.loudness = 10.0;
        extreme.danceability = f32::NAN;
        let candidates = vec![extreme, track("y", "Y", 0.0, 0.0)];
        for metric in [SimilarityMetric::Dot, SimilarityMetric::Cosine] {
            let config = EngineConfig {
                similarity: metric,
                ..config.clone()
            };
            let all = mood(&[
                (MoodDimension::Happy, 0.2),
                (MoodDimension::Energetic, 0.2),
                (MoodDimension::Intense, 0.6),
            ]);
            for scored in TrackScoring::score(&all, &candidates, &config).unwrap() {
                assert!((0.0..=1.0).contains(&scored.score), "score {}", scored.score);
            }
        }
    }

    #[test]
    fn test_feature_normalization() {
        let mut t = track("n", "N", 0.5, 0.5);
        t.tempo = 125.0;
        t.loudness = -30.0;
        t.mode = 0;
        assert_abs_diff_eq!(TrackScoring::normalized_feature(&t, AudioFeature::Tempo), 0.5);
        assert_abs_diff_eq!(TrackScoring::normalized_feature(&t, AudioFeature::Loudness), 0.5);
        assert_eq!(TrackScoring::normalized_feature(&t, AudioFeature::Mode), 0.0);

        t.tempo = 20.0;
        assert_eq!(TrackScoring::normalized_feature(&t, AudioFeature::Tempo), 0.0);
    }

    #[test]
    fn test_dot_score_matches_hand_computation() {
        let config = EngineConfig::default();
        let t = track("h", "H", 0.8, 0.5);
        // happy = 0.6 * 0.8 + 0.25 * 0.5 + 0.15 * 1.0
        let score = TrackScoring::fit_score(&mood(&[(MoodDimension::Happy, 1.0)]), &t, &config);
        assert_abs_diff_eq!(score, 0.755, epsilon = 1e-5);
    }

    #[test]
    fn test_cosine_ignores_projection_magnitude() {
        let config = EngineConfig {
            similarity: SimilarityMetric::Cosine,
            ..EngineConfig::default()
        };
        let t = track("c", "C", 0.8, 0.5);
        let projected = TrackScoring::project(&t, &config);
        let norm = projected.values().map(|v| v * v).sum::<f32>().sqrt();
        let score = TrackScoring::fit_score(&mood(&[(MoodDimension::Happy, 1.0)]), &t, &config);
        assert_abs_diff_eq!(score, projected[&MoodDimension::Happy] / norm, epsilon = 1e-5);
    }
}
