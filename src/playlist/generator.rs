use std::sync::Arc;

use tracing::{debug, info};

use super::assembler::PlaylistAssembler;
use super::mood::{MoodVector, MoodVectorBuilder};
use super::scoring::TrackScoring;
use super::utils::PlaylistNaming;
use super::{AssembledPlaylist, EngineConfig};
use crate::catalog::{CandidateCriteria, CatalogGateway};
use crate::classifier::{EmotionClassifier, EmotionModel};
use crate::error::Result;
use crate::models::{EmotionScore, TrackFeatures};

const DEFAULT_NAME_BASE: &str = "SoundSmith";

/// What the user asked for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistRequest {
    pub keywords: String,
    pub description: Option<String>,
    /// Categorical mood hint such as "Happy"
    pub mood: Option<String>,
    pub target_length: Option<usize>,
    pub name: Option<String>,
}

impl PlaylistRequest {
    /// Keywords and description joined with ". ", blank parts left out
    pub fn classification_text(&self) -> String {
        [Some(self.keywords.as_str()), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(". ")
    }
}

/// Generator output with the classifier scores that shaped it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlaylist {
    pub assembled: AssembledPlaylist,
    /// `None` when the classifier was skipped because only a hint was given
    pub emotions: Option<Vec<EmotionScore>>,
}

/// A playlist that was created remotely
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPlaylist {
    pub playlist_id: String,
    pub assembled: AssembledPlaylist,
}

/// Mood-to-playlist pipeline: classify, build the mood vector, score, assemble.
///
/// Holds only read-only state, so one generator can serve concurrent requests.
pub struct MoodPlaylistGenerator<M> {
    classifier: EmotionClassifier<M>,
    config: Arc<EngineConfig>,
}

impl<M: EmotionModel> MoodPlaylistGenerator<M> {
    pub fn new(model: M, config: Arc<EngineConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: EmotionClassifier::new(model),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mood vector for free text and an optional hint.
    ///
    /// Blank text with a hint skips the classifier and yields the hint's vector.
    pub fn mood_for(&self, text: &str, hint: Option<&str>) -> Result<MoodVector> {
        self.classify_mood(text, hint).map(|(mood, _)| mood)
    }

    fn classify_mood(
        &self,
        text: &str,
        hint: Option<&str>,
    ) -> Result<(MoodVector, Option<Vec<EmotionScore>>)> {
        let has_hint = hint.is_some_and(|h| !h.trim().is_empty());
        let emotions = if text.trim().is_empty() && has_hint {
            None
        } else {
            Some(self.classifier.classify(text)?)
        };
        let mood = MoodVectorBuilder::new(&self.config)
            .build(emotions.as_deref().unwrap_or_default(), hint)?;
        Ok((mood, emotions))
    }

    /// Build a playlist draft for the request from the given candidates
    pub fn generate(
        &self,
        request: &PlaylistRequest,
        candidates: &[TrackFeatures],
    ) -> Result<AssembledPlaylist> {
        self.generate_detailed(request, candidates)
            .map(|generated| generated.assembled)
    }

    /// Like `generate`, also returning the classifier scores from the single classification
    pub fn generate_detailed(
        &self,
        request: &PlaylistRequest,
        candidates: &[TrackFeatures],
    ) -> Result<GeneratedPlaylist> {
        let text = request.classification_text();
        let (mood, emotions) = self.classify_mood(&text, request.mood.as_deref())?;
        debug!(mood = %PlaylistNaming::describe_mood(&mood), "Built mood vector");

        let scored = TrackScoring::score(&mood, candidates, &self.config)?;

        let target_length = request.target_length.unwrap_or(self.config.default_length);
        let name = match &request.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => PlaylistNaming::generate_playlist_name(DEFAULT_NAME_BASE, &mood),
        };
        let description = match &request.description {
            Some(description) if !description.trim().is_empty() => description.trim().to_string(),
            _ => PlaylistNaming::describe_mood(&mood),
        };

        let assembled = PlaylistAssembler::new(self.config.artist_cap).assemble(
            &scored,
            target_length,
            &name,
            Some(description.as_str()),
        )?;
        info!(
            name = %assembled.draft.name,
            tracks = assembled.draft.len(),
            candidates = candidates.len(),
            "Generated playlist"
        );
        Ok(GeneratedPlaylist {
            assembled,
            emotions,
        })
    }

    /// Fetch candidates, generate the playlist and create it through the gateway
    pub fn generate_and_publish<G: CatalogGateway>(
        &self,
        request: &PlaylistRequest,
        criteria: &CandidateCriteria,
        gateway: &G,
    ) -> Result<PublishedPlaylist> {
        let candidates = gateway.fetch_candidates(criteria)?;
        let assembled = self.generate(request, &candidates)?;
        let playlist_id = gateway.materialize_playlist(&assembled.draft)?;
        Ok(PublishedPlaylist {
            playlist_id,
            assembled,
        })
    }
}
