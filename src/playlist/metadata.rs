use std::collections::HashSet;

use serde::Serialize;

use crate::models::TrackFeatures;

/// A chosen track inside a draft, with the data used to pick it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftTrack {
    pub track_id: String,
    pub uri: String,
    pub track_name: String,
    pub artist_name: String,
    pub score: f32,
    /// Zero-based position in the scored ranking
    pub rank: usize,
}

/// Playlist ready to be created remotely
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistDraft {
    pub name: String,
    pub description: Option<String>,
    pub tracks: Vec<DraftTrack>,
    pub target_length: usize,
    pub metadata: PlaylistMetadata,
}

impl PlaylistDraft {
    /// Ordered track identifiers
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.track_id.clone()).collect()
    }

    pub fn track_uris(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.uri.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Fewer unique tracks were available than requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartialPlaylistWarning {
    pub requested: usize,
    pub available: usize,
}

/// Assembler output: the draft plus a shortfall notice when it came up short
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledPlaylist {
    pub draft: PlaylistDraft,
    pub warning: Option<PartialPlaylistWarning>,
}

/// Summary of the playlist composition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistMetadata {
    pub total_duration_ms: u64,
    pub total_tracks: usize,
    pub average_tempo: f32,
    pub tempo_range: (u32, u32),
    pub artist_count: usize,
    pub average_score: f32,
    pub average_valence: f32,
    pub average_energy: f32,
}

impl PlaylistMetadata {
    /// Calculate metadata for the chosen tracks and their scores
    pub fn calculate(tracks: &[(&TrackFeatures, f32)]) -> Self {
        if tracks.is_empty() {
            return PlaylistMetadata {
                total_duration_ms: 0,
                total_tracks: 0,
                average_tempo: 0.0,
                tempo_range: (0, 0),
                artist_count: 0,
                average_score: 0.0,
                average_valence: 0.0,
                average_energy: 0.0,
            };
        }

        let count = tracks.len() as f32;
        let total_duration_ms = tracks.iter().map(|(t, _)| u64::from(t.duration_ms)).sum();

        let tempos: Vec<u32> = tracks
            .iter()
            .map(|(t, _)| t.tempo)
            .filter(|tempo| tempo.is_finite() && *tempo > 0.0)
            .map(|tempo| tempo.round() as u32)
            .collect();
        let average_tempo = if tempos.is_empty() {
            0.0
        } else {
            tempos.iter().sum::<u32>() as f32 / tempos.len() as f32
        };
        let tempo_range = match (tempos.iter().min(), tempos.iter().max()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => (0, 0),
        };

        let artist_count = tracks
            .iter()
            .map(|(t, _)| t.artist_name.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .len();

        PlaylistMetadata {
            total_duration_ms,
            total_tracks: tracks.len(),
            average_tempo,
            tempo_range,
            artist_count,
            average_score: tracks.iter().map(|(_, s)| s).sum::<f32>() / count,
            average_valence: tracks.iter().map(|(t, _)| t.valence).sum::<f32>() / count,
            average_energy: tracks.iter().map(|(t, _)| t.energy).sum::<f32>() / count,
        }
    }

    /// Total duration as (minutes, seconds)
    pub fn duration_minutes_seconds(&self) -> (u64, u64) {
        let secs = self.total_duration_ms / 1000;
        (secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::scoring::tests::track;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_metadata() {
        let metadata = PlaylistMetadata::calculate(&[]);
        assert_eq!(metadata.total_tracks, 0);
        assert_eq!(metadata.tempo_range, (0, 0));
    }

    #[test]
    fn test_metadata_summarizes_tracks() {
        let mut a = track("a", "Artist A", 0.8, 0.6);
        a.tempo = 100.0;
        a.duration_ms = 180_000;
        let mut b = track("b", "artist a ", 0.4, 0.2);
        b.tempo = 140.0;
        b.duration_ms = 95_000;
        let metadata = PlaylistMetadata::calculate(&[(&a, 0.9), (&b, 0.5)]);

        assert_eq!(metadata.total_tracks, 2);
        assert_eq!(metadata.total_duration_ms, 275_000);
        assert_eq!(metadata.duration_minutes_seconds(), (4, 35));
        assert_eq!(metadata.tempo_range, (100, 140));
        assert_relative_eq!(metadata.average_tempo, 120.0, epsilon = 1e-6);
        assert_eq!(metadata.artist_count, 1);
        assert_relative_eq!(metadata.average_score, 0.7, epsilon = 1e-6);
        assert_relative_eq!(metadata.average_valence, 0.6, epsilon = 1e-6);
        assert_relative_eq!(metadata.average_energy, 0.4, epsilon = 1e-6);
    }
}
