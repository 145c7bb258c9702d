use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::scoring::{ScoredTrack, rank_order};
use super::{AssembledPlaylist, DraftTrack, PartialPlaylistWarning, PlaylistDraft, PlaylistMetadata};
use crate::error::{Error, Result};

/// Picks the final track list from a ranked candidate pool
pub struct PlaylistAssembler {
    artist_cap: Option<usize>,
}

impl PlaylistAssembler {
    pub fn new(artist_cap: Option<usize>) -> Self {
        Self { artist_cap }
    }

    /// Take the best tracks in ranked order, skipping repeated ids and
    /// artists that already hit the cap.
    ///
    /// `scored` is ranked with `rank_order` first, so any input order gives
    /// the same draft. Coming up short is reported through the warning, not
    /// as an error.
    pub fn assemble(
        &self,
        scored: &[ScoredTrack<'_>],
        target_length: usize,
        name: &str,
        description: Option<&str>,
    ) -> Result<AssembledPlaylist> {
        if target_length == 0 {
            return Err(Error::InvalidLength(target_length));
        }

        let mut ranked: Vec<&ScoredTrack<'_>> = scored.iter().collect();
        ranked.sort_by(|a, b| rank_order(a, b));

        let mut chosen: Vec<(usize, &ScoredTrack<'_>)> = Vec::with_capacity(target_length);
        let mut seen_ids: HashSet<&str> = HashSet::new();
        let mut per_artist: HashMap<String, usize> = HashMap::new();
        let mut unique_available = 0;

        for (rank, candidate) in ranked.into_iter().enumerate() {
            if !seen_ids.insert(candidate.track.track_id.as_str()) {
                continue;
            }
            unique_available += 1;
            if chosen.len() >= target_length {
                continue;
            }

            let artist = candidate.track.artist_name.trim().to_lowercase();
            let artist_tracks = per_artist.entry(artist).or_insert(0);
            if self.artist_cap.is_some_and(|cap| *artist_tracks >= cap) {
                continue;
            }
            *artist_tracks += 1;
            chosen.push((rank, candidate));
        }

        let warning = if chosen.len() < target_length {
            warn!(
                requested = target_length,
                available = chosen.len(),
                unique_candidates = unique_available,
                "Not enough tracks to fill the playlist"
            );
            Some(PartialPlaylistWarning {
                requested: target_length,
                available: chosen.len(),
            })
        } else {
            None
        };

        let metadata = PlaylistMetadata::calculate(
            &chosen
                .iter()
                .map(|(_, s)| (s.track, s.score))
                .collect::<Vec<_>>(),
        );

        let tracks = chosen
            .into_iter()
            .map(|(rank, s)| DraftTrack {
                track_id: s.track.track_id.clone(),
                uri: s.track.spotify_uri(),
                track_name: s.track.track_name.clone(),
                artist_name: s.track.artist_name.clone(),
                score: s.score,
                rank,
            })
            .collect();

        Ok(AssembledPlaylist {
            draft: PlaylistDraft {
                name: name.to_string(),
                description: description.map(str::to_string),
                tracks,
                target_length,
                metadata,
            },
            warning,
        })
    }
}
