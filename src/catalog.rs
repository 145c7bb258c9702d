use std::path::{Path, PathBuf};

use tracing::info;

use crate::client::{SpotifyClient, parse_playlist_id};
use crate::error::{Error, Result};
use crate::models::{CatalogRecord, TrackFeatures};
use crate::playlist::PlaylistDraft;

/// Where candidate tracks come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateCriteria {
    /// Every track in the local catalog
    LocalCatalog,
    /// Tracks of a Spotify playlist (URL, URI or id)
    RemotePlaylist(String),
}

/// Supplies candidate tracks and creates finished playlists remotely
#[cfg_attr(test, mockall::automock)]
pub trait CatalogGateway {
    fn fetch_candidates(&self, criteria: &CandidateCriteria) -> Result<Vec<TrackFeatures>>;

    /// Create the playlist remotely and return its identifier
    fn materialize_playlist(&self, draft: &PlaylistDraft) -> Result<String>;
}

/// Local catalog of analyzed tracks stored as a JSON array
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record, accepting flat and document-shaped entries
    pub fn load(&self) -> Result<Vec<TrackFeatures>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!("Cannot read catalog '{}': {e}", self.path.display()))
        })?;
        let records: Vec<CatalogRecord> = serde_json::from_str(&content)?;
        Ok(records.into_iter().map(TrackFeatures::from).collect())
    }

    /// Write tracks in the flat shape
    pub fn save(&self, tracks: &[TrackFeatures]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(tracks)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Gateway backed by the local JSON catalog and the Spotify Web API
pub struct SpotifyGateway {
    catalog: JsonCatalog,
    client: SpotifyClient,
    public: bool,
}

impl SpotifyGateway {
    pub fn new(catalog: JsonCatalog, client: SpotifyClient, public: bool) -> Self {
        Self {
            catalog,
            client,
            public,
        }
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }

    /// Fetch a remote playlist with audio features and store it as the local catalog
    pub fn import_playlist(&self, playlist: &str) -> Result<usize> {
        let tracks = self.fetch_candidates(&CandidateCriteria::RemotePlaylist(playlist.to_string()))?;
        self.catalog.save(&tracks)?;
        info!(
            tracks = tracks.len(),
            path = %self.catalog.path().display(),
            "Imported playlist into catalog"
        );
        Ok(tracks.len())
    }
}

impl CatalogGateway for SpotifyGateway {
    fn fetch_candidates(&self, criteria: &CandidateCriteria) -> Result<Vec<TrackFeatures>> {
        match criteria {
            CandidateCriteria::LocalCatalog => self.catalog.load(),
            CandidateCriteria::RemotePlaylist(playlist) => {
                let playlist_id = parse_playlist_id(playlist)?;
                let summaries = self.client.playlist_tracks(&playlist_id)?;
                self.client.audio_features(&summaries)
            }
        }
    }

    fn materialize_playlist(&self, draft: &PlaylistDraft) -> Result<String> {
        let user_id = self.client.current_user_id()?;
        let created = self.client.create_playlist(
            &user_id,
            &draft.name,
            draft.description.as_deref(),
            self.public,
        )?;
        self.client.add_tracks(&created.id, &draft.track_uris())?;
        info!(playlist_id = %created.id, tracks = draft.len(), "Playlist created");
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::scoring::tests::track;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("soundsmith-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_save_then_load_keeps_tracks() {
        let path = temp_path("catalog.json");
        let catalog = JsonCatalog::new(&path);
        let tracks = vec![track("a", "A", 0.3, 0.4), track("b", "B", 0.9, 0.1)];

        catalog.save(&tracks).unwrap();
        let loaded = catalog.load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, tracks);
    }

    #[test]
    fn test_load_mixed_record_shapes() {
        let path = temp_path("mixed.json");
        std::fs::write(
            &path,
            r#"[
                {"track_id": "f1", "track_name": "Flat", "artist_name": "A", "album_name": "X",
                 "danceability": 0.5, "energy": 0.5, "valence": 0.5, "tempo": 120.0, "loudness": -7.0},
                {"track_name": "Doc", "artist_name": "B", "album_name": "Y",
                 "analysis": {"danceability": 0.4, "energy": 0.6, "valence": 0.2, "tempo": 90.0, "loudness": -9.0},
                 "spotify": {"track_id": "d1"}}
            ]"#,
        )
        .unwrap();
        let loaded = JsonCatalog::new(&path).load().unwrap();
        std::fs::remove_file(&path).ok();

        let ids: Vec<&str> = loaded.iter().map(|t| t.track_id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "d1"]);
    }

    #[test]
    fn test_missing_catalog_is_a_config_error() {
        let result = JsonCatalog::new(temp_path("does-not-exist.json")).load();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
