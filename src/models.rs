use serde::{Deserialize, Serialize};

/// One label produced by the emotion classifier with its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f32,
}

impl EmotionScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Audio analysis plus identifying metadata for a catalog track.
///
/// Field names follow the flat track-details JSON written by the import
/// tool (identity fields next to Spotify's audio-feature fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub danceability: f32,
    pub energy: f32,
    pub valence: f32,
    pub tempo: f32,    // BPM
    pub loudness: f32, // dB, typically -60..0
    #[serde(default)]
    pub speechiness: f32,
    #[serde(default)]
    pub acousticness: f32,
    #[serde(default)]
    pub instrumentalness: f32,
    #[serde(default)]
    pub liveness: f32,
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub mode: i32, // 1 = major, 0 = minor
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub time_signature: u32,
}

impl TrackFeatures {
    /// Combine a playlist entry with the audio features Spotify returned for it
    pub fn from_parts(summary: &TrackSummary, features: &AudioFeatures) -> Self {
        Self {
            track_id: summary.track_id.clone(),
            track_name: summary.track_name.clone(),
            artist_name: summary.artist_name.clone(),
            album_name: summary.album_name.clone(),
            uri: features.uri.clone(),
            danceability: features.danceability,
            energy: features.energy,
            valence: features.valence,
            tempo: features.tempo,
            loudness: features.loudness,
            speechiness: features.speechiness,
            acousticness: features.acousticness,
            instrumentalness: features.instrumentalness,
            liveness: features.liveness,
            key: features.key,
            mode: features.mode,
            duration_ms: features.duration_ms,
            time_signature: features.time_signature,
        }
    }

    /// Spotify URI for this track, derived from the id when none was stored
    pub fn spotify_uri(&self) -> String {
        self.uri
            .clone()
            .unwrap_or_else(|| format!("spotify:track:{}", self.track_id))
    }
}

/// Stored track document: metadata with nested `analysis` and `spotify` objects
#[derive(Debug, Clone, Deserialize)]
pub struct TrackDocument {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub analysis: AudioFeatures,
    pub spotify: SpotifyRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyRef {
    pub track_id: String,
    pub uri: Option<String>,
}

/// A catalog file entry in either of the supported shapes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogRecord {
    Flat(TrackFeatures),
    Document(TrackDocument),
}

impl From<CatalogRecord> for TrackFeatures {
    fn from(record: CatalogRecord) -> Self {
        match record {
            CatalogRecord::Flat(track) => track,
            CatalogRecord::Document(doc) => {
                let summary = TrackSummary {
                    track_id: doc.spotify.track_id.clone(),
                    track_name: doc.track_name,
                    artist_name: doc.artist_name,
                    album_name: doc.album_name,
                };
                let mut track = TrackFeatures::from_parts(&summary, &doc.analysis);
                if doc.spotify.uri.is_some() {
                    track.uri = doc.spotify.uri;
                }
                track
            }
        }
    }
}

/// Identity of a playlist entry before audio features are attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
}

/// Audio features object from the Spotify Web API
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeatures {
    pub id: Option<String>,
    pub uri: Option<String>,
    pub danceability: f32,
    pub energy: f32,
    pub valence: f32,
    pub tempo: f32,
    pub loudness: f32,
    #[serde(default)]
    pub speechiness: f32,
    #[serde(default)]
    pub acousticness: f32,
    #[serde(default)]
    pub instrumentalness: f32,
    #[serde(default)]
    pub liveness: f32,
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub mode: i32,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub time_signature: u32,
}

/// Response structure for GET /audio-features
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// Response structure for GET /playlists/{id}/tracks
#[derive(Debug, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistItem>,
    pub total: u32,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>, // local files have no id
    pub name: String,
    pub artists: Vec<SpotifyArtist>,
    pub album: SpotifyAlbum,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
}

impl SpotifyTrack {
    /// Playlist entry identity, using the first credited artist
    pub fn summary(&self) -> Option<TrackSummary> {
        let track_id = self.id.clone()?;
        Some(TrackSummary {
            track_id,
            track_name: self.name.clone(),
            artist_name: self
                .artists
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            album_name: self.album.name.clone(),
        })
    }
}

/// Response structure for GET /me
#[derive(Debug, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Response structure for POST /users/{id}/playlists
#[derive(Debug, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Response structure for POST /playlists/{id}/tracks
#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// Response structure for the client-credentials token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Inference endpoint output: nested per input, flat, or an error object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Nested(Vec<Vec<EmotionScore>>),
    Flat(Vec<EmotionScore>),
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_catalog_record_ignores_extra_fields() {
        let json = r#"{
            "track_id": "1234",
            "track_name": "Song",
            "artist_name": "Artist",
            "album_name": "Album",
            "danceability": 0.393,
            "energy": 0.588,
            "key": 9,
            "loudness": -6.68,
            "mode": 0,
            "speechiness": 0.0613,
            "acousticness": 0.345,
            "instrumentalness": 0,
            "liveness": 0.134,
            "valence": 0.728,
            "tempo": 203.145,
            "type": "audio_features",
            "analysis_url": "https://api.spotify.com/v1/audio-analysis/1234",
            "duration_ms": 186333,
            "time_signature": 4
        }"#;
        let record: CatalogRecord = serde_json::from_str(json).unwrap();
        let track = TrackFeatures::from(record);
        assert_eq!(track.track_id, "1234");
        assert_eq!(track.key, 9);
        assert_eq!(track.duration_ms, 186333);
        assert_eq!(track.spotify_uri(), "spotify:track:1234");
    }

    #[test]
    fn test_document_catalog_record() {
        let json = r#"{
            "_id": "abc",
            "track_name": "test",
            "artist_name": "test artist",
            "album_name": "test album",
            "analysis": {
                "danceability": 0.393, "energy": 0.588, "key": 9, "loudness": -6.68,
                "mode": 0, "speechiness": 0.0613, "acousticness": 0.345,
                "instrumentalness": 0, "liveness": 0.134, "valence": 0.728,
                "tempo": 203.145, "duration_ms": 186333, "time_signature": 4
            },
            "spotify": {
                "track_id": "1234",
                "uri": "spotify:track:1234",
                "track_href": "https://api.spotify.com/v1/tracks/1234"
            }
        }"#;
        let record: CatalogRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record, CatalogRecord::Document(_)));
        let track = TrackFeatures::from(record);
        assert_eq!(track.track_id, "1234");
        assert_eq!(track.artist_name, "test artist");
        assert_eq!(track.uri.as_deref(), Some("spotify:track:1234"));
    }

    #[test]
    fn test_inference_response_shapes() {
        let nested: InferenceResponse =
            serde_json::from_str(r#"[[{"label":"joy","score":0.8},{"label":"neutral","score":0.1}]]"#)
                .unwrap();
        assert!(matches!(nested, InferenceResponse::Nested(ref v) if v[0].len() == 2));

        let flat: InferenceResponse =
            serde_json::from_str(r#"[{"label":"joy","score":0.8}]"#).unwrap();
        assert!(matches!(flat, InferenceResponse::Flat(ref v) if v.len() == 1));

        let failed: InferenceResponse =
            serde_json::from_str(r#"{"error":"Model is loading","estimated_time":20.0}"#).unwrap();
        assert!(matches!(failed, InferenceResponse::Failed { .. }));
    }

    #[test]
    fn test_playlist_item_without_id_has_no_summary() {
        let json = r#"{"id": null, "name": "local file", "artists": [], "album": {"name": "x"}}"#;
        let track: SpotifyTrack = serde_json::from_str(json).unwrap();
        assert!(track.summary().is_none());
    }
}
