use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};
use ureq::Agent;
use urlencoding::encode;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    AudioFeaturesResponse, CreatedPlaylist, CurrentUser, PlaylistTracksPage, SnapshotResponse,
    TokenResponse, TrackFeatures, TrackSummary,
};

/// Spotify caps ids per audio-features call and URIs per add-tracks call
const MAX_IDS_PER_REQUEST: usize = 100;
const PLAYLIST_PAGE_SIZE: u32 = 100;
/// Refresh a client-credentials token this long before it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// A blocking Spotify Web API client.
///
/// Catalog reads use client-credentials tokens when a client id/secret is
/// configured, otherwise the user token. Playlist creation always needs
/// the user token.
pub struct SpotifyClient {
    agent: Agent,
    api_url: String,
    accounts_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    user_token: Option<String>,
    request_delay: Duration,
    app_token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Create a new client with configuration from environment
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();

        SpotifyClient {
            agent,
            api_url: config.spotify_api_url.trim_end_matches('/').to_string(),
            accounts_url: config.spotify_accounts_url.clone(),
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            user_token: config.spotify_access_token.clone(),
            request_delay: config.request_delay,
            app_token: Mutex::new(None),
        }
    }

    /// Check that a token can be obtained and the API answers
    pub fn ping(&self) -> Result<String> {
        if self.user_token.is_some() {
            let user = self.current_user()?;
            return Ok(user.display_name.unwrap_or(user.id));
        }
        self.read_token()?;
        Ok("client credentials".to_string())
    }

    /// Token for catalog reads
    fn read_token(&self) -> Result<String> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => self.client_credentials_token(id, secret),
            _ => self.user_token(),
        }
    }

    /// Token acting on behalf of the user
    fn user_token(&self) -> Result<String> {
        self.user_token.clone().ok_or_else(|| {
            Error::Config("SPOTIFY_ACCESS_TOKEN is required to act on a user's account".to_string())
        })
    }

    fn client_credentials_token(&self, id: &str, secret: &str) -> Result<String> {
        let mut cached = self
            .app_token
            .lock()
            .map_err(|_| Error::RemoteService("token cache lock poisoned".to_string()))?;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting client-credentials token");
        let basic = STANDARD.encode(format!("{id}:{secret}"));
        let response = self
            .agent
            .post(&self.accounts_url)
            .set("Authorization", &format!("Basic {basic}"))
            .send_form(&[("grant_type", "client_credentials")])?;
        let token: TokenResponse = response
            .into_json()
            .map_err(|e| Error::RemoteService(format!("Failed to parse token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {token}"))
            .call()?;
        response
            .into_json()
            .map_err(|e| Error::RemoteService(format!("Failed to parse JSON response from {url}: {e}")))
    }

    fn post_json<T: DeserializeOwned>(&self, url: &str, token: &str, body: serde_json::Value) -> Result<T> {
        debug!(url = %url, "POST");
        let response = self
            .agent
            .post(url)
            .set("Authorization", &format!("Bearer {token}"))
            .send_json(body)?;
        response
            .into_json()
            .map_err(|e| Error::RemoteService(format!("Failed to parse JSON response from {url}: {e}")))
    }

    fn pause(&self) {
        if !self.request_delay.is_zero() {
            std::thread::sleep(self.request_delay);
        }
    }

    /// Fetch every track of a playlist, following pagination
    pub fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackSummary>> {
        let token = self.read_token()?;
        let mut url = format!(
            "{}/playlists/{}/tracks?limit={}&offset=0",
            self.api_url,
            encode(playlist_id),
            PLAYLIST_PAGE_SIZE
        );

        let mut tracks = Vec::new();
        let mut pages = 0;
        loop {
            let page: PlaylistTracksPage = self.get_json(&url, &token)?;
            pages += 1;
            let items = page.items.len();
            tracks.extend(
                page.items
                    .iter()
                    .filter_map(|item| item.track.as_ref())
                    .filter_map(|track| track.summary()),
            );
            debug!(page = pages, items, total = page.total, "Fetched playlist page");

            match page.next {
                Some(next) => {
                    url = next;
                    self.pause();
                }
                None => break,
            }
        }

        info!(playlist_id = %playlist_id, tracks = tracks.len(), pages, "Fetched playlist tracks");
        Ok(tracks)
    }

    /// Attach audio features to tracks; tracks Spotify has no analysis for are skipped
    pub fn audio_features(&self, tracks: &[TrackSummary]) -> Result<Vec<TrackFeatures>> {
        let token = self.read_token()?;
        let mut detailed = Vec::with_capacity(tracks.len());

        for (index, chunk) in tracks.chunks(MAX_IDS_PER_REQUEST).enumerate() {
            if index > 0 {
                self.pause();
            }
            let ids = chunk
                .iter()
                .map(|t| t.track_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let url = format!("{}/audio-features?ids={}", self.api_url, encode(&ids));
            let response: AudioFeaturesResponse = self.get_json(&url, &token)?;

            for (summary, features) in chunk.iter().zip(response.audio_features.iter()) {
                match features {
                    Some(features) => detailed.push(TrackFeatures::from_parts(summary, features)),
                    None => warn!(track_id = %summary.track_id, "No audio features, skipping track"),
                }
            }
        }

        Ok(detailed)
    }

    pub fn current_user(&self) -> Result<CurrentUser> {
        let token = self.user_token()?;
        self.get_json(&format!("{}/me", self.api_url), &token)
    }

    pub fn current_user_id(&self) -> Result<String> {
        Ok(self.current_user()?.id)
    }

    /// Create an empty playlist on the user's account and return its id
    pub fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
        public: bool,
    ) -> Result<CreatedPlaylist> {
        let token = self.user_token()?;
        let url = format!("{}/users/{}/playlists", self.api_url, encode(user_id));
        let mut body = json!({ "name": name, "public": public });
        if let Some(description) = description {
            body["description"] = json!(description);
        }

        info!(name = %name, "Creating playlist");
        let created: CreatedPlaylist = self.post_json(&url, &token, body)?;
        Ok(created)
    }

    /// Append tracks to a playlist in batches, returning the last snapshot id
    pub fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<Option<String>> {
        let token = self.user_token()?;
        let url = format!("{}/playlists/{}/tracks", self.api_url, encode(playlist_id));

        let mut snapshot = None;
        for (index, chunk) in uris.chunks(MAX_IDS_PER_REQUEST).enumerate() {
            if index > 0 {
                self.pause();
            }
            let response: SnapshotResponse = self.post_json(&url, &token, json!({ "uris": chunk }))?;
            snapshot = Some(response.snapshot_id);
        }
        Ok(snapshot)
    }
}

/// Extract a playlist id from a share URL, a `spotify:playlist:` URI or a bare id
pub fn parse_playlist_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let candidate = if let Some(rest) = trimmed.strip_prefix("spotify:playlist:") {
        rest
    } else if let Some(pos) = trimmed.find("/playlist/") {
        let rest = &trimmed[pos + "/playlist/".len()..];
        rest.split(['?', '/', '#']).next().unwrap_or_default()
    } else {
        trimmed
    };

    if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(candidate.to_string())
    } else {
        Err(Error::InvalidInput(format!("'{input}' is not a Spotify playlist URL or id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_config() -> Config {
        Config::from_lookup(|key| match key {
            "SPOTIFY_ACCESS_TOKEN" => Some("user-token".to_string()),
            "SPOTIFY_API_URL" => Some("http://localhost:1/v1/".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_playlist_id_forms() {
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/37i9dQZF1EIgNoWOvbnUCk?si=e50decd2070d4620")
                .unwrap(),
            "37i9dQZF1EIgNoWOvbnUCk"
        );
        assert_eq!(
            parse_playlist_id("spotify:playlist:37i9dQZF1EIgNoWOvbnUCk").unwrap(),
            "37i9dQZF1EIgNoWOvbnUCk"
        );
        assert_eq!(parse_playlist_id(" 37i9dQZF1EIgNoWOvbnUCk ").unwrap(), "37i9dQZF1EIgNoWOvbnUCk");
    }

    #[test]
    fn test_parse_playlist_id_rejects_garbage() {
        assert!(matches!(parse_playlist_id(""), Err(Error::InvalidInput(_))));
        assert!(matches!(
            parse_playlist_id("https://open.spotify.com/album/"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(parse_playlist_id("not a playlist"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_user_token_used_for_reads_without_client_credentials() {
        let client = SpotifyClient::new(&user_config());
        assert_eq!(client.read_token().unwrap(), "user-token");
        assert_eq!(client.api_url, "http://localhost:1/v1");
    }

    #[test]
    fn test_user_actions_need_user_token() {
        let config = Config::from_lookup(|key| match key {
            "SPOTIFY_CLIENT_ID" => Some("id".to_string()),
            "SPOTIFY_CLIENT_SECRET" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        let client = SpotifyClient::new(&config);
        assert!(matches!(client.current_user(), Err(Error::Config(_))));
        assert!(matches!(
            client.add_tracks("pl", &["spotify:track:1".to_string()]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_cached_client_token_is_reused() {
        let config = Config::from_lookup(|key| match key {
            "SPOTIFY_CLIENT_ID" => Some("id".to_string()),
            "SPOTIFY_CLIENT_SECRET" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        let client = SpotifyClient::new(&config);
        *client.app_token.lock().unwrap() = Some(CachedToken {
            access_token: "cached".to_string(),
            expires_at: Instant::now() + Duration::from_secs(600),
        });
        assert_eq!(client.read_token().unwrap(), "cached");
    }

    #[test]
    fn test_playlist_page_parsing() {
        let json = r#"{
            "items": [
                {"track": {"id": "t1", "name": "One", "artists": [{"name": "A"}, {"name": "B"}], "album": {"name": "X"}}},
                {"track": null},
                {"track": {"id": null, "name": "Local", "artists": [], "album": {"name": "Y"}}}
            ],
            "total": 3,
            "next": null
        }"#;
        let page: PlaylistTracksPage = serde_json::from_str(json).unwrap();
        let summaries: Vec<TrackSummary> = page
            .items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .filter_map(|track| track.summary())
            .collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].artist_name, "A");
    }
}
