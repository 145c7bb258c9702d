use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_CLASSIFIER_MODEL: &str = "SamLowe/roberta-base-go_emotions";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    /// User OAuth token forwarded by the front end, needed to create playlists
    pub spotify_access_token: Option<String>,
    pub spotify_api_url: String,
    pub spotify_accounts_url: String,
    pub huggingface_token: Option<String>,
    pub classifier_model: String,
    pub inference_url: String,
    pub catalog_path: PathBuf,
    pub request_timeout: Duration,
    pub request_delay: Duration,
    pub public_playlists: bool,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    /// Build the configuration from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let spotify_client_id = get("SPOTIFY_CLIENT_ID");
        let spotify_client_secret = get("SPOTIFY_CLIENT_SECRET");
        let spotify_access_token = get("SPOTIFY_ACCESS_TOKEN");

        if spotify_client_id.is_some() != spotify_client_secret.is_some() {
            return Err(Error::Config(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set together".to_string(),
            ));
        }
        let request_timeout = Duration::from_secs(parse_number(&get, "REQUEST_TIMEOUT_SECS", 30)?);
        if request_timeout.is_zero() {
            return Err(Error::Config("REQUEST_TIMEOUT_SECS must be positive".to_string()));
        }
        let request_delay = Duration::from_millis(parse_number(&get, "SPOTIFY_REQUEST_DELAY_MS", 500)?);

        let public_playlists = match get("PLAYLIST_PUBLIC").as_deref() {
            None => true,
            Some(v) => match v.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(Error::Config(format!(
                        "PLAYLIST_PUBLIC must be true or false, got '{other}'"
                    )));
                }
            },
        };

        Ok(Config {
            spotify_client_id,
            spotify_client_secret,
            spotify_access_token,
            spotify_api_url: get("SPOTIFY_API_URL")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string()),
            spotify_accounts_url: get("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_ACCOUNTS_URL.to_string()),
            huggingface_token: get("HF_API_TOKEN"),
            classifier_model: get("CLASSIFIER_MODEL")
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
            inference_url: get("INFERENCE_URL").unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            catalog_path: get("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("catalog.json")),
            request_timeout,
            request_delay,
            public_playlists,
        })
    }

    /// Fail unless a Spotify client pair or access token is configured.
    ///
    /// Checked by the commands that talk to Spotify, so offline runs work without credentials.
    pub fn require_spotify_credentials(&self) -> Result<()> {
        if self.spotify_client_id.is_none() && self.spotify_access_token.is_none() {
            return Err(Error::Config(
                "set SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET or SPOTIFY_ACCESS_TOKEN".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<G>(get: &G, key: &str, default: u64) -> Result<u64>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_client_credentials() {
        let config = Config::from_lookup(lookup(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.spotify_api_url, "https://api.spotify.com/v1");
        assert_eq!(config.classifier_model, "SamLowe/roberta-base-go_emotions");
        assert_eq!(config.catalog_path, PathBuf::from("catalog.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.request_delay, Duration::from_millis(500));
        assert!(config.public_playlists);
        assert!(config.spotify_access_token.is_none());
    }

    #[test]
    fn test_access_token_alone_is_enough() {
        let config = Config::from_lookup(lookup(&[
            ("SPOTIFY_ACCESS_TOKEN", "user-token"),
            ("PLAYLIST_PUBLIC", "false"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.spotify_access_token.as_deref(), Some("user-token"));
        assert!(!config.public_playlists);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_loads_without_credentials() {
        let config = Config::from_lookup(lookup(&[("CATALOG_PATH", "data/tracks.json")])).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("data/tracks.json"));
        assert!(matches!(
            config.require_spotify_credentials(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_half_client_pair_rejected() {
        let err = Config::from_lookup(lookup(&[("SPOTIFY_CLIENT_ID", "id")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_any_credential_satisfies_spotify_commands() {
        let token = Config::from_lookup(lookup(&[("SPOTIFY_ACCESS_TOKEN", "t")])).unwrap();
        assert!(token.require_spotify_credentials().is_ok());

        let pair = Config::from_lookup(lookup(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();
        assert!(pair.require_spotify_credentials().is_ok());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = Config::from_lookup(lookup(&[("SPOTIFY_ACCESS_TOKEN", "   ")])).unwrap();
        assert!(config.spotify_access_token.is_none());
        assert!(config.require_spotify_credentials().is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("SPOTIFY_ACCESS_TOKEN", "t"),
            ("REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("REQUEST_TIMEOUT_SECS")));

        let err = Config::from_lookup(lookup(&[
            ("SPOTIFY_ACCESS_TOKEN", "t"),
            ("REQUEST_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
