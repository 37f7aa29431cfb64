//! Core business configuration consumed by the orchestrator and its
//! collaborators.
//!
//! This is deliberately plain data: loading it from a file, applying
//! environment overrides, and wiring in CLI flags is the daemon binary's
//! concern (see `ym-bridged`'s `config` module), mirroring the split between
//! a reusable library crate and a thin app-level config loader.

use serde::{Deserialize, Serialize};

/// Endpoint templates and client-identity settings for the cloud transport
/// and the session orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub oauth_token: String,
    pub device_id: String,
    pub device_header: String,
    pub user_agent: String,
    pub accept_language: String,
    pub music_client: String,
    pub content_type: String,

    pub poll_interval_seconds: f64,
    pub autoplay_on_start: bool,

    pub endpoint_account_about: String,
    pub endpoint_rotor_session_new: String,
    pub endpoint_rotor_session_tracks: String,
    pub endpoint_likes_tracks_add: String,
    pub endpoint_likes_tracks_remove: String,
    pub endpoint_plays: String,

    pub rotor_seeds: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.music.yandex.net".to_string(),
            oauth_token: String::new(),
            device_id: String::new(),
            device_header: String::new(),
            user_agent: "ym-bridge/0.1".to_string(),
            accept_language: "en".to_string(),
            music_client: "YandexMusicAndroid/24026072".to_string(),
            content_type: "adult".to_string(),

            poll_interval_seconds: 2.0,
            autoplay_on_start: false,

            endpoint_account_about: "/account/about".to_string(),
            endpoint_rotor_session_new: "/rotor/session/new".to_string(),
            endpoint_rotor_session_tracks: "/rotor/session/{session_id}/tracks".to_string(),
            endpoint_likes_tracks_add: "/users/{user_id}/likes/tracks/actions/add".to_string(),
            endpoint_likes_tracks_remove: "/users/{user_id}/likes/tracks/actions/remove"
                .to_string(),
            endpoint_plays: "/plays".to_string(),

            rotor_seeds: vec![
                "user:onyourwave".to_string(),
                "settingDiversity:discover".to_string(),
            ],
        }
    }
}

impl Config {
    /// The literal salt used in the stream-url signing recipe (§4.3). Not
    /// configurable: it is part of the cloud API's own signing contract, not
    /// a deployment setting.
    pub const SIGN_SALT: &'static str = "XGRlBW9FXlekgbPrRHuSiA";

    /// Default `feedback_from` tag used when the rotor session's
    /// `wave.idForFrom` is absent.
    pub const DEFAULT_FEEDBACK_FROM: &'static str = "radio-mobile-user-onyourwave-default";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rotor_seeds_match_reference() {
        let config = Config::default();
        assert_eq!(
            config.rotor_seeds,
            vec![
                "user:onyourwave".to_string(),
                "settingDiversity:discover".to_string()
            ]
        );
    }

    #[test]
    fn default_endpoints_are_non_empty() {
        let config = Config::default();
        assert!(!config.endpoint_rotor_session_new.is_empty());
        assert!(!config.endpoint_plays.is_empty());
    }
}
