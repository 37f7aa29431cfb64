//! Daemon configuration.
//!
//! Loads from a TOML file (absent file is not an error — the daemon falls
//! back to all defaults), then applies environment variable overrides for
//! the two secrets that should never live in a checked-in config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use ym_bridge_core::Config as CoreConfig;

/// Default config file location, `~/.config/ym-bridge/config.toml`.
pub fn default_config_path() -> Option<std::path::PathBuf> {
    dirs_home().map(|home| home.join(".config").join("ym-bridge").join("config.toml"))
}

fn dirs_home() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME").map(std::path::PathBuf::from)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFile {
    app: RawApp,
    yandex: RawYandex,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawApp {
    poll_interval_seconds: f64,
    mpris_name: String,
    control_socket_path: String,
    autoplay_on_start: bool,
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 2.0,
            mpris_name: "ymbridge".to_string(),
            control_socket_path: "/tmp/ym-bridge.sock".to_string(),
            autoplay_on_start: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawYandex {
    base_url: String,
    oauth_token: String,
    device_id: String,
    device_header: String,
    accept_language: String,
    music_client: String,
    content_type: String,
    rotor_seeds: Vec<String>,
    endpoints: RawEndpoints,
}

impl Default for RawYandex {
    fn default() -> Self {
        let defaults = CoreConfig::default();
        Self {
            base_url: defaults.base_url,
            oauth_token: String::new(),
            device_id: String::new(),
            device_header: String::new(),
            accept_language: defaults.accept_language,
            music_client: defaults.music_client,
            content_type: defaults.content_type,
            rotor_seeds: defaults.rotor_seeds,
            endpoints: RawEndpoints::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEndpoints {
    account_about: Option<String>,
    rotor_session_new: Option<String>,
    rotor_session_tracks: Option<String>,
    likes_tracks_add: Option<String>,
    likes_tracks_remove: Option<String>,
    plays: Option<String>,
}

/// Fully resolved daemon configuration: the reusable library's business
/// config plus the daemon-only settings (poll cadence display name,
/// control-socket path) that belong at this layer, not the core crate.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mpris_name: String,
    pub control_socket_path: String,
    pub core: CoreConfig,
}

impl AppConfig {
    /// Loads configuration from `path` (or the default path if `None` and it
    /// exists), then applies `YM_OAUTH_TOKEN`/`YM_DEVICE_ID` environment
    /// overrides. A missing file is not an error: it is equivalent to an
    /// empty file, i.e. all defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved_path = path.map(Path::to_path_buf).or_else(default_config_path);

        let raw: RawFile = match &resolved_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file: {}", path.display()))?
            }
            _ => RawFile::default(),
        };

        let oauth_token = std::env::var("YM_OAUTH_TOKEN").unwrap_or(raw.yandex.oauth_token);
        let configured_device_id = raw.yandex.device_id.trim().to_string();
        let device_id = std::env::var("YM_DEVICE_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| Some(configured_device_id).filter(|v| !v.is_empty()))
            .unwrap_or_else(default_device_id);

        let device_header = if raw.yandex.device_header.trim().is_empty() {
            default_device_header(&device_id)
        } else {
            raw.yandex.device_header
        };

        let mut core = CoreConfig {
            base_url: raw.yandex.base_url,
            oauth_token,
            device_id,
            device_header,
            user_agent: format!("ym-bridge/{}", env!("CARGO_PKG_VERSION")),
            accept_language: raw.yandex.accept_language,
            music_client: raw.yandex.music_client,
            content_type: raw.yandex.content_type,
            poll_interval_seconds: raw.app.poll_interval_seconds,
            autoplay_on_start: raw.app.autoplay_on_start,
            rotor_seeds: raw.yandex.rotor_seeds,
            ..CoreConfig::default()
        };
        if let Some(v) = raw.yandex.endpoints.account_about {
            core.endpoint_account_about = v;
        }
        if let Some(v) = raw.yandex.endpoints.rotor_session_new {
            core.endpoint_rotor_session_new = v;
        }
        if let Some(v) = raw.yandex.endpoints.rotor_session_tracks {
            core.endpoint_rotor_session_tracks = v;
        }
        if let Some(v) = raw.yandex.endpoints.likes_tracks_add {
            core.endpoint_likes_tracks_add = v;
        }
        if let Some(v) = raw.yandex.endpoints.likes_tracks_remove {
            core.endpoint_likes_tracks_remove = v;
        }
        if let Some(v) = raw.yandex.endpoints.plays {
            core.endpoint_plays = v;
        }

        Ok(Self {
            mpris_name: raw.app.mpris_name,
            control_socket_path: raw.app.control_socket_path,
            core,
        })
    }
}

/// Derives a stable per-machine device id from `/etc/machine-id`, falling
/// back to a random id when that file is absent or empty (containers,
/// unusual init systems).
fn default_device_id() -> String {
    if let Ok(machine_id) = std::fs::read_to_string("/etc/machine-id") {
        let machine_id = machine_id.trim();
        if !machine_id.is_empty() {
            let name = format!("ym-bridge:{machine_id}");
            return uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_DNS, name.as_bytes()).to_string();
        }
    }
    uuid::Uuid::new_v4().to_string()
}

/// Builds the device-identity header string the cloud API expects,
/// embedding the device id with its dashes stripped in two positions.
fn default_device_header(device_id: &str) -> String {
    let stripped = device_id.replace('-', "");
    format!(
        "os=Linux; os_version=unknown; manufacturer=Custom; model=ym-bridge; \
         clid=desktop; uuid={stripped}; display_size=0; dpi=96; \
         mcc=000; mnc=00; device_id={stripped}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/ym-bridge.toml"))).unwrap();
        assert_eq!(config.mpris_name, "ymbridge");
        assert!(!config.core.base_url.is_empty());
    }

    #[test]
    fn device_header_embeds_dashless_device_id() {
        let header = default_device_header("ab-cd-ef");
        assert!(header.contains("uuid=abcdef"));
        assert!(header.contains("device_id=abcdef"));
    }

    #[test]
    fn device_id_is_deterministic_for_same_machine_id() {
        let name = "ym-bridge:fixed-machine-id";
        let a = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_DNS, name.as_bytes());
        let b = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_DNS, name.as_bytes());
        assert_eq!(a, b);
    }
}
