//! Centralized error types for the ym-bridge core library.
//!
//! One `thiserror`-derived enum carries every failure mode named in the
//! component design, with `#[from]` conversions from the underlying
//! transport/XML/JSON errors so call sites can use `?` throughout.

use thiserror::Error;

/// Application-wide error type for the orchestrator and its collaborators.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Required configuration (most commonly the OAuth token) is missing for
    /// the verb that was attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// The cloud API returned a non-2xx status, or the request failed on the
    /// wire.
    #[error("transport error ({status:?}): {body}")]
    Transport { status: Option<u16>, body: String },

    /// A request to the cloud transport failed before a response was even
    /// received (DNS, connect, timeout).
    #[error("transport request failed: {0}")]
    TransportRequest(#[from] reqwest::Error),

    /// The signed-URL handshake failed: missing download info, or the
    /// signing XML was missing a required field.
    #[error("stream resolve error: {0}")]
    Resolve(String),

    /// `/rotor/session/new` returned an empty sequence.
    #[error("rotor session opened with an empty sequence")]
    SessionEmpty,

    /// `set_rotor_seeds` was called with no non-empty seeds after trimming.
    #[error("at least one rotor seed is required")]
    InvalidSeeds,

    /// The media subprocess socket failed to read or write; the next verb
    /// will re-spawn it.
    #[error("media engine is gone: {0}")]
    MediaEngineGone(String),

    /// The current sequence item is missing an identifier required to like
    /// or dislike it.
    #[error("current track is missing an identifier required for this action: {0}")]
    LikeRequirementMissing(String),

    /// Malformed XML in the stream-url signing response.
    #[error("failed to parse signing XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed JSON from the cloud API.
    #[error("failed to decode JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure talking to the media subprocess socket or child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Returns a machine-readable error code, stable across refactors of the
    /// message text, for logging and for adapters that need to branch on
    /// error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Transport { .. } | Self::TransportRequest(_) => "transport_error",
            Self::Resolve(_) => "resolve_error",
            Self::SessionEmpty => "session_empty",
            Self::InvalidSeeds => "invalid_seeds",
            Self::MediaEngineGone(_) => "media_engine_gone",
            Self::LikeRequirementMissing(_) => "like_requirement_missing",
            Self::Xml(_) => "xml_parse_error",
            Self::Json(_) => "json_parse_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Whether this error is safe to log-and-swallow when it occurs on a
    /// background telemetry path (feedback, play-reports). User-initiated
    /// verbs must never use this to suppress an error — see the orchestrator's
    /// propagation policy.
    #[must_use]
    pub fn is_background_safe(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::TransportRequest(_) | Self::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_code_is_stable() {
        let err = BridgeError::Transport {
            status: Some(500),
            body: "oops".into(),
        };
        assert_eq!(err.code(), "transport_error");
        assert!(err.is_background_safe());
    }

    #[test]
    fn invalid_seeds_is_not_background_safe() {
        assert!(!BridgeError::InvalidSeeds.is_background_safe());
    }

    #[test]
    fn session_empty_is_not_background_safe() {
        assert!(!BridgeError::SessionEmpty.is_background_safe());
    }
}
