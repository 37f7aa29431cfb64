//! Data model shared by the orchestrator and its collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Playback status exposed to adapters, mirroring the desktop-bus surface's
/// three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::Stopped
    }
}

/// A single track, immutable after construction for a given sequence slot
/// except for `liked`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub length_ms: u64,
    pub art_url: String,
    pub liked: bool,
}

/// Derived, not-stored snapshot of the player. This is what `fetch_state`
/// returns and what gets handed to façade subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub status: PlaybackStatus,
    pub position_us: u64,
    pub volume: f64,
    pub can_control: bool,
    pub can_seek: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub can_pause: bool,
    pub can_play: bool,
    pub can_quit: bool,
    pub can_raise: bool,
    pub identity: String,
    pub desktop_entry: String,
    pub track: Track,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::default(),
            position_us: 0,
            volume: 1.0,
            can_control: true,
            can_seek: true,
            can_go_next: true,
            can_go_previous: true,
            can_pause: true,
            can_play: true,
            can_quit: false,
            can_raise: false,
            identity: "Yandex Music Bridge".to_string(),
            desktop_entry: "ym-bridge".to_string(),
            track: Track::default(),
        }
    }
}

/// The opaque envelope the cloud returns per radio step. Kept as a raw JSON
/// object so that unknown/extra fields round-trip untouched through
/// `append_sequence_from_feedback`, matching the original's permissive
/// decoding of dynamic shapes.
pub type SequenceItem = serde_json::Map<String, Value>;

/// Builds the composite queue reference `"{trackId}:{albumId}"` required by
/// the like and feedback endpoints. Empty unless both halves are present.
#[must_use]
pub fn track_queue_ref(track: &Value) -> String {
    let track_id = track
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if track_id.is_empty() {
        return String::new();
    }
    let album_id = track
        .get("albums")
        .and_then(Value::as_array)
        .and_then(|albums| albums.first())
        .and_then(|album| album.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if album_id.is_empty() {
        return String::new();
    }
    format!("{track_id}:{album_id}")
}

/// Converts a raw sequence-item's nested `track` payload into the
/// display-ready [`Track`], tolerating missing fields per item.
#[must_use]
pub fn track_from_item(item: &SequenceItem) -> Track {
    let Some(track) = item.get("track").and_then(Value::as_object) else {
        return Track::default();
    };

    let artist = track
        .get("artists")
        .and_then(Value::as_array)
        .map(|artists| {
            artists
                .iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    let album_title = track
        .get("albums")
        .and_then(Value::as_array)
        .and_then(|albums| albums.first())
        .and_then(|album| album.get("title"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let mut art_url = track
        .get("coverUri")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    if !art_url.is_empty() {
        art_url = format!("https://{}", art_url.replace("%%", "400x400"));
    }

    Track {
        track_id: track
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        title: track
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        artist,
        album: album_title,
        length_ms: track
            .get("durationMs")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        art_url,
        liked: item.get("liked").and_then(Value::as_bool).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn queue_ref_requires_both_ids() {
        let track = json!({"id": "42", "albums": [{"id": "7"}]});
        assert_eq!(track_queue_ref(&track), "42:7");

        let no_album = json!({"id": "42", "albums": []});
        assert_eq!(track_queue_ref(&no_album), "");

        let no_id = json!({"albums": [{"id": "7"}]});
        assert_eq!(track_queue_ref(&no_id), "");
    }

    #[test]
    fn track_from_item_tolerates_missing_fields() {
        let item: SequenceItem = serde_json::from_value(json!({"track": {"id": "1"}})).unwrap();
        let track = track_from_item(&item);
        assert_eq!(track.track_id, "1");
        assert_eq!(track.artist, "");
        assert_eq!(track.album, "");
    }

    #[test]
    fn track_from_item_missing_track_payload_is_default() {
        let item: SequenceItem = serde_json::from_value(json!({})).unwrap();
        assert_eq!(track_from_item(&item), Track::default());
    }

    #[test]
    fn art_url_substitutes_size_placeholder() {
        let item: SequenceItem = serde_json::from_value(json!({
            "track": {"id": "1", "coverUri": "avatars.yandex.net/get-music-content/abc/%%"}
        }))
        .unwrap();
        let track = track_from_item(&item);
        assert_eq!(
            track.art_url,
            "https://avatars.yandex.net/get-music-content/abc/400x400"
        );
    }
}
