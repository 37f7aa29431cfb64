//! Session Orchestrator — the core state machine. Owns the radio session,
//! the track queue, and the playback index; derives player state; drives
//! the media subprocess; emits feedback and play-report telemetry at the
//! transitions the cloud service requires.
//!
//! Entered only from the façade (see [`crate::facade`]), which serializes
//! every verb and poll tick against this orchestrator — none of the methods
//! here take `&self`; all take `&mut self`, and that signature is itself the
//! single-writer discipline: the compiler refuses a second concurrent
//! mutable borrow.

use chrono::Local;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};
use crate::media::MediaController;
use crate::models::{track_from_item, track_queue_ref, PlaybackStatus, PlayerState, SequenceItem, Track};
use crate::resolver::resolve_stream_url;
use crate::transport::CloudTransport;

pub struct SessionOrchestrator {
    config: Config,
    transport: CloudTransport,
    media: MediaController,

    rotor_seeds: Vec<String>,
    sequence: Vec<SequenceItem>,
    index: usize,
    session_id: String,
    session_batch_id: String,
    feedback_from: String,
    account_uid: Option<i64>,

    play_id: String,
    play_start_timestamp: String,
    reported_finish_play_id: String,
}

impl SessionOrchestrator {
    /// Builds the orchestrator and its owned collaborators (transport, media
    /// controller) from configuration.
    pub fn new(config: Config) -> BridgeResult<Self> {
        let transport = CloudTransport::new(&config)?;
        let rotor_seeds = config.rotor_seeds.clone();
        Ok(Self {
            config,
            transport,
            media: MediaController::new(),
            rotor_seeds,
            sequence: Vec::new(),
            index: 0,
            session_id: String::new(),
            session_batch_id: String::new(),
            feedback_from: String::new(),
            account_uid: None,
            play_id: String::new(),
            play_start_timestamp: String::new(),
            reported_finish_play_id: String::new(),
        })
    }

    /// Releases the media subprocess and its socket. Idempotent.
    pub async fn close(&mut self) {
        self.media.close().await;
    }

    // ── 4.4.2 Derived state ────────────────────────────────────────────

    pub async fn fetch_state(&mut self) -> BridgeResult<PlayerState> {
        if !self.transport.has_oauth_token() {
            return Ok(PlayerState {
                status: PlaybackStatus::Paused,
                can_control: false,
                can_seek: false,
                can_go_next: false,
                can_go_previous: false,
                track: Track {
                    track_id: "demo".to_string(),
                    title: "Connect Yandex account".to_string(),
                    artist: "ym-bridge".to_string(),
                    ..Track::default()
                },
                ..PlayerState::default()
            });
        }

        self.ensure_session(Some(self.config.autoplay_on_start)).await?;

        let mut runtime = self.media.state().await?;
        if runtime.idle_active && !self.sequence.is_empty() {
            let finished_item = self.current_item().cloned();
            let next_item = self.peek_item(1).cloned();
            let played_seconds = runtime.time_pos_seconds;

            if let Err(err) = self.report_play_finished_if_needed(played_seconds).await {
                log::warn!("failed to report play finished: {err}");
            }

            if let (Some(finished), Some(next)) = (&finished_item, &next_item) {
                let finished_id = item_track_id(finished);
                let next_id = item_track_id(next);
                if !finished_id.is_empty() && !next_id.is_empty() {
                    let finished_len_seconds = item_duration_ms(finished) as f64 / 1000.0;
                    if let Err(err) = self
                        .send_finish_and_start_feedback(
                            &finished_id,
                            finished_len_seconds,
                            &next_id,
                            played_seconds,
                        )
                        .await
                    {
                        log::warn!("failed to send finish/start feedback: {err}");
                    }
                }
            }

            self.advance(1, false).await?;
            runtime = self.media.state().await?;
        }

        let track = self.current_track();
        let status = if runtime.idle_active {
            PlaybackStatus::Stopped
        } else if runtime.pause {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        };

        Ok(PlayerState {
            status,
            position_us: (runtime.time_pos_seconds * 1_000_000.0) as u64,
            volume: (runtime.volume_percent / 100.0).clamp(0.0, 1.0),
            can_go_next: !self.sequence.is_empty(),
            can_go_previous: !self.sequence.is_empty(),
            track,
            ..PlayerState::default()
        })
    }

    // ── 4.4.3 Verbs ─────────────────────────────────────────────────────

    pub async fn play(&mut self) -> BridgeResult<()> {
        if self.sequence.is_empty() {
            self.ensure_session(Some(false)).await?;
        }
        let runtime = self.media.state().await?;
        if runtime.idle_active {
            return self.play_current(false).await;
        }
        self.media.play().await?;
        // Mints only on paused-with-no-play-id, not on every unpause. Preserved
        // verbatim from the source rather than generalized to either reading.
        if runtime.pause && self.play_id.is_empty() {
            self.mark_play_started();
        }
        Ok(())
    }

    pub async fn pause(&mut self) -> BridgeResult<()> {
        self.media.pause().await
    }

    pub async fn play_pause(&mut self) -> BridgeResult<()> {
        let runtime = self.media.state().await?;
        self.media.play_pause().await?;
        // Same preserved-verbatim rule as `play` above.
        if runtime.pause && self.play_id.is_empty() {
            self.mark_play_started();
        }
        Ok(())
    }

    pub async fn stop(&mut self) -> BridgeResult<()> {
        self.media.stop().await
    }

    pub async fn next(&mut self) -> BridgeResult<()> {
        self.advance(1, true).await
    }

    pub async fn previous(&mut self) -> BridgeResult<()> {
        self.advance(-1, false).await
    }

    pub async fn seek(&mut self, offset_us: i64) -> BridgeResult<()> {
        self.media.seek_relative(offset_us).await
    }

    pub async fn set_position(&mut self, track_id: &str, position_us: u64) -> BridgeResult<()> {
        let current = self.current_track();
        if !current.track_id.is_empty() && !track_id.is_empty() && track_id != current.track_id {
            return Ok(());
        }
        self.media.seek_absolute(position_us).await
    }

    pub async fn set_volume(&mut self, volume: f64) -> BridgeResult<()> {
        self.media.set_volume(volume).await
    }

    pub fn get_rotor_seeds(&self) -> Vec<String> {
        self.rotor_seeds.clone()
    }

    pub async fn set_rotor_seeds(&mut self, seeds: Vec<String>) -> BridgeResult<()> {
        let normalized: Vec<String> = seeds
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if normalized.is_empty() {
            return Err(BridgeError::InvalidSeeds);
        }

        self.media.stop().await?;
        self.rotor_seeds = normalized;
        self.sequence.clear();
        self.index = 0;
        self.session_id.clear();
        self.session_batch_id.clear();
        self.feedback_from.clear();
        self.play_id.clear();
        self.play_start_timestamp.clear();
        self.reported_finish_play_id.clear();
        log::info!("rotor seeds replaced, session invalidated");
        Ok(())
    }

    pub async fn like_current(&mut self) -> BridgeResult<()> {
        if self.sequence.is_empty() {
            self.ensure_session(None).await?;
        }
        let item = self
            .current_item()
            .cloned()
            .ok_or_else(|| BridgeError::LikeRequirementMissing("no current track".to_string()))?;
        let track = item
            .get("track")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let track_id = track.get("id").and_then(Value::as_str).unwrap_or("").to_string();
        let queue_ref = track_queue_ref(&Value::Object(track.clone()));
        if track_id.is_empty() || queue_ref.is_empty() {
            return Err(BridgeError::LikeRequirementMissing(
                "current track is missing ids required for like action".to_string(),
            ));
        }

        let uid = self.ensure_account_uid().await?;
        let timestamp = now_iso_millis();
        let endpoint = self
            .config
            .endpoint_likes_tracks_add
            .replace("{user_id}", &uid.to_string());
        self.transport
            .request_json(
                reqwest::Method::POST,
                &endpoint,
                Some(&serde_json::json!({
                    "tracks": [{"clientTimestamp": timestamp, "trackId": queue_ref}]
                })),
                &[],
            )
            .await?;

        self.send_rotor_feedback(&track_id, &timestamp, "like").await?;
        self.set_current_liked(true);
        Ok(())
    }

    pub async fn dislike_current(&mut self) -> BridgeResult<()> {
        if self.sequence.is_empty() {
            self.ensure_session(None).await?;
        }
        let item = self
            .current_item()
            .cloned()
            .ok_or_else(|| BridgeError::LikeRequirementMissing("no current track".to_string()))?;
        let track_id = item
            .get("track")
            .and_then(Value::as_object)
            .and_then(|t| t.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        if track_id.is_empty() {
            return Err(BridgeError::LikeRequirementMissing(
                "current track is missing id required for dislike action".to_string(),
            ));
        }

        let uid = self.ensure_account_uid().await?;
        let timestamp = now_iso_millis();
        let endpoint = self
            .config
            .endpoint_likes_tracks_remove
            .replace("{user_id}", &uid.to_string());
        self.transport
            .request_json(
                reqwest::Method::POST,
                &endpoint,
                Some(&serde_json::json!({
                    "tracks": [{"clientTimestamp": timestamp, "trackId": track_id}]
                })),
                &[],
            )
            .await?;

        self.send_rotor_feedback(&track_id, &timestamp, "unlike").await?;
        self.set_current_liked(false);
        Ok(())
    }

    pub async fn fetch_account_about(&self) -> BridgeResult<Value> {
        let payload = self
            .transport
            .request_json(
                reqwest::Method::GET,
                &self.config.endpoint_account_about,
                None,
                &[],
            )
            .await?;
        Ok(payload
            .get("result")
            .cloned()
            .unwrap_or(Value::Object(Map::new())))
    }

    // ── 4.4.1 Session lifecycle ─────────────────────────────────────────

    async fn ensure_session(&mut self, autoplay: Option<bool>) -> BridgeResult<()> {
        if !self.sequence.is_empty() {
            return Ok(());
        }

        let payload = self
            .transport
            .request_json(
                reqwest::Method::POST,
                &self.config.endpoint_rotor_session_new,
                Some(&serde_json::json!({
                    "includeTracksInResponse": true,
                    "includeWaveModel": true,
                    "interactive": true,
                    "seeds": self.rotor_seeds,
                })),
                &[],
            )
            .await?;

        let result = payload.get("result").and_then(Value::as_object).cloned().unwrap_or_default();
        self.session_id = result
            .get("radioSessionId")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        self.session_batch_id = result
            .get("batchId")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        if let Some(wave) = result.get("wave").and_then(Value::as_object) {
            let from_id = wave.get("idForFrom").and_then(Value::as_str).unwrap_or("").trim().to_string();
            if !from_id.is_empty() {
                self.feedback_from = format!("radio-mobile-{from_id}-default");
            }
        }

        let sequence: Vec<SequenceItem> = result
            .get("sequence")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if sequence.is_empty() {
            return Err(BridgeError::SessionEmpty);
        }
        self.sequence = sequence;
        self.index = 0;

        let should_autoplay = autoplay.unwrap_or(self.config.autoplay_on_start);
        log::info!(
            "opened rotor session {} with {} item(s)",
            self.session_id,
            self.sequence.len()
        );
        self.play_current(!should_autoplay).await
    }

    // ── 4.4.4 advance ────────────────────────────────────────────────────

    async fn advance(&mut self, delta: i64, send_skip_feedback: bool) -> BridgeResult<()> {
        if self.sequence.is_empty() {
            return self.ensure_session(Some(true)).await;
        }

        let previous_item = self.current_item().cloned();
        let runtime = self.media.state().await?;
        let played_seconds = runtime.time_pos_seconds;

        let len = self.sequence.len() as i64;
        self.index = (((self.index as i64 + delta) % len + len) % len) as usize;

        let current_item = self.current_item().cloned();
        if send_skip_feedback {
            if let (Some(previous), Some(current)) = (&previous_item, &current_item) {
                let previous_id = item_track_id(previous);
                let current_id = item_track_id(current);
                if !previous_id.is_empty() && !current_id.is_empty() {
                    if let Err(err) = self
                        .send_skip_and_start_feedback(&previous_id, &current_id, played_seconds)
                        .await
                    {
                        log::warn!("failed to send skip/start feedback: {err}");
                    }
                }
            }
        }

        self.play_current(false).await
    }

    // ── 4.4.8 play_current ───────────────────────────────────────────────

    async fn play_current(&mut self, paused: bool) -> BridgeResult<()> {
        let track_id = self.current_track().track_id;
        if track_id.is_empty() {
            return Err(BridgeError::Resolve(
                "current sequence item has no track id".to_string(),
            ));
        }
        let stream_url = resolve_stream_url(&self.transport, &track_id).await?;
        self.media.load(&stream_url, paused).await?;

        if paused {
            self.play_id.clear();
            self.play_start_timestamp.clear();
            self.reported_finish_play_id.clear();
        } else {
            self.mark_play_started();
        }
        Ok(())
    }

    fn mark_play_started(&mut self) {
        self.play_id = uuid::Uuid::new_v4().to_string();
        self.play_start_timestamp = now_iso_millis();
        self.reported_finish_play_id.clear();
    }

    // ── 4.4.5 Finish play-report ─────────────────────────────────────────

    async fn report_play_finished_if_needed(&mut self, played_seconds: f64) -> BridgeResult<()> {
        if self.play_id.is_empty() || self.play_id == self.reported_finish_play_id {
            return Ok(());
        }
        let Some(current) = self.current_item().cloned() else {
            return Ok(());
        };
        let track_id = item_track_id(&current);
        if track_id.is_empty() {
            return Ok(());
        }

        let album_id = current
            .get("track")
            .and_then(Value::as_object)
            .and_then(|t| t.get("albums"))
            .and_then(Value::as_array)
            .and_then(|albums| albums.first())
            .and_then(|album| album.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let track_length_seconds = item_duration_ms(&current) as f64 / 1000.0;
        let ended_seconds = round3(played_seconds.max(track_length_seconds).max(0.0));
        let now_iso = now_iso_millis();
        let batch_id = if self.session_batch_id.is_empty() {
            format!("{}.local", uuid::Uuid::new_v4())
        } else {
            self.session_batch_id.clone()
        };
        let from = if self.feedback_from.is_empty() {
            Config::DEFAULT_FEEDBACK_FROM.to_string()
        } else {
            self.feedback_from.clone()
        };

        let payload = serde_json::json!({
            "plays": [{
                "albumId": album_id,
                "audioAuto": "none",
                "audioOutputName": "Phone",
                "audioOutputType": "other",
                "isFromAutoflow": false,
                "batchId": batch_id,
                "changeReason": "finish",
                "context": "radio",
                "contextItem": "user:onyourwave",
                "isRestored": false,
                "endPositionSeconds": ended_seconds,
                "expectedTrackLengthSeconds": round3(track_length_seconds),
                "fadeMode": "crossfade",
                "from": from,
                "fromCache": false,
                "listenActivity": "END",
                "maxPlayerStage": "play",
                "navigationId": format!("ym-bridge_{}", uuid::Uuid::new_v4()),
                "isFromOfflineWave": false,
                "pause": false,
                "playbackActionId": uuid::Uuid::new_v4().to_string(),
                "isFromPumpkin": false,
                "radioSessionId": self.session_id,
                "isRepeated": false,
                "seek": false,
                "smartPreview": false,
                "startPositionSeconds": 0.0,
                "startTimestamp": if self.play_start_timestamp.is_empty() { now_iso.clone() } else { self.play_start_timestamp.clone() },
                "timestamp": now_iso,
                "totalPlayedSeconds": ended_seconds,
                "trackId": track_id,
                "trackLengthSeconds": round3(track_length_seconds),
                "playId": self.play_id,
            }]
        });

        self.transport
            .request_json(
                reqwest::Method::POST,
                &self.config.endpoint_plays,
                Some(&payload),
                &[("client-now", now_iso.clone())],
            )
            .await?;
        self.reported_finish_play_id = self.play_id.clone();
        Ok(())
    }

    // ── 4.4.6 Rotor feedback ─────────────────────────────────────────────

    async fn send_rotor_feedback(
        &mut self,
        track_id: &str,
        timestamp: &str,
        event_type: &str,
    ) -> BridgeResult<()> {
        if self.session_id.is_empty() {
            return Ok(());
        }
        let endpoint = self
            .config
            .endpoint_rotor_session_tracks
            .replace("{session_id}", &self.session_id);
        let batch_id = if self.session_batch_id.is_empty() {
            format!("{}.local", uuid::Uuid::new_v4())
        } else {
            self.session_batch_id.clone()
        };
        let from = self.feedback_from_or_default();

        let payload = serde_json::json!({
            "feedbacks": [{
                "batchId": batch_id,
                "event": {"timestamp": timestamp, "trackId": track_id, "type": event_type},
                "from": from,
            }],
            "queue": self.queue_refs(2, 0),
        });
        let response = self
            .transport
            .request_json(reqwest::Method::POST, &endpoint, Some(&payload), &[])
            .await?;
        self.append_sequence_from_feedback(&response);
        Ok(())
    }

    async fn send_finish_and_start_feedback(
        &mut self,
        finished_track_id: &str,
        finished_track_length_seconds: f64,
        started_track_id: &str,
        total_played_seconds: f64,
    ) -> BridgeResult<()> {
        if self.session_id.is_empty() || finished_track_id.is_empty() || started_track_id.is_empty() {
            return Ok(());
        }
        let endpoint = self
            .config
            .endpoint_rotor_session_tracks
            .replace("{session_id}", &self.session_id);
        let timestamp = now_iso_millis();
        let batch_id = if self.session_batch_id.is_empty() {
            format!("{}.local", uuid::Uuid::new_v4())
        } else {
            self.session_batch_id.clone()
        };
        let from = self.feedback_from_or_default();
        let ended = round3(total_played_seconds.max(0.0));

        let payload = serde_json::json!({
            "feedbacks": [
                {
                    "batchId": batch_id,
                    "event": {
                        "timestamp": timestamp,
                        "totalPlayedSeconds": ended,
                        "trackId": finished_track_id,
                        "trackLengthSeconds": round3(finished_track_length_seconds.max(0.0)),
                        "type": "trackFinished",
                    },
                    "from": from,
                },
                {
                    "batchId": batch_id,
                    "event": {"timestamp": timestamp, "trackId": started_track_id, "type": "trackStarted"},
                    "from": from,
                },
            ],
            "queue": self.queue_refs(2, 1),
        });
        let response = self
            .transport
            .request_json(reqwest::Method::POST, &endpoint, Some(&payload), &[])
            .await?;
        self.append_sequence_from_feedback(&response);
        Ok(())
    }

    async fn send_skip_and_start_feedback(
        &mut self,
        skipped_track_id: &str,
        started_track_id: &str,
        total_played_seconds: f64,
    ) -> BridgeResult<()> {
        if self.session_id.is_empty() {
            return Ok(());
        }
        let endpoint = self
            .config
            .endpoint_rotor_session_tracks
            .replace("{session_id}", &self.session_id);
        let timestamp = now_iso_millis();
        let from = self.feedback_from_or_default();
        let skip_batch_id = if self.session_batch_id.is_empty() {
            format!("{}.local", uuid::Uuid::new_v4())
        } else {
            self.session_batch_id.clone()
        };

        let payload = serde_json::json!({
            "feedbacks": [
                {
                    "batchId": format!("{}.local", uuid::Uuid::new_v4()),
                    "event": {"timestamp": timestamp, "trackId": started_track_id, "type": "trackStarted"},
                    "from": from,
                },
                {
                    "batchId": skip_batch_id,
                    "event": {
                        "timestamp": timestamp,
                        "totalPlayedSeconds": round3(total_played_seconds.max(0.0)),
                        "trackId": skipped_track_id,
                        "type": "skip",
                    },
                    "from": from,
                },
            ],
            "queue": self.queue_refs(1, 0),
        });
        let response = self
            .transport
            .request_json(reqwest::Method::POST, &endpoint, Some(&payload), &[])
            .await?;
        self.append_sequence_from_feedback(&response);
        Ok(())
    }

    fn feedback_from_or_default(&self) -> String {
        if self.feedback_from.is_empty() {
            Config::DEFAULT_FEEDBACK_FROM.to_string()
        } else {
            self.feedback_from.clone()
        }
    }

    /// Order-preserving queue extension: updates `batch_id` from the
    /// response and appends every map-typed item from its `sequence` array.
    /// Must be called for every feedback response, even on skip.
    fn append_sequence_from_feedback(&mut self, payload: &Value) {
        let Some(result) = payload.get("result").and_then(Value::as_object) else {
            return;
        };
        if let Some(next_batch) = result.get("batchId").and_then(Value::as_str) {
            if !next_batch.is_empty() {
                self.session_batch_id = next_batch.to_string();
            }
        }
        if let Some(sequence) = result.get("sequence").and_then(Value::as_array) {
            for item in sequence {
                if let Some(obj) = item.as_object() {
                    self.sequence.push(obj.clone());
                }
            }
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    fn current_item(&self) -> Option<&SequenceItem> {
        self.sequence.get(self.index)
    }

    fn peek_item(&self, delta: i64) -> Option<&SequenceItem> {
        if self.sequence.is_empty() {
            return None;
        }
        let len = self.sequence.len() as i64;
        let idx = (((self.index as i64 + delta) % len + len) % len) as usize;
        self.sequence.get(idx)
    }

    fn queue_refs(&self, limit: usize, start_offset: i64) -> Vec<String> {
        if self.sequence.is_empty() {
            return Vec::new();
        }
        let len = self.sequence.len() as i64;
        (0..limit.min(self.sequence.len()) as i64)
            .filter_map(|offset| {
                let idx = (((self.index as i64 + start_offset + offset) % len + len) % len) as usize;
                self.sequence.get(idx)
            })
            .map(|item| {
                item.get("track")
                    .map(|track| track_queue_ref(track))
                    .unwrap_or_default()
            })
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn current_track(&self) -> Track {
        match self.current_item() {
            Some(item) => track_from_item(item),
            None => Track::default(),
        }
    }

    fn set_current_liked(&mut self, liked: bool) {
        if let Some(item) = self.sequence.get_mut(self.index) {
            item.insert("liked".to_string(), Value::Bool(liked));
        }
    }

    async fn ensure_account_uid(&mut self) -> BridgeResult<i64> {
        if let Some(uid) = self.account_uid {
            return Ok(uid);
        }
        let account = self.fetch_account_about().await?;
        let uid = account
            .get("uid")
            .and_then(Value::as_i64)
            .ok_or_else(|| BridgeError::LikeRequirementMissing(
                "could not resolve account uid for likes endpoint".to_string(),
            ))?;
        self.account_uid = Some(uid);
        Ok(uid)
    }
}

fn item_track_id(item: &SequenceItem) -> String {
    item.get("track")
        .and_then(Value::as_object)
        .and_then(|t| t.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

fn item_duration_ms(item: &SequenceItem) -> u64 {
    item.get("track")
        .and_then(Value::as_object)
        .and_then(|t| t.get("durationMs"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn now_iso_millis() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round3_matches_reference_rounding() {
        assert_eq!(round3(212.5), 212.5);
        assert_eq!(round3(30.2), 30.2);
    }

    #[tokio::test]
    async fn no_oauth_token_returns_paused_placeholder_without_network() {
        let config = Config::default();
        let mut orchestrator = SessionOrchestrator::new(config).unwrap();
        let state = orchestrator.fetch_state().await.unwrap();
        assert_eq!(state.status, PlaybackStatus::Paused);
        assert!(!state.can_control);
        assert!(!state.can_go_next);
        assert_eq!(state.track.track_id, "demo");
    }

    #[tokio::test]
    async fn set_rotor_seeds_rejects_empty_list() {
        let mut config = Config::default();
        config.oauth_token = "token".to_string();
        let mut orchestrator = SessionOrchestrator::new(config).unwrap();
        let err = orchestrator
            .set_rotor_seeds(vec!["   ".to_string(), "".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidSeeds));
    }

    #[tokio::test]
    async fn set_rotor_seeds_clears_session_context() {
        let mut config = Config::default();
        config.oauth_token = "token".to_string();
        let mut orchestrator = SessionOrchestrator::new(config).unwrap();
        orchestrator.session_id = "S1".to_string();
        orchestrator.session_batch_id = "B1".to_string();
        orchestrator.play_id = "P1".to_string();

        orchestrator
            .set_rotor_seeds(vec!["activity:workout".to_string()])
            .await
            .unwrap();

        assert_eq!(orchestrator.get_rotor_seeds(), vec!["activity:workout".to_string()]);
        assert!(orchestrator.session_id.is_empty());
        assert!(orchestrator.session_batch_id.is_empty());
        assert!(orchestrator.play_id.is_empty());
        assert!(orchestrator.sequence.is_empty());
    }

    #[test]
    fn queue_ref_helper_round_trips_through_append() {
        let mut config = Config::default();
        config.oauth_token = "token".to_string();
        let mut orchestrator = SessionOrchestrator::new(config).unwrap();
        orchestrator.append_sequence_from_feedback(&serde_json::json!({
            "result": {"batchId": "B2", "sequence": [{"track": {"id": "9"}}]}
        }));
        assert_eq!(orchestrator.session_batch_id, "B2");
        assert_eq!(orchestrator.sequence.len(), 1);
    }
}
