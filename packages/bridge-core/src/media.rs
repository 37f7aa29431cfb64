//! Media Subprocess Controller — spawns and drives the local audio engine
//! over its JSON-line UNIX-domain control socket.
//!
//! One connection, one in-flight request at a time: commands are correlated
//! to responses by a monotonically increasing `request_id`, and an internal
//! lock (separate from the orchestrator's own single-writer discipline)
//! guarantees the wire is never interleaved even if a future caller stops
//! respecting that discipline.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};

use crate::error::{BridgeError, BridgeResult};

const SOCKET_WAIT_ATTEMPTS: u32 = 100;
const SOCKET_WAIT_INTERVAL: Duration = Duration::from_millis(50);
const CHILD_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Runtime snapshot reported by the media engine's `state()` call.
#[derive(Debug, Clone, Copy)]
pub struct MediaState {
    pub pause: bool,
    pub time_pos_seconds: f64,
    pub idle_active: bool,
    pub volume_percent: f64,
}

impl Default for MediaState {
    /// The degraded snapshot returned before the subprocess has ever been
    /// started, matching the original adapter's first-call behavior.
    fn default() -> Self {
        Self {
            pause: true,
            time_pos_seconds: 0.0,
            idle_active: true,
            volume_percent: 100.0,
        }
    }
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    command: &'a [Value],
    request_id: u64,
}

#[derive(Deserialize)]
struct CommandResponse {
    #[serde(default)]
    request_id: Option<u64>,
    /// mpv sets this to a message other than "success" for plenty of
    /// ordinary non-fatal conditions (e.g. "property unavailable" for
    /// `time-pos` while idle) - not inspected, matching the source.
    #[serde(default)]
    #[allow(dead_code)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

struct Connection {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
    next_request_id: u64,
}

/// Controls a single local media-engine child process over its JSON-line
/// IPC socket.
pub struct MediaController {
    socket_path: PathBuf,
    child: parking_lot::Mutex<Option<Child>>,
    connection: tokio::sync::Mutex<Option<Connection>>,
}

impl MediaController {
    #[must_use]
    pub fn new() -> Self {
        let socket_path = std::env::temp_dir().join(format!("ym-bridge-media-{}.sock", uuid::Uuid::new_v4()));
        Self {
            socket_path,
            child: parking_lot::Mutex::new(None),
            connection: tokio::sync::Mutex::new(None),
        }
    }

    /// Spawns the engine in idle mode and connects to its control socket if
    /// not already running. Idempotent.
    pub async fn start(&self) -> BridgeResult<()> {
        {
            let conn = self.connection.lock().await;
            if conn.is_some() {
                return Ok(());
            }
        }

        let _ = tokio::fs::remove_file(&self.socket_path).await;

        let child = Command::new("mpv")
            .arg("--idle=yes")
            .arg("--no-terminal")
            .arg(format!(
                "--input-ipc-server={}",
                self.socket_path.display()
            ))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        *self.child.lock() = Some(child);

        let mut attempts = 0;
        loop {
            if self.socket_path.exists() {
                break;
            }
            attempts += 1;
            if attempts >= SOCKET_WAIT_ATTEMPTS {
                return Err(BridgeError::MediaEngineGone(
                    "media engine IPC socket did not appear in time".to_string(),
                ));
            }
            tokio::time::sleep(SOCKET_WAIT_INTERVAL).await;
        }

        let stream = UnixStream::connect(&self.socket_path).await?;
        let (read_half, write_half) = stream.into_split();
        *self.connection.lock().await = Some(Connection {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
        });
        Ok(())
    }

    pub async fn load(&self, url: &str, paused: bool) -> BridgeResult<()> {
        self.start().await?;
        self.command(&[
            Value::String("loadfile".into()),
            Value::String(url.to_string()),
            Value::String("replace".into()),
        ])
        .await?;
        self.command(&[
            Value::String("set_property".into()),
            Value::String("pause".into()),
            Value::Bool(paused),
        ])
        .await?;
        Ok(())
    }

    pub async fn play(&self) -> BridgeResult<()> {
        self.start().await?;
        self.command(&[
            Value::String("set_property".into()),
            Value::String("pause".into()),
            Value::Bool(false),
        ])
        .await
        .map(|_| ())
    }

    pub async fn pause(&self) -> BridgeResult<()> {
        self.start().await?;
        self.command(&[
            Value::String("set_property".into()),
            Value::String("pause".into()),
            Value::Bool(true),
        ])
        .await
        .map(|_| ())
    }

    pub async fn play_pause(&self) -> BridgeResult<()> {
        self.start().await?;
        self.command(&[Value::String("cycle".into()), Value::String("pause".into())])
            .await
            .map(|_| ())
    }

    pub async fn stop(&self) -> BridgeResult<()> {
        if self.connection.lock().await.is_none() {
            return Ok(());
        }
        self.command(&[Value::String("stop".into())])
            .await
            .map(|_| ())
    }

    pub async fn seek_relative(&self, offset_us: i64) -> BridgeResult<()> {
        self.start().await?;
        let offset_seconds = offset_us as f64 / 1_000_000.0;
        self.command(&[
            Value::String("seek".into()),
            serde_json::json!(offset_seconds),
            Value::String("relative".into()),
        ])
        .await
        .map(|_| ())
    }

    pub async fn seek_absolute(&self, position_us: u64) -> BridgeResult<()> {
        self.start().await?;
        let position_seconds = position_us as f64 / 1_000_000.0;
        self.command(&[
            Value::String("set_property".into()),
            Value::String("time-pos".into()),
            serde_json::json!(position_seconds),
        ])
        .await
        .map(|_| ())
    }

    pub async fn set_volume(&self, volume: f64) -> BridgeResult<()> {
        self.start().await?;
        let volume_percent = volume.clamp(0.0, 1.0) * 100.0;
        self.command(&[
            Value::String("set_property".into()),
            Value::String("volume".into()),
            serde_json::json!(volume_percent),
        ])
        .await
        .map(|_| ())
    }

    /// Reads the current runtime state. Returns the degraded default state
    /// (paused, idle) rather than erroring when the engine has never been
    /// started — `fetch_state` relies on this to avoid spawning the engine
    /// just to observe it.
    pub async fn state(&self) -> BridgeResult<MediaState> {
        if self.connection.lock().await.is_none() {
            return Ok(MediaState::default());
        }

        let pause = self
            .get_property("pause")
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let time_pos = self
            .get_property("time-pos")
            .await?
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let idle_active = self
            .get_property("idle-active")
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let volume = self
            .get_property("volume")
            .await?
            .and_then(|v| v.as_f64())
            .unwrap_or(100.0);

        Ok(MediaState {
            pause,
            time_pos_seconds: time_pos,
            idle_active,
            volume_percent: volume,
        })
    }

    async fn get_property(&self, name: &str) -> BridgeResult<Option<Value>> {
        self.command(&[
            Value::String("get_property".into()),
            Value::String(name.to_string()),
        ])
        .await
    }

    /// Sends one command and waits for its correlated response, discarding
    /// any intervening event lines.
    async fn command(&self, args: &[Value]) -> BridgeResult<Option<Value>> {
        let mut guard = self.connection.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| BridgeError::MediaEngineGone("not connected".to_string()))?;

        let request_id = conn.next_request_id;
        conn.next_request_id += 1;

        let request = CommandRequest {
            command: args,
            request_id,
        };
        let mut line = serde_json::to_string(&request).map_err(BridgeError::Json)?;
        line.push('\n');

        let write_result = conn.writer.write_all(line.as_bytes()).await;
        if let Err(err) = write_result {
            *guard = None;
            return Err(BridgeError::MediaEngineGone(err.to_string()));
        }

        loop {
            let mut raw = String::new();
            let read = conn.reader.read_line(&mut raw).await;
            match read {
                Ok(0) => {
                    *guard = None;
                    return Err(BridgeError::MediaEngineGone(
                        "media engine closed the control socket".to_string(),
                    ));
                }
                Err(err) => {
                    *guard = None;
                    return Err(BridgeError::MediaEngineGone(err.to_string()));
                }
                Ok(_) => {}
            }

            let Ok(response) = serde_json::from_str::<CommandResponse>(raw.trim()) else {
                continue; // not a correlated response (an event line); keep reading
            };
            if response.request_id != Some(request_id) {
                continue;
            }
            return Ok(response.data);
        }
    }

    /// Closes the socket, terminates the child with a short grace period,
    /// and unlinks the socket file. Safe to call even if never started.
    pub async fn close(&self) {
        *self.connection.lock().await = None;

        let child = self.child.lock().take();
        if let Some(mut child) = child {
            let _ = child.start_kill();
            let _ = tokio::time::timeout(CHILD_SHUTDOWN_GRACE, child.wait()).await;
        }

        let _ = tokio::fs::remove_file(&self.socket_path).await;
    }
}

impl Default for MediaController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_media_state_is_idle_and_paused() {
        let state = MediaState::default();
        assert!(state.pause);
        assert!(state.idle_active);
        assert_eq!(state.time_pos_seconds, 0.0);
    }

    #[tokio::test]
    async fn state_before_start_does_not_touch_the_socket() {
        let controller = MediaController::new();
        let state = controller.state().await.unwrap();
        assert!(state.idle_active);
        assert!(state.pause);
    }

    #[tokio::test]
    async fn close_before_start_is_a_no_op() {
        let controller = MediaController::new();
        controller.close().await;
    }

    #[test]
    fn property_unavailable_response_still_yields_its_data() {
        // mpv's "property unavailable" for `time-pos` while idle is a normal,
        // non-fatal response shape - deserializing it must not be treated any
        // differently from a "success" response by callers of `command`.
        let raw = r#"{"request_id":7,"error":"property unavailable","data":null}"#;
        let response: CommandResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.request_id, Some(7));
        assert_eq!(response.data, None);
    }
}
