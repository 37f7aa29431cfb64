//! ym-bridge-core - shared library for ym-bridge.
//!
//! This crate provides the core functionality for ym-bridge, a bridge
//! between a cloud music service's radio API and a local media subprocess.
//! It is designed to be used by the standalone daemon (`ym-bridged`) and,
//! eventually, by a desktop-bus adapter.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`]: Business configuration (endpoints, client identity, rotor seeds)
//! - [`error`]: Centralized error types
//! - [`models`]: Shared data model (`PlayerState`, `Track`, the raw sequence item)
//! - [`transport`]: Cloud Transport — the shared authenticated HTTP client
//! - [`resolver`]: Stream URL Resolver — the signed-URL handshake
//! - [`media`]: Media Subprocess Controller — drives the local audio engine
//! - [`orchestrator`]: Session Orchestrator — the radio session state machine
//! - [`events`]: State-change notification abstraction for adapters
//! - [`facade`]: Controller Façade — the single entry point adapters use
//! - [`bootstrap`]: Composition root wiring all of the above together
//!
//! # Abstraction traits
//!
//! [`StateListener`](events::StateListener) decouples the façade's poll loop
//! from any particular adapter transport (desktop bus, local socket, tests).

#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod facade;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod transport;

pub use bootstrap::{bootstrap_services, BootstrappedServices};
pub use config::Config;
pub use error::{BridgeError, BridgeResult};
pub use events::{LoggingStateListener, NoopStateListener, StateListener};
pub use facade::BridgeController;
pub use media::{MediaController, MediaState};
pub use models::{track_from_item, track_queue_ref, PlaybackStatus, PlayerState, SequenceItem, Track};
pub use orchestrator::SessionOrchestrator;
pub use resolver::resolve_stream_url;
pub use transport::CloudTransport;
