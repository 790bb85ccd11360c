//! # room_core - Rule engine for a host-controlled football room
//!
//! The host runs the physics and the networking; this library watches its
//! event stream and runs the room's rules on top of it.
//!
//! ## Features
//! - Match-fact tracking: ball toucher, kickers, scorer, assist, own goals
//! - Independent rule plugins (offside, power shot, idle players, announcers...)
//! - Chat command routing with admin gating
//! - Persisted lifetime statistics and replay upload

// Doc formatting lints - purely cosmetic, fix incrementally
#![allow(clippy::doc_lazy_continuation)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Large enum variants - boxing would require API changes
#![allow(clippy::large_enum_variant)]

pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod host;
pub mod models;
pub mod plugins;
pub mod room;
pub mod schedule;
pub mod stadium;
pub mod store;
pub mod tracker;
pub mod upload;
pub mod users;

pub use config::RoomConfig;
pub use error::{Result, RoomError};
pub use host::{HostCommand, MemoryHost, RoomHost, SharedHost};
pub use models::{Announcement, PlayerId, PlayerSnapshot, ScoreSummary, ScoringEvent, TeamId};
pub use plugins::{ChatCommand, PluginSet, RoomPlugin};
pub use room::{HostEvent, Room};
pub use store::{FileStatsStore, MemoryStatsStore, SharedStore, StatsStore};
pub use tracker::{MatchPhase, MatchTracker};
pub use upload::{HttpUploader, SharedUploader, Uploader};
pub use users::{RegisteredUser, UserRepository};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
