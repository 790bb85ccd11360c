//! Contract with the game host.
//!
//! The host owns the physics simulation, the networking and the rendering.
//! The room only reads geometry through the getters below and issues
//! commands through the setters. Getters return `None` when the host has
//! nothing to report (no game running, player gone); plugins gate
//! physics-dependent work behind the engine-on phase so this stays rare.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{
    Announcement, DiscProperties, DiscUpdate, PlayerId, PlayerSnapshot, ScoreSummary, TeamId,
    BALL_DISC,
};

pub use memory::MemoryHost;

/// Outbound interface to the game host.
pub trait RoomHost: Send + Sync {
    /// Connected players in roster order
    fn player_list(&self) -> Vec<PlayerSnapshot>;
    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot>;
    fn scores(&self) -> Option<ScoreSummary>;
    fn disc_properties(&self, index: usize) -> Option<DiscProperties>;
    fn player_disc_properties(&self, id: PlayerId) -> Option<DiscProperties>;

    fn set_disc_properties(&self, index: usize, update: DiscUpdate);
    fn set_player_disc_properties(&self, id: PlayerId, update: DiscUpdate);
    fn send_announcement(&self, announcement: Announcement);
    fn send_chat(&self, message: &str, target: Option<PlayerId>);
    fn set_player_team(&self, id: PlayerId, team: TeamId);
    fn set_player_admin(&self, id: PlayerId, admin: bool);
    /// `None` restores the player's own avatar
    fn set_player_avatar(&self, id: PlayerId, avatar: Option<&str>);
    fn start_game(&self);
    fn stop_game(&self);
    fn set_custom_stadium(&self, content: &str);
    fn set_default_stadium(&self, name: &str);
    /// 0 means unlimited
    fn set_score_limit(&self, limit: u32);
    /// Minutes, 0 means unlimited
    fn set_time_limit(&self, minutes: u32);
    fn kick_player(&self, id: PlayerId, reason: &str, ban: bool);
    fn clear_bans(&self);
    fn start_recording(&self);
    /// Recorded replay bytes, `None` when nothing was being recorded
    fn stop_recording(&self) -> Option<Vec<u8>>;

    fn ball(&self) -> Option<DiscProperties> {
        self.disc_properties(BALL_DISC)
    }

    fn set_ball(&self, update: DiscUpdate) {
        self.set_disc_properties(BALL_DISC, update)
    }

    fn announce(&self, text: &str) {
        self.send_announcement(Announcement::new(text))
    }
}

pub type SharedHost = Arc<dyn RoomHost>;

/// Every outbound call, as recorded by [`MemoryHost`] and echoed by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    Announce(Announcement),
    Chat { message: String, target: Option<PlayerId> },
    SetDisc { index: usize, update: DiscUpdate },
    SetPlayerDisc { player: PlayerId, update: DiscUpdate },
    SetTeam { player: PlayerId, team: TeamId },
    SetAdmin { player: PlayerId, admin: bool },
    SetAvatar { player: PlayerId, avatar: Option<String> },
    StartGame,
    StopGame,
    SetCustomStadium { name: String },
    SetDefaultStadium { name: String },
    SetScoreLimit { limit: u32 },
    SetTimeLimit { minutes: u32 },
    Kick { player: PlayerId, reason: String, ban: bool },
    ClearBans,
    StartRecording,
    StopRecording,
}
