//! In-memory host.
//!
//! Applies every setter to its own copy of the room state and records the
//! call as a [`HostCommand`]. Drives the JSON-lines bridge of the bot binary
//! and every room test.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{HostCommand, RoomHost};
use crate::geometry::Point;
use crate::models::{
    Announcement, DiscProperties, DiscUpdate, PlayerId, PlayerSnapshot, ScoreSummary, TeamId,
    BALL_DISC,
};

pub const DEFAULT_PLAYER_RADIUS: f64 = 15.0;
pub const DEFAULT_BALL_RADIUS: f64 = 10.0;
pub const DEFAULT_BALL_COLOR: u32 = 0xffffff;

#[derive(Debug, Clone)]
struct HostPlayer {
    snapshot: PlayerSnapshot,
    disc: DiscProperties,
    avatar: Option<String>,
}

#[derive(Debug)]
struct HostState {
    players: Vec<HostPlayer>,
    ball: DiscProperties,
    scores: ScoreSummary,
    running: bool,
    recording: Option<Vec<u8>>,
    stadium: String,
    bans: Vec<PlayerId>,
    commands: Vec<HostCommand>,
}

pub struct MemoryHost {
    state: Mutex<HostState>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                players: Vec::new(),
                ball: DiscProperties {
                    radius: DEFAULT_BALL_RADIUS,
                    color: DEFAULT_BALL_COLOR,
                    ..DiscProperties::default()
                },
                scores: ScoreSummary { score_limit: 3, time_limit: 5, ..ScoreSummary::default() },
                running: false,
                recording: None,
                stadium: "Classic".to_string(),
                bans: Vec::new(),
                commands: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================
    // Simulation inputs
    // ========================

    /// Connect a player. Position, if any, seeds the player's disc.
    pub fn add_player(&self, player: PlayerSnapshot) {
        let mut state = self.state();
        let position = player.position.unwrap_or_default();
        let disc = DiscProperties {
            x: position.x,
            y: position.y,
            radius: DEFAULT_PLAYER_RADIUS,
            ..DiscProperties::default()
        };
        let mut snapshot = player;
        // auth is only ever handed out with the join event
        snapshot.auth = None;
        state.players.retain(|p| p.snapshot.id != snapshot.id);
        state.players.push(HostPlayer { snapshot, disc, avatar: None });
    }

    pub fn remove_player(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        let mut state = self.state();
        let index = state.players.iter().position(|p| p.snapshot.id == id)?;
        Some(state.players.remove(index).snapshot)
    }

    pub fn move_player(&self, id: PlayerId, x: f64, y: f64) {
        if let Some(player) = self.state().players.iter_mut().find(|p| p.snapshot.id == id) {
            player.disc.x = x;
            player.disc.y = y;
        }
    }

    pub fn place_ball(&self, x: f64, y: f64) {
        let mut state = self.state();
        state.ball.x = x;
        state.ball.y = y;
    }

    pub fn set_ball_speed(&self, xspeed: f64, yspeed: f64) {
        let mut state = self.state();
        state.ball.xspeed = xspeed;
        state.ball.yspeed = yspeed;
    }

    pub fn set_scores(&self, scores: ScoreSummary) {
        self.state().scores = scores;
    }

    pub fn set_running(&self, running: bool) {
        self.state().running = running;
    }

    // ========================
    // Observations
    // ========================

    pub fn commands(&self) -> Vec<HostCommand> {
        self.state().commands.clone()
    }

    /// Drain recorded commands
    pub fn take_commands(&self) -> Vec<HostCommand> {
        std::mem::take(&mut self.state().commands)
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.state()
            .commands
            .iter()
            .filter_map(|c| match c {
                HostCommand::Announce(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn announced(&self, needle: &str) -> bool {
        self.announcements().iter().any(|a| a.text.contains(needle))
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    pub fn stadium(&self) -> String {
        self.state().stadium.clone()
    }

    pub fn avatar(&self, id: PlayerId) -> Option<String> {
        self.state().players.iter().find(|p| p.snapshot.id == id).and_then(|p| p.avatar.clone())
    }

    pub fn is_banned(&self, id: PlayerId) -> bool {
        self.state().bans.contains(&id)
    }

    fn record(state: &mut HostState, command: HostCommand) {
        log::trace!("host <- {:?}", command);
        state.commands.push(command);
    }

    fn snapshot_of(player: &HostPlayer) -> PlayerSnapshot {
        let mut snapshot = player.snapshot.clone();
        snapshot.position =
            if snapshot.is_playing() { Some(Point::new(player.disc.x, player.disc.y)) } else { None };
        snapshot
    }
}

impl RoomHost for MemoryHost {
    fn player_list(&self) -> Vec<PlayerSnapshot> {
        self.state().players.iter().map(Self::snapshot_of).collect()
    }

    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        self.state().players.iter().find(|p| p.snapshot.id == id).map(Self::snapshot_of)
    }

    fn scores(&self) -> Option<ScoreSummary> {
        let state = self.state();
        state.running.then_some(state.scores)
    }

    fn disc_properties(&self, index: usize) -> Option<DiscProperties> {
        let state = self.state();
        (state.running && index == BALL_DISC).then_some(state.ball)
    }

    fn player_disc_properties(&self, id: PlayerId) -> Option<DiscProperties> {
        let state = self.state();
        if !state.running {
            return None;
        }
        state
            .players
            .iter()
            .find(|p| p.snapshot.id == id && p.snapshot.is_playing())
            .map(|p| p.disc)
    }

    fn set_disc_properties(&self, index: usize, update: DiscUpdate) {
        let mut state = self.state();
        if index == BALL_DISC {
            state.ball.apply(&update);
        }
        Self::record(&mut state, HostCommand::SetDisc { index, update });
    }

    fn set_player_disc_properties(&self, id: PlayerId, update: DiscUpdate) {
        let mut state = self.state();
        if let Some(player) = state.players.iter_mut().find(|p| p.snapshot.id == id) {
            player.disc.apply(&update);
        }
        Self::record(&mut state, HostCommand::SetPlayerDisc { player: id, update });
    }

    fn send_announcement(&self, announcement: Announcement) {
        Self::record(&mut self.state(), HostCommand::Announce(announcement));
    }

    fn send_chat(&self, message: &str, target: Option<PlayerId>) {
        Self::record(&mut self.state(), HostCommand::Chat { message: message.to_string(), target });
    }

    fn set_player_team(&self, id: PlayerId, team: TeamId) {
        let mut state = self.state();
        if let Some(player) = state.players.iter_mut().find(|p| p.snapshot.id == id) {
            player.snapshot.team = team;
        }
        Self::record(&mut state, HostCommand::SetTeam { player: id, team });
    }

    fn set_player_admin(&self, id: PlayerId, admin: bool) {
        let mut state = self.state();
        if let Some(player) = state.players.iter_mut().find(|p| p.snapshot.id == id) {
            player.snapshot.admin = admin;
        }
        Self::record(&mut state, HostCommand::SetAdmin { player: id, admin });
    }

    fn set_player_avatar(&self, id: PlayerId, avatar: Option<&str>) {
        let mut state = self.state();
        if let Some(player) = state.players.iter_mut().find(|p| p.snapshot.id == id) {
            player.avatar = avatar.map(str::to_string);
        }
        Self::record(&mut state, HostCommand::SetAvatar { player: id, avatar: avatar.map(str::to_string) });
    }

    fn start_game(&self) {
        let mut state = self.state();
        if !state.running {
            state.running = true;
            state.scores.red = 0;
            state.scores.blue = 0;
            state.scores.time = 0.0;
        }
        Self::record(&mut state, HostCommand::StartGame);
    }

    fn stop_game(&self) {
        let mut state = self.state();
        state.running = false;
        Self::record(&mut state, HostCommand::StopGame);
    }

    fn set_custom_stadium(&self, content: &str) {
        let name = serde_json::from_str::<serde_json::Value>(content)
            .ok()
            .and_then(|v| v.get("name").and_then(|n| n.as_str()).map(str::to_string))
            .unwrap_or_else(|| "Custom".to_string());
        let mut state = self.state();
        state.stadium = name.clone();
        Self::record(&mut state, HostCommand::SetCustomStadium { name });
    }

    fn set_default_stadium(&self, name: &str) {
        let mut state = self.state();
        state.stadium = name.to_string();
        Self::record(&mut state, HostCommand::SetDefaultStadium { name: name.to_string() });
    }

    fn set_score_limit(&self, limit: u32) {
        let mut state = self.state();
        state.scores.score_limit = limit;
        Self::record(&mut state, HostCommand::SetScoreLimit { limit });
    }

    fn set_time_limit(&self, minutes: u32) {
        let mut state = self.state();
        state.scores.time_limit = minutes;
        Self::record(&mut state, HostCommand::SetTimeLimit { minutes });
    }

    fn kick_player(&self, id: PlayerId, reason: &str, ban: bool) {
        let mut state = self.state();
        state.players.retain(|p| p.snapshot.id != id);
        if ban {
            state.bans.push(id);
        }
        Self::record(&mut state, HostCommand::Kick { player: id, reason: reason.to_string(), ban });
    }

    fn clear_bans(&self) {
        let mut state = self.state();
        state.bans.clear();
        Self::record(&mut state, HostCommand::ClearBans);
    }

    fn start_recording(&self) {
        let mut state = self.state();
        state.recording = Some(Vec::new());
        Self::record(&mut state, HostCommand::StartRecording);
    }

    fn stop_recording(&self) -> Option<Vec<u8>> {
        let mut state = self.state();
        let recording = state.recording.take();
        Self::record(&mut state, HostCommand::StopRecording);
        // Replays are opaque to the room; a recorded game is never empty
        recording.map(|mut bytes| {
            if bytes.is_empty() {
                bytes.extend_from_slice(b"HBR2");
            }
            bytes
        })
    }
}
