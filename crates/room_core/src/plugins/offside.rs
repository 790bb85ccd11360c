//! Offside detector.
//!
//! Positions are frozen on every kick. The next contact decides: a pass to
//! a single teammate who was past the midline and beyond every defender at
//! kick time is called offside and play is restarted from that spot.

use crate::config::OffsideConfig;
use crate::error::Result;
use crate::geometry::{distance, Point};
use crate::host::memory::DEFAULT_PLAYER_RADIUS;
use crate::host::SharedHost;
use crate::models::{
    Announcement, AnnouncementStyle, DiscUpdate, PlayerSnapshot, ScoringEvent, COLOR_WARNING,
};

use super::{ChatCommand, RoomPlugin};

const TOGGLE: &str = "toggle";

/// Field state frozen at the instant of a kick.
#[derive(Debug, Clone)]
struct KickSnapshot {
    kicker: PlayerSnapshot,
    players: Vec<PlayerSnapshot>,
}

pub struct OffsideDetector {
    host: SharedHost,
    enabled: bool,
    forward_pass_required: bool,
    engine_on: bool,
    kicked_off: bool,
    pending: Option<KickSnapshot>,
}

impl OffsideDetector {
    pub fn new(host: SharedHost, config: &OffsideConfig) -> Self {
        Self {
            host,
            enabled: config.enabled,
            forward_pass_required: config.forward_pass_required,
            engine_on: false,
            kicked_off: false,
            pending: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn reset(&mut self) {
        self.pending = None;
    }

    /// Receiver snapshot when the pass in `snapshot` ends offside on `touchers`.
    fn offside_receiver(&self, snapshot: &KickSnapshot, touchers: &[PlayerSnapshot]) -> Option<PlayerSnapshot> {
        let kicker = &snapshot.kicker;
        let mut teammates = touchers.iter().filter(|p| p.team == kicker.team && p.id != kicker.id);
        let receiver_id = match (teammates.next(), teammates.next()) {
            (Some(receiver), None) => receiver.id,
            _ => return None,
        };

        let receiver = snapshot.players.iter().find(|p| p.id == receiver_id)?;
        let receiver_x = receiver.position?.x;
        let direction = kicker.team.attack_direction();
        let ahead = |x: f64| receiver_x * direction > x * direction;

        let opponents: Vec<f64> = snapshot
            .players
            .iter()
            .filter(|p| Some(p.team) == kicker.team.opponent())
            .filter_map(|p| p.position.map(|pos| pos.x))
            .collect();
        if opponents.is_empty() {
            return None;
        }

        let in_attacking_half = ahead(0.0);
        let beyond_defence = opponents.iter().all(|&x| ahead(x));
        let beyond_passer = !self.forward_pass_required || kicker.position.map_or(false, |p| ahead(p.x));

        (in_attacking_half && beyond_defence && beyond_passer).then(|| receiver.clone())
    }

    fn call_offside(&self, snapshot: &KickSnapshot, receiver: &PlayerSnapshot) {
        let team = snapshot.kicker.team;
        let direction = team.attack_direction();
        let spot = receiver.position.unwrap_or_default();
        log::info!("Offside: {} at ({:.1}, {:.1})", receiver.name, spot.x, spot.y);

        self.host.send_announcement(
            Announcement::new(format!("{} is OFFSIDE !", receiver.name))
                .color(COLOR_WARNING)
                .style(AnnouncementStyle::Bold),
        );

        let players = self.host.player_list();
        for player in players.iter().filter(|p| p.team == team) {
            if player.position.map_or(false, |pos| pos.x * direction > 0.0) {
                self.host.set_player_disc_properties(player.id, DiscUpdate::with_x_only(0.0));
            }
        }

        self.host.set_ball(DiscUpdate::placed_at(spot.x, spot.y));

        let nearest_opponent = players
            .iter()
            .filter(|p| Some(p.team) == team.opponent())
            .filter_map(|p| p.position.map(|pos| (p.id, distance(pos, spot))))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((defender, _)) = nearest_opponent {
            let radius = self
                .host
                .player_disc_properties(receiver.id)
                .map(|d| d.radius)
                .unwrap_or(DEFAULT_PLAYER_RADIUS);
            let restart = Point::new(spot.x + radius * direction, spot.y);
            self.host.set_player_disc_properties(defender, DiscUpdate::placed_at(restart.x, restart.y));
        }
    }
}

impl RoomPlugin for OffsideDetector {
    fn name(&self) -> &'static str {
        "offside"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![ChatCommand { label: "Toggle offside rule", triggers: &["!offside", "!ofs"], admin: true, key: TOGGLE }]
    }

    fn on_chat_command(&mut self, _key: &str, _author: &PlayerSnapshot, _message: &str) -> Result<bool> {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.reset();
        }
        let state = if self.enabled { "Offside enabled ✅" } else { "Offside disabled ❌" };
        self.host.announce(&format!("🏁 - {}", state));
        Ok(false)
    }

    fn on_game_stop(&mut self, _by: Option<&PlayerSnapshot>, _history: &[ScoringEvent]) -> Result<()> {
        self.reset();
        self.kicked_off = false;
        Ok(())
    }

    fn on_game_on(&mut self) -> Result<()> {
        self.engine_on = true;
        Ok(())
    }

    /// Goals, victory, pauses and stops all land here.
    fn on_game_off(&mut self) -> Result<()> {
        self.engine_on = false;
        self.reset();
        Ok(())
    }

    fn on_game_kickoff(&mut self, _by: &PlayerSnapshot) -> Result<()> {
        self.kicked_off = true;
        Ok(())
    }

    fn on_kickoff_reset(&mut self) -> Result<()> {
        self.kicked_off = false;
        self.reset();
        Ok(())
    }

    fn on_player_ball_kick(&mut self, player: &PlayerSnapshot) -> Result<()> {
        if !(self.enabled && self.kicked_off && self.engine_on) || !player.is_playing() {
            return Ok(());
        }
        let players: Vec<PlayerSnapshot> =
            self.host.player_list().into_iter().filter(|p| p.is_playing() && p.position.is_some()).collect();
        let kicker = players.iter().find(|p| p.id == player.id).cloned().unwrap_or_else(|| player.clone());
        self.pending = Some(KickSnapshot { kicker, players });
        Ok(())
    }

    fn on_players_ball_touch(&mut self, players: &[PlayerSnapshot]) -> Result<()> {
        if players.is_empty() {
            return Ok(());
        }
        let Some(snapshot) = self.pending.take() else {
            return Ok(());
        };
        if let Some(receiver) = self.offside_receiver(&snapshot, players) {
            self.call_offside(&snapshot, &receiver);
        }
        Ok(())
    }
}
