//! Power shot.
//!
//! Keeping the ball for `timeout_ticks` consecutive ticks charges a single
//! boosted kick. Two or more teammates on the ball charge a twin shot at
//! once. The ball color shows the charge: charging, charged, or the color
//! it had when the game started.

use crate::config::PowerShotConfig;
use crate::error::{Result, RoomError};
use crate::host::SharedHost;
use crate::models::{
    Announcement, AnnouncementSound, AnnouncementStyle, DiscUpdate, PlayerId, PlayerSnapshot, ScoringEvent,
    COLOR_POWER,
};

use super::{ChatCommand, RoomPlugin};

const TOGGLE: &str = "toggle";

pub struct PowerShotCharger {
    host: SharedHost,
    config: PowerShotConfig,
    enabled: bool,
    engine_on: bool,
    kicked_off: bool,
    ball_color: Option<u32>,
    toucher: Option<PlayerId>,
    /// Consecutive ticks `toucher` kept the ball
    ticks: u32,
    available: bool,
    /// Players allowed to fire the charge
    holders: Vec<PlayerId>,
    colored: bool,
}

impl PowerShotCharger {
    pub fn new(host: SharedHost, config: &PowerShotConfig) -> Self {
        Self {
            host,
            config: config.clone(),
            enabled: config.enabled,
            engine_on: false,
            kicked_off: false,
            ball_color: None,
            toucher: None,
            ticks: 0,
            available: false,
            holders: Vec::new(),
            colored: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn status_line(&self) -> String {
        let state = if self.enabled { "Powershot enabled ✅" } else { "Powershot disabled ❌" };
        format!("🚀 - {}", state)
    }

    fn paint_ball(&mut self, color: u32) {
        self.host.set_ball(DiscUpdate::color(color));
        self.colored = true;
    }

    fn restore_ball(&mut self) {
        if !self.colored {
            return;
        }
        if let Some(color) = self.ball_color {
            self.host.set_ball(DiscUpdate::color(color));
        }
        self.colored = false;
    }

    fn announce_charge(&self, text: &str) {
        self.host.send_announcement(
            Announcement::new(text)
                .color(COLOR_POWER)
                .style(AnnouncementStyle::Italic)
                .sound(AnnouncementSound::Notification),
        );
    }

    fn deactivate(&mut self) {
        self.available = false;
        self.holders.clear();
        self.toucher = None;
        self.ticks = 0;
        self.restore_ball();
    }

    fn single_touch(&mut self, player: &PlayerSnapshot) {
        if self.toucher != Some(player.id) {
            self.available = false;
            self.holders.clear();
            self.toucher = Some(player.id);
            self.ticks = 0;
            self.restore_ball();
            return;
        }

        self.ticks = self.ticks.saturating_add(1);
        if self.ticks == 1 && !self.available {
            self.paint_ball(self.config.charging_color);
        }
        if self.ticks == self.config.timeout_ticks {
            self.paint_ball(self.config.charged_color);
            self.announce_charge(&format!("{} can unleash a powershot 🚀⚽ !", player.name));
        }
        if self.ticks >= self.config.timeout_ticks {
            self.available = true;
            self.holders = vec![player.id];
        }
    }

    fn group_touch(&mut self, players: &[PlayerSnapshot]) {
        let team = players[0].team;
        if !players.iter().all(|p| p.team == team) {
            self.deactivate();
            return;
        }
        if !self.available {
            self.available = true;
            self.holders = players.iter().map(|p| p.id).collect();
            self.paint_ball(self.config.charged_color);
            self.announce_charge("Twin shot available 🚀⚽ !");
        }
    }
}

impl RoomPlugin for PowerShotCharger {
    fn name(&self) -> &'static str {
        "power_shot"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![ChatCommand { label: "Enable/Disable powershot", triggers: &["!powershot", "!ps"], admin: true, key: TOGGLE }]
    }

    fn on_chat_command(&mut self, _key: &str, _author: &PlayerSnapshot, _message: &str) -> Result<bool> {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.deactivate();
        }
        self.host.announce(&self.status_line());
        Ok(false)
    }

    fn on_game_start(&mut self, _by: Option<&PlayerSnapshot>) -> Result<()> {
        self.ball_color = self.host.ball().map(|b| b.color);
        self.colored = false;
        self.deactivate();
        Ok(())
    }

    fn on_game_stop(&mut self, _by: Option<&PlayerSnapshot>, _history: &[ScoringEvent]) -> Result<()> {
        self.kicked_off = false;
        self.available = false;
        self.holders.clear();
        self.toucher = None;
        self.ticks = 0;
        self.colored = false;
        Ok(())
    }

    fn on_game_on(&mut self) -> Result<()> {
        self.engine_on = true;
        Ok(())
    }

    fn on_game_off(&mut self) -> Result<()> {
        self.engine_on = false;
        self.deactivate();
        Ok(())
    }

    fn on_game_kickoff(&mut self, _by: &PlayerSnapshot) -> Result<()> {
        self.kicked_off = true;
        Ok(())
    }

    fn on_kickoff_reset(&mut self) -> Result<()> {
        self.kicked_off = false;
        Ok(())
    }

    fn on_player_join(&mut self, player: &PlayerSnapshot) -> Result<()> {
        self.host
            .send_announcement(Announcement::new(self.status_line()).to(player.id).sound(AnnouncementSound::None));
        Ok(())
    }

    fn on_player_ball_kick(&mut self, player: &PlayerSnapshot) -> Result<()> {
        if !(self.enabled && self.available && self.holders.contains(&player.id)) {
            return Ok(());
        }
        let ball = self.host.ball().ok_or(RoomError::HostUnavailable("ball"))?;
        let coefficient = self.config.power_coefficient;
        self.host.set_ball(DiscUpdate::speed(ball.xspeed * coefficient, ball.yspeed * coefficient));
        log::debug!("Powershot fired by {}", player.name);

        self.available = false;
        self.holders.clear();
        self.ticks = 0;
        self.restore_ball();
        Ok(())
    }

    fn on_players_ball_touch(&mut self, players: &[PlayerSnapshot]) -> Result<()> {
        if !self.enabled || !self.kicked_off || !self.engine_on || players.is_empty() {
            self.deactivate();
            return Ok(());
        }
        match players {
            [single] => self.single_touch(single),
            _ => self.group_touch(players),
        }
        Ok(())
    }
}
