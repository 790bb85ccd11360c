//! Idle-player monitor.
//!
//! Players who sent input at least once and then went quiet for longer than
//! the idle timeout are called out once. Training layouts are exempt.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::IdleConfig;
use crate::error::Result;
use crate::host::SharedHost;
use crate::models::{PlayerId, PlayerSnapshot, TeamId};
use crate::stadium::{self, StadiumKind};

use super::RoomPlugin;

pub struct IdlePlayerMonitor {
    host: SharedHost,
    timeout: Duration,
    eject: bool,
    engine_on: bool,
    training: bool,
    last_activity: HashMap<PlayerId, Instant>,
}

impl IdlePlayerMonitor {
    pub fn new(host: SharedHost, config: &IdleConfig) -> Self {
        Self {
            host,
            timeout: config.timeout(),
            eject: config.eject,
            engine_on: false,
            training: false,
            last_activity: HashMap::new(),
        }
    }

    pub fn tracked(&self) -> usize {
        self.last_activity.len()
    }
}

impl RoomPlugin for IdlePlayerMonitor {
    fn name(&self) -> &'static str {
        "idle_player"
    }

    fn on_game_on(&mut self) -> Result<()> {
        self.engine_on = true;
        self.last_activity.clear();
        Ok(())
    }

    fn on_game_off(&mut self) -> Result<()> {
        self.engine_on = false;
        self.last_activity.clear();
        Ok(())
    }

    fn on_player_activity(&mut self, player: &PlayerSnapshot) -> Result<()> {
        self.last_activity.insert(player.id, Instant::now());
        Ok(())
    }

    fn on_player_leave(&mut self, player: &PlayerSnapshot) -> Result<()> {
        self.last_activity.remove(&player.id);
        Ok(())
    }

    fn on_stadium_change(&mut self, name: &str) -> Result<()> {
        self.training = stadium::by_name(name).map_or(false, |s| s.kind == StadiumKind::Training);
        Ok(())
    }

    fn on_game_tick(&mut self) -> Result<()> {
        if !self.engine_on || self.training {
            return Ok(());
        }
        let now = Instant::now();
        let idle: Vec<PlayerId> = self
            .last_activity
            .iter()
            .filter(|(_, at)| now.duration_since(**at) > self.timeout)
            .map(|(&id, _)| id)
            .collect();

        for id in idle {
            let Some(player) = self.host.player(id) else {
                self.last_activity.remove(&id);
                continue;
            };
            if !player.is_playing() {
                continue;
            }
            self.last_activity.remove(&id);
            log::info!("{} is idle", player.name);
            self.host.announce(&format!("😴 {} fell asleep", player.name));
            if self.eject {
                self.host.set_player_team(id, TeamId::Spectators);
            }
        }
        Ok(())
    }
}
