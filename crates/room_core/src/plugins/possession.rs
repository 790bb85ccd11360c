//! Ball possession, counted in single-toucher ticks.

use crate::error::Result;
use crate::host::SharedHost;
use crate::models::{Announcement, AnnouncementSound, PlayerId, PlayerSnapshot, ScoreSummary, ScoringEvent, TeamId};

use super::RoomPlugin;

#[derive(Debug, Clone, PartialEq)]
struct Possession {
    player: PlayerId,
    /// Team at the first counted touch
    team: TeamId,
    ticks: u64,
}

pub struct PossessionTracker {
    host: SharedHost,
    possessions: Vec<Possession>,
}

impl PossessionTracker {
    pub fn new(host: SharedHost) -> Self {
        Self { host, possessions: Vec::new() }
    }

    pub fn ticks_of(&self, player: PlayerId) -> u64 {
        self.possessions.iter().find(|p| p.player == player).map_or(0, |p| p.ticks)
    }

    /// Red and Blue shares in percent, `None` before any counted tick.
    pub fn shares(&self) -> Option<(f64, f64)> {
        let total: u64 = self.possessions.iter().map(|p| p.ticks).sum();
        if total == 0 {
            return None;
        }
        let team_ticks = |team: TeamId| -> u64 {
            self.possessions.iter().filter(|p| p.team == team).map(|p| p.ticks).sum()
        };
        let percent = |ticks: u64| ticks as f64 / total as f64 * 100.0;
        Some((percent(team_ticks(TeamId::Red)), percent(team_ticks(TeamId::Blue))))
    }
}

impl RoomPlugin for PossessionTracker {
    fn name(&self) -> &'static str {
        "possession"
    }

    fn on_game_start(&mut self, _by: Option<&PlayerSnapshot>) -> Result<()> {
        self.possessions.clear();
        Ok(())
    }

    fn on_players_ball_touch(&mut self, players: &[PlayerSnapshot]) -> Result<()> {
        let [player] = players else {
            return Ok(());
        };
        match self.possessions.iter_mut().find(|p| p.player == player.id) {
            Some(possession) => possession.ticks += 1,
            None => self.possessions.push(Possession { player: player.id, team: player.team, ticks: 1 }),
        }
        Ok(())
    }

    fn on_team_victory(&mut self, _history: &[ScoringEvent], _scores: &ScoreSummary) -> Result<()> {
        if let Some((red, blue)) = self.shares() {
            let text = format!("🧮 Possession - 🟥 Red {:.2} % / 🟦 Blue {:.2} %", red, blue);
            self.host.send_announcement(Announcement::headline(text).sound(AnnouncementSound::None));
        }
        Ok(())
    }
}
