//! Goal news: scorer wording, blinking team avatars and the shut-out taunt.

use std::time::Duration;

use crate::error::Result;
use crate::geometry::is_configured_match;
use crate::host::SharedHost;
use crate::models::{
    goals_by, Announcement, AnnouncementSound, AnnouncementStyle, PlayerId, PlayerSnapshot, ScoreSummary,
    ScoringEvent, TeamId,
};
use crate::schedule::ScheduledTask;

use super::{RoomPlugin, TeamGoal};

pub const BLINK_PERIOD: Duration = Duration::from_millis(200);
pub const TAUNT_DELAY: Duration = Duration::from_secs(1);

/// Announcement text for one scoring event.
pub fn goal_message(event: &ScoringEvent, history: &[ScoringEvent]) -> String {
    let mut lines = Vec::with_capacity(2);
    if event.own_goal {
        lines.push(format!("⚽🚨 What an own goal, GG {} !", event.scorer.name));
    } else {
        let line = match goals_by(history, &event.scorer) {
            2 => format!("⚽ Brace for {} !", event.scorer.name),
            3 => format!("⚽ Hat-trick for {} !", event.scorer.name),
            _ => format!("⚽ Goal by {} !", event.scorer.name),
        };
        lines.push(line);
    }
    if let Some(assist) = &event.assist {
        lines.push(format!("🏃🏻 Assisted by {} !", assist.name));
    }
    lines.join("\n")
}

/// Team one goal from a non-zero limit while the other side has not scored.
fn taunted_team(scores: &ScoreSummary) -> Option<TeamId> {
    if scores.score_limit == 0 || !scores.is_clean_sheet() {
        return None;
    }
    let one_away = |goals: u32| goals + 1 == scores.score_limit;
    if !(one_away(scores.red) || one_away(scores.blue)) {
        return None;
    }
    Some(if scores.blue == 0 { TeamId::Blue } else { TeamId::Red })
}

pub struct GoalAnnouncer {
    host: SharedHost,
    blink: Option<ScheduledTask>,
    taunt: Option<ScheduledTask>,
}

impl GoalAnnouncer {
    pub fn new(host: SharedHost) -> Self {
        Self { host, blink: None, taunt: None }
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    fn stop_blink(&mut self, reset_avatars: bool) {
        if let Some(task) = self.blink.take() {
            task.cancel();
        }
        if reset_avatars {
            for player in self.host.player_list() {
                self.host.set_player_avatar(player.id, None);
            }
        }
    }

    fn start_blink(&mut self, team: TeamId, avatar: &'static str) {
        self.stop_blink(false);
        let players: Vec<PlayerId> =
            self.host.player_list().into_iter().filter(|p| p.team == team).map(|p| p.id).collect();

        let host = self.host.clone();
        let mut frame = 0u32;
        let mut blink = move || {
            let shown = (frame % 2 == 0).then_some(avatar);
            for id in &players {
                host.set_player_avatar(*id, shown);
            }
            frame = frame.wrapping_add(1);
        };
        blink();
        self.blink = Some(ScheduledTask::every(BLINK_PERIOD, blink));
    }

    fn schedule_taunt(&mut self, team: TeamId) {
        let host = self.host.clone();
        let text = format!("📢 Anyone on the {} team ?", team.label());
        self.taunt = Some(ScheduledTask::after(TAUNT_DELAY, async move {
            host.send_announcement(Announcement::headline(text));
        }));
    }
}

impl RoomPlugin for GoalAnnouncer {
    fn name(&self) -> &'static str {
        "goal_announcer"
    }

    fn on_team_goal(&mut self, goal: &TeamGoal<'_>) -> Result<()> {
        if let Some(event) = goal.scored {
            self.host.send_announcement(
                Announcement::new(goal_message(event, goal.history))
                    .style(AnnouncementStyle::Bold)
                    .sound(AnnouncementSound::Notification),
            );
        }

        let avatar = if goal.scores.limit_reached() { "🏆" } else { "⚽" };
        self.start_blink(goal.team, avatar);

        if is_configured_match(&self.host.player_list()) {
            if let Some(team) = taunted_team(goal.scores) {
                self.schedule_taunt(team);
            }
        }
        Ok(())
    }

    fn on_positions_reset(&mut self) -> Result<()> {
        self.stop_blink(true);
        Ok(())
    }

    fn on_game_stop(&mut self, _by: Option<&PlayerSnapshot>, _history: &[ScoringEvent]) -> Result<()> {
        self.stop_blink(true);
        if let Some(task) = self.taunt.take() {
            task.cancel();
        }
        Ok(())
    }
}
