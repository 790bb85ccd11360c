//! Final whistle: man of the match and the shut-out line.

use crate::error::Result;
use crate::geometry::is_configured_match;
use crate::host::SharedHost;
use crate::models::{Announcement, PlayerId, ScoreSummary, ScoringEvent};

use super::RoomPlugin;

pub const POINTS_PER_GOAL: i32 = 10;
pub const POINTS_PER_OWN_GOAL: i32 = -5;
pub const POINTS_PER_ASSIST: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRating {
    pub id: PlayerId,
    pub name: String,
    pub points: i32,
    pub goals: u32,
    pub assists: u32,
    pub own_goals: u32,
}

impl MatchRating {
    fn new(id: PlayerId, name: &str) -> Self {
        Self { id, name: name.to_string(), points: 0, goals: 0, assists: 0, own_goals: 0 }
    }
}

/// Ratings in first-seen order.
pub fn rate_players(history: &[ScoringEvent]) -> Vec<MatchRating> {
    let mut ratings: Vec<MatchRating> = Vec::new();
    fn entry<'a>(ratings: &'a mut Vec<MatchRating>, id: PlayerId, name: &str) -> &'a mut MatchRating {
        match ratings.iter().position(|r| r.id == id) {
            Some(index) => &mut ratings[index],
            None => {
                ratings.push(MatchRating::new(id, name));
                let last = ratings.len() - 1;
                &mut ratings[last]
            }
        }
    }

    for event in history {
        let scorer = entry(&mut ratings, event.scorer.id, &event.scorer.name);
        if event.own_goal {
            scorer.points += POINTS_PER_OWN_GOAL;
            scorer.own_goals += 1;
        } else {
            scorer.points += POINTS_PER_GOAL;
            scorer.goals += 1;
        }
        if let Some(assist) = &event.assist {
            let assist = entry(&mut ratings, assist.id, &assist.name);
            assist.points += POINTS_PER_ASSIST;
            assist.assists += 1;
        }
    }
    ratings
}

/// Highest rating; ties go to whoever appeared first in the history.
pub fn man_of_the_match(history: &[ScoringEvent]) -> Option<MatchRating> {
    rate_players(history).into_iter().fold(None, |best: Option<MatchRating>, rating| match best {
        Some(best) if best.points >= rating.points => Some(best),
        _ => Some(rating),
    })
}

pub struct VictoryAnnouncer {
    host: SharedHost,
}

impl VictoryAnnouncer {
    pub fn new(host: SharedHost) -> Self {
        Self { host }
    }
}

impl RoomPlugin for VictoryAnnouncer {
    fn name(&self) -> &'static str {
        "victory_announcer"
    }

    fn on_team_victory(&mut self, history: &[ScoringEvent], scores: &ScoreSummary) -> Result<()> {
        if !is_configured_match(&self.host.player_list()) {
            return Ok(());
        }
        let mut lines = Vec::new();
        if let Some(best) = man_of_the_match(history) {
            lines.push(format!(
                "🎖️ Man of the match: {} ! With {} goals / {} assists / {} own goals",
                best.name, best.goals, best.assists, best.own_goals
            ));
        }
        if scores.is_clean_sheet() {
            lines.push("🍆 What a thrashing ?".to_string());
        }
        if !lines.is_empty() {
            self.host.send_announcement(Announcement::headline(lines.join("\n")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::models::{PlayerSnapshot, TeamId};
    use std::sync::Arc;

    fn player(id: u32, team: TeamId) -> PlayerSnapshot {
        PlayerSnapshot::new(PlayerId(id), format!("P{}", id), team)
    }

    fn goal(scorer: &PlayerSnapshot, assist: Option<&PlayerSnapshot>, own_goal: bool) -> ScoringEvent {
        ScoringEvent { scorer: scorer.clone(), time: 1.0, own_goal, assist: assist.cloned(), team: TeamId::Red }
    }

    #[test]
    fn test_points_and_winner() {
        let p1 = player(1, TeamId::Red);
        let p2 = player(2, TeamId::Red);
        let history = vec![goal(&p2, Some(&p1), false)];
        let ratings = rate_players(&history);
        assert_eq!(ratings.iter().map(|r| (r.id.0, r.points)).collect::<Vec<_>>(), vec![(2, 10), (1, 4)]);
        assert_eq!(man_of_the_match(&history).map(|r| r.id), Some(PlayerId(2)));
    }

    #[test]
    fn test_own_goal_penalty_and_tie_break() {
        let p1 = player(1, TeamId::Red);
        let p2 = player(2, TeamId::Blue);
        // p1: 10 - 5 = 5, p2: 10 - 5 = 5, p1 seen first
        let history = vec![goal(&p1, None, false), goal(&p2, None, false), goal(&p1, None, true), goal(&p2, None, true)];
        let best = man_of_the_match(&history).unwrap();
        assert_eq!(best.id, PlayerId(1));
        assert_eq!((best.goals, best.own_goals, best.points), (1, 1, 5));
        assert!(man_of_the_match(&[]).is_none());
    }

    #[test]
    fn test_announces_only_for_configured_match() {
        let host = Arc::new(MemoryHost::new());
        host.add_player(player(1, TeamId::Red));
        let mut plugin = VictoryAnnouncer::new(host.clone());
        let history = vec![goal(&player(1, TeamId::Red), None, false)];
        let scores = ScoreSummary { red: 3, blue: 0, score_limit: 3, ..ScoreSummary::default() };

        plugin.on_team_victory(&history, &scores).unwrap();
        assert!(host.announcements().is_empty());

        host.add_player(player(2, TeamId::Blue));
        plugin.on_team_victory(&history, &scores).unwrap();
        assert!(host.announced("🎖️ Man of the match: P1 !"));
        assert!(host.announced("What a thrashing"));
    }
}
