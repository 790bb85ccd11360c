use serde::{Deserialize, Serialize};

use super::player::{PlayerSnapshot, TeamId};

/// One goal, as recorded by the match tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringEvent {
    pub scorer: PlayerSnapshot,
    /// Match clock in seconds when the goal went in
    pub time: f64,
    pub own_goal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assist: Option<PlayerSnapshot>,
    /// Team credited with the goal
    pub team: TeamId,
}

/// Host score board.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub red: u32,
    pub blue: u32,
    /// Elapsed match clock in seconds
    pub time: f64,
    /// 0 means unlimited
    pub score_limit: u32,
    /// Minutes, 0 means unlimited
    pub time_limit: u32,
}

impl ScoreSummary {
    pub fn goals(&self, team: TeamId) -> u32 {
        match team {
            TeamId::Red => self.red,
            TeamId::Blue => self.blue,
            TeamId::Spectators => 0,
        }
    }

    /// True once either team has reached a non-zero score limit.
    pub fn limit_reached(&self) -> bool {
        self.score_limit > 0 && (self.red >= self.score_limit || self.blue >= self.score_limit)
    }

    /// A shut-out: one side has not scored at all.
    pub fn is_clean_sheet(&self) -> bool {
        self.red == 0 || self.blue == 0
    }
}

/// Non-own goals by `scorer` in the history, used for brace/hat-trick wording.
pub fn goals_by(history: &[ScoringEvent], scorer: &PlayerSnapshot) -> usize {
    history.iter().filter(|s| s.scorer.id == scorer.id && !s.own_goal).count()
}
