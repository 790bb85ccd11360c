use serde::{Deserialize, Serialize};

use crate::models::{PlayerId, PlayerSnapshot, ScoreSummary, TeamId};

/// Host callback, in the shape a bridge receives it.
///
/// Players already known to the host are referenced by id and resolved at
/// dispatch time. Join and leave carry the full snapshot because the auth
/// token only exists on the join payload and a leaving player is already
/// gone from the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    GameStart {
        #[serde(default)]
        by: Option<PlayerId>,
    },
    GameStop {
        #[serde(default)]
        by: Option<PlayerId>,
    },
    GamePause {
        #[serde(default)]
        by: Option<PlayerId>,
    },
    GameUnpause {
        #[serde(default)]
        by: Option<PlayerId>,
    },
    GameTick,
    TeamGoal {
        team: TeamId,
    },
    TeamVictory {
        scores: ScoreSummary,
    },
    PositionsReset,
    PlayerJoin {
        player: PlayerSnapshot,
    },
    PlayerLeave {
        player: PlayerSnapshot,
    },
    PlayerTeamChange {
        player: PlayerId,
        #[serde(default)]
        by: Option<PlayerId>,
    },
    PlayerActivity {
        player: PlayerId,
    },
    PlayerBallKick {
        player: PlayerId,
    },
    PlayerChat {
        player: PlayerId,
        message: String,
    },
    StadiumChange {
        name: String,
        #[serde(default)]
        by: Option<PlayerId>,
    },
}

impl HostEvent {
    pub fn label(&self) -> &'static str {
        match self {
            HostEvent::GameStart { .. } => "game_start",
            HostEvent::GameStop { .. } => "game_stop",
            HostEvent::GamePause { .. } => "game_pause",
            HostEvent::GameUnpause { .. } => "game_unpause",
            HostEvent::GameTick => "game_tick",
            HostEvent::TeamGoal { .. } => "team_goal",
            HostEvent::TeamVictory { .. } => "team_victory",
            HostEvent::PositionsReset => "positions_reset",
            HostEvent::PlayerJoin { .. } => "player_join",
            HostEvent::PlayerLeave { .. } => "player_leave",
            HostEvent::PlayerTeamChange { .. } => "player_team_change",
            HostEvent::PlayerActivity { .. } => "player_activity",
            HostEvent::PlayerBallKick { .. } => "player_ball_kick",
            HostEvent::PlayerChat { .. } => "player_chat",
            HostEvent::StadiumChange { .. } => "stadium_change",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_events() {
        let tick: HostEvent = serde_json::from_str(r#"{"event":"game_tick"}"#).unwrap();
        assert_eq!(tick, HostEvent::GameTick);

        let start: HostEvent = serde_json::from_str(r#"{"event":"game_start"}"#).unwrap();
        assert_eq!(start, HostEvent::GameStart { by: None });

        let goal: HostEvent = serde_json::from_str(r#"{"event":"team_goal","team":"blue"}"#).unwrap();
        assert_eq!(goal, HostEvent::TeamGoal { team: TeamId::Blue });

        let join: HostEvent = serde_json::from_str(
            r#"{"event":"player_join","player":{"id":3,"name":"Fish","auth":"token-fish"}}"#,
        )
        .unwrap();
        match join {
            HostEvent::PlayerJoin { player } => {
                assert_eq!(player.id, PlayerId(3));
                assert_eq!(player.team, TeamId::Spectators);
                assert_eq!(player.auth.as_deref(), Some("token-fish"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(HostEvent::PositionsReset.label(), "positions_reset");
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<HostEvent>(r#"{"event":"room_link"}"#).is_err());
    }
}
