//! Match-fact tracker.
//!
//! Derives who is touching the ball, who kicked it last, who scored and who
//! assisted from the raw host event stream. The phase enum carries the game
//! only where a game exists, so an `Idle` room has no stale match facts.
//!
//! ## Phases
//! - `Idle`: no game
//! - `Live`: game running, kickoff pending
//! - `Active`: ball in play since the last kickoff
//! - `Paused`: halted by the host, by a goal or by the final whistle
//!
//! The engine counts as running in `Live` and `Active` only.

use chrono::{DateTime, Utc};

use crate::config::{MultiTouchPolicy, TouchConfig};
use crate::geometry::distance;
use crate::host::memory::{DEFAULT_BALL_RADIUS, DEFAULT_PLAYER_RADIUS};
use crate::host::RoomHost;
use crate::models::{PlayerSnapshot, ScoringEvent, TeamId};

/// Radii captured at game start, used when the host cannot report a disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub ball_radius: f64,
    /// Radius of the first player found on a team
    pub player_radius: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { ball_radius: DEFAULT_BALL_RADIUS, player_radius: DEFAULT_PLAYER_RADIUS }
    }
}

/// Facts of one start→stop cycle.
#[derive(Debug, Clone)]
pub struct Game {
    pub calibration: Calibration,
    /// Sole player within trigger distance, per the multi-touch policy
    pub toucher: Option<PlayerSnapshot>,
    pub last_kicker: Option<PlayerSnapshot>,
    /// Distinct kicker before `last_kicker`
    pub previous_kicker: Option<PlayerSnapshot>,
    /// Last single toucher since that kick who is a teammate of `last_kicker`
    pub deflection: Option<PlayerSnapshot>,
    pub scoring: Vec<ScoringEvent>,
    pub started_at: DateTime<Utc>,
}

impl Game {
    fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            toucher: None,
            last_kicker: None,
            previous_kicker: None,
            deflection: None,
            scoring: Vec::new(),
            started_at: Utc::now(),
        }
    }

    fn clear_contacts(&mut self) {
        self.toucher = None;
        self.last_kicker = None;
        self.previous_kicker = None;
        self.deflection = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    Host { was_active: bool },
    Goal,
    Victory,
}

#[derive(Debug, Clone, Default)]
pub enum MatchPhase {
    #[default]
    Idle,
    Live(Game),
    Active(Game),
    Paused { game: Game, halt: Halt },
}

impl MatchPhase {
    pub fn game(&self) -> Option<&Game> {
        match self {
            MatchPhase::Idle => None,
            MatchPhase::Live(game) | MatchPhase::Active(game) | MatchPhase::Paused { game, .. } => Some(game),
        }
    }

    fn game_mut(&mut self) -> Option<&mut Game> {
        match self {
            MatchPhase::Idle => None,
            MatchPhase::Live(game) | MatchPhase::Active(game) | MatchPhase::Paused { game, .. } => Some(game),
        }
    }

    fn running_game_mut(&mut self) -> Option<&mut Game> {
        match self {
            MatchPhase::Live(game) | MatchPhase::Active(game) => Some(game),
            _ => None,
        }
    }

    fn into_game(self) -> Option<Game> {
        match self {
            MatchPhase::Idle => None,
            MatchPhase::Live(game) | MatchPhase::Active(game) | MatchPhase::Paused { game, .. } => Some(game),
        }
    }
}

pub struct MatchTracker {
    phase: MatchPhase,
    touch: TouchConfig,
}

impl MatchTracker {
    pub fn new(touch: TouchConfig) -> Self {
        Self { phase: MatchPhase::Idle, touch }
    }

    pub fn phase(&self) -> &MatchPhase {
        &self.phase
    }

    pub fn game(&self) -> Option<&Game> {
        self.phase.game()
    }

    pub fn engine_running(&self) -> bool {
        matches!(self.phase, MatchPhase::Live(_) | MatchPhase::Active(_))
    }

    pub fn has_kicked_off(&self) -> bool {
        matches!(self.phase, MatchPhase::Active(_))
    }

    /// Scoring history of the current game, empty when idle.
    pub fn scoring(&self) -> &[ScoringEvent] {
        self.game().map(|g| g.scoring.as_slice()).unwrap_or(&[])
    }

    // ========================
    // Lifecycle
    // ========================

    pub fn start(&mut self, host: &dyn RoomHost) {
        let defaults = Calibration::default();
        let ball_radius = host.ball().map(|b| b.radius).unwrap_or(defaults.ball_radius);
        let player_radius = host
            .player_list()
            .iter()
            .find(|p| p.is_playing())
            .and_then(|p| host.player_disc_properties(p.id))
            .map(|d| d.radius)
            .unwrap_or(defaults.player_radius);

        log::debug!("Game start: ball radius {}, player radius {}", ball_radius, player_radius);
        self.phase = MatchPhase::Live(Game::new(Calibration { ball_radius, player_radius }));
    }

    /// Freeze the game and hand back its history.
    pub fn stop(&mut self) -> Vec<ScoringEvent> {
        std::mem::take(&mut self.phase).into_game().map(|g| g.scoring).unwrap_or_default()
    }

    /// Host pause. Returns false when there was nothing running to pause.
    pub fn pause(&mut self) -> bool {
        self.phase = match std::mem::take(&mut self.phase) {
            MatchPhase::Live(game) => MatchPhase::Paused { game, halt: Halt::Host { was_active: false } },
            MatchPhase::Active(game) => MatchPhase::Paused { game, halt: Halt::Host { was_active: true } },
            other => {
                self.phase = other;
                return false;
            }
        };
        true
    }

    /// Resume a host pause. Goal and victory halts only end with a positions reset or stop.
    pub fn unpause(&mut self) -> bool {
        self.phase = match std::mem::take(&mut self.phase) {
            MatchPhase::Paused { game, halt: Halt::Host { was_active: true } } => MatchPhase::Active(game),
            MatchPhase::Paused { game, halt: Halt::Host { was_active: false } } => MatchPhase::Live(game),
            other => {
                self.phase = other;
                return false;
            }
        };
        true
    }

    /// Post-goal re-center: kickoff facts cleared, kickoff re-armed.
    pub fn positions_reset(&mut self) -> bool {
        match std::mem::take(&mut self.phase).into_game() {
            Some(mut game) => {
                game.clear_contacts();
                self.phase = MatchPhase::Live(game);
                true
            }
            None => false,
        }
    }

    pub fn victory(&mut self) -> &[ScoringEvent] {
        if let Some(game) = std::mem::take(&mut self.phase).into_game() {
            self.phase = MatchPhase::Paused { game, halt: Halt::Victory };
        }
        self.scoring()
    }

    // ========================
    // Ball contact
    // ========================

    /// Recompute the toucher set. `None` when the engine is not running or the
    /// host has no ball to report.
    pub fn tick(&mut self, host: &dyn RoomHost) -> Option<Vec<PlayerSnapshot>> {
        let sensitivity = self.touch.distance_sensitivity;
        let policy = self.touch.multi_toucher;
        let game = self.phase.running_game_mut()?;
        let ball = host.ball()?;
        let calibration = game.calibration;

        let touchers: Vec<PlayerSnapshot> = host
            .player_list()
            .into_iter()
            .filter(|p| p.is_playing())
            .filter(|p| {
                let Some(position) = p.position else { return false };
                let player_radius = host
                    .player_disc_properties(p.id)
                    .map(|d| d.radius)
                    .unwrap_or(calibration.player_radius);
                let trigger = (calibration.ball_radius + player_radius) * sensitivity;
                distance(position, ball.position()) < trigger
            })
            .collect();

        match touchers.as_slice() {
            [] => game.toucher = None,
            [single] => {
                // Only a teammate of the kicker takes the goal over; an
                // opponent's touch leaves the credit with the kicker.
                let teammate_after_kick = game
                    .last_kicker
                    .as_ref()
                    .map_or(false, |k| k.id != single.id && k.team == single.team);
                if teammate_after_kick {
                    game.deflection = Some(single.clone());
                }
                game.toucher = Some(single.clone());
            }
            _ => {
                if policy == MultiTouchPolicy::Clear {
                    game.toucher = None;
                }
            }
        }

        Some(touchers)
    }

    /// Register a kick. Returns true on the kickoff edge.
    pub fn kick(&mut self, player: &PlayerSnapshot) -> bool {
        let kickoff = match std::mem::take(&mut self.phase) {
            MatchPhase::Live(game) => {
                self.phase = MatchPhase::Active(game);
                true
            }
            other => {
                self.phase = other;
                false
            }
        };

        if let Some(game) = self.phase.running_game_mut() {
            let same_kicker = game.last_kicker.as_ref().map_or(false, |k| k.id == player.id);
            if !same_kicker {
                game.previous_kicker = game.last_kicker.take();
            }
            game.last_kicker = Some(player.clone());
            game.deflection = None;
        }
        kickoff
    }

    /// Credit a goal to `team`. Halts the engine whether or not a scorer is known.
    pub fn goal(&mut self, team: TeamId, time: f64) -> Option<ScoringEvent> {
        let game = self.phase.running_game_mut()?;

        let (scorer, assist_candidate) = match game.deflection.clone() {
            Some(deflector) => (Some(deflector), game.last_kicker.clone()),
            None => (
                game.last_kicker.clone().or_else(|| game.toucher.clone()),
                game.previous_kicker.clone(),
            ),
        };

        let event = scorer.map(|scorer| {
            let own_goal = scorer.team != team;
            let assist = assist_candidate
                .filter(|a| !own_goal && a.id != scorer.id && a.team == team);
            ScoringEvent { scorer, time, own_goal, assist, team }
        });

        if let Some(event) = &event {
            game.scoring.push(event.clone());
        } else {
            log::debug!("Goal for {} with no known contact", team.label());
        }

        if let Some(game) = std::mem::take(&mut self.phase).into_game() {
            self.phase = MatchPhase::Paused { game, halt: Halt::Goal };
        }
        event
    }

    /// A player joined a team mid-game; their disc becomes the reference radius.
    pub fn team_change(&mut self, host: &dyn RoomHost, player: &PlayerSnapshot) {
        if !player.is_playing() {
            return;
        }
        let radius = host.player_disc_properties(player.id).map(|d| d.radius);
        if let (Some(game), Some(radius)) = (self.phase.game_mut(), radius) {
            game.calibration.player_radius = radius;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::models::PlayerId;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);
    const P3: PlayerId = PlayerId(3);

    fn setup(policy: MultiTouchPolicy) -> (MemoryHost, MatchTracker) {
        let host = MemoryHost::new();
        host.add_player(PlayerSnapshot::new(P1, "P1", TeamId::Red).at(-200.0, 0.0));
        host.add_player(PlayerSnapshot::new(P2, "P2", TeamId::Red).at(-100.0, 50.0));
        host.add_player(PlayerSnapshot::new(P3, "P3", TeamId::Blue).at(200.0, 0.0));
        host.start_game();
        let mut tracker = MatchTracker::new(TouchConfig { multi_toucher: policy, ..TouchConfig::default() });
        tracker.start(&host);
        (host, tracker)
    }

    fn snapshot(host: &MemoryHost, id: PlayerId) -> PlayerSnapshot {
        host.player(id).unwrap()
    }

    fn toucher(tracker: &MatchTracker) -> Option<PlayerId> {
        tracker.game().and_then(|g| g.toucher.as_ref()).map(|p| p.id)
    }

    #[test]
    fn test_start_calibrates() {
        let (_host, tracker) = setup(MultiTouchPolicy::Hold);
        let game = tracker.game().unwrap();
        assert_eq!(game.calibration.ball_radius, DEFAULT_BALL_RADIUS);
        assert_eq!(game.calibration.player_radius, DEFAULT_PLAYER_RADIUS);
        assert!(tracker.engine_running());
        assert!(!tracker.has_kicked_off());
    }

    #[test]
    fn test_single_toucher_then_zero_clears() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        host.place_ball(-180.0, 0.0);
        let touchers = tracker.tick(&host).unwrap();
        assert_eq!(touchers.len(), 1);
        assert_eq!(toucher(&tracker), Some(P1));

        host.place_ball(0.0, 0.0);
        assert!(tracker.tick(&host).unwrap().is_empty());
        assert_eq!(toucher(&tracker), None);
    }

    #[test]
    fn test_trigger_distance_is_strict() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        // (10 + 15) * 1.1 = 27.5
        host.place_ball(-200.0 + 27.5, 0.0);
        assert!(tracker.tick(&host).unwrap().is_empty());
        host.place_ball(-200.0 + 27.4, 0.0);
        assert_eq!(tracker.tick(&host).unwrap().len(), 1);
    }

    #[test]
    fn test_spectators_never_touch() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        host.add_player(PlayerSnapshot::new(PlayerId(9), "watcher", TeamId::Spectators).at(0.0, 0.0));
        host.place_ball(0.0, 0.0);
        assert!(tracker.tick(&host).unwrap().is_empty());
    }

    #[test]
    fn test_multi_touch_hold_keeps_toucher() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        host.place_ball(-180.0, 0.0);
        tracker.tick(&host);
        host.move_player(P2, -170.0, 0.0);
        host.place_ball(-185.0, 0.0);
        assert_eq!(tracker.tick(&host).unwrap().len(), 2);
        assert_eq!(toucher(&tracker), Some(P1));
    }

    #[test]
    fn test_multi_touch_clear_drops_toucher() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Clear);
        host.place_ball(-180.0, 0.0);
        tracker.tick(&host);
        host.move_player(P2, -170.0, 0.0);
        host.place_ball(-185.0, 0.0);
        assert_eq!(tracker.tick(&host).unwrap().len(), 2);
        assert_eq!(toucher(&tracker), None);
    }

    #[test]
    fn test_tick_ignored_when_engine_off() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.pause();
        host.place_ball(-180.0, 0.0);
        assert!(tracker.tick(&host).is_none());
        assert_eq!(toucher(&tracker), None);
    }

    #[test]
    fn test_kickoff_edge_once_per_reset() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        assert!(tracker.kick(&snapshot(&host, P1)));
        assert!(!tracker.kick(&snapshot(&host, P2)));
        assert!(tracker.has_kicked_off());

        tracker.goal(TeamId::Red, 12.0);
        assert!(!tracker.engine_running());
        assert!(tracker.positions_reset());
        assert!(!tracker.has_kicked_off());
        assert!(tracker.game().unwrap().last_kicker.is_none());
        assert!(tracker.kick(&snapshot(&host, P3)));
    }

    #[test]
    fn test_previous_kicker_only_advances_on_new_player() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P1));
        tracker.kick(&snapshot(&host, P2));
        tracker.kick(&snapshot(&host, P2));
        let game = tracker.game().unwrap();
        assert_eq!(game.last_kicker.as_ref().map(|p| p.id), Some(P2));
        assert_eq!(game.previous_kicker.as_ref().map(|p| p.id), Some(P1));
    }

    #[test]
    fn test_assist_from_same_team_kicker() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P1));
        tracker.kick(&snapshot(&host, P2));
        let event = tracker.goal(TeamId::Red, 30.0).unwrap();
        assert_eq!(event.scorer.id, P2);
        assert!(!event.own_goal);
        assert_eq!(event.assist.map(|a| a.id), Some(P1));
    }

    #[test]
    fn test_no_assist_from_opponent() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P3));
        tracker.kick(&snapshot(&host, P2));
        let event = tracker.goal(TeamId::Red, 30.0).unwrap();
        assert_eq!(event.scorer.id, P2);
        assert!(event.assist.is_none());
    }

    #[test]
    fn test_own_goal_flag_and_no_assist() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P1));
        tracker.kick(&snapshot(&host, P3));
        let event = tracker.goal(TeamId::Red, 30.0).unwrap();
        assert_eq!(event.scorer.id, P3);
        assert!(event.own_goal);
        assert!(event.assist.is_none());
        assert_eq!(event.team, TeamId::Red);
    }

    #[test]
    fn test_kick_then_teammate_touch_credits_toucher() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P1));
        // ball reaches P2 without P2 kicking
        host.place_ball(-100.0, 40.0);
        tracker.tick(&host);
        host.place_ball(0.0, 0.0);
        tracker.tick(&host);

        let event = tracker.goal(TeamId::Red, 42.0).unwrap();
        assert_eq!(event.scorer.id, P2);
        assert!(!event.own_goal);
        assert_eq!(event.assist.map(|a| a.id), Some(P1));
        assert_eq!(tracker.scoring().len(), 1);
    }

    #[test]
    fn test_keeper_touch_leaves_goal_to_kicker() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P2));
        tracker.kick(&snapshot(&host, P1));
        // shot grazes the Blue keeper on its way in
        host.place_ball(190.0, 0.0);
        tracker.tick(&host);
        assert_eq!(toucher(&tracker), Some(P3));
        assert!(tracker.game().unwrap().deflection.is_none());

        let event = tracker.goal(TeamId::Red, 18.0).unwrap();
        assert_eq!(event.scorer.id, P1);
        assert!(!event.own_goal);
        assert_eq!(event.assist.map(|a| a.id), Some(P2));
    }

    #[test]
    fn test_kicker_lingering_on_ball_is_not_a_deflection() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P2));
        tracker.kick(&snapshot(&host, P1));
        host.place_ball(-190.0, 0.0);
        tracker.tick(&host);
        let event = tracker.goal(TeamId::Red, 5.0).unwrap();
        assert_eq!(event.scorer.id, P1);
        assert_eq!(event.assist.map(|a| a.id), Some(P2));
    }

    #[test]
    fn test_goal_without_contact_appends_nothing() {
        let (_host, mut tracker) = setup(MultiTouchPolicy::Hold);
        assert!(tracker.goal(TeamId::Blue, 1.0).is_none());
        assert!(tracker.scoring().is_empty());
        assert!(matches!(tracker.phase(), MatchPhase::Paused { halt: Halt::Goal, .. }));
    }

    #[test]
    fn test_toucher_fallback_scorer() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        host.place_ball(200.0, 20.0);
        tracker.tick(&host);
        let event = tracker.goal(TeamId::Blue, 3.0).unwrap();
        assert_eq!(event.scorer.id, P3);
        assert!(event.assist.is_none());
    }

    #[test]
    fn test_pause_unpause_restores_phase() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P1));
        assert!(tracker.pause());
        assert!(!tracker.engine_running());
        assert!(!tracker.pause());
        assert!(tracker.unpause());
        assert!(tracker.has_kicked_off());
    }

    #[test]
    fn test_victory_then_stop_returns_history() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        tracker.kick(&snapshot(&host, P1));
        tracker.goal(TeamId::Red, 10.0);
        assert!(!tracker.unpause());
        assert_eq!(tracker.victory().len(), 1);
        assert!(matches!(tracker.phase(), MatchPhase::Paused { halt: Halt::Victory, .. }));
        let history = tracker.stop();
        assert_eq!(history.len(), 1);
        assert!(matches!(tracker.phase(), MatchPhase::Idle));
        assert!(tracker.scoring().is_empty());
    }

    #[test]
    fn test_team_change_updates_radius() {
        let (host, mut tracker) = setup(MultiTouchPolicy::Hold);
        host.set_player_disc_properties(P3, crate::models::DiscUpdate { radius: Some(20.0), ..Default::default() });
        tracker.team_change(&host, &snapshot(&host, P3));
        assert_eq!(tracker.game().unwrap().calibration.player_radius, 20.0);
    }
}
