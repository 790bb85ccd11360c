use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Point;

/// Host-assigned player id. Stable while connected, reused across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team assignment as the host numbers it (0 spectators, 1 red, 2 blue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamId {
    #[default]
    Spectators,
    Red,
    Blue,
}

impl TeamId {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(TeamId::Spectators),
            1 => Some(TeamId::Red),
            2 => Some(TeamId::Blue),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            TeamId::Spectators => 0,
            TeamId::Red => 1,
            TeamId::Blue => 2,
        }
    }

    pub fn is_playing(self) -> bool {
        self != TeamId::Spectators
    }

    /// The other competitive side. Spectators have no opponent.
    pub fn opponent(self) -> Option<Self> {
        match self {
            TeamId::Red => Some(TeamId::Blue),
            TeamId::Blue => Some(TeamId::Red),
            TeamId::Spectators => None,
        }
    }

    /// Sign of the x axis this team attacks towards. Red kicks off attacking +x.
    pub fn attack_direction(self) -> f64 {
        match self {
            TeamId::Red => 1.0,
            TeamId::Blue => -1.0,
            TeamId::Spectators => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TeamId::Spectators => "Spectators",
            TeamId::Red => "Red",
            TeamId::Blue => "Blue",
        }
    }
}

/// Shallow copy of a host player object.
///
/// The host mutates its own player objects every tick; everything the core
/// keeps across events is one of these clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub team: TeamId,
    /// `None` while spectating or when no game is running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default)]
    pub admin: bool,
    /// Public auth token, only supplied by the host at join time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl PlayerSnapshot {
    pub fn new(id: PlayerId, name: impl Into<String>, team: TeamId) -> Self {
        Self { id, name: name.into(), team, position: None, admin: false, auth: None }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn is_playing(&self) -> bool {
        self.team.is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_index_roundtrip() {
        for index in 0..3 {
            assert_eq!(TeamId::from_index(index).map(TeamId::index), Some(index));
        }
        assert_eq!(TeamId::from_index(3), None);
    }

    #[test]
    fn test_opponents_and_direction() {
        assert_eq!(TeamId::Red.opponent(), Some(TeamId::Blue));
        assert_eq!(TeamId::Blue.opponent(), Some(TeamId::Red));
        assert_eq!(TeamId::Spectators.opponent(), None);
        assert!(TeamId::Red.attack_direction() > 0.0);
        assert!(TeamId::Blue.attack_direction() < 0.0);
    }

    #[test]
    fn test_snapshot_json_skips_empty_fields() {
        let player = PlayerSnapshot::new(PlayerId(4), "Fish", TeamId::Red);
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["team"], "red");
        assert!(json.get("position").is_none());
        assert!(json.get("auth").is_none());
    }
}
