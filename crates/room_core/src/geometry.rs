//! Pure helpers shared by the tracker and the physics-facing plugins.

use serde::{Deserialize, Serialize};

use crate::models::{PlayerSnapshot, TeamId};

/// Position on the pitch, in host units. The kickoff spot is the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points.
pub fn distance(p1: Point, p2: Point) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

/// A room only counts as a match when both competitive sides are occupied.
///
/// Solo training and one-sided scrimmages are excluded so they never reach
/// the persisted stats or the man-of-the-match ranking.
pub fn is_configured_match(players: &[PlayerSnapshot]) -> bool {
    let has = |team: TeamId| players.iter().any(|p| p.team == team);
    has(TeamId::Red) && has(TeamId::Blue)
}
