use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Disc index of the ball in the host's disc list.
pub const BALL_DISC: usize = 0;

/// Physical properties of a disc (ball or player) as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscProperties {
    pub x: f64,
    pub y: f64,
    pub xspeed: f64,
    pub yspeed: f64,
    pub radius: f64,
    /// 0xRRGGBB
    pub color: u32,
}

impl DiscProperties {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Apply a partial update in place, the way the host does.
    pub fn apply(&mut self, update: &DiscUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(xspeed) = update.xspeed {
            self.xspeed = xspeed;
        }
        if let Some(yspeed) = update.yspeed {
            self.yspeed = yspeed;
        }
        if let Some(radius) = update.radius {
            self.radius = radius;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
    }
}

impl Default for DiscProperties {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, xspeed: 0.0, yspeed: 0.0, radius: 10.0, color: 0xffffff }
    }
}

/// Partial disc update; `None` fields are left untouched by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xspeed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yspeed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl DiscUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    pub fn speed(xspeed: f64, yspeed: f64) -> Self {
        Self { xspeed: Some(xspeed), yspeed: Some(yspeed), ..Self::default() }
    }

    pub fn color(color: u32) -> Self {
        Self { color: Some(color), ..Self::default() }
    }

    /// Place the disc and kill its momentum.
    pub fn placed_at(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), xspeed: Some(0.0), yspeed: Some(0.0), ..Self::default() }
    }

    pub fn with_x_only(x: f64) -> Self {
        Self { x: Some(x), xspeed: Some(0.0), yspeed: Some(0.0), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let mut disc = DiscProperties { x: 5.0, y: 6.0, xspeed: 1.0, yspeed: -1.0, radius: 10.0, color: 0xabcdef };
        disc.apply(&DiscUpdate::speed(2.0, -2.0));
        assert_eq!((disc.x, disc.y), (5.0, 6.0));
        assert_eq!((disc.xspeed, disc.yspeed), (2.0, -2.0));
        assert_eq!(disc.color, 0xabcdef);

        disc.apply(&DiscUpdate::placed_at(-3.0, 1.0));
        assert_eq!(disc.position(), Point::new(-3.0, 1.0));
        assert_eq!((disc.xspeed, disc.yspeed), (0.0, 0.0));
    }
}
