//! Payload types exchanged between the host, the tracker and the plugins.

pub mod announcement;
pub mod disc;
pub mod player;
pub mod scoring;

pub use announcement::{
    Announcement, AnnouncementSound, AnnouncementStyle, COLOR_HIGHLIGHT, COLOR_MUTED, COLOR_POWER,
    COLOR_WARNING,
};
pub use disc::{DiscProperties, DiscUpdate, BALL_DISC};
pub use player::{PlayerId, PlayerSnapshot, TeamId};
pub use scoring::{goals_by, ScoreSummary, ScoringEvent};
