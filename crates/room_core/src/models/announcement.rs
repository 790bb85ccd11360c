use serde::{Deserialize, Serialize};

use super::player::PlayerId;

pub const COLOR_HIGHLIGHT: u32 = 0xff00ff;
pub const COLOR_POWER: u32 = 0x00ff00;
pub const COLOR_WARNING: u32 = 0xff0000;
pub const COLOR_MUTED: u32 = 0xaaaaaa;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnouncementStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    Small,
    SmallBold,
    SmallItalic,
}

/// Notification sound level; the host numbers them 0, 1, 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementSound {
    None,
    #[default]
    Normal,
    Notification,
}

/// A room-wide or private message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default)]
    pub style: AnnouncementStyle,
    #[serde(default)]
    pub sound: AnnouncementSound,
}

impl Announcement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: None,
            color: None,
            style: AnnouncementStyle::Normal,
            sound: AnnouncementSound::Normal,
        }
    }

    /// Bold highlighted message with a notification ping, used for match news.
    pub fn headline(text: impl Into<String>) -> Self {
        Self::new(text)
            .color(COLOR_HIGHLIGHT)
            .style(AnnouncementStyle::Bold)
            .sound(AnnouncementSound::Notification)
    }

    pub fn to(mut self, player: PlayerId) -> Self {
        self.target = Some(player);
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn style(mut self, style: AnnouncementStyle) -> Self {
        self.style = style;
        self
    }

    pub fn sound(mut self, sound: AnnouncementSound) -> Self {
        self.sound = sound;
        self
    }

    pub fn is_private(&self) -> bool {
        self.target.is_some()
    }
}
