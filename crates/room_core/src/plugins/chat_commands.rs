//! General admin commands and the join hint.

use crate::error::Result;
use crate::host::SharedHost;
use crate::models::{Announcement, AnnouncementSound, PlayerSnapshot, COLOR_HIGHLIGHT};

use super::{ChatCommand, RoomPlugin};

const CLEAR_BANS: &str = "clearbans";
const REMATCH: &str = "rematch";
const RESET: &str = "reset";

pub struct ChatCommandRegistrar {
    host: SharedHost,
}

impl ChatCommandRegistrar {
    pub fn new(host: SharedHost) -> Self {
        Self { host }
    }

    fn rematch(&self) {
        self.host.stop_game();
        for player in self.host.player_list() {
            if let Some(other) = player.team.opponent() {
                self.host.set_player_team(player.id, other);
            }
        }
        self.host.start_game();
        self.host.send_announcement(Announcement::headline("📢 Rematch game !"));
    }

    fn reset(&self) {
        self.host.stop_game();
        self.host.start_game();
        self.host.send_announcement(Announcement::headline("📢 Game reset !"));
    }
}

impl RoomPlugin for ChatCommandRegistrar {
    fn name(&self) -> &'static str {
        "chat_commands"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![
            ChatCommand { label: "Clear bans", triggers: &["!clearbans"], admin: true, key: CLEAR_BANS },
            ChatCommand { label: "Match - Rematch", triggers: &["!rematch", "!rm"], admin: true, key: REMATCH },
            ChatCommand { label: "Match - Reset", triggers: &["!reset", "!rs"], admin: true, key: RESET },
        ]
    }

    fn on_chat_command(&mut self, key: &str, author: &PlayerSnapshot, _message: &str) -> Result<bool> {
        match key {
            CLEAR_BANS => {
                log::info!("Bans cleared by {}", author.name);
                self.host.clear_bans();
            }
            REMATCH => self.rematch(),
            RESET => self.reset(),
            _ => {}
        }
        Ok(false)
    }

    fn on_player_join(&mut self, player: &PlayerSnapshot) -> Result<()> {
        self.host.send_announcement(
            Announcement::new("Type !help to list all available commands !")
                .to(player.id)
                .color(COLOR_HIGHLIGHT)
                .sound(AnnouncementSound::Notification),
        );
        Ok(())
    }
}
