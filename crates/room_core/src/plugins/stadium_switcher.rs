//! Stadium switching commands and the solo-training roster rule.

use crate::error::Result;
use crate::host::SharedHost;
use crate::models::{PlayerSnapshot, TeamId};
use crate::stadium::{self, StadiumKind};

use super::{ChatCommand, RoomPlugin, RosterChange};

const FUTSAL: &str = "futsal";
const TRAINING: &str = "training";
const SNIPER: &str = "sniper";
const DEFAULT: &str = "default";

pub struct StadiumSwitcher {
    host: SharedHost,
    default_stadium: String,
    training: bool,
}

impl StadiumSwitcher {
    pub fn new(host: SharedHost, default_stadium: impl Into<String>) -> Self {
        Self { host, default_stadium: default_stadium.into(), training: false }
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Load the smallest layout of `kind` that fits the room. Returns false
    /// when the catalog has nothing big enough.
    pub fn change_stadium(&mut self, kind: StadiumKind) -> bool {
        let nb_players = self.host.player_list().len();
        let Some(layout) = stadium::select(kind, nb_players) else {
            log::info!("No {} stadium for {} players", kind.label(), nb_players);
            return false;
        };
        self.host.stop_game();
        self.host.set_custom_stadium(layout.content);
        self.training = kind == StadiumKind::Training;
        log::debug!("Stadium switched to {}", layout.name);
        true
    }

    fn switch_for(&mut self, kind: StadiumKind, author: &PlayerSnapshot) {
        if !self.change_stadium(kind) {
            self.host
                .send_chat(&format!("No {} stadium fits this many players", kind.label()), Some(author.id));
        }
    }
}

impl RoomPlugin for StadiumSwitcher {
    fn name(&self) -> &'static str {
        "stadium_switcher"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![
            ChatCommand { label: "Stadium - Futsal", triggers: &["!futsal", "!ft"], admin: true, key: FUTSAL },
            ChatCommand { label: "Stadium - Training", triggers: &["!training", "!tr"], admin: true, key: TRAINING },
            ChatCommand { label: "Stadium - Sniper", triggers: &["!sniper"], admin: true, key: SNIPER },
            ChatCommand { label: "Stadium - Default", triggers: &["!default", "!ds"], admin: true, key: DEFAULT },
        ]
    }

    fn on_chat_command(&mut self, key: &str, author: &PlayerSnapshot, _message: &str) -> Result<bool> {
        match key {
            FUTSAL => self.switch_for(StadiumKind::Futsal, author),
            TRAINING => self.switch_for(StadiumKind::Training, author),
            SNIPER => self.switch_for(StadiumKind::Sniper, author),
            DEFAULT => {
                self.host.stop_game();
                self.host.set_default_stadium(&self.default_stadium);
                self.training = false;
            }
            _ => {}
        }
        Ok(false)
    }

    fn on_roster_changed(&mut self, change: &RosterChange) -> Result<()> {
        if change.players.len() == 1 && change.previous_count == 0 {
            let solo = &change.players[0];
            self.change_stadium(StadiumKind::Training);
            self.host.set_player_team(solo.id, TeamId::Red);
            self.host.start_game();
        } else if self.training {
            if let Some(player) = &change.new_player {
                self.host.set_player_team(player.id, TeamId::Red);
            }
        }
        Ok(())
    }

    fn on_stadium_change(&mut self, name: &str) -> Result<()> {
        self.training = stadium::by_name(name).map_or(false, |s| s.kind == StadiumKind::Training);
        Ok(())
    }
}
