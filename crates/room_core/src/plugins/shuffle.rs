//! Team shuffler.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::Result;
use crate::host::SharedHost;
use crate::models::{Announcement, PlayerId, PlayerSnapshot, TeamId};

use super::{ChatCommand, RoomPlugin};

const SHUFFLE: &str = "shuffle";

/// Shuffle the whole roster and deal it alternately to Red and Blue.
///
/// With more than two players a draw identical to the current teams is
/// rejected and redrawn; with two or fewer any draw is accepted.
pub fn shuffle_teams<R: Rng + ?Sized>(players: &[PlayerSnapshot], rng: &mut R) -> Vec<(PlayerId, TeamId)> {
    let mut current: Vec<(PlayerId, TeamId)> = players.iter().map(|p| (p.id, p.team)).collect();
    current.sort_by_key(|(id, _)| *id);

    let mut ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    loop {
        ids.shuffle(rng);
        let assignment: Vec<(PlayerId, TeamId)> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, if index % 2 == 0 { TeamId::Red } else { TeamId::Blue }))
            .collect();

        let mut sorted = assignment.clone();
        sorted.sort_by_key(|(id, _)| *id);
        if ids.len() <= 2 || sorted != current {
            return assignment;
        }
    }
}

pub struct TeamShuffler {
    host: SharedHost,
    rng: ChaCha8Rng,
}

impl TeamShuffler {
    pub fn new(host: SharedHost) -> Self {
        Self::with_rng(host, ChaCha8Rng::from_entropy())
    }

    pub fn with_rng(host: SharedHost, rng: ChaCha8Rng) -> Self {
        Self { host, rng }
    }
}

impl RoomPlugin for TeamShuffler {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![ChatCommand { label: "Match - Shuffle teams", triggers: &["!shuffle", "!sf"], admin: true, key: SHUFFLE }]
    }

    fn on_chat_command(&mut self, _key: &str, _author: &PlayerSnapshot, _message: &str) -> Result<bool> {
        self.host.stop_game();
        let players = self.host.player_list();
        for (id, team) in shuffle_teams(&players, &mut self.rng) {
            self.host.set_player_team(id, team);
        }
        self.host.start_game();
        self.host.send_announcement(Announcement::headline("📢 Teams shuffled !"));
        Ok(false)
    }
}
