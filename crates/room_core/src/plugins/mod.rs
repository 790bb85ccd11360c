//! Rule plugins
//!
//! Every room rule is a [`RoomPlugin`]: a fixed set of optional hooks with
//! no-op defaults. The [`PluginSet`] fans each event out in registration
//! order and isolates plugins from each other, so one failing rule never
//! starves the rest of the room.
//!
//! ## Registration order
//! 1. Chat commands (`!clearbans`, `!rematch`, `!reset`)
//! 2. Stadium switcher
//! 3. Team shuffler
//! 4. Power shot
//! 5. Offside
//! 6. Idle monitor
//! 7. Possession
//! 8. Goal announcer
//! 9. Victory announcer
//! 10. Stats persister
//! 11. Match recorder

pub mod chat_commands;
pub mod goal_announcer;
pub mod idle_player;
pub mod match_recorder;
pub mod offside;
pub mod player_stats;
pub mod possession;
pub mod power_shot;
pub mod shuffle;
pub mod stadium_switcher;
pub mod victory_announcer;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{PlayerSnapshot, ScoreSummary, ScoringEvent, TeamId};
use crate::store::{SharedStore, StoreSchema};

pub use chat_commands::ChatCommandRegistrar;
pub use goal_announcer::GoalAnnouncer;
pub use idle_player::IdlePlayerMonitor;
pub use match_recorder::MatchRecorder;
pub use offside::OffsideDetector;
pub use player_stats::StatsPersister;
pub use possession::PossessionTracker;
pub use power_shot::PowerShotCharger;
pub use shuffle::TeamShuffler;
pub use stadium_switcher::StadiumSwitcher;
pub use victory_announcer::VictoryAnnouncer;

/// Chat command descriptor. The owning plugin runs it in
/// [`RoomPlugin::on_chat_command`] under `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatCommand {
    pub label: &'static str,
    /// Prefixes a chat line must start with
    pub triggers: &'static [&'static str],
    pub admin: bool,
    pub key: &'static str,
}

impl ChatCommand {
    /// First-match rule: trigger is a prefix and the author may run it.
    pub fn matches(&self, message: &str, author_is_admin: bool) -> bool {
        (!self.admin || author_is_admin) && self.triggers.iter().any(|t| message.starts_with(t))
    }

    /// `label : !a, !b` line of the `!help` listing
    pub fn help_line(&self) -> String {
        format!("{} : {}", self.label, self.triggers.join(", "))
    }
}

/// Roster after a join or a leave.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterChange {
    pub players: Vec<PlayerSnapshot>,
    /// Player count remembered from the previous change
    pub previous_count: usize,
    /// Set on joins
    pub new_player: Option<PlayerSnapshot>,
}

/// Payload of a goal.
#[derive(Debug, Clone, Copy)]
pub struct TeamGoal<'a> {
    pub team: TeamId,
    /// Event appended by this goal, `None` when nobody could be credited
    pub scored: Option<&'a ScoringEvent>,
    pub history: &'a [ScoringEvent],
    pub scores: &'a ScoreSummary,
}

#[allow(unused_variables)]
pub trait RoomPlugin: Send {
    fn name(&self) -> &'static str;

    fn chat_commands(&self) -> Vec<ChatCommand> {
        Vec::new()
    }

    /// Run the command registered under `key`. `Ok(true)` relays the line to the room.
    fn on_chat_command(&mut self, key: &str, author: &PlayerSnapshot, message: &str) -> Result<bool> {
        Ok(true)
    }

    fn on_store_upgrade(&mut self, schema: &mut StoreSchema) {}
    fn on_store_ready(&mut self, store: SharedStore) {}

    fn on_game_start(&mut self, by: Option<&PlayerSnapshot>) -> Result<()> {
        Ok(())
    }
    fn on_game_stop(&mut self, by: Option<&PlayerSnapshot>, history: &[ScoringEvent]) -> Result<()> {
        Ok(())
    }
    fn on_game_pause(&mut self, by: Option<&PlayerSnapshot>) -> Result<()> {
        Ok(())
    }
    fn on_game_unpause(&mut self, by: Option<&PlayerSnapshot>) -> Result<()> {
        Ok(())
    }
    /// The engine started ticking (start, unpause, positions reset)
    fn on_game_on(&mut self) -> Result<()> {
        Ok(())
    }
    /// The engine stopped ticking, whatever the reason
    fn on_game_off(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_game_tick(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_game_kickoff(&mut self, by: &PlayerSnapshot) -> Result<()> {
        Ok(())
    }
    /// Kickoff re-armed; the next kick is a kickoff again
    fn on_kickoff_reset(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_positions_reset(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_player_join(&mut self, player: &PlayerSnapshot) -> Result<()> {
        Ok(())
    }
    fn on_player_leave(&mut self, player: &PlayerSnapshot) -> Result<()> {
        Ok(())
    }
    fn on_player_team_change(&mut self, player: &PlayerSnapshot, by: Option<&PlayerSnapshot>) -> Result<()> {
        Ok(())
    }
    fn on_player_activity(&mut self, player: &PlayerSnapshot) -> Result<()> {
        Ok(())
    }
    fn on_player_ball_kick(&mut self, player: &PlayerSnapshot) -> Result<()> {
        Ok(())
    }
    /// Every running tick, with the current toucher set (possibly empty)
    fn on_players_ball_touch(&mut self, players: &[PlayerSnapshot]) -> Result<()> {
        Ok(())
    }
    fn on_team_goal(&mut self, goal: &TeamGoal<'_>) -> Result<()> {
        Ok(())
    }
    fn on_team_victory(&mut self, history: &[ScoringEvent], scores: &ScoreSummary) -> Result<()> {
        Ok(())
    }
    fn on_roster_changed(&mut self, change: &RosterChange) -> Result<()> {
        Ok(())
    }
    fn on_stadium_change(&mut self, name: &str) -> Result<()> {
        Ok(())
    }

    /// Hand over spawned background work (uploads, stat writes) so the
    /// owner can await it.
    fn drain_tasks(&mut self) -> Vec<JoinHandle<()>> {
        Vec::new()
    }
}

/// Plugins in registration order.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn RoomPlugin>>,
}

impl PluginSet {
    pub fn new(plugins: Vec<Box<dyn RoomPlugin>>) -> Self {
        Self { plugins }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// `(plugin index, command)` for every declared command, in order.
    pub fn commands(&self) -> Vec<(usize, ChatCommand)> {
        self.plugins
            .iter()
            .enumerate()
            .flat_map(|(index, p)| p.chat_commands().into_iter().map(move |c| (index, c)))
            .collect()
    }

    pub fn upgrade_store(&mut self, schema: &mut StoreSchema) {
        for plugin in &mut self.plugins {
            plugin.on_store_upgrade(schema);
        }
    }

    pub fn store_ready(&mut self, store: &SharedStore) {
        for plugin in &mut self.plugins {
            plugin.on_store_ready(store.clone());
        }
    }

    /// Deliver one hook to every plugin. Errors and panics are logged per
    /// plugin and never interrupt the fan-out.
    pub fn broadcast<F>(&mut self, hook: &'static str, mut f: F)
    where
        F: FnMut(&mut dyn RoomPlugin) -> Result<()>,
    {
        for plugin in &mut self.plugins {
            let name = plugin.name();
            let outcome = catch_unwind(AssertUnwindSafe(|| f(plugin.as_mut())));
            log_outcome(name, hook, outcome);
        }
    }

    /// Run one command on the plugin that declared it. A failing command is
    /// logged and the line is not relayed.
    pub fn run_command(&mut self, index: usize, command: &ChatCommand, author: &PlayerSnapshot, message: &str) -> bool {
        let Some(plugin) = self.plugins.get_mut(index) else {
            log::warn!("Command {} points at missing plugin #{}", command.key, index);
            return false;
        };
        let name = plugin.name();
        match catch_unwind(AssertUnwindSafe(|| plugin.on_chat_command(command.key, author, message))) {
            Ok(Ok(relay)) => relay,
            Ok(Err(e)) => {
                log::warn!("{}: command {} failed: {}", name, command.key, e);
                false
            }
            Err(panic) => {
                log::error!("{}: command {} panicked: {}", name, command.key, panic_message(&panic));
                false
            }
        }
    }

    pub fn drain_tasks(&mut self) -> Vec<JoinHandle<()>> {
        self.plugins.iter_mut().flat_map(|p| p.drain_tasks()).collect()
    }
}

fn log_outcome(name: &str, hook: &str, outcome: std::thread::Result<Result<()>>) {
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.is_transient() => log::debug!("{}::{} skipped: {}", name, hook, e),
        Ok(Err(e)) => log::warn!("{}::{} failed: {}", name, hook, e),
        Err(panic) => log::error!("{}::{} panicked: {}", name, hook, panic_message(&panic)),
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoomError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Dummy {
        name: &'static str,
        calls: Arc<AtomicU32>,
        fail: Option<&'static str>,
    }

    impl RoomPlugin for Dummy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn chat_commands(&self) -> Vec<ChatCommand> {
            vec![ChatCommand { label: "Dummy", triggers: &["!dummy", "!dm"], admin: true, key: "dummy" }]
        }

        fn on_chat_command(&mut self, _key: &str, _author: &PlayerSnapshot, _message: &str) -> Result<bool> {
            Ok(false)
        }

        fn on_game_tick(&mut self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail {
                Some("panic") => panic!("dummy exploded"),
                Some(_) => Err(RoomError::Config("dummy failure".into())),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_broadcast_isolates_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let dummy = |name, fail| -> Box<dyn RoomPlugin> { Box::new(Dummy { name, calls: calls.clone(), fail }) };
        let mut set = PluginSet::new(vec![dummy("a", Some("panic")), dummy("b", Some("error")), dummy("c", None)]);

        set.broadcast("on_game_tick", |p| p.on_game_tick());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(set.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_command_matching() {
        let command = ChatCommand { label: "Dummy", triggers: &["!dummy", "!dm"], admin: true, key: "dummy" };
        assert!(command.matches("!dm now", true));
        assert!(!command.matches("!dm", false));
        assert!(!command.matches("dummy", true));
        assert_eq!(command.help_line(), "Dummy : !dummy, !dm");
    }

    #[test]
    fn test_commands_keep_plugin_index() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut set = PluginSet::new(vec![
            Box::new(Dummy { name: "a", calls: calls.clone(), fail: None }),
            Box::new(Dummy { name: "b", calls, fail: None }),
        ]);
        let commands = set.commands();
        assert_eq!(commands.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);

        let author = PlayerSnapshot::new(crate::models::PlayerId(1), "a", TeamId::Red);
        assert!(!set.run_command(1, &commands[1].1, &author, "!dummy"));
        assert!(!set.run_command(7, &commands[1].1, &author, "!dummy"));
    }
}
