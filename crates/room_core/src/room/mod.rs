//! Room controller.
//!
//! Single entry point for every host callback. The controller keeps the
//! match tracker in step with the host, derives the engine on/off edges from
//! tracker phase changes and fans each event out to the plugins in
//! registration order. Chat lines starting with `!` are routed through the
//! merged command registry, built-in `!help` first.

pub mod events;

#[cfg(test)]
mod scenario_tests;

pub use events::HostEvent;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::sync::Arc;

use crate::config::{RoomConfig, RoomSettings};
use crate::error::{Result, RoomError};
use crate::host::SharedHost;
use crate::models::{
    Announcement, AnnouncementSound, AnnouncementStyle, PlayerId, PlayerSnapshot, ScoreSummary, TeamId,
    COLOR_HIGHLIGHT,
};
use crate::plugins::{
    ChatCommand, ChatCommandRegistrar, GoalAnnouncer, IdlePlayerMonitor, MatchRecorder, OffsideDetector,
    PluginSet, PossessionTracker, PowerShotCharger, RoomPlugin, RosterChange, StadiumSwitcher, StatsPersister,
    TeamGoal, TeamShuffler, VictoryAnnouncer,
};
use crate::store::{FileStatsStore, MemoryStatsStore, SharedStore, StoreSchema};
use crate::tracker::MatchTracker;
use crate::upload::SharedUploader;
use crate::users::{Correlation, UserRepository};

const HELP: ChatCommand = ChatCommand { label: "List all commands", triggers: &["!help"], admin: false, key: "help" };
const UNKNOWN_COMMAND: &str = "This command doesn't exist, noob";
const DUPLICATE_SESSION: &str = "🍖 Trying to sneak in with a double connection ?";

/// Registry entry. `None` is the built-in `!help`.
type RegisteredCommand = (Option<usize>, ChatCommand);

pub struct Room {
    host: SharedHost,
    tracker: MatchTracker,
    users: Arc<UserRepository>,
    plugins: PluginSet,
    commands: Vec<RegisteredCommand>,
    /// Roster size remembered from the last join or leave
    player_count: usize,
    rng: ChaCha8Rng,
}

impl Room {
    pub fn new(host: SharedHost, config: &RoomConfig, users: Arc<UserRepository>, plugins: PluginSet) -> Self {
        let mut commands: Vec<RegisteredCommand> = vec![(None, HELP)];
        commands.extend(plugins.commands().into_iter().map(|(index, command)| (Some(index), command)));
        log::info!("Room ready with plugins {:?}", plugins.names());

        Self {
            host,
            tracker: MatchTracker::new(config.touch.clone()),
            users,
            plugins,
            commands,
            player_count: 0,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Every rule of the room, in registration order.
    pub fn default_plugins(
        host: &SharedHost,
        config: &RoomConfig,
        users: &Arc<UserRepository>,
        uploader: SharedUploader,
    ) -> PluginSet {
        let plugins: Vec<Box<dyn RoomPlugin>> = vec![
            Box::new(ChatCommandRegistrar::new(host.clone())),
            Box::new(StadiumSwitcher::new(host.clone(), config.room.default_stadium.clone())),
            Box::new(TeamShuffler::new(host.clone())),
            Box::new(PowerShotCharger::new(host.clone(), &config.power_shot)),
            Box::new(OffsideDetector::new(host.clone(), &config.offside)),
            Box::new(IdlePlayerMonitor::new(host.clone(), &config.idle)),
            Box::new(PossessionTracker::new(host.clone())),
            Box::new(GoalAnnouncer::new(host.clone())),
            Box::new(VictoryAnnouncer::new(host.clone())),
            Box::new(StatsPersister::new(host.clone(), users.clone())),
            Box::new(MatchRecorder::new(host.clone(), &config.recording, uploader)),
        ];
        PluginSet::new(plugins)
    }

    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn tracker(&self) -> &MatchTracker {
        &self.tracker
    }

    pub fn commands(&self) -> impl Iterator<Item = &ChatCommand> {
        self.commands.iter().map(|(_, command)| command)
    }

    /// Push the host-side room settings.
    pub fn apply_settings(&self, settings: &RoomSettings) {
        self.host.set_default_stadium(&settings.default_stadium);
        self.host.set_score_limit(settings.score_limit);
        self.host.set_time_limit(settings.time_limit);
    }

    // ========================
    // Stats store
    // ========================

    /// Tables every plugin needs.
    pub fn upgrade_store(&mut self) -> StoreSchema {
        let mut schema = StoreSchema::new();
        self.plugins.upgrade_store(&mut schema);
        schema
    }

    pub fn attach_store(&mut self, store: SharedStore) {
        self.plugins.store_ready(&store);
    }

    /// Open the stats store (file-backed when a path is given) and hand it to the plugins.
    pub async fn open_store(&mut self, path: Option<&Path>) -> Result<SharedStore> {
        let schema = self.upgrade_store();
        let store: SharedStore = match path {
            Some(path) => Arc::new(FileStatsStore::open(path, &schema).await?),
            None => Arc::new(MemoryStatsStore::new()),
        };
        self.attach_store(store.clone());
        Ok(store)
    }

    /// Wait for every spawned upload and stats write.
    pub async fn flush(&mut self) {
        for task in self.plugins.drain_tasks() {
            if let Err(e) = task.await {
                log::warn!("Background task failed: {}", e);
            }
        }
    }

    // ========================
    // Dispatch
    // ========================

    /// Route one host callback. Returns whether a chat line should be relayed
    /// (always true for other events).
    pub fn handle(&mut self, event: HostEvent) -> Result<bool> {
        log::trace!("Host event {}", event.label());
        match event {
            HostEvent::GameStart { by } => self.game_start(self.lookup(by).as_ref()),
            HostEvent::GameStop { by } => self.game_stop(self.lookup(by).as_ref()),
            HostEvent::GamePause { by } => self.game_pause(self.lookup(by).as_ref()),
            HostEvent::GameUnpause { by } => self.game_unpause(self.lookup(by).as_ref()),
            HostEvent::GameTick => self.game_tick(),
            HostEvent::TeamGoal { team } => self.team_goal(team),
            HostEvent::TeamVictory { scores } => self.team_victory(&scores),
            HostEvent::PositionsReset => self.positions_reset(),
            HostEvent::PlayerJoin { player } => self.player_join(&player),
            HostEvent::PlayerLeave { player } => self.player_leave(&player),
            HostEvent::PlayerTeamChange { player, by } => {
                let player = self.resolve(player, "team change")?;
                self.player_team_change(&player, self.lookup(by).as_ref());
            }
            HostEvent::PlayerActivity { player } => {
                let player = self.resolve(player, "activity")?;
                self.player_activity(&player);
            }
            HostEvent::PlayerBallKick { player } => {
                let player = self.resolve(player, "ball kick")?;
                self.player_ball_kick(&player);
            }
            HostEvent::PlayerChat { player, message } => {
                let player = self.resolve(player, "chat")?;
                return Ok(self.player_chat(&player, &message));
            }
            HostEvent::StadiumChange { name, .. } => self.stadium_change(&name),
        }
        Ok(true)
    }

    fn lookup(&self, id: Option<PlayerId>) -> Option<PlayerSnapshot> {
        id.and_then(|id| self.host.player(id))
    }

    fn resolve(&self, id: PlayerId, what: &'static str) -> Result<PlayerSnapshot> {
        self.host.player(id).ok_or(RoomError::HostUnavailable(what))
    }

    /// Emit the engine edge implied by the last tracker transition.
    fn sync_engine(&mut self, was_running: bool) {
        match (was_running, self.tracker.engine_running()) {
            (false, true) => self.plugins.broadcast("on_game_on", |p| p.on_game_on()),
            (true, false) => self.plugins.broadcast("on_game_off", |p| p.on_game_off()),
            _ => {}
        }
    }

    pub fn game_start(&mut self, by: Option<&PlayerSnapshot>) {
        let was_running = self.tracker.engine_running();
        self.tracker.start(self.host.as_ref());
        self.plugins.broadcast("on_game_start", |p| p.on_game_start(by));
        self.sync_engine(was_running);
    }

    pub fn game_stop(&mut self, by: Option<&PlayerSnapshot>) {
        let was_running = self.tracker.engine_running();
        let history = self.tracker.stop();
        log::info!("Game stopped after {} goals", history.len());
        self.plugins.broadcast("on_game_stop", |p| p.on_game_stop(by, &history));
        self.sync_engine(was_running);
    }

    pub fn game_pause(&mut self, by: Option<&PlayerSnapshot>) {
        let was_running = self.tracker.engine_running();
        self.tracker.pause();
        self.plugins.broadcast("on_game_pause", |p| p.on_game_pause(by));
        self.sync_engine(was_running);
    }

    pub fn game_unpause(&mut self, by: Option<&PlayerSnapshot>) {
        let was_running = self.tracker.engine_running();
        self.tracker.unpause();
        self.plugins.broadcast("on_game_unpause", |p| p.on_game_unpause(by));
        self.sync_engine(was_running);
    }

    pub fn game_tick(&mut self) {
        self.plugins.broadcast("on_game_tick", |p| p.on_game_tick());
        if let Some(touchers) = self.tracker.tick(self.host.as_ref()) {
            self.plugins.broadcast("on_players_ball_touch", |p| p.on_players_ball_touch(&touchers));
        }
    }

    pub fn team_goal(&mut self, team: TeamId) {
        let was_running = self.tracker.engine_running();
        let scores = self.host.scores().unwrap_or_default();
        let scored = self.tracker.goal(team, scores.time);
        if let Some(event) = &scored {
            log::info!("Goal for {} by {}", team.label(), event.scorer.name);
        }
        let goal = TeamGoal { team, scored: scored.as_ref(), history: self.tracker.scoring(), scores: &scores };
        self.plugins.broadcast("on_team_goal", |p| p.on_team_goal(&goal));
        self.sync_engine(was_running);
    }

    pub fn team_victory(&mut self, scores: &ScoreSummary) {
        let was_running = self.tracker.engine_running();
        let history = self.tracker.victory();
        self.plugins.broadcast("on_team_victory", |p| p.on_team_victory(history, scores));
        self.sync_engine(was_running);
    }

    pub fn positions_reset(&mut self) {
        let was_running = self.tracker.engine_running();
        self.tracker.positions_reset();
        self.plugins.broadcast("on_kickoff_reset", |p| p.on_kickoff_reset());
        self.plugins.broadcast("on_positions_reset", |p| p.on_positions_reset());
        self.sync_engine(was_running);
    }

    pub fn player_ball_kick(&mut self, player: &PlayerSnapshot) {
        if self.tracker.kick(player) {
            log::debug!("Kickoff by {}", player.name);
            self.plugins.broadcast("on_game_kickoff", |p| p.on_game_kickoff(player));
        }
        self.plugins.broadcast("on_player_ball_kick", |p| p.on_player_ball_kick(player));
    }

    pub fn player_team_change(&mut self, player: &PlayerSnapshot, by: Option<&PlayerSnapshot>) {
        self.tracker.team_change(self.host.as_ref(), player);
        self.plugins.broadcast("on_player_team_change", |p| p.on_player_team_change(player, by));
    }

    pub fn player_activity(&mut self, player: &PlayerSnapshot) {
        self.plugins.broadcast("on_player_activity", |p| p.on_player_activity(player));
    }

    pub fn stadium_change(&mut self, name: &str) {
        log::info!("Stadium is now {}", name);
        self.plugins.broadcast("on_stadium_change", |p| p.on_stadium_change(name));
    }

    // ========================
    // Roster
    // ========================

    pub fn player_join(&mut self, player: &PlayerSnapshot) {
        let connected: Vec<PlayerId> = self.host.player_list().iter().map(|p| p.id).collect();
        let greeting = match self.users.correlate(player, &connected) {
            Correlation::DuplicateSession(user) => {
                log::warn!("{} tried a second session as {}", player.name, user.id);
                self.host.kick_player(player.id, DUPLICATE_SESSION, false);
                return;
            }
            Correlation::Registered(user) => {
                log::info!("{} joined as {}", player.name, user.id);
                if user.super_admin {
                    self.host.set_player_admin(player.id, true);
                }
                format!("✅ {}", user.greeting(&mut self.rng))
            }
            Correlation::Anonymous => format!("Welcome {} !", player.name),
        };
        self.host.send_announcement(
            Announcement::new(greeting)
                .color(COLOR_HIGHLIGHT)
                .style(AnnouncementStyle::Bold)
                .sound(AnnouncementSound::None),
        );

        self.plugins.broadcast("on_player_join", |p| p.on_player_join(player));
        self.roster_changed(Some(player.clone()));
    }

    pub fn player_leave(&mut self, player: &PlayerSnapshot) {
        if let Some(user) = self.users.release(player.id) {
            log::info!("{} left, session of {} released", player.name, user);
        }
        self.plugins.broadcast("on_player_leave", |p| p.on_player_leave(player));
        self.roster_changed(None);
    }

    fn roster_changed(&mut self, new_player: Option<PlayerSnapshot>) {
        let players = self.host.player_list();
        let Some(first) = players.first() else {
            self.host.stop_game();
            self.player_count = 0;
            return;
        };
        let first = first.id;

        let change = RosterChange { players, previous_count: self.player_count, new_player };
        self.plugins.broadcast("on_roster_changed", |p| p.on_roster_changed(&change));

        if !self.host.player_list().iter().any(|p| p.admin) {
            self.host.set_player_admin(first, true);
        }
        self.player_count = change.players.len();
    }

    // ========================
    // Chat
    // ========================

    /// Returns whether the line is relayed to the room.
    pub fn player_chat(&mut self, player: &PlayerSnapshot, message: &str) -> bool {
        if !message.starts_with('!') {
            return true;
        }
        let found = self.commands.iter().find(|(_, command)| command.matches(message, player.admin)).copied();
        match found {
            Some((None, _)) => self.help(),
            Some((Some(index), command)) => self.plugins.run_command(index, &command, player, message),
            None => {
                log::debug!("{} from {}", RoomError::UnknownCommand(message.to_string()), player.name);
                self.host.send_chat(UNKNOWN_COMMAND, Some(player.id));
                false
            }
        }
    }

    fn help(&self) -> bool {
        let lines: Vec<String> = self.commands().map(ChatCommand::help_line).collect();
        self.host.announce(&lines.join("\n"));
        true
    }
}
