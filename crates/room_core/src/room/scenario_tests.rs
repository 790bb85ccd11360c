//! End-to-end room scenarios against the in-memory host.

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};

use super::*;
use crate::host::{HostCommand, MemoryHost, RoomHost};
use crate::models::ScoringEvent;
use crate::store::{MemoryStatsStore, StatsStore};
use crate::upload::{UploadError, Uploader};
use crate::users::RegisteredUser;

struct NoUpload;

#[async_trait]
impl Uploader for NoUpload {
    async fn upload(&self, _file_name: &str, _bytes: Vec<u8>) -> std::result::Result<String, UploadError> {
        Err(UploadError::Rejected("uploads disabled in tests".into()))
    }
}

struct Harness {
    host: Arc<MemoryHost>,
    room: Room,
    store: Arc<MemoryStatsStore>,
}

impl Harness {
    fn new() -> Self {
        let host = Arc::new(MemoryHost::new());
        let shared: SharedHost = host.clone();
        let config = RoomConfig::default();
        let users = Arc::new(UserRepository::new(vec![
            RegisteredUser::new("fish", "Fish").with_public_id("token-fish"),
            RegisteredUser::new("pat", "Pat").with_public_id("token-pat"),
        ]));
        let plugins = Room::default_plugins(&shared, &config, &users, Arc::new(NoUpload));
        let mut room = Room::new(shared, &config, users, plugins).with_rng(ChaCha8Rng::seed_from_u64(3));

        let store = Arc::new(MemoryStatsStore::new());
        let schema = room.upgrade_store();
        assert!(schema.has_table(crate::store::STATS_TABLE));
        room.attach_store(store.clone());
        Self { host, room, store }
    }

    fn join(&mut self, player: PlayerSnapshot) -> PlayerSnapshot {
        self.host.add_player(player.clone());
        self.room.player_join(&player);
        player
    }

    fn player(&self, id: u32) -> PlayerSnapshot {
        self.host.player(PlayerId(id)).unwrap()
    }

    /// P1 and P2 on Red, P3 on Blue, game running.
    fn three_player_match(&mut self) {
        self.join(PlayerSnapshot::new(PlayerId(1), "Fish", TeamId::Spectators).with_auth("token-fish"));
        self.join(PlayerSnapshot::new(PlayerId(2), "Pat", TeamId::Spectators).with_auth("token-pat"));
        self.join(PlayerSnapshot::new(PlayerId(3), "Val", TeamId::Spectators));
        self.host.stop_game();
        self.host.set_player_team(PlayerId(1), TeamId::Red);
        self.host.set_player_team(PlayerId(2), TeamId::Red);
        self.host.set_player_team(PlayerId(3), TeamId::Blue);
        self.host.move_player(PlayerId(1), -200.0, 0.0);
        self.host.move_player(PlayerId(2), -200.0, 100.0);
        self.host.move_player(PlayerId(3), 200.0, 0.0);
        self.host.start_game();
        self.room.game_start(None);
        self.host.take_commands();
    }

    fn kick(&mut self, id: u32) {
        let player = self.player(id);
        self.room.player_ball_kick(&player);
    }

    fn goal(&mut self, team: TeamId, red: u32, blue: u32) {
        let scores = self.host.scores().unwrap();
        self.host.set_scores(ScoreSummary { red, blue, ..scores });
        self.room.team_goal(team);
        self.room.positions_reset();
    }

    fn victory(&mut self) {
        let scores = self.host.scores().unwrap();
        self.room.team_victory(&scores);
    }
}

#[test]
fn test_solo_join_starts_training() {
    let mut h = Harness::new();
    h.join(PlayerSnapshot::new(PlayerId(1), "Laura", TeamId::Spectators));

    assert_eq!(h.host.stadium(), "Futsal Training");
    let laura = h.player(1);
    assert_eq!(laura.team, TeamId::Red);
    assert!(laura.admin);
    assert!(h.host.is_running());
    assert!(h.host.announced("Welcome Laura !"));
    assert!(h.host.announced("Type !help"));
}

#[tokio::test]
async fn test_deflection_scenario_and_man_of_the_match() {
    let mut h = Harness::new();
    h.three_player_match();

    // P1 kicks from next to the ball
    h.host.move_player(PlayerId(1), -20.0, 0.0);
    h.room.game_tick();
    h.kick(1);
    // P1 runs off, P2 is now alone on the ball
    h.host.move_player(PlayerId(1), -200.0, 0.0);
    h.host.move_player(PlayerId(2), 20.0, 0.0);
    h.room.game_tick();

    let scores = h.host.scores().unwrap();
    h.host.set_scores(ScoreSummary { red: 1, ..scores });
    h.room.team_goal(TeamId::Red);

    let history: Vec<ScoringEvent> = h.room.tracker().scoring().to_vec();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].scorer.id, PlayerId(2));
    assert!(!history[0].own_goal);
    assert_eq!(history[0].assist.as_ref().map(|a| a.id), Some(PlayerId(1)));
    assert!(h.host.announced("⚽ Goal by Pat !\n🏃🏻 Assisted by Fish !"));
    assert!(!h.room.tracker().engine_running());

    h.victory();
    assert!(h.host.announced("🎖️ Man of the match: Pat ! With 1 goals / 0 assists / 0 own goals"));
}

#[tokio::test]
async fn test_victory_persists_stats() {
    let mut h = Harness::new();
    h.three_player_match();

    // Pat sets up Fish
    h.kick(2);
    h.kick(1);
    h.goal(TeamId::Red, 1, 0);
    // Fish alone
    h.kick(1);
    h.goal(TeamId::Red, 2, 0);
    // Val, anonymous, pulls one back
    h.kick(3);
    h.goal(TeamId::Blue, 2, 1);

    h.victory();
    h.room.game_stop(None);
    h.room.flush().await;

    let fish = h.store.get("fish").await.unwrap().unwrap();
    assert_eq!((fish.nb_goals, fish.nb_assists, fish.nb_own_goals), (2, 0, 0));
    let pat = h.store.get("pat").await.unwrap().unwrap();
    assert_eq!((pat.nb_goals, pat.nb_assists), (0, 1));
    assert_eq!(h.store.get_all().await.unwrap().len(), 2);
}

#[test]
fn test_duplicate_session_is_kicked() {
    let mut h = Harness::new();
    h.join(PlayerSnapshot::new(PlayerId(1), "Fish", TeamId::Spectators).with_auth("token-fish"));
    h.host.take_commands();

    h.join(PlayerSnapshot::new(PlayerId(2), "Impostor", TeamId::Spectators).with_auth("token-fish"));
    assert!(h.host.player(PlayerId(2)).is_none());
    let commands = h.host.commands();
    assert!(matches!(
        commands.as_slice(),
        [HostCommand::Kick { player: PlayerId(2), ban: false, .. }]
    ));
}

#[test]
fn test_super_admin_and_greeting() {
    let host = Arc::new(MemoryHost::new());
    let shared: SharedHost = host.clone();
    let config = RoomConfig::default();
    let mut boss = RegisteredUser::new("boss", "Boss");
    boss.super_admin = true;
    boss.greetings = vec!["The boss is in".to_string()];
    let users = Arc::new(UserRepository::new(vec![boss]));
    let plugins = Room::default_plugins(&shared, &config, &users, Arc::new(NoUpload));
    let mut room = Room::new(shared, &config, users, plugins);

    host.add_player(PlayerSnapshot::new(PlayerId(1), "Watcher", TeamId::Spectators));
    room.player_join(&host.player(PlayerId(1)).unwrap());
    let boss = PlayerSnapshot::new(PlayerId(2), "Boss", TeamId::Spectators);
    host.add_player(boss.clone());
    room.player_join(&boss);

    assert!(host.player(PlayerId(2)).unwrap().admin);
    assert!(host.announced("✅ The boss is in"));
}

#[test]
fn test_chat_routing() {
    let mut h = Harness::new();
    h.join(PlayerSnapshot::new(PlayerId(1), "Admin", TeamId::Spectators));
    h.join(PlayerSnapshot::new(PlayerId(2), "Guest", TeamId::Spectators));
    let admin = h.player(1);
    let guest = h.player(2);
    assert!(admin.admin && !guest.admin);
    h.host.take_commands();

    assert!(h.room.player_chat(&guest, "hello"));
    assert!(!h.room.player_chat(&guest, "!nope"));
    assert!(!h.room.player_chat(&guest, "!ps"));
    let rejections = h
        .host
        .commands()
        .iter()
        .filter(|c| matches!(c, HostCommand::Chat { message, target: Some(PlayerId(2)) } if message == UNKNOWN_COMMAND))
        .count();
    assert_eq!(rejections, 2);

    assert!(!h.room.player_chat(&admin, "!ps"));
    assert!(h.host.announced("Powershot enabled"));

    assert!(h.room.player_chat(&guest, "!help"));
    assert!(h.host.announced("List all commands : !help"));
    assert_eq!(h.room.commands().next().map(|c| c.key), Some("help"));
}

#[test]
fn test_leave_releases_and_empty_room_stops() {
    let mut h = Harness::new();
    let fish = h.join(PlayerSnapshot::new(PlayerId(1), "Fish", TeamId::Spectators).with_auth("token-fish"));
    assert!(h.host.is_running());

    h.host.remove_player(PlayerId(1));
    h.room.player_leave(&fish);
    assert!(!h.host.is_running());

    // the session is free again
    h.join(PlayerSnapshot::new(PlayerId(5), "Fish", TeamId::Spectators).with_auth("token-fish"));
    assert!(h.host.player(PlayerId(5)).is_some());
}

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    fn push(&self, hook: &'static str) -> crate::error::Result<()> {
        self.0.lock().unwrap().push(hook);
        Ok(())
    }

    fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl RoomPlugin for Journal {
    fn name(&self) -> &'static str {
        "journal"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![ChatCommand { label: "Boom", triggers: &["!boom"], admin: false, key: "boom" }]
    }

    fn on_chat_command(&mut self, _key: &str, _author: &PlayerSnapshot, _message: &str) -> crate::error::Result<bool> {
        panic!("boom");
    }

    fn on_game_start(&mut self, _by: Option<&PlayerSnapshot>) -> crate::error::Result<()> {
        self.push("start")
    }
    fn on_game_stop(&mut self, _by: Option<&PlayerSnapshot>, _history: &[ScoringEvent]) -> crate::error::Result<()> {
        self.push("stop")
    }
    fn on_game_pause(&mut self, _by: Option<&PlayerSnapshot>) -> crate::error::Result<()> {
        self.push("pause")
    }
    fn on_game_unpause(&mut self, _by: Option<&PlayerSnapshot>) -> crate::error::Result<()> {
        self.push("unpause")
    }
    fn on_game_on(&mut self) -> crate::error::Result<()> {
        self.push("on")
    }
    fn on_game_off(&mut self) -> crate::error::Result<()> {
        self.push("off")
    }
    fn on_game_kickoff(&mut self, _by: &PlayerSnapshot) -> crate::error::Result<()> {
        self.push("kickoff")
    }
    fn on_player_ball_kick(&mut self, _player: &PlayerSnapshot) -> crate::error::Result<()> {
        self.push("kick")
    }
    fn on_kickoff_reset(&mut self) -> crate::error::Result<()> {
        self.push("kickoff_reset")
    }
    fn on_positions_reset(&mut self) -> crate::error::Result<()> {
        self.push("positions_reset")
    }
    fn on_team_goal(&mut self, _goal: &TeamGoal<'_>) -> crate::error::Result<()> {
        self.push("goal")
    }
}

#[test]
fn test_engine_edges_follow_phases() {
    let host = Arc::new(MemoryHost::new());
    host.add_player(PlayerSnapshot::new(PlayerId(1), "R", TeamId::Red));
    host.start_game();
    let journal = Journal::default();
    let mut room = Room::new(
        host.clone(),
        &RoomConfig::default(),
        Arc::new(UserRepository::default()),
        PluginSet::new(vec![Box::new(journal.clone())]),
    );
    let r = host.player(PlayerId(1)).unwrap();

    room.handle(HostEvent::GameStart { by: None }).unwrap();
    assert_eq!(journal.take(), vec!["start", "on"]);

    room.handle(HostEvent::PlayerBallKick { player: PlayerId(1) }).unwrap();
    room.player_ball_kick(&r);
    assert_eq!(journal.take(), vec!["kickoff", "kick", "kick"]);

    room.handle(HostEvent::GamePause { by: Some(PlayerId(1)) }).unwrap();
    room.handle(HostEvent::GameUnpause { by: None }).unwrap();
    assert_eq!(journal.take(), vec!["pause", "off", "unpause", "on"]);

    room.handle(HostEvent::TeamGoal { team: TeamId::Red }).unwrap();
    room.handle(HostEvent::PositionsReset).unwrap();
    assert_eq!(journal.take(), vec!["goal", "off", "kickoff_reset", "positions_reset", "on"]);

    room.handle(HostEvent::GameStop { by: None }).unwrap();
    room.handle(HostEvent::GameStop { by: None }).unwrap();
    assert_eq!(journal.take(), vec!["stop", "off", "stop"]);
}

#[test]
fn test_panicking_command_is_contained() {
    let host = Arc::new(MemoryHost::new());
    host.add_player(PlayerSnapshot::new(PlayerId(1), "R", TeamId::Red));
    let journal = Journal::default();
    let mut room = Room::new(
        host.clone(),
        &RoomConfig::default(),
        Arc::new(UserRepository::default()),
        PluginSet::new(vec![Box::new(journal.clone())]),
    );

    let relayed = room.handle(HostEvent::PlayerChat { player: PlayerId(1), message: "!boom".into() }).unwrap();
    assert!(!relayed);
    room.game_start(None);
    assert_eq!(journal.take(), vec!["start", "on"]);

    assert!(matches!(
        room.handle(HostEvent::PlayerActivity { player: PlayerId(9) }),
        Err(RoomError::HostUnavailable(_))
    ));
}
