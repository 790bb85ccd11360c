//! Lifetime player statistics: persisted at victory, ranked by `!top`.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::geometry::is_configured_match;
use crate::host::SharedHost;
use crate::schedule::BackgroundTasks;
use crate::models::{Announcement, AnnouncementSound, PlayerId, PlayerSnapshot, ScoreSummary, ScoringEvent};
use crate::store::{self, PlayerStats, SharedStore, StatsDelta, StoreSchema, STATS_TABLE};
use crate::users::UserRepository;

use super::{ChatCommand, RoomPlugin};

const TOP: &str = "top";
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Per registered user increments for one match, in first-seen order.
///
/// Players without a registered session are skipped.
pub fn aggregate(history: &[ScoringEvent], users: &UserRepository) -> Vec<(String, StatsDelta)> {
    let mut deltas: Vec<(String, StatsDelta)> = Vec::new();
    fn entry<'a>(
        deltas: &'a mut Vec<(String, StatsDelta)>,
        users: &UserRepository,
        player: PlayerId,
    ) -> Option<&'a mut StatsDelta> {
        let user = users.find_by_session(player)?;
        let index = match deltas.iter().position(|(id, _)| *id == user.id) {
            Some(index) => index,
            None => {
                deltas.push((user.id, StatsDelta::default()));
                deltas.len() - 1
            }
        };
        Some(&mut deltas[index].1)
    }

    for event in history {
        if let Some(delta) = entry(&mut deltas, users, event.scorer.id) {
            if event.own_goal {
                delta.own_goals += 1;
            } else {
                delta.goals += 1;
            }
        }
        if let Some(assist) = &event.assist {
            if let Some(delta) = entry(&mut deltas, users, assist.id) {
                delta.assists += 1;
            }
        }
    }
    deltas
}

/// Goals descending, then own goals ascending.
pub fn rank(mut stats: Vec<PlayerStats>) -> Vec<PlayerStats> {
    stats.sort_by(|a, b| b.nb_goals.cmp(&a.nb_goals).then(a.nb_own_goals.cmp(&b.nb_own_goals)));
    stats
}

pub fn ranking_lines(stats: &[PlayerStats], users: &UserRepository) -> Vec<String> {
    stats
        .iter()
        .enumerate()
        .map(|(index, s)| {
            format!(
                "{} {} - Goals: {} / Assists: {} / Own goals: {}",
                MEDALS.get(index).copied().unwrap_or("💩"),
                users.display_name(&s.player_id),
                s.nb_goals,
                s.nb_assists,
                s.nb_own_goals
            )
        })
        .collect()
}

pub struct StatsPersister {
    host: SharedHost,
    users: Arc<UserRepository>,
    store: Option<SharedStore>,
    tasks: BackgroundTasks,
}

impl StatsPersister {
    pub fn new(host: SharedHost, users: Arc<UserRepository>) -> Self {
        Self { host, users, store: None, tasks: BackgroundTasks::new() }
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_some()
    }
}

impl RoomPlugin for StatsPersister {
    fn name(&self) -> &'static str {
        "player_stats"
    }

    fn chat_commands(&self) -> Vec<ChatCommand> {
        vec![ChatCommand { label: "View rankings", triggers: &["!top"], admin: false, key: TOP }]
    }

    fn on_chat_command(&mut self, _key: &str, author: &PlayerSnapshot, _message: &str) -> Result<bool> {
        let Some(store) = self.store.clone() else {
            self.host.send_chat("Rankings are not available yet", Some(author.id));
            return Ok(false);
        };
        let host = self.host.clone();
        let users = self.users.clone();
        self.tasks.spawn(async move {
            match store.get_all().await {
                Ok(stats) => {
                    let lines = ranking_lines(&rank(stats), &users);
                    if !lines.is_empty() {
                        host.send_announcement(Announcement::new(lines.join("\n")).sound(AnnouncementSound::None));
                    }
                }
                Err(e) => log::warn!("Could not read rankings: {}", e),
            }
        });
        Ok(false)
    }

    fn on_store_upgrade(&mut self, schema: &mut StoreSchema) {
        schema.table(STATS_TABLE, &["nbGoals", "nbOwnGoals"]);
    }

    fn on_store_ready(&mut self, store: SharedStore) {
        self.store = Some(store);
    }

    fn on_team_victory(&mut self, history: &[ScoringEvent], _scores: &ScoreSummary) -> Result<()> {
        if !is_configured_match(&self.host.player_list()) {
            return Ok(());
        }
        let deltas = aggregate(history, &self.users);
        if deltas.is_empty() {
            return Ok(());
        }
        let Some(store) = self.store.clone() else {
            log::warn!("Stats store not ready, {} players not persisted", deltas.len());
            return Ok(());
        };
        self.tasks.spawn(async move {
            for (user_id, delta) in deltas {
                match store::increment(store.as_ref(), &user_id, &delta).await {
                    Ok(stats) => log::debug!("Stats of {} now {:?}", user_id, stats),
                    Err(e) => log::warn!("Could not persist stats of {}: {}", user_id, e),
                }
            }
        });
        Ok(())
    }

    fn drain_tasks(&mut self) -> Vec<JoinHandle<()>> {
        self.tasks.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::models::TeamId;
    use crate::store::{MemoryStatsStore, StatsStore};
    use crate::users::RegisteredUser;

    fn users() -> Arc<UserRepository> {
        let repo = UserRepository::new(vec![RegisteredUser::new("fish", "Fish"), RegisteredUser::new("pat", "Pat")]);
        repo.correlate(&PlayerSnapshot::new(PlayerId(1), "Fish", TeamId::Red), &[PlayerId(1)]);
        repo.correlate(&PlayerSnapshot::new(PlayerId(2), "Pat", TeamId::Red), &[PlayerId(1), PlayerId(2)]);
        Arc::new(repo)
    }

    fn event(scorer: u32, assist: Option<u32>, own_goal: bool) -> ScoringEvent {
        let player = |id: u32| PlayerSnapshot::new(PlayerId(id), format!("P{}", id), TeamId::Red);
        ScoringEvent { scorer: player(scorer), time: 1.0, own_goal, assist: assist.map(player), team: TeamId::Red }
    }

    #[test]
    fn test_aggregate_skips_anonymous_players() {
        let history = vec![event(1, Some(2), false), event(3, Some(1), false), event(1, None, true)];
        let deltas = aggregate(&history, &users());
        assert_eq!(
            deltas,
            vec![
                ("fish".to_string(), StatsDelta { goals: 1, own_goals: 1, assists: 1 }),
                ("pat".to_string(), StatsDelta { goals: 0, own_goals: 0, assists: 1 }),
            ]
        );
    }

    #[test]
    fn test_ranking_order_and_medals() {
        let stats = |id: &str, goals, own_goals| PlayerStats { player_id: id.into(), nb_goals: goals, nb_own_goals: own_goals, nb_assists: 0 };
        let ranked = rank(vec![stats("a", 1, 0), stats("b", 3, 2), stats("c", 3, 1), stats("d", 0, 0)]);
        assert_eq!(ranked.iter().map(|s| s.player_id.as_str()).collect::<Vec<_>>(), vec!["c", "b", "a", "d"]);

        let lines = ranking_lines(&ranked, &users());
        assert_eq!(lines[0], "🥇 c - Goals: 3 / Assists: 0 / Own goals: 1");
        assert!(lines[2].starts_with("🥉 a"));
        assert!(lines[3].starts_with("💩 d"));
    }

    fn setup() -> (Arc<MemoryHost>, Arc<MemoryStatsStore>, StatsPersister) {
        let host = Arc::new(MemoryHost::new());
        host.add_player(PlayerSnapshot::new(PlayerId(1), "Fish", TeamId::Red));
        host.add_player(PlayerSnapshot::new(PlayerId(2), "Pat", TeamId::Blue));
        let store = Arc::new(MemoryStatsStore::new());
        let mut plugin = StatsPersister::new(host.clone(), users());
        let mut schema = StoreSchema::new();
        plugin.on_store_upgrade(&mut schema);
        assert_eq!(schema.indexes(STATS_TABLE).len(), 2);
        plugin.on_store_ready(store.clone());
        (host, store, plugin)
    }

    #[tokio::test]
    async fn test_victory_persists_and_top_ranks() {
        let (host, store, mut plugin) = setup();
        let history = vec![event(1, Some(2), false), event(1, None, false)];
        plugin.on_team_victory(&history, &ScoreSummary::default()).unwrap();
        plugin.on_team_victory(&history, &ScoreSummary::default()).unwrap();
        for task in plugin.drain_tasks() {
            task.await.unwrap();
        }
        let fish = store.get("fish").await.unwrap().unwrap();
        assert_eq!((fish.nb_goals, fish.nb_assists), (4, 0));
        assert_eq!(store.get("pat").await.unwrap().map(|s| s.nb_assists), Some(2));

        let author = PlayerSnapshot::new(PlayerId(2), "Pat", TeamId::Blue);
        assert!(!plugin.on_chat_command(TOP, &author, "!top").unwrap());
        for task in plugin.drain_tasks() {
            task.await.unwrap();
        }
        assert!(host.announced("🥇 Fish - Goals: 4 / Assists: 0 / Own goals: 0\n🥈 Pat - Goals: 0 / Assists: 2"));
    }

    #[tokio::test]
    async fn test_unconfigured_match_not_persisted() {
        let (host, store, mut plugin) = setup();
        host.remove_player(PlayerId(2));
        plugin.on_team_victory(&[event(1, None, false)], &ScoreSummary::default()).unwrap();
        assert!(plugin.drain_tasks().is_empty());
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
