//! JSON-lines bridge between an external host driver and the room.
//!
//! Each input line is either a [`HostEvent`] or a setup line that mutates the
//! in-memory host (positions, scores, teams) before the next event. Every
//! command the room issues is written back as one JSON line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use room_core::{HostCommand, HostEvent, MemoryHost, PlayerId, Room, RoomHost, ScoreSummary, TeamId};

/// Host-side state changes the room does not react to by itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SetupLine {
    MovePlayer { player: PlayerId, x: f64, y: f64 },
    PlaceBall {
        x: f64,
        y: f64,
        #[serde(default)]
        xspeed: f64,
        #[serde(default)]
        yspeed: f64,
    },
    SetScores { scores: ScoreSummary },
    SetTeam { player: PlayerId, team: TeamId },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptLine {
    Host(HostEvent),
    Setup(SetupLine),
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output<'a> {
    Command(&'a HostCommand),
    Relay { relay: bool },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSummary {
    pub events: usize,
    pub rejected: usize,
}

pub struct Bridge<'a> {
    room: &'a mut Room,
    host: &'a MemoryHost,
}

impl<'a> Bridge<'a> {
    pub fn new(room: &'a mut Room, host: &'a MemoryHost) -> Self {
        Self { room, host }
    }

    /// Feed the room until the input ends, then wait for background work.
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> Result<BridgeSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut summary = BridgeSummary::default();
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await.context("reading host events")? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<ScriptLine>(line) {
                Ok(ScriptLine::Setup(setup)) => self.apply_setup(setup),
                Ok(ScriptLine::Host(event)) => {
                    summary.events += 1;
                    let relay = self.dispatch(event);
                    self.write_commands(output).await?;
                    if let Some(relay) = relay {
                        write_line(output, &Output::Relay { relay }).await?;
                    }
                }
                Err(e) => {
                    summary.rejected += 1;
                    log::warn!("Skipping malformed line: {} ({})", line, e);
                }
            }
        }

        self.room.flush().await;
        self.write_commands(output).await?;
        output.flush().await.context("flushing output")?;
        Ok(summary)
    }

    fn apply_setup(&self, setup: SetupLine) {
        match setup {
            SetupLine::MovePlayer { player, x, y } => self.host.move_player(player, x, y),
            SetupLine::PlaceBall { x, y, xspeed, yspeed } => {
                self.host.place_ball(x, y);
                self.host.set_ball_speed(xspeed, yspeed);
            }
            SetupLine::SetScores { scores } => self.host.set_scores(scores),
            SetupLine::SetTeam { player, team } => {
                self.host.set_player_team(player, team);
                self.host.take_commands();
            }
        }
    }

    /// Mirror the event in the host state, then hand it to the room. Returns
    /// the relay decision for chat lines.
    fn dispatch(&mut self, event: HostEvent) -> Option<bool> {
        match &event {
            HostEvent::PlayerJoin { player } => self.host.add_player(player.clone()),
            HostEvent::PlayerLeave { player } => {
                self.host.remove_player(player.id);
            }
            HostEvent::GameStart { .. } => self.host.set_running(true),
            HostEvent::GameStop { .. } => self.host.set_running(false),
            _ => {}
        }
        let is_chat = matches!(event, HostEvent::PlayerChat { .. });
        let label = event.label();
        match self.room.handle(event) {
            Ok(relay) => is_chat.then_some(relay),
            Err(e) => {
                log::warn!("{} ignored: {}", label, e);
                is_chat.then_some(false)
            }
        }
    }

    async fn write_commands<W: AsyncWrite + Unpin>(&self, output: &mut W) -> Result<()> {
        for command in self.host.take_commands() {
            write_line(output, &Output::Command(&command)).await?;
        }
        Ok(())
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, value: &Output<'_>) -> Result<()> {
    let mut line = serde_json::to_vec(value).context("encoding host command")?;
    line.push(b'\n');
    output.write_all(&line).await.context("writing host command")?;
    Ok(())
}
