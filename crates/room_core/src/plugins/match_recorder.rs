//! Replay recording and upload.

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::config::RecordingConfig;
use crate::error::Result;
use crate::geometry::is_configured_match;
use crate::host::SharedHost;
use crate::schedule::BackgroundTasks;
use crate::models::{Announcement, AnnouncementSound, PlayerSnapshot, ScoringEvent, COLOR_MUTED, COLOR_WARNING};
use crate::upload::{replay_file_name, SharedUploader};

use super::RoomPlugin;

pub struct MatchRecorder {
    host: SharedHost,
    uploader: SharedUploader,
    enabled: bool,
    recording: bool,
    tasks: BackgroundTasks,
}

impl MatchRecorder {
    pub fn new(host: SharedHost, config: &RecordingConfig, uploader: SharedUploader) -> Self {
        Self { host, uploader, enabled: config.enabled, recording: false, tasks: BackgroundTasks::new() }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn upload(&mut self, bytes: Vec<u8>) {
        let host = self.host.clone();
        let uploader = self.uploader.clone();
        let file_name = replay_file_name(Utc::now());
        self.tasks.spawn(async move {
            let announcement = match uploader.upload(&file_name, bytes).await {
                Ok(url) => {
                    log::info!("Replay {} uploaded to {}", file_name, url);
                    Announcement::new(format!("📼 Replay available here : {}", url)).color(COLOR_MUTED)
                }
                Err(e) => {
                    log::warn!("Replay {} upload failed: {}", file_name, e);
                    Announcement::new(format!("Error uploading replay : {}", e)).color(COLOR_WARNING)
                }
            };
            host.send_announcement(announcement.sound(AnnouncementSound::None));
        });
    }
}

impl RoomPlugin for MatchRecorder {
    fn name(&self) -> &'static str {
        "match_recorder"
    }

    fn on_game_kickoff(&mut self, _by: &PlayerSnapshot) -> Result<()> {
        if self.enabled && !self.recording && is_configured_match(&self.host.player_list()) {
            self.host.start_recording();
            self.recording = true;
        }
        Ok(())
    }

    fn on_game_stop(&mut self, _by: Option<&PlayerSnapshot>, _history: &[ScoringEvent]) -> Result<()> {
        if !std::mem::take(&mut self.recording) {
            return Ok(());
        }
        match self.host.stop_recording() {
            Some(bytes) => self.upload(bytes),
            None => log::debug!("Host had no replay to hand over"),
        }
        Ok(())
    }

    fn drain_tasks(&mut self) -> Vec<JoinHandle<()>> {
        self.tasks.drain()
    }
}
