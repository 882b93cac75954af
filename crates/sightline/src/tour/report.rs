//! Tour results and reporting

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sightline_core::{CameraPose, PlaybackOutcome, ViewpointSnapshot};

/// One sequence or synchronized path started by the tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRecord {
    /// What was played, e.g. `sequence main` or `synchronized a|b`
    pub label: String,

    /// Frame the playback was started on
    pub started_frame: usize,

    /// `None` if still running when the tour ended
    pub outcome: Option<PlaybackOutcome>,
}

/// Result of running one tour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourReport {
    /// Tour name
    pub tour_name: String,

    /// Frames ticked
    pub frames_executed: usize,

    /// Setup plus main actions run
    pub actions_executed: usize,

    /// Simulated time (seconds)
    pub simulated_secs: f64,

    /// Camera pose after the last action
    pub final_camera: CameraPose,

    pub playbacks: Vec<PlaybackRecord>,

    /// Execution log messages
    pub log: Vec<String>,

    /// Viewpoints stored when the tour ended
    pub snapshot: ViewpointSnapshot,
}

impl TourReport {
    pub fn new(tour_name: String) -> Self {
        Self {
            tour_name,
            frames_executed: 0,
            actions_executed: 0,
            simulated_secs: 0.0,
            final_camera: CameraPose::default(),
            playbacks: Vec::new(),
            log: Vec::new(),
            snapshot: ViewpointSnapshot::default(),
        }
    }

    /// Number of playbacks that ended with `outcome`.
    pub fn count(&self, outcome: PlaybackOutcome) -> usize {
        self.playbacks
            .iter()
            .filter(|p| p.outcome == Some(outcome))
            .count()
    }

    pub fn summary(&self) -> String {
        let p = self.final_camera.position;
        format!(
            "{} frames ({:.2}s), {} actions, playbacks: {} finished / {} stopped / {} interrupted, camera at ({:.3}, {:.3}, {:.3})",
            self.frames_executed,
            self.simulated_secs,
            self.actions_executed,
            self.count(PlaybackOutcome::Finished),
            self.count(PlaybackOutcome::Stopped),
            self.count(PlaybackOutcome::Interrupted),
            p.x,
            p.y,
            p.z
        )
    }

    /// Save report to RON file
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<()> {
        let ron = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize tour report to RON")?;

        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path.as_ref(), ron)
            .with_context(|| format!("Failed to write tour report: {}", path.as_ref().display()))?;

        Ok(())
    }
}
