//! Tour execution engine
//!
//! Runs a [`TourDefinition`] against a [`Director`] at a fixed frame rate.
//! The director's clock is a [`ManualClock`] advanced by exactly one frame
//! per tick, so a tour always produces the same camera path.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use sightline_core::{
    CameraPose, CombineMode, Director, ManualClock, PlaybackHandle, RegistryDefaults, SceneGraph,
    SequenceOptions, SyncOptions, SyncPlayOptions, TargetKey, ViewpointId, ViewpointUpdate,
};

use super::definition::{TourAction, TourDefinition, target_key, target_keys};
use super::report::{PlaybackRecord, TourReport};
use crate::config::SightlineConfig;

/// Configuration for tour executor
#[derive(Debug, Clone)]
pub struct TourExecutorConfig {
    /// Simulated frames per second
    pub fps: u32,

    /// Abort the tour past this many frames
    pub max_frames: usize,

    /// Log the camera pose every N frames
    pub print_every: Option<usize>,

    /// Log every action before running it
    pub verbose: bool,

    /// Values for freshly captured viewpoints
    pub defaults: RegistryDefaults,

    /// Interval for sequences that do not set one
    pub sequence_interval_ms: u64,

    /// Sequence started on the main bucket once setup is done
    pub auto_play: Option<SequenceOptions>,
}

impl Default for TourExecutorConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_frames: 36_000,
            print_every: None,
            verbose: false,
            defaults: RegistryDefaults::default(),
            sequence_interval_ms: 500,
            auto_play: None,
        }
    }
}

impl From<&SightlineConfig> for TourExecutorConfig {
    fn from(config: &SightlineConfig) -> Self {
        Self {
            fps: config.runner.fps,
            max_frames: config.runner.max_frames,
            print_every: None,
            verbose: config.debug.verbose_logging,
            defaults: config.registry_defaults(),
            sequence_interval_ms: config.playback.sequence_interval_ms,
            auto_play: config
                .playback
                .auto_play_enabled
                .then(|| config.sequence_options()),
        }
    }
}

struct TrackedPlayback {
    record: PlaybackRecord,
    handle: PlaybackHandle,
}

/// Director and clock for one tour run
struct Stage {
    director: Director<SceneGraph>,
    clock: ManualClock,
}

/// Executes tour actions against a fresh director
pub struct TourExecutor {
    /// Configuration
    config: TourExecutorConfig,

    /// Frames ticked so far
    frame_count: usize,

    /// Action execution log
    log: Vec<String>,

    /// Tour-side viewpoint names
    names: HashMap<String, ViewpointId>,

    playbacks: Vec<TrackedPlayback>,
}

impl TourExecutor {
    /// Create new executor with default config
    pub fn new() -> Self {
        Self::with_config(TourExecutorConfig::default())
    }

    /// Create new executor with custom config
    pub fn with_config(config: TourExecutorConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            log: Vec::new(),
            names: HashMap::new(),
            playbacks: Vec::new(),
        }
    }

    fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.fps.max(1) as f64)
    }

    /// Execute a complete tour
    pub fn execute_tour(&mut self, tour: &TourDefinition) -> Result<TourReport> {
        tour.validate()?;

        let mut report = TourReport::new(tour.name.clone());
        self.log.clear();
        self.names.clear();
        self.playbacks.clear();
        self.frame_count = 0;

        let clock = ManualClock::new();
        let mut stage = Stage {
            director: Director::with_options(tour.build_scene(), clock.clone(), self.config.defaults.clone()),
            clock,
        };

        self.log(&format!("Starting tour: {}", tour.name));
        if !tour.description.is_empty() {
            self.log(&format!("Description: {}", tour.description));
        }

        if !tour.setup.is_empty() {
            self.log(&format!("Running {} setup actions", tour.setup.len()));
            for (idx, action) in tour.setup.iter().enumerate() {
                if let Err(e) = self.execute_action(action, &mut stage) {
                    let msg = format!("Setup action {} failed: {:#}", idx, e);
                    self.log(&msg);
                    return Err(anyhow::anyhow!(msg));
                }
            }
        }

        if let Some(options) = self.config.auto_play.clone() {
            self.log("  Auto-playing main sequence");
            let handle = stage.director.play_view_sequence(None, options);
            self.track("auto-play main".to_string(), handle);
        }

        self.log(&format!("Running {} main actions", tour.actions.len()));
        for (idx, action) in tour.actions.iter().enumerate() {
            if let Err(e) = self.execute_action(action, &mut stage) {
                let msg = format!("Action {} failed: {:#}", idx, e);
                self.log(&msg);
                return Err(anyhow::anyhow!(msg));
            }
        }
        self.poll_playbacks();

        report.actions_executed = tour.setup.len() + tour.actions.len();
        report.frames_executed = self.frame_count;
        report.simulated_secs = stage.clock_secs();
        report.final_camera = stage.director.camera_pose();
        report.playbacks = self.playbacks.iter().map(|p| p.record.clone()).collect();
        report.snapshot = stage.director.snapshot();

        self.log(&format!("Tour complete: {}", report.summary()));
        report.log = self.log.clone();

        Ok(report)
    }

    /// Execute a single action
    fn execute_action(&mut self, action: &TourAction, stage: &mut Stage) -> Result<()> {
        if self.config.verbose {
            self.log(&format!("[Frame {}] {:?}", self.frame_count, action));
        }

        let director = &mut stage.director;
        match action {
            TourAction::SetCamera { position, look_at } => {
                director.with_scene_mut(|scene| scene.camera = CameraPose::new(*position, *look_at));
                self.log(&format!("  Camera set to {}", position));
            }

            TourAction::MoveObject { key, translation } => {
                let moved = director.with_scene_mut(|scene| match scene.object_mut(key) {
                    Some(object) => {
                        object.translation = *translation;
                        true
                    }
                    None => false,
                });
                if !moved {
                    bail!("Unknown object {:?}", key);
                }
                self.log(&format!("  Moved {} to {}", key, translation));
            }

            TourAction::AddViewPoint {
                name,
                target,
                local,
                duration_ms,
                easing,
            } => {
                if self.names.contains_key(name) {
                    bail!("Viewpoint name {:?} is already in use", name);
                }
                let key = target_key(target.as_deref());
                let mut viewpoint = director.add_view_point(Some(name), key.clone(), *local);
                if duration_ms.is_some() || easing.is_some() {
                    viewpoint = director.update_view_point(
                        viewpoint.id,
                        ViewpointUpdate {
                            duration_ms: *duration_ms,
                            easing_name: easing.clone(),
                            ..Default::default()
                        },
                    )?;
                }
                self.names.insert(name.clone(), viewpoint.id);
                self.log(&format!(
                    "  Added {} ({}) on {}{}",
                    name,
                    viewpoint.id,
                    key,
                    if viewpoint.is_local_frame { " [local]" } else { "" }
                ));
            }

            TourAction::UpdateViewPoint { name, update } => {
                let id = self.lookup(name)?;
                director.update_view_point(id, update.clone())?;
                self.log(&format!("  Updated {}", name));
            }

            TourAction::RemoveViewPoint { name } => {
                let id = self.lookup(name)?;
                director.remove_view_point(id)?;
                self.names.remove(name);
                self.log(&format!("  Removed {}", name));
            }

            TourAction::PlayViewPoint { name, animate } => {
                let id = self.lookup(name)?;
                director.play_view_point(id, *animate)?;
                self.log(&format!("  Playing {}{}", name, if *animate { "" } else { " (snap)" }));
            }

            TourAction::PlaySequence {
                target,
                names,
                loop_playback,
                interval_ms,
            } => {
                let ids = names
                    .as_ref()
                    .map(|names| names.iter().map(|n| self.lookup(n)).collect::<Result<Vec<_>>>())
                    .transpose()?;
                let key = target_key(target.as_deref());
                let options = SequenceOptions {
                    loop_playback: *loop_playback,
                    interval_ms: interval_ms.unwrap_or(self.config.sequence_interval_ms),
                    target_key: key.clone(),
                };
                let handle = director.play_view_sequence(ids.as_deref(), options);
                self.track(format!("sequence {}", key), handle);
            }

            TourAction::PlayCombined {
                targets,
                mode,
                loop_playback,
                interval_ms,
            } => {
                let mode: CombineMode = mode.parse().map_err(anyhow::Error::msg)?;
                let keys = target_keys(targets);
                let options = SequenceOptions {
                    loop_playback: *loop_playback,
                    interval_ms: interval_ms.unwrap_or(self.config.sequence_interval_ms),
                    ..Default::default()
                };
                let handle = director.play_combined_sequence(&keys, mode, options);
                self.track(format!("combined {} {}", mode, TargetKey::join(&keys)), handle);
            }

            TourAction::PlaySynchronized {
                targets,
                loop_playback,
                interval_ms,
                duration_ms,
                easing,
            } => {
                let keys = target_keys(targets);
                let options = SyncPlayOptions {
                    loop_playback: *loop_playback,
                    interval_ms: interval_ms.unwrap_or(self.config.sequence_interval_ms),
                    path: SyncOptions {
                        duration_ms: *duration_ms,
                        easing_name: easing.clone(),
                    },
                };
                let handle = director.play_synchronized_path(&keys, options);
                self.track(format!("synchronized {}", TargetKey::join(&keys)), handle);
            }

            TourAction::Next { target } | TourAction::Prev { target } => {
                let key = target_key(target.as_deref());
                let stepped = match action {
                    TourAction::Next { .. } => director.next_view_point(&key),
                    _ => director.prev_view_point(&key),
                };
                match stepped {
                    Some(_) => self.log(&format!(
                        "  Stepped {} to index {:?}",
                        key,
                        director.get_current_index(&key)
                    )),
                    None => self.log(&format!("  No viewpoints on {}", key)),
                }
            }

            TourAction::Stop { target } => {
                let key = target_key(target.as_deref());
                director.stop_view_sequence(&key);
                self.log(&format!("  Stopped {}", key));
            }

            TourAction::StopAll => {
                director.stop_all_sequences();
                self.log("  Stopped all playback");
            }

            TourAction::StopSynchronized { targets } => {
                let keys = target_keys(targets);
                director.stop_synchronized_path(&keys);
                self.log(&format!("  Stopped synchronized {}", TargetKey::join(&keys)));
            }

            TourAction::WaitFrames { frames } => {
                self.simulate_frames(stage, *frames)?;
                self.log(&format!("  Waited {} frames", frames));
            }

            TourAction::WaitIdle { timeout_frames } => {
                self.wait_idle(stage, *timeout_frames)?;
            }

            TourAction::ExpectCamera { position, tolerance } => {
                let actual = director.camera_pose().position;
                let distance = actual.distance(*position);
                if distance > *tolerance {
                    bail!(
                        "Camera at {} is {:.4} away from expected {} (tolerance {})",
                        actual,
                        distance,
                        position,
                        tolerance
                    );
                }
                self.log(&format!("  Camera at {} as expected", actual));
            }

            TourAction::Log { message } => {
                self.log(&format!("  [TOUR] {}", message));
            }
        }

        self.poll_playbacks();
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<ViewpointId> {
        self.names
            .get(name)
            .copied()
            .with_context(|| format!("Unknown viewpoint name {:?}", name))
    }

    fn track(&mut self, label: String, handle: PlaybackHandle) {
        self.log(&format!("  Started {}", label));
        self.playbacks.push(TrackedPlayback {
            record: PlaybackRecord {
                label,
                started_frame: self.frame_count,
                outcome: None,
            },
            handle,
        });
    }

    /// Record outcomes of playbacks that ended since the last poll.
    fn poll_playbacks(&mut self) {
        let mut ended = Vec::new();
        for playback in self.playbacks.iter_mut().filter(|p| p.record.outcome.is_none()) {
            if let Some(outcome) = playback.handle.try_outcome() {
                playback.record.outcome = Some(outcome);
                ended.push(format!("  {} ended: {:?}", playback.record.label, outcome));
            }
        }
        for message in ended {
            self.log(&message);
        }
    }

    fn all_settled(&self) -> bool {
        self.playbacks.iter().all(|p| p.record.outcome.is_some())
    }

    /// Tick one frame: advance the clock, then the director.
    fn step(&mut self, stage: &mut Stage) -> Result<()> {
        if self.frame_count >= self.config.max_frames {
            bail!("Frame limit of {} reached", self.config.max_frames);
        }

        let dt = self.frame_duration();
        stage.clock.advance(dt);
        stage.director.tick(dt.as_secs_f32());
        self.frame_count += 1;

        if let Some(every) = self.config.print_every.filter(|n| *n > 0) {
            if self.frame_count % every == 0 {
                let pose = stage.director.camera_pose();
                self.log(&format!(
                    "  [Frame {}] camera {} -> {}",
                    self.frame_count, pose.position, pose.look_at
                ));
            }
        }

        self.poll_playbacks();
        Ok(())
    }

    fn simulate_frames(&mut self, stage: &mut Stage, frames: usize) -> Result<()> {
        for _ in 0..frames {
            self.step(stage)?;
        }
        Ok(())
    }

    /// Tick until no transition is running and every tracked playback has ended.
    fn wait_idle(&mut self, stage: &mut Stage, timeout_frames: usize) -> Result<()> {
        for frame in 0..=timeout_frames {
            if !stage.director.is_transitioning() && self.all_settled() {
                self.log(&format!("  Idle after {} frames", frame));
                return Ok(());
            }
            if frame < timeout_frames {
                self.step(stage)?;
            }
        }
        bail!("Still busy after {} frames", timeout_frames)
    }

    fn log(&mut self, message: &str) {
        log::info!("{}", message);
        self.log.push(message.to_string());
    }
}

impl Default for TourExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    fn clock_secs(&self) -> f64 {
        use sightline_core::Clock;
        self.clock.now().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use sightline_core::{ObjectTransform, PlaybackOutcome};
    use std::collections::BTreeMap;

    fn config() -> TourExecutorConfig {
        TourExecutorConfig {
            fps: 50,
            defaults: RegistryDefaults {
                duration_ms: 200,
                easing_name: "Linear.None".to_string(),
            },
            sequence_interval_ms: 100,
            ..Default::default()
        }
    }

    fn capture(name: &str, target: Option<&str>, x: f32) -> [TourAction; 2] {
        [
            TourAction::SetCamera {
                position: Vec3::new(x, 0.0, 0.0),
                look_at: Vec3::ZERO,
            },
            TourAction::AddViewPoint {
                name: name.to_string(),
                target: target.map(str::to_string),
                local: target.is_some(),
                duration_ms: None,
                easing: None,
            },
        ]
    }

    fn tour(actions: Vec<TourAction>) -> TourDefinition {
        let mut setup = Vec::new();
        setup.extend(capture("a", None, 10.0));
        setup.extend(capture("b", None, 20.0));
        setup.extend(capture("on-car", Some("car"), 12.0));
        setup.push(TourAction::SetCamera {
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
        });

        TourDefinition {
            name: "test".to_string(),
            description: String::new(),
            objects: BTreeMap::from([(
                "car".to_string(),
                ObjectTransform::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            )]),
            camera: CameraPose::default(),
            setup,
            actions,
        }
    }

    #[test]
    fn test_sequence_runs_to_completion() {
        let tour = tour(vec![
            TourAction::PlaySequence {
                target: None,
                names: None,
                loop_playback: false,
                interval_ms: None,
            },
            TourAction::WaitIdle { timeout_frames: 200 },
            TourAction::ExpectCamera {
                position: Vec3::new(20.0, 0.0, 0.0),
                tolerance: 1e-3,
            },
        ]);

        let mut executor = TourExecutor::with_config(config());
        let report = executor.execute_tour(&tour).unwrap();
        assert_eq!(report.playbacks.len(), 1);
        assert_eq!(report.playbacks[0].outcome, Some(PlaybackOutcome::Finished));
        assert!(report.frames_executed > 0);
        assert_eq!(report.snapshot.len(), 3);
        assert!(report.log.iter().any(|line| line.contains("Idle after")));
    }

    #[test]
    fn test_local_viewpoint_follows_moved_object() {
        let tour = tour(vec![
            TourAction::MoveObject {
                key: "car".to_string(),
                translation: Vec3::new(10.0, 0.0, 5.0),
            },
            TourAction::PlayViewPoint {
                name: "on-car".to_string(),
                animate: false,
            },
            TourAction::ExpectCamera {
                position: Vec3::new(12.0, 0.0, 5.0),
                tolerance: 1e-3,
            },
        ]);

        TourExecutor::with_config(config()).execute_tour(&tour).unwrap();
    }

    #[test]
    fn test_stop_and_interrupt_outcomes() {
        let tour = tour(vec![
            TourAction::PlaySequence {
                target: None,
                names: None,
                loop_playback: true,
                interval_ms: None,
            },
            TourAction::WaitFrames { frames: 3 },
            TourAction::PlayViewPoint {
                name: "b".to_string(),
                animate: true,
            },
            TourAction::PlaySynchronized {
                targets: vec!["main".to_string(), "car".to_string()],
                loop_playback: true,
                interval_ms: None,
                duration_ms: None,
                easing: None,
            },
            TourAction::WaitFrames { frames: 3 },
            TourAction::StopAll,
            TourAction::WaitIdle { timeout_frames: 20 },
        ]);

        let report = TourExecutor::with_config(config()).execute_tour(&tour).unwrap();
        assert_eq!(report.count(PlaybackOutcome::Interrupted), 1);
        assert_eq!(report.count(PlaybackOutcome::Stopped), 1);
    }

    #[test]
    fn test_unknown_name_fails_the_tour() {
        let tour = tour(vec![TourAction::RemoveViewPoint {
            name: "nope".to_string(),
        }]);
        let err = TourExecutor::with_config(config()).execute_tour(&tour).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_wait_idle_times_out_on_loops() {
        let tour = tour(vec![
            TourAction::PlaySequence {
                target: None,
                names: None,
                loop_playback: true,
                interval_ms: None,
            },
            TourAction::WaitIdle { timeout_frames: 50 },
        ]);
        assert!(TourExecutor::with_config(config()).execute_tour(&tour).is_err());
    }

    #[test]
    fn test_auto_play_and_frame_limit() {
        let mut config = config();
        config.auto_play = Some(SequenceOptions {
            interval_ms: 100,
            ..Default::default()
        });
        config.max_frames = 10;

        let tour = tour(vec![TourAction::WaitFrames { frames: 5 }]);
        let report = TourExecutor::with_config(config.clone()).execute_tour(&tour).unwrap();
        assert_eq!(report.playbacks[0].label, "auto-play main");
        assert_eq!(report.playbacks[0].outcome, None);

        let too_long = self::tour(vec![TourAction::WaitFrames { frames: 50 }]);
        assert!(TourExecutor::with_config(config).execute_tour(&too_long).is_err());
    }

    #[test]
    fn test_print_every_logs_camera() {
        let mut config = config();
        config.print_every = Some(2);
        let tour = tour(vec![TourAction::WaitFrames { frames: 4 }]);
        let report = TourExecutor::with_config(config).execute_tour(&tour).unwrap();
        assert_eq!(report.log.iter().filter(|l| l.contains("[Frame")).count(), 2);
    }
}
