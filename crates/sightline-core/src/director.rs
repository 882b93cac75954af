//! The director: one scene, one camera, every viewpoint operation.
//!
//! Owns the registry, the transition engine, the timer queue and a
//! single-threaded task pool for sequence playback. The host calls
//! [`Director::tick`] once per rendered frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::combiner::{CombineMode, create_combined_sequence};
use crate::easing::{Easing, resolve_easing};
use crate::error::{Result, ViewpointError};
use crate::playback::{PlaybackFlag, PlaybackHandle, PlaybackOutcome};
use crate::registry::{RegistryDefaults, Step, ViewpointRegistry};
use crate::scene::Scene;
use crate::sequencer::{FlagKey, Playback, SequenceOptions, Waypoint, run_playback};
use crate::snapshot::ViewpointSnapshot;
use crate::synchronizer::{SyncOptions, SyncPlayOptions, create_synchronized_path};
use crate::timer::{Clock, SharedTimers, SystemClock, TimerQueue};
use crate::transition::{TransitionEngine, TransitionHandle, TransitionStatus};
use crate::viewpoint::{CameraPose, Frame, TargetKey, Viewpoint, ViewpointId, ViewpointUpdate};

/// State shared between the director and its playback tasks.
///
/// Tasks borrow it between awaits only.
pub(crate) struct Core<S> {
    pub scene: S,
    pub registry: ViewpointRegistry,
    pub engine: TransitionEngine,
    /// Synchronized-path flags, keyed by the target key list
    pub sync_flags: HashMap<Vec<TargetKey>, PlaybackFlag>,
}

impl<S: Scene> Core<S> {
    fn play_view_point(&mut self, id: ViewpointId, animate: bool) -> Result<TransitionHandle> {
        let stored = self.registry.stored(id).ok_or(ViewpointError::NotFound(id))?;
        let (duration_ms, easing) = (stored.duration_ms, resolve_easing(&stored.easing_name));
        let end = self.registry.world_pose(&self.scene, id)?;
        self.registry.mark_current(id);

        if animate {
            let start = self.scene.camera_pose();
            Ok(self.engine.start(start, end, duration_ms, easing))
        } else {
            Ok(self.engine.snap(&mut self.scene, end))
        }
    }

    fn play_frame(&mut self, frame: &Frame) -> TransitionHandle {
        let start = self.scene.camera_pose();
        self.engine.start(
            start,
            frame.pose(),
            frame.duration_ms,
            resolve_easing(&frame.easing_name),
        )
    }

    /// Start the transition for one waypoint; `None` if its viewpoint is gone.
    pub(crate) fn animate_to(&mut self, waypoint: &Waypoint) -> Option<TransitionHandle> {
        match waypoint {
            Waypoint::Viewpoint(id) => self.play_view_point(*id, true).ok(),
            Waypoint::Frame(frame) => Some(self.play_frame(frame)),
        }
    }

    pub(crate) fn is_flag_current(&self, flag: &FlagKey, generation: u64) -> bool {
        match flag {
            FlagKey::Bucket(key) => self.registry.is_current_playback(key, generation),
            FlagKey::Sync(key) => self
                .sync_flags
                .get(key)
                .is_some_and(|flag| flag.is_current(generation)),
        }
    }

    pub(crate) fn finish_flag(&mut self, flag: &FlagKey, generation: u64) {
        match flag {
            FlagKey::Bucket(key) => self.registry.finish_playback(key, generation),
            FlagKey::Sync(key) => {
                if let Some(flag) = self.sync_flags.get_mut(key) {
                    flag.finish(generation);
                }
            }
        }
    }
}

/// Camera choreography for one scene.
pub struct Director<S: Scene + 'static> {
    core: Rc<RefCell<Core<S>>>,
    timers: SharedTimers,
    pool: LocalPool,
    spawner: LocalSpawner,
}

impl<S: Scene + 'static> Director<S> {
    /// Director on the wall clock.
    pub fn new(scene: S) -> Self {
        Self::with_options(scene, SystemClock::new(), RegistryDefaults::default())
    }

    /// Director on a custom clock (e.g. [`crate::ManualClock`] for fixed-step runs).
    pub fn with_clock(scene: S, clock: impl Clock + 'static) -> Self {
        Self::with_options(scene, clock, RegistryDefaults::default())
    }

    pub fn with_options(scene: S, clock: impl Clock + 'static, defaults: RegistryDefaults) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            core: Rc::new(RefCell::new(Core {
                scene,
                registry: ViewpointRegistry::with_defaults(defaults),
                engine: TransitionEngine::new(),
                sync_flags: HashMap::new(),
            })),
            timers: Rc::new(RefCell::new(TimerQueue::new(clock))),
            pool,
            spawner,
        }
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Render-loop hook: advance the camera transition by `dt` seconds, then
    /// let timers and playback tasks catch up.
    pub fn tick(&mut self, dt: f32) -> TransitionStatus {
        let status = {
            let mut core = self.core.borrow_mut();
            let Core { scene, engine, .. } = &mut *core;
            engine.advance(dt, scene)
        };
        self.pump();
        status
    }

    /// Fire expired timers and run playback tasks until they block. Does not
    /// move the camera; safe to call outside the render loop.
    pub fn pump(&mut self) {
        self.timers.borrow_mut().fire_due();
        self.pool.run_until_stalled();
    }

    /// Earliest pending timer deadline on the director's clock.
    pub fn next_timer_deadline(&self) -> Option<Duration> {
        self.timers.borrow().next_deadline()
    }

    pub fn is_transitioning(&self) -> bool {
        self.core.borrow().engine.is_transitioning()
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.core.borrow().scene.camera_pose()
    }

    pub fn with_scene<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.core.borrow().scene)
    }

    pub fn with_scene_mut<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.core.borrow_mut().scene)
    }

    pub fn with_registry<R>(&self, f: impl FnOnce(&ViewpointRegistry) -> R) -> R {
        f(&self.core.borrow().registry)
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Capture the current camera pose. `name` defaults to `"View <n>"`.
    pub fn add_view_point(&mut self, name: Option<&str>, target_key: TargetKey, is_local: bool) -> Viewpoint {
        let mut core = self.core.borrow_mut();
        let Core { scene, registry, .. } = &mut *core;
        registry.add_view_point(&*scene, name, target_key, is_local)
    }

    pub fn remove_view_point(&mut self, id: ViewpointId) -> Result<Viewpoint> {
        self.core.borrow_mut().registry.remove_view_point(id)
    }

    /// `updates.position` / `updates.look_at` are world space.
    pub fn update_view_point(&mut self, id: ViewpointId, updates: ViewpointUpdate) -> Result<Viewpoint> {
        let mut core = self.core.borrow_mut();
        let Core { scene, registry, .. } = &mut *core;
        registry.update_view_point(&*scene, id, updates)
    }

    /// World-space copies of a bucket.
    pub fn get_view_points(&self, target_key: &TargetKey) -> Vec<Viewpoint> {
        let core = self.core.borrow();
        core.registry.get_view_points(&core.scene, target_key)
    }

    pub fn get_view_point(&self, id: ViewpointId) -> Result<Viewpoint> {
        let core = self.core.borrow();
        core.registry.get_view_point(&core.scene, id)
    }

    pub fn get_current_index(&self, target_key: &TargetKey) -> Option<usize> {
        self.core.borrow().registry.current_index(target_key)
    }

    pub fn target_keys(&self) -> Vec<TargetKey> {
        self.core.borrow().registry.target_keys().to_vec()
    }

    /// Remove every viewpoint and stop all playback.
    pub fn clear(&mut self) {
        self.stop_all_sequences();
        self.core.borrow_mut().registry.clear();
    }

    // ------------------------------------------------------------------
    // Single viewpoints
    // ------------------------------------------------------------------

    /// Move the camera to a viewpoint, animated or at once.
    ///
    /// The returned handle settles `Completed` on arrival or `Canceled` if
    /// another transition replaces this one first.
    pub fn play_view_point(&mut self, id: ViewpointId, animate: bool) -> Result<TransitionHandle> {
        let handle = self.core.borrow_mut().play_view_point(id, animate)?;
        // A superseded transition may unblock a playback task
        self.pool.run_until_stalled();
        Ok(handle)
    }

    pub fn next_view_point(&mut self, target_key: &TargetKey) -> Option<TransitionHandle> {
        self.step_view_point(target_key, Step::Next)
    }

    pub fn prev_view_point(&mut self, target_key: &TargetKey) -> Option<TransitionHandle> {
        self.step_view_point(target_key, Step::Prev)
    }

    fn step_view_point(&mut self, target_key: &TargetKey, step: Step) -> Option<TransitionHandle> {
        let id = self.core.borrow_mut().registry.step_index(target_key, step)?;
        self.play_view_point(id, true).ok()
    }

    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    /// Play viewpoints one after another.
    ///
    /// With `ids`, viewpoints are gathered from any bucket in the given
    /// order (unknown ids are skipped); otherwise the bucket of
    /// `options.target_key` is played. Either way that bucket's playing flag
    /// tracks the run.
    pub fn play_view_sequence(&mut self, ids: Option<&[ViewpointId]>, options: SequenceOptions) -> PlaybackHandle {
        let (waypoints, generation) = {
            let mut core = self.core.borrow_mut();
            let ids = match ids {
                Some(ids) => ids
                    .iter()
                    .copied()
                    .filter(|id| {
                        let known = core.registry.contains(*id);
                        if !known {
                            log::warn!("Sequence skips unknown viewpoint {}", id);
                        }
                        known
                    })
                    .collect(),
                None => core.registry.ids(&options.target_key),
            };
            if ids.is_empty() {
                return PlaybackHandle::settled(PlaybackOutcome::Finished);
            }
            let waypoints: Vec<_> = ids.into_iter().map(Waypoint::Viewpoint).collect();
            (waypoints, core.registry.start_playback(&options.target_key))
        };

        log::info!(
            "Playing sequence of {} viewpoints on {} (loop: {}, interval: {} ms)",
            waypoints.len(),
            options.target_key,
            options.loop_playback,
            options.interval_ms
        );

        self.spawn_playback(Playback {
            waypoints,
            flag: FlagKey::Bucket(options.target_key),
            generation,
            loop_playback: options.loop_playback,
            interval: Duration::from_millis(options.interval_ms),
        })
    }

    /// Stop the sequence on `target_key` and freeze the camera where it is.
    pub fn stop_view_sequence(&mut self, target_key: &TargetKey) {
        {
            let mut core = self.core.borrow_mut();
            core.registry.stop_playback(target_key);
            core.engine.cancel();
        }
        log::info!("Stopped sequence on {}", target_key);
        self.pool.run_until_stalled();
    }

    /// Stop every sequence and synchronized path and freeze the camera.
    pub fn stop_all_sequences(&mut self) {
        {
            let mut core = self.core.borrow_mut();
            core.registry.stop_all_playback();
            for flag in core.sync_flags.values_mut() {
                flag.stop();
            }
            core.engine.cancel();
        }
        log::info!("Stopped all sequences");
        self.pool.run_until_stalled();
    }

    pub fn is_sequence_playing(&self, target_key: &TargetKey) -> bool {
        self.core.borrow().registry.is_playing(target_key)
    }

    // ------------------------------------------------------------------
    // Combined sequences
    // ------------------------------------------------------------------

    pub fn create_combined_sequence(&self, target_keys: &[TargetKey], mode: CombineMode) -> Vec<ViewpointId> {
        create_combined_sequence(&self.core.borrow().registry, target_keys, mode)
    }

    pub fn play_combined_sequence(
        &mut self,
        target_keys: &[TargetKey],
        mode: CombineMode,
        options: SequenceOptions,
    ) -> PlaybackHandle {
        let ids = self.create_combined_sequence(target_keys, mode);
        self.play_view_sequence(Some(&ids), options)
    }

    // ------------------------------------------------------------------
    // Synchronized paths
    // ------------------------------------------------------------------

    pub fn create_synchronized_path(&self, target_keys: &[TargetKey], options: &SyncOptions) -> Vec<Frame> {
        let core = self.core.borrow();
        create_synchronized_path(&core.registry, &core.scene, target_keys, options)
    }

    /// Play the averaged path of `target_keys`. The path is computed once,
    /// when playback starts.
    pub fn play_synchronized_path(&mut self, target_keys: &[TargetKey], options: SyncPlayOptions) -> PlaybackHandle {
        let frames = self.create_synchronized_path(target_keys, &options.path);
        if frames.is_empty() {
            return PlaybackHandle::settled(PlaybackOutcome::Finished);
        }

        let key = target_keys.to_vec();
        let generation = self
            .core
            .borrow_mut()
            .sync_flags
            .entry(key.clone())
            .or_default()
            .start();

        log::info!(
            "Playing synchronized path [{}] with {} frames (loop: {})",
            TargetKey::join(target_keys),
            frames.len(),
            options.loop_playback
        );

        self.spawn_playback(Playback {
            waypoints: frames.into_iter().map(Waypoint::Frame).collect(),
            flag: FlagKey::Sync(key),
            generation,
            loop_playback: options.loop_playback,
            interval: Duration::from_millis(options.interval_ms),
        })
    }

    pub fn stop_synchronized_path(&mut self, target_keys: &[TargetKey]) {
        {
            let mut core = self.core.borrow_mut();
            if let Some(flag) = core.sync_flags.get_mut(target_keys) {
                flag.stop();
            }
            core.engine.cancel();
        }
        log::info!("Stopped synchronized path [{}]", TargetKey::join(target_keys));
        self.pool.run_until_stalled();
    }

    pub fn is_synchronized_playing(&self, target_keys: &[TargetKey]) -> bool {
        self.core
            .borrow()
            .sync_flags
            .get(target_keys)
            .is_some_and(PlaybackFlag::is_playing)
    }

    // ------------------------------------------------------------------
    // Easing and persistence
    // ------------------------------------------------------------------

    pub fn resolve_easing(&self, name: &str) -> Easing {
        resolve_easing(name)
    }

    /// Plain data for an external save/load collaborator.
    pub fn snapshot(&self) -> ViewpointSnapshot {
        ViewpointSnapshot::capture(&self.core.borrow().registry)
    }

    /// Replace every viewpoint with the snapshot's. Playback is stopped first.
    pub fn restore(&mut self, snapshot: &ViewpointSnapshot) -> Result<()> {
        self.stop_all_sequences();
        // Cleared copy keeps the id counter, so ids are never handed out twice
        let mut registry = self.core.borrow().registry.clone();
        registry.clear();
        snapshot.apply(&mut registry)?;
        self.core.borrow_mut().registry = registry;
        Ok(())
    }

    fn spawn_playback(&mut self, playback: Playback) -> PlaybackHandle {
        let (sender, handle) = PlaybackHandle::channel();
        let task = run_playback(Rc::clone(&self.core), Rc::clone(&self.timers), playback);

        let spawned = self.spawner.spawn_local(async move {
            let outcome = task.await;
            let _ = sender.send(outcome);
        });
        if let Err(e) = spawned {
            log::error!("Failed to spawn playback task: {}", e);
        }

        // Start the first step right away
        self.pool.run_until_stalled();
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectTransform, SceneGraph};
    use crate::timer::ManualClock;
    use crate::transition::TransitionOutcome;
    use glam::Vec3;

    fn pose(x: f32) -> CameraPose {
        CameraPose::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO)
    }

    fn director() -> (Director<SceneGraph>, ManualClock) {
        let clock = ManualClock::new();
        let mut scene = SceneGraph::new(pose(0.0));
        scene.insert_object("car", ObjectTransform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        (Director::with_clock(scene, clock.clone()), clock)
    }

    fn capture(director: &mut Director<SceneGraph>, key: &TargetKey, x: f32) -> ViewpointId {
        director.with_scene_mut(|scene| scene.camera = pose(x));
        director.add_view_point(None, key.clone(), true).id
    }

    #[test]
    fn test_play_view_point_animates() {
        let (mut director, _clock) = director();
        let id = capture(&mut director, &TargetKey::Main, 8.0);
        director.with_scene_mut(|scene| scene.camera = pose(0.0));

        let mut handle = director.play_view_point(id, true).unwrap();
        assert_eq!(director.get_current_index(&TargetKey::Main), Some(0));

        director.tick(0.5);
        assert!(director.camera_pose().abs_diff_eq(&pose(4.0), 1e-4));
        assert_eq!(handle.try_outcome(), None);

        director.tick(0.5);
        assert_eq!(director.camera_pose(), pose(8.0));
        assert_eq!(handle.try_outcome(), Some(TransitionOutcome::Completed));
    }

    #[test]
    fn test_play_view_point_snaps() {
        let (mut director, _clock) = director();
        let id = capture(&mut director, &TargetKey::Main, 8.0);
        director.with_scene_mut(|scene| scene.camera = pose(0.0));

        let mut handle = director.play_view_point(id, false).unwrap();
        assert_eq!(handle.try_outcome(), Some(TransitionOutcome::Completed));
        assert_eq!(director.camera_pose(), pose(8.0));
    }

    #[test]
    fn test_play_unknown_viewpoint_is_not_found() {
        let (mut director, _clock) = director();
        let before = director.camera_pose();
        assert!(matches!(
            director.play_view_point(ViewpointId(42), true),
            Err(ViewpointError::NotFound(ViewpointId(42)))
        ));
        assert_eq!(director.camera_pose(), before);
        assert!(!director.is_transitioning());
    }

    #[test]
    fn test_transition_targets_moving_anchor_at_start() {
        let (mut director, _clock) = director();
        let key = TargetKey::object("car");
        let id = capture(&mut director, &key, 12.0);

        director.with_scene_mut(|scene| {
            scene.translate_object("car", Vec3::new(0.0, 5.0, 0.0));
            scene.camera = pose(0.0);
        });
        let _handle = director.play_view_point(id, false).unwrap();
        assert!(director
            .camera_pose()
            .position
            .abs_diff_eq(Vec3::new(12.0, 5.0, 0.0), 1e-4));
    }

    #[test]
    fn test_next_and_prev_cycle() {
        let (mut director, _clock) = director();
        let key = TargetKey::Main;
        for x in [1.0, 2.0, 3.0] {
            capture(&mut director, &key, x);
        }

        assert!(director.next_view_point(&key).is_some());
        assert_eq!(director.get_current_index(&key), Some(0));
        for _ in 0..3 {
            director.next_view_point(&key);
        }
        assert_eq!(director.get_current_index(&key), Some(0));

        director.prev_view_point(&key);
        assert_eq!(director.get_current_index(&key), Some(2));

        assert!(director.next_view_point(&TargetKey::object("nothing")).is_none());
    }

    #[test]
    fn test_stop_freezes_sequence() {
        let (mut director, clock) = director();
        let key = TargetKey::Main;
        for x in [10.0, 20.0, 30.0] {
            capture(&mut director, &key, x);
        }
        director.with_scene_mut(|scene| scene.camera = pose(0.0));

        let mut handle = director.play_view_sequence(None, SequenceOptions::default());
        assert!(director.is_sequence_playing(&key));

        director.tick(0.25);
        director.stop_view_sequence(&key);
        let frozen = director.camera_pose();
        assert!(frozen.abs_diff_eq(&pose(2.5), 1e-4));
        assert_eq!(handle.try_outcome(), Some(PlaybackOutcome::Stopped));

        for _ in 0..10 {
            clock.advance(Duration::from_millis(500));
            director.tick(0.5);
        }
        assert_eq!(director.camera_pose(), frozen);
        assert!(!director.is_sequence_playing(&key));
    }

    #[test]
    fn test_snapshot_restore() {
        let (mut director, _clock) = director();
        let key = TargetKey::object("car");
        let id = capture(&mut director, &key, 3.0);
        let snapshot = director.snapshot();

        director.clear();
        assert!(director.get_view_points(&key).is_empty());

        director.restore(&snapshot).unwrap();
        let views = director.get_view_points(&key);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, id);
        assert!(views[0].position.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-4));
    }
}
