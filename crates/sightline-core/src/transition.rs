//! The single shared camera transition.
//!
//! At most one transition is live. Starting a new one settles the previous
//! handle with [`TransitionOutcome::Canceled`]; the host drives the live one by
//! calling [`TransitionEngine::advance`] once per rendered frame.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use glam::Vec3;

use crate::easing::Easing;
use crate::scene::Scene;
use crate::viewpoint::CameraPose;

/// Trait for types that can be interpolated (tweened).
pub trait Tweenable: Copy {
    /// Linear interpolation between two values.
    /// `t` should be 0.0 to 1.0, where 0.0 returns `a` and 1.0 returns `b`.
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Tweenable for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Tweenable for Vec3 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Tweenable for CameraPose {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.lerp(&b, t)
    }
}

/// Eased interpolation from `start` to `end` over a fixed duration.
#[derive(Debug, Clone)]
pub struct Tween<T: Tweenable> {
    start: T,
    end: T,
    current: T,
    /// Elapsed time (seconds)
    elapsed: f32,
    /// Total duration (seconds)
    duration: f32,
    easing: Easing,
}

impl<T: Tweenable> Tween<T> {
    pub fn new(start: T, end: T, duration: f32, easing: Easing) -> Self {
        Self {
            start,
            end,
            current: start,
            elapsed: 0.0,
            duration: duration.max(0.0),
            easing,
        }
    }

    /// Advance by `dt` seconds. Returns `true` once the end value is reached;
    /// the final value is exactly `end`.
    pub fn update(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);

        let raw = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };
        let t = self.easing.apply(raw).clamp(0.0, 1.0);

        if raw >= 1.0 || t >= 1.0 {
            self.current = self.end;
            self.elapsed = self.duration;
            return true;
        }

        self.current = T::lerp(self.start, self.end, t);
        false
    }

    pub fn value(&self) -> T {
        self.current
    }

    pub fn target(&self) -> T {
        self.end
    }

    /// Normalized (un-eased) progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Get remaining time in seconds.
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}

/// How a transition ended, as seen by whoever awaited it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Reached the end pose
    Completed,
    /// Superseded by another transition or stopped; camera left mid-way
    Canceled,
}

/// Result of one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStatus {
    Idle,
    Running,
    Completed,
}

/// Future for one transition. Always settles: `Completed` at the end pose,
/// `Canceled` if anything replaces or stops it first.
#[derive(Debug)]
pub struct TransitionHandle {
    receiver: oneshot::Receiver<TransitionOutcome>,
}

impl TransitionHandle {
    fn channel() -> (oneshot::Sender<TransitionOutcome>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    /// A handle that has already settled.
    pub fn settled(outcome: TransitionOutcome) -> Self {
        let (sender, handle) = Self::channel();
        let _ = sender.send(outcome);
        handle
    }

    /// Non-blocking check; `None` while the transition is running.
    pub fn try_outcome(&mut self) -> Option<TransitionOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(TransitionOutcome::Canceled),
        }
    }
}

impl Future for TransitionHandle {
    type Output = TransitionOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the engine went away mid-transition
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(TransitionOutcome::Canceled))
    }
}

struct ActiveTransition {
    tween: Tween<CameraPose>,
    done: oneshot::Sender<TransitionOutcome>,
}

/// Owner of the camera tween. Idle when `active` is `None`.
#[derive(Default)]
pub struct TransitionEngine {
    active: Option<ActiveTransition>,
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    /// End pose of the live transition.
    pub fn target(&self) -> Option<CameraPose> {
        self.active.as_ref().map(|active| active.tween.target())
    }

    /// Progress of the live transition.
    pub fn progress(&self) -> Option<f32> {
        self.active.as_ref().map(|active| active.tween.progress())
    }

    /// Begin a transition from `start` to `end`, replacing any live one.
    pub fn start(
        &mut self,
        start: CameraPose,
        end: CameraPose,
        duration_ms: u32,
        easing: Easing,
    ) -> TransitionHandle {
        self.cancel();

        let (done, handle) = TransitionHandle::channel();
        self.active = Some(ActiveTransition {
            tween: Tween::new(start, end, duration_ms as f32 / 1000.0, easing),
            done,
        });
        log::debug!("Transition started ({} ms, {})", duration_ms, easing);
        handle
    }

    /// Jump straight to `end`. Any live transition is canceled.
    pub fn snap<S: Scene + ?Sized>(&mut self, scene: &mut S, end: CameraPose) -> TransitionHandle {
        self.cancel();
        scene.set_camera_pose(end);
        TransitionHandle::settled(TransitionOutcome::Completed)
    }

    /// Drop the live transition where it is. Returns whether one was live.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                let _ = active.done.send(TransitionOutcome::Canceled);
                log::debug!("Transition canceled at {:.0}%", active.tween.progress() * 100.0);
                true
            }
            None => false,
        }
    }

    /// Advance the live transition by `dt` seconds and write the camera.
    pub fn advance<S: Scene + ?Sized>(&mut self, dt: f32, scene: &mut S) -> TransitionStatus {
        let Some(active) = self.active.as_mut() else {
            return TransitionStatus::Idle;
        };

        let finished = active.tween.update(dt);
        scene.set_camera_pose(active.tween.value());

        if !finished {
            return TransitionStatus::Running;
        }

        if let Some(active) = self.active.take() {
            let _ = active.done.send(TransitionOutcome::Completed);
        }
        TransitionStatus::Completed
    }
}
