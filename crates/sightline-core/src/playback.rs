//! Playback flags and the handle returned by sequence-style playback

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};

/// How a sequence or synchronized path ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackOutcome {
    /// Ran to the end (never for looping playback)
    Finished,
    /// Stopped through `stop_*`
    Stopped,
    /// Another caller took over the camera mid-transition
    Interrupted,
}

/// Playing flag with a generation counter.
///
/// Every start bumps the generation, so a task from an earlier run that wakes
/// up after a stop/restart sees a stale generation and ends instead of
/// continuing alongside the new run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackFlag {
    playing: bool,
    generation: u64,
}

impl PlaybackFlag {
    /// Mark as playing and return the generation owned by the new run.
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.playing = true;
        self.generation
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Stop only if `generation` still owns the flag.
    pub fn finish(&mut self, generation: u64) {
        if self.generation == generation {
            self.playing = false;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// True while the run identified by `generation` may keep going.
    pub fn is_current(&self, generation: u64) -> bool {
        self.playing && self.generation == generation
    }
}

/// Future resolving when a sequence or synchronized path ends.
///
/// A handle whose task was dropped without reporting (the director itself was
/// dropped) resolves to [`PlaybackOutcome::Stopped`].
#[derive(Debug)]
#[must_use = "dropping the handle does not stop playback"]
pub struct PlaybackHandle {
    receiver: oneshot::Receiver<PlaybackOutcome>,
}

impl PlaybackHandle {
    pub(crate) fn channel() -> (oneshot::Sender<PlaybackOutcome>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    /// A handle that has already settled.
    pub fn settled(outcome: PlaybackOutcome) -> Self {
        let (sender, handle) = Self::channel();
        let _ = sender.send(outcome);
        handle
    }

    /// Non-blocking check; `None` while playback is still running.
    pub fn try_outcome(&mut self) -> Option<PlaybackOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(PlaybackOutcome::Stopped),
        }
    }
}

impl Future for PlaybackHandle {
    type Output = PlaybackOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(PlaybackOutcome::Stopped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_generations() {
        let mut flag = PlaybackFlag::default();
        assert!(!flag.is_playing());

        let first = flag.start();
        assert!(flag.is_current(first));

        flag.stop();
        let second = flag.start();
        assert!(!flag.is_current(first));
        assert!(flag.is_current(second));

        // A stale run finishing must not clear the new run
        flag.finish(first);
        assert!(flag.is_playing());
        flag.finish(second);
        assert!(!flag.is_playing());
    }

    #[test]
    fn test_settled_handle() {
        let mut handle = PlaybackHandle::settled(PlaybackOutcome::Finished);
        assert_eq!(handle.try_outcome(), Some(PlaybackOutcome::Finished));
    }

    #[test]
    fn test_dropped_sender_reads_as_stopped() {
        let (sender, handle) = PlaybackHandle::channel();
        drop(sender);
        assert_eq!(futures::executor::block_on(handle), PlaybackOutcome::Stopped);
    }
}
