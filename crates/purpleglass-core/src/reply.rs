//! Canned replies and simulated latency.
//!
//! Nothing here talks to a model. A reply is one of [`SAMPLE_REPLIES`],
//! delivered after a random delay by a small tokio task that reports back
//! over a channel.

use std::ops::Range;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const SAMPLE_REPLIES: &[&str] = &[
    "Here's a sparkly thought: focus on the next actionable step, and your plan will reveal itself like stardust.",
    "I don't have an API yet, but my imagination is fully online. What shall we dream up together?",
    "PurpleGlass thinks your idea has real shimmer. Try outlining the goal, the why, and the first move.",
    "Consider pairing inspiration with structure. A quick bullet list can turn a vibe into a roadmap.",
    "I'm all about luminous clarity. Need feedback, a summary, or a poem? Just say the word!",
    "Glossy tip: take a mindful pause, breathe in, and let your next question glow brighter.",
];

/// Default latency window in milliseconds, upper bound exclusive.
pub const DEFAULT_DELAY_MS: Range<u64> = 600..1400;

/// Picks canned replies and latencies.
#[derive(Debug)]
pub struct ReplySimulator {
    rng: StdRng,
    delay_ms: Range<u64>,
}

impl ReplySimulator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            delay_ms: DEFAULT_DELAY_MS,
        }
    }

    /// Deterministic simulator for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            delay_ms: DEFAULT_DELAY_MS,
        }
    }

    /// Replace the latency window. An empty window collapses to `start`.
    pub fn with_delay_range(mut self, delay_ms: Range<u64>) -> Self {
        self.delay_ms = if delay_ms.is_empty() {
            delay_ms.start..delay_ms.start + 1
        } else {
            delay_ms
        };
        self
    }

    pub fn delay_range(&self) -> Range<u64> {
        self.delay_ms.clone()
    }

    pub fn choose_reply(&mut self) -> &'static str {
        let idx = self.rng.gen_range(0..SAMPLE_REPLIES.len());
        SAMPLE_REPLIES[idx]
    }

    pub fn latency(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.delay_ms.clone()))
    }
}

impl Default for ReplySimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sent when a scheduled reply is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyReady {
    pub ticket: u64,
}

/// Handle to a scheduled reply. Dropping it cancels the reply.
#[derive(Debug)]
pub struct PendingReply {
    ticket: u64,
    handle: JoinHandle<()>,
}

impl PendingReply {
    /// Spawn a task that sends `ReplyReady { ticket }` once `delay` elapses.
    /// Must be called from within a tokio runtime.
    pub fn schedule(
        delay: Duration,
        ticket: u64,
        notify: mpsc::UnboundedSender<ReplyReady>,
    ) -> Self {
        debug!(ticket, delay_ms = delay.as_millis() as u64, "scheduling reply");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the app is shutting down.
            let _ = notify.send(ReplyReady { ticket });
        });
        Self { ticket, handle }
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn cancel(self) {
        debug!(ticket = self.ticket, "cancelling reply");
        // Drop aborts the task.
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_choose_reply_stays_in_pool() {
        let mut sim = ReplySimulator::seeded(7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let reply = sim.choose_reply();
            assert!(SAMPLE_REPLIES.contains(&reply));
            seen.insert(reply);
        }
        assert!(seen.len() > 1, "selection should not be degenerate");
    }

    #[test]
    fn test_entropy_seeded_choice_is_non_degenerate() {
        let mut sim = ReplySimulator::new();
        let seen: HashSet<_> = (0..1000).map(|_| sim.choose_reply()).collect();
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_latency_within_default_window() {
        let mut sim = ReplySimulator::seeded(42);
        for _ in 0..1000 {
            let ms = sim.latency().as_millis() as u64;
            assert!((600..1400).contains(&ms), "latency {ms}ms out of range");
        }
    }

    #[test]
    fn test_custom_delay_range() {
        let mut sim = ReplySimulator::seeded(1).with_delay_range(10..20);
        for _ in 0..100 {
            let ms = sim.latency().as_millis() as u64;
            assert!((10..20).contains(&ms));
        }
    }

    #[test]
    fn test_empty_delay_range_collapses() {
        let mut sim = ReplySimulator::seeded(1).with_delay_range(50..50);
        assert_eq!(sim.delay_range(), 50..51);
        assert_eq!(sim.latency(), Duration::from_millis(50));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_pending_reply_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pending = PendingReply::schedule(Duration::from_millis(800), 3, tx);
        assert_eq!(pending.ticket(), 3);

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(801)).await;
        let ready = rx.recv().await.unwrap();
        assert_eq!(ready, ReplyReady { ticket: 3 });
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_cancelled_reply_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pending = PendingReply::schedule(Duration::from_millis(600), 1, tx);
        tokio::task::yield_now().await;
        pending.cancel();

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        // Sender was dropped with the aborted task.
        assert!(rx.recv().await.is_none());
    }
}
