use std::time::{Duration, Instant};

/// A pending frame continuation. It only fires while the loop generation it
/// was issued under is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

/// Cooperative frame scheduler driven by the host's vsync callback.
///
/// The host asks for a ticket after each frame and hands it back on the next
/// refresh. `stop` is observed at the top of the next tick; `invalidate`
/// additionally orphans every ticket already handed out, so a stale callback
/// chain cannot re-arm itself after teardown.
#[derive(Debug, Default)]
pub struct FrameLoop {
    running: bool,
    generation: u64,
    last_tick: Option<Instant>,
}

impl FrameLoop {
    pub fn new() -> Self {
        FrameLoop::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` if the loop was already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last_tick = Some(now);
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn invalidate(&mut self) {
        self.running = false;
        self.last_tick = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn schedule(&self) -> FrameTicket {
        FrameTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: FrameTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Consumes a ticket. Yields the time since the previous tick, or `None`
    /// when the ticket is stale or the loop is stopped.
    pub fn tick(&mut self, ticket: FrameTicket, now: Instant) -> Option<Duration> {
        if !self.is_current(ticket) || !self.running {
            return None;
        }
        let delta = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);
        Some(delta)
    }
}
