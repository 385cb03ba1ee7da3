//! Time utilities for the server shell and tick loop

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Interval between ticks for a nominal rate in Hz.
///
/// Non-positive or non-finite rates fall back to one tick per second.
pub fn period_for_rate(hz: f32) -> Duration {
    if hz.is_finite() && hz > 0.0 {
        Duration::from_nanos((1e9 / hz as f64).round() as u64)
    } else {
        Duration::from_secs(1)
    }
}

/// Measures wall-clock seconds between consecutive ticks
#[derive(Debug, Clone)]
pub struct TickClock {
    last: Instant,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds elapsed since the previous call (or construction)
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
