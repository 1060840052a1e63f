//! Console session loop
//!
//! Owns the [`Console`] and drives it from three sources:
//!
//! - feed lines arriving on the channel from [`crate::feed`]
//! - the console's own delayed effects, woken at [`Console::next_due`]
//! - a shutdown request
//!
//! The session clock counts milliseconds since the session was created.
//! After every event and every timer wake-up that changed something, the
//! display surface receives a fresh snapshot.

use std::future::Future;
use std::time::{Duration, Instant};

use mdt_core::{Console, ConsoleConfig, DisplaySurface, HostNotifier};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Lines applied to the console
    pub handled: u64,
    /// Lines rejected by decoding or handling
    pub rejected: u64,
    /// Delayed effects that fired
    pub timers: u64,
    pub renders: u64,
}

pub struct Session<H, S> {
    console: Console,
    host: H,
    surface: S,
    start_time: Instant,
    stats: SessionStats,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

impl<H: HostNotifier, S: DisplaySurface> Session<H, S> {
    pub fn new(config: ConsoleConfig, host: H, surface: S) -> Self {
        Session {
            console: Console::new(config),
            host,
            surface,
            start_time: Instant::now(),
            stats: SessionStats::default(),
        }
    }

    pub fn current_time_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn into_parts(self) -> (Console, H, S) {
        (self.console, self.host, self.surface)
    }

    fn render(&mut self) {
        self.console.render(&mut self.surface);
        self.stats.renders += 1;
    }

    /// Apply one feed line
    pub fn on_line(&mut self, line: &str) {
        let now = self.current_time_ms();
        match self.console.handle_raw(&mut self.host, line, now) {
            Ok(()) => self.stats.handled += 1,
            // Already logged by the console
            Err(_) => self.stats.rejected += 1,
        }
        self.render();
    }

    /// Fire due delayed effects
    pub fn on_timer(&mut self) {
        let fired = self.console.tick(self.current_time_ms());
        if fired > 0 {
            self.stats.timers += fired as u64;
            self.render();
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.console
            .next_due()
            .map(|at| self.start_time + Duration::from_millis(at))
    }

    /// Run until the feed closes or `shutdown` completes
    pub async fn run<F>(&mut self, mut lines: mpsc::Receiver<String>, shutdown: F) -> SessionStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.render();

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                _ = &mut shutdown => {
                    log::debug!("Session: shutdown");
                    break;
                },

                _ = wait_until(deadline) => {
                    self.on_timer();
                },

                line = lines.recv() => match line {
                    Some(line) => self.on_line(&line),
                    None => {
                        log::debug!("Session: feed closed");
                        break;
                    }
                },
            }
        }

        log::info!(
            "Session ended: {} handled, {} rejected, {} timers",
            self.stats.handled,
            self.stats.rejected,
            self.stats.timers
        );
        self.stats
    }
}
