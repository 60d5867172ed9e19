//! Playback transport: play/pause/resume, seeking and looping over a
//! [`PlaybackTimeline`].
//!
//! Elapsed time is always `now - start`, read from a [`Clock`], never
//! accumulated per tick, so frame jitter cannot drift the playhead.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

use super::{AnimationState, PlaybackTimeline};

/// Monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Whole milliseconds convert exactly.
fn millis(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + f64::from(duration.subsec_nanos()) / 1_000_000.0
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for tests and offline rendering. Clones share the same
/// time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Current transport mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackMode {
    /// Not running; holds a playhead position.
    Stopped { position_ms: f64 },
    /// Running since `start_ms` on the clock.
    Playing { start_ms: f64 },
    /// Paused with the elapsed time captured.
    Paused { position_ms: f64 },
}

/// Drives a timeline from a clock and produces one [`AnimationState`] per
/// tick.
#[derive(Debug)]
pub struct Transport<C: Clock> {
    clock: C,
    timeline: PlaybackTimeline,
    mode: PlaybackMode,
    looping: bool,
    state: AnimationState,
}

impl<C: Clock> Transport<C> {
    pub fn new(timeline: PlaybackTimeline, clock: C) -> Self {
        let state = timeline.query_at(0.0);
        Self {
            clock,
            timeline,
            mode: PlaybackMode::Stopped { position_ms: 0.0 },
            looping: false,
            state,
        }
    }

    pub fn timeline(&self) -> &PlaybackTimeline {
        &self.timeline
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, PlaybackMode::Playing { .. })
    }

    /// State computed by the last tick or seek.
    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        tracing::debug!(looping, "loop toggled");
    }

    fn now_ms(&self) -> f64 {
        millis(self.clock.now())
    }

    /// Playhead position, wrapped or clamped to the timeline.
    pub fn elapsed_ms(&self) -> f64 {
        let raw = match self.mode {
            PlaybackMode::Stopped { position_ms } | PlaybackMode::Paused { position_ms } => {
                position_ms
            }
            PlaybackMode::Playing { start_ms } => self.now_ms() - start_ms,
        };
        let total = self.timeline.total_ms();
        if self.looping && total > 0.0 && raw >= total {
            raw.rem_euclid(total)
        } else {
            raw.clamp(0.0, total.max(0.0))
        }
    }

    /// Whether a non-looping run has reached the end.
    pub fn is_finished(&self) -> bool {
        !self.looping && self.elapsed_ms() >= self.timeline.total_ms()
    }

    /// Starts from the beginning.
    pub fn start(&mut self) {
        self.mode = PlaybackMode::Playing {
            start_ms: self.now_ms(),
        };
        tracing::debug!("playback started");
        self.refresh();
    }

    pub fn pause(&mut self) {
        if let PlaybackMode::Playing { .. } = self.mode {
            let position_ms = self.elapsed_ms();
            self.mode = PlaybackMode::Paused { position_ms };
            tracing::debug!(position_ms, "playback paused");
            self.refresh();
        }
    }

    /// Continues from the stored position; `start = now - elapsed`.
    pub fn resume(&mut self) {
        match self.mode {
            PlaybackMode::Paused { position_ms } | PlaybackMode::Stopped { position_ms } => {
                self.mode = PlaybackMode::Playing {
                    start_ms: self.now_ms() - position_ms,
                };
                tracing::debug!(position_ms, "playback resumed");
                self.refresh();
            }
            PlaybackMode::Playing { .. } => {}
        }
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Seeks to a fraction of the total duration. Works while playing or
    /// paused without changing mode.
    pub fn seek(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.seek_ms(fraction * self.timeline.total_ms());
    }

    pub fn seek_ms(&mut self, position_ms: f64) {
        let position_ms = self.clamp_position(position_ms);
        self.mode = match self.mode {
            PlaybackMode::Playing { .. } => PlaybackMode::Playing {
                start_ms: self.now_ms() - position_ms,
            },
            PlaybackMode::Paused { .. } => PlaybackMode::Paused { position_ms },
            PlaybackMode::Stopped { .. } => PlaybackMode::Stopped { position_ms },
        };
        tracing::debug!(position_ms, "seeked");
        self.refresh();
    }

    /// Stops and parks the playhead at `position_ms`.
    pub fn reset_to(&mut self, position_ms: f64) {
        let position_ms = self.clamp_position(position_ms);
        self.mode = PlaybackMode::Stopped { position_ms };
        tracing::debug!(position_ms, "playback reset");
        self.refresh();
    }

    /// Reads the clock and recomputes the state.
    pub fn tick(&mut self) -> AnimationState {
        self.refresh();
        self.state
    }

    /// NaN parks at the start.
    fn clamp_position(&self, position_ms: f64) -> f64 {
        if position_ms.is_nan() {
            0.0
        } else {
            position_ms.clamp(0.0, self.timeline.total_ms())
        }
    }

    fn refresh(&mut self) {
        self.state = self.timeline.query_at(self.elapsed_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chord::ChordShape,
        config::PlaybackConfig,
        timeline::TimelineSegment,
    };

    fn transport() -> (Transport<ManualClock>, ManualClock) {
        let config = PlaybackConfig {
            transition_ms: 500.0,
            build_enabled: false,
            ..PlaybackConfig::default()
        };
        let segments = ["A", "B", "C"]
            .iter()
            .map(|name| TimelineSegment::new(ChordShape::new(*name), 1000.0))
            .collect();
        let clock = ManualClock::new();
        clock.advance_ms(10_000);
        let transport = Transport::new(PlaybackTimeline::new(segments, &config), clock.clone());
        (transport, clock)
    }

    #[test]
    fn tick_follows_the_clock() {
        let (mut transport, clock) = transport();
        transport.start();
        clock.advance_ms(1000);
        let state = transport.tick();
        assert_eq!(state.chord_index, 1);
        assert_eq!(state.transition_progress, 0.5);
    }

    #[test]
    fn pause_holds_the_playhead() {
        let (mut transport, clock) = transport();
        transport.start();
        clock.advance_ms(1200);
        transport.pause();
        let paused = transport.state();

        clock.advance_ms(5000);
        assert_eq!(transport.tick(), paused);
        assert_eq!(transport.elapsed_ms(), 1200.0);
    }

    #[test]
    fn seek_while_playing_keeps_running() {
        let (mut transport, clock) = transport();
        transport.start();
        transport.seek(0.5);
        assert_eq!(transport.elapsed_ms(), 1500.0);
        clock.advance_ms(100);
        assert_eq!(transport.elapsed_ms(), 1600.0);
        assert!(transport.is_playing());
    }

    #[test]
    fn stops_at_the_end_unless_looping() {
        let (mut transport, clock) = transport();
        transport.start();
        clock.advance_ms(3500);
        let end = transport.tick();
        assert_eq!(end.chord_index, 2);
        assert!(transport.is_finished());

        transport.set_looping(true);
        assert_eq!(transport.elapsed_ms(), 500.0);
        assert!(!transport.is_finished());
    }

    #[test]
    fn reset_parks_the_playhead() {
        let (mut transport, clock) = transport();
        transport.start();
        clock.advance_ms(2200);
        transport.reset_to(0.0);
        assert_eq!(transport.mode(), PlaybackMode::Stopped { position_ms: 0.0 });
        assert_eq!(transport.tick().chord_index, 0);

        transport.resume();
        clock.advance_ms(1100);
        assert_eq!(transport.tick().chord_index, 1);
    }

    #[test]
    fn nan_positions_park_at_the_start() {
        let (mut transport, clock) = transport();
        transport.start();
        clock.advance_ms(2200);
        transport.reset_to(f64::NAN);
        assert_eq!(transport.mode(), PlaybackMode::Stopped { position_ms: 0.0 });

        transport.resume();
        clock.advance_ms(1500);
        let state = transport.tick();
        assert_eq!(transport.elapsed_ms(), 1500.0);
        assert_eq!(state.chord_index, 1);

        transport.seek_ms(f64::NAN);
        assert_eq!(transport.elapsed_ms(), 0.0);
    }
}
