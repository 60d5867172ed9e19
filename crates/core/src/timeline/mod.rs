//! Maps elapsed time over a chord sequence to an [`AnimationState`].
//!
//! Each segment splits into an incoming half-transition (progress 0.5 to 1,
//! absent on the first segment), a hold (progress 0) and an outgoing
//! half-transition (progress 0 to 0.5, absent on the last segment). The
//! instant a segment starts belongs to that segment with progress exactly
//! 0.5, so every logical transition is centred on its chord boundary.

mod transport;

pub use transport::{Clock, ManualClock, MonotonicClock, PlaybackMode, Transport};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{chord::ChordShape, config::PlaybackConfig, Result};

/// Shortest segment the timeline accepts. Shorter or non-positive durations
/// are raised to this so no window has zero width.
pub const MIN_SEGMENT_MS: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub chord: ChordShape,
    pub duration_ms: f64,
}

impl TimelineSegment {
    pub fn new(chord: ChordShape, duration_ms: f64) -> Self {
        Self { chord, duration_ms }
    }
}

/// A chord sequence as supplied by an editor or a song file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Song {
    pub title: String,
    /// Capo for every chord that carries none of its own.
    pub capo: Option<u8>,
    pub segments: Vec<TimelineSegment>,
}

impl Song {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Where playback is at one instant. All progress values are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub chord_index: usize,
    /// 0 at rest; `[0.5, 1]` finishes the transition into `chord_index`;
    /// `(0, 0.5)` starts the transition out of it.
    pub transition_progress: f32,
    pub build_progress: f32,
    /// Fraction of the current segment that has elapsed.
    pub chord_progress: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            chord_index: 0,
            transition_progress: 0.0,
            build_progress: 1.0,
            chord_progress: 0.0,
        }
    }
}

/// The chord pair a mid-transition state is blending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRef {
    pub from: usize,
    pub to: usize,
    pub progress: f32,
}

impl AnimationState {
    pub fn is_resting(&self) -> bool {
        self.transition_progress <= 0.0
    }

    /// The transition this state is part of, if any. Both chords of the
    /// pair are below `segment_count`.
    pub fn transition(&self, segment_count: usize) -> Option<TransitionRef> {
        let progress = self.transition_progress;
        if progress >= 0.5 && self.chord_index > 0 && self.chord_index < segment_count {
            Some(TransitionRef {
                from: self.chord_index - 1,
                to: self.chord_index,
                progress,
            })
        } else if progress > 0.0 && progress < 0.5 && self.chord_index + 1 < segment_count {
            Some(TransitionRef {
                from: self.chord_index,
                to: self.chord_index + 1,
                progress,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Windows {
    half_transition_ms: f64,
    build_ms: f64,
    build_enabled: bool,
}

impl Windows {
    fn from_config(config: &PlaybackConfig) -> Self {
        let half = if config.transitions_enabled {
            sanitize_ms(config.transition_ms) * 0.5
        } else {
            0.0
        };
        Self {
            half_transition_ms: half,
            build_ms: sanitize_ms(config.build_ms),
            build_enabled: config.build_enabled,
        }
    }
}

fn sanitize_ms(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn clamp_duration(duration_ms: f64) -> f64 {
    if duration_ms.is_finite() {
        duration_ms.max(MIN_SEGMENT_MS)
    } else {
        MIN_SEGMENT_MS
    }
}

fn ratio(numerator: f64, denominator: f64) -> f32 {
    if denominator <= 0.0 {
        return 1.0;
    }
    (numerator / denominator).clamp(0.0, 1.0) as f32
}

/// Segment layout with cumulative start times.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackTimeline {
    segments: Vec<TimelineSegment>,
    starts: Vec<f64>,
    total_ms: f64,
    windows: Windows,
}

impl PlaybackTimeline {
    pub fn new(segments: Vec<TimelineSegment>, config: &PlaybackConfig) -> Self {
        let mut segments = segments;
        let mut starts = Vec::with_capacity(segments.len());
        let mut cursor = 0.0;
        for segment in &mut segments {
            let clamped = clamp_duration(segment.duration_ms);
            if clamped != segment.duration_ms {
                tracing::warn!(
                    chord = %segment.chord.name,
                    requested = segment.duration_ms,
                    used = clamped,
                    "segment duration raised to minimum"
                );
                segment.duration_ms = clamped;
            }
            starts.push(cursor);
            cursor += clamped;
        }

        Self {
            segments,
            starts,
            total_ms: cursor,
            windows: Windows::from_config(config),
        }
    }

    pub fn from_song(song: &Song, config: &PlaybackConfig) -> Self {
        Self::new(song.segments.clone(), config)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    pub fn segment_start(&self, index: usize) -> Option<f64> {
        self.starts.get(index).copied()
    }

    /// Index of the segment owning `t_ms`, after clamping to the timeline.
    pub fn segment_index_at(&self, t_ms: f64) -> usize {
        let t = self.clamp_time(t_ms);
        self.starts
            .partition_point(|&start| start <= t)
            .saturating_sub(1)
    }

    fn clamp_time(&self, t_ms: f64) -> f64 {
        if t_ms.is_nan() {
            return 0.0;
        }
        t_ms.clamp(0.0, self.total_ms)
    }

    fn half_window(&self, index: usize) -> f64 {
        self.windows
            .half_transition_ms
            .min(self.segments[index].duration_ms * 0.5)
    }

    /// State at `t_ms`. Pure in the segment durations and the playback
    /// settings, so live playback, export and seeking all agree.
    pub fn query_at(&self, t_ms: f64) -> AnimationState {
        if self.segments.is_empty() {
            return AnimationState::default();
        }

        let t = self.clamp_time(t_ms);
        let index = self.segment_index_at(t);
        let duration = self.segments[index].duration_ms;
        let local = t - self.starts[index];

        let half_in = if index > 0 { self.half_window(index) } else { 0.0 };
        let half_out = if index + 1 < self.segments.len() {
            self.half_window(index)
        } else {
            0.0
        };
        let hold_end = duration - half_out;

        let transition_progress = if half_in > 0.0 && local < half_in {
            0.5 + 0.5 * ratio(local, half_in)
        } else if half_out > 0.0 && local >= hold_end {
            0.5 * ratio(local - hold_end, half_out)
        } else {
            0.0
        };

        let build_progress = if index == 0 && self.windows.build_enabled && local < hold_end {
            let ramp = self.windows.build_ms.min(hold_end);
            ratio(local, ramp)
        } else {
            1.0
        };

        AnimationState {
            chord_index: index,
            transition_progress,
            build_progress,
            chord_progress: ratio(local, duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback(transition_ms: f64) -> PlaybackConfig {
        PlaybackConfig {
            transition_ms,
            build_enabled: false,
            ..PlaybackConfig::default()
        }
    }

    fn timeline(durations: &[f64], config: &PlaybackConfig) -> PlaybackTimeline {
        let segments = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| TimelineSegment::new(ChordShape::new(format!("C{i}")), d))
            .collect();
        PlaybackTimeline::new(segments, config)
    }

    #[test]
    fn boundary_belongs_to_the_incoming_segment() {
        let timeline = timeline(&[1000.0, 1000.0, 1000.0], &playback(500.0));
        let state = timeline.query_at(1000.0);
        assert_eq!(state.chord_index, 1);
        assert_eq!(state.transition_progress, 0.5);

        let before = timeline.query_at(999.0);
        assert_eq!(before.chord_index, 0);
        assert!(before.transition_progress < 0.5 && before.transition_progress > 0.49);
    }

    #[test]
    fn halves_and_hold() {
        let timeline = timeline(&[1000.0, 1000.0, 1000.0], &playback(500.0));
        assert_eq!(timeline.query_at(500.0).transition_progress, 0.0);
        assert_eq!(timeline.query_at(750.0).transition_progress, 0.0);
        assert_eq!(timeline.query_at(875.0).transition_progress, 0.25);
        assert_eq!(timeline.query_at(1125.0).transition_progress, 0.75);
        assert_eq!(timeline.query_at(1250.0).transition_progress, 0.0);
        assert_eq!(timeline.query_at(1500.0).transition_progress, 0.0);
    }

    #[test]
    fn short_segments_shrink_the_window() {
        let timeline = timeline(&[1000.0, 200.0, 1000.0], &playback(500.0));
        // Middle segment: halves of 100ms each, no hold.
        assert_eq!(timeline.query_at(1050.0).transition_progress, 0.75);
        assert_eq!(timeline.query_at(1100.0).transition_progress, 0.0);
        assert_eq!(timeline.query_at(1150.0).transition_progress, 0.25);
    }

    #[test]
    fn chord_index_is_monotonic() {
        let timeline = timeline(&[300.0, 700.0, 120.0, 900.0], &playback(530.0));
        let mut previous = 0;
        let mut t = 0.0;
        while t <= timeline.total_ms() {
            let index = timeline.query_at(t).chord_index;
            assert!(index >= previous);
            previous = index;
            t += 7.0;
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn clamps_time_and_rests_at_the_ends() {
        let timeline = timeline(&[1000.0, 1000.0], &playback(500.0));
        let start = timeline.query_at(-50.0);
        assert_eq!(start.chord_index, 0);
        assert!(start.is_resting());

        let end = timeline.query_at(1e9);
        assert_eq!(end.chord_index, 1);
        assert!(end.is_resting());
        assert_eq!(end.chord_progress, 1.0);
        assert_eq!(timeline.query_at(f64::NAN).chord_index, 0);
    }

    #[test]
    fn non_positive_durations_are_floor_clamped() {
        let timeline = timeline(&[0.0, -20.0, f64::NAN], &playback(500.0));
        assert_eq!(timeline.total_ms(), 3.0 * MIN_SEGMENT_MS);
        let state = timeline.query_at(MIN_SEGMENT_MS);
        assert_eq!(state.chord_index, 1);
        assert_eq!(state.transition_progress, 0.5);
    }

    #[test]
    fn disabled_transitions_hard_cut() {
        let config = PlaybackConfig {
            transitions_enabled: false,
            ..playback(500.0)
        };
        let timeline = timeline(&[1000.0, 1000.0], &config);
        for t in [0.0, 900.0, 999.0, 1000.0, 1100.0] {
            assert_eq!(timeline.query_at(t).transition_progress, 0.0);
        }
    }

    #[test]
    fn build_ramps_inside_the_first_hold_only() {
        let config = PlaybackConfig {
            transition_ms: 500.0,
            build_ms: 400.0,
            build_enabled: true,
            ..PlaybackConfig::default()
        };
        let timeline = timeline(&[1000.0, 1000.0], &config);
        assert_eq!(timeline.query_at(0.0).build_progress, 0.0);
        assert_eq!(timeline.query_at(200.0).build_progress, 0.5);
        assert_eq!(timeline.query_at(400.0).build_progress, 1.0);
        assert_eq!(timeline.query_at(900.0).build_progress, 1.0);
        assert_eq!(timeline.query_at(1100.0).build_progress, 1.0);
    }

    #[test]
    fn build_ramp_fits_a_short_first_hold() {
        let config = PlaybackConfig {
            transition_ms: 500.0,
            build_ms: 5000.0,
            build_enabled: true,
            ..PlaybackConfig::default()
        };
        let timeline = timeline(&[1000.0, 1000.0], &config);
        // Hold is 750ms long, so the build completes by then.
        assert_eq!(timeline.query_at(375.0).build_progress, 0.5);
        assert_eq!(timeline.query_at(750.0).build_progress, 1.0);
    }

    #[test]
    fn transition_ref_picks_the_right_pair() {
        let timeline = timeline(&[1000.0, 1000.0, 1000.0], &playback(500.0));
        let late = timeline.query_at(1100.0).transition(3).expect("incoming");
        assert_eq!((late.from, late.to), (0, 1));
        let early = timeline.query_at(1900.0).transition(3).expect("outgoing");
        assert_eq!((early.from, early.to), (1, 2));
        assert!(timeline.query_at(1500.0).transition(3).is_none());
    }

    #[test]
    fn transition_ref_stays_inside_the_sequence() {
        let state = AnimationState {
            chord_index: 2,
            transition_progress: 0.75,
            ..AnimationState::default()
        };
        assert!(state.transition(2).is_none());
        let pair = state.transition(3).expect("incoming");
        assert_eq!((pair.from, pair.to), (1, 2));
    }

    #[test]
    fn empty_timeline_is_at_rest() {
        let timeline = timeline(&[], &playback(500.0));
        assert_eq!(timeline.query_at(10.0), AnimationState::default());
        assert_eq!(timeline.total_ms(), 0.0);
    }

    #[test]
    fn song_parses_from_json() {
        let song = Song::from_json(
            r#"{
                "title": "Demo",
                "capo": 2,
                "segments": [
                    {"chord": {"name": "Am", "placements": [{"string": 2, "fret": 1, "finger": 1}]}, "duration_ms": 1000},
                    {"chord": {"name": "E"}, "duration_ms": 800}
                ]
            }"#,
        )
        .expect("song");
        assert_eq!(song.title, "Demo");
        assert_eq!(song.capo, Some(2));
        assert_eq!(song.segments.len(), 2);
        assert_eq!(song.segments[0].chord.placements[0].fret, 1);
    }
}
