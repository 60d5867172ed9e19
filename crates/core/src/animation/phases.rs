use super::easing::{ease_in_out_quad, window_progress};

/// Per-element reveal amounts during the build-in of a chord, each in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPhases {
    pub chord_name: f32,
    pub neck: f32,
    pub string_names: f32,
    pub strings: f32,
    pub frets: f32,
    pub nut: f32,
    pub fingers: f32,
    pub avoided: f32,
    pub position_indicator: f32,
}

impl AnimationPhases {
    pub const COMPLETE: AnimationPhases = AnimationPhases {
        chord_name: 1.0,
        neck: 1.0,
        string_names: 1.0,
        strings: 1.0,
        frets: 1.0,
        nut: 1.0,
        fingers: 1.0,
        avoided: 1.0,
        position_indicator: 1.0,
    };
}

const CHORD_NAME: (f32, f32) = (0.0, 0.10);
const NECK: (f32, f32) = (0.10, 0.30);
const STRING_NAMES: (f32, f32) = (0.30, 0.40);
const STRINGS: (f32, f32) = (0.40, 0.50);
const FRETS: (f32, f32) = (0.50, 0.65);
const NUT: (f32, f32) = (0.65, 0.75);
const FINGERS: (f32, f32) = (0.75, 0.90);
const AVOIDED: (f32, f32) = (0.90, 0.95);
const POSITION_INDICATOR: (f32, f32) = (0.95, 1.00);

fn phase(progress: f32, (start, end): (f32, f32)) -> f32 {
    ease_in_out_quad(window_progress(progress, start, end))
}

/// Staged reveal for an overall build progress. The windows are fixed, so
/// the staging does not depend on how long the build takes.
pub fn phases_for(progress: f32) -> AnimationPhases {
    let progress = if progress.is_nan() { 1.0 } else { progress.clamp(0.0, 1.0) };
    AnimationPhases {
        chord_name: phase(progress, CHORD_NAME),
        neck: phase(progress, NECK),
        string_names: phase(progress, STRING_NAMES),
        strings: phase(progress, STRINGS),
        frets: phase(progress, FRETS),
        nut: phase(progress, NUT),
        fingers: phase(progress, FINGERS),
        avoided: phase(progress, AVOIDED),
        position_indicator: phase(progress, POSITION_INDICATOR),
    }
}
