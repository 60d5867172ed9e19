//! Time-independent animation math: easing, the staged build-in reveal and
//! chord-to-chord transitions.

mod easing;
mod phases;
mod transition;

pub use easing::{ease_in_out_quad, pulse, window_progress};
pub use phases::{phases_for, AnimationPhases};
pub use transition::{
    BarreTransition, FingerTransition, IndicatorTransition, MorphEnd, Presence, TransitionPlan,
};
