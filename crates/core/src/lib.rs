//! Core library for animated guitar chord diagrams.
//!
//! Each module owns one subsystem: `geometry` lays a diagram out, `chord`
//! analyses shapes before drawing, `animation` computes build-in reveals and
//! chord-to-chord transitions, `render` paints onto a drawing surface,
//! `timeline` maps elapsed time to animation state, `scene` composes the
//! visible diagrams for a mode and `record` exports frames.

pub mod animation;
pub mod chord;
pub mod config;
pub mod error;
pub mod geometry;
pub mod record;
pub mod render;
pub mod scene;
pub mod timeline;

pub use animation::{phases_for, AnimationPhases, BarreTransition, TransitionPlan};
pub use chord::{
    detect_primary_barre, transpose_for_display, BarreInfo, ChordShape, Diagnostic, DiagnosticKind,
    Finger, FingerPlacement, PreparedChord,
};
pub use config::{AnimationMode, AppConfig, Color, FretboardConfig, PlaybackConfig, Theme};
pub use error::{ChordDiagramError, Result};
pub use geometry::{recalculate, DiagramGeometry, GeometryCache};
pub use record::{CancelFlag, ExportSummary, Exporter, FrameSink, RecordingSettings, RenderedFrame};
pub use render::{DiagramFrame, DiagramRenderer, RecordingSurface, Surface, SvgSurface};
pub use scene::{Scene, SceneItem};
pub use timeline::{
    AnimationState, Clock, ManualClock, MonotonicClock, PlaybackTimeline, Song, TimelineSegment,
    Transport,
};
