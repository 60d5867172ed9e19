use std::{collections::BTreeSet, fmt};

use super::{
    analysis::{primary_barre_index, transpose_for_display},
    BarreInfo, ChordShape, FingerKey, FingerPlacement,
};
use crate::FretboardConfig;

/// What was wrong with a placement that had to be repaired or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    StringOutOfRange,
    EndStringOutOfRange,
    DegenerateBarre,
    FretOutOfRange,
    AvoidedStringOutOfRange,
}

/// Record of a repair made while preparing a chord for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Drops placements on strings the fretboard does not have and repairs
/// barres whose ends are out of range or coincide.
pub fn sanitize(shape: &ChordShape, config: &FretboardConfig) -> (ChordShape, Vec<Diagnostic>) {
    let strings = 1..=config.string_count;
    let mut diagnostics = Vec::new();
    let mut placements = Vec::with_capacity(shape.placements.len());

    for placement in &shape.placements {
        if !strings.contains(&placement.string) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::StringOutOfRange,
                format!(
                    "skipped placement on string {} (fretboard has {} strings)",
                    placement.string, config.string_count
                ),
            ));
            continue;
        }

        let mut placement = placement.clone();
        if let Some(end) = placement.end_string {
            if end == placement.string {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DegenerateBarre,
                    format!("barre on string {end} starts and ends on the same string"),
                ));
                placement.end_string = None;
            } else if !strings.contains(&end) {
                let clamped = end.clamp(1, config.string_count.max(1));
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::EndStringOutOfRange,
                    format!("barre end string {end} clamped to {clamped}"),
                ));
                placement.end_string = (clamped != placement.string).then_some(clamped);
            }
        }
        placements.push(placement);
    }

    let mut avoided_strings = BTreeSet::new();
    for &string in &shape.avoided_strings {
        if strings.contains(&string) {
            avoided_strings.insert(string);
        } else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::AvoidedStringOutOfRange,
                format!("ignored avoided string {string}"),
            ));
        }
    }

    let sanitized = ChordShape {
        name: shape.name.clone(),
        placements,
        avoided_strings,
        capo: shape.capo,
    };
    (sanitized, diagnostics)
}

/// A chord ready to draw: sanitised, transposed into the display window and
/// analysed once when the sequence is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChord {
    /// Shape as displayed, after transposition.
    pub shape: ChordShape,
    /// True starting fret; 1 means the shape is unshifted.
    pub display_offset: u8,
    pub barre: Option<BarreInfo>,
    barre_index: Option<usize>,
    pub capo: Option<u8>,
    pub avoided: BTreeSet<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PreparedChord {
    /// `song_capo` applies when the shape carries no capo of its own; the
    /// fretboard capo is the last fallback. A capo at fret 0 means none.
    pub fn prepare(shape: &ChordShape, config: &FretboardConfig, song_capo: Option<u8>) -> Self {
        let (sanitized, mut diagnostics) = sanitize(shape, config);
        let (mut displayed, display_offset) = transpose_for_display(&sanitized);

        for placement in displayed.placements.iter_mut().filter(|p| !p.avoid) {
            if placement.fret > config.fret_count {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::FretOutOfRange,
                    format!(
                        "fret {} on string {} clamped to {}",
                        placement.fret, placement.string, config.fret_count
                    ),
                ));
                placement.fret = config.fret_count;
            }
        }

        let barre_index = primary_barre_index(&displayed);
        let barre = barre_index.map(|index| BarreInfo::from_placement(&displayed.placements[index]));
        let capo = shape
            .capo
            .or(song_capo)
            .or(config.capo)
            .filter(|&fret| fret > 0);
        let avoided = displayed.avoided();

        for diagnostic in &diagnostics {
            tracing::warn!(chord = %shape.name, kind = ?diagnostic.kind, "{diagnostic}");
        }

        Self {
            shape: displayed,
            display_offset,
            barre,
            barre_index,
            capo,
            avoided,
            diagnostics,
        }
    }

    pub fn name(&self) -> &str {
        &self.shape.name
    }

    /// The open-position nut is only drawn when the shape sits at the top of
    /// the neck and no capo is fitted.
    pub fn shows_nut(&self) -> bool {
        self.capo.is_none() && self.display_offset <= 1
    }

    pub fn is_transposed(&self) -> bool {
        self.display_offset > 1
    }

    /// Drawn placements other than the primary barre, with their identity.
    pub fn loose_fingers(&self) -> Vec<(FingerKey, &FingerPlacement)> {
        let mut ordinals: Vec<(Option<super::Finger>, u8)> = Vec::new();
        let mut fingers = Vec::new();

        for (index, placement) in self.shape.placements.iter().enumerate() {
            if placement.avoid || Some(index) == self.barre_index {
                continue;
            }

            let ordinal = match placement.finger {
                Some(finger) => match ordinals.iter_mut().find(|(f, _)| *f == Some(finger)) {
                    Some((_, count)) => {
                        *count += 1;
                        *count
                    }
                    None => {
                        ordinals.push((Some(finger), 0));
                        0
                    }
                },
                None => placement.string,
            };

            fingers.push((
                FingerKey {
                    finger: placement.finger,
                    ordinal,
                },
                placement,
            ));
        }

        fingers
    }
}
