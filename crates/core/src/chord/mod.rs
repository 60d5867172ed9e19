//! Chord data model and the analysis applied to a single chord before it is
//! drawn: barre detection, display transposition and placement sanitising.

mod analysis;
mod prepare;

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::ChordDiagramError;

pub use analysis::{detect_primary_barre, primary_barre_index, transpose_for_display, DISPLAY_WINDOW_FRETS};
pub use prepare::{sanitize, Diagnostic, DiagnosticKind, PreparedChord};

/// Label printed inside a finger marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "FingerLabel", into = "FingerLabel")]
pub enum Finger {
    Number(u8),
    Thumb,
}

impl Finger {
    pub fn number(&self) -> Option<u8> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Thumb => None,
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Thumb => f.write_str("T"),
        }
    }
}

/// Wire form of [`Finger`]: either a number or the string `"T"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FingerLabel {
    Number(u8),
    Text(String),
}

impl TryFrom<FingerLabel> for Finger {
    type Error = ChordDiagramError;

    fn try_from(value: FingerLabel) -> Result<Self, Self::Error> {
        match value {
            FingerLabel::Number(number) => Ok(Self::Number(number)),
            FingerLabel::Text(text) => match text.trim() {
                "T" | "t" | "thumb" => Ok(Self::Thumb),
                other => other
                    .parse::<u8>()
                    .map(Self::Number)
                    .map_err(|_| ChordDiagramError::msg(format!("unknown finger label `{other}`"))),
            },
        }
    }
}

impl From<Finger> for FingerLabel {
    fn from(value: Finger) -> Self {
        match value {
            Finger::Number(number) => Self::Number(number),
            Finger::Thumb => Self::Text("T".to_string()),
        }
    }
}

/// One fretted (or muted) position within a chord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerPlacement {
    /// 1-based string number; string 1 is the highest pitched.
    pub string: u8,
    /// 0 means the string rings open.
    pub fret: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger: Option<Finger>,
    /// Other end of a barre when it differs from `string`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_string: Option<u8>,
    #[serde(default)]
    pub avoid: bool,
}

impl FingerPlacement {
    pub fn new(string: u8, fret: u8, finger: Option<Finger>) -> Self {
        Self {
            string,
            fret,
            finger,
            end_string: None,
            avoid: false,
        }
    }

    pub fn barre(fret: u8, finger: Option<Finger>, start_string: u8, end_string: u8) -> Self {
        Self {
            end_string: Some(end_string),
            ..Self::new(start_string, fret, finger)
        }
    }

    pub fn is_barre(&self) -> bool {
        self.end_string.is_some_and(|end| end != self.string)
    }

    /// Number of strings covered, 1 for plain placements.
    pub fn span(&self) -> u8 {
        match self.end_string {
            Some(end) => self.string.abs_diff(end) + 1,
            None => 1,
        }
    }
}

/// A complete chord as supplied by the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordShape {
    pub name: String,
    #[serde(default)]
    pub placements: Vec<FingerPlacement>,
    #[serde(default)]
    pub avoided_strings: BTreeSet<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capo: Option<u8>,
}

impl ChordShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_placement(mut self, placement: FingerPlacement) -> Self {
        self.placements.push(placement);
        self
    }

    pub fn with_avoided(mut self, string: u8) -> Self {
        self.avoided_strings.insert(string);
        self
    }

    /// Every muted string, whether listed directly or flagged on a placement.
    pub fn avoided(&self) -> BTreeSet<u8> {
        let mut strings = self.avoided_strings.clone();
        strings.extend(
            self.placements
                .iter()
                .filter(|placement| placement.avoid)
                .map(|placement| placement.string),
        );
        strings
    }
}

/// The barre drawn for a chord, derived from its widest spanning placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarreInfo {
    pub fret: u8,
    pub finger: Option<Finger>,
    pub start_string: u8,
    pub end_string: u8,
}

impl BarreInfo {
    pub fn from_placement(placement: &FingerPlacement) -> Self {
        Self {
            fret: placement.fret,
            finger: placement.finger,
            start_string: placement.string,
            end_string: placement.end_string.unwrap_or(placement.string),
        }
    }

    pub fn low_string(&self) -> u8 {
        self.start_string.min(self.end_string)
    }

    pub fn high_string(&self) -> u8 {
        self.start_string.max(self.end_string)
    }

    pub fn span(&self) -> u8 {
        self.start_string.abs_diff(self.end_string) + 1
    }

    pub fn covers(&self, string: u8) -> bool {
        (self.low_string()..=self.high_string()).contains(&string)
    }
}

/// Identity of a loose finger used to pair markers across two chords.
///
/// Labelled fingers are keyed by label and occurrence; unlabelled ones by
/// their string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FingerKey {
    pub finger: Option<Finger>,
    pub ordinal: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finger_labels_accept_numbers_and_thumb() {
        let placement: FingerPlacement =
            serde_json::from_str(r#"{ "string": 6, "fret": 3, "finger": "T" }"#).unwrap();
        assert_eq!(placement.finger, Some(Finger::Thumb));

        let placement: FingerPlacement =
            serde_json::from_str(r#"{ "string": 2, "fret": 1, "finger": 1, "end_string": 6 }"#)
                .unwrap();
        assert_eq!(placement.finger, Some(Finger::Number(1)));
        assert!(placement.is_barre());
        assert_eq!(placement.span(), 5);

        assert!(serde_json::from_str::<FingerPlacement>(
            r#"{ "string": 2, "fret": 1, "finger": "pinky" }"#
        )
        .is_err());
    }

    #[test]
    fn equal_end_string_is_not_a_barre() {
        let placement = FingerPlacement::barre(2, None, 3, 3);
        assert!(!placement.is_barre());
        assert_eq!(placement.span(), 1);
    }

    #[test]
    fn avoided_merges_both_sources() {
        let mut muted = FingerPlacement::new(5, 0, None);
        muted.avoid = true;
        let shape = ChordShape::new("D").with_avoided(6).with_placement(muted);

        assert_eq!(shape.avoided().into_iter().collect::<Vec<_>>(), vec![5, 6]);
    }
}
