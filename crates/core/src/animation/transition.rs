//! Cross-chord transitions.
//!
//! A [`TransitionPlan`] is resolved once per pair of chords: it decides what
//! happens to the barre and pairs up loose fingers, avoided strings and
//! indicators. Sampling the plan at an eased progress yields a complete
//! [`DiagramFrame`]; at progress 0 and 1 that frame equals the at-rest frame
//! of the outgoing and incoming chord.

use std::collections::BTreeMap;

use super::easing::pulse;
use crate::{
    chord::{BarreInfo, Finger, FingerKey, FingerPlacement, PreparedChord},
    geometry::{lerp, DiagramGeometry},
    render::frame::{
        avoided_glyph, barre_info_box, barre_box, barre_marker, capo_text, chord_label,
        finger_marker, label_slide, placement_box, position_text, presence, text_item,
        DiagramFrame, FretboardReveal, Marker, MarkerBox, MarkerKey, MarkerStyle, TextItem, TextRole,
    },
};

const FADE_OUT_SCALE: f32 = 0.8;
const FADE_IN_SCALE: f32 = 0.5;
const BARRE_FADE_SCALE: f32 = 1.5;
const INDICATOR_PULSE: f32 = 0.2;

/// One end of a barre morph.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphEnd {
    Barre(BarreInfo),
    Finger(FingerKey, FingerPlacement),
}

impl MorphEnd {
    fn key(&self) -> MarkerKey {
        match self {
            Self::Barre(_) => MarkerKey::Barre,
            Self::Finger(key, _) => MarkerKey::Finger(*key),
        }
    }

    fn bounds(&self, geometry: &DiagramGeometry) -> MarkerBox {
        match self {
            Self::Barre(barre) => barre_info_box(barre, geometry),
            Self::Finger(_, placement) => placement_box(placement, geometry),
        }
    }

    fn label(&self) -> Option<String> {
        match self {
            Self::Barre(barre) => barre.finger.map(|finger| finger.to_string()),
            Self::Finger(_, placement) => placement.finger.map(|finger| finger.to_string()),
        }
    }
}

/// What happens to the barre across a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BarreTransition {
    /// Neither chord has a barre.
    Absent,
    /// Both chords have one; fret, ends and label are interpolated.
    Interpolate { from: BarreInfo, to: BarreInfo },
    /// A barre becomes the single finger with the same label, or the reverse.
    Morph { from: MorphEnd, to: MorphEnd },
    /// The outgoing barre has no counterpart.
    FadeOut(BarreInfo),
    /// The incoming barre has no counterpart.
    FadeIn(BarreInfo),
}

impl BarreTransition {
    pub fn resolve(from: &PreparedChord, to: &PreparedChord) -> Self {
        match (from.barre, to.barre) {
            (Some(from), Some(to)) => Self::Interpolate { from, to },
            (Some(barre), None) => match matching_finger(to, &barre) {
                Some((key, placement)) => Self::Morph {
                    from: MorphEnd::Barre(barre),
                    to: MorphEnd::Finger(key, placement),
                },
                None => Self::FadeOut(barre),
            },
            (None, Some(barre)) => match matching_finger(from, &barre) {
                Some((key, placement)) => Self::Morph {
                    from: MorphEnd::Finger(key, placement),
                    to: MorphEnd::Barre(barre),
                },
                None => Self::FadeIn(barre),
            },
            (None, None) => Self::Absent,
        }
    }

    fn consumed_from(&self) -> Option<FingerKey> {
        match self {
            Self::Morph {
                from: MorphEnd::Finger(key, _),
                ..
            } => Some(*key),
            _ => None,
        }
    }

    fn consumed_to(&self) -> Option<FingerKey> {
        match self {
            Self::Morph {
                to: MorphEnd::Finger(key, _),
                ..
            } => Some(*key),
            _ => None,
        }
    }

    fn marker(&self, geometry: &DiagramGeometry, p: f32) -> Option<Marker> {
        match self {
            Self::Absent => None,
            Self::Interpolate { from, to } => {
                let bounds = barre_box(
                    lerp(f32::from(from.fret), f32::from(to.fret), p),
                    lerp(f32::from(from.low_string()), f32::from(to.low_string()), p),
                    lerp(f32::from(from.high_string()), f32::from(to.high_string()), p),
                    geometry,
                );
                Some(Marker {
                    key: MarkerKey::Barre,
                    bounds,
                    label: interpolated_label(from.finger, to.finger, p),
                    style: MarkerStyle::Filled,
                    opacity: 1.0,
                    scale: 1.0,
                })
            }
            Self::Morph { from, to } => {
                let settled = if p < 0.5 { from } else { to };
                Some(Marker {
                    key: settled.key(),
                    bounds: from.bounds(geometry).lerp(to.bounds(geometry), p),
                    label: settled.label(),
                    style: MarkerStyle::Filled,
                    opacity: 1.0,
                    scale: 1.0,
                })
            }
            Self::FadeOut(barre) => Some(Marker {
                opacity: 1.0 - p,
                scale: lerp(1.0, BARRE_FADE_SCALE, p),
                ..barre_marker(barre, geometry)
            }),
            Self::FadeIn(barre) => Some(Marker {
                opacity: p,
                scale: lerp(BARRE_FADE_SCALE, 1.0, p),
                ..barre_marker(barre, geometry)
            }),
        }
    }
}

/// A loose, fretted finger in `chord` with the barre's label. Fingers
/// under the barre's span are preferred.
fn matching_finger(chord: &PreparedChord, barre: &BarreInfo) -> Option<(FingerKey, FingerPlacement)> {
    let finger = barre.finger?;
    let candidates: Vec<(FingerKey, &FingerPlacement)> = chord
        .loose_fingers()
        .into_iter()
        .filter(|(_, placement)| {
            placement.finger == Some(finger) && !placement.is_barre() && placement.fret > 0
        })
        .collect();

    candidates
        .iter()
        .find(|(_, placement)| barre.covers(placement.string))
        .or_else(|| candidates.first())
        .map(|(key, placement)| (*key, (*placement).clone()))
}

fn interpolated_label(from: Option<Finger>, to: Option<Finger>, p: f32) -> Option<String> {
    match (from.and_then(|f| f.number()), to.and_then(|f| f.number())) {
        (Some(a), Some(b)) => {
            let number = lerp(f32::from(a), f32::from(b), p).round() as u8;
            Some(Finger::Number(number).to_string())
        }
        _ => {
            let settled = if p < 0.5 { from } else { to };
            settled.map(|finger| finger.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FingerTransition {
    Move {
        key: FingerKey,
        from: FingerPlacement,
        to: FingerPlacement,
    },
    Leave {
        key: FingerKey,
        placement: FingerPlacement,
    },
    Enter {
        key: FingerKey,
        placement: FingerPlacement,
    },
}

impl FingerTransition {
    fn marker(&self, geometry: &DiagramGeometry, p: f32) -> Marker {
        match self {
            Self::Move { key, from, to } => {
                let start = finger_marker(*key, from, geometry, 1.0, 1.0);
                let end = finger_marker(*key, to, geometry, 1.0, 1.0);
                let settled = if p < 0.5 { start.clone() } else { end.clone() };
                Marker {
                    bounds: start.bounds.lerp(end.bounds, p),
                    ..settled
                }
            }
            Self::Leave { key, placement } => {
                finger_marker(*key, placement, geometry, 1.0 - p, lerp(1.0, FADE_OUT_SCALE, p))
            }
            Self::Enter { key, placement } => {
                finger_marker(*key, placement, geometry, p, lerp(FADE_IN_SCALE, 1.0, p))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Both,
    Before,
    After,
}

/// Cross-fade rule shared by the capo caption and the position numeral.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorTransition {
    Absent,
    Steady(String),
    CrossFade(String, String),
    FadeOut(String),
    FadeIn(String),
}

impl IndicatorTransition {
    fn resolve(before: Option<String>, after: Option<String>) -> Self {
        match (before, after) {
            (Some(a), Some(b)) if a == b => Self::Steady(a),
            (Some(a), Some(b)) => Self::CrossFade(a, b),
            (Some(a), None) => Self::FadeOut(a),
            (None, Some(b)) => Self::FadeIn(b),
            (None, None) => Self::Absent,
        }
    }

    fn items(&self, role: TextRole, geometry: &DiagramGeometry, p: f32, out: &mut Vec<TextItem>) {
        match self {
            Self::Absent => {}
            Self::Steady(text) => out.push(text_item(role, text.clone(), geometry, 1.0, 1.0)),
            Self::CrossFade(a, b) => {
                out.push(text_item(role, a.clone(), geometry, 1.0 - p, 1.0));
                out.push(text_item(role, b.clone(), geometry, p, 1.0));
            }
            Self::FadeOut(a) => out.push(text_item(
                role,
                a.clone(),
                geometry,
                1.0 - p,
                pulse(p, INDICATOR_PULSE),
            )),
            Self::FadeIn(b) => out.push(text_item(
                role,
                b.clone(),
                geometry,
                p,
                pulse(p, INDICATOR_PULSE),
            )),
        }
    }
}

/// Everything decided about a transition between two chords.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    from_name: String,
    to_name: String,
    pub barre: BarreTransition,
    pub fingers: Vec<FingerTransition>,
    pub avoided: Vec<(u8, Presence)>,
    nut: (f32, f32),
    first_fret: (u8, u8),
    capo_bar: (f32, f32),
    pub capo: IndicatorTransition,
    pub position: IndicatorTransition,
}

impl TransitionPlan {
    pub fn new(from: &PreparedChord, to: &PreparedChord) -> Self {
        let barre = BarreTransition::resolve(from, to);
        let consumed_from = barre.consumed_from();
        let consumed_to = barre.consumed_to();

        let incoming: Vec<(FingerKey, &FingerPlacement)> = to
            .loose_fingers()
            .into_iter()
            .filter(|(key, _)| Some(*key) != consumed_to)
            .collect();

        let mut fingers = Vec::new();
        for (key, placement) in from.loose_fingers() {
            if Some(key) == consumed_from {
                continue;
            }
            match incoming.iter().find(|(other, _)| *other == key) {
                Some((_, target)) => fingers.push(FingerTransition::Move {
                    key,
                    from: placement.clone(),
                    to: (*target).clone(),
                }),
                None => fingers.push(FingerTransition::Leave {
                    key,
                    placement: placement.clone(),
                }),
            }
        }
        for (key, placement) in &incoming {
            let known = fingers.iter().any(|finger| {
                matches!(finger, FingerTransition::Move { key: moved, .. } if moved == key)
            });
            if !known {
                fingers.push(FingerTransition::Enter {
                    key: *key,
                    placement: (*placement).clone(),
                });
            }
        }

        let mut avoided: BTreeMap<u8, Presence> = BTreeMap::new();
        for &string in &from.avoided {
            avoided.insert(string, Presence::Before);
        }
        for &string in &to.avoided {
            avoided
                .entry(string)
                .and_modify(|presence| *presence = Presence::Both)
                .or_insert(Presence::After);
        }

        tracing::debug!(
            from = from.name(),
            to = to.name(),
            barre = barre_kind(&barre),
            fingers = fingers.len(),
            "resolved transition plan"
        );

        Self {
            from_name: from.name().to_string(),
            to_name: to.name().to_string(),
            barre,
            fingers,
            avoided: avoided.into_iter().collect(),
            nut: (presence(from.shows_nut()), presence(to.shows_nut())),
            first_fret: (from.display_offset.max(1), to.display_offset.max(1)),
            capo_bar: (presence(from.capo.is_some()), presence(to.capo.is_some())),
            capo: IndicatorTransition::resolve(capo_text(from), capo_text(to)),
            position: IndicatorTransition::resolve(position_text(from), position_text(to)),
        }
    }

    /// Frame at eased progress `progress`; every element shares it.
    pub fn sample(&self, geometry: &DiagramGeometry, progress: f32) -> DiagramFrame {
        let p = if progress.is_nan() { 1.0 } else { progress.clamp(0.0, 1.0) };

        let labels = if self.from_name == self.to_name {
            vec![chord_label(&self.from_name, geometry, 0.0, 1.0)]
        } else {
            let slide = label_slide(geometry);
            vec![
                chord_label(&self.from_name, geometry, -p * slide, 1.0 - p),
                chord_label(&self.to_name, geometry, (1.0 - p) * slide, p),
            ]
        };

        let mut markers: Vec<Marker> = self
            .fingers
            .iter()
            .map(|finger| finger.marker(geometry, p))
            .collect();
        markers.extend(self.barre.marker(geometry, p));

        let avoided = self
            .avoided
            .iter()
            .map(|&(string, presence)| match presence {
                Presence::Both => avoided_glyph(string, geometry, 1.0, 1.0),
                Presence::Before => {
                    avoided_glyph(string, geometry, 1.0 - p, lerp(1.0, FADE_OUT_SCALE, p))
                }
                Presence::After => avoided_glyph(string, geometry, p, lerp(FADE_IN_SCALE, 1.0, p)),
            })
            .collect();

        let mut indicators = Vec::new();
        self.capo.items(TextRole::Capo, geometry, p, &mut indicators);
        self.position
            .items(TextRole::Position, geometry, p, &mut indicators);

        DiagramFrame {
            opacity: 1.0,
            labels,
            fretboard: FretboardReveal::FULL,
            first_fret: if p < 0.5 { self.first_fret.0 } else { self.first_fret.1 },
            nut_opacity: lerp(self.nut.0, self.nut.1, p),
            capo_bar_opacity: lerp(self.capo_bar.0, self.capo_bar.1, p),
            markers,
            avoided,
            indicators,
        }
        .finish()
    }
}

fn barre_kind(barre: &BarreTransition) -> &'static str {
    match barre {
        BarreTransition::Absent => "absent",
        BarreTransition::Interpolate { .. } => "interpolate",
        BarreTransition::Morph { .. } => "morph",
        BarreTransition::FadeOut(_) => "fade-out",
        BarreTransition::FadeIn(_) => "fade-in",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chord::ChordShape, geometry::recalculate, FretboardConfig};

    fn finger(number: u8) -> Option<Finger> {
        Some(Finger::Number(number))
    }

    fn prepare(shape: &ChordShape) -> PreparedChord {
        PreparedChord::prepare(shape, &FretboardConfig::default(), None)
    }

    fn geometry() -> DiagramGeometry {
        recalculate(&FretboardConfig::default())
    }

    fn e_minor() -> ChordShape {
        ChordShape::new("Em")
            .with_placement(FingerPlacement::new(5, 2, finger(2)))
            .with_placement(FingerPlacement::new(4, 2, finger(3)))
            .with_placement(FingerPlacement::new(1, 0, None))
    }

    fn f_major() -> ChordShape {
        ChordShape::new("F")
            .with_placement(FingerPlacement::barre(1, finger(1), 1, 6))
            .with_placement(FingerPlacement::new(3, 2, finger(2)))
            .with_placement(FingerPlacement::new(5, 3, finger(3)))
            .with_placement(FingerPlacement::new(4, 3, finger(4)))
    }

    #[test]
    fn barre_to_barre_interpolates() {
        let mut higher = f_major();
        higher.placements[0] = FingerPlacement::barre(3, finger(1), 1, 5);
        let plan = TransitionPlan::new(&prepare(&f_major()), &prepare(&higher));
        assert!(matches!(plan.barre, BarreTransition::Interpolate { .. }));

        let geometry = geometry();
        let mid = plan.sample(&geometry, 0.5);
        let bar = mid.markers.iter().find(|m| m.key == MarkerKey::Barre).unwrap();
        assert!((bar.bounds.center.y - geometry.fret_y(2.0)).abs() < 1e-3);
        assert_eq!(bar.label.as_deref(), Some("1"));
    }

    #[test]
    fn barre_fades_out_without_a_matching_finger() {
        let plan = TransitionPlan::new(&prepare(&f_major()), &prepare(&e_minor()));
        assert!(matches!(plan.barre, BarreTransition::FadeOut(_)));

        let frame = plan.sample(&geometry(), 0.5);
        let bar = frame.markers.iter().find(|m| m.key == MarkerKey::Barre).unwrap();
        assert_eq!(bar.opacity, 0.5);
        assert_eq!(bar.scale, 1.25);
    }

    #[test]
    fn barre_morphs_into_a_single_finger() {
        let target = ChordShape::new("target").with_placement(FingerPlacement::new(2, 1, finger(1)));
        let plan = TransitionPlan::new(&prepare(&f_major()), &prepare(&target));
        match &plan.barre {
            BarreTransition::Morph {
                from: MorphEnd::Barre(_),
                to: MorphEnd::Finger(_, placement),
            } => assert_eq!(placement.string, 2),
            other => panic!("expected morph, got {other:?}"),
        }
        assert!(plan
            .fingers
            .iter()
            .all(|f| !matches!(f, FingerTransition::Enter { placement, .. } if placement.string == 2)));

        let geometry = geometry();
        let end = plan.sample(&geometry, 1.0);
        let dot = end.markers.iter().find(|m| m.bounds.is_round() && m.label.as_deref() == Some("1"));
        assert!(dot.is_some());
    }

    #[test]
    fn fingers_move_leave_and_enter() {
        let from = ChordShape::new("a")
            .with_placement(FingerPlacement::new(5, 2, finger(2)))
            .with_placement(FingerPlacement::new(4, 2, finger(3)));
        let to = ChordShape::new("b")
            .with_placement(FingerPlacement::new(3, 2, finger(2)))
            .with_placement(FingerPlacement::new(2, 3, finger(4)));
        let plan = TransitionPlan::new(&prepare(&from), &prepare(&to));

        let kinds: Vec<&str> = plan
            .fingers
            .iter()
            .map(|f| match f {
                FingerTransition::Move { .. } => "move",
                FingerTransition::Leave { .. } => "leave",
                FingerTransition::Enter { .. } => "enter",
            })
            .collect();
        assert_eq!(kinds, vec!["move", "leave", "enter"]);

        let geometry = geometry();
        let mid = plan.sample(&geometry, 0.5);
        let moved = &mid.markers[0];
        let expected = (geometry.map_string_to_x(5) + geometry.map_string_to_x(3)) * 0.5;
        assert!((moved.bounds.center.x - expected).abs() < 1e-3);
        let entering = mid.markers.iter().find(|m| m.label.as_deref() == Some("4")).unwrap();
        assert_eq!(entering.opacity, 0.5);
        assert_eq!(entering.scale, 0.75);
    }

    #[test]
    fn labels_slide_and_cross_fade() {
        let plan = TransitionPlan::new(&prepare(&e_minor()), &prepare(&f_major()));
        let geometry = geometry();
        let frame = plan.sample(&geometry, 0.25);
        let anchor = geometry.chord_name_anchor();
        let slide = label_slide(&geometry);

        assert_eq!(frame.labels.len(), 2);
        assert_eq!(frame.labels[0].opacity, 0.75);
        assert!((frame.labels[0].anchor.y - (anchor.y - 0.25 * slide)).abs() < 1e-4);
        assert_eq!(frame.labels[1].opacity, 0.25);
        assert!((frame.labels[1].anchor.y - (anchor.y + 0.75 * slide)).abs() < 1e-4);
    }

    #[test]
    fn avoided_strings_follow_the_presence_rule() {
        let from = ChordShape::new("a").with_avoided(6).with_avoided(5);
        let to = ChordShape::new("b").with_avoided(5).with_avoided(1);
        let plan = TransitionPlan::new(&prepare(&from), &prepare(&to));
        assert_eq!(
            plan.avoided,
            vec![(1, Presence::After), (5, Presence::Both), (6, Presence::Before)]
        );
    }

    #[test]
    fn indicators_cross_fade_different_numerals() {
        let high = |low: u8| {
            ChordShape::new("h")
                .with_placement(FingerPlacement::new(2, low, finger(1)))
                .with_placement(FingerPlacement::new(3, low + 2, finger(3)))
        };
        let plan = TransitionPlan::new(&prepare(&high(7)), &prepare(&high(9)));
        assert_eq!(
            plan.position,
            IndicatorTransition::CrossFade("7".to_string(), "9".to_string())
        );

        let plan = TransitionPlan::new(&prepare(&high(7)), &prepare(&e_minor()));
        assert_eq!(plan.position, IndicatorTransition::FadeOut("7".to_string()));
        let frame = plan.sample(&geometry(), 0.5);
        assert!((frame.indicators[0].scale - 1.2).abs() < 1e-5);
    }

    #[test]
    fn endpoints_match_the_at_rest_frames() {
        let geometry = geometry();
        let shapes = [e_minor(), f_major(), ChordShape::new("C").with_avoided(6)];
        for from in &shapes {
            for to in &shapes {
                let (from, to) = (prepare(from), prepare(to));
                let plan = TransitionPlan::new(&from, &to);
                assert_eq!(plan.sample(&geometry, 0.0), DiagramFrame::at_rest(&from, &geometry));
                assert_eq!(plan.sample(&geometry, 1.0), DiagramFrame::at_rest(&to, &geometry));
            }
        }
    }
}
