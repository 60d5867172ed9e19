//! Theme-independent description of everything painted for one diagram in
//! one frame. Static draws, build-in reveals and transitions all produce a
//! [`DiagramFrame`]; the renderer only knows how to paint one.

use crate::{
    animation::AnimationPhases,
    chord::{BarreInfo, FingerKey, FingerPlacement, PreparedChord},
    geometry::{lerp, DiagramGeometry, Point, Rect},
};

/// How far the chord name slides during a transition, before scaling.
pub(crate) const LABEL_SLIDE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    ChordName,
    Position,
    Capo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub role: TextRole,
    pub text: String,
    pub anchor: Point,
    pub size: f32,
    pub opacity: f32,
    pub scale: f32,
}

/// Draw-order identity of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarkerKey {
    Barre,
    Finger(FingerKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Filled,
    /// Hollow ring for an open string.
    Open,
}

/// Centre plus half extents. A box with equal extents paints as a circle,
/// anything else as a rounded bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerBox {
    pub center: Point,
    pub half_width: f32,
    pub half_height: f32,
}

impl MarkerBox {
    pub fn round(center: Point, radius: f32) -> Self {
        Self {
            center,
            half_width: radius,
            half_height: radius,
        }
    }

    pub fn lerp(self, other: MarkerBox, t: f32) -> Self {
        Self {
            center: self.center.lerp(other.center, t),
            half_width: lerp(self.half_width, other.half_width, t),
            half_height: lerp(self.half_height, other.half_height, t),
        }
    }

    pub fn is_round(&self) -> bool {
        self.half_width == self.half_height
    }

    pub fn rect(&self, scale: f32) -> Rect {
        Rect::from_center(
            self.center,
            self.half_width * scale,
            self.half_height * scale,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub key: MarkerKey,
    pub bounds: MarkerBox,
    pub label: Option<String>,
    pub style: MarkerStyle,
    pub opacity: f32,
    pub scale: f32,
}

/// "x" glyph over a string that must not be played.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidedGlyph {
    pub string: u8,
    pub center: Point,
    pub half_size: f32,
    pub opacity: f32,
    pub scale: f32,
}

/// Reveal amount of each fretboard layer. All ones means the fretboard can
/// be blitted from the sprite cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FretboardReveal {
    pub neck: f32,
    pub string_names: f32,
    pub strings: f32,
    pub frets: f32,
}

impl FretboardReveal {
    pub const FULL: FretboardReveal = FretboardReveal {
        neck: 1.0,
        string_names: 1.0,
        strings: 1.0,
        frets: 1.0,
    };

    pub fn is_complete(&self) -> bool {
        *self == Self::FULL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramFrame {
    /// Multiplier applied to every element, used to dim carousel neighbours.
    pub opacity: f32,
    pub labels: Vec<TextItem>,
    pub fretboard: FretboardReveal,
    /// True fret shown in the top row; 1 for an unshifted diagram.
    pub first_fret: u8,
    pub nut_opacity: f32,
    pub capo_bar_opacity: f32,
    pub markers: Vec<Marker>,
    pub avoided: Vec<AvoidedGlyph>,
    pub indicators: Vec<TextItem>,
}

impl DiagramFrame {
    /// The chord fully drawn and at rest.
    pub fn at_rest(chord: &PreparedChord, geometry: &DiagramGeometry) -> Self {
        let mut markers: Vec<Marker> = chord
            .loose_fingers()
            .into_iter()
            .map(|(key, placement)| finger_marker(key, placement, geometry, 1.0, 1.0))
            .collect();
        if let Some(barre) = &chord.barre {
            markers.push(barre_marker(barre, geometry));
        }

        let avoided = chord
            .avoided
            .iter()
            .map(|&string| avoided_glyph(string, geometry, 1.0, 1.0))
            .collect();

        let mut indicators = Vec::new();
        if let Some(text) = capo_text(chord) {
            indicators.push(text_item(TextRole::Capo, text, geometry, 1.0, 1.0));
        }
        if let Some(text) = position_text(chord) {
            indicators.push(text_item(TextRole::Position, text, geometry, 1.0, 1.0));
        }

        Self {
            opacity: 1.0,
            labels: vec![chord_label(chord.name(), geometry, 0.0, 1.0)],
            fretboard: FretboardReveal::FULL,
            first_fret: chord.display_offset.max(1),
            nut_opacity: presence(chord.shows_nut()),
            capo_bar_opacity: presence(chord.capo.is_some()),
            markers,
            avoided,
            indicators,
        }
        .finish()
    }

    /// The at-rest frame partially revealed by the build-in phases.
    pub fn build_in(chord: &PreparedChord, geometry: &DiagramGeometry, phases: &AnimationPhases) -> Self {
        let mut frame = Self::at_rest(chord, geometry);

        for label in &mut frame.labels {
            label.opacity *= phases.chord_name;
        }
        frame.fretboard = FretboardReveal {
            neck: phases.neck,
            string_names: phases.string_names,
            strings: phases.strings,
            frets: phases.frets,
        };
        frame.nut_opacity *= phases.nut;
        frame.capo_bar_opacity *= phases.nut;
        for marker in &mut frame.markers {
            marker.opacity *= phases.fingers;
            marker.scale *= phases.fingers;
        }
        for glyph in &mut frame.avoided {
            glyph.opacity *= phases.avoided;
            glyph.scale *= phases.avoided;
        }
        for indicator in &mut frame.indicators {
            indicator.opacity *= phases.position_indicator;
        }

        frame.finish()
    }

    /// Dims the whole frame.
    pub fn faded(mut self, opacity: f32) -> Self {
        self.opacity *= opacity.clamp(0.0, 1.0);
        self
    }

    /// Drops invisible elements and puts markers and glyphs in their
    /// canonical paint order.
    pub(crate) fn finish(mut self) -> Self {
        self.labels.retain(|label| label.opacity > 0.0);
        self.markers.retain(|marker| marker.opacity > 0.0 && marker.scale > 0.0);
        self.markers.sort_by_key(|marker| marker.key);
        self.avoided.retain(|glyph| glyph.opacity > 0.0 && glyph.scale > 0.0);
        self.avoided.sort_by_key(|glyph| glyph.string);
        self.indicators.retain(|indicator| indicator.opacity > 0.0);
        self
    }
}

pub(crate) fn presence(present: bool) -> f32 {
    if present {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn chord_label(name: &str, geometry: &DiagramGeometry, dy: f32, opacity: f32) -> TextItem {
    TextItem {
        role: TextRole::ChordName,
        text: name.to_string(),
        anchor: geometry.chord_name_anchor().offset(0.0, dy),
        size: geometry.label_font_size(),
        opacity,
        scale: 1.0,
    }
}

pub(crate) fn label_slide(geometry: &DiagramGeometry) -> f32 {
    LABEL_SLIDE * geometry.scale
}

pub(crate) fn text_item(
    role: TextRole,
    text: String,
    geometry: &DiagramGeometry,
    opacity: f32,
    scale: f32,
) -> TextItem {
    let (anchor, size) = match role {
        TextRole::ChordName => (geometry.chord_name_anchor(), geometry.label_font_size()),
        TextRole::Position => (geometry.position_anchor(), geometry.small_font_size()),
        TextRole::Capo => (geometry.capo_anchor(), geometry.small_font_size()),
    };
    TextItem {
        role,
        text,
        anchor,
        size,
        opacity,
        scale,
    }
}

pub(crate) fn position_text(chord: &PreparedChord) -> Option<String> {
    chord
        .is_transposed()
        .then(|| chord.display_offset.to_string())
}

pub(crate) fn capo_text(chord: &PreparedChord) -> Option<String> {
    chord.capo.map(|fret| format!("Capo {fret}"))
}

/// Bar covering strings `low..=high` (fractional while interpolating).
pub(crate) fn barre_box(fret: f32, low: f32, high: f32, geometry: &DiagramGeometry) -> MarkerBox {
    let left = geometry.string_x(high) - geometry.finger_radius;
    let right = geometry.string_x(low) + geometry.finger_radius;
    MarkerBox {
        center: Point::new((left + right) * 0.5, geometry.fret_y(fret)),
        half_width: (right - left) * 0.5,
        half_height: geometry.barre_width * 0.5,
    }
}

pub(crate) fn barre_info_box(barre: &BarreInfo, geometry: &DiagramGeometry) -> MarkerBox {
    barre_box(
        f32::from(barre.fret),
        f32::from(barre.low_string()),
        f32::from(barre.high_string()),
        geometry,
    )
}

pub(crate) fn placement_box(placement: &FingerPlacement, geometry: &DiagramGeometry) -> MarkerBox {
    match placement.end_string {
        Some(end) if placement.is_barre() => barre_box(
            f32::from(placement.fret),
            f32::from(placement.string.min(end)),
            f32::from(placement.string.max(end)),
            geometry,
        ),
        _ => MarkerBox::round(
            Point::new(
                geometry.map_string_to_x(placement.string),
                geometry.map_fret_to_y(placement.fret),
            ),
            geometry.finger_radius,
        ),
    }
}

pub(crate) fn placement_style(placement: &FingerPlacement) -> MarkerStyle {
    if placement.fret == 0 {
        MarkerStyle::Open
    } else {
        MarkerStyle::Filled
    }
}

pub(crate) fn finger_marker(
    key: FingerKey,
    placement: &FingerPlacement,
    geometry: &DiagramGeometry,
    opacity: f32,
    scale: f32,
) -> Marker {
    let style = placement_style(placement);
    Marker {
        key: MarkerKey::Finger(key),
        bounds: placement_box(placement, geometry),
        label: match style {
            MarkerStyle::Filled => placement.finger.map(|finger| finger.to_string()),
            MarkerStyle::Open => None,
        },
        style,
        opacity,
        scale,
    }
}

pub(crate) fn barre_marker(barre: &BarreInfo, geometry: &DiagramGeometry) -> Marker {
    Marker {
        key: MarkerKey::Barre,
        bounds: barre_info_box(barre, geometry),
        label: barre.finger.map(|finger| finger.to_string()),
        style: MarkerStyle::Filled,
        opacity: 1.0,
        scale: 1.0,
    }
}

pub(crate) fn avoided_glyph(string: u8, geometry: &DiagramGeometry, opacity: f32, scale: f32) -> AvoidedGlyph {
    AvoidedGlyph {
        string,
        center: Point::new(geometry.map_string_to_x(string), geometry.map_fret_to_y(0)),
        half_size: geometry.finger_radius * 0.7,
        opacity,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::phases_for,
        chord::{ChordShape, Finger},
        geometry::recalculate,
        FretboardConfig,
    };

    fn prepare(shape: ChordShape) -> (PreparedChord, DiagramGeometry) {
        let config = FretboardConfig::default();
        (PreparedChord::prepare(&shape, &config, None), recalculate(&config))
    }

    #[test]
    fn single_finger_sits_on_its_string_and_fret() {
        let (chord, geometry) = prepare(
            ChordShape::new("X").with_placement(FingerPlacement::new(2, 3, Some(Finger::Number(2)))),
        );
        let frame = DiagramFrame::at_rest(&chord, &geometry);

        assert_eq!(frame.markers.len(), 1);
        let marker = &frame.markers[0];
        assert_eq!(marker.bounds.center.x, geometry.map_string_to_x(2));
        assert_eq!(marker.bounds.center.y, geometry.map_fret_to_y(3));
        assert!(marker.bounds.is_round());
        assert_eq!(marker.label.as_deref(), Some("2"));
        assert_eq!(frame.nut_opacity, 1.0);
        assert!(frame.indicators.is_empty());
    }

    #[test]
    fn barre_spans_outer_strings_plus_a_radius() {
        let (chord, geometry) = prepare(
            ChordShape::new("F").with_placement(FingerPlacement::barre(1, Some(Finger::Number(1)), 1, 6)),
        );
        let frame = DiagramFrame::at_rest(&chord, &geometry);
        let rect = frame.markers[0].bounds.rect(1.0);

        assert_eq!(frame.markers[0].key, MarkerKey::Barre);
        assert!((rect.x - (geometry.map_string_to_x(6) - geometry.finger_radius)).abs() < 1e-3);
        assert!((rect.right() - (geometry.map_string_to_x(1) + geometry.finger_radius)).abs() < 1e-3);
        assert!((rect.height - geometry.barre_width).abs() < 1e-3);
    }

    #[test]
    fn transposed_shapes_hide_the_nut_and_show_the_position() {
        let (chord, geometry) = prepare(
            ChordShape::new("high")
                .with_placement(FingerPlacement::new(2, 12, Some(Finger::Number(2))))
                .with_placement(FingerPlacement::new(3, 11, Some(Finger::Number(1)))),
        );
        let frame = DiagramFrame::at_rest(&chord, &geometry);

        assert_eq!(frame.nut_opacity, 0.0);
        assert_eq!(frame.indicators.len(), 1);
        assert_eq!(frame.indicators[0].text, "11");
    }

    #[test]
    fn capo_and_offset_combine() {
        let mut shape = ChordShape::new("capo")
            .with_placement(FingerPlacement::new(2, 7, Some(Finger::Number(1))))
            .with_placement(FingerPlacement::new(3, 8, Some(Finger::Number(2))));
        shape.capo = Some(2);
        let (chord, geometry) = prepare(shape);
        let frame = DiagramFrame::at_rest(&chord, &geometry);

        let texts: Vec<&str> = frame.indicators.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Capo 2", "7"]);
        assert_eq!(frame.capo_bar_opacity, 1.0);
        assert_eq!(frame.nut_opacity, 0.0);
    }

    #[test]
    fn build_in_starts_empty_and_ends_at_rest() {
        let (chord, geometry) = prepare(
            ChordShape::new("E")
                .with_placement(FingerPlacement::new(3, 1, Some(Finger::Number(1))))
                .with_avoided(6),
        );
        let empty = DiagramFrame::build_in(&chord, &geometry, &phases_for(0.0));
        assert!(empty.labels.is_empty());
        assert!(empty.markers.is_empty());
        assert!(empty.avoided.is_empty());
        assert_eq!(empty.fretboard.neck, 0.0);

        let full = DiagramFrame::build_in(&chord, &geometry, &phases_for(1.0));
        assert_eq!(full, DiagramFrame::at_rest(&chord, &geometry));
    }
}
