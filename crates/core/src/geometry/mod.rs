//! Layout model for a single chord diagram.
//!
//! [`recalculate`] is a pure function of [`FretboardConfig`]; rotation and
//! mirroring are not baked into the result but applied as a transform at
//! draw time via [`DiagramGeometry::transform`].

mod primitives;

pub use primitives::{lerp, Affine, Point, Rect};

use crate::{config::GeometryKey, FretboardConfig};

const BASE_DIAGRAM_WIDTH: f32 = 200.0;
/// Extra 40% of height for the headstock band and chord name.
const DIAGRAM_ASPECT: f32 = 1.4;
const BASE_PADDING: f32 = 20.0;
const BASE_HEADER_HEIGHT: f32 = 60.0;
const BASE_NECK_RADIUS: f32 = 6.0;
const FINGER_TO_FRET_RATIO: f32 = 0.35;
const FINGER_TO_STRING_RATIO: f32 = 0.45;

/// Pixel-space layout derived from a [`FretboardConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramGeometry {
    pub diagram: Rect,
    pub fretboard: Rect,
    pub padding: f32,
    pub header_height: f32,
    pub string_spacing: f32,
    pub fret_spacing: f32,
    pub neck_radius: f32,
    pub finger_radius: f32,
    /// Thickness of a barre bar.
    pub barre_width: f32,
    pub scale: f32,
    pub string_count: u8,
    pub fret_count: u8,
}

/// Computes the layout for `config`. Identical configs give bit-identical
/// results.
pub fn recalculate(config: &FretboardConfig) -> DiagramGeometry {
    let scale = config.effective_scale();
    let width = BASE_DIAGRAM_WIDTH * scale;
    let height = width * DIAGRAM_ASPECT;
    let diagram = Rect::new(
        (config.canvas_width - width) * 0.5,
        (config.canvas_height - height) * 0.5,
        width,
        height,
    );

    let padding = BASE_PADDING * scale;
    let header_height = BASE_HEADER_HEIGHT * scale;
    let fretboard = Rect::new(
        diagram.x,
        diagram.y + header_height,
        width,
        height - header_height,
    );

    let fret_spacing = fretboard.height / (f32::from(config.fret_count) + 1.0);
    let string_spacing = if config.string_count <= 1 {
        0.0
    } else {
        (width - 2.0 * padding) / f32::from(config.string_count - 1)
    };

    let mut finger_radius = fret_spacing * FINGER_TO_FRET_RATIO;
    if string_spacing > 0.0 {
        finger_radius = finger_radius.min(string_spacing * FINGER_TO_STRING_RATIO);
    }

    DiagramGeometry {
        diagram,
        fretboard,
        padding,
        header_height,
        string_spacing,
        fret_spacing,
        neck_radius: BASE_NECK_RADIUS * scale,
        finger_radius,
        barre_width: finger_radius * 2.0,
        scale,
        string_count: config.string_count,
        fret_count: config.fret_count,
    }
}

impl DiagramGeometry {
    /// Moves the whole diagram horizontally, leaving vertical layout alone.
    pub fn apply_offset(&self, offset_x: f32) -> Self {
        self.translated(offset_x, 0.0)
    }

    pub(crate) fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            diagram: self.diagram.translate(dx, dy),
            fretboard: self.fretboard.translate(dx, dy),
            ..*self
        }
    }

    /// X of a 1-based string. String 1 is drawn rightmost.
    pub fn map_string_to_x(&self, string_number: u8) -> f32 {
        self.string_x(f32::from(string_number))
    }

    /// Fractional variant used while interpolating barre ends.
    pub fn string_x(&self, string_number: f32) -> f32 {
        let visual_index = f32::from(self.string_count) - string_number;
        self.fretboard.x + self.padding + visual_index * self.string_spacing
    }

    /// Y at the middle of a fret cell; fret 0 is the open-string row above
    /// the nut.
    pub fn map_fret_to_y(&self, fret: u8) -> f32 {
        self.fret_y(f32::from(fret))
    }

    pub fn fret_y(&self, fret: f32) -> f32 {
        self.fretboard.y + (fret - 0.5) * self.fret_spacing
    }

    /// Y of the `index`-th fret wire; index 0 is the nut.
    pub fn fret_line_y(&self, index: u8) -> f32 {
        self.fretboard.y + f32::from(index) * self.fret_spacing
    }

    /// Bottom end of the strings, at the last fret wire.
    pub fn strings_bottom(&self) -> f32 {
        self.fret_line_y(self.fret_count)
    }

    /// Baseline row for the string names under the last fret.
    pub fn string_name_y(&self) -> f32 {
        self.fret_y(f32::from(self.fret_count) + 1.0)
    }

    pub fn leftmost_string_x(&self) -> f32 {
        self.map_string_to_x(self.string_count)
    }

    pub fn rightmost_string_x(&self) -> f32 {
        self.map_string_to_x(1)
    }

    pub fn chord_name_anchor(&self) -> Point {
        Point::new(
            self.diagram.center().x,
            self.diagram.y + self.header_height * 0.45,
        )
    }

    /// Right edge of the starting-fret numeral, left of the first fret row.
    pub fn position_anchor(&self) -> Point {
        Point::new(self.fretboard.x + self.padding * 0.3, self.map_fret_to_y(1))
    }

    /// Right edge of the capo caption, above the open-string row.
    pub fn capo_anchor(&self) -> Point {
        Point::new(
            self.fretboard.right(),
            self.fret_line_y(0) - self.fret_spacing * 1.1,
        )
    }

    pub fn label_font_size(&self) -> f32 {
        22.0 * self.scale
    }

    pub fn small_font_size(&self) -> f32 {
        12.0 * self.scale
    }

    /// Rotation and mirroring around the diagram centre.
    pub fn transform(&self, config: &FretboardConfig) -> Affine {
        let center = self.diagram.center();
        let mut transform = Affine::translate(-center.x, -center.y)
            .then(Affine::rotate_degrees(config.rotation_degrees));
        if config.mirrored {
            transform = transform.then(Affine::scale(-1.0, 1.0));
        }
        transform.then(Affine::translate(center.x, center.y))
    }
}

/// Holds the most recent geometry and recomputes it only when a
/// geometry-affecting field of the config changes.
#[derive(Debug, Default, Clone)]
pub struct GeometryCache {
    cached: Option<(GeometryKey, DiagramGeometry)>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, config: &FretboardConfig) -> DiagramGeometry {
        let key = config.geometry_key();
        match self.cached {
            Some((cached_key, geometry)) if cached_key == key => geometry,
            _ => {
                let geometry = recalculate(config);
                tracing::debug!(?key, "recalculated diagram geometry");
                self.cached = Some((key, geometry));
                geometry
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
