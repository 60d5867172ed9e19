//! Static fretboard layers: neck, inlays, fret wires, strings and string
//! names. These are what the sprite cache bakes; the nut and capo bar vary
//! per chord and are painted separately.

use super::{
    frame::FretboardReveal,
    surface::{Paint, Surface, TextAlign},
};
use crate::{
    geometry::{DiagramGeometry, Point, Rect},
    FretboardConfig,
};

const SINGLE_INLAYS: [u8; 4] = [3, 5, 7, 9];
const DOUBLE_INLAY: u8 = 12;

/// Capo bar extent above the nut line, in fret spacings. Stays below the
/// open-string row, whose markers reach at most 0.26 spacings past it.
const CAPO_BAR_TOP: f32 = 0.2;
const CAPO_BAR_HEIGHT: f32 = 0.15;

/// Draws the fretboard layers. `first_fret` is the true fret shown in the
/// top row, so inlays land where they sit on the neck.
pub(crate) fn draw_fretboard<S: Surface + ?Sized>(
    surface: &mut S,
    config: &FretboardConfig,
    geometry: &DiagramGeometry,
    reveal: &FretboardReveal,
    first_fret: u8,
    opacity: f32,
) {
    let theme = &config.theme;
    let top = geometry.fret_line_y(0);
    let length = geometry.strings_bottom() - top;
    let left = geometry.leftmost_string_x();
    let span = geometry.rightmost_string_x() - left;

    if reveal.neck > 0.0 {
        let margin = geometry.padding * 0.5;
        let neck = Rect::new(
            geometry.fretboard.x + margin,
            top,
            geometry.fretboard.width - 2.0 * margin,
            length * reveal.neck,
        );
        surface.rounded_rect(
            neck,
            geometry.neck_radius,
            Paint::new(theme.neck).with_opacity(opacity),
        );
        if config.show_inlays {
            draw_inlays(surface, config, geometry, first_fret, reveal.neck * opacity);
        }
    }

    if reveal.frets > 0.0 {
        let paint = Paint::new(theme.fret).with_opacity(opacity);
        for index in 1..=geometry.fret_count {
            let y = geometry.fret_line_y(index);
            surface.line(
                Point::new(left, y),
                Point::new(left + span * reveal.frets, y),
                1.5 * geometry.scale,
                paint,
            );
        }
    }

    if reveal.strings > 0.0 {
        let paint = Paint::new(theme.string).with_opacity(opacity);
        for string in 1..=geometry.string_count {
            let x = geometry.map_string_to_x(string);
            // Wound strings read heavier.
            let width = (1.0 + 0.25 * f32::from(string - 1)) * geometry.scale;
            surface.line(
                Point::new(x, top),
                Point::new(x, top + length * reveal.strings),
                width,
                paint,
            );
        }
    }

    if reveal.string_names > 0.0 {
        let paint = Paint::new(theme.string_name).with_opacity(reveal.string_names * opacity);
        let y = geometry.string_name_y();
        for string in 1..=geometry.string_count {
            if let Some(name) = config.string_name(string) {
                surface.text(
                    name,
                    Point::new(geometry.map_string_to_x(string), y),
                    geometry.small_font_size(),
                    TextAlign::Center,
                    paint,
                );
            }
        }
    }
}

/// Inlay pattern of a true fret number, repeating every octave.
pub(crate) fn inlay_dots(fret: u16) -> u8 {
    if fret == 0 {
        return 0;
    }
    let within = ((fret - 1) % 12 + 1) as u8;
    if SINGLE_INLAYS.contains(&within) {
        1
    } else if within == DOUBLE_INLAY {
        2
    } else {
        0
    }
}

fn draw_inlays<S: Surface + ?Sized>(
    surface: &mut S,
    config: &FretboardConfig,
    geometry: &DiagramGeometry,
    first_fret: u8,
    opacity: f32,
) {
    let paint = Paint::new(config.theme.inlay).with_opacity(opacity);
    let radius = geometry.finger_radius * 0.35;
    let center_x = (geometry.leftmost_string_x() + geometry.rightmost_string_x()) * 0.5;
    let quarter = (geometry.rightmost_string_x() - geometry.leftmost_string_x()) * 0.25;

    for row in 1..=geometry.fret_count {
        let y = geometry.map_fret_to_y(row);
        let fret = u16::from(row) + u16::from(first_fret.max(1)) - 1;
        match inlay_dots(fret) {
            1 => surface.circle(Point::new(center_x, y), radius, paint),
            2 => {
                surface.circle(Point::new(center_x - quarter, y), radius, paint);
                surface.circle(Point::new(center_x + quarter, y), radius, paint);
            }
            _ => {}
        }
    }
}

/// Thick bar at the top of the first fret, shown for open positions.
pub(crate) fn draw_nut<S: Surface + ?Sized>(
    surface: &mut S,
    config: &FretboardConfig,
    geometry: &DiagramGeometry,
    opacity: f32,
) {
    let thickness = 5.0 * geometry.scale;
    let overhang = 2.0 * geometry.scale;
    let left = geometry.leftmost_string_x() - overhang;
    let right = geometry.rightmost_string_x() + overhang;
    let rect = Rect::new(
        left,
        geometry.fret_line_y(0) - thickness,
        right - left,
        thickness,
    );
    surface.rounded_rect(
        rect,
        thickness * 0.3,
        Paint::new(config.theme.nut).with_opacity(opacity),
    );
}

/// Clamp drawn across every string just above the nut line.
pub(crate) fn draw_capo_bar<S: Surface + ?Sized>(
    surface: &mut S,
    config: &FretboardConfig,
    geometry: &DiagramGeometry,
    opacity: f32,
) {
    let height = geometry.fret_spacing * CAPO_BAR_HEIGHT;
    let overhang = geometry.finger_radius * 0.6;
    let left = geometry.leftmost_string_x() - overhang;
    let right = geometry.rightmost_string_x() + overhang;
    let rect = Rect::new(
        left,
        geometry.fret_line_y(0) - geometry.fret_spacing * CAPO_BAR_TOP,
        right - left,
        height,
    );
    surface.rounded_rect(
        rect,
        height * 0.5,
        Paint::new(config.theme.capo).with_opacity(opacity),
    );
}
