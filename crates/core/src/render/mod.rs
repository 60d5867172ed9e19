//! Rendering backend abstraction.
//!
//! [`DiagramRenderer`] paints a [`DiagramFrame`] onto any [`Surface`]. The
//! static fretboard is baked once into a sprite and blitted while the chord
//! is fully built; during the build-in reveal, or on surfaces without
//! offscreen support, it is drawn directly.

mod cache;
pub mod frame;
mod fretboard;
mod surface;
mod svg;

pub use cache::FretboardCache;
pub use frame::{
    AvoidedGlyph, DiagramFrame, FretboardReveal, Marker, MarkerBox, MarkerKey, MarkerStyle,
    TextItem, TextRole,
};
pub use surface::{DrawCommand, Paint, RecordingSurface, Sprite, Surface, TextAlign};
pub use svg::SvgSurface;

use crate::{
    chord::PreparedChord,
    geometry::{DiagramGeometry, Point},
    FretboardConfig,
};
use fretboard::{draw_capo_bar, draw_fretboard, draw_nut};

/// Paints diagram frames and owns the fretboard sprite cache.
#[derive(Debug)]
pub struct DiagramRenderer {
    cache: FretboardCache,
    use_cache: bool,
}

impl Default for DiagramRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer {
    pub fn new() -> Self {
        Self {
            cache: FretboardCache::new(),
            use_cache: true,
        }
    }

    /// A renderer that never bakes sprites.
    pub fn uncached() -> Self {
        Self {
            cache: FretboardCache::new(),
            use_cache: false,
        }
    }

    pub fn cache(&self) -> &FretboardCache {
        &self.cache
    }

    /// Draws `chord` fully built and at rest.
    pub fn draw_static<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        config: &FretboardConfig,
        geometry: &DiagramGeometry,
        chord: &PreparedChord,
    ) {
        let frame = DiagramFrame::at_rest(chord, geometry);
        self.draw_frame(surface, config, geometry, &frame);
    }

    /// Paints one frame in the fixed layer order: chord name, fretboard, nut
    /// and capo bar, markers, avoided-string glyphs, then indicators.
    pub fn draw_frame<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        config: &FretboardConfig,
        geometry: &DiagramGeometry,
        frame: &DiagramFrame,
    ) {
        let alpha = frame.opacity;
        if alpha <= 0.0 {
            return;
        }

        let transform = geometry.transform(config);
        let transformed = !transform.is_identity();
        if transformed {
            surface.push_transform(transform);
        }

        for label in &frame.labels {
            draw_text(surface, config, label, alpha);
        }

        self.draw_fretboard_layer(surface, config, geometry, frame, alpha);

        if frame.nut_opacity > 0.0 {
            draw_nut(surface, config, geometry, frame.nut_opacity * alpha);
        }
        if frame.capo_bar_opacity > 0.0 {
            draw_capo_bar(surface, config, geometry, frame.capo_bar_opacity * alpha);
        }

        for marker in &frame.markers {
            draw_marker(surface, config, geometry, marker, alpha);
        }

        let glyph_paint = Paint::new(config.theme.avoided);
        for glyph in &frame.avoided {
            let half = glyph.half_size * glyph.scale;
            let c = glyph.center;
            let paint = glyph_paint.with_opacity(glyph.opacity * alpha);
            let width = 2.0 * geometry.scale;
            surface.line(c.offset(-half, -half), c.offset(half, half), width, paint);
            surface.line(c.offset(-half, half), c.offset(half, -half), width, paint);
        }

        for indicator in &frame.indicators {
            draw_text(surface, config, indicator, alpha);
        }

        if transformed {
            surface.pop_transform();
        }
    }

    fn draw_fretboard_layer<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        config: &FretboardConfig,
        geometry: &DiagramGeometry,
        frame: &DiagramFrame,
        alpha: f32,
    ) {
        let reveal = &frame.fretboard;
        if self.use_cache && reveal.is_complete() && surface.supports_sprites() {
            if let Some(sprite) = self.cache.sprite(config, geometry, frame.first_fret) {
                let origin = Point::new(geometry.fretboard.x, geometry.fretboard.y);
                surface.blit(sprite, origin, alpha);
                return;
            }
        }
        draw_fretboard(surface, config, geometry, reveal, frame.first_fret, alpha);
    }

    /// Releases the cached sprite.
    pub fn dispose(&mut self) {
        self.cache.release();
    }
}

fn draw_text<S: Surface + ?Sized>(
    surface: &mut S,
    config: &FretboardConfig,
    item: &TextItem,
    alpha: f32,
) {
    let (color, align) = match item.role {
        TextRole::ChordName => (config.theme.label, TextAlign::Center),
        TextRole::Position => (config.theme.indicator, TextAlign::Right),
        TextRole::Capo => (config.theme.capo, TextAlign::Right),
    };
    surface.text(
        &item.text,
        item.anchor,
        item.size * item.scale,
        align,
        Paint::new(color).with_opacity(item.opacity * alpha),
    );
}

fn draw_marker<S: Surface + ?Sized>(
    surface: &mut S,
    config: &FretboardConfig,
    geometry: &DiagramGeometry,
    marker: &Marker,
    alpha: f32,
) {
    let theme = &config.theme;
    let opacity = marker.opacity * alpha;
    let bounds = &marker.bounds;

    match marker.style {
        MarkerStyle::Open => {
            surface.ring(
                bounds.center,
                bounds.half_width * marker.scale * 0.75,
                2.0 * geometry.scale,
                Paint::new(theme.open_string).with_opacity(opacity),
            );
            return;
        }
        MarkerStyle::Filled if bounds.is_round() => {
            let color = match marker.key {
                MarkerKey::Barre => theme.barre,
                MarkerKey::Finger(_) => theme.finger,
            };
            surface.circle(
                bounds.center,
                bounds.half_width * marker.scale,
                Paint::new(color).with_opacity(opacity),
            );
        }
        MarkerStyle::Filled => {
            let radius = bounds.half_width.min(bounds.half_height) * marker.scale;
            surface.rounded_rect(
                bounds.rect(marker.scale),
                radius,
                Paint::new(theme.barre).with_opacity(opacity),
            );
        }
    }

    if let Some(label) = &marker.label {
        surface.text(
            label,
            bounds.center,
            bounds.half_height * 1.1 * marker.scale,
            TextAlign::Center,
            Paint::new(theme.finger_text).with_opacity(opacity),
        );
    }
}
