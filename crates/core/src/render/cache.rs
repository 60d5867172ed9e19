use std::{
    collections::{hash_map::DefaultHasher, BTreeMap},
    hash::{Hash, Hasher},
};

use super::{
    fretboard::draw_fretboard,
    frame::FretboardReveal,
    surface::{RecordingSurface, Sprite},
};
use crate::{geometry::DiagramGeometry, FretboardConfig};

/// Holds the baked fretboard sprites for the current config, one per
/// first fret shown (inlays depend on it).
///
/// Sprites are drawn in local coordinates with the fretboard's top-left
/// corner at the origin, so horizontal offsets (carousel neighbours) reuse
/// them unchanged. Any change to a sprite-affecting config field drops them
/// all.
#[derive(Debug, Default)]
pub struct FretboardCache {
    config_key: Option<u64>,
    sprites: BTreeMap<u8, Sprite>,
    bakes: u64,
}

impl FretboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sprite for `config` with `first_fret` in the top row, baking it
    /// first if needed. Returns `None` when the layout has no drawable area;
    /// callers then draw directly.
    pub fn sprite(
        &mut self,
        config: &FretboardConfig,
        geometry: &DiagramGeometry,
        first_fret: u8,
    ) -> Option<&Sprite> {
        let config_key = config.sprite_key();
        if self.config_key != Some(config_key) {
            self.sprites.clear();
            self.config_key = Some(config_key);
        }
        // Without inlays every window looks the same.
        let first_fret = if config.show_inlays { first_fret.max(1) } else { 1 };

        if !self.sprites.contains_key(&first_fret) {
            let key = window_key(config_key, first_fret);
            let Some(sprite) = bake(key, config, geometry, first_fret) else {
                tracing::debug!(key, "fretboard not drawable; using direct draw");
                return None;
            };
            self.bakes += 1;
            tracing::debug!(key, first_fret, bakes = self.bakes, "baked fretboard sprite");
            self.sprites.insert(first_fret, sprite);
        }
        self.sprites.get(&first_fret)
    }

    pub fn invalidate(&mut self) {
        self.sprites.clear();
        self.config_key = None;
    }

    /// Drops the backing sprites. The next draw re-bakes on demand.
    pub fn release(&mut self) {
        if !self.sprites.is_empty() {
            tracing::debug!(sprites = self.sprites.len(), "released fretboard sprites");
        }
        self.invalidate();
    }

    pub fn is_warm(&self) -> bool {
        !self.sprites.is_empty()
    }

    /// Number of times a sprite has been baked.
    pub fn bake_count(&self) -> u64 {
        self.bakes
    }
}

fn window_key(config_key: u64, first_fret: u8) -> u64 {
    let mut hasher = DefaultHasher::new();
    config_key.hash(&mut hasher);
    first_fret.hash(&mut hasher);
    hasher.finish()
}

fn bake(
    key: u64,
    config: &FretboardConfig,
    geometry: &DiagramGeometry,
    first_fret: u8,
) -> Option<Sprite> {
    let bounds = geometry.fretboard;
    if !bounds.is_drawable() {
        return None;
    }
    let local = geometry.translated(-bounds.x, -bounds.y);
    let mut recorder = RecordingSurface::new();
    draw_fretboard(&mut recorder, config, &local, &FretboardReveal::FULL, first_fret, 1.0);
    Some(Sprite {
        key,
        width: bounds.width,
        height: bounds.height,
        commands: recorder.into_commands(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Theme, geometry::recalculate, Color};

    #[test]
    fn bakes_once_per_key() {
        let config = FretboardConfig::default();
        let geometry = recalculate(&config);
        let mut cache = FretboardCache::new();

        assert!(cache.sprite(&config, &geometry, 1).is_some());
        assert!(cache.sprite(&config, &geometry.apply_offset(120.0), 1).is_some());
        assert_eq!(cache.bake_count(), 1);

        let themed = FretboardConfig {
            theme: Theme {
                neck: Color::rgb(1, 2, 3),
                ..Theme::default()
            },
            ..config.clone()
        };
        assert!(cache.sprite(&themed, &geometry, 1).is_some());
        assert_eq!(cache.bake_count(), 2);
    }

    #[test]
    fn sprite_is_local_to_the_fretboard() {
        let config = FretboardConfig::default();
        let geometry = recalculate(&config);
        let mut cache = FretboardCache::new();
        let sprite = cache.sprite(&config, &geometry, 1).cloned();
        let sprite = sprite.expect("sprite");

        assert_eq!(sprite.width, geometry.fretboard.width);
        assert_eq!(sprite.height, geometry.fretboard.height);
        for command in &sprite.commands {
            if let super::super::surface::DrawCommand::Line { from, .. } = command {
                assert!(from.x >= 0.0 && from.x <= sprite.width);
                assert!(from.y >= 0.0 && from.y <= sprite.height);
            }
        }
    }

    #[test]
    fn undrawable_layout_has_no_sprite() {
        let config = FretboardConfig {
            canvas_width: 0.0,
            ..FretboardConfig::default()
        };
        let mut geometry = recalculate(&config);
        geometry.fretboard.width = 0.0;
        let mut cache = FretboardCache::new();
        assert!(cache.sprite(&config, &geometry, 1).is_none());
        assert!(!cache.is_warm());
    }

    #[test]
    fn transposed_windows_get_their_own_sprite() {
        let config = FretboardConfig::default();
        let geometry = recalculate(&config);
        let mut cache = FretboardCache::new();

        let open = cache.sprite(&config, &geometry, 1).cloned().expect("open sprite");
        let high = cache.sprite(&config, &geometry, 11).cloned().expect("high sprite");
        assert_ne!(open.key, high.key);
        assert_ne!(open.commands, high.commands);
        assert!(cache.sprite(&config, &geometry, 1).is_some());
        assert_eq!(cache.bake_count(), 2);

        let plain = FretboardConfig {
            show_inlays: false,
            ..config
        };
        cache.sprite(&plain, &geometry, 1);
        cache.sprite(&plain, &geometry, 11);
        assert_eq!(cache.bake_count(), 3);
    }

    #[test]
    fn release_drops_the_sprite() {
        let config = FretboardConfig::default();
        let geometry = recalculate(&config);
        let mut cache = FretboardCache::new();
        cache.sprite(&config, &geometry, 1);
        assert!(cache.is_warm());
        cache.release();
        assert!(!cache.is_warm());
    }
}
