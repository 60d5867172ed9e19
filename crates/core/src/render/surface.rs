use crate::{
    geometry::{Affine, Point, Rect},
    Color,
};

/// Colour plus an opacity multiplier on top of the colour's own alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub opacity: f32,
}

impl Paint {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            opacity: self.opacity * opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Final alpha combining the colour channel and the multiplier.
    pub fn alpha(&self) -> f32 {
        self.color.alpha() * self.opacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A drawing operation, as recorded by [`RecordingSurface`] or stored in a
/// [`Sprite`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    RoundedRect {
        rect: Rect,
        radius: f32,
        paint: Paint,
    },
    Circle {
        center: Point,
        radius: f32,
        paint: Paint,
    },
    Ring {
        center: Point,
        radius: f32,
        width: f32,
        paint: Paint,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        paint: Paint,
    },
    Text {
        text: String,
        anchor: Point,
        size: f32,
        align: TextAlign,
        paint: Paint,
    },
    PushTransform(Affine),
    PopTransform,
    Blit {
        sprite: u64,
        origin: Point,
        opacity: f32,
    },
}

/// Drawing capability the renderer depends on.
///
/// Coordinates are in pixels; transforms pushed with
/// [`Surface::push_transform`] apply to everything until the matching pop.
pub trait Surface {
    fn rounded_rect(&mut self, rect: Rect, radius: f32, paint: Paint);

    fn circle(&mut self, center: Point, radius: f32, paint: Paint);

    fn ring(&mut self, center: Point, radius: f32, width: f32, paint: Paint);

    fn line(&mut self, from: Point, to: Point, width: f32, paint: Paint);

    fn text(&mut self, text: &str, anchor: Point, size: f32, align: TextAlign, paint: Paint);

    fn push_transform(&mut self, transform: Affine);

    fn pop_transform(&mut self);

    /// Whether [`Surface::blit`] is backed by an offscreen buffer. When it is
    /// not, the renderer draws the fretboard directly every frame.
    fn supports_sprites(&self) -> bool {
        false
    }

    /// Paints a sprite with its local origin placed at `origin`.
    fn blit(&mut self, sprite: &Sprite, origin: Point, opacity: f32) {
        sprite.replay(self, origin, opacity);
    }
}

/// Pre-recorded drawing in local `(0, 0)` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub key: u64,
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl Sprite {
    /// Re-issues the recorded commands onto `surface`, translated to
    /// `origin` and faded by `opacity`.
    pub fn replay<S: Surface + ?Sized>(&self, surface: &mut S, origin: Point, opacity: f32) {
        surface.push_transform(Affine::translate(origin.x, origin.y));
        for command in &self.commands {
            command.issue(surface, opacity);
        }
        surface.pop_transform();
    }
}

impl DrawCommand {
    fn issue<S: Surface + ?Sized>(&self, surface: &mut S, opacity: f32) {
        match self {
            Self::RoundedRect { rect, radius, paint } => {
                surface.rounded_rect(*rect, *radius, paint.with_opacity(opacity))
            }
            Self::Circle {
                center,
                radius,
                paint,
            } => surface.circle(*center, *radius, paint.with_opacity(opacity)),
            Self::Ring {
                center,
                radius,
                width,
                paint,
            } => surface.ring(*center, *radius, *width, paint.with_opacity(opacity)),
            Self::Line {
                from,
                to,
                width,
                paint,
            } => surface.line(*from, *to, *width, paint.with_opacity(opacity)),
            Self::Text {
                text,
                anchor,
                size,
                align,
                paint,
            } => surface.text(text, *anchor, *size, *align, paint.with_opacity(opacity)),
            Self::PushTransform(transform) => surface.push_transform(*transform),
            Self::PopTransform => surface.pop_transform(),
            // Sprites are flat; nested blits are never recorded into one.
            Self::Blit { .. } => {}
        }
    }
}

/// Headless surface that records every call, for sprite baking and for
/// geometry assertions in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    sprites: bool,
}

impl RecordingSurface {
    /// A recorder that reports sprite support and records blits as single
    /// commands.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            sprites: true,
        }
    }

    /// A recorder without offscreen support.
    pub fn without_sprites() -> Self {
        Self {
            commands: Vec::new(),
            sprites: false,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn circles(&self) -> impl Iterator<Item = (Point, f32)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Circle { center, radius, .. } => Some((*center, *radius)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn rounded_rect(&mut self, rect: Rect, radius: f32, paint: Paint) {
        self.commands
            .push(DrawCommand::RoundedRect { rect, radius, paint });
    }

    fn circle(&mut self, center: Point, radius: f32, paint: Paint) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            paint,
        });
    }

    fn ring(&mut self, center: Point, radius: f32, width: f32, paint: Paint) {
        self.commands.push(DrawCommand::Ring {
            center,
            radius,
            width,
            paint,
        });
    }

    fn line(&mut self, from: Point, to: Point, width: f32, paint: Paint) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            paint,
        });
    }

    fn text(&mut self, text: &str, anchor: Point, size: f32, align: TextAlign, paint: Paint) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            anchor,
            size,
            align,
            paint,
        });
    }

    fn push_transform(&mut self, transform: Affine) {
        self.commands.push(DrawCommand::PushTransform(transform));
    }

    fn pop_transform(&mut self) {
        self.commands.push(DrawCommand::PopTransform);
    }

    fn supports_sprites(&self) -> bool {
        self.sprites
    }

    fn blit(&mut self, sprite: &Sprite, origin: Point, opacity: f32) {
        if self.sprites {
            self.commands.push(DrawCommand::Blit {
                sprite: sprite.key,
                origin,
                opacity,
            });
        } else {
            sprite.replay(self, origin, opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_translates_and_fades() {
        let sprite = Sprite {
            key: 7,
            width: 10.0,
            height: 10.0,
            commands: vec![DrawCommand::Circle {
                center: Point::new(1.0, 2.0),
                radius: 3.0,
                paint: Paint::new(Color::rgb(0, 0, 0)).with_opacity(0.5),
            }],
        };

        let mut surface = RecordingSurface::without_sprites();
        surface.blit(&sprite, Point::new(100.0, 50.0), 0.5);

        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::PushTransform(Affine::translate(100.0, 50.0)),
                DrawCommand::Circle {
                    center: Point::new(1.0, 2.0),
                    radius: 3.0,
                    paint: Paint::new(Color::rgb(0, 0, 0)).with_opacity(0.25),
                },
                DrawCommand::PopTransform,
            ]
        );
    }

    #[test]
    fn sprite_capable_recorder_keeps_blits_whole() {
        let sprite = Sprite {
            key: 42,
            width: 1.0,
            height: 1.0,
            commands: Vec::new(),
        };
        let mut surface = RecordingSurface::new();
        surface.blit(&sprite, Point::new(3.0, 4.0), 1.0);
        assert!(matches!(
            surface.commands(),
            [DrawCommand::Blit { sprite: 42, .. }]
        ));
    }

    #[test]
    fn paint_alpha_combines_channel_and_multiplier() {
        let paint = Paint::new(Color::rgba(0, 0, 0, 51)).with_opacity(0.5);
        assert!((paint.alpha() - 0.1).abs() < 1e-6);
    }
}
