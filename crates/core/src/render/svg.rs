use std::{collections::BTreeMap, fmt::Write};

use super::surface::{Paint, Sprite, Surface, TextAlign};
use crate::{
    geometry::{Affine, Point, Rect},
    Color,
};

/// Vector backend producing a standalone SVG document. Sprites become
/// `<defs>` groups referenced with `<use>`, so the fretboard is written once
/// per file however many diagrams show it.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f32,
    height: f32,
    background: Option<Color>,
    body: String,
    defs: BTreeMap<u64, String>,
}

impl SvgSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: None,
            body: String::new(),
            defs: BTreeMap::new(),
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Closes the document and returns its text.
    pub fn finish(self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(self.width),
            h = num(self.height),
        );
        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for (key, content) in &self.defs {
                let _ = writeln!(out, r#"<g id="{}">"#, sprite_id(*key));
                out.push_str(content);
                out.push_str("</g>\n");
            }
            out.push_str("</defs>\n");
        }
        if let Some(color) = self.background {
            let _ = writeln!(
                out,
                r#"<rect width="100%" height="100%" {}/>"#,
                fill(Paint::new(color))
            );
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

fn sprite_id(key: u64) -> String {
    format!("fretboard-{key:016x}")
}

fn num(value: f32) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn fill(paint: Paint) -> String {
    format!(r#"fill="{}" fill-opacity="{}""#, hex(paint.color), num(paint.alpha()))
}

fn stroke(paint: Paint, width: f32) -> String {
    format!(
        r#"fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
        hex(paint.color),
        num(paint.alpha()),
        num(width)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl Surface for SvgSurface {
    fn rounded_rect(&mut self, rect: Rect, radius: f32, paint: Paint) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" {}/>"#,
            num(rect.x),
            num(rect.y),
            num(rect.width),
            num(rect.height),
            num(radius),
            fill(paint)
        );
    }

    fn circle(&mut self, center: Point, radius: f32, paint: Paint) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            num(center.x),
            num(center.y),
            num(radius),
            fill(paint)
        );
    }

    fn ring(&mut self, center: Point, radius: f32, width: f32, paint: Paint) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            num(center.x),
            num(center.y),
            num(radius),
            stroke(paint, width)
        );
    }

    fn line(&mut self, from: Point, to: Point, width: f32, paint: Paint) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-linecap="round" {}/>"#,
            num(from.x),
            num(from.y),
            num(to.x),
            num(to.y),
            stroke(paint, width)
        );
    }

    fn text(&mut self, text: &str, anchor: Point, size: f32, align: TextAlign, paint: Paint) {
        let text_anchor = match align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let _ = writeln!(
            self.body,
            r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" text-anchor="{}" dominant-baseline="central" {}>{}</text>"#,
            num(anchor.x),
            num(anchor.y),
            num(size),
            text_anchor,
            fill(paint),
            escape(text)
        );
    }

    fn push_transform(&mut self, transform: Affine) {
        let [a, b, c, d, e, f] = transform.0;
        let _ = writeln!(
            self.body,
            r#"<g transform="matrix({} {} {} {} {} {})">"#,
            num(a),
            num(b),
            num(c),
            num(d),
            num(e),
            num(f)
        );
    }

    fn pop_transform(&mut self) {
        self.body.push_str("</g>\n");
    }

    fn supports_sprites(&self) -> bool {
        true
    }

    fn blit(&mut self, sprite: &Sprite, origin: Point, opacity: f32) {
        if !self.defs.contains_key(&sprite.key) {
            let mut local = SvgSurface::new(sprite.width, sprite.height);
            sprite.replay(&mut local, Point::new(0.0, 0.0), 1.0);
            self.defs.insert(sprite.key, local.body);
        }
        let _ = writeln!(
            self.body,
            "<use href=\"#{}\" transform=\"translate({} {})\" opacity=\"{}\"/>",
            sprite_id(sprite.key),
            num(origin.x),
            num(origin.y),
            num(opacity.clamp(0.0, 1.0))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_compactly() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(1.239), "1.24");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn writes_a_document() {
        let mut surface = SvgSurface::new(100.0, 50.0).with_background(Color::rgb(255, 255, 255));
        surface.circle(Point::new(10.0, 20.0), 5.0, Paint::new(Color::rgb(0, 0, 0)));
        surface.text(
            "A<m>",
            Point::new(1.0, 2.0),
            12.0,
            TextAlign::Center,
            Paint::new(Color::rgb(0, 0, 0)),
        );
        let svg = surface.finish();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"<circle cx="10" cy="20" r="5" fill="#000000" fill-opacity="1"/>"##));
        assert!(svg.contains("A&lt;m&gt;"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn sprites_are_defined_once() {
        let sprite = Sprite {
            key: 9,
            width: 10.0,
            height: 10.0,
            commands: Vec::new(),
        };
        let mut surface = SvgSurface::new(100.0, 100.0);
        surface.blit(&sprite, Point::new(0.0, 0.0), 1.0);
        surface.blit(&sprite, Point::new(50.0, 0.0), 0.4);
        let svg = surface.finish();

        assert_eq!(svg.matches(r#"<g id="fretboard-0000000000000009">"#).count(), 1);
        assert_eq!(svg.matches("<use ").count(), 2);
    }
}
