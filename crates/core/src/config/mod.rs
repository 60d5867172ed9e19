use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{record::RecordingSettings, ChordDiagramError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fretboard: FretboardConfig,
    pub playback: PlaybackConfig,
    pub recording: RecordingSettings,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Everything needed to lay out and paint one diagram.
///
/// The value is replaced wholesale whenever the user changes a setting;
/// derived layout lives in [`crate::DiagramGeometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FretboardConfig {
    pub string_count: u8,
    pub fret_count: u8,
    /// Multiplier applied to every base dimension. Non-positive values are
    /// treated as `1.0`.
    pub scale: f32,
    pub rotation_degrees: f32,
    pub mirrored: bool,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// String names ordered from string 1 (highest pitch) upward.
    pub tuning: Vec<String>,
    pub show_inlays: bool,
    /// Capo applied to every chord unless the chord overrides it.
    pub capo: Option<u8>,
    pub theme: Theme,
}

impl Default for FretboardConfig {
    fn default() -> Self {
        Self {
            string_count: 6,
            fret_count: 5,
            scale: 1.0,
            rotation_degrees: 0.0,
            mirrored: false,
            canvas_width: 400.0,
            canvas_height: 400.0,
            tuning: ["E", "B", "G", "D", "A", "E"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            show_inlays: true,
            capo: None,
            theme: Theme::default(),
        }
    }
}

impl FretboardConfig {
    /// Scale factor with the non-positive guard applied.
    pub fn effective_scale(&self) -> f32 {
        if self.scale > 0.0 && self.scale.is_finite() {
            self.scale
        } else {
            1.0
        }
    }

    /// Name printed under the given 1-based string, if the tuning lists one.
    pub fn string_name(&self, string_number: u8) -> Option<&str> {
        let index = usize::from(string_number).checked_sub(1)?;
        self.tuning.get(index).map(String::as_str)
    }

    /// Fields that change the computed layout.
    pub fn geometry_key(&self) -> GeometryKey {
        GeometryKey {
            string_count: self.string_count,
            fret_count: self.fret_count,
            scale_bits: self.effective_scale().to_bits(),
            canvas_width_bits: self.canvas_width.to_bits(),
            canvas_height_bits: self.canvas_height.to_bits(),
        }
    }

    /// Hash of everything baked into the fretboard sprite.
    pub fn sprite_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.geometry_key().hash(&mut hasher);
        self.tuning.hash(&mut hasher);
        self.show_inlays.hash(&mut hasher);
        self.theme.hash(&mut hasher);
        hasher.finish()
    }
}

/// Geometry-affecting subset of [`FretboardConfig`]. Floats are stored as
/// raw bits so the key can be hashed and compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    string_count: u8,
    fret_count: u8,
    scale_bits: u32,
    canvas_width_bits: u32,
    canvas_height_bits: u32,
}

/// Colours used by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Color,
    pub neck: Color,
    pub string: Color,
    pub fret: Color,
    pub nut: Color,
    pub inlay: Color,
    pub finger: Color,
    pub finger_text: Color,
    pub barre: Color,
    pub open_string: Color,
    pub avoided: Color,
    pub label: Color,
    pub string_name: Color,
    pub indicator: Color,
    pub capo: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::rgb(0xff, 0xff, 0xff),
            neck: Color::rgb(0xf4, 0xe9, 0xd8),
            string: Color::rgb(0x44, 0x44, 0x44),
            fret: Color::rgb(0x88, 0x88, 0x88),
            nut: Color::rgb(0x22, 0x22, 0x22),
            inlay: Color::rgba(0x00, 0x00, 0x00, 0x30),
            finger: Color::rgb(0x1e, 0x3a, 0x8a),
            finger_text: Color::rgb(0xff, 0xff, 0xff),
            barre: Color::rgb(0x1e, 0x3a, 0x8a),
            open_string: Color::rgb(0x1e, 0x3a, 0x8a),
            avoided: Color::rgb(0xb9, 0x1c, 0x1c),
            label: Color::rgb(0x11, 0x11, 0x11),
            string_name: Color::rgb(0x55, 0x55, 0x55),
            indicator: Color::rgb(0x11, 0x11, 0x11),
            capo: Color::rgb(0x6b, 0x72, 0x80),
        }
    }
}

/// 8-bit RGBA colour, serialised as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Alpha channel as a `[0, 1]` value.
    pub fn alpha(&self) -> f32 {
        f32::from(self.a) / 255.0
    }

    pub fn parse_hex(text: &str) -> Result<Self> {
        let digits = text
            .strip_prefix('#')
            .ok_or(ChordDiagramError::InvalidInput("colour must start with `#`"))?;
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return Err(ChordDiagramError::msg(format!(
                "colour `{text}` must have 6 or 8 hex digits"
            )));
        }

        let channel = |index: usize| {
            u8::from_str_radix(&digits[index..index + 2], 16)
                .map_err(|_| ChordDiagramError::msg(format!("invalid hex digits in `{text}`")))
        };

        let a = if digits.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ChordDiagramError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

/// How a chord sequence is animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Staged build-in for the first chord, hard cuts between chords.
    BuildOnly,
    /// Per-finger morphing between consecutive chords.
    #[default]
    DynamicMorph,
    /// Neighbouring chords laid out side by side, sliding on each change.
    Carousel,
}

/// Timing knobs for [`crate::PlaybackTimeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Full length of one chord-to-chord transition, split evenly across
    /// the boundary.
    pub transition_ms: f64,
    /// Length of the build-in reveal of the first chord.
    pub build_ms: f64,
    pub transitions_enabled: bool,
    pub build_enabled: bool,
    pub looping: bool,
    pub mode: AnimationMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            transition_ms: 530.0,
            build_ms: 1200.0,
            transitions_enabled: true,
            build_enabled: true,
            looping: false,
            mode: AnimationMode::default(),
        }
    }
}
