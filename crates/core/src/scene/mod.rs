//! Composes the diagrams visible for an [`AnimationState`] according to the
//! configured [`AnimationMode`], and paints them.

use crate::{
    animation::{ease_in_out_quad, phases_for, TransitionPlan},
    chord::{ChordShape, Diagnostic, PreparedChord},
    config::{AnimationMode, PlaybackConfig},
    geometry::{lerp, DiagramGeometry, GeometryCache},
    render::{DiagramFrame, DiagramRenderer, Surface},
    timeline::{AnimationState, Song},
    FretboardConfig,
};

/// Horizontal distance between carousel diagrams, in diagram widths.
const CAROUSEL_PITCH: f32 = 1.1;
/// Opacity of a neighbour one full pitch away from focus.
const NEIGHBOUR_OPACITY: f32 = 0.35;
/// Neighbours further than this from focus are not drawn.
const CAROUSEL_REACH: f32 = 1.5;

/// One diagram to paint: where it sits and what it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    pub chord_index: usize,
    pub geometry: DiagramGeometry,
    pub frame: DiagramFrame,
}

/// A prepared chord sequence plus everything needed to draw it.
#[derive(Debug)]
pub struct Scene {
    config: FretboardConfig,
    mode: AnimationMode,
    shapes: Vec<ChordShape>,
    song_capo: Option<u8>,
    chords: Vec<PreparedChord>,
    geometry: GeometryCache,
    renderer: DiagramRenderer,
    plan: Option<((usize, usize), TransitionPlan)>,
}

impl Scene {
    pub fn new(config: FretboardConfig, playback: &PlaybackConfig, song: &Song) -> Self {
        let shapes = song
            .segments
            .iter()
            .map(|segment| segment.chord.clone())
            .collect();
        Self::from_shapes(config, playback.mode, shapes, song.capo)
    }

    pub fn from_shapes(
        config: FretboardConfig,
        mode: AnimationMode,
        shapes: Vec<ChordShape>,
        song_capo: Option<u8>,
    ) -> Self {
        let chords = prepare_all(&shapes, &config, song_capo);
        Self {
            config,
            mode,
            shapes,
            song_capo,
            chords,
            geometry: GeometryCache::new(),
            renderer: DiagramRenderer::new(),
            plan: None,
        }
    }

    /// Uses `renderer` instead of the default cached one.
    pub fn with_renderer(mut self, renderer: DiagramRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &FretboardConfig {
        &self.config
    }

    pub fn mode(&self) -> AnimationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AnimationMode) {
        self.mode = mode;
    }

    pub fn chords(&self) -> &[PreparedChord] {
        &self.chords
    }

    pub fn renderer(&self) -> &DiagramRenderer {
        &self.renderer
    }

    /// Replaces the config and re-prepares every chord against it. Cached
    /// geometry and sprites follow the new config's keys on the next draw.
    pub fn set_config(&mut self, config: FretboardConfig) {
        self.chords = prepare_all(&self.shapes, &config, self.song_capo);
        self.config = config;
        self.plan = None;
    }

    /// Every diagnostic recorded while preparing, with its chord index.
    pub fn diagnostics(&self) -> impl Iterator<Item = (usize, &Diagnostic)> + '_ {
        self.chords
            .iter()
            .enumerate()
            .flat_map(|(index, chord)| chord.diagnostics.iter().map(move |d| (index, d)))
    }

    pub fn geometry(&mut self) -> DiagramGeometry {
        self.geometry.get(&self.config)
    }

    /// Diagrams visible at `state`, in paint order.
    pub fn compose(&mut self, state: &AnimationState) -> Vec<SceneItem> {
        if self.chords.is_empty() {
            return Vec::new();
        }
        let geometry = self.geometry();
        let index = state.chord_index.min(self.chords.len() - 1);

        match self.mode {
            AnimationMode::BuildOnly => vec![SceneItem {
                chord_index: index,
                geometry,
                frame: self.resting_frame(index, state, &geometry),
            }],
            AnimationMode::DynamicMorph => {
                let frame = match state.transition(self.chords.len()) {
                    Some(transition) => {
                        let p = ease_in_out_quad(transition.progress);
                        self.plan(transition.from, transition.to).sample(&geometry, p)
                    }
                    None => self.resting_frame(index, state, &geometry),
                };
                vec![SceneItem {
                    chord_index: index,
                    geometry,
                    frame,
                }]
            }
            AnimationMode::Carousel => self.carousel(index, state, &geometry),
        }
    }

    fn carousel(
        &self,
        index: usize,
        state: &AnimationState,
        geometry: &DiagramGeometry,
    ) -> Vec<SceneItem> {
        let focus = match state.transition(self.chords.len()) {
            Some(transition) => transition.from as f32 + ease_in_out_quad(transition.progress),
            None => index as f32,
        };
        let pitch = geometry.diagram.width * CAROUSEL_PITCH;

        (0..self.chords.len())
            .filter_map(|chord_index| {
                let distance = chord_index as f32 - focus;
                if distance.abs() > CAROUSEL_REACH {
                    return None;
                }
                let placed = geometry.apply_offset(distance * pitch);
                let dim = lerp(1.0, NEIGHBOUR_OPACITY, distance.abs().min(1.0));
                let frame = self.resting_frame(chord_index, state, &placed).faded(dim);
                Some(SceneItem {
                    chord_index,
                    geometry: placed,
                    frame,
                })
            })
            .collect()
    }

    /// At-rest frame, or the build-in reveal while the first chord builds.
    fn resting_frame(
        &self,
        index: usize,
        state: &AnimationState,
        geometry: &DiagramGeometry,
    ) -> DiagramFrame {
        let chord = &self.chords[index];
        if index == 0 && state.build_progress < 1.0 {
            DiagramFrame::build_in(chord, geometry, &phases_for(state.build_progress))
        } else {
            DiagramFrame::at_rest(chord, geometry)
        }
    }

    /// The plan for `from -> to`, resolved once and reused while the same
    /// pair is transitioning.
    fn plan(&mut self, from: usize, to: usize) -> &TransitionPlan {
        if !matches!(&self.plan, Some((pair, _)) if *pair == (from, to)) {
            self.plan = None;
        }
        let chords = &self.chords;
        let (_, plan) = self.plan.get_or_insert_with(|| {
            ((from, to), TransitionPlan::new(&chords[from], &chords[to]))
        });
        plan
    }

    /// Paints the scene at `state` onto `surface`.
    pub fn paint<S: Surface + ?Sized>(&mut self, surface: &mut S, state: &AnimationState) {
        let items = self.compose(state);
        for item in &items {
            self.renderer
                .draw_frame(surface, &self.config, &item.geometry, &item.frame);
        }
    }

    /// Releases cached render resources.
    pub fn dispose(&mut self) {
        self.renderer.dispose();
        self.geometry.invalidate();
        self.plan = None;
    }
}

fn prepare_all(
    shapes: &[ChordShape],
    config: &FretboardConfig,
    song_capo: Option<u8>,
) -> Vec<PreparedChord> {
    shapes
        .iter()
        .map(|shape| PreparedChord::prepare(shape, config, song_capo))
        .collect()
}
