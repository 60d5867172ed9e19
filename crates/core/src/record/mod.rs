//! Frame-accurate export.
//!
//! The [`Exporter`] samples the timeline at `k * 1000 / fps` milliseconds,
//! paints each state with the same scene code used for live playback and
//! hands the surfaces to a [`FrameSink`] in small batches.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};

use crate::{
    render::Surface,
    scene::Scene,
    timeline::{Clock, Transport},
    ChordDiagramError, Result,
};

/// Configuration options for the export subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub output_dir: String,
    pub file_prefix: String,
    pub fps: u32,
    /// Frames rendered ahead before the sink sees them.
    pub batch_size: usize,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: "frames".to_string(),
            file_prefix: "frame".to_string(),
            fps: 30,
            batch_size: 8,
        }
    }
}

/// Receives rendered frames.
pub trait FrameSink {
    type Surface: Surface;

    /// A blank surface for the next frame.
    fn create_surface(&mut self) -> Self::Surface;

    fn write_frame(&mut self, frame: RenderedFrame<Self::Surface>) -> Result<()>;

    /// Called once after the last frame of a completed export.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct RenderedFrame<S> {
    pub index: u64,
    pub time_ms: f64,
    pub surface: S,
}

/// Shared cancellation switch, safe to trip from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub frames: u64,
    pub duration_ms: f64,
}

#[derive(Debug)]
pub struct Exporter {
    settings: RecordingSettings,
    cancel: CancelFlag,
}

impl Exporter {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            cancel: CancelFlag::new(),
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    /// Handle that aborts a running export.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn fps(&self) -> u32 {
        self.settings.fps.max(1)
    }

    /// Timestamp of frame `index`.
    pub fn frame_time_ms(&self, index: u64) -> f64 {
        index as f64 * 1000.0 / f64::from(self.fps())
    }

    /// Frames needed to cover `total_ms`, both ends included.
    pub fn frame_count(&self, total_ms: f64) -> u64 {
        if total_ms.is_nan() || total_ms <= 0.0 {
            return 1;
        }
        (total_ms * f64::from(self.fps()) / 1000.0).floor() as u64 + 1
    }

    /// Renders every frame of `transport`'s timeline into `sink`.
    ///
    /// States come from the pure timeline query, so the output matches live
    /// playback at the same timestamps and the transport's own playhead is
    /// left alone. On cancellation buffered frames are dropped, the
    /// transport is parked at `reset_ms` and [`ChordDiagramError::Cancelled`]
    /// is returned.
    pub fn run<C: Clock, K: FrameSink>(
        &self,
        scene: &mut Scene,
        transport: &mut Transport<C>,
        sink: &mut K,
        reset_ms: f64,
    ) -> Result<ExportSummary> {
        let timeline = transport.timeline();
        if timeline.is_empty() {
            return Err(ChordDiagramError::InvalidInput("cannot export an empty timeline"));
        }

        let total_ms = timeline.total_ms();
        let frames = self.frame_count(total_ms);
        let batch_size = self.settings.batch_size.max(1);
        tracing::info!(frames, fps = self.fps(), total_ms, "export started");

        let mut buffer: Vec<RenderedFrame<K::Surface>> = Vec::with_capacity(batch_size);
        for index in 0..frames {
            if self.cancel.is_cancelled() {
                let dropped = buffer.len();
                drop(buffer);
                transport.reset_to(reset_ms);
                self.cancel.reset();
                tracing::info!(index, dropped, reset_ms, "export cancelled");
                return Err(ChordDiagramError::Cancelled);
            }

            let time_ms = self.frame_time_ms(index).min(total_ms);
            let state = transport.timeline().query_at(time_ms);
            let mut surface = sink.create_surface();
            scene.paint(&mut surface, &state);
            buffer.push(RenderedFrame {
                index,
                time_ms,
                surface,
            });

            if buffer.len() >= batch_size {
                flush(sink, &mut buffer)?;
            }
        }

        flush(sink, &mut buffer)?;
        sink.finish()?;
        tracing::info!(frames, "export finished");

        Ok(ExportSummary {
            frames,
            duration_ms: total_ms,
        })
    }
}

fn flush<K: FrameSink>(sink: &mut K, buffer: &mut Vec<RenderedFrame<K::Surface>>) -> Result<()> {
    for frame in buffer.drain(..) {
        sink.write_frame(frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chord::ChordShape,
        config::{AnimationMode, PlaybackConfig},
        render::RecordingSurface,
        timeline::{ManualClock, PlaybackTimeline, TimelineSegment},
        FretboardConfig,
    };

    #[derive(Default)]
    struct MemorySink {
        frames: Vec<RenderedFrame<RecordingSurface>>,
        finished: bool,
        cancel_after: Option<(usize, CancelFlag)>,
    }

    impl FrameSink for MemorySink {
        type Surface = RecordingSurface;

        fn create_surface(&mut self) -> RecordingSurface {
            RecordingSurface::new()
        }

        fn write_frame(&mut self, frame: RenderedFrame<RecordingSurface>) -> Result<()> {
            self.frames.push(frame);
            if let Some((limit, flag)) = &self.cancel_after {
                if self.frames.len() >= *limit {
                    flag.cancel();
                }
            }
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn fixture() -> (Scene, Transport<ManualClock>) {
        let playback = PlaybackConfig {
            transition_ms: 500.0,
            build_enabled: false,
            ..PlaybackConfig::default()
        };
        let shapes = vec![ChordShape::new("A"), ChordShape::new("B")];
        let segments = shapes
            .iter()
            .map(|shape| TimelineSegment::new(shape.clone(), 1000.0))
            .collect();
        let scene = Scene::from_shapes(
            FretboardConfig::default(),
            AnimationMode::DynamicMorph,
            shapes,
            None,
        );
        let transport = Transport::new(PlaybackTimeline::new(segments, &playback), ManualClock::new());
        (scene, transport)
    }

    #[test]
    fn frame_grid_covers_both_ends() {
        let exporter = Exporter::new(RecordingSettings {
            fps: 10,
            ..RecordingSettings::default()
        });
        assert_eq!(exporter.frame_count(2000.0), 21);
        assert_eq!(exporter.frame_time_ms(20), 2000.0);
        assert_eq!(exporter.frame_count(0.0), 1);
    }

    #[test]
    fn exports_every_frame_in_order() {
        let (mut scene, mut transport) = fixture();
        let exporter = Exporter::new(RecordingSettings {
            fps: 10,
            batch_size: 4,
            ..RecordingSettings::default()
        });
        let mut sink = MemorySink::default();
        let summary = exporter
            .run(&mut scene, &mut transport, &mut sink, 0.0)
            .expect("export");

        assert_eq!(summary.frames, 21);
        assert!(sink.finished);
        let indices: Vec<u64> = sink.frames.iter().map(|frame| frame.index).collect();
        assert_eq!(indices, (0..21).collect::<Vec<_>>());
    }

    #[test]
    fn cancellation_drops_the_buffer_and_resets() {
        let (mut scene, mut transport) = fixture();
        transport.seek_ms(1500.0);
        let exporter = Exporter::new(RecordingSettings {
            fps: 10,
            batch_size: 4,
            ..RecordingSettings::default()
        });
        let mut sink = MemorySink {
            cancel_after: Some((4, exporter.cancel_flag())),
            ..MemorySink::default()
        };

        let result = exporter.run(&mut scene, &mut transport, &mut sink, 250.0);
        assert!(matches!(result, Err(ChordDiagramError::Cancelled)));
        // Only the first flushed batch reached the sink.
        assert_eq!(sink.frames.len(), 4);
        assert!(!sink.finished);
        assert_eq!(transport.elapsed_ms(), 250.0);
    }

    #[test]
    fn timeline_longer_than_the_scene_exports() {
        let (mut scene, _) = fixture();
        let segments = ["A", "B", "C"]
            .iter()
            .map(|name| TimelineSegment::new(ChordShape::new(*name), 1000.0))
            .collect();
        let playback = PlaybackConfig {
            build_enabled: false,
            ..PlaybackConfig::default()
        };
        let mut transport =
            Transport::new(PlaybackTimeline::new(segments, &playback), ManualClock::new());
        let exporter = Exporter::new(RecordingSettings {
            fps: 10,
            ..RecordingSettings::default()
        });
        let mut sink = MemorySink::default();
        let summary = exporter
            .run(&mut scene, &mut transport, &mut sink, 0.0)
            .expect("export");
        assert_eq!(summary.frames, 31);
        assert_eq!(sink.frames.len(), 31);
    }

    #[test]
    fn empty_timeline_is_rejected() {
        let mut scene = Scene::from_shapes(
            FretboardConfig::default(),
            AnimationMode::DynamicMorph,
            Vec::new(),
            None,
        );
        let mut transport = Transport::new(
            PlaybackTimeline::new(Vec::new(), &PlaybackConfig::default()),
            ManualClock::new(),
        );
        let result = Exporter::new(RecordingSettings::default()).run(
            &mut scene,
            &mut transport,
            &mut MemorySink::default(),
            0.0,
        );
        assert!(matches!(result, Err(ChordDiagramError::InvalidInput(_))));
    }
}
