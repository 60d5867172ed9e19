use std::path::PathBuf;

use chord_diagram_core::{Color, FrameSink, RenderedFrame, Result, SvgSurface};

/// Writes each exported frame as `<prefix>_<index>.svg` into a directory.
pub struct SvgDirectorySink {
    dir: PathBuf,
    prefix: String,
    width: f32,
    height: f32,
    background: Color,
    written: u64,
}

impl SvgDirectorySink {
    pub fn create(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        width: f32,
        height: f32,
        background: Color,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            width,
            height,
            background,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for SvgDirectorySink {
    type Surface = SvgSurface;

    fn create_surface(&mut self) -> SvgSurface {
        SvgSurface::new(self.width, self.height).with_background(self.background)
    }

    fn write_frame(&mut self, frame: RenderedFrame<SvgSurface>) -> Result<()> {
        let path = self
            .dir
            .join(format!("{}_{:05}.svg", self.prefix, frame.index));
        std::fs::write(&path, frame.surface.finish())?;
        self.written += 1;
        tracing::debug!(?path, time_ms = frame.time_ms, "wrote frame");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        tracing::info!(dir = ?self.dir, frames = self.written, "frames written");
        Ok(())
    }
}
