mod sink;

use std::path::{Path, PathBuf};

use chord_diagram_core::{
    AnimationMode, AppConfig, DiagramRenderer, Exporter, MonotonicClock, PlaybackTimeline,
    PreparedChord, Scene, Song, SvgSurface, Transport,
};
use clap::{Parser, Subcommand, ValueEnum};
use sink::SvgDirectorySink;
use tracing_subscriber::EnvFilter;

fn main() -> chord_diagram_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            song,
            out,
            config,
            fps,
            mode,
        } => run_export(&song, out, config.as_deref(), fps, mode),
        Commands::Inspect {
            song,
            config,
            step_ms,
        } => run_inspect(&song, config.as_deref(), step_ms),
        Commands::Still {
            song,
            index,
            out,
            config,
        } => run_still(&song, index, &out, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> chord_diagram_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn run_export(
    song_path: &Path,
    out: Option<PathBuf>,
    config_path: Option<&Path>,
    fps: Option<u32>,
    mode: Option<ModeArg>,
) -> chord_diagram_core::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(fps) = fps {
        config.recording.fps = fps;
    }
    if let Some(mode) = mode {
        config.playback.mode = mode.into();
    }
    let out = out.unwrap_or_else(|| PathBuf::from(&config.recording.output_dir));

    let song = Song::load(song_path)?;
    tracing::info!(title = %song.title, segments = song.segments.len(), ?out, "exporting song");

    let fretboard = &config.fretboard;
    let mut scene = Scene::new(fretboard.clone(), &config.playback, &song);
    let timeline = PlaybackTimeline::from_song(&song, &config.playback);
    let mut transport = Transport::new(timeline, MonotonicClock::new());
    let mut sink = SvgDirectorySink::create(
        out,
        config.recording.file_prefix.clone(),
        fretboard.canvas_width,
        fretboard.canvas_height,
        fretboard.theme.background,
    )?;

    let exporter = Exporter::new(config.recording.clone());
    let summary = exporter.run(&mut scene, &mut transport, &mut sink, 0.0)?;
    scene.dispose();

    tracing::info!(
        frames = summary.frames,
        written = sink.written(),
        duration_ms = summary.duration_ms,
        "export complete"
    );
    Ok(())
}

fn run_inspect(
    song_path: &Path,
    config_path: Option<&Path>,
    step_ms: f64,
) -> chord_diagram_core::Result<()> {
    let config = load_config(config_path)?;
    let song = Song::load(song_path)?;
    let scene = Scene::new(config.fretboard.clone(), &config.playback, &song);
    let timeline = PlaybackTimeline::from_song(&song, &config.playback);

    println!("{} ({} chords, {:.0} ms)", song.title, timeline.len(), timeline.total_ms());
    for (index, chord) in scene.chords().iter().enumerate() {
        let start = timeline.segment_start(index).unwrap_or_default();
        let barre = chord
            .barre
            .map(|barre| format!("barre fret {} strings {}-{}", barre.fret, barre.low_string(), barre.high_string()))
            .unwrap_or_else(|| "no barre".to_string());
        let capo = chord
            .capo
            .map(|fret| format!(", capo {fret}"))
            .unwrap_or_default();
        println!(
            "  [{index}] {:<8} at {start:>7.0} ms  position {}, {barre}{capo}",
            chord.name(),
            chord.display_offset
        );
    }
    for (index, diagnostic) in scene.diagnostics() {
        println!("  warning [{index}]: {diagnostic}");
    }

    let step = if step_ms > 0.0 { step_ms } else { 100.0 };
    println!();
    println!("{:>8}  {:>5}  {:<8}  {:>10}  {:>5}  {:>5}", "t (ms)", "chord", "name", "transition", "build", "chord");
    let mut t = 0.0;
    loop {
        let state = timeline.query_at(t);
        let name = scene
            .chords()
            .get(state.chord_index)
            .map(PreparedChord::name)
            .unwrap_or("-");
        println!(
            "{t:>8.0}  {:>5}  {name:<8}  {:>10.3}  {:>5.2}  {:>5.2}",
            state.chord_index, state.transition_progress, state.build_progress, state.chord_progress
        );
        if t >= timeline.total_ms() {
            break;
        }
        t = (t + step).min(timeline.total_ms());
    }
    Ok(())
}

fn run_still(
    song_path: &Path,
    index: usize,
    out: &Path,
    config_path: Option<&Path>,
) -> chord_diagram_core::Result<()> {
    let config = load_config(config_path)?;
    let song = Song::load(song_path)?;
    let segment = song.segments.get(index).ok_or_else(|| {
        chord_diagram_core::ChordDiagramError::msg(format!(
            "song has {} chords, no index {index}",
            song.segments.len()
        ))
    })?;

    let fretboard = &config.fretboard;
    let chord = PreparedChord::prepare(&segment.chord, fretboard, song.capo);
    let geometry = chord_diagram_core::recalculate(fretboard);
    let mut surface = SvgSurface::new(fretboard.canvas_width, fretboard.canvas_height)
        .with_background(fretboard.theme.background);
    let mut renderer = DiagramRenderer::new();
    renderer.draw_static(&mut surface, fretboard, &geometry, &chord);
    renderer.dispose();

    std::fs::write(out, surface.finish())?;
    tracing::info!(chord = chord.name(), ?out, "wrote still");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated guitar chord diagrams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Build,
    Morph,
    Carousel,
}

impl From<ModeArg> for AnimationMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Build => AnimationMode::BuildOnly,
            ModeArg::Morph => AnimationMode::DynamicMorph,
            ModeArg::Carousel => AnimationMode::Carousel,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every frame of a song to SVG files.
    Export {
        /// Song JSON file.
        song: PathBuf,
        /// Output directory; defaults to the configured one.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Optional app config JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Frames per second, overriding the config.
        #[arg(long)]
        fps: Option<u32>,
        /// Animation mode, overriding the config.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Print the chord analysis and the timeline state table.
    Inspect {
        /// Song JSON file.
        song: PathBuf,
        /// Optional app config JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Sampling step for the state table.
        #[arg(long, default_value_t = 100.0)]
        step_ms: f64,
    },
    /// Draw one chord of a song at rest into a single SVG.
    Still {
        /// Song JSON file.
        song: PathBuf,
        /// Zero-based chord index.
        #[arg(short, long, default_value_t = 0)]
        index: usize,
        /// Output SVG path.
        #[arg(short, long)]
        out: PathBuf,
        /// Optional app config JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
