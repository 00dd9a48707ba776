use fret_tab::annotation_log::AnnotationLogger;
use fret_tab::config::TabConfig;
use fret_tab::detections_reader::DetectionsReader;
use fret_tab::tablature::TabHeader;
use fret_tab::transcriber::{FrameReport, Transcriber};
use fret_tab::TabError;

use clap::Parser;
use crossbeam_channel::{bounded, Sender};
use log::{error, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::thread;

#[derive(Parser)]
#[command(name = "fret-tab")]
#[command(about = "Transcribe guitar tablature from recorded fret, string and hand detections")]
struct Cli {
    /// Detections file (JSONL: header line, then one frame per line)
    #[arg(long)]
    input: PathBuf,

    /// Tablature output file
    #[arg(long, default_value = "tab.txt")]
    output: PathBuf,

    /// JSON config file with thresholds (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Song title for the tab header
    #[arg(long, default_value = "Untitled")]
    title: String,

    /// Artist for the tab header
    #[arg(long, default_value = "Unknown")]
    artist: String,

    /// Tempo (BPM) for the tab header
    #[arg(long, default_value_t = 120)]
    tempo: u32,

    /// Override the tab block width
    #[arg(long)]
    line_length: Option<usize>,

    /// Override the downstroke thumb velocity threshold (px/frame)
    #[arg(long)]
    velocity_threshold: Option<f64>,

    /// Write per-frame annotations (grids, contacts) to this JSONL file
    #[arg(long)]
    annotations: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), TabError> {
    let mut config = match &cli.config {
        Some(path) => TabConfig::load(path)?,
        None => TabConfig::default(),
    };
    if let Some(n) = cli.line_length {
        config.line_length = n;
    }
    if let Some(v) = cli.velocity_threshold {
        config.velocity_threshold = v;
    }
    config.validate()?;

    let file = File::open(&cli.input).map_err(|e| TabError::io("opening detections file", e))?;
    let reader = DetectionsReader::open(BufReader::new(file))?;
    let (width, height) = (reader.header.width, reader.header.height);

    info!("═══════════════════════════════════════════════");
    info!("  FRET TAB v{}", env!("CARGO_PKG_VERSION"));
    info!("  Input: {:?} ({}x{} @ {} fps)", cli.input, width, height, reader.header.fps);
    info!("  Output: {:?}", cli.output);
    if let Some(path) = &cli.annotations {
        info!("  Annotations: {:?}", path);
    }
    info!("═══════════════════════════════════════════════");

    // ─── Annotation sink (optional) ─────────────────────────────────
    let mut annotation_tx: Option<Sender<FrameReport>> = None;
    let mut annotation_handle = None;
    if let Some(path) = cli.annotations.clone() {
        let (tx, rx) = bounded::<FrameReport>(1024);
        annotation_tx = Some(tx);
        let handle = thread::Builder::new()
            .name("annotations".into())
            .spawn(move || AnnotationLogger::new(rx, &path).run())
            .map_err(|e| TabError::io("spawning annotation thread", e))?;
        annotation_handle = Some(handle);
    }

    // ─── Frame loop ─────────────────────────────────────────────────
    let mut transcriber = Transcriber::new(config, width, height);
    for result in reader {
        let frame = match result {
            Ok(frame) => frame,
            Err(e @ TabError::Io { .. }) => return Err(e),
            Err(e) => {
                warn!("skipping frame: {}", e);
                continue;
            }
        };
        let report = transcriber.process_frame(&frame);
        let sent = annotation_tx.as_ref().map(|tx| tx.send(report).is_ok());
        if sent == Some(false) {
            warn!("annotation log stopped; continuing without it");
            annotation_tx = None;
        }
    }
    drop(annotation_tx);

    let transcription = transcriber.finish();
    let header = TabHeader {
        title: cli.title,
        artist: cli.artist,
        tempo: cli.tempo,
        ..TabHeader::default()
    };
    transcription.into_document(header).save(&cli.output)?;

    if let Some(handle) = annotation_handle {
        match handle.join() {
            Ok(result) => {
                result?;
            }
            Err(_) => error!("annotation thread panicked"),
        }
    }
    Ok(())
}
