use crate::error::TabError;
use crate::transcriber::FrameReport;
use crate::types::*;
use crossbeam_channel::Receiver;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Compact per-frame annotation: what an overlay would draw.
/// One JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    pub frame: usize,
    pub down: bool,
    /// Fret centers in index order
    pub frets: Vec<[f64; 2]>,
    /// String line centers, E A D G B e
    pub strings: Vec<[f64; 2]>,
    /// Neck angle of the string grid (radians)
    pub angle: Option<f64>,
    /// Median long-axis angle of the fret boxes (radians)
    pub fret_angle: Option<f64>,
    pub collapsed: bool,
    pub contacts: ContactMap,
    pub stroke_closed: bool,
}

impl From<&FrameReport> for AnnotationRecord {
    fn from(r: &FrameReport) -> Self {
        Self {
            frame: r.frame_index,
            down: r.in_down,
            frets: r
                .frets
                .frets
                .iter()
                .map(|f| [f.position.x, f.position.y])
                .collect(),
            strings: r
                .strings
                .iter()
                .flat_map(|g| g.lines.iter().map(|l| [l.center.x, l.center.y]))
                .collect(),
            angle: r.strings.as_ref().map(|g| g.angle),
            fret_angle: r.frets.angle,
            collapsed: r.strings.as_ref().is_some_and(|g| g.collapsed),
            contacts: r.contacts.clone(),
            stroke_closed: r.closed_stroke,
        }
    }
}

/// Write one record as a JSONL line.
pub fn write_record<W: Write>(w: &mut W, report: &FrameReport) -> Result<(), TabError> {
    let line = serde_json::to_string(&AnnotationRecord::from(report))
        .map_err(|e| TabError::json("encoding annotation", e))?;
    writeln!(w, "{}", line).map_err(|e| TabError::io("writing annotation", e))
}

/// Drains frame reports from a channel into a JSONL file. Runs on its own
/// thread until every sender is dropped.
pub struct AnnotationLogger {
    rx: Receiver<FrameReport>,
    path: PathBuf,
}

impl AnnotationLogger {
    pub fn new(rx: Receiver<FrameReport>, path: &Path) -> Self {
        Self {
            rx,
            path: path.to_path_buf(),
        }
    }

    /// Run the logger. Blocks the calling thread. Returns the number of
    /// frames written.
    pub fn run(&self) -> Result<u64, TabError> {
        info!("Annotation log → {:?}", self.path);
        let file =
            File::create(&self.path).map_err(|e| TabError::io("creating annotation log", e))?;
        let mut writer = BufWriter::new(file);
        let mut frame_count: u64 = 0;

        for report in self.rx.iter() {
            write_record(&mut writer, &report)?;
            frame_count += 1;
            if frame_count % 1000 == 0 {
                writer
                    .flush()
                    .map_err(|e| TabError::io("flushing annotation log", e))?;
                info!("Logged {} annotated frames", frame_count);
            }
        }

        writer
            .flush()
            .map_err(|e| TabError::io("flushing annotation log", e))?;
        info!(
            "Annotation log saved: {} frames → {:?}",
            frame_count, self.path
        );
        Ok(frame_count)
    }
}
