//! JSONL detections reader. Parses recorded detector/tracker output back
//! into per-frame `FrameDetections`.
//!
//! Reads the header line (format tag, frame size, fps) then yields frames
//! one at a time. Works with any `BufRead`: files, in-memory buffers, stdin.

use crate::error::TabError;
use crate::types::FrameDetections;
use log::warn;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

pub const FORMAT_TAG: &str = "fret-tab-detections";

/// Parsed JSONL header (first line of a detections file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionsHeader {
    pub format: String,
    /// Frame width in pixels, used to denormalize hand landmarks
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
}

fn default_fps() -> f64 {
    30.0
}

impl DetectionsHeader {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            width,
            height,
            fps: default_fps(),
        }
    }
}

/// Line-by-line JSONL detections reader.
pub struct DetectionsReader<R: BufRead> {
    reader: R,
    pub header: DetectionsHeader,
    line_buf: String,
    /// Set after an I/O error; the stream yields nothing further.
    failed: bool,
}

impl<R: BufRead> DetectionsReader<R> {
    /// Read and validate the header line. Fails if the header is missing,
    /// unparseable, or not tagged `"format": "fret-tab-detections"`.
    pub fn open(mut reader: R) -> Result<Self, TabError> {
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| TabError::io("reading detections header", e))?;

        let first_line = first_line.trim();
        if first_line.is_empty() {
            return Err(TabError::format("empty file"));
        }

        let raw: serde_json::Value = serde_json::from_str(first_line)
            .map_err(|e| TabError::json("parsing detections header", e))?;
        let format = raw["format"]
            .as_str()
            .ok_or_else(|| TabError::format("missing \"format\" field"))?;
        if format != FORMAT_TAG {
            return Err(TabError::format(format!("unknown format: {}", format)));
        }
        let header: DetectionsHeader = serde_json::from_value(raw)
            .map_err(|e| TabError::json("parsing detections header", e))?;
        if header.width == 0 || header.height == 0 {
            return Err(TabError::format(format!(
                "frame size {}x{} is empty",
                header.width, header.height
            )));
        }

        Ok(Self {
            reader,
            header,
            line_buf: String::new(),
            failed: false,
        })
    }

    /// Read the next frame. `None` at EOF, `Err` for unreadable or unparseable lines.
    ///
    /// An unparseable line is reported once and reading continues with the
    /// next line. An I/O error is reported once and ends the stream.
    pub fn next_frame(&mut self) -> Option<Result<FrameDetections, TabError>> {
        if self.failed {
            return None;
        }
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str::<FrameDetections>(trimmed)
                            .map_err(|e| TabError::json("parsing frame", e)),
                    );
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(TabError::io("reading frame", e)));
                }
            }
        }
    }

    /// Read all remaining frames, skipping malformed lines. Stops at the
    /// first I/O error.
    pub fn read_all(mut self) -> Result<Vec<FrameDetections>, TabError> {
        let mut frames = Vec::new();
        while let Some(result) = self.next_frame() {
            match result {
                Ok(frame) => frames.push(frame),
                Err(e @ TabError::Io { .. }) => return Err(e),
                Err(e) => warn!("skipping frame: {}", e),
            }
        }
        Ok(frames)
    }
}

impl<R: BufRead> Iterator for DetectionsReader<R> {
    type Item = Result<FrameDetections, TabError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}
