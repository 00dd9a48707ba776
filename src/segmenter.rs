use crate::types::*;
use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    Idle,
    InStroke,
}

/// Result of feeding one frame to the segmenter.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterStep {
    /// True when this frame's thumb motion counts as a downstroke
    pub in_down: bool,
    /// Stroke closed by this frame, if any
    pub closed: Option<Stroke>,
}

/// Two-state downstroke detector over the left thumb's vertical position.
///
/// A frame is "downward" when the thumb moved down (image y increased) by
/// more than `velocity_threshold` pixels since the last known position.
/// The first downward frame opens a stroke; the first non-downward frame
/// after that closes it. Missing thumb positions count as non-downward and
/// leave the last known position in place.
///
/// Contacts for the open stroke are appended with [`record`](Self::record).
/// A stroke that receives no frames is dropped when it closes.
#[derive(Debug, Clone)]
pub struct StrokeSegmenter {
    velocity_threshold: f64,
    state: SegmenterState,
    prev_y: Option<f64>,
    buffer: Vec<StrokeFrame>,
}

impl StrokeSegmenter {
    pub fn new(velocity_threshold: f64) -> Self {
        Self {
            velocity_threshold,
            state: SegmenterState::Idle,
            prev_y: None,
            buffer: Vec::new(),
        }
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Advance by one frame.
    pub fn step(&mut self, thumb_y: Option<f64>) -> SegmenterStep {
        let in_down = match (thumb_y, self.prev_y) {
            (Some(y), Some(prev)) => y - prev > self.velocity_threshold,
            _ => false,
        };
        if thumb_y.is_some() {
            self.prev_y = thumb_y;
        }

        let mut closed = None;
        match (in_down, self.state) {
            (true, SegmenterState::Idle) => {
                trace!("segmenter: stroke opened");
                self.state = SegmenterState::InStroke;
                self.buffer.clear();
            }
            (false, SegmenterState::InStroke) => {
                closed = self.close();
            }
            _ => {}
        }

        SegmenterStep { in_down, closed }
    }

    /// Append a resolved frame to the open stroke. Ignored while idle or
    /// when `frame_index` does not advance past the last recorded frame.
    pub fn record(&mut self, frame_index: usize, contacts: ContactMap) {
        if self.state != SegmenterState::InStroke {
            return;
        }
        if let Some(last) = self.buffer.last() {
            if frame_index <= last.frame_index {
                debug!(
                    "segmenter: frame {} out of order (last {}), ignored",
                    frame_index, last.frame_index
                );
                return;
            }
        }
        self.buffer.push(StrokeFrame {
            frame_index,
            contacts,
        });
    }

    /// Close any stroke still open at end of input.
    pub fn finish(&mut self) -> Option<Stroke> {
        match self.state {
            SegmenterState::InStroke => self.close(),
            SegmenterState::Idle => None,
        }
    }

    fn close(&mut self) -> Option<Stroke> {
        self.state = SegmenterState::Idle;
        let frames = std::mem::take(&mut self.buffer);
        let (first, last) = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => (first.frame_index, last.frame_index),
            _ => {
                trace!("segmenter: empty stroke dropped");
                return None;
            }
        };
        debug!(
            "segmenter: stroke closed, frames {}..={} ({} resolved)",
            first,
            last,
            frames.len()
        );
        Some(Stroke {
            frames,
            start_frame: first,
            end_frame: last,
        })
    }
}
