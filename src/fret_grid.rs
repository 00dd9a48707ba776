use crate::config::{FretOrder, TabConfig};
use crate::geometry::{confident, median, principal_angle, suppress_duplicates};
use crate::types::*;
use log::trace;

/// Frets detected in one frame, deduplicated and indexed along the neck.
///
/// Rebuilt from scratch every frame; indices carry no identity across frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FretGrid {
    /// Dense indices 0..n in sort order
    pub frets: Vec<FretEntry>,
    /// Median long-axis angle of the confident fret boxes
    pub angle: Option<f64>,
}

impl FretGrid {
    pub fn is_empty(&self) -> bool {
        self.frets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frets.len()
    }

    /// Nearest fret strictly to the left of `x`.
    pub fn nearest_left_of(&self, x: f64) -> Option<&FretEntry> {
        self.frets
            .iter()
            .filter(|f| f.position.x < x)
            .min_by(|a, b| (x - a.position.x).total_cmp(&(x - b.position.x)))
    }
}

/// Build the fret grid from raw fret detections. Empty when nothing clears
/// the confidence threshold.
pub fn build_fret_grid(boxes: &[OrientedBox], config: &TabConfig) -> FretGrid {
    let candidates = confident(boxes, config.fret_confidence);
    if candidates.is_empty() {
        return FretGrid::default();
    }

    let angles: Vec<f64> = candidates.iter().map(principal_angle).collect();
    let kept = suppress_duplicates(&candidates, config.min_center_dist);

    let mut centers: Vec<Point> = kept.iter().map(|b| b.center).collect();
    match config.fret_order {
        FretOrder::RightToLeft => centers.sort_by(|a, b| b.x.total_cmp(&a.x)),
        FretOrder::LeftToRight => centers.sort_by(|a, b| a.x.total_cmp(&b.x)),
    }

    let frets: Vec<FretEntry> = centers
        .into_iter()
        .enumerate()
        .map(|(index, position)| FretEntry { position, index })
        .collect();

    trace!(
        "fret grid: {} candidates → {} frets",
        boxes.len(),
        frets.len()
    );

    FretGrid {
        frets,
        angle: median(&angles),
    }
}
