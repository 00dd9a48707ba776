use crate::config::{DegenerateStrings, TabConfig};
use crate::geometry::{confident, median, normal, principal_angle, suppress_duplicates, tangent};
use crate::types::*;
use log::{trace, warn};

/// Six evenly spaced string lines sharing the neck angle.
///
/// Detections are noisy and often merge or drop strings, so instead of
/// trusting six individual boxes the grid is synthesized: the spread of
/// surviving centers across the neck sets the span, and the six lines are
/// placed at equal steps across it.
#[derive(Debug, Clone, PartialEq)]
pub struct StringGrid {
    /// Ordered top-to-bottom in the image, labelled E A D G B e
    pub lines: [StringLine; NUM_STRINGS],
    /// Canonical neck angle θ (radians)
    pub angle: f64,
    /// True when fewer than two boxes survived and all lines share one center
    pub collapsed: bool,
}

impl StringGrid {
    /// Unit vector along the neck.
    pub fn tangent(&self) -> Point {
        tangent(self.angle)
    }

    fn from_centers(mut centers: [Point; NUM_STRINGS], angle: f64, collapsed: bool) -> Self {
        centers.sort_by(|a, b| a.y.total_cmp(&b.y));
        let lines = std::array::from_fn(|i| StringLine {
            center: centers[i],
            label: StringLabel::ALL[i],
            angle,
        });
        Self {
            lines,
            angle,
            collapsed,
        }
    }
}

/// Build the string grid from raw string detections. `None` when nothing
/// clears the confidence threshold (or the grid is degenerate and the
/// config says to skip it).
pub fn build_string_grid(boxes: &[OrientedBox], config: &TabConfig) -> Option<StringGrid> {
    let candidates = confident(boxes, config.string_confidence);
    let angles: Vec<f64> = candidates.iter().map(principal_angle).collect();
    let theta = median(&angles)?;
    let t = tangent(theta);
    let n = normal(theta);

    let kept = suppress_duplicates(&candidates, config.min_center_dist);
    if kept.len() < 2 {
        return match config.degenerate_strings {
            DegenerateStrings::Collapse => {
                warn!(
                    "string grid degenerate ({} box after suppression); collapsing all strings to one line",
                    kept.len()
                );
                Some(StringGrid::from_centers(
                    [kept[0].center; NUM_STRINGS],
                    theta,
                    true,
                ))
            }
            DegenerateStrings::Skip => {
                trace!("string grid degenerate; skipping frame");
                None
            }
        };
    }

    let across: Vec<f64> = kept.iter().map(|b| b.center.dot(n)).collect();
    let along: Vec<f64> = kept.iter().map(|b| b.center.dot(t)).collect();

    let mut p_min = across.iter().copied().fold(f64::INFINITY, f64::min);
    let mut p_max = across.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_span = config.min_string_span();
    if p_max - p_min < min_span {
        let mid = (p_min + p_max) / 2.0;
        p_min = mid - min_span / 2.0;
        p_max = mid + min_span / 2.0;
    }

    let step = (p_max - p_min) / (NUM_STRINGS - 1) as f64;
    // kept.len() >= 2 here, so the median exists
    let t_med = median(&along).unwrap_or_default();
    let centers: [Point; NUM_STRINGS] =
        std::array::from_fn(|i| n.scale(p_min + i as f64 * step) + t.scale(t_med));

    trace!(
        "string grid: {} candidates → {} kept, θ={:.3} span={:.1}px",
        boxes.len(),
        kept.len(),
        theta,
        p_max - p_min
    );

    Some(StringGrid::from_centers(centers, theta, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{perpendicular_distance, test_helpers::obox};

    fn horizontal_strings(ys: &[f64]) -> Vec<OrientedBox> {
        ys.iter().map(|&y| obox(400.0, y, 0.8)).collect()
    }

    #[test]
    fn test_none_when_nothing_confident() {
        let boxes = [obox(400.0, 100.0, 0.1)];
        assert!(build_string_grid(&boxes, &TabConfig::default()).is_none());
        assert!(build_string_grid(&[], &TabConfig::default()).is_none());
    }

    #[test]
    fn test_six_lines_evenly_spaced() {
        let boxes = horizontal_strings(&[100.0, 120.0, 140.0, 160.0, 180.0, 200.0]);
        let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
        assert!(!grid.collapsed);
        let ys: Vec<f64> = grid.lines.iter().map(|l| l.center.y).collect();
        for (got, want) in ys.iter().zip([100.0, 120.0, 140.0, 160.0, 180.0, 200.0]) {
            assert!((got - want).abs() < 1e-9, "ys={:?}", ys);
        }
        for l in &grid.lines {
            assert!((l.center.x - 400.0).abs() < 1e-9);
            assert_eq!(l.angle, grid.angle);
        }
        let labels: Vec<StringLabel> = grid.lines.iter().map(|l| l.label).collect();
        assert_eq!(labels, StringLabel::ALL.to_vec());
    }

    #[test]
    fn test_missing_strings_are_synthesized() {
        // Only the outer strings and one inner string detected
        let boxes = horizontal_strings(&[100.0, 150.0, 200.0]);
        let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
        let ys: Vec<f64> = grid.lines.iter().map(|l| l.center.y).collect();
        assert!((ys[1] - 120.0).abs() < 1e-9, "ys={:?}", ys);
        assert!((ys[4] - 180.0).abs() < 1e-9, "ys={:?}", ys);
    }

    #[test]
    fn test_narrow_span_is_widened_around_center() {
        // Two strings 20px apart: span forced to 60px around y=110
        let boxes = horizontal_strings(&[100.0, 120.0]);
        let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
        let first = grid.lines[0].center.y;
        let last = grid.lines[5].center.y;
        assert!((first - 80.0).abs() < 1e-9, "first={}", first);
        assert!((last - 140.0).abs() < 1e-9, "last={}", last);
    }

    #[test]
    fn test_rotated_neck_shares_angle() {
        let theta: f64 = 0.2;
        let n = normal(theta);
        let t = tangent(theta);
        let boxes: Vec<OrientedBox> = (0..6)
            .map(|i| {
                let c = n.scale(200.0 + 15.0 * i as f64) + t.scale(500.0);
                let jitter = if i % 2 == 0 { 0.01 } else { -0.01 };
                OrientedBox {
                    center: c,
                    width: 300.0,
                    height: 5.0,
                    angle: theta + jitter * (i as f64 / 5.0),
                    confidence: 0.7,
                }
            })
            .collect();
        let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
        assert!((grid.angle - theta).abs() < 0.01);
        for w in grid.lines.windows(2) {
            assert!(w[0].center.y < w[1].center.y);
        }
        // Every detection lies close to some reconstructed line
        for b in &boxes {
            let best = grid
                .lines
                .iter()
                .map(|l| perpendicular_distance(l.center, grid.tangent(), b.center))
                .fold(f64::INFINITY, f64::min);
            assert!(best < 1.0, "best={}", best);
        }
    }

    #[test]
    fn test_tall_boxes_are_rotated() {
        // Strings reported as tall thin boxes at angle -π/2: principal angle 0
        let boxes: Vec<OrientedBox> = [100.0, 130.0, 160.0]
            .iter()
            .map(|&y| OrientedBox {
                center: Point::new(300.0, y),
                width: 4.0,
                height: 300.0,
                angle: -std::f64::consts::FRAC_PI_2,
                confidence: 0.9,
            })
            .collect();
        let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
        assert!(grid.angle.abs() < 1e-12);
    }

    #[test]
    fn test_always_six_monotonic_lines() {
        for n in 2..12 {
            let boxes: Vec<OrientedBox> = (0..n)
                .map(|i| obox(300.0 + (i * 37 % 11) as f64, 90.0 + i as f64 * 9.0, 0.5))
                .collect();
            let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
            assert_eq!(grid.lines.len(), 6);
            for w in grid.lines.windows(2) {
                assert!(w[0].center.y < w[1].center.y, "n={}", n);
            }
        }
    }

    #[test]
    fn test_degenerate_collapse() {
        let boxes = [obox(400.0, 100.0, 0.9), obox(402.0, 101.0, 0.5)];
        let grid = build_string_grid(&boxes, &TabConfig::default()).unwrap();
        assert!(grid.collapsed);
        for l in &grid.lines {
            assert_eq!(l.center, Point::new(400.0, 100.0));
        }
    }

    #[test]
    fn test_degenerate_skip() {
        let config = TabConfig {
            degenerate_strings: DegenerateStrings::Skip,
            ..TabConfig::default()
        };
        let boxes = [obox(400.0, 100.0, 0.9)];
        assert!(build_string_grid(&boxes, &config).is_none());
    }
}
