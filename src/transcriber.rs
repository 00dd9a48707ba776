use crate::aggregator::{aggregate_stroke, AggregatedStroke};
use crate::config::TabConfig;
use crate::contact::resolve_contacts;
use crate::fret_grid::{build_fret_grid, FretGrid};
use crate::landmarks::{retain_keypoints, thumb_y};
use crate::segmenter::StrokeSegmenter;
use crate::string_grid::{build_string_grid, StringGrid};
use crate::tablature::{TabBlock, TabDocument, TabHeader, TabRenderer};
use crate::types::*;
use log::{debug, info, trace};

/// What the pipeline saw and decided for one frame. This is everything an
/// annotation overlay needs to draw.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: usize,
    pub frets: FretGrid,
    pub strings: Option<StringGrid>,
    pub keypoints: Vec<Keypoint>,
    /// Thumb motion this frame counts as a downstroke
    pub in_down: bool,
    /// Contacts resolved this frame (only on downstroke frames with full grids)
    pub contacts: ContactMap,
    /// A stroke was closed by this frame
    pub closed_stroke: bool,
}

/// Result of a whole run.
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Closed strokes in start order
    pub strokes: Vec<Stroke>,
    /// One aggregate per stroke, same order
    pub aggregated: Vec<AggregatedStroke>,
    pub blocks: Vec<TabBlock>,
}

impl Transcription {
    pub fn columns(&self) -> Vec<StrokeColumn> {
        self.aggregated.iter().map(|a| a.column).collect()
    }

    pub fn into_document(self, header: TabHeader) -> TabDocument {
        TabDocument {
            header,
            blocks: self.blocks,
        }
    }
}

/// Frame-sequential transcription loop.
///
/// Grids are rebuilt from each frame's detections with no memory of earlier
/// frames. The only state carried between frames is the segmenter and the
/// list of closed strokes, both owned here.
pub struct Transcriber {
    config: TabConfig,
    width: u32,
    height: u32,
    segmenter: StrokeSegmenter,
    strokes: Vec<Stroke>,
    frame_count: u64,
}

impl Transcriber {
    /// `width`/`height` are the video frame size, used to denormalize landmarks.
    pub fn new(config: TabConfig, width: u32, height: u32) -> Self {
        let segmenter = StrokeSegmenter::new(config.velocity_threshold);
        Self {
            config,
            width,
            height,
            segmenter,
            strokes: Vec::new(),
            frame_count: 0,
        }
    }

    /// Strokes closed so far.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Process one frame: grids, keypoints, segmenter, then contacts.
    pub fn process_frame(&mut self, detections: &FrameDetections) -> FrameReport {
        let frame_index = detections.frame;
        let frets = build_fret_grid(&detections.frets, &self.config);
        let strings = build_string_grid(&detections.strings, &self.config);
        let keypoints = retain_keypoints(&detections.hands, self.width, self.height);

        let step = self.segmenter.step(thumb_y(&keypoints));
        let closed_stroke = step.closed.is_some();
        if let Some(stroke) = step.closed {
            self.push_stroke(stroke);
        }

        let mut contacts = ContactMap::new();
        if step.in_down {
            match &strings {
                Some(grid) if !frets.is_empty() && !keypoints.is_empty() => {
                    contacts = resolve_contacts(grid, &frets, &keypoints, &self.config);
                    self.segmenter.record(frame_index, contacts.clone());
                }
                _ => {
                    trace!(
                        "frame {}: downstroke without full detections (frets={}, strings={}, keypoints={})",
                        frame_index,
                        frets.len(),
                        strings.is_some(),
                        keypoints.len()
                    );
                }
            }
        }

        trace!(
            "frame {}: {} frets, {} keypoints, down={}, contacts={:?}",
            frame_index,
            frets.len(),
            keypoints.len(),
            step.in_down,
            contacts
        );

        self.frame_count += 1;
        if self.frame_count % 1000 == 0 {
            debug!(
                "Transcriber: {} frames processed, {} strokes",
                self.frame_count,
                self.strokes.len()
            );
        }

        FrameReport {
            frame_index,
            frets,
            strings,
            keypoints,
            in_down: step.in_down,
            contacts,
            closed_stroke,
        }
    }

    fn push_stroke(&mut self, stroke: Stroke) {
        debug!(
            "stroke #{} closed: frames {}..={}",
            self.strokes.len(),
            stroke.start_frame,
            stroke.end_frame
        );
        self.strokes.push(stroke);
    }

    /// Close any open stroke, aggregate every stroke and lay out the tab.
    pub fn finish(mut self) -> Transcription {
        if let Some(stroke) = self.segmenter.finish() {
            self.push_stroke(stroke);
        }
        self.strokes.sort_by_key(|s| s.start_frame);

        let aggregated: Vec<AggregatedStroke> = self.strokes.iter().map(aggregate_stroke).collect();

        let mut renderer = TabRenderer::new(self.config.line_length);
        for agg in &aggregated {
            renderer.push(&agg.column, agg.start_frame, agg.end_frame);
        }
        let blocks = renderer.finish();

        info!(
            "Transcribed {} frames: {} strokes → {} tab blocks",
            self.frame_count,
            self.strokes.len(),
            blocks.len()
        );

        Transcription {
            strokes: self.strokes,
            aggregated,
            blocks,
        }
    }
}

/// Run a full sequence of frames through a fresh [`Transcriber`].
pub fn transcribe<I>(frames: I, config: TabConfig, width: u32, height: u32) -> Transcription
where
    I: IntoIterator<Item = FrameDetections>,
{
    let mut transcriber = Transcriber::new(config, width, height);
    for frame in frames {
        transcriber.process_frame(&frame);
    }
    transcriber.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_helpers::obox;

    const W: u32 = 1000;
    const H: u32 = 1000;

    /// Strings at y = 100..200 step 20, frets at x = 300, 200, 100.
    fn scene(frame: usize, thumb_y: f64, tip: Option<(FingerId, f64, f64)>) -> FrameDetections {
        let strings = (0..6).map(|i| obox(200.0, 100.0 + 20.0 * i as f64, 0.9)).collect();
        let frets = [300.0, 200.0, 100.0]
            .iter()
            .map(|&x| OrientedBox {
                width: 4.0,
                height: 120.0,
                ..obox(x, 150.0, 0.9)
            })
            .collect();

        let mut left = vec![[0.0, 0.0]; 21];
        left[FingerId::ThumbTip.landmark_id()] = [0.5, thumb_y / H as f64];
        let mut hands = vec![HandLandmarks {
            handedness: Hand::Left,
            landmarks: left,
        }];
        if let Some((id, x, y)) = tip {
            let mut right = vec![[0.99, 0.99]; 21];
            right[id.landmark_id()] = [x / W as f64, y / H as f64];
            hands.push(HandLandmarks {
                handedness: Hand::Right,
                landmarks: right,
            });
        }

        FrameDetections {
            frame,
            frets,
            strings,
            hands,
        }
    }

    #[test]
    fn test_idle_frames_resolve_nothing() {
        let mut t = Transcriber::new(TabConfig::default(), W, H);
        for i in 0..5 {
            let r = t.process_frame(&scene(i, 500.0, Some((FingerId::IndexTip, 250.0, 160.0))));
            assert!(!r.in_down);
            assert!(r.contacts.is_empty());
            assert_eq!(r.frets.len(), 3);
            assert!(r.strings.is_some());
        }
        let out = t.finish();
        assert!(out.strokes.is_empty());
        assert!(out.blocks.is_empty());
    }

    #[test]
    fn test_downstroke_resolves_and_aggregates() {
        let mut t = Transcriber::new(TabConfig::default(), W, H);
        let tip = Some((FingerId::IndexTip, 250.0, 160.0));
        let ys = [500.0, 500.0, 520.0, 540.0, 540.0];
        let mut reports = Vec::new();
        for (i, y) in ys.iter().enumerate() {
            reports.push(t.process_frame(&scene(i, *y, tip)));
        }
        assert!(reports[2].in_down && reports[3].in_down);
        assert_eq!(
            reports[2].contacts[&FingerId::IndexTip],
            ContactLabel {
                string: StringLabel::G,
                fret: 1
            }
        );
        assert!(reports[4].closed_stroke);
        assert_eq!(t.strokes().len(), 1);

        let out = t.finish();
        assert_eq!(out.strokes[0].start_frame, 2);
        assert_eq!(out.strokes[0].end_frame, 3);
        let col = out.columns()[0];
        assert_eq!(col.get(StringLabel::G), Some(1));
        assert_eq!(col.get(StringLabel::LowE), None);
        assert_eq!(out.blocks.len(), 1);
        assert!(out.blocks[0].lines[StringLabel::G.index()].starts_with('1'));
    }

    #[test]
    fn test_downstroke_without_frets_is_dropped() {
        let mut t = Transcriber::new(TabConfig::default(), W, H);
        let tip = Some((FingerId::IndexTip, 250.0, 160.0));
        for (i, y) in [500.0, 520.0, 520.0].iter().enumerate() {
            let mut frame = scene(i, *y, tip);
            frame.frets.clear();
            let r = t.process_frame(&frame);
            assert!(r.contacts.is_empty());
        }
        assert!(t.finish().strokes.is_empty());
    }

    #[test]
    fn test_open_stroke_closed_at_end() {
        let tip = Some((FingerId::PinkyTip, 320.0, 100.0));
        let frames: Vec<FrameDetections> = [500.0, 510.0, 530.0]
            .iter()
            .enumerate()
            .map(|(i, y)| scene(i, *y, tip))
            .collect();
        let out = transcribe(frames, TabConfig::default(), W, H);
        assert_eq!(out.strokes.len(), 1);
        assert_eq!((out.strokes[0].start_frame, out.strokes[0].end_frame), (1, 2));
        assert_eq!(out.columns()[0].get(StringLabel::LowE), Some(0));
    }
}
