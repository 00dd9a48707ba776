//! Hand-tracker ingestion: turns normalized landmark sets into the pixel
//! keypoints the pipeline uses.
//!
//! Retained: index/middle/ring/pinky tips of the `Right` hand and the
//! thumb tip of the `Left` hand. Everything else is dropped here.

use crate::types::*;

const RIGHT_HAND_TIPS: [FingerId; 4] = [
    FingerId::IndexTip,
    FingerId::MiddleTip,
    FingerId::RingTip,
    FingerId::PinkyTip,
];

/// Denormalize and filter tracker output for a `width`×`height` frame.
pub fn retain_keypoints(hands: &[HandLandmarks], width: u32, height: u32) -> Vec<Keypoint> {
    let (w, h) = (width as f64, height as f64);
    let mut keypoints = Vec::new();
    for hand in hands {
        let ids: &[FingerId] = match hand.handedness {
            Hand::Right => &RIGHT_HAND_TIPS,
            Hand::Left => &[FingerId::ThumbTip],
        };
        for &id in ids {
            if let Some([x, y]) = hand.landmarks.get(id.landmark_id()) {
                keypoints.push(Keypoint {
                    id,
                    position: Point::new(x * w, y * h),
                    hand: hand.handedness,
                });
            }
        }
    }
    keypoints
}

/// Vertical position of the left thumb tip, the segmenter's motion signal.
pub fn thumb_y(keypoints: &[Keypoint]) -> Option<f64> {
    keypoints
        .iter()
        .find(|k| k.hand == Hand::Left && k.id == FingerId::ThumbTip)
        .map(|k| k.position.y)
}
