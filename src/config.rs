//! Tunable thresholds for grid reconstruction, stroke segmentation,
//! contact resolution and rendering.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. CLI flags override individual fields after loading.

use crate::error::TabError;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which end of the neck gets fret index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FretOrder {
    /// Rightmost detected fret is index 0 (sort by x descending).
    RightToLeft,
    /// Leftmost detected fret is index 0 (sort by x ascending).
    LeftToRight,
}

/// How to pick one fingertip when several lie within range of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeypointTieBreak {
    /// Largest landmark id wins, regardless of distance.
    HighestId,
    /// Smallest perpendicular distance wins; equal distances fall back to highest id.
    Nearest,
}

/// What to do when fewer than two string boxes survive suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegenerateStrings {
    /// Place all six lines on the single surviving center.
    Collapse,
    /// Treat the frame as having no string grid.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    /// Minimum detector confidence for a fret box
    pub fret_confidence: f64,
    /// Minimum detector confidence for a string box
    pub string_confidence: f64,
    /// Greedy suppression radius between box centers (px)
    pub min_center_dist: f64,
    /// Minimum spacing between adjacent strings (px); grid span is at least 5× this
    pub min_string_spacing: f64,
    /// Thumb y-velocity (px/frame) above which motion counts as a downstroke
    pub velocity_threshold: f64,
    /// Max perpendicular distance from fingertip to string line (px)
    pub max_keypoint_dist: f64,
    /// Tab block width in characters
    pub line_length: usize,
    pub fret_order: FretOrder,
    pub keypoint_tie_break: KeypointTieBreak,
    pub degenerate_strings: DegenerateStrings,
}

impl TabConfig {
    pub const DEFAULT_CONFIDENCE: f64 = 0.25;
    pub const DEFAULT_LINE_LENGTH: usize = 60;

    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, TabError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| TabError::io("reading config file", e))?;
        let config = Self::from_json(&data)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self, TabError> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| TabError::json("parsing config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no block layout can honor.
    pub fn validate(&self) -> Result<(), TabError> {
        if self.line_length == 0 {
            return Err(TabError::config("line_length must be at least 1"));
        }
        Ok(())
    }

    /// Smallest span (px) the six-line string grid may cover.
    pub fn min_string_span(&self) -> f64 {
        5.0 * self.min_string_spacing
    }
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            fret_confidence: Self::DEFAULT_CONFIDENCE,
            string_confidence: Self::DEFAULT_CONFIDENCE,
            min_center_dist: 8.0,
            min_string_spacing: 12.0,
            velocity_threshold: 8.0,
            max_keypoint_dist: 5.0,
            line_length: Self::DEFAULT_LINE_LENGTH,
            fret_order: FretOrder::RightToLeft,
            keypoint_tie_break: KeypointTieBreak::HighestId,
            degenerate_strings: DegenerateStrings::Collapse,
        }
    }
}
