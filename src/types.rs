use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Geometry ───────────────────────────────────────────────────────────────

/// A pixel-space point (or vector). Origin top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).norm()
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ─── Detector output ────────────────────────────────────────────────────────

/// Rotated rectangle produced by the fret or string detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians
    pub angle: f64,
    /// Detector score, 0.0–1.0. Only used to rank duplicates.
    pub confidence: f64,
}

/// Handedness label reported by the hand tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

/// One tracked hand: normalized (0–1) landmark coordinates, index = landmark id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub handedness: Hand,
    pub landmarks: Vec<[f64; 2]>,
}

/// Everything the external collaborators report for one video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame: usize,
    #[serde(default)]
    pub frets: Vec<OrientedBox>,
    #[serde(default)]
    pub strings: Vec<OrientedBox>,
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
}

// ─── Keypoints ──────────────────────────────────────────────────────────────

/// Fingertip landmark ids. Discriminants are the tracker's landmark ids,
/// and variants are declared in ascending id order so `Ord` is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FingerId {
    ThumbTip = 4,
    IndexTip = 8,
    MiddleTip = 12,
    RingTip = 16,
    PinkyTip = 20,
}

impl FingerId {
    pub const ALL: [FingerId; 5] = [
        FingerId::ThumbTip,
        FingerId::IndexTip,
        FingerId::MiddleTip,
        FingerId::RingTip,
        FingerId::PinkyTip,
    ];

    pub fn landmark_id(self) -> usize {
        self as u8 as usize
    }
}

impl fmt::Display for FingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.landmark_id())
    }
}

/// A retained fingertip in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub id: FingerId,
    pub position: Point,
    pub hand: Hand,
}

// ─── Grids ──────────────────────────────────────────────────────────────────

/// A detected fret after suppression and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FretEntry {
    pub position: Point,
    pub index: usize,
}

/// Guitar string names, low (bass) to high (treble).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StringLabel {
    #[serde(rename = "E")]
    LowE,
    A,
    D,
    G,
    B,
    #[serde(rename = "e")]
    HighE,
}

impl StringLabel {
    /// Bass to treble; also the top-to-bottom order strings are labelled in image space.
    pub const ALL: [StringLabel; 6] = [
        StringLabel::LowE,
        StringLabel::A,
        StringLabel::D,
        StringLabel::G,
        StringLabel::B,
        StringLabel::HighE,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StringLabel::LowE => "E",
            StringLabel::A => "A",
            StringLabel::D => "D",
            StringLabel::G => "G",
            StringLabel::B => "B",
            StringLabel::HighE => "e",
        }
    }
}

impl fmt::Display for StringLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One reconstructed string centerline. All six share the grid's angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StringLine {
    pub center: Point,
    pub label: StringLabel,
    pub angle: f64,
}

// ─── Contacts and strokes ───────────────────────────────────────────────────

/// A fingertip resolved to a (string, fret) pair in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactLabel {
    pub string: StringLabel,
    pub fret: usize,
}

impl fmt::Display for ContactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.string, self.fret)
    }
}

pub type ContactMap = BTreeMap<FingerId, ContactLabel>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeFrame {
    pub frame_index: usize,
    pub contacts: ContactMap,
}

/// A closed downstroke. `frames` is non-empty with strictly increasing indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub frames: Vec<StrokeFrame>,
    pub start_frame: usize,
    pub end_frame: usize,
}

/// One aggregated tab column: a fret per string, `None` = rest.
/// Indexed by `StringLabel::index()` (bass to treble).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrokeColumn {
    pub frets: [Option<usize>; 6],
}

impl StrokeColumn {
    pub fn get(&self, string: StringLabel) -> Option<usize> {
        self.frets[string.index()]
    }

    pub fn set(&mut self, string: StringLabel, fret: usize) {
        self.frets[string.index()] = Some(fret);
    }

    /// Render token for one string: fret digits or the rest marker.
    pub fn token(&self, string: StringLabel) -> String {
        match self.get(string) {
            Some(fret) => fret.to_string(),
            None => REST.to_string(),
        }
    }

    pub fn is_rest(&self) -> bool {
        self.frets.iter().all(Option::is_none)
    }
}

impl fmt::Display for StrokeColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = StringLabel::ALL
            .iter()
            .map(|s| format!("{}={}", s, self.token(*s)))
            .collect();
        write!(f, "[{}]", parts.join(" "))
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

/// Rest marker used for silence and padding in tablature.
pub const REST: char = '-';

pub const NUM_STRINGS: usize = 6;
