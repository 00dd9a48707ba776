pub mod aggregator;
pub mod annotation_log;
pub mod config;
pub mod contact;
pub mod detections_reader;
pub mod error;
pub mod fret_grid;
pub mod geometry;
pub mod landmarks;
pub mod segmenter;
pub mod string_grid;
pub mod tablature;
pub mod transcriber;
pub mod types;

pub use error::TabError;
