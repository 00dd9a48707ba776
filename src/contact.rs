use crate::config::{KeypointTieBreak, TabConfig};
use crate::fret_grid::FretGrid;
use crate::geometry::perpendicular_distance;
use crate::string_grid::StringGrid;
use crate::types::*;
use log::trace;

/// Map fingertips to (string, fret) contacts for one downstroke frame.
///
/// For each string line, the fingertips within `max_keypoint_dist` of the
/// line are candidates; one is chosen per `keypoint_tie_break`. The chosen
/// fingertip's fret is the nearest fret strictly to its left. Strings with
/// no candidate, or whose fingertip has no fret to the left, contribute
/// nothing.
///
/// The result is keyed by fingertip. A fingertip chosen by more than one
/// string keeps the label of the last such string (treble-most).
pub fn resolve_contacts(
    strings: &StringGrid,
    frets: &FretGrid,
    keypoints: &[Keypoint],
    config: &TabConfig,
) -> ContactMap {
    let mut contacts = ContactMap::new();
    if frets.is_empty() || keypoints.is_empty() {
        return contacts;
    }

    let direction = strings.tangent();
    for line in &strings.lines {
        let candidates: Vec<(&Keypoint, f64)> = keypoints
            .iter()
            .map(|k| (k, perpendicular_distance(line.center, direction, k.position)))
            .filter(|(_, d)| *d <= config.max_keypoint_dist)
            .collect();

        let chosen = match config.keypoint_tie_break {
            KeypointTieBreak::HighestId => candidates.iter().max_by_key(|(k, _)| k.id),
            KeypointTieBreak::Nearest => candidates
                .iter()
                .min_by(|(ka, da), (kb, db)| da.total_cmp(db).then(kb.id.cmp(&ka.id))),
        };
        let Some((keypoint, _)) = chosen else {
            continue;
        };

        let Some(fret) = frets.nearest_left_of(keypoint.position.x) else {
            trace!(
                "string {}: fingertip {} has no fret to its left",
                line.label,
                keypoint.id
            );
            continue;
        };

        contacts.insert(
            keypoint.id,
            ContactLabel {
                string: line.label,
                fret: fret.index,
            },
        );
    }
    contacts
}
