use crate::types::*;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// A closed stroke reduced to one note per fingertip and one fret per string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedStroke {
    pub start_frame: usize,
    pub end_frame: usize,
    /// Most frequent contact per fingertip across the stroke
    pub keypoint_notes: BTreeMap<FingerId, ContactLabel>,
    /// Most frequent fret per string; strings never touched are rests
    pub column: StrokeColumn,
}

/// Most frequent value in `items`. Ties go to the value seen first.
///
/// Counts are kept in first-seen order and a later value must strictly
/// beat the current leader, so the result depends only on sequence order.
pub fn mode<T, I>(items: I) -> Option<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let tallies = items
        .into_iter()
        .fold(Vec::<(T, usize)>::new(), |mut tallies, item| {
            match tallies.iter_mut().find(|(v, _)| *v == item) {
                Some((_, count)) => *count += 1,
                None => tallies.push((item, 1)),
            }
            tallies
        });

    tallies
        .into_iter()
        .fold(None, |best: Option<(T, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

/// Reduce a closed stroke to its tab column.
pub fn aggregate_stroke(stroke: &Stroke) -> AggregatedStroke {
    let mut keypoint_notes = BTreeMap::new();
    for id in FingerId::ALL {
        let labels = stroke
            .frames
            .iter()
            .filter_map(|f| f.contacts.get(&id).copied());
        if let Some(note) = mode(labels) {
            keypoint_notes.insert(id, note);
        }
    }

    let mut column = StrokeColumn::default();
    for string in StringLabel::ALL {
        let frets = stroke.frames.iter().flat_map(|f| {
            f.contacts
                .values()
                .filter(move |c| c.string == string)
                .map(|c| c.fret)
        });
        if let Some(fret) = mode(frets) {
            column.set(string, fret);
        }
    }

    debug!(
        "stroke {}..={} ({} frames) → {}",
        stroke.start_frame,
        stroke.end_frame,
        stroke.frames.len(),
        column
    );

    AggregatedStroke {
        start_frame: stroke.start_frame,
        end_frame: stroke.end_frame,
        keypoint_notes,
        column,
    }
}
