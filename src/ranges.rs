//! Detection of maximal runs of missed lines.

use crate::model::{Line, Marker, MissedRange};

/// Find every maximal run of missed markers, as 1-indexed inclusive line
/// ranges in ascending order.
#[must_use]
pub fn missed_ranges(markers: &[Marker]) -> Vec<MissedRange> {
    let mut ranges = Vec::new();
    let mut index = 0;

    while index < markers.len() {
        if !markers[index].is_missed() {
            index += 1;
            continue;
        }
        let start = index;
        let mut end = index;
        while end + 1 < markers.len() && markers[end + 1].is_missed() {
            end += 1;
        }
        ranges.push(MissedRange {
            start: line_number(start),
            end: line_number(end),
        });
        index = end + 1;
    }

    ranges
}

/// Same as [`missed_ranges`] for a JaCoCo `<line>` list, where line numbers
/// are explicit. JaCoCo omits lines it did not measure, so a gap in `nr`
/// closes a range just like a covered line does.
#[must_use]
pub fn missed_line_ranges(lines: &[Line]) -> Vec<MissedRange> {
    let mut ranges = Vec::new();
    let mut current: Option<MissedRange> = None;

    for line in lines {
        if !line.is_missed() {
            ranges.extend(current.take());
            continue;
        }
        current = match current {
            // Repeated line numbers are already inside the open range.
            Some(range) if (range.start..=range.end).contains(&line.nr) => Some(range),
            Some(range) if range.end.checked_add(1) == Some(line.nr) => Some(MissedRange {
                start: range.start,
                end: line.nr,
            }),
            Some(range) => {
                ranges.push(range);
                Some(MissedRange {
                    start: line.nr,
                    end: line.nr,
                })
            }
            None => Some(MissedRange {
                start: line.nr,
                end: line.nr,
            }),
        };
    }
    ranges.extend(current);

    ranges
}

fn line_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
