//! Listing order shared by every backend.

use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::domain::entities::Entry;

/// The timestamp an entry is ordered by: its publication date, falling back to
/// its creation time.
pub fn primary_time(entry: &Entry) -> Option<OffsetDateTime> {
    entry.date().or(entry.created())
}

/// Newest first; ties broken by id, descending.
pub fn newest_first(a: &Entry, b: &Entry) -> Ordering {
    primary_time(b)
        .cmp(&primary_time(a))
        .then_with(|| b.id().cmp(&a.id()))
}

pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(newest_first);
}
