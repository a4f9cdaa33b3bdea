//! Field-level change detection for entry mutations.
//!
//! Every audited field is listed once in [`AUDITED_FIELDS`] together with the
//! function that renders it as text. Diffs compare the rendered forms, so two
//! values are "equal" exactly when their audit text is equal.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::entities::{Entry, FieldChange};

type Render = fn(&Entry) -> String;

/// Ordered table of audited fields.
pub const AUDITED_FIELDS: &[(&str, Render)] = &[
    ("date", render_date),
    ("title", render_title),
    ("slug", render_slug),
    ("description", render_description),
    ("body", render_body),
    ("thumbnail", render_thumbnail),
    ("cover", render_cover),
    ("tags", render_tags),
    ("author", render_author),
    ("deleted", render_deleted),
];

fn render_title(entry: &Entry) -> String {
    entry.title().to_string()
}

fn render_slug(entry: &Entry) -> String {
    entry.slug().to_string()
}

fn render_description(entry: &Entry) -> String {
    entry.description().to_string()
}

fn render_body(entry: &Entry) -> String {
    entry.body().to_string()
}

fn render_thumbnail(entry: &Entry) -> String {
    entry.thumbnail().to_string()
}

fn render_cover(entry: &Entry) -> String {
    entry.cover().to_string()
}

fn render_tags(entry: &Entry) -> String {
    entry.tags().join(", ")
}

fn render_author(entry: &Entry) -> String {
    entry.author_id().unwrap_or_default().to_string()
}

fn render_deleted(entry: &Entry) -> String {
    if entry.deleted() {
        "true".to_string()
    } else {
        String::new()
    }
}

fn render_date(entry: &Entry) -> String {
    format_timestamp(entry.date())
}

/// RFC 3339 text truncated to whole seconds; empty for `None`.
pub fn format_timestamp(date: Option<OffsetDateTime>) -> String {
    date.and_then(|value| value.replace_nanosecond(0).ok())
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_default()
}

/// Fields whose rendered value differs between `current` and `incoming`.
pub fn diff_entries(current: &Entry, incoming: &Entry) -> Vec<FieldChange> {
    AUDITED_FIELDS
        .iter()
        .filter_map(|&(field, render)| {
            let old_value = render(current);
            let new_value = render(incoming);
            (old_value != new_value).then(|| FieldChange {
                field,
                old_value: display_bool(field, old_value),
                new_value: display_bool(field, new_value),
            })
        })
        .collect()
}

/// Every populated field of a new entry, recorded with an empty old value.
pub fn creation_changes(entry: &Entry) -> Vec<FieldChange> {
    AUDITED_FIELDS
        .iter()
        .filter_map(|&(field, render)| {
            let new_value = render(entry);
            (!new_value.is_empty()).then(|| FieldChange {
                field,
                old_value: String::new(),
                new_value,
            })
        })
        .collect()
}

// `deleted` renders empty when false so creation batches skip it; diffs spell
// both sides out.
fn display_bool(field: &str, value: String) -> String {
    if field == "deleted" && value.is_empty() {
        "false".to_string()
    } else {
        value
    }
}
