//! Group-path derivation.
//!
//! Directory paths are colon-delimited and fully derived from the base
//! path, term id, course name, and subgroup name. A child path appends
//! `<last-segment-of-parent>-<child>` as a new segment, e.g.
//! `edu:classes` + `2192` → `edu:classes:classes-2192`.

/// Returns the child path of `parent` for `child`.
pub fn child_id(parent: &str, child: &str) -> String {
    let last = parent.rsplit(':').next().unwrap_or(parent);
    format!("{parent}:{last}-{child}")
}

/// Returns the conventional course name, e.g. `stat-243`. The subject
/// area is expected to be lowercased by the caller.
pub fn course_name(subject_area: &str, catalog_number: &str) -> String {
    format!("{subject_area}-{catalog_number}")
}
