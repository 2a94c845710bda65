//! Shared test-only fixtures for mergeflow_core.

use crate::models::{Document, Member};
use chrono::{DateTime, TimeZone, Utc};

/// Timestamp `millis` after the Unix epoch.
///
/// # Panics
/// Panics when `millis` is out of chrono's range.
pub(crate) fn at_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().expect("valid millis")
}

/// Plain file with a creation timestamp.
pub(crate) fn file_at(id: &str, name: &str, extension: &str, millis: i64) -> Document {
    let mut doc = Document::file(id, name, extension);
    doc.date_created = Some(at_millis(millis));
    doc
}

/// `folders` folders followed by `files` text files, ids `f0..` and `d0..`.
pub(crate) fn folders_and_files(folders: usize, files: usize) -> Vec<Document> {
    let mut docs: Vec<Document> = (0..folders)
        .map(|idx| Document::folder(format!("f{idx}"), format!("Folder {idx}")))
        .collect();
    docs.extend((0..files).map(|idx| {
        Document::file(format!("d{idx}"), format!("note-{idx}.txt"), "txt")
    }));
    docs
}

/// Members with mixed roles; `role` is left unset on one so the type fallback applies.
pub(crate) fn sample_members() -> Vec<Member> {
    let rows = [
        ("m1", "Ana", "ana@team.io", Some("Leader"), None),
        ("m2", "Bo", "bo@team.io", Some("backend developer"), None),
        ("m3", "Cy", "cy@team.io", None, Some("leader")),
        ("m4", "Di", "di@team.io", Some("ui/ux designer"), None),
    ];
    rows.into_iter()
        .map(|(id, name, email, role, member_type)| {
            let mut member = Member::new(id, name, email);
            member.role = role.map(str::to_string);
            member.member_type = member_type.map(str::to_string);
            member
        })
        .collect()
}
