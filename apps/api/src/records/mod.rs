// Reusable records: sellers, witnesses and saved (draft) jobs.
// Plain single-statement writes; last write wins.

pub mod handlers;
pub mod jobs;
pub mod people;
