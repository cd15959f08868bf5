// Job postings: creation, listing, ownership checks and cascading delete.
// Candidates hang off a job; see crate::screening for upload and scoring.

pub mod handlers;
pub mod store;
