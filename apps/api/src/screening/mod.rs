// Resume screening: PDF extraction, info extraction, similarity and criteria scoring.
// process_resume (processor.rs) is the only entry point the web layer calls.

pub mod criteria;
pub mod extractor;
pub mod handlers;
pub mod info;
pub mod processor;
pub mod similarity;
pub mod store;
