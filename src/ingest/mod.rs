//! Turning submitted profiles and postings into records plus index entries.

pub mod error;
pub mod indexer;
pub mod parser;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{IngestError, IngestResult};
pub use indexer::{ProfileIndexer, candidate_sections, job_sections};
pub use parser::{JobDescriptionParser, parse_with_rules};
pub use types::{CandidateSubmission, JobMatch, JobPosting, MIN_EDUCATION, MIN_PROJECTS};
