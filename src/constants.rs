//! Cross-cutting, shared constants.
//!
//! Every vector stored in an index has exactly the dimension the index was created with; the
//! embedding provider must agree with it. [`DEFAULT_EMBEDDING_DIM`] is the configured default.

pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Upper bound on nearest-neighbour hits requested per job ("effectively all").
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Fraction of ranked candidates that survive the shortlist.
pub const SHORTLIST_KEEP_RATIO: f64 = 0.4;

pub const DEFAULT_EVAL_CONCURRENCY: usize = 5;
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 30;

/// Max characters of any free-text excerpt handed to the scoring provider.
pub const SUMMARY_EXCERPT_CHARS: usize = 500;

/// Recommendation label attached to degraded evaluations.
pub const EVALUATION_ERROR_LABEL: &str = "Error in evaluation";
