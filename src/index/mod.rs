//! Exact nearest-neighbour index over profile embeddings.
//!
//! [`FlatIndex`] holds unit-length vectors and a parallel label table, [`SharedIndex`] wraps one
//! instance for concurrent use, and [`IndexLabel`] gives the opaque labels a typed shape.

pub mod error;
pub mod flat;
pub mod label;
pub mod math;
pub mod persist;
pub mod shared;


pub use error::{IndexError, IndexResult, LabelError};
pub use flat::{FlatIndex, SearchHit};
pub use label::{EntityKind, IndexLabel, Section};
pub use persist::{
    CURRENT_FILENAME, LABELS_FILENAME, VECTORS_FILENAME, current_generation_dir,
};
pub use shared::{LabeledHit, SharedIndex};
