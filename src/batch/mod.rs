//! # Batch Processing
//!
//! Discovers matching videos under a folder and transforms each one as an
//! independent job on a worker pool.

pub mod discovery;
pub mod dispatcher;

pub use discovery::{basename_collisions, discover_videos, matches_extension, output_path_for};
pub use dispatcher::{BatchDispatcher, BatchReport, Job, JobOutcome};
