//! `patchwork-recon`: two-dataset reconciliation engine.
//!
//! Stitches a "left" and a "right" dataset into one quilt: an exact key pass
//! (full outer join) followed by a fuzzy pass on text fields, every row tagged
//! with how it was matched and numbered with a `patch_id`.
//!
//! Pure engine crate: receives pre-loaded datasets, returns the quilt.
//! `csv_io` is the only place that speaks a file format.

pub mod config;
pub mod csv_io;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod similarity;

pub use config::{KeyOptions, KeyOrder, NullKeys, OrphanLabel, PatchworkConfig, ReconConfig};
pub use engine::{reconcile, run, Reconciler};
pub use error::ReconError;
pub use matcher::{match_by_fuzzy, match_by_key};
pub use model::{namespace, Dataset, MarriageType, ReconInput, ReconResult, Row, Side, Value};
pub use similarity::{IndelRatio, Similarity};
