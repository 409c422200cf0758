//! Output generation: persisted JSON tables and the console ranking.
//!
//! # Submodules
//!
//! - [`json`]: writes aggregated counts to `data/<source>_<stamp>.json`
//! - [`report`]: renders the top-N words for the terminal

pub mod json;
pub mod report;
