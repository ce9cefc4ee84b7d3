//! Course-catalog harvester for a Banner-based student information system.
//!
//! The crate crawls every subject of a range of academic terms, assembles a
//! normalized per-term snapshot, accumulates cross-term code dictionaries
//! (subject, attribute, restriction, and instructor codes), and persists both.
//! A post-processing step rewrites harvested snapshots using the accumulated
//! dictionaries so downstream consumers work with short codes instead of
//! display names.

pub mod cli;
pub mod codemaps;
pub mod config;
pub mod harvest;
pub mod logging;
pub mod postprocess;
pub mod sis;
pub mod util;
