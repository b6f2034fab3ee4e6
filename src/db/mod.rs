//! Database module: entity models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: typed row and view models returned by repositories.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `az_tracker::db` — we re-export the
//! repository API and the row models for convenience.

pub mod model;
pub mod repo;

pub use model::{OwnedSegment, Segment, Zipcode, ZipcodeInfo, ZipcodeSummary};
pub use repo::*;
