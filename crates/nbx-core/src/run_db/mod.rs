//! Persistent convergence history (SQLite via sqlx).
//!
//! One row per `apply`: the NetBox version, the OS fact-set label, timing,
//! the overall outcome, and the full per-resource report as JSON.

pub mod db;
mod runs;
pub mod types;

pub use db::*;
pub use types::*;

#[cfg(test)]
mod tests;
