//! nbx core: compile a NetBox install request into an ordered plan of
//! idempotent resource actions and converge a host toward it.

pub mod checksum;
pub mod config;
pub mod download;
pub mod executor;
pub mod extract;
pub mod facts;
pub mod host;
pub mod logging;
pub mod plan;
pub mod request;
pub mod retry;
pub mod run_db;
pub mod storage;
