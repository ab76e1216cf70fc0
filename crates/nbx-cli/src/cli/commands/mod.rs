//! CLI command handlers. Each command is in its own file.

mod apply;
mod checksum;
mod facts;
mod history;
mod plan;
mod supported;

pub use apply::run_apply;
pub use checksum::run_checksum;
pub use facts::run_facts;
pub use history::run_history;
pub use plan::{load_and_compile, run_plan};
pub use supported::run_supported;
