mod commands;
mod manifest;
mod simulate;

pub use commands::Commands;
pub use manifest::{run_check, run_manifest, run_permissions, run_storages};
pub use simulate::run_simulate;
