//! Command implementations.

mod info;
mod simulate;
mod validate;

pub use info::run_info;
pub use simulate::run_simulate;
pub use validate::run_validate;

use std::path::Path;

use contracts::SchedulerConfig;

use crate::error::{CliError, Result};

/// Load and validate a configuration file
fn load_config(path: &Path) -> Result<SchedulerConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path));
    }
    config_loader::ConfigLoader::load_from_path(path).map_err(|e| CliError::config_load(path, e))
}
