//! `batchdl config` – show where the config lives and what it says.

use anyhow::Result;
use batchdl_core::config::{self, BatchdlConfig};

pub fn run_show_config(cfg: &BatchdlConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", config::render(cfg)?);
    Ok(())
}
