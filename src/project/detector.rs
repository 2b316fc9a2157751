use std::path::Path;

use eyre::{Result, eyre};

use super::{Project, foundry, hardhat};

/// Detect the project type based on configuration files present in the directory
pub fn detect(path: &Path) -> Result<Project> {
    let foundry_config = path.join("foundry.toml");
    let hardhat_config_js = path.join("hardhat.config.js");
    let hardhat_config_ts = path.join("hardhat.config.ts");

    // Foundry wins in mixed projects
    if foundry_config.exists() {
        tracing::info!("Detected Foundry project at {:?}", path);
        return foundry::load_project(path);
    }

    if hardhat_config_js.exists() || hardhat_config_ts.exists() {
        tracing::info!("Detected Hardhat project at {:?}", path);
        return hardhat::load_project(path);
    }

    Err(eyre!(
        "No Foundry or Hardhat project detected at {:?}\n\
         Expected: foundry.toml, hardhat.config.js, or hardhat.config.ts\n\
         Use --artifacts to point at an artifact directory directly",
        path
    ))
}
