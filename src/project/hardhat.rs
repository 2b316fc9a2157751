use std::path::Path;

use eyre::{Result, eyre};

use super::{Project, ProjectType, project_name};

/// Load a Hardhat project from the given path.
///
/// Artifacts are read from the conventional `artifacts/` directory; a
/// custom `paths.artifacts` in the JS config needs `--artifacts`.
pub fn load_project(path: &Path) -> Result<Project> {
    let config_js = path.join("hardhat.config.js");
    let config_ts = path.join("hardhat.config.ts");

    if !config_js.exists() && !config_ts.exists() {
        return Err(eyre!(
            "hardhat.config.js or hardhat.config.ts not found at {:?}",
            path
        ));
    }

    Ok(Project {
        project_type: ProjectType::Hardhat,
        root: path.to_path_buf(),
        name: project_name(path),
        artifacts_dir: path.join("artifacts"),
    })
}
