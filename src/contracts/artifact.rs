use std::collections::HashMap;
use std::fs;
use std::path::Path;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::project::Project;

/// Compiled contract output: interface description plus creation code
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// Artifact JSON as written by Foundry, Hardhat or Truffle
#[derive(Debug, Deserialize)]
struct RawArtifact {
    #[serde(default)]
    abi: JsonAbi,
    bytecode: Option<RawBytecode>,
}

/// Foundry nests the creation code under `bytecode.object`,
/// Hardhat and Truffle store it as a plain hex string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn as_hex(&self) -> &str {
        match self {
            RawBytecode::Hex(hex) => hex,
            RawBytecode::Object { object } => object,
        }
    }
}

impl Artifact {
    pub fn new(abi: JsonAbi, bytecode: Bytes) -> Self {
        Self { abi, bytecode }
    }

    /// Parse an artifact JSON document.
    ///
    /// Returns `None` for artifacts without creation code (interfaces,
    /// abstract contracts).
    pub fn from_json(content: &str) -> Result<Option<Self>> {
        let raw: RawArtifact =
            serde_json::from_str(content).wrap_err("Failed to parse artifact JSON")?;

        let Some(bytecode) = raw.bytecode else {
            return Ok(None);
        };

        let hex_str = bytecode.as_hex();
        let clean = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        if clean.is_empty() {
            return Ok(None);
        }

        // Unlinked library placeholders (`__$…$__`) fail here
        let bytes = hex::decode(clean).wrap_err("Invalid bytecode hex")?;

        Ok(Some(Self::new(raw.abi, Bytes::from(bytes))))
    }
}

/// Contract name to artifact mapping, read-only once loaded
#[derive(Debug, Clone, Default)]
pub struct ArtifactTable {
    artifacts: HashMap<String, Artifact>,
}

impl ArtifactTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, artifact: Artifact) {
        self.artifacts.insert(name.into(), artifact);
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Contract names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.artifacts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load every artifact found in the project's output directory
    pub fn load(project: &Project) -> Result<Self> {
        tracing::info!(
            "Loading {} artifacts from {:?}",
            project.project_type,
            project.artifacts_dir
        );
        Self::load_dir(&project.artifacts_dir)
    }

    /// Load every artifact JSON below `dir`, keyed by file stem
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(eyre::eyre!(
                "Artifact directory does not exist: {:?}\n\
                 Compile the project first (forge build / npx hardhat compile)",
                dir
            ));
        }

        let mut table = Self::new();
        table.scan_dir(dir)?;

        tracing::info!("Found {} deployable artifacts", table.len());
        Ok(table)
    }

    fn scan_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).wrap_err_with(|| format!("Failed to read {:?}", dir))?;

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                // Compiler input/output dumps, not artifacts
                if path.file_name().is_some_and(|n| n == "build-info") {
                    continue;
                }
                self.scan_dir(&path)?;
            } else if is_artifact_file(&path) {
                self.load_file(&path);
            }
        }

        Ok(())
    }

    fn load_file(&mut self, path: &Path) {
        let Some(name) = artifact_name(path) else {
            return;
        };

        let artifact = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {:?}", path))
            .and_then(|content| Artifact::from_json(&content));

        match artifact {
            Ok(Some(artifact)) => {
                if self.artifacts.contains_key(name) {
                    tracing::warn!("Duplicate artifact {} at {:?}, keeping the last one", name, path);
                }
                tracing::debug!("Loaded artifact {} from {:?}", name, path);
                self.insert(name, artifact);
            }
            Ok(None) => tracing::debug!("Skipping {:?}: no bytecode", path),
            Err(e) => tracing::warn!("Failed to load {:?}: {:#}", path, e),
        }
    }
}

/// Contract name of an artifact file. Foundry appends the compiler version
/// when a contract is built with several solc versions (`Token.0.8.19.json`);
/// contract names never contain a dot.
fn artifact_name(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(".json")?;
    stem.split('.').next().filter(|name| !name.is_empty())
}

fn is_artifact_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".json") && !n.ends_with(".dbg.json"))
}
