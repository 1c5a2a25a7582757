//! Core [`DefinitionLoader`] struct: filesystem-backed definition loading.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::schema::{ArtifactDefinition, CheckDefinition, Definition, DefinitionEnvelope};

use super::error::{DefinitionError, LoadResult, LoadStatus, Result};

/// Filesystem-backed definition loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, deserializes
/// every document in them into a [`Definition`] via two-pass deserialization,
/// and keeps artifacts and checks in maps keyed by name / check id.
pub struct DefinitionLoader {
    /// Root directory containing definition YAML files.
    definitions_dir: PathBuf,
    artifacts: BTreeMap<String, ArtifactDefinition>,
    checks: BTreeMap<String, CheckDefinition>,
}

impl DefinitionLoader {
    /// Create a new loader for the given directory. Nothing is read until
    /// [`load_all`](Self::load_all).
    pub fn new(definitions_dir: PathBuf) -> Self {
        Self {
            definitions_dir,
            artifacts: BTreeMap::new(),
            checks: BTreeMap::new(),
        }
    }

    /// Recursively scan the definitions directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. A file that fails to parse,
    /// fails validation or redefines an already loaded id is reported as
    /// [`LoadStatus::Failed`] and contributes nothing; the scan continues.
    /// Files are visited in sorted path order so duplicate resolution is
    /// deterministic.
    pub fn load_all(&mut self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        if !self.definitions_dir.is_dir() {
            warn!(path = %self.definitions_dir.display(), "definitions directory does not exist");
            return Ok(results);
        }
        let dir = self.definitions_dir.clone();
        self.scan_dir_recursive(&dir, &mut results)?;
        info!(
            artifacts = self.artifacts.len(),
            checks = self.checks.len(),
            files = results.len(),
            "definitions loaded"
        );
        Ok(results)
    }

    fn scan_dir_recursive(&mut self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path).and_then(|docs| self.insert_all(docs)) {
                Ok(ids) if ids.is_empty() => LoadStatus::Skipped {
                    reason: "no definitions".to_string(),
                },
                Ok(ids) => {
                    info!(path = %path.display(), count = ids.len(), "loaded definitions");
                    LoadStatus::Loaded { ids }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load definition file");
                    LoadStatus::Failed { error: e.to_string() }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Insert a file's definitions, all or nothing.
    fn insert_all(&mut self, docs: Vec<Definition>) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        for doc in &docs {
            let taken = match doc {
                Definition::Artifact(a) => self.artifacts.contains_key(&a.name),
                Definition::Check(c) => self.checks.contains_key(&c.check_id),
            };
            if taken || !seen.insert((doc.kind(), doc.id())) {
                return Err(DefinitionError::Validation(format!(
                    "duplicate {} '{}'",
                    doc.kind(),
                    doc.id()
                )));
            }
        }

        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(doc.id().to_string());
            debug!(id = %doc.id(), kind = %doc.kind(), "registered definition");
            match doc {
                Definition::Artifact(a) => {
                    self.artifacts.insert(a.name.clone(), a);
                }
                Definition::Check(c) => {
                    self.checks.insert(c.check_id.clone(), c);
                }
            }
        }
        Ok(ids)
    }

    /// Parse a single YAML file into its definitions, in document order.
    ///
    /// First pass: deserialize each document as [`DefinitionEnvelope`] to read
    /// the `kind` field. Second pass: deserialize into the kind-specific type,
    /// then validate. Empty documents are ignored.
    pub fn load_file(&self, path: &Path) -> Result<Vec<Definition>> {
        let contents = fs::read_to_string(path)?;
        let mut definitions = Vec::new();

        for document in serde_yaml::Deserializer::from_str(&contents) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }

            let envelope: DefinitionEnvelope = serde_yaml::from_value(value)?;
            let definition = envelope.parse_full().map_err(|e| {
                DefinitionError::Validation(format!(
                    "failed to parse {} definition: {}",
                    envelope.kind, e
                ))
            })?;
            definition.validate().map_err(DefinitionError::Validation)?;
            definitions.push(definition);
        }

        Ok(definitions)
    }

    /// Get the definitions directory path.
    pub fn definitions_dir(&self) -> &Path {
        &self.definitions_dir
    }

    /// Loaded artifacts keyed by name.
    pub fn artifacts(&self) -> &BTreeMap<String, ArtifactDefinition> {
        &self.artifacts
    }

    /// Loaded checks keyed by check id.
    pub fn checks(&self) -> &BTreeMap<String, CheckDefinition> {
        &self.checks
    }
}
