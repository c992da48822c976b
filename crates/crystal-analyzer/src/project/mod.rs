//! Project context for compiler invocations: the main (entry) file that
//! scopes the analysis, and the working directory the tool runs in.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;

const SHARD_FILENAME: &str = "shard.yml";
const WORKSPACE_ROOT_VAR: &str = "${workspaceRoot}";

/// The subset of `shard.yml` we care about: build targets and their entry
/// files. Everything else in the manifest is ignored.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ShardManifest {
    targets: BTreeMap<String, ShardTarget>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ShardTarget {
    main: Option<String>,
}

/// Walks parent directories from `start` looking for `shard.yml`.
/// Returns the path to the first one found, or `None`.
pub fn find_shard_yml(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() { start.parent()? } else { start };
    loop {
        let candidate = dir.join(SHARD_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Read a `shard.yml` and return the first target's `main` entry, resolved
/// relative to the manifest's directory.
///
/// Targets are ordered by name, so projects with several targets get a
/// deterministic pick.
pub fn main_file_from_shard(shard_path: &Path) -> Option<PathBuf> {
    let content = std::fs::read_to_string(shard_path).ok()?;
    let manifest: ShardManifest = serde_yaml::from_str(&content).ok()?;
    let dir = shard_path.parent()?;
    manifest
        .targets
        .values()
        .find_map(|target| target.main.as_ref())
        .map(|main| dir.join(main))
}

/// Resolve the file that scopes a compiler query for `document`.
///
/// Order: an explicit `mainFile` setting (with `${workspaceRoot}`
/// substitution), then the nearest `shard.yml` target, then the document
/// itself: a standalone script is its own entry point.
pub fn resolve_main_file(
    document: &Path,
    workspace_root: Option<&Path>,
    main_file_setting: Option<&str>,
) -> PathBuf {
    if let Some(setting) = main_file_setting {
        let expanded = expand_workspace_root(setting, workspace_root);
        if !expanded.trim().is_empty() {
            return PathBuf::from(expanded);
        }
    }

    if let Some(shard) = find_shard_yml(document) {
        if let Some(main) = main_file_from_shard(&shard) {
            return main;
        }
    }

    document.to_path_buf()
}

/// Substitute `${workspaceRoot}` in a settings value.
pub fn expand_workspace_root(value: &str, workspace_root: Option<&Path>) -> String {
    match workspace_root {
        Some(root) => value.replace(WORKSPACE_ROOT_VAR, &root.display().to_string()),
        None => value.to_string(),
    }
}

/// Directory the compiler subprocess runs in: the workspace root when the
/// editor supplied one, otherwise the document's own directory.
pub fn working_dir(document: &Path, workspace_root: Option<&Path>) -> Option<PathBuf> {
    workspace_root
        .map(Path::to_path_buf)
        .or_else(|| document.parent().map(Path::to_path_buf))
}

#[cfg(test)]
#[path = "../../tests/src/project/main_file_tests.rs"]
mod tests;
