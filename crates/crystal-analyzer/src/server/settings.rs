use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

pub(crate) const SETTINGS_SECTION_KEY: &str = "crystal-analyzer";

pub(crate) const DEFAULT_COMPILER_PATH: &str = "crystal";
pub(crate) const DEFAULT_CONCURRENT_INVOCATIONS: usize = 3;
pub(crate) const MIN_CONCURRENT_INVOCATIONS: usize = 1;
pub(crate) const MAX_CONCURRENT_INVOCATIONS: usize = 8;

/// Runtime server configuration, updated from LSP
/// `workspace/didChangeConfiguration` payloads.
///
/// Payloads arrive either namespaced under a `crystal-analyzer` key or as a
/// direct object; partial payloads patch the current settings rather than
/// resetting them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    pub compiler: CompilerSettings,
    pub implementations: ImplementationsSettings,
    pub problems: ProblemsSettings,
    /// Explicit project entry file; `${workspaceRoot}` is substituted.
    /// When unset the entry file comes from `shard.yml`.
    pub main_file: Option<String>,
    pub logging: LoggingSettings,
}

impl ServerSettings {
    pub fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn merged_with_payload(&self, payload: &Value) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<ServerSettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    fn apply_patch(&mut self, patch: ServerSettingsPatch) {
        if let Some(compiler) = patch.compiler {
            self.compiler.apply_patch(compiler);
        }
        if let Some(implementations) = patch.implementations {
            self.implementations.apply_patch(implementations);
        }
        if let Some(problems) = patch.problems {
            self.problems.apply_patch(problems);
        }
        if let Some(main_file) = patch.main_file {
            self.main_file = Some(main_file);
        }
        if let Some(logging) = patch.logging {
            self.logging.apply_patch(logging);
        }
    }

    fn normalize(&mut self) {
        self.compiler.normalize();
        self.implementations.normalize();
        self.main_file = self
            .main_file
            .as_ref()
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    /// Path to (or name of) the `crystal` executable.
    pub path: String,
    /// Extra environment variables for compiler subprocesses, layered over
    /// the server's own environment.
    pub env: BTreeMap<String, String>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_COMPILER_PATH.to_string(),
            env: BTreeMap::new(),
        }
    }
}

impl CompilerSettings {
    fn apply_patch(&mut self, patch: CompilerSettingsPatch) {
        if let Some(path) = patch.path {
            self.path = path;
        }
        if let Some(env) = patch.env {
            self.env = env;
        }
    }

    fn normalize(&mut self) {
        self.path = self.path.trim().to_string();
        if self.path.is_empty() {
            self.path = DEFAULT_COMPILER_PATH.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationsSettings {
    pub enable: bool,
    /// Upper bound on simultaneously running compiler invocations.
    pub max_concurrent: usize,
}

impl Default for ImplementationsSettings {
    fn default() -> Self {
        Self {
            enable: true,
            max_concurrent: DEFAULT_CONCURRENT_INVOCATIONS,
        }
    }
}

impl ImplementationsSettings {
    fn apply_patch(&mut self, patch: ImplementationsSettingsPatch) {
        if let Some(enable) = patch.enable {
            self.enable = enable;
        }
        if let Some(max_concurrent) = patch.max_concurrent {
            self.max_concurrent = max_concurrent;
        }
    }

    fn normalize(&mut self) {
        self.max_concurrent = self
            .max_concurrent
            .clamp(MIN_CONCURRENT_INVOCATIONS, MAX_CONCURRENT_INVOCATIONS);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemsSettings {
    /// Publish compiler errors found in tool output as diagnostics.
    pub enable: bool,
}

impl Default for ProblemsSettings {
    fn default() -> Self {
        Self { enable: true }
    }
}

impl ProblemsSettings {
    fn apply_patch(&mut self, patch: ProblemsSettingsPatch) {
        if let Some(enable) = patch.enable {
            self.enable = enable;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

impl LoggingSettings {
    fn apply_patch(&mut self, patch: LoggingSettingsPatch) {
        if let Some(level) = patch.level {
            self.level = level;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn allows_info(self) -> bool {
        self >= LogLevel::Info
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ServerSettingsPatch {
    compiler: Option<CompilerSettingsPatch>,
    implementations: Option<ImplementationsSettingsPatch>,
    problems: Option<ProblemsSettingsPatch>,
    main_file: Option<String>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct CompilerSettingsPatch {
    path: Option<String>,
    env: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ImplementationsSettingsPatch {
    enable: Option<bool>,
    max_concurrent: Option<usize>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ProblemsSettingsPatch {
    enable: Option<bool>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct LoggingSettingsPatch {
    level: Option<LogLevel>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());

    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }

    candidates
}

#[cfg(test)]
#[path = "../../tests/src/server/settings_tests.rs"]
mod tests;
