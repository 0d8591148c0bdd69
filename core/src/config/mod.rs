//! `genero.toml` settings.

#[cfg(test)]
mod config_test;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::{analysis::AnalysisSettings, ast::ParserOptions, context::ContextMap};

pub const CONFIG_FILE_NAME: &str = "genero.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneroConfig {
    pub parser: ParserSection,
    pub analysis: AnalysisSection,
    pub completion: CompletionSection,
    pub project: ProjectSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ParserSection {
    pub allow_anything_for_function_params: bool,
    pub allow_nested_select: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisSection {
    /// Added to the builtin names whose arguments are never counted.
    pub skip_validation_functions: Vec<String>,
    /// Added to the builtin names that accept a record without `.*`.
    pub non_star_record_functions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CompletionSection {
    pub context_map: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectSection {
    pub include_paths: Vec<PathBuf>,
}

impl GeneroConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid genero configuration")
    }

    /// Reads a config file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// `genero.toml` in `dir` when present, the defaults otherwise.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    fn rebase(&mut self, base: &Path) {
        if let Some(map) = self.completion.context_map.as_mut().filter(|p| p.is_relative()) {
            *map = base.join(&*map);
        }
        for include in self.project.include_paths.iter_mut().filter(|p| p.is_relative()) {
            *include = base.join(&*include);
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            allow_anything_for_function_params: self.parser.allow_anything_for_function_params,
            allow_nested_select: self.parser.allow_nested_select,
            ..ParserOptions::default()
        }
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings::default()
            .with_skip_validation(&self.analysis.skip_validation_functions)
            .with_non_star_record(&self.analysis.non_star_record_functions)
    }

    /// Installs the configured context map, if any, as the shared one.
    pub fn apply_context_map(&self) -> Result<bool> {
        match &self.completion.context_map {
            Some(path) => ContextMap::reload_from_path(path).map(|_| true),
            None => Ok(false),
        }
    }
}
