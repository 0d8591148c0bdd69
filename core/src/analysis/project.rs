use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::{
    analysis::AnalysisResult,
    ast::{ModuleNode, ParserOptions, parse_module},
};

/// Cross-file collaborators of an analysis: the modules a module includes
/// through `globals "file"` and the projects it references.
pub trait ProjectGraph: Send + Sync {
    fn included_modules(&self, module: &ModuleNode) -> Vec<Arc<ModuleNode>>;

    fn referenced_projects(&self) -> Vec<Arc<Project>>;

    /// Modules that `import fgl` can name.
    fn module_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Include keys ignore directories and case: `globals "../Common.4gl"`
/// and `common.4gl` name the same module.
fn include_key(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| path.to_ascii_lowercase())
}

/// Parsed modules of one program, keyed by path. Modules may be added from
/// several threads.
#[derive(Debug, Default)]
pub struct Project {
    pub name: String,
    modules: DashMap<String, Arc<ModuleNode>>,
    search_paths: Vec<PathBuf>,
    references: Vec<Arc<Project>>,
    options: ParserOptions,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_paths.extend(paths);
        self
    }

    pub fn with_reference(mut self, project: Arc<Project>) -> Self {
        self.references.push(project);
        self
    }

    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add_module(&self, path: impl Into<String>, module: ModuleNode) -> Arc<ModuleNode> {
        let module = Arc::new(module);
        self.modules.insert(path.into(), module.clone());
        module
    }

    /// Parses `source` and stores the result under `path`. Diagnostics are
    /// left to the caller, who re-parses when it needs them.
    pub fn parse_and_add(&self, path: &str, source: &str) -> Arc<ModuleNode> {
        let options = self.options.clone().with_file_path(path);
        let output = parse_module(source, &options);
        debug!(project = %self.name, path, diagnostics = output.diagnostics.len(), "module added");
        self.add_module(path, output.module)
    }

    pub fn get(&self, path: &str) -> Option<Arc<ModuleNode>> {
        self.modules.get(path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_with_id(&self, id: u64) -> Option<Arc<ModuleNode>> {
        self.modules
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.modules.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Finds a public function, module variable, type or constant exported
    /// by any module of the project.
    pub fn find_public(&self, name: &str) -> Option<AnalysisResult> {
        for entry in self.modules.iter() {
            let module = entry.value();
            if let Some(function) = module.function(name).filter(|f| f.is_public()) {
                return Some(AnalysisResult::Function(function.clone()));
            }
            if let Some(var) = module.symbols.variables.get(name).filter(|v| v.is_public) {
                return Some(AnalysisResult::Variable(var.clone()));
            }
            if let Some(def) = module.symbols.types.get(name).filter(|t| t.is_public) {
                return Some(AnalysisResult::Type(def.clone()));
            }
            if let Some(def) = module.symbols.constants.get(name).filter(|c| c.is_public) {
                return Some(AnalysisResult::Constant(def.clone()));
            }
        }
        None
    }

    /// Everything [`Project::find_public`] can return, for completion.
    pub fn public_members(&self) -> Vec<AnalysisResult> {
        let mut members = Vec::new();
        for entry in self.modules.iter() {
            let module = entry.value();
            members.extend(module.public_functions().cloned().map(AnalysisResult::Function));
            members.extend(
                module
                    .symbols
                    .variables
                    .values()
                    .filter(|v| v.is_public)
                    .cloned()
                    .map(AnalysisResult::Variable),
            );
            members.extend(module.symbols.types.values().filter(|t| t.is_public).cloned().map(AnalysisResult::Type));
            members.extend(
                module
                    .symbols
                    .constants
                    .values()
                    .filter(|c| c.is_public)
                    .cloned()
                    .map(AnalysisResult::Constant),
            );
        }
        members
    }

    /// The module for an include, parsed from the search paths on first use.
    pub fn load_include(&self, file: &str) -> Result<Arc<ModuleNode>> {
        let key = include_key(file);
        if let Some(module) = self.modules.iter().find(|entry| include_key(entry.key()) == key) {
            return Ok(module.value().clone());
        }
        let candidate = self
            .search_paths
            .iter()
            .map(|dir| dir.join(file))
            .chain(std::iter::once(PathBuf::from(file)))
            .find(|path| path.is_file())
            .with_context(|| format!("include file {} not found in search paths", file))?;
        let source = std::fs::read_to_string(&candidate)
            .with_context(|| format!("failed to read include file {}", candidate.display()))?;
        Ok(self.parse_and_add(&candidate.to_string_lossy(), &source))
    }
}

impl ProjectGraph for Project {
    fn included_modules(&self, module: &ModuleNode) -> Vec<Arc<ModuleNode>> {
        module
            .includes
            .iter()
            .filter_map(|file| match self.load_include(file) {
                Ok(included) => Some(included),
                Err(err) => {
                    warn!("{:#}", err);
                    None
                }
            })
            .collect()
    }

    fn referenced_projects(&self) -> Vec<Arc<Project>> {
        self.references.clone()
    }

    fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .paths()
            .iter()
            .filter_map(|path| Path::new(path).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        names.dedup();
        names
    }
}

/// A graph with fixed contents, for callers that manage parsing themselves.
#[derive(Debug, Default)]
pub struct StaticProjectGraph {
    includes: DashMap<String, Arc<ModuleNode>>,
    references: Vec<Arc<Project>>,
}

impl StaticProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(self, file: &str, module: ModuleNode) -> Self {
        self.includes.insert(include_key(file), Arc::new(module));
        self
    }

    pub fn with_reference(mut self, project: Arc<Project>) -> Self {
        self.references.push(project);
        self
    }
}

impl ProjectGraph for StaticProjectGraph {
    fn included_modules(&self, module: &ModuleNode) -> Vec<Arc<ModuleNode>> {
        module
            .includes
            .iter()
            .filter_map(|file| self.includes.get(&include_key(file)).map(|entry| entry.value().clone()))
            .collect()
    }

    fn referenced_projects(&self) -> Vec<Arc<Project>> {
        self.references.clone()
    }
}
