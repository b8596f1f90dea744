//! Generator configuration (`modgen.toml`).
//!
//! Every relative path in the file is resolved against the directory that
//! holds it, so a project builds the same way from any working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::codegen::{self, Backend, Layout, PartialDirs, Partials, RenderOptions, Renderer};
use crate::diagnostic::ModgenError;
use crate::ir::CollectOptions;
use crate::schema::{SchemaLoader, SchemaSource, DEFAULT_SCHEMA_URL};

/// File name looked up when a directory is given.
pub const CONFIG_FILE: &str = "modgen.toml";

/// Starter configuration written by `modgen init`.
pub const SAMPLE_CONFIG: &str = r#"# modgen configuration. Relative paths resolve against this file.

[schema]
# URL or local path of objects_and_components.json.
source = "https://www.newgrounds.io/help/objects_and_components.json"
# Holds the downloaded document and its Last-Modified stamp.
cache_dir = ".modgen"
# Emit a result class for every method, even without a declared return.
permissive_results = true

[aliases]
js = "javascript"
cs = "csharp"
as2 = "actionscript2"

[targets.javascript]
index_file = "js/NewgroundsIO/ObjectIndex.js"
runtime_module = "js/NewgroundsIO/runtime.js"

[targets.javascript.output_dirs]
objects = "js/NewgroundsIO/objects"
components = "js/NewgroundsIO/components"
results = "js/NewgroundsIO/results"

[targets.javascript.partial_dirs]
objects = "partials/js/objects"
components = "partials/js/components"
results = "partials/js/results"

[targets.csharp]
index_file = "cs/NewgroundsIO/ObjectIndex.cs"

[targets.csharp.output_dirs]
objects = "cs/NewgroundsIO/objects"
components = "cs/NewgroundsIO/components"
results = "cs/NewgroundsIO/results"

[targets.csharp.partial_dirs]
objects = "partials/cs/objects"
components = "partials/cs/components"
results = "partials/cs/results"

# Renames object classes whose schema name clashes with the target language.
# [targets.csharp.class_names]
# Error = "NgioError"

[targets.actionscript2]
namespace = "io.newgrounds.models"
index_file = "as2/io/newgrounds/models/objects/ObjectIndex.as"

[targets.actionscript2.output_dirs]
objects = "as2/io/newgrounds/models/objects"
components = "as2/io/newgrounds/models/components"
results = "as2/io/newgrounds/models/results"

[targets.actionscript2.partial_dirs]
objects = "partials/as2/objects"
components = "partials/as2/components"
results = "partials/as2/results"
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaSection {
    pub source: String,
    pub cache_dir: PathBuf,
    pub permissive_results: bool,
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            source: DEFAULT_SCHEMA_URL.to_string(),
            cache_dir: PathBuf::from(".modgen"),
            permissive_results: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputDirs {
    pub objects: PathBuf,
    pub components: PathBuf,
    pub results: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialDirsSection {
    pub objects: Option<PathBuf>,
    pub components: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

/// One `[targets.<name>]` table as written.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSection {
    /// Defaults to the target name.
    pub backend: Option<String>,
    pub file_extension: Option<String>,
    pub namespace: Option<String>,
    pub index_file: Option<PathBuf>,
    pub runtime_module: Option<PathBuf>,
    pub output_dirs: OutputDirs,
    #[serde(default)]
    pub partial_dirs: PartialDirsSection,
    #[serde(default)]
    pub class_names: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    schema: SchemaSection,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    targets: BTreeMap<String, TargetSection>,
}

/// A loaded `modgen.toml`.
#[derive(Debug, Clone)]
pub struct ModgenConfig {
    /// The config file itself.
    pub path: PathBuf,
    /// Directory relative paths resolve against.
    pub root: PathBuf,
    pub schema: SchemaSection,
    pub aliases: BTreeMap<String, String>,
    pub targets: BTreeMap<String, TargetSection>,
}

/// A target with every path resolved and every default applied.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub backend: Backend,
    pub layout: Layout,
    pub options: RenderOptions,
    pub partial_dirs: PartialDirs,
}

impl Target {
    pub fn renderer(&self) -> Box<dyn Renderer> {
        codegen::create_renderer(self.backend, self.layout.clone(), self.options.clone())
    }

    pub fn partials(&self) -> Result<Partials, ModgenError> {
        Partials::scan(&self.partial_dirs, &self.layout.file_extension)
    }
}

impl ModgenConfig {
    /// Loads a config file, or `modgen.toml` inside a directory.
    pub fn load(path: &Path) -> Result<Self, ModgenError> {
        let path = if path.is_dir() { path.join(CONFIG_FILE) } else { path.to_path_buf() };
        if !path.is_file() {
            return Err(ModgenError::ConfigNotFound { path });
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ModgenError::io(&path, e))?;
        Self::parse(&text, &path)
    }

    /// Parses config text as if it were read from `path`.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ModgenError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ModgenError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            path: path.to_path_buf(),
            root,
            schema: raw.schema,
            aliases: raw.aliases,
            targets: raw.targets,
        })
    }

    /// Writes [`SAMPLE_CONFIG`] into `dir` and creates its partial directories.
    pub fn init(dir: &Path, force: bool) -> Result<Self, ModgenError> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() && !force {
            return Err(ModgenError::ConfigExists { path });
        }

        crate::output::write_file(&path, SAMPLE_CONFIG)?;
        let config = Self::load(&path)?;

        for name in config.target_names() {
            let target = config.target(name)?;
            let dirs = &target.partial_dirs;
            for dir in [&dirs.objects, &dirs.components, &dirs.results].into_iter().flatten() {
                crate::output::ensure_dir(dir)?;
            }
        }

        tracing::info!(path = %path.display(), "wrote starter config");
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn schema_source(&self) -> SchemaSource {
        SchemaSource::parse(&self.schema.source, &self.root)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.resolve(&self.schema.cache_dir)
    }

    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            permissive_results: self.schema.permissive_results,
        }
    }

    pub fn schema_loader(&self) -> Result<SchemaLoader, ModgenError> {
        SchemaLoader::new(self.schema_source(), self.cache_dir())
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    /// Resolves a target or alias name, ignoring case.
    pub fn target(&self, name: &str) -> Result<Target, ModgenError> {
        let canonical = self
            .find_target(name)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                    .and_then(|(_, target)| self.find_target(target))
            })
            .ok_or_else(|| ModgenError::UnknownTarget {
                name: name.to_string(),
                available: self.target_names().join(", "),
            })?;

        let section = &self.targets[canonical];
        self.resolve_target(canonical, section)
    }

    /// The named targets, or every configured target when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<Target>, ModgenError> {
        if names.is_empty() {
            return self
                .targets
                .iter()
                .map(|(name, section)| self.resolve_target(name, section))
                .collect();
        }
        names.iter().map(|name| self.target(name)).collect()
    }

    /// Files and directories whose changes should trigger a rebuild.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.path.clone()];
        if let SchemaSource::Local(schema) = self.schema_source() {
            paths.push(schema);
        }
        for section in self.targets.values() {
            let dirs = &section.partial_dirs;
            for dir in [&dirs.objects, &dirs.components, &dirs.results].into_iter().flatten() {
                let dir = self.resolve(dir);
                if dir.is_dir() && !paths.contains(&dir) {
                    paths.push(dir);
                }
            }
        }
        paths
    }

    fn find_target(&self, name: &str) -> Option<&str> {
        self.targets
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    fn resolve_target(&self, name: &str, section: &TargetSection) -> Result<Target, ModgenError> {
        let backend: Backend = section.backend.as_deref().unwrap_or(name).parse()?;
        let resolve_opt = |p: &Option<PathBuf>| p.as_deref().map(|p| self.resolve(p));

        Ok(Target {
            name: name.to_string(),
            backend,
            layout: Layout {
                objects_dir: self.resolve(&section.output_dirs.objects),
                components_dir: self.resolve(&section.output_dirs.components),
                results_dir: self.resolve(&section.output_dirs.results),
                index_file: resolve_opt(&section.index_file),
                file_extension: section
                    .file_extension
                    .clone()
                    .unwrap_or_else(|| backend.default_extension().to_string()),
                runtime_module: resolve_opt(&section.runtime_module),
            },
            options: RenderOptions {
                namespace: section
                    .namespace
                    .clone()
                    .unwrap_or_else(|| backend.default_namespace().to_string()),
                class_names: section.class_names.clone(),
            },
            partial_dirs: PartialDirs {
                objects: resolve_opt(&section.partial_dirs.objects),
                components: resolve_opt(&section.partial_dirs.components),
                results: resolve_opt(&section.partial_dirs.results),
            },
        })
    }
}
