//! Source generation from the collected schema model.
//!
//! One [`Renderer`] exists per target language. They all read the same
//! [`SchemaModel`] and [`Shape`](crate::ir::Shape) classification, so a
//! property is declared, checked and decoded the same way everywhere:
//! - objects become data classes
//! - components become request classes carrying call flags
//! - results become response classes
//! - the index maps lower-cased names back to constructors

mod actionscript;
mod csharp;
mod ecma;
mod index;
mod javascript;
pub mod naming;
pub mod partials;
pub mod runtime;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::diagnostic::ModgenError;
use crate::ir::{Entity, EntityKind, SchemaModel};

pub use index::{EntityIndex, IndexEntry};
pub use partials::{PartialCatalog, PartialDirs, PartialHooks, Partials};

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Every file produced for one target.
#[derive(Debug, Clone, Default)]
pub struct GeneratedCode {
    pub files: Vec<RenderedFile>,
}

impl GeneratedCode {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&RenderedFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }
}

/// Where a target's files go.
#[derive(Debug, Clone)]
pub struct Layout {
    pub objects_dir: PathBuf,
    pub components_dir: PathBuf,
    pub results_dir: PathBuf,
    /// The name lookup file. No index is generated without one.
    pub index_file: Option<PathBuf>,
    /// Suffix for generated and partial files, including the dot.
    pub file_extension: String,
    /// Module exporting the hand-written base classes (JavaScript only).
    pub runtime_module: Option<PathBuf>,
}

impl Layout {
    /// `<objects>/<Class><ext>` or `<dir>/<Namespace>/<method><ext>`.
    pub fn file_for(&self, entity: &Entity, class_name: &str) -> PathBuf {
        let file = |name: &str| format!("{}{}", name, self.file_extension);
        match (entity.kind, &entity.namespace, &entity.method) {
            (EntityKind::Component, Some(ns), Some(method)) => self.components_dir.join(ns).join(file(method)),
            (EntityKind::Result, Some(ns), Some(method)) => self.results_dir.join(ns).join(file(method)),
            _ => self.objects_dir.join(file(class_name)),
        }
    }

    /// Directory above the objects directory, home of the base classes.
    pub fn base_dir(&self) -> PathBuf {
        self.objects_dir.parent().map(PathBuf::from).unwrap_or_default()
    }
}

/// Naming choices shared by all files of a target.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Root namespace or package of the generated classes.
    pub namespace: String,
    /// Renames for object classes whose schema name clashes with the target.
    pub class_names: BTreeMap<String, String>,
}

impl RenderOptions {
    pub fn class_name<'a>(&'a self, schema_name: &'a str) -> &'a str {
        self.class_names
            .get(schema_name)
            .map(String::as_str)
            .unwrap_or(schema_name)
    }
}

/// A per-language back-end.
pub trait Renderer {
    /// Human readable language name.
    fn language(&self) -> &'static str;

    fn layout(&self) -> &Layout;

    fn render_object(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError>;

    fn render_component(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError>;

    fn render_result(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError>;

    /// Renders the name lookup. Only called when the layout has an index file.
    fn render_index(&self, index: &EntityIndex<'_>) -> Result<RenderedFile, ModgenError>;

    /// The base class skeletons the generated files extend.
    fn render_runtime(&self) -> Vec<RenderedFile>;
}

/// Supported target languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    JavaScript,
    CSharp,
    ActionScript2,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::JavaScript => "javascript",
            Backend::CSharp => "csharp",
            Backend::ActionScript2 => "actionscript2",
        }
    }

    pub fn default_extension(&self) -> &'static str {
        match self {
            Backend::JavaScript => ".js",
            Backend::CSharp => ".cs",
            Backend::ActionScript2 => ".as",
        }
    }

    pub fn default_namespace(&self) -> &'static str {
        match self {
            Backend::JavaScript | Backend::CSharp => "NewgroundsIO",
            Backend::ActionScript2 => "io.newgrounds.models",
        }
    }
}

impl FromStr for Backend {
    type Err = ModgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Backend::JavaScript),
            "csharp" | "cs" | "c#" => Ok(Backend::CSharp),
            "actionscript2" | "actionscript" | "as2" => Ok(Backend::ActionScript2),
            _ => Err(ModgenError::UnsupportedBackend { name: s.to_string() }),
        }
    }
}

/// Creates the renderer for a back-end.
pub fn create_renderer(backend: Backend, layout: Layout, options: RenderOptions) -> Box<dyn Renderer> {
    match backend {
        Backend::JavaScript => Box::new(javascript::JavaScriptRenderer::new(layout, options)),
        Backend::CSharp => Box::new(csharp::CSharpRenderer::new(layout, options)),
        Backend::ActionScript2 => Box::new(actionscript::ActionScriptRenderer::new(layout, options)),
    }
}

/// Renders every entity, then the index.
///
/// Pure apart from logging: the same model, partials and options always
/// produce the same files.
pub fn generate(
    model: &SchemaModel,
    renderer: &dyn Renderer,
    partials: &Partials,
) -> Result<GeneratedCode, ModgenError> {
    let mut files = Vec::with_capacity(model.entity_count() + 1);

    for entity in model.entities() {
        naming::check_entity(entity)?;

        let hooks = partials.for_kind(entity.kind).hooks_for(&entity.name);
        let rendered = match entity.kind {
            EntityKind::Object => renderer.render_object(entity, hooks),
            EntityKind::Component => renderer.render_component(entity, hooks),
            EntityKind::Result => renderer.render_result(entity, hooks),
        };
        files.push(rendered.map_err(|e| attribute(&entity.name, e))?);
    }

    if renderer.layout().index_file.is_some() {
        let index = EntityIndex::build(model);
        files.push(renderer.render_index(&index).map_err(|e| attribute("ObjectIndex", e))?);
    }

    tracing::debug!(language = renderer.language(), files = files.len(), "rendered target");
    Ok(GeneratedCode { files })
}

fn attribute(entity: &str, err: ModgenError) -> ModgenError {
    match err {
        ModgenError::Render { .. } | ModgenError::PartialUnreadable { .. } => err,
        other => ModgenError::render(entity, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_aliases() {
        assert_eq!("js".parse::<Backend>().unwrap(), Backend::JavaScript);
        assert_eq!("C#".parse::<Backend>().unwrap(), Backend::CSharp);
        assert_eq!("as2".parse::<Backend>().unwrap(), Backend::ActionScript2);
        assert!(matches!("cobol".parse::<Backend>(), Err(ModgenError::UnsupportedBackend { .. })));
    }

    #[test]
    fn test_class_name_map() {
        let mut options = RenderOptions::default();
        options.class_names.insert("Error".into(), "NgioError".into());
        assert_eq!(options.class_name("Error"), "NgioError");
        assert_eq!(options.class_name("User"), "User");
    }
}
