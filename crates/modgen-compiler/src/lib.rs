//! # Modgen Compiler
//!
//! Generates typed model classes for the newgrounds.io API from its published
//! `objects_and_components.json` schema. One schema feeds several target
//! languages through a shared classification layer.
//!
//! ## Supported Targets
//!
//! - JavaScript (ES modules)
//! - C#
//! - ActionScript 2
//!
//! ## Architecture
//!
//! ```text
//! objects_and_components.json
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Schema    │  Fetch, validate, cache by Last-Modified
//! │   (loader)   │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │      IR      │  Shape classification + entity collection
//! │ (doc → model)│
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  One renderer per language, partials spliced in
//! │(model → src) │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Output    │  Whole-file writes
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modgen_compiler::{Generator, ModgenConfig};
//!
//! let config = ModgenConfig::load("modgen.toml".as_ref())?;
//! let report = Generator::new(config).generate(&[]).await?;
//! println!("wrote {} files", report.files_written());
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod ir;
pub mod output;
pub mod schema;

pub use codegen::{Backend, GeneratedCode, RenderedFile, Renderer};
pub use config::{ModgenConfig, Target};
pub use diagnostic::ModgenError;
pub use schema::SchemaDocument;

/// What one target produced.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: String,
    pub language: &'static str,
    pub objects: usize,
    pub components: usize,
    pub results: usize,
    pub files_written: usize,
}

/// Summary of a generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub targets: Vec<TargetReport>,
}

impl GenerateReport {
    pub fn files_written(&self) -> usize {
        self.targets.iter().map(|t| t.files_written).sum()
    }
}

/// Base class files written for one target.
#[derive(Debug, Clone)]
pub struct ScaffoldedTarget {
    pub target: String,
    pub language: &'static str,
    pub files: Vec<std::path::PathBuf>,
}

/// Runs the whole pipeline for the targets of one config.
pub struct Generator {
    config: ModgenConfig,
}

impl Generator {
    pub fn new(config: ModgenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModgenConfig {
        &self.config
    }

    /// Loads the schema (refreshing the cache when stale) and generates `targets`.
    ///
    /// An empty `targets` list means every configured target.
    pub async fn generate(&self, targets: &[String]) -> Result<GenerateReport, ModgenError> {
        let selected = self.config.select(targets)?;
        let document = self.config.schema_loader()?.load().await?;
        self.write_targets(&document, &selected)
    }

    /// Generates from the cached or local schema without touching the network.
    pub fn generate_cached(&self, targets: &[String]) -> Result<GenerateReport, ModgenError> {
        let selected = self.config.select(targets)?;
        let document = self.config.schema_loader()?.load_cached()?;
        self.write_targets(&document, &selected)
    }

    /// Generates from an already loaded document.
    pub fn generate_with_document(
        &self,
        document: &SchemaDocument,
        targets: &[String],
    ) -> Result<GenerateReport, ModgenError> {
        let selected = self.config.select(targets)?;
        self.write_targets(document, &selected)
    }

    /// Renders one target in memory.
    pub fn render(&self, document: &SchemaDocument, target: &str) -> Result<GeneratedCode, ModgenError> {
        let target = self.config.target(target)?;
        let model = ir::collect(document, self.config.collect_options());
        render_target(&model, &target)
    }

    /// Writes the base class skeletons the generated classes extend.
    ///
    /// Nothing is written when any of the files already exists, unless
    /// `force` is set.
    pub fn scaffold(&self, targets: &[String], force: bool) -> Result<Vec<ScaffoldedTarget>, ModgenError> {
        let rendered: Vec<(Target, Vec<RenderedFile>)> = self
            .config
            .select(targets)?
            .into_iter()
            .map(|target| {
                let files = target.renderer().render_runtime();
                (target, files)
            })
            .collect();

        if !force {
            if let Some(existing) = rendered.iter().flat_map(|(_, files)| files).find(|f| f.path.exists()) {
                return Err(ModgenError::ScaffoldExists {
                    path: existing.path.clone(),
                });
            }
        }

        let mut scaffolded = Vec::with_capacity(rendered.len());
        for (target, files) in rendered {
            output::write_all(&files)?;
            tracing::info!(target = %target.name, files = files.len(), force, "scaffolded base classes");
            scaffolded.push(ScaffoldedTarget {
                language: target.renderer().language(),
                target: target.name,
                files: files.into_iter().map(|f| f.path).collect(),
            });
        }
        Ok(scaffolded)
    }

    fn write_targets(&self, document: &SchemaDocument, targets: &[Target]) -> Result<GenerateReport, ModgenError> {
        let model = ir::collect(document, self.config.collect_options());
        let mut report = GenerateReport::default();

        for target in targets {
            let generated = render_target(&model, target)?;
            let files_written = output::write_all(&generated.files)?;

            tracing::info!(
                target = %target.name,
                backend = target.backend.name(),
                files = files_written,
                "generated target"
            );

            report.targets.push(TargetReport {
                target: target.name.clone(),
                language: target.renderer().language(),
                objects: model.objects.len(),
                components: model.components.len(),
                results: model.results.len(),
                files_written,
            });
        }

        Ok(report)
    }
}

fn render_target(model: &ir::SchemaModel, target: &Target) -> Result<GeneratedCode, ModgenError> {
    let partials = target.partials()?;
    let renderer = target.renderer();
    codegen::generate(model, renderer.as_ref(), &partials)
}
