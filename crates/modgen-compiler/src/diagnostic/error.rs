//! Generator error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while loading a schema or generating models.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum ModgenError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("I/O failure on '{}': {message}", path.display())]
    #[diagnostic(code(modgen::io::failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Config file not found: {}", path.display())]
    #[diagnostic(
        code(modgen::config::not_found),
        help("Run `modgen init` to create a starter modgen.toml")
    )]
    ConfigNotFound {
        path: PathBuf,
    },

    #[error("Invalid config file '{}': {message}", path.display())]
    #[diagnostic(code(modgen::config::invalid))]
    ConfigInvalid {
        path: PathBuf,
        message: String,
    },

    #[error("Unknown target '{name}'")]
    #[diagnostic(
        code(modgen::config::unknown_target),
        help("Configured targets: {available}")
    )]
    UnknownTarget {
        name: String,
        available: String,
    },

    #[error("Unsupported backend '{name}'")]
    #[diagnostic(
        code(modgen::config::unsupported_backend),
        help("Supported backends: javascript, csharp, actionscript2")
    )]
    UnsupportedBackend {
        name: String,
    },

    #[error("Refusing to overwrite existing config: {}", path.display())]
    #[diagnostic(
        code(modgen::config::already_exists),
        help("Pass --force to replace it")
    )]
    ConfigExists {
        path: PathBuf,
    },

    #[error("Refusing to overwrite existing base class: {}", path.display())]
    #[diagnostic(
        code(modgen::scaffold::already_exists),
        help("Base classes are meant to be edited. Pass --force to replace them")
    )]
    ScaffoldExists {
        path: PathBuf,
    },

    // =========================================================================
    // Schema Errors
    // =========================================================================
    #[error("Failed to fetch schema from {url}: {message}")]
    #[diagnostic(code(modgen::schema::fetch_failed))]
    SchemaFetch {
        url: String,
        message: String,
    },

    #[error("Invalid schema document ({origin}): {message}")]
    #[diagnostic(
        code(modgen::schema::invalid),
        help("The document must be a JSON object with top-level `objects` and `components` keys")
    )]
    SchemaInvalid {
        origin: String,
        message: String,
    },

    #[error("No schema available: {message}")]
    #[diagnostic(
        code(modgen::schema::unavailable),
        help("Run `modgen refresh` while online, or point [schema].source at a local file")
    )]
    NoSchema {
        message: String,
    },

    // =========================================================================
    // Rendering Errors
    // =========================================================================
    #[error("Failed to render '{entity}': {message}")]
    #[diagnostic(code(modgen::render::failed))]
    Render {
        entity: String,
        message: String,
    },

    #[error("Failed to read partial for '{entity}' at '{}': {message}", path.display())]
    #[diagnostic(code(modgen::render::partial_unreadable))]
    PartialUnreadable {
        entity: String,
        path: PathBuf,
        message: String,
    },
}

impl ModgenError {
    /// Wraps a `std::io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Attaches an entity name to a rendering failure.
    pub fn render(entity: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Render {
            entity: entity.into(),
            message: message.to_string(),
        }
    }
}
