//! Hand-written source fragments spliced into generated files.
//!
//! A partial directory holds files named `<Entity>.<hook><ext>`, for example
//! `Medal.class.js` or `ScoreBoard.getScores.constructor.cs`. Nested
//! directories are joined with dots, so `ScoreBoard/getScores.class.js` also
//! targets `ScoreBoard.getScores`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::diagnostic::ModgenError;
use crate::ir::EntityKind;

/// The splice points a generated file exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialHooks {
    /// Extra imports or `using` directives.
    pub import: Option<String>,
    /// Extra field or property declarations.
    pub properties: Option<String>,
    /// Statements appended to the constructor.
    pub constructor: Option<String>,
    /// Extra members appended to the class body.
    pub class: Option<String>,
}

static NO_HOOKS: PartialHooks = PartialHooks {
    import: None,
    properties: None,
    constructor: None,
    class: None,
};

impl PartialHooks {
    pub fn is_empty(&self) -> bool {
        self == &NO_HOOKS
    }

    fn slot(&mut self, hook: &str) -> Option<&mut Option<String>> {
        match hook {
            "import" | "using" => Some(&mut self.import),
            "properties" => Some(&mut self.properties),
            "constructor" => Some(&mut self.constructor),
            "class" => Some(&mut self.class),
            _ => None,
        }
    }
}

/// Partials for one entity kind, resolved once before rendering.
#[derive(Debug, Clone, Default)]
pub struct PartialCatalog {
    hooks: BTreeMap<String, PartialHooks>,
}

impl PartialCatalog {
    /// Reads every partial under `dir`. A missing directory is an empty catalog.
    pub fn scan(dir: &Path, file_extension: &str) -> Result<Self, ModgenError> {
        let mut catalog = Self::default();
        if !dir.is_dir() {
            return Ok(catalog);
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| ModgenError::IoError {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some((entity, hook)) = split_partial_name(dir, path, file_extension) else {
                continue;
            };

            let text = std::fs::read_to_string(path).map_err(|e| ModgenError::PartialUnreadable {
                entity: entity.clone(),
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            if !catalog.insert(&entity, &hook, text) {
                tracing::warn!(path = %path.display(), hook = %hook, "ignoring partial with unknown hook name");
            }
        }

        tracing::debug!(dir = %dir.display(), entities = catalog.len(), "scanned partials");
        Ok(catalog)
    }

    /// Registers one hook. Returns `false` when the hook name is unknown.
    pub fn insert(&mut self, entity: &str, hook: &str, text: String) -> bool {
        let mut hooks = self.hooks.get(entity).cloned().unwrap_or_default();
        match hooks.slot(hook) {
            Some(slot) => {
                *slot = Some(text);
                self.hooks.insert(entity.to_string(), hooks);
                true
            }
            None => false,
        }
    }

    pub fn hooks_for(&self, entity: &str) -> &PartialHooks {
        self.hooks.get(entity).unwrap_or(&NO_HOOKS)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// `(entity, hook)` for a partial file, or `None` for unrelated files.
fn split_partial_name(root: &Path, path: &Path, file_extension: &str) -> Option<(String, String)> {
    let relative = path.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(".");

    if joined.starts_with('.') {
        return None;
    }

    let stem = joined.strip_suffix(file_extension)?;
    let (entity, hook) = stem.rsplit_once('.')?;
    if entity.is_empty() || hook.is_empty() {
        return None;
    }
    Some((entity.to_string(), hook.to_string()))
}

/// Partial directories per entity kind.
#[derive(Debug, Clone, Default)]
pub struct PartialDirs {
    pub objects: Option<PathBuf>,
    pub components: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

/// Catalogs for all three entity kinds.
#[derive(Debug, Clone, Default)]
pub struct Partials {
    pub objects: PartialCatalog,
    pub components: PartialCatalog,
    pub results: PartialCatalog,
}

impl Partials {
    pub fn scan(dirs: &PartialDirs, file_extension: &str) -> Result<Self, ModgenError> {
        let scan = |dir: &Option<PathBuf>| match dir {
            Some(dir) => PartialCatalog::scan(dir, file_extension),
            None => Ok(PartialCatalog::default()),
        };

        Ok(Self {
            objects: scan(&dirs.objects)?,
            components: scan(&dirs.components)?,
            results: scan(&dirs.results)?,
        })
    }

    pub fn for_kind(&self, kind: EntityKind) -> &PartialCatalog {
        match kind {
            EntityKind::Object => &self.objects,
            EntityKind::Component => &self.components,
            EntityKind::Result => &self.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_flat_and_nested() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Medal.class.js"), "unlock() {}\n").unwrap();
        std::fs::write(dir.path().join("ScoreBoard.getScores.import.js"), "import x from 'x';").unwrap();
        std::fs::create_dir_all(dir.path().join("Gateway")).unwrap();
        std::fs::write(dir.path().join("Gateway/ping.constructor.js"), "this.ping = 1;").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a partial").unwrap();

        let catalog = PartialCatalog::scan(dir.path(), ".js").unwrap();
        assert_eq!(catalog.hooks_for("Medal").class.as_deref(), Some("unlock() {}\n"));
        assert!(catalog.hooks_for("ScoreBoard.getScores").import.is_some());
        assert!(catalog.hooks_for("Gateway.ping").constructor.is_some());
        assert!(catalog.hooks_for("User").is_empty());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_unknown_hook_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Medal.footer.js"), "x").unwrap();

        let catalog = PartialCatalog::scan(dir.path(), ".js").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let catalog = PartialCatalog::scan(Path::new("/definitely/not/here"), ".cs").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_split_partial_name() {
        let root = Path::new("p");
        assert_eq!(
            split_partial_name(root, Path::new("p/Medal.class.cs"), ".cs"),
            Some(("Medal".into(), "class".into()))
        );
        assert_eq!(split_partial_name(root, Path::new("p/Medal.cs"), ".cs"), None);
        assert_eq!(split_partial_name(root, Path::new("p/.hidden.class.cs"), ".cs"), None);
        assert_eq!(split_partial_name(root, Path::new("p/Medal.class.js"), ".cs"), None);
    }
}
