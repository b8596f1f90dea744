//! Watch mode.
//!
//! Rebuilds whenever the config file, a partial directory or a local schema
//! changes. Rebuilds read the cached schema and never hit the network.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use notify_debouncer_mini::{
    new_debouncer,
    notify::{RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer,
};

use modgen_compiler::{GenerateReport, Generator, ModgenConfig, ModgenError};

use crate::ui;

/// Paths whose changes trigger a rebuild, shared with the watcher callback.
type Tracked = Arc<Mutex<Vec<PathBuf>>>;

pub async fn run(config_path: &Path, targets: &[String]) -> miette::Result<()> {
    let config = ModgenConfig::load(config_path)?;
    let config_file = config.path.clone();

    ui::info(&format!("Watching {}", config_file.display()));
    println!();

    let spinner = ui::spinner("Initial build...");
    let start = Instant::now();
    let initial = Generator::new(config.clone()).generate(targets).await;
    spinner.finish_and_clear();
    report(initial, start);

    // Capacity 1: changes seen during a pass collapse into one follow-up pass.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    let tracked: Tracked = Arc::default();
    let filter = Arc::clone(&tracked);

    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |result: DebounceEventResult| match result {
            Ok(events) => {
                let relevant = match filter.lock() {
                    Ok(paths) => events.iter().any(|e| is_tracked(&paths, &e.path)),
                    Err(_) => !events.is_empty(),
                };
                if relevant {
                    let _ = tx.try_send(());
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watcher error"),
        },
    )
    .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    let mut watched = Vec::new();
    watch_paths(&mut debouncer, &config, &mut watched, &tracked);

    ui::info("Ready! Waiting for changes...");

    loop {
        tokio::select! {
            change = rx.recv() => {
                if change.is_none() {
                    break;
                }

                println!();
                let spinner = ui::spinner("Change detected, regenerating...");
                let start = Instant::now();

                let result = ModgenConfig::load(&config_file).and_then(|config| {
                    let report = Generator::new(config.clone()).generate_cached(targets)?;
                    Ok((config, report))
                });
                spinner.finish_and_clear();

                match result {
                    Ok((config, generated)) => {
                        watch_paths(&mut debouncer, &config, &mut watched, &tracked);
                        report(Ok(generated), start);
                    }
                    Err(e) => report(Err(e), start),
                }

                println!();
                ui::info("Ready! Waiting for changes...");
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

/// Registers every watch path of `config` not already watched.
///
/// A file is watched through its directory and picked out by [`is_tracked`],
/// so replacing it by rename keeps being seen.
fn watch_paths(
    debouncer: &mut Debouncer<RecommendedWatcher>,
    config: &ModgenConfig,
    watched: &mut Vec<PathBuf>,
    tracked: &Tracked,
) {
    for path in config.watch_paths() {
        if let Ok(mut paths) = tracked.lock() {
            for p in [path.clone(), canonical(&path)] {
                if !paths.contains(&p) {
                    paths.push(p);
                }
            }
        }

        let (dir, mode) = watch_target(&path);
        if watched.contains(&dir) {
            continue;
        }
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "not watching missing path");
            continue;
        }

        match debouncer.watcher().watch(&dir, mode) {
            Ok(()) => {
                tracing::debug!(path = %dir.display(), recursive = mode == RecursiveMode::Recursive, "watching");
                watched.push(dir);
            }
            Err(e) => tracing::warn!(path = %dir.display(), error = %e, "could not watch path"),
        }
    }
}

/// The directory to register for `path`.
fn watch_target(path: &Path) -> (PathBuf, RecursiveMode) {
    if path.is_dir() {
        return (path.to_path_buf(), RecursiveMode::Recursive);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (parent, RecursiveMode::NonRecursive)
}

/// True when `event` is a tracked file or lies under a tracked directory.
fn is_tracked(tracked: &[PathBuf], event: &Path) -> bool {
    tracked.iter().any(|p| event.starts_with(p))
}

/// Resolves the directory part only; the file may be mid-rename.
fn canonical(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
    std::fs::canonicalize(parent)
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn report(result: Result<GenerateReport, ModgenError>, start: Instant) {
    match result {
        Ok(generated) => {
            for target in &generated.targets {
                ui::target_line(&target.target, target.language, target.files_written);
            }
            ui::timing(
                &format!("Generated {} files", generated.files_written()),
                start.elapsed().as_millis(),
            );
        }
        Err(e) => ui::error(&format!("{}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_is_watched_through_its_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();
        std::fs::create_dir_all(dir.join("partials")).unwrap();
        let config = dir.join("modgen.toml");
        std::fs::write(&config, "").unwrap();

        let (target, mode) = watch_target(&config);
        assert_eq!(target, dir);
        assert!(mode == RecursiveMode::NonRecursive);

        let (target, mode) = watch_target(&dir.join("partials"));
        assert_eq!(target, dir.join("partials"));
        assert!(mode == RecursiveMode::Recursive);

        assert_eq!(watch_target(Path::new("modgen.toml")).0, PathBuf::from("."));
    }

    #[test]
    fn test_only_tracked_paths_trigger() {
        let tracked = vec![PathBuf::from("/work/modgen.toml"), PathBuf::from("/work/partials/js")];

        // An atomic save lands on the same path.
        assert!(is_tracked(&tracked, Path::new("/work/modgen.toml")));
        assert!(is_tracked(&tracked, Path::new("/work/partials/js/objects/User.class.js")));
        assert!(!is_tracked(&tracked, Path::new("/work/modgen.toml.swp")));
        assert!(!is_tracked(&tracked, Path::new("/work/js")));
        assert!(!is_tracked(&tracked, Path::new("/work/README.md")));
    }
}
