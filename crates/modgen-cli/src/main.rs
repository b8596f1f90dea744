//! modgen command line.
//!
//! Generates client model classes from the newgrounds.io schema.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modgen_compiler::schema::SchemaOrigin;
use modgen_compiler::{ir, Generator, ModgenConfig};

mod ui;
mod watch;

#[derive(Parser)]
#[command(name = "modgen")]
#[command(version)]
#[command(about = "modgen - generates client models from the newgrounds.io schema")]
struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter modgen.toml and its partial directories
    Init {
        /// Project directory (created if it doesn't exist)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing modgen.toml
        #[arg(long)]
        force: bool,
    },

    /// Update the cached schema document
    Refresh {
        /// Config file, or the directory holding it
        #[arg(short, long, default_value = "modgen.toml")]
        config: PathBuf,

        /// Download even when the cached copy is current
        #[arg(long)]
        force: bool,
    },

    /// Generate model classes
    Build {
        /// Targets or aliases to build (all when omitted)
        targets: Vec<String>,

        /// Config file, or the directory holding it
        #[arg(short, long, default_value = "modgen.toml")]
        config: PathBuf,
    },

    /// Write the base classes the generated models extend
    Scaffold {
        /// Targets or aliases to scaffold (all when omitted)
        targets: Vec<String>,

        /// Config file, or the directory holding it
        #[arg(short, long, default_value = "modgen.toml")]
        config: PathBuf,

        /// Overwrite base classes that already exist
        #[arg(long)]
        force: bool,
    },

    /// Rebuild whenever the config, a partial or a local schema changes
    Watch {
        /// Targets or aliases to build (all when omitted)
        targets: Vec<String>,

        /// Config file, or the directory holding it
        #[arg(short, long, default_value = "modgen.toml")]
        config: PathBuf,
    },

    /// Show the schema cache and the configured targets
    Status {
        /// Config file, or the directory holding it
        #[arg(short, long, default_value = "modgen.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Init { path, force } => init_project(&path, force)?,
        Commands::Refresh { config, force } => refresh_schema(&config, force).await?,
        Commands::Build { targets, config } => build(&config, &targets).await?,
        Commands::Scaffold { targets, config, force } => scaffold(&config, &targets, force)?,
        Commands::Watch { targets, config } => watch::run(&config, &targets).await?,
        Commands::Status { config } => status(&config)?,
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with generated listings.
fn init_tracing(verbose: bool) -> miette::Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::try_new(level).map_err(|e| miette::miette!("Invalid log filter: {}", e))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn init_project(path: &Path, force: bool) -> miette::Result<()> {
    ui::box_header(&format!("{} Setting up modgen", ui::symbols::DIAMOND));
    ui::box_line("");
    ui::box_footer();
    println!();

    let spinner = ui::spinner("Writing modgen.toml...");
    let result = ModgenConfig::init(path, force);
    spinner.finish_and_clear();
    let config = result?;

    let mut partial_dirs = Vec::new();
    for name in config.target_names() {
        let target = config.target(name)?;
        let dirs = target.partial_dirs;
        for dir in [dirs.objects, dirs.components, dirs.results].into_iter().flatten() {
            let relative = dir.strip_prefix(&config.root).unwrap_or(&dir).to_path_buf();
            partial_dirs.push(relative);
        }
    }

    ui::success("Done. Here's what you got:");
    println!();
    ui::tree_dir("", &config.root.display().to_string());
    ui::tree_item("   ", "modgen.toml", Some("Schema source and targets"), partial_dirs.is_empty());
    for (i, dir) in partial_dirs.iter().enumerate() {
        let is_last = i + 1 == partial_dirs.len();
        ui::tree_item("   ", &format!("{}/", dir.display()), None, is_last);
    }

    ui::divider();

    ui::box_header(&format!("{} What's Next", ui::symbols::ARROW));
    ui::box_line("");
    ui::box_line("   modgen refresh   download the schema");
    ui::box_line("   modgen build     generate every target");
    ui::box_line("   modgen scaffold  write the base classes once");
    ui::box_line("");
    ui::box_footer();

    Ok(())
}

async fn refresh_schema(config: &Path, force: bool) -> miette::Result<()> {
    let config = ModgenConfig::load(config)?;
    let loader = config.schema_loader()?;

    let spinner = ui::spinner("Checking schema...");
    let result = loader.refresh(force).await;
    spinner.finish_and_clear();
    let loaded = result?;

    let counts = format!(
        "{}, {} in {}",
        ui::plural(loaded.document.objects.len(), "object"),
        ui::plural(loaded.document.method_count(), "method"),
        ui::plural(loaded.document.components.len(), "namespace"),
    );

    match loaded.origin {
        SchemaOrigin::Local => ui::info(&format!("Local schema, nothing to cache ({})", counts)),
        SchemaOrigin::Downloaded => ui::success(&format!("Downloaded schema ({})", counts)),
        SchemaOrigin::Cache => ui::success(&format!("Cached schema is current ({})", counts)),
        SchemaOrigin::StaleCache => {
            ui::warn(&format!("Could not refresh, kept the cached schema ({})", counts))
        }
    }

    Ok(())
}

async fn build(config: &Path, targets: &[String]) -> miette::Result<()> {
    let start = Instant::now();
    let config = ModgenConfig::load(config)?;

    let spinner = ui::spinner("Generating models...");
    let result = Generator::new(config).generate(targets).await;
    spinner.finish_and_clear();
    let report = result?;

    for target in &report.targets {
        ui::target_line(&target.target, target.language, target.files_written);
    }
    println!();

    if let Some(first) = report.targets.first() {
        ui::dim(&format!(
            "{}, {}, {} per target",
            ui::plural(first.objects, "object"),
            ui::plural(first.components, "component"),
            ui::plural(first.results, "result"),
        ));
    }
    ui::timing(
        &format!("Wrote {}", ui::plural(report.files_written(), "file")),
        start.elapsed().as_millis(),
    );
    ui::success("Done.");

    Ok(())
}

fn scaffold(config: &Path, targets: &[String], force: bool) -> miette::Result<()> {
    let config = ModgenConfig::load(config)?;
    let root = config.root.clone();
    let scaffolded = Generator::new(config).scaffold(targets, force)?;

    for target in &scaffolded {
        ui::target_line(&target.target, target.language, target.files.len());
        for (i, path) in target.files.iter().enumerate() {
            let relative = path.strip_prefix(&root).unwrap_or(path);
            ui::tree_item("   ", &relative.display().to_string(), None, i + 1 == target.files.len());
        }
    }
    println!();
    ui::success("Base classes written. They are yours to edit; `modgen build` leaves them alone.");

    Ok(())
}

fn status(config: &Path) -> miette::Result<()> {
    let config = ModgenConfig::load(config)?;
    let loader = config.schema_loader()?;
    let cache = loader.status()?;

    ui::box_header("SCHEMA");
    ui::box_line("");
    ui::box_line(&format!("source   {}", cache.source));
    if let Some(path) = &cache.cache_path {
        ui::box_line(&format!("cache    {}", path.display()));
    }
    let state = match (cache.cached, &cache.stamp) {
        (true, Some(stamp)) => format!("{} cached, {}", ui::symbols::TARGET_FILLED, stamp),
        (true, None) => format!("{} available", ui::symbols::TARGET_FILLED),
        (false, _) => format!("{} missing", ui::symbols::DIAMOND),
    };
    ui::box_line(&format!("state    {}", state));
    ui::box_line("");
    ui::box_footer();
    println!();

    match loader.load_cached() {
        Ok(document) => {
            let model = ir::collect(&document, config.collect_options());
            ui::info(&format!(
                "{}, {}, {}",
                ui::plural(model.objects.len(), "object"),
                ui::plural(model.components.len(), "component"),
                ui::plural(model.results.len(), "result"),
            ));
        }
        Err(e) => {
            tracing::debug!(error = %e, "no schema to count");
            ui::warn("No schema available yet. Run `modgen refresh`.");
        }
    }
    println!();

    ui::box_header("TARGETS");
    ui::box_line("");
    for name in config.target_names() {
        let target = config.target(name)?;
        ui::box_line(&format!(
            "{} {:16} {}",
            ui::symbols::TRIANGLE,
            target.name,
            target.backend.name()
        ));
    }
    ui::box_line("");
    ui::box_footer();

    Ok(())
}
