//! `whatexec`: locate executables by command name.
//!
//! Looks in `PATH` first and, for `find`, falls back to scanning every ready
//! volume with well-known install locations visited first. Resolved paths go
//! to stdout; diagnostics go to stderr.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use whatexec::core::types::{ExecutableResolver, ResolvedExecutable, SearchDepth};
use whatexec::error::ResolveError;
use whatexec::exit_codes;
use whatexec::io::config::{CONFIG_ENV, WhatexecConfig, load_config};
use whatexec::io::detector::{ExecutableDetector, PlatformDetector};
use whatexec::io::locator::FileSystemLocator;
use whatexec::io::volumes::DriveHandle;
use whatexec::logging;
use whatexec::nonblocking::run_blocking;
use whatexec::resolve::{system_facade, system_locator};

#[derive(Parser)]
#[command(
    name = "whatexec",
    version,
    about = "Locate executables by command name"
)]
struct Cli {
    /// Log resolution decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML config file.
    #[arg(long, global = true, env = CONFIG_ENV, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read `PATH` afresh on every lookup.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Override both cache lifetimes.
    #[arg(long, global = true, value_name = "SECS")]
    cache_ttl: Option<u64>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve through `PATH`, then scan mounted volumes.
    Find {
        #[arg(required = true)]
        names: Vec<String>,
        /// Every `PATH` match plus every instance on disk.
        #[arg(long)]
        all: bool,
        /// Print at most N paths per name.
        #[arg(long, value_name = "N")]
        limit: Option<NonZeroUsize>,
    },
    /// Resolve through `PATH` only.
    Path {
        #[arg(required = true)]
        names: Vec<String>,
        /// Every `PATH` match instead of the first.
        #[arg(long)]
        all: bool,
    },
    /// Scan a directory, a drive or every volume for one command.
    Search {
        name: String,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Every instance instead of the best-ranked one.
        #[arg(long)]
        all: bool,
    },
    /// List every executable in a directory, a drive or every volume.
    List {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Args, Debug, Default)]
struct ScopeArgs {
    /// Scan this directory.
    #[arg(long, conflicts_with = "drive", value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Scan the volume mounted here.
    #[arg(long, value_name = "MOUNT")]
    drive: Option<PathBuf>,
    /// Do not descend into subdirectories.
    #[arg(long)]
    top_level: bool,
}

enum Scope {
    Directory(PathBuf),
    Drive(DriveHandle),
    System,
}

impl ScopeArgs {
    fn scope(&self) -> Result<Scope> {
        if let Some(dir) = &self.dir {
            if !dir.is_dir() {
                bail!("--dir {} is not a directory", dir.display());
            }
            return Ok(Scope::Directory(dir.clone()));
        }
        if let Some(mount) = &self.drive {
            let drive = DriveHandle::new(mount);
            if !drive.is_ready() {
                bail!("--drive {} is not a ready volume", mount.display());
            }
            return Ok(Scope::Drive(drive));
        }
        Ok(Scope::System)
    }
}

#[derive(Debug, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    paths: Vec<String>,
}

impl Report {
    fn new(name: Option<String>, found: Vec<ResolvedExecutable>) -> Self {
        Self {
            name,
            paths: found.iter().map(ToString::to_string).collect(),
        }
    }
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            match err.downcast_ref::<ResolveError>() {
                Some(ResolveError::Cancelled) => exit_codes::CANCELLED,
                _ => exit_codes::INVALID,
            }
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = load_settings(cli.config.as_deref(), cli.no_cache, cli.cache_ttl)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let reports = match cli.command {
        Command::Find { names, all, limit } => cmd_find(&config, names, all, limit, &cancel).await?,
        Command::Path { names, all } => cmd_path(&config, &names, all)?,
        Command::Search { name, scope, all } => {
            cmd_search(&config, name, &scope, all, &cancel).await?
        }
        Command::List { scope } => cmd_list(&config, &scope, &cancel).await?,
    };
    emit(&reports, cli.json)?;

    if reports.iter().all(|report| !report.paths.is_empty()) {
        Ok(exit_codes::FOUND)
    } else {
        Ok(exit_codes::NOT_FOUND)
    }
}

/// Config file (if any) with command-line overrides applied.
fn load_settings(
    path: Option<&Path>,
    no_cache: bool,
    cache_ttl: Option<u64>,
) -> Result<WhatexecConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => WhatexecConfig::default(),
    };
    if no_cache {
        config.cache.enabled = false;
    }
    if let Some(secs) = cache_ttl {
        config.cache.path_ttl_secs = secs;
        config.cache.extensions_ttl_secs = secs;
    }
    config.validate().context("command-line overrides")?;
    Ok(config)
}

async fn cmd_find(
    config: &WhatexecConfig,
    names: Vec<String>,
    all: bool,
    limit: Option<NonZeroUsize>,
    cancel: &CancellationToken,
) -> Result<Vec<Report>> {
    let facade = Arc::new(system_facade(config)?);
    let mut reports = Vec::with_capacity(names.len());
    for name in names {
        let mut found = if all {
            let facade = Arc::clone(&facade);
            let lookup = name.clone();
            run_blocking(cancel, move |token| facade.find_all_with(&lookup, &token)).await?
        } else {
            Arc::clone(&facade)
                .try_resolve_async(name.clone(), cancel.clone())
                .await?
                .into_iter()
                .collect()
        };
        if let Some(limit) = limit {
            found.truncate(limit.get());
        }
        reports.push(Report::new(Some(name), found));
    }
    Ok(reports)
}

fn cmd_path(config: &WhatexecConfig, names: &[String], all: bool) -> Result<Vec<Report>> {
    let facade = system_facade(config)?;
    let resolver = facade.resolver();
    names
        .iter()
        .map(|name| -> Result<Report> {
            let found = if all {
                resolver.resolve_all(name)?
            } else {
                resolver.try_resolve(name)?.into_iter().collect()
            };
            Ok(Report::new(Some(name.clone()), found))
        })
        .collect()
}

async fn cmd_search(
    config: &WhatexecConfig,
    name: String,
    scope: &ScopeArgs,
    all: bool,
    cancel: &CancellationToken,
) -> Result<Vec<Report>> {
    let locator = scoped_locator(config, scope)?;
    let target = scope.scope()?;
    let lookup = name.clone();
    let found = run_blocking(cancel, move |token| {
        let first = |found: Option<ResolvedExecutable>| -> Vec<ResolvedExecutable> {
            found.into_iter().collect()
        };
        match (&target, all) {
            (Scope::Directory(dir), true) => {
                locator.locate_instances_in_directory(dir, &lookup, &token)
            }
            (Scope::Directory(dir), false) => {
                locator.locate_in_directory(dir, &lookup, &token).map(first)
            }
            (Scope::Drive(drive), true) => locator.locate_instances_in_drive(drive, &lookup, &token),
            (Scope::Drive(drive), false) => {
                locator.locate_in_drive(drive, &lookup, &token).map(first)
            }
            (Scope::System, true) => locator.locate_instances(&lookup, &token),
            (Scope::System, false) => locator.locate(&lookup, &token).map(first),
        }
    })
    .await?;
    Ok(vec![Report::new(Some(name), found)])
}

async fn cmd_list(
    config: &WhatexecConfig,
    scope: &ScopeArgs,
    cancel: &CancellationToken,
) -> Result<Vec<Report>> {
    let locator = scoped_locator(config, scope)?;
    let target = scope.scope()?;
    let found = run_blocking(cancel, move |token| match &target {
        Scope::Directory(dir) => locator.locate_all_in_directory(dir, &token),
        Scope::Drive(drive) => locator.locate_all_in_drive(drive, &token),
        Scope::System => locator.locate_all(&token),
    })
    .await?;
    Ok(vec![Report::new(None, found)])
}

fn scoped_locator(config: &WhatexecConfig, scope: &ScopeArgs) -> Result<FileSystemLocator> {
    let detector: Arc<dyn ExecutableDetector> = Arc::new(PlatformDetector::for_current_platform()?);
    let locator = system_locator(config, detector);
    if scope.top_level {
        let options = locator.options().with_depth(SearchDepth::TopLevelOnly);
        return Ok(locator.with_options(options));
    }
    Ok(locator)
}

fn emit(reports: &[Report], json: bool) -> Result<()> {
    if json {
        let payload = serde_json::to_string_pretty(reports).context("serialize json")?;
        println!("{payload}");
        return Ok(());
    }
    for report in reports {
        if report.paths.is_empty() {
            if let Some(name) = &report.name {
                eprintln!("{name}: not found");
            }
            continue;
        }
        for path in &report.paths {
            println!("{path}");
        }
    }
    Ok(())
}
