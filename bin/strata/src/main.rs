//! Strata CLI - inspect and mutate configured overlay disks.
//!
//! Provides commands for:
//! - Listing and walking the logical tree of an overlay
//! - Reading and writing files through the overlay
//! - Moving and removing entries
//! - Inspecting how a path resolves across base and diff

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use strata_disk::{
    Disk, DiskRegistry, LocalDiskConfig, ReadSettings, WriteMode, WriteSettings, WriteStream,
};
use strata_overlay::{OverlayConfig, OverlayDisk};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Strata overlay disk CLI.
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, default_value = "strata.toml")]
    config: PathBuf,

    /// Overlay to operate on (optional when the config declares one)
    #[arg(short, long)]
    overlay: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of a directory
    Ls {
        /// Directory path (defaults to the root)
        #[arg(default_value = "")]
        path: String,
    },

    /// Recursively print the logical tree
    Tree {
        /// Directory path (defaults to the root)
        #[arg(default_value = "")]
        path: String,
    },

    /// Write a file's contents to stdout
    Cat {
        /// File path
        path: String,
    },

    /// Write stdin (or a local file) to a path
    Put {
        /// Destination path on the overlay
        path: String,

        /// Local file to read instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Append instead of rewriting
        #[arg(long)]
        append: bool,
    },

    /// Remove a file or directory tree
    Rm {
        /// Path to remove
        path: String,

        /// Remove directories and their contents recursively
        #[arg(short, long)]
        recursive: bool,
    },

    /// Move a file or directory
    Mv {
        /// Source path
        from: String,
        /// Destination path
        to: String,
    },

    /// Show how a path resolves across the overlay
    Stat {
        /// Path to inspect
        path: String,
    },
}

/// On-disk configuration: named local disks plus named overlay sections.
#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    disks: HashMap<String, LocalDiskConfig>,
    #[serde(default)]
    overlays: HashMap<String, OverlayConfig>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting tracing subscriber")?;

    let raw = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading config file {}", cli.config.display()))?;
    let config: FileConfig = toml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", cli.config.display()))?;

    let registry = DiskRegistry::new();
    for (name, disk_config) in &config.disks {
        registry
            .register_local(name, disk_config)
            .with_context(|| format!("opening disk {name}"))?;
    }

    let overlay_name = match cli.overlay {
        Some(name) => name,
        None => {
            let mut names: Vec<&String> = config.overlays.keys().collect();
            names.sort();
            match names.as_slice() {
                [single] => (*single).clone(),
                [] => bail!("config declares no overlays"),
                _ => bail!("config declares several overlays; pass --overlay"),
            }
        }
    };
    let overlay_config = config
        .overlays
        .get(&overlay_name)
        .with_context(|| format!("unknown overlay: {overlay_name}"))?;
    let overlay = OverlayDisk::from_config(&overlay_name, overlay_config, &registry)
        .with_context(|| format!("building overlay {overlay_name}"))?;
    info!(overlay = %overlay_name, "Overlay ready");

    match cli.command {
        Commands::Ls { path } => {
            let mut names = overlay.list_files(&path)?;
            names.sort();
            for name in names {
                println!("{name}");
            }
        }

        Commands::Tree { path } => {
            print_tree(&overlay, &path)?;
        }

        Commands::Cat { path } => {
            let mut stream = overlay.read_file(&path, ReadSettings::default(), None, None)?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            io::copy(&mut stream, &mut handle).context("writing to stdout")?;
        }

        Commands::Put { path, file, append } => {
            let data = match file {
                Some(local) => std::fs::read(&local)
                    .with_context(|| format!("reading {}", local.display()))?,
                None => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf).context("reading stdin")?;
                    buf
                }
            };
            let mode = if append {
                WriteMode::Append
            } else {
                WriteMode::Rewrite
            };
            let mut stream =
                overlay.write_file(&path, data.len().max(1), mode, WriteSettings::default())?;
            stream.write_all(&data)?;
            stream.finalize()?;
            info!(path = %path, bytes = data.len(), "Wrote file");
        }

        Commands::Rm { path, recursive } => {
            if recursive {
                overlay.remove_recursive(&path)?;
            } else {
                overlay.remove_file(&path)?;
            }
        }

        Commands::Mv { from, to } => {
            if overlay.is_directory(&from)? {
                overlay.move_directory(&from, &to)?;
            } else {
                overlay.move_file(&from, &to)?;
            }
        }

        Commands::Stat { path } => {
            let location = overlay.resolve(&path)?;
            println!("location: {location:?}");
            if overlay.is_file(&path)? {
                println!("size: {}", overlay.file_size(&path)?);
            }
            println!("tracked: {}", overlay.is_tracked(&path)?);
        }
    }

    Ok(())
}

fn print_tree(overlay: &OverlayDisk, path: &str) -> Result<()> {
    for entry in overlay.iterate_directory(path)? {
        let entry = entry?;
        println!("{entry}");
        if let Some(dir) = entry.strip_suffix('/') {
            print_tree(overlay, dir)?;
        }
    }
    Ok(())
}
