//! clausum - passphrase-encrypted backup containers.
//!
//! Packs a file or directory, encrypts it and writes a single `.enc`
//! container that can later be restored or verified.

use clap::{ArgAction, Parser, Subcommand};
use clausum::config::{Compression, SymlinkPolicy, MIN_PASSPHRASE_LEN};
use clausum::container::{inspect, read_container};
use clausum::{strength, Backup, BackupConfig, Error, ProgressEvent, Result};
use crossbeam_channel::Sender;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "clausum")]
#[command(
    author,
    version,
    about = "Passphrase-encrypted backups of files and directories",
    long_about = "Packs a file or directory into one archive, encrypts it with AES-256-GCM under a PBKDF2-derived key and writes a single container that can be restored or verified later."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// PBKDF2 iteration count (must match the value used at creation)
    #[arg(long, global = true)]
    work_factor: Option<u32>,

    /// Store archive members without compression
    #[arg(long, global = true)]
    store: bool,

    /// Leave symbolic links out of the archive instead of following them
    #[arg(long, global = true)]
    skip_symlinks: bool,

    /// Do not mark new containers read-only
    #[arg(long, global = true)]
    no_read_only: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an encrypted container from a file or directory
    Create {
        /// File or directory to protect
        source: PathBuf,

        /// Directory that receives the container
        destination: PathBuf,

        /// Container base name (default: source name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Decrypt a container and extract it next to a destination
    Restore {
        /// Container file
        container: PathBuf,

        /// Directory that receives `<name>_restored`
        destination: PathBuf,
    },

    /// Check passphrase and contents without extracting
    Verify {
        /// Container file
        container: PathBuf,
    },

    /// Rate a passphrase
    Strength,

    /// Show what can be read from a container without the passphrase
    Inspect {
        /// Container file
        container: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error ({}): {}", e.kind(), e);
        if let Some(hint) = e.hint() {
            eprintln!("  {}", hint);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<BackupConfig> {
    let mut config = match &cli.config {
        Some(path) => BackupConfig::load(path)?,
        None => BackupConfig::default(),
    };
    if let Some(work_factor) = cli.work_factor {
        config.work_factor = work_factor;
    }
    if cli.store {
        config.compression = Compression::Store;
    }
    if cli.skip_symlinks {
        config.symlinks = SymlinkPolicy::Skip;
    }
    if cli.no_read_only {
        config.read_only = false;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let backup = Backup::new(build_config(&cli)?)?;

    match cli.command {
        Commands::Create {
            source,
            destination,
            name,
        } => cmd_create(&backup, source, destination, name),

        Commands::Restore {
            container,
            destination,
        } => cmd_restore(&backup, container, destination),

        Commands::Verify { container } => cmd_verify(&backup, container),

        Commands::Strength => cmd_strength(),

        Commands::Inspect { container } => cmd_inspect(&container),
    }
}

fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(prompt)?;
    Ok(Zeroizing::new(password))
}

/// Run an operation on a worker thread and draw its progress here.
fn run_with_progress<T, F>(op: F) -> Result<T>
where
    F: FnOnce(&Sender<ProgressEvent>) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    let worker = thread::spawn(move || op(&tx));

    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);

    // Ends when the worker drops its sender.
    for event in rx.iter() {
        bar.set_position(event.percent as u64);
        bar.set_message(event.phase.label());
    }
    bar.finish_and_clear();

    worker
        .join()
        .unwrap_or_else(|_| Err(Error::Io(io::Error::other("worker thread panicked"))))
}

fn default_archive_name(source: &Path) -> Result<String> {
    let name = match source.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => std::fs::canonicalize(source)?
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::InvalidName(source.display().to_string()))?,
    };
    Ok(name)
}

fn cmd_create(
    backup: &Backup,
    source: PathBuf,
    destination: PathBuf,
    name: Option<String>,
) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => default_archive_name(&source)?,
    };

    let passphrase = prompt_password("Enter passphrase: ")?;
    let rating = strength::score(&passphrase);
    eprintln!("Passphrase strength: {} ({}/4)", rating.label, rating.level);
    let confirm = prompt_password("Confirm passphrase: ")?;
    strength::check_new_passphrase(&passphrase, &confirm, MIN_PASSPHRASE_LEN)?;
    drop(confirm);

    let backup = backup.clone();
    let report = run_with_progress(move |tx| {
        backup.create(&source, &destination, &name, &passphrase, tx)
    })?;

    println!("Container created: {}", report.container.display());
    println!("  Files:          {}", report.files);
    println!("  Source size:    {} bytes", report.source_bytes);
    println!("  Container size: {} bytes", report.container_bytes);
    for item in &report.skipped {
        println!("  Skipped {} ({})", item.path.display(), item.reason);
    }
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!();
    println!("Keep your passphrase safe: it cannot be recovered.");

    Ok(())
}

fn cmd_restore(backup: &Backup, container: PathBuf, destination: PathBuf) -> Result<()> {
    let passphrase = prompt_password("Passphrase: ")?;

    let backup = backup.clone();
    let report = run_with_progress(move |tx| {
        backup.restore(&container, &destination, &passphrase, tx)
    })?;

    println!("Restored to: {}", report.directory.display());
    println!("  Files:       {}", report.unpacked.files);
    println!("  Directories: {}", report.unpacked.directories);

    Ok(())
}

fn cmd_verify(backup: &Backup, container: PathBuf) -> Result<()> {
    let passphrase = prompt_password("Passphrase: ")?;

    let backup = backup.clone();
    let outcome = run_with_progress(move |tx| backup.verify(&container, &passphrase, tx))?;
    let report = outcome.into_result()?;

    println!("Verification passed");
    println!("  Passphrase:  correct");
    println!("  Files:       {} intact", report.files);
    println!("  Directories: {}", report.directories);

    Ok(())
}

fn cmd_strength() -> Result<()> {
    let passphrase = prompt_password("Passphrase to rate: ")?;
    let rating = strength::score(&passphrase);
    let meets_minimum = passphrase.chars().count() >= MIN_PASSPHRASE_LEN;

    println!("Strength: {} ({}/4)", rating.label, rating.level);
    if !meets_minimum {
        println!(
            "Too short for a new container (minimum {} characters)",
            MIN_PASSPHRASE_LEN
        );
    }

    Ok(())
}

fn cmd_inspect(container: &Path) -> Result<()> {
    let bytes = read_container(container)?;
    let summary = inspect(&bytes)?;

    println!("Container: {}", container.display());
    println!("  Size:          {} bytes", summary.size);
    println!("  Salt:          {}", hex::encode(summary.salt.as_bytes()));
    println!("  Cipher token:  {} bytes", summary.token_len);
    println!("  Archive size:  {} bytes", summary.payload_len);
    if !summary.plausible {
        println!("  Token is too short to be authentic");
    }

    Ok(())
}
