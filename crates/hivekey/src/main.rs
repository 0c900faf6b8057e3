//! hivekey CLI: offline forensic extraction from registry hive files.

use anyhow::Context;
use clap::Parser;
use hivekey::report::SoftwareEntry;
use hivekey::{bootkey, report, HiveTree};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hivekey",
    about = "Parse raw Windows registry hives: boot key, users, installed software",
    version
)]
struct Cli {
    /// SYSTEM hive file; extracts the boot key
    #[arg(long, value_name = "PATH")]
    system: Option<PathBuf>,

    /// SAM hive file; lists local user accounts
    #[arg(long, value_name = "PATH")]
    sam: Option<PathBuf>,

    /// SOFTWARE hive file; lists installed software
    #[arg(long, value_name = "PATH")]
    software: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Default, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    boot_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    software: Option<Vec<SoftwareEntry>>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_hive(path: &Path, kind: &str) -> anyhow::Result<HiveTree> {
    HiveTree::open(path).with_context(|| format!("loading {} hive {}", kind, path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.system.is_none() && cli.sam.is_none() && cli.software.is_none() {
        anyhow::bail!("nothing to do: pass --system, --sam, and/or --software");
    }

    let mut report = Report::default();

    if let Some(path) = &cli.system {
        let tree = load_hive(path, "SYSTEM")?;
        let key = bootkey::extract(&tree).context("extracting boot key")?;
        report.boot_key = Some(bootkey::hex_encode(&key));
    }

    if let Some(path) = &cli.sam {
        let tree = load_hive(path, "SAM")?;
        report.users = Some(report::system_users(&tree));
    }

    if let Some(path) = &cli.software {
        let tree = load_hive(path, "SOFTWARE")?;
        report.software = Some(report::installed_software(&tree));
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(key) = &report.boot_key {
        println!("Boot key: {}", key);
    }
    if let Some(users) = &report.users {
        println!("Local users:");
        for user in users {
            println!("  {}", user);
        }
    }
    if let Some(entries) = &report.software {
        println!("Installed software:");
        for entry in entries {
            println!("  {}", entry.name);
            if let Some(version) = &entry.version {
                println!("    version:  {}", version);
            }
            if let Some(location) = &entry.location {
                println!("    location: {}", location);
            }
        }
    }

    Ok(())
}
