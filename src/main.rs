use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vantage::agent::{self, SubtreeRequest, Target};
use vantage::explorer;
use vantage::platform;
use vantage::present;

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Inspect a running app's on-device view hierarchy", long_about = None)]
struct Cli {
    /// Target app process name (overrides .vantagerc)
    #[arg(long, global = true)]
    app: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the view hierarchy tree, or detail for a specific view
    View {
        /// View address (e.g. 0x10150e5a0); omit for the full tree
        address: Option<String>,

        /// Maximum depth to display (tree mode)
        #[arg(long, default_value_t = 0)]
        depth: i32,

        /// Show only the frontmost view controller's subtree (tree mode)
        #[arg(long)]
        frontmost: bool,

        /// SwiftUI tree display mode: none, compact, full (detail mode)
        #[arg(long, default_value = "none")]
        swiftui: String,

        /// Interactive tree navigation mode (TUI)
        #[arg(short, long)]
        interactive: bool,

        /// Simulator device UDID or name
        #[arg(long)]
        simulator: Option<String>,

        /// Emit JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// List running app processes on simulators
    Ps {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::View {
            address,
            depth,
            frontmost,
            swiftui,
            interactive,
            simulator,
            json,
        } => {
            let target = Target {
                app: cli.app,
                device: simulator,
            };
            if interactive {
                return explorer::run(target);
            }
            match address {
                Some(address) => run_detail(&target, &address, &swiftui, json),
                None => run_tree(&target, depth, frontmost, json),
            }
        }
        Commands::Ps { json } => run_ps(json),
    }
}

fn run_tree(target: &Target, depth: i32, frontmost: bool, json: bool) -> Result<()> {
    let tree = agent::run_tree(target, depth, frontmost).context("fetch view hierarchy")?;
    let mut stdout = io::stdout();
    if json {
        present::write_tree_json(&mut stdout, &tree)
    } else {
        present::write_tree_yaml(&mut stdout, &tree)
    }
}

fn run_detail(target: &Target, address: &str, swiftui: &str, json: bool) -> Result<()> {
    if !address.starts_with("0x") {
        anyhow::bail!("address must start with 0x (e.g. 0x10150e5a0)");
    }
    let subtree = match swiftui {
        "none" => SubtreeRequest::None,
        "compact" => SubtreeRequest::Compact,
        "full" => SubtreeRequest::Full,
        _ => anyhow::bail!("--swiftui must be one of: none, compact, full"),
    };

    let detail = agent::run_detail(target, address, subtree).context("fetch view detail")?;
    let mut stdout = io::stdout();
    if json {
        present::write_detail_json(&mut stdout, &detail)
    } else {
        present::write_detail_yaml(&mut stdout, &detail)
    }
}

fn run_ps(json: bool) -> Result<()> {
    let procs = platform::list_processes().context("list simulator processes")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&procs).context("serialize processes json")?
        );
        return Ok(());
    }

    if procs.is_empty() {
        println!("No app processes found on booted simulators.");
        return Ok(());
    }

    println!("{:<8} {:<20} {:<32} {:<24} UDID", "PID", "APP", "BUNDLE ID", "DEVICE");
    for p in procs {
        println!(
            "{:<8} {:<20} {:<32} {:<24} {}",
            p.pid, p.app, p.bundle_id, p.device_name, p.device_udid
        );
    }
    Ok(())
}
