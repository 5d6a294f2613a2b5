//! spacemap - disk usage scanner with squarified treemap layout.
//!
//! Usage:
//!   spacemap scan [PATH]                       Scan and print a size tree
//!   spacemap layout [PATH] -W 1280 -H 800      Emit treemap rectangles as JSON
//!   spacemap export [PATH]                     Export the scanned tree as JSON
//!   spacemap --help                            Show help

mod config;
mod logging;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;

use spacemap_session::{Node, NodeId, Rect, ScanPolicy, ScanTree, Session};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "spacemap",
    version,
    about = "Disk usage scanner with squarified treemap layout",
    long_about = "spacemap scans a directory tree, totals the space used by every folder \
                  and lays any folder out as a treemap.\n\n\
                  Settings are read from --config, or from spacemap/config.toml in the \
                  user's config directory when present. Flags override the file."
)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show a size tree
    Scan {
        /// Path to scan (defaults to the platform's start location)
        path: Option<PathBuf>,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Show all entries (no depth limit on display)
        #[arg(short, long)]
        all: bool,

        /// Number of top entries to show per directory
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        scan: ScanFlags,
    },

    /// Scan and lay out a node as treemap rectangles (JSON)
    Layout {
        /// Path to scan (defaults to the platform's start location)
        path: Option<PathBuf>,

        /// Viewport width in pixels
        #[arg(short = 'W', long, default_value = "1280")]
        width: i64,

        /// Viewport height in pixels
        #[arg(short = 'H', long, default_value = "800")]
        height: i64,

        /// Node to lay out (defaults to the scan root)
        #[arg(long)]
        node: Option<u64>,

        /// Leave the free-space tile out of the layout
        #[arg(long)]
        hide_free_space: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        scan: ScanFlags,
    },

    /// Export scan results to JSON
    Export {
        /// Path to scan (defaults to the platform's start location)
        path: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        scan: ScanFlags,
    },
}

/// Options shared by every command that scans.
#[derive(Args, Debug, Default)]
struct ScanFlags {
    /// Drop files smaller than this (e.g., "1KB", "4MB")
    #[arg(long)]
    min_size: Option<String>,

    /// Never enter this path (repeatable)
    #[arg(short, long = "exclude", value_name = "PATH")]
    excludes: Vec<PathBuf>,

    /// Skip entries whose name starts with a dot
    #[arg(long)]
    skip_hidden: bool,

    /// Count logical file length instead of allocated blocks
    #[arg(long)]
    apparent_size: bool,

    /// Concurrent directory expansions (0 = automatic)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Start from the whole-disk profile: skip tiny files, network mounts
    /// and system directories
    #[arg(long)]
    system_defaults: bool,
}

impl ScanFlags {
    /// Layer the flags over the policy from the settings file.
    fn policy(&self, base: &ScanPolicy) -> Result<ScanPolicy> {
        let mut policy = if self.system_defaults {
            ScanPolicy::system_default()
        } else {
            base.clone()
        };

        if let Some(min_size) = &self.min_size {
            policy.min_file_size = parse_size(min_size)?;
        }
        policy.excluded_paths.extend(self.excludes.iter().cloned());
        policy.skip_hidden |= self.skip_hidden;
        policy.apparent_size |= self.apparent_size;
        Ok(policy)
    }

    fn session(&self, config: &AppConfig) -> Result<Session> {
        let policy = self.policy(&config.policy)?;
        let workers = self.workers.unwrap_or(config.workers);
        let mut session = Session::new(policy, config.layout.clone(), workers);
        session.set_show_free_space(config.show_free_space);
        Ok(session)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Scan {
            path,
            depth,
            all,
            top,
            scan,
        } => {
            let mut session = scan.session(&config)?;
            run_scan(&mut session, path, if all { None } else { Some(depth) }, top)?;
        }
        Command::Layout {
            path,
            width,
            height,
            node,
            hide_free_space,
            output,
            scan,
        } => {
            let mut session = scan.session(&config)?;
            if hide_free_space {
                session.set_show_free_space(false);
            }
            run_layout(&mut session, path, node, width, height, output)?;
        }
        Command::Export { path, output, scan } => {
            let mut session = scan.session(&config)?;
            run_export(&mut session, path, output)?;
        }
    }

    Ok(())
}

/// Scan `path` (or the default start path) into the session.
fn scan_into<'s>(session: &'s mut Session, path: Option<PathBuf>) -> Result<&'s ScanTree> {
    let path = path.unwrap_or_else(|| session.default_path());

    eprintln!("Scanning {}...", path.display());

    session
        .scan(&path)
        .with_context(|| format!("Scan of {} failed", path.display()))?;
    session.tree().ok_or_else(|| eyre!("Scan produced no tree"))
}

/// Run a scan and display summary.
fn run_scan(session: &mut Session, path: Option<PathBuf>, max_depth: Option<u32>, top_n: usize) -> Result<()> {
    let tree = scan_into(session, path)?;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        tree.root_path.display(),
        format_size(tree.total_size())
    );
    println!(
        " {} files, {} directories",
        tree.stats.files, tree.stats.dirs
    );
    if let Some(disk) = tree.root.disk {
        println!(
            " Volume: {} total, {} free",
            format_size(disk.total),
            format_size(disk.free)
        );
    }
    println!(" Scanned in {:.2}s", tree.scan_duration.as_secs_f64());
    println!("{}", "─".repeat(60));
    println!();

    // Percentages are of everything drawn, free space included
    let extent = tree
        .root
        .children
        .iter()
        .map(|c| c.size)
        .sum::<u64>()
        .max(tree.root.size);

    print_node(&tree.root, &tree.root_path, 0, max_depth.unwrap_or(u32::MAX), top_n, extent);

    Ok(())
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    node_id: NodeId,
    width: i64,
    height: i64,
    rects: &'a [Rect],
}

/// Lay out one node of a fresh scan.
fn run_layout(
    session: &mut Session,
    path: Option<PathBuf>,
    node: Option<u64>,
    width: i64,
    height: i64,
    output: Option<PathBuf>,
) -> Result<()> {
    let root_id = scan_into(session, path)?.root_id();
    let node_id = node
        .map(NodeId::new)
        .or(root_id)
        .ok_or_else(|| eyre!("Scan produced no root"))?;

    let rects = session
        .layout(node_id, width, height)
        .context("Layout failed")?;
    eprintln!("{} rectangles", rects.len());

    let json = serde_json::to_string_pretty(&LayoutOutput {
        node_id,
        width,
        height,
        rects: &rects,
    })?;
    write_output(&json, output.as_deref())
}

#[derive(Serialize)]
struct ExportOutput<'a> {
    root_path: &'a Path,
    files: u64,
    dirs: u64,
    scan_duration_ms: u128,
    root: &'a Node,
}

/// Export scan results to JSON.
fn run_export(session: &mut Session, path: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let tree = scan_into(session, path)?;

    let json = serde_json::to_string_pretty(&ExportOutput {
        root_path: &tree.root_path,
        files: tree.stats.files,
        dirs: tree.stats.dirs,
        scan_duration_ms: tree.scan_duration.as_millis(),
        root: &tree.root,
    })?;
    write_output(&json, output.as_deref())
}

fn write_output(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(output_path) => {
            std::fs::write(output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}

/// Print a node and its children.
fn print_node(node: &Node, path: &Path, depth: u32, max_depth: u32, top_n: usize, extent: u64) {
    let indent = "  ".repeat(depth as usize);
    let ratio = if extent > 0 {
        node.size as f64 / extent as f64 * 100.0
    } else {
        0.0
    };

    let bar = make_bar(ratio / 100.0, 10);

    let name = if depth == 0 {
        path.display().to_string()
    } else {
        node.name.to_string()
    };

    let dir_marker = if node.is_dir() && depth > 0 { "/" } else { "" };

    println!(
        "{}{}{:<40} {:>10} {:>5.1}% {}",
        indent,
        if node.is_dir() { "▼ " } else { "  " },
        truncate(&format!("{}{}", name, dir_marker), 40),
        format_size(node.size),
        ratio,
        bar
    );

    if node.is_dir() && depth < max_depth {
        let children_to_show = node.children.iter().take(top_n);
        let remaining = node.children.len().saturating_sub(top_n);

        for child in children_to_show {
            print_node(child, &child.full_path, depth + 1, max_depth, top_n, extent);
        }

        if remaining > 0 {
            let indent = "  ".repeat((depth + 1) as usize);
            println!("{}  ... and {} more", indent, remaining);
        }
    }
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TIB" => 1024 * 1024 * 1024 * 1024,
        other => return Err(eyre!("Unknown size unit '{other}' in '{s}'")),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size '{s}'"))?;

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("4 MB").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_size("2GiB").unwrap(), 2 * 1024 * 1024 * 1024);
        assert!(parse_size("ten").is_err());
        assert!(parse_size("3XB").is_err());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééé", 4), "ééé…");
    }

    #[test]
    fn test_make_bar_clamps() {
        assert_eq!(make_bar(0.5, 4), "[██░░]");
        assert_eq!(make_bar(1.7, 2), "[██]");
    }

    #[test]
    fn test_flags_layer_over_config() {
        let base = ScanPolicy::builder().min_file_size(10u64).build().unwrap();
        let flags = ScanFlags {
            min_size: Some("2KB".into()),
            excludes: vec!["/tmp/cache".into()],
            skip_hidden: true,
            ..Default::default()
        };

        let policy = flags.policy(&base).unwrap();
        assert_eq!(policy.min_file_size, 2048);
        assert_eq!(policy.excluded_paths, vec![PathBuf::from("/tmp/cache")]);
        assert!(policy.skip_hidden);
        assert!(!policy.apparent_size);

        let untouched = ScanFlags::default().policy(&base).unwrap();
        assert_eq!(untouched, base);
    }

    #[test]
    fn test_system_defaults_flag() {
        let flags = ScanFlags {
            system_defaults: true,
            ..Default::default()
        };
        let policy = flags.policy(&ScanPolicy::new()).unwrap();
        assert_eq!(policy.min_file_size, 1024);
        assert!(policy.skip_network_filesystems);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "spacemap", "-v", "layout", "/data", "-W", "640", "-H", "480", "--node", "3",
            "--exclude", "/data/tmp", "--exclude", "/data/cache",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Layout {
                path,
                width,
                height,
                node,
                scan,
                ..
            } => {
                assert_eq!(path, Some(PathBuf::from("/data")));
                assert_eq!((width, height), (640, 480));
                assert_eq!(node, Some(3));
                assert_eq!(scan.excludes.len(), 2);
            }
            _ => panic!("expected layout command"),
        }
    }
}
