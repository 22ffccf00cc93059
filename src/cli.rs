//! CLI command handlers
//!
//! Default output is the plain shell-usable lines the packaging scripts
//! consume; `--json` wraps results in a `{success, data}` envelope instead.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{json, Value};

use crate::mapping::DebianConfig;
use crate::rewriter::Substituter;
use crate::scanner;

/// CLI Commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rewrite every .properties file, then print the package summary
    Rewrite {
        /// Repository root (default: parent of the binary's own directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Scan and substitute, but write nothing back
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the apt-get and CLASSPATH lines without touching any file
    Summary {
        /// Repository root
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Mapping and tree statistics
    Status {
        /// Repository root
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

/// Handle a CLI command.
///
/// json_output: wrap the result in a JSON envelope instead of plain lines.
pub fn handle_command(cmd: Command, json_output: bool) -> Result<()> {
    let result = match cmd {
        Command::Rewrite { root, dry_run } => run_rewrite(root, dry_run, json_output),

        Command::Summary { root } => run_summary(root, json_output),

        Command::Status { root } => run_status(root, json_output),
    };

    match result {
        Ok(value) => {
            if json_output {
                let output = json!({
                    "success": true,
                    "data": value
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_value(&value);
            }
        }
        Err(e) => {
            if json_output {
                let output = json!({
                    "success": false,
                    "error": format!("{e:#}")
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                eprintln!("error: {e:#}");
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Print a Value, unwrapping plain strings
fn print_value(value: &Value) {
    match value {
        Value::String(s) => println!("{s}"),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_default()),
    }
}

fn run_rewrite(root: Option<PathBuf>, dry_run: bool, json_output: bool) -> Result<Value> {
    let root = resolve_root(root)?;
    let config = DebianConfig::load(&root)?;
    let subst = Substituter::new(&config.mapping)?;

    let files = scanner::rewrite_tree(&root, &subst, dry_run, !json_output)?;

    if json_output {
        Ok(json!({
            "root": root.display().to_string(),
            "dry_run": dry_run,
            "files": files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "required_packages": config.required_packages(),
            "classpath": config.extra_classpath.iter().map(|e| e.jar.as_str()).collect::<Vec<_>>(),
        }))
    } else {
        Ok(json!(format!(
            "{}\n{}",
            config.apt_install_line(),
            config.classpath_export_line()
        )))
    }
}

fn run_summary(root: Option<PathBuf>, json_output: bool) -> Result<Value> {
    let root = resolve_root(root)?;
    let config = DebianConfig::load(&root)?;

    if json_output {
        Ok(json!({
            "required_packages": config.required_packages(),
            "classpath": config.extra_classpath.iter().map(|e| e.jar.as_str()).collect::<Vec<_>>(),
        }))
    } else {
        Ok(json!(format!(
            "{}\n{}",
            config.apt_install_line(),
            config.classpath_export_line()
        )))
    }
}

fn run_status(root: Option<PathBuf>, json_output: bool) -> Result<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let root = resolve_root(root)?;
    let config = DebianConfig::load(&root)?;
    let files = scanner::find_properties_files(&root);

    if json_output {
        Ok(json!({
            "version": version,
            "root": root.display().to_string(),
            "mapping_entries": config.mapping.len(),
            "extra_classpath_entries": config.extra_classpath.len(),
            "properties_files": files.len(),
        }))
    } else {
        Ok(json!(format!(
            "properties-rewriter v{}\n\
            Root: {}\n\
            Mapping entries: {} | Extra classpath: {} | Properties files: {}",
            version,
            root.display(),
            config.mapping.len(),
            config.extra_classpath.len(),
            files.len()
        )))
    }
}

/// Resolve the repository root. The installed binary lives in `debian/`,
/// so by default the tree to rewrite is the parent of the binary's own
/// directory; `--root` overrides for any other layout.
fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }

    if let Ok(exe) = std::env::current_exe() {
        let exe = exe.canonicalize().unwrap_or(exe);
        if let Some(root) = exe.parent().and_then(|dir| dir.parent()) {
            return Ok(root.to_path_buf());
        }
    }

    std::env::current_dir().context("resolving current directory")
}
