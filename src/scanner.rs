//! Directory scan and rewrite pipeline
//!
//! Walks the repository tree and rewrites every file whose name ends in
//! `.properties`. Files are processed one at a time; the first I/O error
//! aborts the run, leaving earlier files rewritten and later files
//! untouched. Traversal order is whatever the walk yields and does not
//! affect the result.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::rewriter::{self, Substituter};

const PROPERTIES_SUFFIX: &str = ".properties";

/// Every regular file under `root` whose name ends in `.properties`.
/// Symlinks are not followed, so the rewrite stays confined to the tree.
pub fn find_properties_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(PROPERTIES_SUFFIX))
        .map(|e| e.into_path())
        .collect()
}

/// Rewrite every properties file under `root`.
///
/// `echo` controls the contractual stdout lines (`Will rewrite:` /
/// `Wrote output to:`); JSON mode turns them off so stdout stays parseable.
/// `dry_run` performs the scan and substitution but writes nothing back.
pub fn rewrite_tree(
    root: &Path,
    subst: &Substituter,
    dry_run: bool,
    echo: bool,
) -> Result<Vec<PathBuf>> {
    let files = find_properties_files(root);
    info!(count = files.len(), root = %root.display(), "scanning for properties files");

    for path in &files {
        if echo {
            println!("Will rewrite: {}", path.display());
        }
        if dry_run {
            debug!(file = %path.display(), "dry run, skipping write");
            continue;
        }

        let tmp_path = rewriter::rewrite_file(path, subst)?;
        if echo {
            println!("Wrote output to: {}", tmp_path.display());
        }
    }

    Ok(files)
}
