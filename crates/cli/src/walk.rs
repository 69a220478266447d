use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `.tf` files under `root` (case-insensitive), sorted by name at every level
/// so repeated runs see the same order.
pub fn terraform_files(root: &Path, exclude: &[Regex]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e.path(), exclude));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("cannot scan {}", root.display()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable path");
                continue;
            }
        };
        if entry.file_type().is_file() && is_terraform(entry.path()) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

fn is_terraform(p: &Path) -> bool {
    p.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(".tf"))
        .unwrap_or(false)
}

fn is_excluded(p: &Path, exclude: &[Regex]) -> bool {
    if exclude.is_empty() { return false; }
    let s = p.to_string_lossy().replace('\\', "/");
    exclude.iter().any(|re| re.is_match(&s))
}
