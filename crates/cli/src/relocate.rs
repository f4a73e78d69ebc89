//! Moves dropped files out of the way after a batch.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Moves every path into `dest_dir`, never overwriting. Returns
/// `(from, to)` for each moved file.
pub fn move_into(paths: &[PathBuf], dest_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("creating {}", dest_dir.display()))?;
    let mut moved = Vec::with_capacity(paths.len());
    for from in paths {
        let file_name = from
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "dropped".into());
        let to = free_name(&dest_dir.join(file_name));
        move_file(from, &to).with_context(|| format!("moving {}", from.display()))?;
        info!("Moved {} -> {}", from.display(), to.display());
        moved.push((from.clone(), to));
    }
    Ok(moved)
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        // Different filesystem.
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// `dest` itself if unused, else the first free `stem_N.ext`.
fn free_name(dest: &Path) -> PathBuf {
    let mut n = 0;
    loop {
        let candidate = numbered(dest, n);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Inserts `_n` before the extension. Works on `OsStr` so non-UTF-8 names
/// keep their bytes.
fn numbered(dest: &Path, n: usize) -> PathBuf {
    if n == 0 {
        return dest.to_path_buf();
    }
    let mut name = dest
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("file"));
    name.push(format!("_{n}"));
    if let Some(ext) = dest.extension() {
        name.push(".");
        name.push(ext);
    }
    dest.with_file_name(name)
}
