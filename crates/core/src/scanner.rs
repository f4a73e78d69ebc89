//! Walks a directory and builds the catalog the batch controller filters.

use crate::catalog::Catalog;
use crate::models::CandidateItem;
use anyhow::{bail, Context};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tokio::task;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    pub exclude: Vec<String>,
}

/// Loads the catalog on a blocking task so the control loop keeps ticking.
pub async fn load_catalog(root: &Path, options: &ScanOptions) -> anyhow::Result<Catalog> {
    let root = root.to_path_buf();
    let options = options.clone();
    task::spawn_blocking(move || scan_catalog(&root, &options))
        .await
        .context("catalog loader task failed")?
}

pub fn scan_catalog(root: &Path, options: &ScanOptions) -> anyhow::Result<Catalog> {
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }
    let exclude_set = build_globset(&options.exclude)?;

    let mut walker = WalkDir::new(root).follow_links(true).min_depth(1);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut items = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || should_descend(e.path(), options.include_hidden, &exclude_set))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        items.push(CandidateItem::new(entry.into_path()));
    }

    let mut catalog = Catalog::new(items);
    catalog.sort();
    info!(
        "Loaded {} files ({} images) from {}",
        catalog.len(),
        catalog.eligible_count(),
        root.display()
    );
    Ok(catalog)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid exclude pattern {pat:?}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn should_descend(path: &Path, include_hidden: bool, excludes: &GlobSet) -> bool {
    if excludes.is_match(path) {
        return false;
    }
    include_hidden || !is_hidden(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_names(catalog: &Catalog, root: &Path) -> Vec<String> {
        catalog
            .items()
            .iter()
            .map(|i| &i.path)
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn fixture() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("b.png"), b"b").unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("C.jpg"), b"c").unwrap();
        fs::write(root.join(".hidden.png"), b"h").unwrap();
        fs::write(root.join("nested").join("d.gif"), b"d").unwrap();
        fs::write(root.join(".cache").join("e.png"), b"e").unwrap();
        temp
    }

    #[test]
    fn flat_scan_lists_top_level_files_sorted() {
        let temp = fixture();
        let catalog = scan_catalog(temp.path(), &ScanOptions::default()).unwrap();
        assert_eq!(file_names(&catalog, temp.path()), vec!["a.txt", "b.png", "C.jpg"]);
    }

    #[test]
    fn recursive_scan_descends() {
        let temp = fixture();
        let options = ScanOptions {
            recursive: true,
            ..Default::default()
        };
        let catalog = scan_catalog(temp.path(), &options).unwrap();
        assert_eq!(
            file_names(&catalog, temp.path()),
            vec!["a.txt", "b.png", "C.jpg", "nested/d.gif"]
        );
    }

    #[test]
    fn hidden_and_excluded_entries() {
        let temp = fixture();
        let options = ScanOptions {
            recursive: true,
            include_hidden: true,
            exclude: vec!["**/*.txt".into(), "**/nested".into()],
        };
        let catalog = scan_catalog(temp.path(), &options).unwrap();
        assert_eq!(
            file_names(&catalog, temp.path()),
            vec!["b.png", "C.jpg", ".cache/e.png", ".hidden.png"]
        );
    }

    #[test]
    fn dot_named_image_needs_include_hidden() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(".png"), b"p").unwrap();
        fs::write(temp.path().join("a.png"), b"a").unwrap();

        let default = scan_catalog(temp.path(), &ScanOptions::default()).unwrap();
        assert_eq!(file_names(&default, temp.path()), vec!["a.png"]);

        let options = ScanOptions {
            include_hidden: true,
            ..Default::default()
        };
        let all = scan_catalog(temp.path(), &options).unwrap();
        assert_eq!(all.eligible_count(), 2);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        assert!(scan_catalog(&temp.path().join("nope"), &ScanOptions::default()).is_err());
    }

    #[tokio::test]
    async fn load_catalog_runs_off_the_caller() {
        let temp = fixture();
        let catalog = load_catalog(temp.path(), &ScanOptions::default()).await.unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.eligible_count(), 2);
    }
}
