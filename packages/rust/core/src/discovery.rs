//! Document discovery over the site tree.

use std::path::{Path, PathBuf};

use tfasync_shared::{DocumentsConfig, PageKind};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A page the staged injectors or the extractor will visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: PathBuf,
    pub kind: PageKind,
    /// Name of the page's directory when it follows the key prefix.
    pub dir_key: Option<String>,
}

/// Every `.html` file under `root`, sorted.
///
/// Dot-directories and directories named in `skip_dirs` are not entered.
/// Symlinks are never followed.
pub fn html_files(root: &Path, skip_dirs: &[String]) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, skip_dirs));

    let mut out = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "cannot read directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "html") {
            out.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), files = out.len(), "html files discovered");
    out
}

fn is_skipped_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || skip_dirs.iter().any(|s| *s == name)
}

/// `<dir>/<PREFIX…>/index.html` for each configured directory, sorted by key.
fn keyed_pages(root: &Path, dirs: &[String], prefix: &str, kind: PageKind) -> Vec<Page> {
    let mut pages = Vec::new();
    for dir in dirs {
        let base = root.join(dir);
        let Ok(entries) = std::fs::read_dir(&base) else {
            debug!(dir = %base.display(), "page directory absent");
            continue;
        };
        let mut found: Vec<Page> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let index = entry.path().join("index.html");
                (name.starts_with(prefix) && index.is_file()).then(|| Page {
                    path: index,
                    kind,
                    dir_key: Some(name),
                })
            })
            .collect();
        found.sort_by(|a, b| a.dir_key.cmp(&b.dir_key));
        pages.extend(found);
    }
    pages
}

/// Technique, tactic and matrix pages, in that order.
pub fn stage_pages(root: &Path, docs: &DocumentsConfig) -> Vec<Page> {
    let mut pages = keyed_pages(root, &docs.technique_dirs, &docs.technique_prefix, PageKind::Technique);
    pages.extend(keyed_pages(root, &docs.tactic_dirs, &docs.tactic_prefix, PageKind::Tactic));
    pages.extend(
        docs.matrix_pages
            .iter()
            .map(|p| root.join(p))
            .filter(|p| p.is_file())
            .map(|path| Page {
                path,
                kind: PageKind::Matrix,
                dir_key: None,
            }),
    );
    pages
}

/// Technique pages under the extraction directories.
pub fn extraction_pages(root: &Path, docs: &DocumentsConfig) -> Vec<Page> {
    keyed_pages(root, &docs.extract_dirs, &docs.technique_prefix, PageKind::Technique)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn walk_skips_hidden_and_configured_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("index.html"));
        touch(&root.join("a/b/page.html"));
        touch(&root.join(".git/x.html"));
        touch(&root.join("node_modules/pkg/readme.html"));
        std::fs::write(root.join("a/notes.txt"), "x").unwrap();

        let files = html_files(root, &["node_modules".to_string()]);
        assert_eq!(files, vec![root.join("a/b/page.html"), root.join("index.html")]);
    }

    #[cfg(unix)]
    #[test]
    fn walk_does_not_follow_symlink_loops() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/page.html"));
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();
        std::os::unix::fs::symlink(root.join("a/page.html"), root.join("alias.html")).unwrap();

        let files = html_files(root, &[]);
        assert_eq!(files, vec![root.join("a/page.html")]);
    }

    #[test]
    fn stage_pages_follow_prefixes_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("techniques/TFA-T-1002/index.html"));
        touch(&root.join("techniques/TFA-T-1001/index.html"));
        touch(&root.join("techniques/other/index.html"));
        std::fs::create_dir_all(root.join("techniques/TFA-T-1003")).unwrap();
        touch(&root.join("tactics/TFA-TA-0001/index.html"));
        touch(&root.join("matrices/tfa/index.html"));

        let pages = stage_pages(root, &DocumentsConfig::default());
        let keys: Vec<_> = pages.iter().map(|p| (p.kind, p.dir_key.as_deref())).collect();
        assert_eq!(
            keys,
            vec![
                (PageKind::Technique, Some("TFA-T-1001")),
                (PageKind::Technique, Some("TFA-T-1002")),
                (PageKind::Tactic, Some("TFA-TA-0001")),
                (PageKind::Matrix, None),
            ]
        );
    }
}
