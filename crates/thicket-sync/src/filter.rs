//! Inclusion filter consulted during blast-radius expansion

use dashmap::DashMap;
use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thicket_core::{CACHE_DIR, Workspace};
use thicket_parser::FileType;

/// Matches workspace-relative paths against the `include` globs.
///
/// Matches are computed once per pattern by walking the workspace (honoring
/// `.gitignore`) and cached until [`InclusionFilter::clear_cache`].
#[derive(Debug)]
pub struct InclusionFilter {
    workspace: Workspace,
    patterns: Vec<(String, GlobMatcher)>,
    matched: DashMap<String, Arc<HashSet<String>>>,
}

impl InclusionFilter {
    pub fn new(workspace: Workspace, include: &[String]) -> Result<Self, globset::Error> {
        let patterns = include
            .iter()
            .map(|p| Ok((p.clone(), Glob::new(p)?.compile_matcher())))
            .collect::<Result<Vec<_>, globset::Error>>()?;
        Ok(Self {
            workspace,
            patterns,
            matched: DashMap::new(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether a workspace-relative path is included.
    pub fn matches(&self, relative_path: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        self.patterns
            .iter()
            .any(|(pattern, matcher)| self.matched_by(pattern, matcher).contains(relative_path))
    }

    fn matched_by(&self, pattern: &str, matcher: &GlobMatcher) -> Arc<HashSet<String>> {
        if let Some(hit) = self.matched.get(pattern) {
            return hit.value().clone();
        }
        let files: HashSet<String> = walk_files(self.workspace.root())
            .into_iter()
            .filter_map(|path| self.workspace.relative_path(&path))
            .filter(|rel| matcher.is_match(rel))
            .collect();
        tracing::debug!("Pattern {:?} matched {} files", pattern, files.len());
        let files = Arc::new(files);
        self.matched.insert(pattern.to_string(), files.clone());
        files
    }

    /// Forget cached matches; call when the filter or the file set changes.
    pub fn clear_cache(&self) {
        self.matched.clear();
    }

    pub fn cached_patterns(&self) -> usize {
        self.matched.len()
    }
}

/// Every file under `root`, gitignore-aware, skipping the cache directory.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .require_git(false)
        .filter_entry(|entry| {
            let name = entry.file_name();
            name != CACHE_DIR && name != ".git"
        })
        .build();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => tracing::debug!("Walk error: {}", e),
        }
    }
    files
}

/// Supported source files of the workspace that pass the filter, sorted.
pub fn discover_files(workspace: &Workspace, filter: &InclusionFilter) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walk_files(workspace.root())
        .into_iter()
        .filter(|path| FileType::from_path(path).is_some())
        .filter(|path| {
            workspace
                .relative_path(path)
                .is_some_and(|rel| filter.matches(&rel))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_core::test_utils::{create_repo_with_structure, write_file};

    #[test]
    fn empty_pattern_list_matches_everything() {
        let dir = create_repo_with_structure(&[("a.rs", "fn a() {}")]);
        let filter = InclusionFilter::new(Workspace::new(dir.path()), &[]).unwrap();
        assert!(filter.matches("a.rs"));
        assert!(filter.matches("not/on/disk.py"));
    }

    #[test]
    fn caches_matches_until_cleared() {
        let dir = create_repo_with_structure(&[("src/a.rs", "fn a() {}"), ("docs/b.rs", "fn b() {}")]);
        let filter = InclusionFilter::new(Workspace::new(dir.path()), &["src/**".to_string()]).unwrap();
        assert!(filter.matches("src/a.rs"));
        assert!(!filter.matches("docs/b.rs"));
        assert_eq!(filter.cached_patterns(), 1);

        write_file(dir.path(), "src/new.rs", "fn n() {}");
        assert!(!filter.matches("src/new.rs"));
        filter.clear_cache();
        assert!(filter.matches("src/new.rs"));
    }

    #[test]
    fn honors_gitignore() {
        let dir = create_repo_with_structure(&[
            (".gitignore", "generated/\n"),
            ("generated/out.ts", "export const x = 1;"),
            ("src/app.ts", "export const y = 2;"),
            ("README.md", "# readme"),
        ]);
        let workspace = Workspace::new(dir.path());
        let filter = InclusionFilter::new(workspace.clone(), &[]).unwrap();
        let files = discover_files(&workspace, &filter);
        assert_eq!(files, vec![dir.path().join("src/app.ts")]);
    }
}
