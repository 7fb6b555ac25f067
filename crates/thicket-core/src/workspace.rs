//! Workspace root and path projection between absolute and relative forms

use crate::model::NodeId;
use std::path::{Component, Path, PathBuf};

/// The directory being indexed.
///
/// Absolute document identifiers live in memory; everything persisted uses
/// workspace-relative paths with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Workspace { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative path of a file inside the workspace, `None` when outside.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    /// Absolute path for a workspace-relative one.
    pub fn absolute(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Turn a user-supplied identifier (absolute or relative) into an absolute path.
    pub fn resolve_identifier(&self, identifier: &Path) -> PathBuf {
        if identifier.is_absolute() {
            normalize(identifier)
        } else {
            normalize(&self.root.join(identifier))
        }
    }

    /// Rewrite an absolute node id into its workspace-relative form.
    ///
    /// Ids outside the workspace are returned unchanged.
    pub fn relative_id(&self, id: &NodeId) -> NodeId {
        let root = self.root.to_string_lossy();
        match id
            .as_str()
            .strip_prefix(root.as_ref())
            .and_then(|rest| rest.strip_prefix(std::path::MAIN_SEPARATOR))
        {
            Some(rest) => NodeId(rest.replace(std::path::MAIN_SEPARATOR, "/")),
            None => id.clone(),
        }
    }

    /// Inverse of [`Workspace::relative_id`].
    pub fn absolute_id(&self, id: &NodeId) -> NodeId {
        if Path::new(id.as_str()).is_absolute() {
            return id.clone();
        }
        let native = id.as_str().replace('/', std::path::MAIN_SEPARATOR_STR);
        NodeId(format!(
            "{}{}{}",
            self.root.display(),
            std::path::MAIN_SEPARATOR,
            native
        ))
    }

    /// Relative form of an absolute path, or the path itself when outside.
    pub fn relative_path_buf(&self, path: &Path) -> PathBuf {
        match self.relative_path(path) {
            Some(rel) => PathBuf::from(rel),
            None => path.to_path_buf(),
        }
    }

    /// Absolute form of a relative path; absolute paths pass through.
    pub fn absolute_path_buf(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.absolute(&path.to_string_lossy())
        }
    }
}

/// Lexically remove `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Range};

    #[test]
    fn relative_paths_use_forward_slashes() {
        let ws = Workspace::new("/repo");
        assert_eq!(
            ws.relative_path(Path::new("/repo/src/lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(ws.relative_path(Path::new("/other/lib.rs")), None);
        assert_eq!(ws.absolute("src/lib.rs"), PathBuf::from("/repo/src/lib.rs"));
    }

    #[test]
    fn ids_project_both_ways() {
        let ws = Workspace::new("/repo");
        let range = Range::new(Position::new(0, 0), Position::new(3, 1));
        let id = NodeId::new(Path::new("/repo/src/a.ts"), &range);
        let rel = ws.relative_id(&id);
        assert_eq!(rel.as_str(), "src/a.ts:0:0-3:1");
        assert_eq!(ws.absolute_id(&rel), id);

        let outside = NodeId("/elsewhere/b.ts:0:0-1:0".into());
        assert_eq!(ws.relative_id(&outside), outside);
    }

    #[test]
    fn identifiers_are_absolutized() {
        let ws = Workspace::new("/repo");
        assert_eq!(
            ws.resolve_identifier(Path::new("./src/../a.py")),
            PathBuf::from("/repo/a.py")
        );
        assert_eq!(
            ws.resolve_identifier(Path::new("/repo/b.py")),
            PathBuf::from("/repo/b.py")
        );
    }
}
