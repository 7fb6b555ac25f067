//! Test utilities for Thicket

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary workspace with a small TypeScript/Python/Rust mix.
pub fn create_test_repo() -> TempDir {
    create_repo_with_structure(&[
        (
            "src/index.ts",
            "import { UserService } from './services/user';\n\nexport function main() {\n    const service = new UserService();\n    service.loadUsers();\n}\n",
        ),
        (
            "src/services/user.ts",
            "export class UserService {\n    loadUsers() {\n        return [];\n    }\n}\n",
        ),
        (
            "app/main.py",
            "from app.util import helper\n\ndef run():\n    return helper()\n",
        ),
        ("app/util.py", "def helper():\n    return 42\n"),
        (
            "src/lib.rs",
            "mod utils;\n\npub fn add(a: i32, b: i32) -> i32 {\n    utils::double(a) + b\n}\n",
        ),
        ("src/utils.rs", "pub fn double(x: i32) -> i32 {\n    x * 2\n}\n"),
    ])
}

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        write_file(root, path, content);
    }

    temp_dir
}

/// Write a file relative to `root`, creating parent directories.
pub fn write_file(root: &Path, path: &str, content: &str) {
    let full_path = root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full_path, content).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_repo() {
        let temp_dir = create_test_repo();
        let root = temp_dir.path();

        assert!(root.join("src/index.ts").exists());
        assert!(root.join("src/services/user.ts").exists());
        assert!(root.join("app/util.py").exists());
        assert!(root.join("src/utils.rs").exists());
    }
}
