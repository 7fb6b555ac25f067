//! Content digest used as the staleness signal

use sha2::{Digest, Sha256};
use std::path::Path;

/// SHA-256 of the text, lower-case hex.
pub fn content_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Read a file and return its text together with its digest.
pub async fn read_with_digest(path: &Path) -> std::io::Result<(String, String)> {
    let text = tokio::fs::read_to_string(path).await?;
    let digest = content_digest(&text);
    Ok((text, digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        assert_eq!(content_digest("fn main() {}"), content_digest("fn main() {}"));
        assert_eq!(content_digest("").len(), 64);
    }

    #[test]
    fn digest_changes_with_content_and_reverts() {
        let original = content_digest("export const a = 1;\n");
        let edited = content_digest("export const a = 2;\n");
        assert_ne!(original, edited);
        assert_eq!(original, content_digest("export const a = 1;\n"));
    }

    #[tokio::test]
    async fn reads_file_digest() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.py");
        std::fs::write(&path, "def f():\n    pass\n").unwrap();
        let (text, digest) = read_with_digest(&path).await.unwrap();
        assert_eq!(digest, content_digest(&text));
    }
}
