//! Text documents and the per-call document cache

use crate::model::{Position, Range};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file's text with a line index for position lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub path: PathBuf,
    pub text: String,
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = line_starts(&text);
        TextDocument {
            path: path.into(),
            text,
            line_starts,
        }
    }

    /// Range covering the whole text.
    pub fn full_range(&self) -> Range {
        let last_line = self.line_starts.len() - 1;
        let last_start = self.line_starts[last_line];
        Range::new(
            Position::new(0, 0),
            Position::new(last_line as u32, (self.text.len() - last_start) as u32),
        )
    }

    /// Byte offset of a position, if it falls inside the text.
    pub fn offset_at(&self, position: Position) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        column_offset(&self.text, line_start, position.character as usize)
    }

    /// Text covered by `range`; empty when the range does not fit the document.
    pub fn text_in_range(&self, range: &Range) -> &str {
        match (self.offset_at(range.start), self.offset_at(range.end)) {
            (Some(start), Some(end)) if start <= end => &self.text[start..end],
            _ => "",
        }
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
    starts
}

/// Byte offset of `position` inside `text`, where `text` begins at `base`.
///
/// Used to locate a child's span inside its parent's raw text.
pub fn offset_within(text: &str, base: Position, position: Position) -> Option<usize> {
    if position < base {
        return None;
    }
    let line_delta = (position.line - base.line) as usize;
    let column = if line_delta == 0 {
        (position.character - base.character) as usize
    } else {
        position.character as usize
    };
    let line_start = if line_delta == 0 {
        0
    } else {
        text.match_indices('\n').nth(line_delta - 1).map(|(i, _)| i + 1)?
    };
    column_offset(text, line_start, column)
}

/// `line_start + column`, rejected when the column runs past the end of its line.
fn column_offset(text: &str, line_start: usize, column: usize) -> Option<usize> {
    let line_end = text[line_start..].find('\n').map_or(text.len(), |i| line_start + i);
    let offset = line_start + column;
    (offset <= line_end && text.is_char_boundary(offset)).then_some(offset)
}

/// Documents read during one skeletonization call, shared by its concurrent tasks.
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: DashMap<PathBuf, Arc<TextDocument>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached document or read it from disk.
    pub async fn get_or_load(&self, path: &Path) -> std::io::Result<Arc<TextDocument>> {
        if let Some(document) = self.get(path) {
            return Ok(document);
        }
        let text = tokio::fs::read_to_string(path).await?;
        let document = Arc::new(TextDocument::new(path, text));
        Ok(self
            .documents
            .entry(path.to_path_buf())
            .or_insert(document)
            .value()
            .clone())
    }

    pub fn get(&self, path: &Path) -> Option<Arc<TextDocument>> {
        self.documents.get(path).map(|r| r.value().clone())
    }

    pub fn insert(&self, document: TextDocument) {
        self.documents
            .insert(document.path.clone(), Arc::new(document));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_covers_text() {
        let doc = TextDocument::new("a.rs", "fn a() {}\nfn b() {}");
        assert_eq!(doc.full_range(), Range::new(Position::new(0, 0), Position::new(1, 9)));
        assert_eq!(doc.text_in_range(&doc.full_range()), doc.text);

        let trailing = TextDocument::new("b.rs", "x\n");
        assert_eq!(trailing.full_range().end, Position::new(1, 0));
    }

    #[test]
    fn text_in_range_slices_lines() {
        let doc = TextDocument::new("a.py", "class A:\n    def f(self):\n        pass\n");
        let range = Range::new(Position::new(1, 4), Position::new(2, 12));
        assert_eq!(doc.text_in_range(&range), "def f(self):\n        pass");
        let outside = Range::new(Position::new(7, 0), Position::new(8, 0));
        assert_eq!(doc.text_in_range(&outside), "");
    }

    #[test]
    fn offset_within_parent_text() {
        let parent = "impl A {\n    fn f() {}\n}";
        let base = Position::new(3, 0);
        assert_eq!(offset_within(parent, base, Position::new(4, 4)), Some(13));
        assert_eq!(offset_within(parent, base, Position::new(3, 5)), Some(5));
        assert_eq!(offset_within(parent, base, Position::new(2, 0)), None);
        assert_eq!(offset_within(parent, base, Position::new(9, 0)), None);
    }

    #[test]
    fn columns_past_the_line_end_are_rejected() {
        let parent = "impl A {\n    fn f() {}\n}";
        let base = Position::new(3, 0);
        // line 1 is 13 bytes long; column 20 would land on the closing brace line
        assert_eq!(offset_within(parent, base, Position::new(4, 13)), Some(22));
        assert_eq!(offset_within(parent, base, Position::new(4, 20)), None);
        assert_eq!(offset_within(parent, base, Position::new(3, 12)), None);

        let doc = TextDocument::new("a.rs", "fn a() {}\nfn b() {}");
        assert_eq!(doc.offset_at(Position::new(0, 9)), Some(9));
        assert_eq!(doc.offset_at(Position::new(0, 12)), None);
        let malformed = Range::new(Position::new(0, 3), Position::new(0, 15));
        assert_eq!(doc.text_in_range(&malformed), "");
    }

    #[tokio::test]
    async fn cache_reads_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.ts");
        std::fs::write(&path, "export const a = 1;").unwrap();

        let cache = DocumentCache::new();
        let first = cache.get_or_load(&path).await.unwrap();
        std::fs::write(&path, "changed").unwrap();
        let second = cache.get_or_load(&path).await.unwrap();
        assert_eq!(first.text, second.text);
        assert_eq!(cache.len(), 1);
    }
}
