//! Source parsing: the code-parser capability and its tree-sitter implementation

pub mod languages;
pub mod parser;
pub mod parser_pool;
pub mod tree_parser;

#[cfg(test)]
mod tests;

pub use parser::{CodeParser, ParseError, ParsedDocument, merge_child_skeletons};
pub use parser_pool::{FileType, ParseRequest, ParseResult, ParserPool, create_parser_pool, default_workers};
pub use tree_parser::TreeSitterParser;
