pub mod handlers;
pub mod index;
pub mod trie;

pub use index::SearchIndex;
