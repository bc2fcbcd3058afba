//! Rich-document HTML tests
//!
//! The HTML is the editor's view of the tree. What the serializer writes, the
//! parser must read back to the same tree.

mod export;
mod import;
