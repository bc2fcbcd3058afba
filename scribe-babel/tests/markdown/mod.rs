//! Markdown format tests
//!
//! Load markdown through an edit session and check the tree, the saved text, or
//! both.

mod edits;
mod import;
mod properties;
mod roundtrip;
