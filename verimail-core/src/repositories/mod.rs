//! Storage seam for verification codes
//!
//! Services only talk to a [`CodeStore`]. The in-memory implementation lives
//! here; persistent backends implement the same trait in their own crates.

pub mod code_store;
pub mod memory;

pub use code_store::CodeStore;
pub use memory::{Clock, MemoryCodeStore};
