//! Doctree: Local Project Document Tree Cache
//!
//! A local, offline cache of tree-structured documents (folders, HTTP and
//! WebSocket requests, mocks, markdown) grouped by project. Nodes are soft
//! deleted and restored with their ancestors and subtrees, imported under
//! fresh ids, and counted per project.

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod project;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod views;

pub use error::{ApiError, StorageError};
pub use node::{Node, NodeInfo, NodeType};
pub use tree::{TreeCache, TreeCacheOptions};
