//! Tree Cache Engine
//!
//! [`TreeCache`] ties the node store, the project counters and the view cache
//! together. Multi-step algorithms live in their own modules.

pub mod children;
pub mod counter;
pub mod engine;
pub mod import;
pub mod restore;

pub use children::ChildIndex;
pub use counter::ProjectCounter;
pub use engine::{TreeCache, TreeCacheOptions};
pub use import::{mint_node_id, remap_for_import, RemappedImport};
pub use restore::cascade_restore;
